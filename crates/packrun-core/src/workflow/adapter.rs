//! Workflow execution adapter — submit a run, optionally wait to terminal.
//!
//! Wraps the remote create/run/get-run operations behind one operation:
//! given either a raw definition or an already-provisioned workflow id,
//! create if needed, submit a run, and (when asked) poll sequentially
//! until the classified status is terminal or the timeout elapses. Polls
//! never overlap — each is awaited before the next is scheduled.

use serde_json::Value;
use std::time::{Duration, Instant};

use super::builder::validate_shape;
use super::client::{extract_run_id, extract_status, WorkflowApi};
use super::status::classify;
use crate::error::EngineError;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
pub const DEFAULT_TIMEOUT_MS: u64 = 300_000;

/// What to run: a raw definition (created first) or an existing id.
#[derive(Debug, Clone)]
pub enum WorkflowSource {
    Definition(Value),
    Existing(String),
}

/// Submission options for one run.
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    pub wait: bool,
    pub poll_interval_ms: u64,
    pub timeout_ms: u64,
    pub workspace_id: Option<String>,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            wait: true,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            workspace_id: None,
        }
    }
}

/// Outcome of one submitted run. `timed_out` is distinct from `failed`;
/// callers must check both.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub workflow_id: String,
    pub run_id: String,
    pub status: String,
    pub terminal: bool,
    pub failed: bool,
    pub timed_out: bool,
    pub elapsed_ms: u64,
    /// The last run object fetched from the remote API.
    pub run: Value,
}

impl ExecutionResult {
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "workflow_id": self.workflow_id,
            "run_id": self.run_id,
            "status": self.status,
            "terminal": self.terminal,
            "failed": self.failed,
            "timed_out": self.timed_out,
            "elapsed_ms": self.elapsed_ms,
            "run": self.run,
        })
    }
}

/// Create the workflow if needed, submit a run, optionally poll to a
/// terminal status.
pub async fn submit_and_wait(
    api: &dyn WorkflowApi,
    source: WorkflowSource,
    input: Value,
    opts: &SubmitOptions,
) -> Result<ExecutionResult, EngineError> {
    let workflow_id = match source {
        WorkflowSource::Existing(id) => id,
        WorkflowSource::Definition(definition) => {
            // Cheapest failure first: shape-validate before any network call.
            // An authoring error, not a network one.
            validate_shape(&definition).map_err(|reason| EngineError::InvalidSkill {
                name: definition
                    .get("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or("workflow")
                    .to_string(),
                reason: format!("workflow failed local validation: {}", reason),
            })?;
            let created = api
                .create_workflow(&definition, opts.workspace_id.as_deref())
                .await?;
            match created.get("id").and_then(|v| v.as_str()) {
                Some(id) => id.to_string(),
                None => return Err(EngineError::CreateFailed { detail: created }),
            }
        }
    };

    let started = Instant::now();
    let mut run = api.run_workflow(&workflow_id, &input).await?;
    let run_id = extract_run_id(&run).ok_or_else(|| EngineError::RequestFailed {
        message: "run submission returned no id".to_string(),
        detail: Some(run.clone()),
    })?;

    let mut status = extract_status(&run);
    let mut class = classify(&status);
    let mut timed_out = false;

    if opts.wait {
        while !class.terminal {
            if started.elapsed() >= Duration::from_millis(opts.timeout_ms) {
                timed_out = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(opts.poll_interval_ms)).await;
            run = api.get_run(&run_id).await?;
            status = extract_status(&run);
            class = classify(&status);
        }
    }

    Ok(ExecutionResult {
        workflow_id,
        run_id,
        status,
        terminal: class.terminal,
        failed: class.failed,
        timed_out,
        elapsed_ms: started.elapsed().as_millis() as u64,
        run,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Scripted in-memory backend: fixed create response, run response,
    /// and a queue of poll statuses.
    struct FakeApi {
        create_response: Value,
        run_response: Value,
        poll_statuses: Mutex<Vec<&'static str>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeApi {
        fn new(create: Value, run: Value, polls: Vec<&'static str>) -> Self {
            Self {
                create_response: create,
                run_response: run,
                poll_statuses: Mutex::new(polls),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WorkflowApi for FakeApi {
        async fn create_workflow(
            &self,
            _definition: &Value,
            _workspace_id: Option<&str>,
        ) -> Result<Value, EngineError> {
            self.calls.lock().unwrap().push("create".to_string());
            Ok(self.create_response.clone())
        }

        async fn run_workflow(
            &self,
            workflow_id: &str,
            _input: &Value,
        ) -> Result<Value, EngineError> {
            self.calls.lock().unwrap().push(format!("run:{}", workflow_id));
            Ok(self.run_response.clone())
        }

        async fn get_run(&self, run_id: &str) -> Result<Value, EngineError> {
            self.calls.lock().unwrap().push(format!("poll:{}", run_id));
            let mut polls = self.poll_statuses.lock().unwrap();
            let status = if polls.is_empty() { "running" } else { polls.remove(0) };
            Ok(json!({"id": run_id, "status": status}))
        }

        async fn list_connections(
            &self,
            _workspace_id: Option<&str>,
            _project_id: Option<&str>,
            _limit: u32,
        ) -> Result<Vec<Value>, EngineError> {
            Ok(Vec::new())
        }
    }

    fn fast_opts(wait: bool) -> SubmitOptions {
        SubmitOptions {
            wait,
            poll_interval_ms: 1,
            timeout_ms: 500,
            workspace_id: None,
        }
    }

    fn one_node_workflow() -> Value {
        json!({"name": "wf", "nodes": [{"name": "main", "type": "llm.chat"}]})
    }

    #[tokio::test]
    async fn test_create_then_poll_to_success() {
        let api = FakeApi::new(
            json!({"id": "wf_1"}),
            json!({"id": "run_1", "status": "queued"}),
            vec!["running", "succeeded"],
        );
        let result = submit_and_wait(
            &api,
            WorkflowSource::Definition(one_node_workflow()),
            json!({"prompt": "hi"}),
            &fast_opts(true),
        )
        .await
        .unwrap();

        assert_eq!(result.workflow_id, "wf_1");
        assert_eq!(result.run_id, "run_1");
        assert_eq!(result.status, "succeeded");
        assert!(result.terminal && !result.failed && !result.timed_out);
        assert_eq!(
            api.calls(),
            vec!["create", "run:wf_1", "poll:run_1", "poll:run_1"]
        );
    }

    #[tokio::test]
    async fn test_no_wait_returns_initial_status() {
        let api = FakeApi::new(
            json!({"id": "wf_1"}),
            json!({"id": "run_1", "status": "queued"}),
            vec!["succeeded"],
        );
        let result = submit_and_wait(
            &api,
            WorkflowSource::Existing("wf_1".to_string()),
            json!({}),
            &fast_opts(false),
        )
        .await
        .unwrap();

        assert_eq!(result.status, "queued");
        assert!(!result.terminal && !result.timed_out);
        // No create, no polls
        assert_eq!(api.calls(), vec!["run:wf_1"]);
    }

    #[tokio::test]
    async fn test_failed_terminal_is_flagged_not_errored() {
        let api = FakeApi::new(
            json!({"id": "wf_1"}),
            json!({"id": "run_1", "status": "running"}),
            vec!["failed"],
        );
        let result = submit_and_wait(
            &api,
            WorkflowSource::Existing("wf_1".to_string()),
            json!({}),
            &fast_opts(true),
        )
        .await
        .unwrap();

        assert!(result.terminal && result.failed && !result.timed_out);
        assert_eq!(result.status, "failed");
    }

    #[tokio::test]
    async fn test_timeout_flagged_distinct_from_failure() {
        let api = FakeApi::new(
            json!({"id": "wf_1"}),
            json!({"id": "run_1", "status": "running"}),
            vec![], // never terminal
        );
        let opts = SubmitOptions {
            wait: true,
            poll_interval_ms: 5,
            timeout_ms: 30,
            workspace_id: None,
        };
        let result = submit_and_wait(
            &api,
            WorkflowSource::Existing("wf_1".to_string()),
            json!({}),
            &opts,
        )
        .await
        .unwrap();

        assert!(result.timed_out);
        assert!(!result.failed);
        assert!(!result.terminal);
    }

    #[tokio::test]
    async fn test_create_without_id_fails() {
        let api = FakeApi::new(
            json!({"ok": true}),
            json!({"id": "run_1", "status": "queued"}),
            vec![],
        );
        let err = submit_and_wait(
            &api,
            WorkflowSource::Definition(one_node_workflow()),
            json!({}),
            &fast_opts(false),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "skill_run_create_failed");
    }

    #[tokio::test]
    async fn test_invalid_shape_never_reaches_network() {
        let api = FakeApi::new(json!({"id": "wf_1"}), json!({"id": "run_1"}), vec![]);
        let err = submit_and_wait(
            &api,
            WorkflowSource::Definition(json!({"nodes": []})),
            json!({}),
            &fast_opts(false),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "skill_invalid");
        assert!(api.calls().is_empty());
    }
}
