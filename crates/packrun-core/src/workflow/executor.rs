//! Skill step executor — the orchestration core.
//!
//! For an atomic skill, builds and submits one remote workflow run. For a
//! composed skill, iterates steps strictly in declared order, resolving
//! each step's input templates against the invocation input and the
//! accumulated step results, dispatching to a local subprocess or a nested
//! atomic-skill invocation, and aborting the whole run on the first
//! failure. Nested steps always block to terminal regardless of the outer
//! invocation's `wait` flag, because later steps need their output.
//!
//! There is no reordering by inferred template dependency: a template that
//! references a later step's id resolves verbatim and will very likely
//! cause a downstream remote failure. One level of nesting only — a
//! composed step targeting a composed skill is rejected.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::Value;
use std::time::Duration;

use super::adapter::{submit_and_wait, ExecutionResult, SubmitOptions, WorkflowSource};
use super::builder::build_workflow;
use super::client::WorkflowApi;
use super::connections::auto_resolve;
use crate::error::EngineError;
use crate::skills::{AtomicSkill, ComposedSkill, PackStore, SkillDefinition, Step, StepAction};
use crate::template;

pub use super::adapter::{DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS};

/// Options for one skill invocation.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub wait: bool,
    pub poll_interval_ms: u64,
    pub timeout_ms: u64,
    pub workspace_id: Option<String>,
    pub project_id: Option<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            wait: true,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            workspace_id: None,
            project_id: None,
        }
    }
}

impl RunOptions {
    fn submit_options(&self, wait: bool) -> SubmitOptions {
        SubmitOptions {
            wait,
            poll_interval_ms: self.poll_interval_ms,
            timeout_ms: self.timeout_ms,
            workspace_id: self.workspace_id.clone(),
        }
    }
}

/// What one invocation produced.
#[derive(Debug)]
pub struct ExecutionReport {
    pub invocation_id: String,
    pub skill: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: ReportOutcome,
}

#[derive(Debug)]
pub enum ReportOutcome {
    /// A single submitted run (terminal if waited).
    Atomic {
        workflow_id: String,
        run: ExecutionResult,
    },
    /// Every step id mapped to its result, plus the composed skill's
    /// declared outputs resolved against them.
    Composed {
        steps: IndexMap<String, Value>,
        outputs: IndexMap<String, Value>,
    },
}

impl ExecutionReport {
    pub fn to_json(&self) -> Value {
        let mut obj = serde_json::json!({
            "invocation_id": self.invocation_id,
            "skill": self.skill,
            "started_at": self.started_at.to_rfc3339(),
            "finished_at": self.finished_at.to_rfc3339(),
        });
        match &self.outcome {
            ReportOutcome::Atomic { workflow_id, run } => {
                obj["workflow_id"] = Value::String(workflow_id.clone());
                obj["run"] = run.to_json();
            }
            ReportOutcome::Composed { steps, outputs } => {
                obj["steps"] = serde_json::to_value(steps).unwrap_or(Value::Null);
                if !outputs.is_empty() {
                    obj["outputs"] = serde_json::to_value(outputs).unwrap_or(Value::Null);
                }
            }
        }
        obj
    }
}

/// Executes skills against a remote workflow API and an installed-pack
/// store. Owns no state beyond the borrowed context; each invocation owns
/// its own step-result mapping and run handles.
pub struct SkillRunner<'a> {
    api: &'a dyn WorkflowApi,
    store: &'a PackStore,
}

impl<'a> SkillRunner<'a> {
    pub fn new(api: &'a dyn WorkflowApi, store: &'a PackStore) -> Self {
        Self { api, store }
    }

    /// Run a named skill with the given invocation input.
    pub async fn run_skill(
        &self,
        name: &str,
        input: IndexMap<String, Value>,
        opts: &RunOptions,
    ) -> Result<ExecutionReport, EngineError> {
        let skill = self
            .store
            .find_skill(name)
            .map(|(_, skill)| skill.clone())
            .ok_or_else(|| EngineError::SkillNotFound(name.to_string()))?;

        let invocation_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        tracing::info!(
            "[SkillRunner] {} invoking '{}' ({})",
            invocation_id,
            name,
            skill.kind()
        );

        let outcome = match &skill {
            SkillDefinition::Atomic(atomic) => self.run_atomic(atomic, &input, opts).await?,
            SkillDefinition::Composed(composed) => {
                self.run_composed(composed, &input, opts).await?
            }
        };

        Ok(ExecutionReport {
            invocation_id,
            skill: name.to_string(),
            started_at,
            finished_at: Utc::now(),
            outcome,
        })
    }

    /// Direct atomic-skill invocation: one workflow, caller's `wait` flag.
    async fn run_atomic(
        &self,
        skill: &AtomicSkill,
        input: &IndexMap<String, Value>,
        opts: &RunOptions,
    ) -> Result<ReportOutcome, EngineError> {
        let source = self.workflow_source(skill, opts).await?;
        let result = submit_and_wait(
            self.api,
            source,
            to_object(input),
            &opts.submit_options(opts.wait),
        )
        .await?;

        Ok(ReportOutcome::Atomic {
            workflow_id: result.workflow_id.clone(),
            run: result,
        })
    }

    /// Composed-skill run: ordered steps, abort on first failure.
    async fn run_composed(
        &self,
        skill: &ComposedSkill,
        input: &IndexMap<String, Value>,
        opts: &RunOptions,
    ) -> Result<ReportOutcome, EngineError> {
        if skill.steps.is_empty() {
            return Err(EngineError::NoSteps(skill.name.clone()));
        }

        let mut step_results: IndexMap<String, Value> = IndexMap::new();

        for (i, step) in skill.steps.iter().enumerate() {
            tracing::info!(
                "[SkillRunner] step {}/{}: {}",
                i + 1,
                skill.steps.len(),
                step.id
            );
            let resolved = template::resolve_inputs(&step.inputs, input, &step_results);

            let result = match &step.action {
                StepAction::Local { script, .. } => {
                    self.run_local_step(step, script, &resolved, opts).await?
                }
                StepAction::Skill { skill: target } => {
                    self.run_skill_step(step, target, &resolved, opts).await?
                }
            };

            step_results.insert(step.id.clone(), result);
        }

        let outputs = skill
            .outputs
            .iter()
            .map(|(name, tmpl)| (name.clone(), template::resolve(tmpl, input, &step_results)))
            .collect();

        Ok(ReportOutcome::Composed {
            steps: step_results,
            outputs,
        })
    }

    /// Local step: run the declared script as a subprocess, every resolved
    /// input exposed as an environment variable named by the input key,
    /// parent environment inherited. The step result is the trimmed
    /// standard output under an `output` key.
    async fn run_local_step(
        &self,
        step: &Step,
        script: &str,
        resolved: &IndexMap<String, Value>,
        opts: &RunOptions,
    ) -> Result<Value, EngineError> {
        if script.trim().is_empty() {
            return Err(EngineError::LocalStepMissingScript(step.id.clone()));
        }

        let mut command = tokio::process::Command::new(script);
        for (key, value) in resolved {
            command.env(key, stringify(value));
        }
        command.kill_on_drop(true);

        let output = tokio::time::timeout(
            Duration::from_millis(opts.timeout_ms),
            command.output(),
        )
        .await
        .map_err(|_| EngineError::StepTimeout {
            step: step.id.clone(),
            target: script.to_string(),
            elapsed_ms: opts.timeout_ms,
        })?
        .map_err(|e| EngineError::StepFailed {
            step: step.id.clone(),
            target: script.to_string(),
            status: "spawn_failed".to_string(),
            detail: serde_json::json!({"error": e.to_string()}),
        })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            return Err(EngineError::StepFailed {
                step: step.id.clone(),
                target: script.to_string(),
                status: format!("exit_{}", code),
                detail: serde_json::json!({
                    "exit_code": code,
                    "stderr": String::from_utf8_lossy(&output.stderr).trim(),
                }),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(serde_json::json!({ "output": stdout }))
    }

    /// Skill step: resolve the target across installed packs and run it as
    /// a nested atomic invocation, always blocking to terminal.
    async fn run_skill_step(
        &self,
        step: &Step,
        target: &str,
        resolved: &IndexMap<String, Value>,
        opts: &RunOptions,
    ) -> Result<Value, EngineError> {
        let definition = self
            .store
            .find_skill(target)
            .map(|(_, skill)| skill.clone())
            .ok_or_else(|| EngineError::SubSkillNotFound {
                step: step.id.clone(),
                skill: target.to_string(),
            })?;

        let atomic = match definition {
            SkillDefinition::Atomic(atomic) => atomic,
            SkillDefinition::Composed(_) => {
                return Err(EngineError::NestedComposedSkill {
                    step: step.id.clone(),
                    skill: target.to_string(),
                })
            }
        };

        let source = self
            .workflow_source(&atomic, opts)
            .await
            .map_err(|e| match e {
                EngineError::CreateFailed { detail } => EngineError::SubCreateFailed {
                    step: step.id.clone(),
                    skill: target.to_string(),
                    detail,
                },
                other => other,
            })?;

        // Later steps need this output, so wait regardless of the outer flag.
        let result = submit_and_wait(
            self.api,
            source,
            to_object(resolved),
            &opts.submit_options(true),
        )
        .await
        .map_err(|e| match e {
            EngineError::CreateFailed { detail } => EngineError::SubCreateFailed {
                step: step.id.clone(),
                skill: target.to_string(),
                detail,
            },
            other => other,
        })?;

        if result.timed_out {
            return Err(EngineError::StepTimeout {
                step: step.id.clone(),
                target: target.to_string(),
                elapsed_ms: result.elapsed_ms,
            });
        }
        if result.failed {
            return Err(EngineError::StepFailed {
                step: step.id.clone(),
                target: target.to_string(),
                status: result.status,
                detail: result.run,
            });
        }

        Ok(extract_step_output(result.run))
    }

    /// Reuse a workflow provisioned at pack-install time, else build one
    /// from the skill (resolving a connection for its declared category
    /// first, best-effort).
    async fn workflow_source(
        &self,
        skill: &AtomicSkill,
        opts: &RunOptions,
    ) -> Result<WorkflowSource, EngineError> {
        if let Some(id) = self.store.provisioned_workflow(&skill.name) {
            tracing::info!(
                "[SkillRunner] reusing provisioned workflow {} for '{}'",
                id,
                skill.name
            );
            return Ok(WorkflowSource::Existing(id.to_string()));
        }

        let connection_id = auto_resolve(
            self.api,
            skill.connection_category.as_deref(),
            opts.workspace_id.as_deref(),
            opts.project_id.as_deref(),
        )
        .await;

        let definition =
            build_workflow(skill, opts.project_id.as_deref(), connection_id.as_deref())?;
        Ok(WorkflowSource::Definition(definition))
    }
}

/// A run's extracted output: `output` field, then `result`, else the raw
/// run object.
fn extract_step_output(run: Value) -> Value {
    if let Some(output) = run.get("output") {
        return output.clone();
    }
    if let Some(result) = run.get("result") {
        return result.clone();
    }
    run
}

/// Stringify a resolved value for environment-variable export.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn to_object(map: &IndexMap<String, Value>) -> Value {
    Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    )
}
