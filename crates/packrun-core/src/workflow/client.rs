//! Remote workflow API client.
//!
//! The remote API is a black box exposing four operations; `WorkflowApi`
//! is the seam the executor depends on, and `HttpWorkflowClient` is the
//! reqwest implementation. Response shapes are tolerated loosely (run ids
//! and statuses appear under several spellings across backend releases),
//! so everything is passed around as `serde_json::Value`.

use async_trait::async_trait;
use serde_json::Value;

use crate::config::EngineConfig;
use crate::error::EngineError;

/// The four remote operations the engine consumes.
#[async_trait]
pub trait WorkflowApi: Send + Sync {
    /// Create a workflow resource from a raw definition; returns the
    /// creation response (expected to carry an `id`).
    async fn create_workflow(
        &self,
        definition: &Value,
        workspace_id: Option<&str>,
    ) -> Result<Value, EngineError>;

    /// Submit a run against a workflow id; returns the run object.
    async fn run_workflow(&self, workflow_id: &str, input: &Value) -> Result<Value, EngineError>;

    /// Fetch the current state of a run.
    async fn get_run(&self, run_id: &str) -> Result<Value, EngineError>;

    /// List available credential connections.
    async fn list_connections(
        &self,
        workspace_id: Option<&str>,
        project_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<Value>, EngineError>;
}

/// HTTP implementation over reqwest with bearer auth.
#[derive(Debug)]
pub struct HttpWorkflowClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpWorkflowClient {
    /// Build a client from config. Fails fast when no API key is set —
    /// cheapest failure to report before any network call.
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or(EngineError::MissingApiKey)?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn request(&self, req: reqwest::RequestBuilder) -> Result<Value, EngineError> {
        let response = req
            .header("authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .send()
            .await
            .map_err(|e| EngineError::RequestFailed {
                message: format!("HTTP request failed: {}", e),
                detail: None,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| EngineError::RequestFailed {
                message: format!("failed to read response body: {}", e),
                detail: None,
            })?;

        if !status.is_success() {
            return Err(EngineError::RequestFailed {
                message: format!("API returned {}", status),
                detail: serde_json::from_str(&body)
                    .ok()
                    .or(Some(Value::String(body))),
            });
        }

        serde_json::from_str(&body).map_err(|e| EngineError::RequestFailed {
            message: format!("failed to parse response JSON: {}", e),
            detail: Some(Value::String(body)),
        })
    }
}

#[async_trait]
impl WorkflowApi for HttpWorkflowClient {
    async fn create_workflow(
        &self,
        definition: &Value,
        workspace_id: Option<&str>,
    ) -> Result<Value, EngineError> {
        let url = format!("{}/v1/workflows", self.base_url);
        let mut body = definition.clone();
        if let (Some(ws), Some(obj)) = (workspace_id, body.as_object_mut()) {
            obj.insert("workspace_id".to_string(), Value::String(ws.to_string()));
        }
        tracing::info!("[WorkflowApi] POST {}", url);
        self.request(self.client.post(&url).json(&body)).await
    }

    async fn run_workflow(&self, workflow_id: &str, input: &Value) -> Result<Value, EngineError> {
        let url = format!("{}/v1/runs", self.base_url);
        let body = serde_json::json!({
            "workflow_id": workflow_id,
            "input": input,
        });
        tracing::info!("[WorkflowApi] POST {} (workflow: {})", url, workflow_id);
        self.request(self.client.post(&url).json(&body)).await
    }

    async fn get_run(&self, run_id: &str) -> Result<Value, EngineError> {
        let url = format!("{}/v1/runs/{}", self.base_url, run_id);
        self.request(self.client.get(&url)).await
    }

    async fn list_connections(
        &self,
        workspace_id: Option<&str>,
        project_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<Value>, EngineError> {
        let url = format!("{}/v1/connections", self.base_url);
        let mut req = self.client.get(&url).query(&[("limit", limit.to_string())]);
        if let Some(ws) = workspace_id {
            req = req.query(&[("workspace_id", ws)]);
        }
        if let Some(project) = project_id {
            req = req.query(&[("project_id", project)]);
        }
        let json = self.request(req).await?;

        // Either a bare array or {"connections": [...]}
        let list = match json {
            Value::Array(items) => items,
            Value::Object(mut obj) => match obj.remove("connections") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        Ok(list)
    }
}

/// Pull a run id out of a run object, tolerating backend spellings.
pub fn extract_run_id(run: &Value) -> Option<String> {
    for key in ["id", "workflow_run_id", "run_id"] {
        if let Some(id) = run.get(key).and_then(|v| v.as_str()) {
            return Some(id.to_string());
        }
    }
    None
}

/// Pull a status string out of a run object, tolerating backend spellings.
pub fn extract_status(run: &Value) -> String {
    run.get("status")
        .or_else(|| run.get("state"))
        .or_else(|| run.get("execution").and_then(|e| e.get("status")))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str) -> EngineConfig {
        EngineConfig {
            base_url: base_url.to_string(),
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_api_key_rejected() {
        let err = HttpWorkflowClient::new(&EngineConfig::default()).unwrap_err();
        assert_eq!(err.code(), "missing_api_key");
    }

    #[test]
    fn test_extract_run_id_spellings() {
        assert_eq!(extract_run_id(&json!({"id": "r1"})).unwrap(), "r1");
        assert_eq!(
            extract_run_id(&json!({"workflow_run_id": "r2"})).unwrap(),
            "r2"
        );
        assert_eq!(extract_run_id(&json!({"run_id": "r3"})).unwrap(), "r3");
        assert!(extract_run_id(&json!({"other": 1})).is_none());
    }

    #[test]
    fn test_extract_status_spellings() {
        assert_eq!(extract_status(&json!({"status": "running"})), "running");
        assert_eq!(extract_status(&json!({"state": "queued"})), "queued");
        assert_eq!(
            extract_status(&json!({"execution": {"status": "completed"}})),
            "completed"
        );
        assert_eq!(extract_status(&json!({})), "");
    }

    #[tokio::test]
    async fn test_create_workflow_attaches_workspace() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/workflows"))
            .and(body_json(json!({"name": "wf", "workspace_id": "ws_1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "wf_9"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpWorkflowClient::new(&config(&server.uri())).unwrap();
        let created = client
            .create_workflow(&json!({"name": "wf"}), Some("ws_1"))
            .await
            .unwrap();
        assert_eq!(created["id"], "wf_9");
    }

    #[tokio::test]
    async fn test_run_and_get_run() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/runs"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "run_1", "status": "queued"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/runs/run_1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "run_1", "status": "succeeded"})),
            )
            .mount(&server)
            .await;

        let client = HttpWorkflowClient::new(&config(&server.uri())).unwrap();
        let run = client
            .run_workflow("wf_9", &json!({"prompt": "hi"}))
            .await
            .unwrap();
        assert_eq!(extract_run_id(&run).unwrap(), "run_1");

        let refreshed = client.get_run("run_1").await.unwrap();
        assert_eq!(extract_status(&refreshed), "succeeded");
    }

    #[tokio::test]
    async fn test_list_connections_wrapped_shape() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/connections"))
            .and(query_param("limit", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"connections": [{"id": "conn_1", "category": "openai"}]}),
            ))
            .mount(&server)
            .await;

        let client = HttpWorkflowClient::new(&config(&server.uri())).unwrap();
        let connections = client.list_connections(None, None, 50).await.unwrap();
        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0]["id"], "conn_1");
    }

    #[tokio::test]
    async fn test_non_2xx_surfaces_request_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/runs/missing"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"error": "no such run"})),
            )
            .mount(&server)
            .await;

        let client = HttpWorkflowClient::new(&config(&server.uri())).unwrap();
        let err = client.get_run("missing").await.unwrap_err();
        assert_eq!(err.code(), "request_failed");
        assert_eq!(err.detail().unwrap()["error"], "no such run");
    }
}
