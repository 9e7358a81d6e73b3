//! Connection auto-resolution.
//!
//! A skill may declare a credential category ("openai", "slack", ...).
//! Resolution is best-effort by contract: failures are swallowed and the
//! step proceeds without an explicit connection — a missing-connection
//! error, if any, surfaces later from the remote API as an ordinary step
//! failure.

use serde_json::Value;

use super::client::WorkflowApi;

const CONNECTION_LIST_LIMIT: u32 = 100;

/// Pick a usable connection id for a category. Case-insensitive: exact
/// match preferred, else substring match in either direction. First match
/// wins; no ranking among multiple candidates.
pub fn resolve_connection(category: &str, connections: &[Value]) -> Option<String> {
    let wanted = category.to_lowercase();

    let category_of = |conn: &Value| -> Option<String> {
        conn.get("category")
            .and_then(|v| v.as_str())
            .map(|s| s.to_lowercase())
    };
    let id_of = |conn: &Value| -> Option<String> {
        conn.get("id").and_then(|v| v.as_str()).map(str::to_string)
    };

    if let Some(conn) = connections
        .iter()
        .find(|c| category_of(c).as_deref() == Some(wanted.as_str()))
    {
        return id_of(conn);
    }

    connections
        .iter()
        .find(|c| {
            category_of(c)
                .map(|cat| cat.contains(&wanted) || wanted.contains(&cat))
                .unwrap_or(false)
        })
        .and_then(id_of)
}

/// Fetch connections and resolve, swallowing every failure.
pub async fn auto_resolve(
    api: &dyn WorkflowApi,
    category: Option<&str>,
    workspace_id: Option<&str>,
    project_id: Option<&str>,
) -> Option<String> {
    let category = category?;

    let connections = match api
        .list_connections(workspace_id, project_id, CONNECTION_LIST_LIMIT)
        .await
    {
        Ok(connections) => connections,
        Err(e) => {
            tracing::warn!(
                "[Connections] lookup for category '{}' failed: {}",
                category,
                e
            );
            return None;
        }
    };

    let resolved = resolve_connection(category, &connections);
    match &resolved {
        Some(id) => tracing::info!("[Connections] '{}' resolved to {}", category, id),
        None => tracing::warn!("[Connections] no connection matches '{}'", category),
    }
    resolved
}
