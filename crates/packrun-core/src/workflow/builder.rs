//! Workflow-from-skill builder.
//!
//! Turns an atomic skill into a single-node workflow definition. The node
//! is always named `"main"`; required inputs become invocation-level
//! template placeholders (`"{{name}}"`), optional inputs with a default
//! are baked in as literals at build time.

use serde_json::{json, Value};

use crate::error::EngineError;
use crate::skills::AtomicSkill;

pub const MAIN_NODE: &str = "main";

/// Build a workflow definition from an atomic skill.
///
/// Composed skills are unrepresentable here — the executor dispatches on
/// the skill kind before calling in.
pub fn build_workflow(
    skill: &AtomicSkill,
    project_id: Option<&str>,
    connection_id: Option<&str>,
) -> Result<Value, EngineError> {
    if skill.node_type.trim().is_empty() {
        return Err(EngineError::InvalidSkill {
            name: skill.name.clone(),
            reason: "atomic skill must declare a node_type".to_string(),
        });
    }

    // Node inputs: defaults, then per declared input either a placeholder
    // (required) or the baked literal default (optional with default).
    let mut node_inputs = serde_json::Map::new();
    for (key, value) in &skill.defaults {
        node_inputs.insert(key.clone(), value.clone());
    }
    for (name, spec) in &skill.inputs {
        if spec.required {
            node_inputs.insert(spec.field.clone(), json!(format!("{{{{{}}}}}", name)));
        } else if let Some(default) = &spec.default {
            node_inputs.insert(spec.field.clone(), default.clone());
        }
    }

    let required: Vec<&str> = skill
        .inputs
        .iter()
        .filter(|(_, spec)| spec.required)
        .map(|(name, _)| name.as_str())
        .collect();

    let mut fields = serde_json::Map::new();
    for (name, spec) in &skill.inputs {
        let mut field = serde_json::Map::new();
        if let Some(description) = &spec.description {
            field.insert("description".to_string(), json!(description));
        }
        if let Some(default) = &spec.default {
            field.insert("default".to_string(), default.clone());
        }
        fields.insert(name.clone(), Value::Object(field));
    }

    let mut outputs = serde_json::Map::new();
    for (name, spec) in &skill.outputs {
        outputs.insert(
            name.clone(),
            json!(format!("${{{}.{}}}", MAIN_NODE, spec.field)),
        );
    }

    let mut node = json!({
        "name": MAIN_NODE,
        "type": skill.node_type,
        "inputs": Value::Object(node_inputs),
    });
    if let Some(conn) = connection_id {
        node["connection_id"] = json!(conn);
    }

    let mut workflow = json!({
        "name": skill.name,
        "version": skill.version,
        "nodes": [node],
        "input_schema": {
            "required": required,
            "fields": Value::Object(fields),
        },
        "outputs": Value::Object(outputs),
    });
    if let Some(project) = project_id {
        workflow["project_id"] = json!(project);
    }

    Ok(workflow)
}

/// Local payload-shape gate, checked before any network call: a workflow
/// must carry at least one node and every node a non-empty name and type.
pub fn validate_shape(definition: &Value) -> Result<(), String> {
    let nodes = definition
        .get("nodes")
        .and_then(|n| n.as_array())
        .ok_or_else(|| "workflow has no nodes".to_string())?;
    if nodes.is_empty() {
        return Err("workflow has no nodes".to_string());
    }
    for (i, node) in nodes.iter().enumerate() {
        let name = node.get("name").and_then(|v| v.as_str()).unwrap_or("");
        let node_type = node.get("type").and_then(|v| v.as_str()).unwrap_or("");
        if name.is_empty() || node_type.is_empty() {
            return Err(format!("node {} is missing a name or type", i));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::{InputSpec, OutputSpec};
    use indexmap::IndexMap;

    fn ask_ai() -> AtomicSkill {
        let mut inputs = IndexMap::new();
        inputs.insert(
            "prompt".to_string(),
            InputSpec {
                field: "human_message".to_string(),
                required: true,
                default: None,
                description: Some("What to ask".to_string()),
            },
        );
        inputs.insert(
            "temperature".to_string(),
            InputSpec {
                field: "temperature".to_string(),
                required: false,
                default: Some(json!(0.7)),
                description: None,
            },
        );
        let mut outputs = IndexMap::new();
        outputs.insert(
            "generated_text".to_string(),
            OutputSpec {
                field: "response".to_string(),
            },
        );
        AtomicSkill {
            name: "ask-ai".to_string(),
            version: "0.1.0".to_string(),
            node_type: "llm.chat".to_string(),
            connection_category: Some("openai".to_string()),
            defaults: IndexMap::new(),
            inputs,
            outputs,
        }
    }

    #[test]
    fn test_build_inputs_and_required_list() {
        let workflow = build_workflow(&ask_ai(), None, None).unwrap();
        let node = &workflow["nodes"][0];
        assert_eq!(node["name"], "main");
        assert_eq!(node["type"], "llm.chat");
        assert_eq!(node["inputs"]["human_message"], "{{prompt}}");
        assert_eq!(node["inputs"]["temperature"], json!(0.7));

        let required = workflow["input_schema"]["required"].as_array().unwrap();
        assert!(required.contains(&json!("prompt")));
        assert!(!required.contains(&json!("temperature")));
        assert!(workflow["input_schema"]["fields"]["prompt"]["description"].is_string());
    }

    #[test]
    fn test_output_mapping_references_main_node() {
        let workflow = build_workflow(&ask_ai(), None, None).unwrap();
        assert_eq!(workflow["outputs"]["generated_text"], "${main.response}");
    }

    #[test]
    fn test_project_and_connection_attached() {
        let workflow = build_workflow(&ask_ai(), Some("proj_1"), Some("conn_1")).unwrap();
        assert_eq!(workflow["project_id"], "proj_1");
        assert_eq!(workflow["nodes"][0]["connection_id"], "conn_1");
    }

    #[test]
    fn test_defaults_merged_before_inputs() {
        let mut skill = ask_ai();
        skill.defaults.insert("model".to_string(), json!("gpt-4o"));
        let workflow = build_workflow(&skill, None, None).unwrap();
        assert_eq!(workflow["nodes"][0]["inputs"]["model"], "gpt-4o");
    }

    #[test]
    fn test_missing_node_type_fails() {
        let mut skill = ask_ai();
        skill.node_type = String::new();
        let err = build_workflow(&skill, None, None).unwrap_err();
        assert_eq!(err.code(), "skill_invalid");
    }

    #[test]
    fn test_built_workflow_passes_shape_gate() {
        let workflow = build_workflow(&ask_ai(), None, None).unwrap();
        assert!(validate_shape(&workflow).is_ok());
        assert!(validate_shape(&json!({"nodes": []})).is_err());
        assert!(validate_shape(&json!({"nodes": [{"name": "main"}]})).is_err());
    }
}
