//! Skill and pack data model.
//!
//! Skills are declared in YAML, one file per skill. An atomic skill binds a
//! name to a single remote workflow node type:
//!
//! ```yaml
//! kind: Skill
//! name: ask-ai
//! version: "0.1.0"
//! node_type: "llm.chat"
//! connection_category: "openai"
//! defaults:
//!   temperature: 0.7
//! inputs:
//!   prompt:
//!     field: human_message
//!     required: true
//!     description: "What to ask"
//! outputs:
//!   generated_text:
//!     field: response
//! ```
//!
//! A composed skill is an ordered pipeline of steps, each either a nested
//! atomic-skill invocation or a local script:
//!
//! ```yaml
//! kind: ComposedSkill
//! name: write-post
//! steps:
//!   - id: step1
//!     skill: ask-ai
//!     inputs:
//!       prompt: "Write about {{topic}}"
//!   - id: step2
//!     local: true
//!     script: ./scripts/publish.sh
//!     inputs:
//!       body: "{{step1.generated_text}}"
//! outputs:
//!   post: "{{step1.generated_text}}"
//! ```

pub mod store;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::error::EngineError;

pub use store::{InstalledPack, PackStore};

/// A skill definition, tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SkillDefinition {
    #[serde(rename = "Skill")]
    Atomic(AtomicSkill),
    #[serde(rename = "ComposedSkill")]
    Composed(ComposedSkill),
}

/// An atomic skill — a thin binding to one remote workflow node type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtomicSkill {
    pub name: String,

    #[serde(default = "default_version")]
    pub version: String,

    /// Capability identifier — the remote node type this skill runs.
    pub node_type: String,

    /// Credential category used for best-effort connection resolution.
    #[serde(default)]
    pub connection_category: Option<String>,

    /// Node configuration baked into every invocation.
    #[serde(default)]
    pub defaults: IndexMap<String, Value>,

    /// Declared inputs, keyed by invocation-level parameter name.
    #[serde(default)]
    pub inputs: IndexMap<String, InputSpec>,

    /// Declared outputs, keyed by output name.
    #[serde(default)]
    pub outputs: IndexMap<String, OutputSpec>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// One declared input: which node field it feeds, and how.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSpec {
    /// The underlying node field this input maps to.
    pub field: String,

    #[serde(default)]
    pub required: bool,

    /// Literal default, baked into the workflow at build time when the
    /// input is optional.
    #[serde(default)]
    pub default: Option<Value>,

    #[serde(default)]
    pub description: Option<String>,
}

/// One declared output: the node field it reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSpec {
    pub field: String,
}

/// A composed skill — an ordered pipeline of steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposedSkill {
    pub name: String,

    #[serde(default = "default_version")]
    pub version: String,

    pub steps: Vec<Step>,

    /// Output templates resolved against the final step results.
    #[serde(default)]
    pub outputs: IndexMap<String, String>,
}

/// One step in a composed skill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Unique within the composed skill; later steps reference this id in
    /// templates (`{{id.field}}`).
    pub id: String,

    #[serde(flatten)]
    pub action: StepAction,

    /// Template mapping resolved against invocation input + prior results.
    #[serde(default)]
    pub inputs: IndexMap<String, Value>,
}

/// What a step does — exactly one variant, decided by field shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepAction {
    /// Run a local script as a subprocess.
    Local {
        local: bool,
        script: String,
    },
    /// Invoke another (atomic) skill.
    Skill { skill: String },
}

impl SkillDefinition {
    pub fn name(&self) -> &str {
        match self {
            SkillDefinition::Atomic(s) => &s.name,
            SkillDefinition::Composed(s) => &s.name,
        }
    }

    pub fn version(&self) -> &str {
        match self {
            SkillDefinition::Atomic(s) => &s.version,
            SkillDefinition::Composed(s) => &s.version,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SkillDefinition::Atomic(_) => "Skill",
            SkillDefinition::Composed(_) => "ComposedSkill",
        }
    }

    /// Parse a skill definition from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, EngineError> {
        let skill: SkillDefinition =
            serde_yaml::from_str(yaml).map_err(|e| EngineError::InvalidSkill {
                name: "<unparsed>".to_string(),
                reason: format!("YAML parse error: {}", e),
            })?;
        skill.validate()?;
        Ok(skill)
    }

    /// Enforce the model invariants: a capability identifier on atomic
    /// skills, at least one step and unique step ids on composed ones.
    pub fn validate(&self) -> Result<(), EngineError> {
        match self {
            SkillDefinition::Atomic(skill) => {
                if skill.node_type.trim().is_empty() {
                    return Err(EngineError::InvalidSkill {
                        name: skill.name.clone(),
                        reason: "atomic skill must declare a node_type".to_string(),
                    });
                }
            }
            SkillDefinition::Composed(skill) => {
                if skill.steps.is_empty() {
                    return Err(EngineError::NoSteps(skill.name.clone()));
                }
                let mut seen = HashSet::new();
                for step in &skill.steps {
                    if !seen.insert(step.id.as_str()) {
                        return Err(EngineError::InvalidSkill {
                            name: skill.name.clone(),
                            reason: format!("duplicate step id '{}'", step.id),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Static pack metadata (`pack.yaml`). Consumed only to locate which skill
/// or workflow definition to run; never mutated by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackManifest {
    pub name: String,

    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub entrypoint: Option<Entrypoint>,
}

/// What a pack runs by default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entrypoint {
    #[serde(default)]
    pub skill: Option<String>,

    #[serde(default)]
    pub workflow: Option<String>,
}

/// Install-time record (`install.json`): skill name → workflow id
/// provisioned remotely at pack-install time, reused instead of recreating
/// a workflow per invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallRecord {
    #[serde(default)]
    pub workflows: IndexMap<String, String>,
}
