//! Core error type for the Packrun engine.
//!
//! Every failure the engine can surface carries a stable machine-readable
//! code (`EngineError::code()`) and, where useful, a JSON diagnostic blob
//! (`EngineError::detail()`) such as the raw remote run object. Callers can
//! tell a template authoring mistake from a remote execution failure from a
//! missing-credential condition without parsing messages.

use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("skill '{0}' not found in any installed pack")]
    SkillNotFound(String),

    #[error("skill '{name}' is invalid: {reason}")]
    InvalidSkill { name: String, reason: String },

    #[error("composed skill '{0}' has no steps")]
    NoSteps(String),

    #[error("step '{0}' is a local step but declares no script")]
    LocalStepMissingScript(String),

    #[error("step '{step}' references unknown skill '{skill}'")]
    SubSkillNotFound { step: String, skill: String },

    #[error("step '{step}' targets composed skill '{skill}'; composed skills cannot nest")]
    NestedComposedSkill { step: String, skill: String },

    #[error("step '{step}' ({target}) failed with status '{status}'")]
    StepFailed {
        step: String,
        target: String,
        status: String,
        detail: Value,
    },

    #[error("step '{step}' ({target}) did not reach a terminal status within {elapsed_ms}ms")]
    StepTimeout {
        step: String,
        target: String,
        elapsed_ms: u64,
    },

    #[error("workflow creation returned no id")]
    CreateFailed { detail: Value },

    #[error("workflow creation for step '{step}' ({skill}) returned no id")]
    SubCreateFailed {
        step: String,
        skill: String,
        detail: Value,
    },

    #[error("no API key configured (set PACKRUN_API_KEY or api_key in the config file)")]
    MissingApiKey,

    #[error("request failed: {message}")]
    RequestFailed {
        message: String,
        detail: Option<Value>,
    },
}

impl EngineError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::SkillNotFound(_) => "skill_not_found",
            EngineError::InvalidSkill { .. } => "skill_invalid",
            EngineError::NoSteps(_) => "skill_run_no_steps",
            EngineError::LocalStepMissingScript(_) => "skill_run_local_no_script",
            EngineError::SubSkillNotFound { .. } => "skill_run_sub_not_found",
            EngineError::NestedComposedSkill { .. } => "skill_run_nested_compose",
            EngineError::StepFailed { .. } => "skill_run_step_failed",
            EngineError::StepTimeout { .. } => "skill_run_step_timeout",
            EngineError::CreateFailed { .. } => "skill_run_create_failed",
            EngineError::SubCreateFailed { .. } => "skill_run_sub_create_failed",
            EngineError::MissingApiKey => "missing_api_key",
            EngineError::RequestFailed { .. } => "request_failed",
        }
    }

    /// Attached diagnostic detail, if any (e.g. the raw remote run object).
    pub fn detail(&self) -> Option<&Value> {
        match self {
            EngineError::StepFailed { detail, .. }
            | EngineError::CreateFailed { detail }
            | EngineError::SubCreateFailed { detail, .. } => Some(detail),
            EngineError::RequestFailed { detail, .. } => detail.as_ref(),
            _ => None,
        }
    }

    /// Serialize to the tagged failure object exposed to callers.
    pub fn to_json(&self) -> Value {
        let mut obj = serde_json::json!({
            "code": self.code(),
            "message": self.to_string(),
        });
        if let Some(detail) = self.detail() {
            obj["detail"] = detail.clone();
        }
        obj
    }
}
