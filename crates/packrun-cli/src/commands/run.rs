//! `packrun run` — execute a skill.

use indexmap::IndexMap;
use serde_json::Value;

use packrun_core::workflow::ReportOutcome;
use packrun_core::{EngineError, HttpWorkflowClient, RunOptions, SkillRunner};

use super::{load_context, print_json, truncate};

pub struct RunArgs {
    pub skill: String,
    pub inputs: Vec<String>,
    pub input_json: Option<String>,
    pub wait: bool,
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub workspace_id: Option<String>,
    pub project_id: Option<String>,
    pub json: bool,
    pub packs_dir: Option<String>,
}

pub async fn run(args: RunArgs) -> Result<(), EngineError> {
    let (mut config, store) = load_context(args.packs_dir.as_deref());
    if args.workspace_id.is_some() {
        config.workspace_id = args.workspace_id.clone();
    }
    if args.project_id.is_some() {
        config.project_id = args.project_id.clone();
    }

    let input = parse_input(&args.inputs, args.input_json.as_deref())?;

    let client = HttpWorkflowClient::new(&config)?;
    let runner = SkillRunner::new(&client, &store);
    let opts = RunOptions {
        wait: args.wait,
        poll_interval_ms: args.poll_interval_ms,
        timeout_ms: args.timeout_ms,
        workspace_id: config.workspace_id.clone(),
        project_id: config.project_id.clone(),
    };

    println!("▶ Running skill '{}'", args.skill);
    let report = runner.run_skill(&args.skill, input, &opts).await?;
    tracing::info!("[Run] invocation {} finished", report.invocation_id);

    if args.json {
        print_json(&report.to_json());
        return Ok(());
    }

    match &report.outcome {
        ReportOutcome::Atomic { workflow_id, run } => {
            println!("  Workflow : {}", workflow_id);
            println!("  Run      : {}", run.run_id);
            println!("  Status   : {}", run.status);
            if run.timed_out {
                println!("  ⏱ Polling timed out after {}ms", run.elapsed_ms);
            } else if run.terminal {
                println!("  ✅ Terminal after {}ms", run.elapsed_ms);
            } else {
                println!("  ⏳ Submitted without waiting");
            }
        }
        ReportOutcome::Composed { steps, outputs } => {
            println!("  ✅ {} step(s) completed", steps.len());
            for (id, result) in steps {
                println!("   • {} → {}", id, truncate(&compact(result), 70));
            }
            for (name, value) in outputs {
                println!("  out {} = {}", name, truncate(&compact(value), 70));
            }
        }
    }

    Ok(())
}

/// Merge `--input k=v` pairs with an optional `--input-json` object; the
/// JSON object wins on key conflicts.
fn parse_input(
    pairs: &[String],
    input_json: Option<&str>,
) -> Result<IndexMap<String, Value>, EngineError> {
    let mut input: IndexMap<String, Value> = IndexMap::new();

    for pair in pairs {
        let Some((key, raw)) = pair.split_once('=') else {
            return Err(EngineError::RequestFailed {
                message: format!("invalid --input '{}': expected KEY=VALUE", pair),
                detail: None,
            });
        };
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        input.insert(key.to_string(), value);
    }

    if let Some(raw) = input_json {
        let parsed: Value = serde_json::from_str(raw).map_err(|e| EngineError::RequestFailed {
            message: format!("invalid --input-json: {}", e),
            detail: None,
        })?;
        let Value::Object(obj) = parsed else {
            return Err(EngineError::RequestFailed {
                message: "--input-json must be a JSON object".to_string(),
                detail: None,
            });
        };
        for (key, value) in obj {
            input.insert(key, value);
        }
    }

    Ok(input)
}

fn compact(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
