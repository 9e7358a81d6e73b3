//! CLI command implementations.
//!
//! Each submodule corresponds to a top-level CLI command and reuses the
//! packrun-core engine through an explicitly-constructed context (config +
//! pack store) rather than any process-wide state.

pub mod pack;
pub mod run;
pub mod skill;

use std::path::PathBuf;

use packrun_core::{EngineConfig, PackStore};

/// Load config and the pack store for one command invocation.
pub fn load_context(packs_dir: Option<&str>) -> (EngineConfig, PackStore) {
    let mut config = EngineConfig::load();
    if let Some(dir) = packs_dir {
        config.packs_dir = Some(PathBuf::from(dir));
    }
    let store = PackStore::load(&config.packs_root());
    (config, store)
}

/// Pretty-print a JSON value to stdout.
pub fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    );
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", truncated)
    }
}
