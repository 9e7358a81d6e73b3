//! `packrun pack` — inspect installed packs.

use packrun_core::EngineError;

use super::{load_context, truncate};

pub fn list(packs_dir: Option<&str>) -> Result<(), EngineError> {
    let (config, store) = load_context(packs_dir);

    println!("Packs in {}:", config.packs_root().display());
    if store.packs().is_empty() {
        println!("  (none installed)");
        return Ok(());
    }

    for pack in store.packs() {
        let entrypoint = pack
            .manifest
            .entrypoint
            .as_ref()
            .and_then(|e| e.skill.clone().or_else(|| e.workflow.clone()))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  • {:<18} v{:<8} {} skill(s), entrypoint: {}",
            truncate(&pack.manifest.name, 18),
            pack.manifest.version,
            pack.skills.len(),
            entrypoint,
        );
        if let Some(description) = &pack.manifest.description {
            println!("    {}", truncate(description, 72));
        }
    }
    Ok(())
}
