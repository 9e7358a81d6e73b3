//! `packrun skill` — inspect installed skills.

use packrun_core::EngineError;

use super::{load_context, truncate};

pub fn list(packs_dir: Option<&str>) -> Result<(), EngineError> {
    let (_, store) = load_context(packs_dir);

    println!("┌──────────────────────┬──────────────┬──────────┬──────────────────┐");
    println!("│ Skill                │ Kind         │ Version  │ Pack             │");
    println!("├──────────────────────┼──────────────┼──────────┼──────────────────┤");
    for (pack, skill) in store.skills() {
        println!(
            "│ {:<20} │ {:<12} │ {:<8} │ {:<16} │",
            truncate(skill.name(), 20),
            skill.kind(),
            truncate(skill.version(), 8),
            truncate(&pack.manifest.name, 16),
        );
    }
    println!("└──────────────────────┴──────────────┴──────────┴──────────────────┘");
    Ok(())
}

pub fn show(packs_dir: Option<&str>, name: &str) -> Result<(), EngineError> {
    let (_, store) = load_context(packs_dir);
    let (pack, skill) = store
        .find_skill(name)
        .ok_or_else(|| EngineError::SkillNotFound(name.to_string()))?;

    println!("# from pack '{}' ({})", pack.manifest.name, pack.path.display());
    if let Some(workflow_id) = store.provisioned_workflow(name) {
        println!("# provisioned workflow: {}", workflow_id);
    }
    match serde_yaml::to_string(skill) {
        Ok(yaml) => print!("{}", yaml),
        Err(e) => {
            return Err(EngineError::RequestFailed {
                message: format!("cannot render skill '{}': {}", name, e),
                detail: None,
            })
        }
    }
    Ok(())
}
