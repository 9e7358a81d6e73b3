//! Installed-pack store.
//!
//! Scans a packs directory (default `~/.packrun/packs`) where each
//! subdirectory is one installed pack:
//!
//! ```text
//! <root>/
//!   blog-tools/
//!     pack.yaml          # manifest
//!     install.json       # skill name → provisioned workflow id
//!     skills/
//!       ask-ai.yaml
//!       write-post.yaml
//! ```
//!
//! Invalid or unreadable entries are skipped with a warning rather than
//! failing the whole scan. The store is built once per invocation context
//! and passed to the executor explicitly; there is no process-wide state.

use std::path::{Path, PathBuf};

use super::{InstallRecord, PackManifest, SkillDefinition};

/// One installed pack: manifest, skill definitions, install record.
#[derive(Debug, Clone)]
pub struct InstalledPack {
    pub manifest: PackManifest,
    pub skills: Vec<SkillDefinition>,
    pub install: InstallRecord,
    pub path: PathBuf,
}

impl InstalledPack {
    pub fn skill(&self, name: &str) -> Option<&SkillDefinition> {
        self.skills.iter().find(|s| s.name() == name)
    }
}

/// All installed packs, in directory-scan order.
#[derive(Debug, Default)]
pub struct PackStore {
    packs: Vec<InstalledPack>,
}

const MANIFEST_FILENAME: &str = "pack.yaml";
const INSTALL_FILENAME: &str = "install.json";
const SKILLS_DIRNAME: &str = "skills";

impl PackStore {
    /// Default packs root under the user's home directory.
    pub fn default_root() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".packrun")
            .join("packs")
    }

    /// Load every pack under `root`. A missing root yields an empty store.
    pub fn load(root: &Path) -> Self {
        let mut packs = Vec::new();

        let entries = match std::fs::read_dir(root) {
            Ok(entries) => entries,
            Err(_) => {
                tracing::warn!("[PackStore] packs directory '{}' not found", root.display());
                return Self { packs };
            }
        };

        let mut dirs: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        dirs.sort();

        for dir in dirs {
            match load_pack(&dir) {
                Ok(pack) => {
                    tracing::info!(
                        "[PackStore] loaded pack '{}' ({} skill(s))",
                        pack.manifest.name,
                        pack.skills.len()
                    );
                    packs.push(pack);
                }
                Err(reason) => {
                    tracing::warn!("[PackStore] skipping '{}': {}", dir.display(), reason);
                }
            }
        }

        Self { packs }
    }

    /// Find a skill across all installed packs. First pack wins.
    pub fn find_skill(&self, name: &str) -> Option<(&InstalledPack, &SkillDefinition)> {
        self.packs
            .iter()
            .find_map(|pack| pack.skill(name).map(|skill| (pack, skill)))
    }

    /// Workflow id provisioned for a skill at pack-install time, if any.
    pub fn provisioned_workflow(&self, skill_name: &str) -> Option<&str> {
        self.packs
            .iter()
            .find_map(|pack| pack.install.workflows.get(skill_name))
            .map(String::as_str)
    }

    pub fn packs(&self) -> &[InstalledPack] {
        &self.packs
    }

    /// All skills across all packs, pack order preserved.
    pub fn skills(&self) -> impl Iterator<Item = (&InstalledPack, &SkillDefinition)> {
        self.packs
            .iter()
            .flat_map(|pack| pack.skills.iter().map(move |skill| (pack, skill)))
    }
}

fn load_pack(dir: &Path) -> Result<InstalledPack, String> {
    let manifest_path = dir.join(MANIFEST_FILENAME);
    let manifest_raw = std::fs::read_to_string(&manifest_path)
        .map_err(|e| format!("cannot read {}: {}", manifest_path.display(), e))?;
    let manifest: PackManifest =
        serde_yaml::from_str(&manifest_raw).map_err(|e| format!("invalid pack.yaml: {}", e))?;

    let install = match std::fs::read_to_string(dir.join(INSTALL_FILENAME)) {
        Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(
                "[PackStore] ignoring unreadable install.json in '{}': {}",
                dir.display(),
                e
            );
            InstallRecord::default()
        }),
        Err(_) => InstallRecord::default(),
    };

    let mut skills = Vec::new();
    let skills_dir = dir.join(SKILLS_DIRNAME);
    if skills_dir.is_dir() {
        let mut files: Vec<PathBuf> = std::fs::read_dir(&skills_dir)
            .map_err(|e| format!("cannot read skills dir: {}", e))?
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("yaml") | Some("yml")
                )
            })
            .collect();
        files.sort();

        for file in files {
            let raw = match std::fs::read_to_string(&file) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!("[PackStore] cannot read '{}': {}", file.display(), e);
                    continue;
                }
            };
            match SkillDefinition::from_yaml(&raw) {
                Ok(skill) => skills.push(skill),
                Err(e) => {
                    tracing::warn!("[PackStore] invalid skill '{}': {}", file.display(), e);
                }
            }
        }
    }

    Ok(InstalledPack {
        manifest,
        skills,
        install,
        path: dir.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_pack(root: &Path, name: &str) {
        let dir = root.join(name);
        std::fs::create_dir_all(dir.join("skills")).unwrap();
        std::fs::write(
            dir.join("pack.yaml"),
            format!(
                "name: {}\nversion: \"1.0.0\"\nentrypoint:\n  skill: ask-ai\n",
                name
            ),
        )
        .unwrap();
        std::fs::write(
            dir.join("install.json"),
            r#"{"workflows": {"ask-ai": "wf_provisioned"}}"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("skills/ask-ai.yaml"),
            r#"
kind: Skill
name: ask-ai
node_type: "llm.chat"
inputs:
  prompt:
    field: human_message
    required: true
"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("skills/write-post.yaml"),
            r#"
kind: ComposedSkill
name: write-post
steps:
  - id: step1
    skill: ask-ai
    inputs:
      prompt: "{{topic}}"
"#,
        )
        .unwrap();
    }

    #[test]
    fn test_load_and_lookup() {
        let tmp = tempfile::tempdir().unwrap();
        write_pack(tmp.path(), "blog-tools");

        let store = PackStore::load(tmp.path());
        assert_eq!(store.packs().len(), 1);
        assert_eq!(store.packs()[0].manifest.name, "blog-tools");

        let (pack, skill) = store.find_skill("ask-ai").unwrap();
        assert_eq!(pack.manifest.name, "blog-tools");
        assert_eq!(skill.kind(), "Skill");
        assert!(store.find_skill("write-post").is_some());
        assert!(store.find_skill("nope").is_none());
    }

    #[test]
    fn test_provisioned_workflow_lookup() {
        let tmp = tempfile::tempdir().unwrap();
        write_pack(tmp.path(), "blog-tools");

        let store = PackStore::load(tmp.path());
        assert_eq!(store.provisioned_workflow("ask-ai"), Some("wf_provisioned"));
        assert_eq!(store.provisioned_workflow("write-post"), None);
    }

    #[test]
    fn test_missing_root_is_empty() {
        let store = PackStore::load(Path::new("/nonexistent/packrun-test"));
        assert!(store.packs().is_empty());
    }

    #[test]
    fn test_invalid_pack_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        write_pack(tmp.path(), "good");
        let bad = tmp.path().join("bad");
        std::fs::create_dir_all(&bad).unwrap();
        std::fs::write(bad.join("pack.yaml"), ": not yaml").unwrap();

        let store = PackStore::load(tmp.path());
        assert_eq!(store.packs().len(), 1);
        assert_eq!(store.packs()[0].manifest.name, "good");
    }
}
