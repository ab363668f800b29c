//! Skill loader: turns manifest directories into routable skills.
//!
//! The loader walks a skills root, reads each subdirectory's descriptor,
//! compiles its keyword rules, binds its module, and produces
//! `Arc<dyn Skill>` values ready for a [`SkillRegistry`].
//!
//! [`SkillRegistry`]: skillroute_core::SkillRegistry

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use skillroute_core::error::{Result as SkillResult, SkillError};
use skillroute_core::{Skill, SkillContext, SkillGuard, SkillIO, SkillOutput, SkillScore};

use crate::error::{LoadError, Result};
use crate::manifest::{Manifest, has_manifest, read_manifest};
use crate::matcher::KeywordMatcher;
use crate::module::{ModuleTable, ScriptInterpreter, ScriptModule, SkillModule};

/// Environment variable overriding the default skills directory.
pub const SKILLS_DIR_ENV: &str = "SKILLROUTE_SKILLS_DIR";

/// A skill assembled from a manifest.
pub struct ManifestSkill {
    manifest: Manifest,
    matcher: KeywordMatcher,
    module: Option<Arc<dyn SkillModule>>,
}

impl ManifestSkill {
    pub fn new(manifest: Manifest, module: Option<Arc<dyn SkillModule>>) -> Self {
        let matcher = KeywordMatcher::new(&manifest.matchers);
        Self {
            manifest,
            matcher,
            module,
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Whether an execution module was bound at load time.
    pub fn has_module(&self) -> bool {
        self.module.is_some()
    }
}

impl std::fmt::Debug for ManifestSkill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManifestSkill")
            .field("name", &self.manifest.name)
            .field("rules", &self.matcher.rule_count())
            .field("module", &self.manifest.module)
            .finish()
    }
}

#[async_trait]
impl Skill for ManifestSkill {
    fn name(&self) -> &str {
        &self.manifest.name
    }

    fn version(&self) -> Option<&str> {
        self.manifest.version.as_deref()
    }

    fn summary(&self) -> Option<&str> {
        self.manifest.summary.as_deref()
    }

    fn description(&self) -> Option<&str> {
        self.manifest.description.as_deref()
    }

    fn tags(&self) -> &[String] {
        &self.manifest.tags
    }

    fn input_schema(&self) -> Option<&serde_json::Value> {
        self.manifest.input_schema.as_ref()
    }

    async fn score(&self, io: &SkillIO, _ctx: &SkillContext) -> SkillResult<SkillScore> {
        Ok(self.matcher.score(&io.input_text()))
    }

    fn guard(&self) -> Option<&dyn SkillGuard> {
        self.module.as_deref().and_then(|m| m.guard())
    }

    async fn execute(&self, io: &SkillIO, ctx: &SkillContext) -> SkillResult<SkillOutput> {
        match &self.module {
            Some(module) => module.execute(io, ctx).await,
            None => Err(SkillError::Failed("skill module missing execute(io, ctx)".into())),
        }
    }
}

/// Resolve the manifest's `module` reference.
///
/// The module table wins; otherwise the reference must name a script with a
/// known extension inside `dir`.  A manifest without a reference has no
/// module.
fn resolve_module(
    manifest: &Manifest,
    dir: &Path,
    modules: &ModuleTable,
) -> Result<Option<Arc<dyn SkillModule>>> {
    let Some(reference) = manifest.module.as_deref() else {
        return Ok(None);
    };

    if let Some(module) = modules.get(reference) {
        return Ok(Some(module));
    }

    let path = dir.join(reference);
    match ScriptInterpreter::from_path(&path) {
        Some(interpreter) if path.is_file() => {
            let module = ScriptModule::new(path, interpreter).with_guard(manifest.guard);
            Ok(Some(Arc::new(module)))
        }
        _ => Err(LoadError::Unsupported {
            path: dir.to_path_buf(),
            reason: format!("unknown module `{reference}`: not registered and not a script"),
        }),
    }
}

/// Load a single skill from a directory holding `skill.json` or `skill.toml`.
pub fn load_skill_from_dir(dir: &Path, modules: &ModuleTable) -> Result<Arc<dyn Skill>> {
    let manifest = read_manifest(dir)?;
    let module = resolve_module(&manifest, dir, modules)?;

    tracing::debug!(
        name = %manifest.name,
        rules = manifest.matchers.len(),
        module = ?manifest.module,
        "parsed skill manifest"
    );

    Ok(Arc::new(ManifestSkill::new(manifest, module)))
}

/// Load every skill under `root`.
///
/// Each subdirectory holding a descriptor becomes one skill, in directory
/// name order.  Subdirectories without a descriptor are skipped silently;
/// ones that fail to load are skipped with a warning.  A missing root yields
/// an empty list.
pub fn load_skills_from_dir(root: &Path, modules: &ModuleTable) -> Result<Vec<Arc<dyn Skill>>> {
    if !root.exists() {
        tracing::debug!(path = %root.display(), "skills directory does not exist");
        return Ok(Vec::new());
    }

    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();

    let mut skills = Vec::with_capacity(dirs.len());
    for dir in dirs {
        if !has_manifest(&dir) {
            tracing::trace!(path = %dir.display(), "no skill manifest, skipping");
            continue;
        }

        match load_skill_from_dir(&dir, modules) {
            Ok(skill) => {
                tracing::info!(name = %skill.name(), path = %dir.display(), "loaded skill");
                skills.push(skill);
            }
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "failed to load skill");
            }
        }
    }

    tracing::info!(count = skills.len(), dir = %root.display(), "skills loaded");
    Ok(skills)
}

/// Return the default skills directory: `$SKILLROUTE_SKILLS_DIR`, else
/// `./skills`.
pub fn default_skills_dir() -> PathBuf {
    std::env::var_os(SKILLS_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("skills"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
