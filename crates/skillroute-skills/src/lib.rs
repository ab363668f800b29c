//! Manifest-driven skills for SkillRoute.
//!
//! This crate turns skill directories on disk into [`Skill`] values the core
//! orchestrator can route to:
//!
//! - **Manifest parser**: reads `skill.json` or `skill.toml` descriptors.
//!
//! - **Keyword matcher**: compiles include/exclude rules into
//!   [`aho_corasick`] automata and scores requests by the best matching rule.
//!
//! - **Modules**: bind a manifest's `module` reference to an in-process
//!   [`SkillModule`] from a [`ModuleTable`], or to a script run through its
//!   interpreter by [`ScriptModule`].
//!
//! - **Loader**: discovers skill directories and produces `Arc<dyn Skill>`.
//!
//! # Example
//!
//! ```rust,no_run
//! use skillroute_core::{SkillOrchestrator, SkillRegistry};
//! use skillroute_skills::{ModuleTable, default_skills_dir, load_skills_from_dir};
//!
//! let skills = load_skills_from_dir(&default_skills_dir(), &ModuleTable::new()).unwrap();
//! let registry = SkillRegistry::new();
//! registry.register_all(skills);
//! let orchestrator = SkillOrchestrator::new(registry, Default::default());
//! ```
//!
//! [`Skill`]: skillroute_core::Skill

pub mod error;
pub mod loader;
pub mod manifest;
pub mod matcher;
pub mod module;

pub use error::{LoadError, Result};
pub use loader::{
    ManifestSkill, SKILLS_DIR_ENV, default_skills_dir, load_skill_from_dir, load_skills_from_dir,
};
pub use manifest::{
    DEFAULT_MATCHER_WEIGHT, Manifest, ManifestFormat, MatcherRule, find_manifest, has_manifest,
    parse_manifest, read_manifest,
};
pub use matcher::KeywordMatcher;
pub use module::{ModuleTable, ScriptInterpreter, ScriptModule, SkillModule};
