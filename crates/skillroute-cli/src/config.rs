//! Configuration loading.
//!
//! Reads `config/default.toml` (or the file given with `--config`) and merges
//! command-line overrides on top.  Recognized tables:
//!
//! ```toml
//! [routing]
//! threshold = 0.4
//! top_k = 3
//! call_timeout_ms = 5000
//!
//! [skills]
//! dir = "skills"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use skillroute_core::RoutingConfig;
use skillroute_skills::{SKILLS_DIR_ENV, default_skills_dir};

use crate::cli::GlobalArgs;

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Contents of the config file.  Every table is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub routing: RoutingConfig,
    pub skills: SkillsSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SkillsSection {
    pub dir: Option<PathBuf>,
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub routing: RoutingConfig,
    pub skills_dir: PathBuf,
}

/// Parse config text.
pub fn parse_config(content: &str) -> Result<FileConfig> {
    toml::from_str(content).context("invalid config file")
}

/// Read the config file.
///
/// A missing default file yields defaults; a missing file named explicitly
/// is an error.
pub fn load_file_config(path: Option<&Path>) -> Result<FileConfig> {
    let (path, explicit) = match path {
        Some(p) => (p, true),
        None => (Path::new(DEFAULT_CONFIG_PATH), false),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(FileConfig::default());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read config `{}`", path.display()));
        }
    };

    let config = parse_config(&content).with_context(|| format!("in `{}`", path.display()))?;
    tracing::debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}

/// Apply command-line overrides to the file config.
///
/// The skills directory is taken from `--skills-dir`, then
/// `$SKILLROUTE_SKILLS_DIR`, then `[skills].dir`, then `./skills`.
pub fn resolve(file: FileConfig, args: &GlobalArgs) -> Settings {
    let mut routing = file.routing;
    if let Some(threshold) = args.threshold {
        routing.threshold = threshold;
    }
    if let Some(top_k) = args.top_k {
        routing.top_k = top_k;
    }
    if let Some(ms) = args.timeout_ms {
        routing.call_timeout_ms = Some(ms);
    }

    let skills_dir = match (&args.skills_dir, file.skills.dir) {
        (Some(dir), _) => dir.clone(),
        (None, _) if std::env::var_os(SKILLS_DIR_ENV).is_some() => default_skills_dir(),
        (None, Some(dir)) => dir,
        (None, None) => default_skills_dir(),
    };

    Settings {
        routing,
        skills_dir,
    }
}

/// Load the config file and apply overrides.
pub fn load_settings(args: &GlobalArgs) -> Result<Settings> {
    let file = load_file_config(args.config.as_deref())?;
    Ok(resolve(file, args))
}
