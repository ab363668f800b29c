//! Skill manifest parser.
//!
//! A skill directory carries a descriptor, `skill.json` or `skill.toml`:
//!
//! ```json
//! {
//!   "name": "brand-deck",
//!   "version": "1.0.0",
//!   "summary": "Outline a pitch deck",
//!   "tags": ["slides", "marketing"],
//!   "matchers": [
//!     { "includes": ["deck"], "excludes": ["card deck"], "weight": 0.8 },
//!     { "includes": ["slides"] }
//!   ],
//!   "module": "brand-deck"
//! }
//! ```
//!
//! Matcher weights default to [`DEFAULT_MATCHER_WEIGHT`].  YAML descriptors
//! are recognized but rejected.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LoadError, Result};

/// Weight of a matcher rule that does not declare one.
pub const DEFAULT_MATCHER_WEIGHT: f64 = 0.6;

/// Descriptor file names, in lookup order.
const JSON_MANIFEST: &str = "skill.json";
const TOML_MANIFEST: &str = "skill.toml";
const YAML_MANIFESTS: [&str; 2] = ["skill.yaml", "skill.yml"];

/// On-disk descriptor format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Json,
    Toml,
}

/// A parsed skill descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    pub version: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub matchers: Vec<MatcherRule>,
    /// JSON Schema of the expected input.
    #[serde(rename = "inputSchema", alias = "input_schema", default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<serde_json::Value>,
    /// Reference to the module providing `execute` (and optionally `guard`).
    pub module: Option<String>,
    /// Whether a script module should also be invoked for the guard phase.
    #[serde(default)]
    pub guard: bool,
}

/// One keyword rule: every include present, every exclude absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatcherRule {
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub excludes: Vec<String>,
    pub weight: Option<f64>,
}

impl MatcherRule {
    /// The declared weight, or [`DEFAULT_MATCHER_WEIGHT`].
    pub fn weight(&self) -> f64 {
        self.weight.unwrap_or(DEFAULT_MATCHER_WEIGHT)
    }
}

/// Raw descriptor, with every field optional so that a missing `name` is
/// reported as such rather than as a generic parse error.
#[derive(Debug, Deserialize)]
struct RawManifest {
    name: Option<String>,
    version: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    matchers: Vec<MatcherRule>,
    #[serde(rename = "inputSchema", alias = "input_schema")]
    input_schema: Option<serde_json::Value>,
    module: Option<String>,
    #[serde(default)]
    guard: bool,
}

/// Locate the descriptor inside `dir`.
///
/// `skill.json` wins over `skill.toml`.  A directory holding only a YAML
/// descriptor is an [`LoadError::Unsupported`] error.
pub fn find_manifest(dir: &Path) -> Result<(PathBuf, ManifestFormat)> {
    let json = dir.join(JSON_MANIFEST);
    if json.is_file() {
        return Ok((json, ManifestFormat::Json));
    }

    let toml = dir.join(TOML_MANIFEST);
    if toml.is_file() {
        return Ok((toml, ManifestFormat::Toml));
    }

    if let Some(yaml) = YAML_MANIFESTS
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
    {
        return Err(LoadError::Unsupported {
            path: yaml,
            reason: "YAML manifests are not supported, use skill.json or skill.toml".into(),
        });
    }

    Err(LoadError::NotFound(dir.to_path_buf()))
}

/// Whether `dir` contains any recognized descriptor (including YAML).
pub fn has_manifest(dir: &Path) -> bool {
    [JSON_MANIFEST, TOML_MANIFEST]
        .iter()
        .chain(YAML_MANIFESTS.iter())
        .any(|name| dir.join(name).is_file())
}

/// Parse descriptor text.
pub fn parse_manifest(content: &str, format: ManifestFormat, source_path: &Path) -> Result<Manifest> {
    let raw: RawManifest = match format {
        ManifestFormat::Json => serde_json::from_str(content).map_err(|e| LoadError::InvalidFormat {
            path: source_path.to_path_buf(),
            reason: format!("JSON parse error: {e}"),
        })?,
        ManifestFormat::Toml => toml::from_str(content).map_err(|e| LoadError::InvalidFormat {
            path: source_path.to_path_buf(),
            reason: format!("TOML parse error: {e}"),
        })?,
    };

    let name = raw
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| LoadError::MissingField {
            path: source_path.to_path_buf(),
            field: "name".into(),
        })?;

    Ok(Manifest {
        name,
        version: raw.version,
        summary: raw.summary,
        description: raw.description,
        tags: raw.tags,
        matchers: raw.matchers,
        input_schema: raw.input_schema,
        module: raw.module,
        guard: raw.guard,
    })
}

/// Locate and parse the descriptor inside `dir`.
pub fn read_manifest(dir: &Path) -> Result<Manifest> {
    let (path, format) = find_manifest(dir)?;
    let content = std::fs::read_to_string(&path)?;
    parse_manifest(&content, format, &path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_json_manifest() {
        let content = r#"{
            "name": "brand-deck",
            "version": "1.0.0",
            "summary": "Outline a pitch deck",
            "tags": ["slides"],
            "matchers": [
                { "includes": ["deck"], "excludes": ["card"], "weight": 0.8 },
                { "includes": ["slides"] }
            ],
            "module": "brand-deck"
        }"#;
        let manifest =
            parse_manifest(content, ManifestFormat::Json, Path::new("skill.json")).unwrap();

        assert_eq!(manifest.name, "brand-deck");
        assert_eq!(manifest.version.as_deref(), Some("1.0.0"));
        assert_eq!(manifest.tags, vec!["slides"]);
        assert_eq!(manifest.matchers.len(), 2);
        assert_eq!(manifest.matchers[0].weight(), 0.8);
        assert_eq!(manifest.matchers[1].weight(), DEFAULT_MATCHER_WEIGHT);
        assert!(manifest.matchers[1].excludes.is_empty());
        assert_eq!(manifest.module.as_deref(), Some("brand-deck"));
        assert!(!manifest.guard);
        assert!(manifest.input_schema.is_none());
    }

    #[test]
    fn input_schema_accepts_both_spellings() {
        let json = r#"{ "name": "a", "inputSchema": { "type": "object", "required": ["topic"] } }"#;
        let manifest = parse_manifest(json, ManifestFormat::Json, Path::new("skill.json")).unwrap();
        assert_eq!(manifest.input_schema.unwrap()["required"][0], "topic");

        let toml = "name = \"b\"\n\n[input_schema]\ntype = \"object\"\n";
        let manifest = parse_manifest(toml, ManifestFormat::Toml, Path::new("skill.toml")).unwrap();
        assert_eq!(manifest.input_schema.unwrap()["type"], "object");
    }

    #[test]
    fn parse_toml_manifest() {
        let content = r#"
name = "groom-speech"
summary = "Draft a wedding speech"
guard = true

[[matchers]]
includes = ["speech"]
weight = 0.9

[[matchers]]
includes = ["toast", "wedding"]
"#;
        let manifest =
            parse_manifest(content, ManifestFormat::Toml, Path::new("skill.toml")).unwrap();

        assert_eq!(manifest.name, "groom-speech");
        assert!(manifest.guard);
        assert_eq!(manifest.matchers[0].includes, vec!["speech"]);
        assert_eq!(manifest.matchers[1].includes, vec!["toast", "wedding"]);
        assert!(manifest.module.is_none());
    }

    #[test]
    fn missing_name_is_reported() {
        let err = parse_manifest(r#"{ "version": "1" }"#, ManifestFormat::Json, Path::new("x"))
            .unwrap_err();
        assert!(matches!(err, LoadError::MissingField { ref field, .. } if field == "name"));

        let err = parse_manifest(r#"{ "name": "  " }"#, ManifestFormat::Json, Path::new("x"))
            .unwrap_err();
        assert!(matches!(err, LoadError::MissingField { .. }));
    }

    #[test]
    fn malformed_json_is_invalid_format() {
        let err = parse_manifest("{ not json", ManifestFormat::Json, Path::new("x")).unwrap_err();
        assert!(matches!(err, LoadError::InvalidFormat { .. }));
    }

    #[test]
    fn find_manifest_prefers_json() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("skill.toml"), "name = \"t\"").unwrap();
        assert_eq!(find_manifest(tmp.path()).unwrap().1, ManifestFormat::Toml);

        std::fs::write(tmp.path().join("skill.json"), r#"{"name":"j"}"#).unwrap();
        assert_eq!(find_manifest(tmp.path()).unwrap().1, ManifestFormat::Json);
        assert_eq!(read_manifest(tmp.path()).unwrap().name, "j");
    }

    #[test]
    fn yaml_only_is_unsupported() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("skill.yaml"), "name: y").unwrap();

        assert!(has_manifest(tmp.path()));
        assert!(matches!(
            find_manifest(tmp.path()),
            Err(LoadError::Unsupported { .. })
        ));
    }

    #[test]
    fn empty_dir_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(!has_manifest(tmp.path()));
        assert!(matches!(find_manifest(tmp.path()), Err(LoadError::NotFound(_))));
    }
}
