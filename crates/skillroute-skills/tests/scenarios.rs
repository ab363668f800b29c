//! End-to-end routing over skills loaded from manifest directories.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use skillroute_core::error::Result;
use skillroute_core::{
    OrchestratorOptions, RouteError, SkillContext, SkillError, SkillGuard, SkillIO,
    SkillOrchestrator, SkillOutput, SkillRegistry,
};
use skillroute_skills::{ModuleTable, SkillModule, load_skills_from_dir};

// ═══════════════════════════════════════════════════════════════════════
//  Fixtures
// ═══════════════════════════════════════════════════════════════════════

struct Named(&'static str);

#[async_trait]
impl SkillModule for Named {
    async fn execute(&self, io: &SkillIO, _ctx: &SkillContext) -> Result<SkillOutput> {
        Ok(SkillOutput::new(json!({ "handled_by": self.0, "input": io.input })))
    }
}

/// Only accepts requests whose context locale is `en`.
struct EnglishOnly;

#[async_trait]
impl SkillGuard for EnglishOnly {
    async fn check(&self, _io: &SkillIO, ctx: &SkillContext) -> Result<()> {
        match ctx.locale.as_deref() {
            Some("en") => Ok(()),
            other => Err(SkillError::Rejected(format!("unsupported locale {other:?}"))),
        }
    }
}

#[async_trait]
impl SkillModule for EnglishOnly {
    async fn execute(&self, _io: &SkillIO, _ctx: &SkillContext) -> Result<SkillOutput> {
        Ok(SkillOutput::new("english"))
    }

    fn guard(&self) -> Option<&dyn SkillGuard> {
        Some(self)
    }
}

fn write(root: &Path, dir: &str, file: &str, content: &str) {
    let path = root.join(dir);
    std::fs::create_dir_all(&path).unwrap();
    std::fs::write(path.join(file), content).unwrap();
}

/// A deck skill (0.6 on "deck", JSON manifest) and a speech skill (0.9 on
/// "speech", TOML manifest).
fn deck_and_speech(root: &Path) {
    write(
        root,
        "brand-deck",
        "skill.json",
        &json!({
            "name": "brand-deck",
            "matchers": [{ "includes": ["deck"], "excludes": ["card"] }],
            "module": "deck"
        })
        .to_string(),
    );
    write(
        root,
        "groom-speech",
        "skill.toml",
        r#"
name = "groom-speech"
module = "speech"

[[matchers]]
includes = ["speech"]
weight = 0.9
"#,
    );
}

fn orchestrator(root: &Path, modules: &ModuleTable, options: OrchestratorOptions) -> SkillOrchestrator {
    let registry = SkillRegistry::new();
    registry.register_all(load_skills_from_dir(root, modules).unwrap());
    SkillOrchestrator::new(registry, options)
}

fn modules() -> ModuleTable {
    ModuleTable::new()
        .with("deck", Arc::new(Named("brand-deck")))
        .with("speech", Arc::new(Named("groom-speech")))
}

// ═══════════════════════════════════════════════════════════════════════
//  Routing
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn deck_request_routes_to_deck_skill() {
    let tmp = tempfile::tempdir().unwrap();
    deck_and_speech(tmp.path());
    let orch = orchestrator(tmp.path(), &modules(), OrchestratorOptions::default());

    let io = SkillIO::new("Plan a deck for investors");
    let route = orch.route(&io, &SkillContext::new()).await;
    assert_eq!(route.skill.as_ref().map(|s| s.name()), Some("brand-deck"));
    assert_eq!(route.score, 0.6);

    let out = orch.run(&io, &SkillContext::new()).await.unwrap();
    assert_eq!(out.result["handled_by"], "brand-deck");
}

#[tokio::test]
async fn speech_request_routes_to_speech_skill() {
    let tmp = tempfile::tempdir().unwrap();
    deck_and_speech(tmp.path());
    let orch = orchestrator(tmp.path(), &modules(), OrchestratorOptions::default());

    let route = orch
        .route(&SkillIO::new("Write a speech for the wedding"), &SkillContext::new())
        .await;
    assert_eq!(route.skill.as_ref().map(|s| s.name()), Some("groom-speech"));
    assert_eq!(route.score, 0.9);
}

#[tokio::test]
async fn exclude_keyword_turns_a_hit_into_a_miss() {
    let tmp = tempfile::tempdir().unwrap();
    deck_and_speech(tmp.path());
    let orch = orchestrator(tmp.path(), &modules(), OrchestratorOptions::default());

    let out = orch
        .run(&SkillIO::new("shuffle the card deck"), &SkillContext::new())
        .await
        .unwrap();
    assert!(out.is_no_match());
    assert_eq!(out.meta["score"], 0.0);
}

#[tokio::test]
async fn unrelated_request_is_a_threshold_miss() {
    let tmp = tempfile::tempdir().unwrap();
    deck_and_speech(tmp.path());
    let orch = orchestrator(tmp.path(), &modules(), OrchestratorOptions::default());

    let out = orch
        .run(&SkillIO::new("what's the weather"), &SkillContext::new())
        .await
        .unwrap();
    assert_eq!(out.result["reason"], "threshold");
    assert_eq!(out.meta["score"], 0.0);
}

#[tokio::test]
async fn high_threshold_rejects_deck() {
    let tmp = tempfile::tempdir().unwrap();
    deck_and_speech(tmp.path());
    let orch = orchestrator(
        tmp.path(),
        &modules(),
        OrchestratorOptions::new().with_threshold(0.95),
    );

    let route = orch
        .route(&SkillIO::new("Plan a deck for investors"), &SkillContext::new())
        .await;
    assert!(route.skill.is_none());
    assert_eq!(route.score, 0.0);
    assert_eq!(route.best_score(), 0.6);
}

#[tokio::test]
async fn skill_without_module_fails_execution() {
    let tmp = tempfile::tempdir().unwrap();
    write(
        tmp.path(),
        "orphan",
        "skill.json",
        r#"{ "name": "orphan", "matchers": [{ "includes": ["orphan"] }] }"#,
    );
    let orch = orchestrator(tmp.path(), &ModuleTable::new(), OrchestratorOptions::default());

    let err = orch
        .run(&SkillIO::new("orphan task"), &SkillContext::new())
        .await
        .unwrap_err();
    assert!(matches!(err, RouteError::ExecutionFailed { ref skill, .. } if skill == "orphan"));
}

#[tokio::test]
async fn module_guard_is_applied() {
    let tmp = tempfile::tempdir().unwrap();
    write(
        tmp.path(),
        "english",
        "skill.json",
        r#"{ "name": "english", "matchers": [{ "includes": ["hello"] }], "module": "en" }"#,
    );
    let modules = ModuleTable::new().with("en", Arc::new(EnglishOnly));
    let orch = orchestrator(tmp.path(), &modules, OrchestratorOptions::default());
    let io = SkillIO::new("hello there");

    let out = orch
        .run(&io, &SkillContext::new().with_locale("en"))
        .await
        .unwrap();
    assert_eq!(out.result, "english");

    let err = orch
        .run(&io, &SkillContext::new().with_locale("fr"))
        .await
        .unwrap_err();
    assert!(matches!(err, RouteError::GuardRejected { .. }));
}

#[tokio::test]
async fn broken_manifest_does_not_block_others() {
    let tmp = tempfile::tempdir().unwrap();
    deck_and_speech(tmp.path());
    write(tmp.path(), "broken", "skill.json", "{ not json");
    write(tmp.path(), "yaml-only", "skill.yaml", "name: yaml");

    let skills = load_skills_from_dir(tmp.path(), &modules()).unwrap();
    let names: Vec<&str> = skills.iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["brand-deck", "groom-speech"]);
}
