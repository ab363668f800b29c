//! `brand-deck`: outline a branded pitch deck for a topic.
//!
//! Input is either free text, taken as the topic, or an object:
//!
//! ```json
//! { "topic": "AI for supply chain", "audience": "Exec", "tone": "bold",
//!   "brandRules": { "maxSections": 6, "ctaStyle": "primary" } }
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use skillroute_core::error::{Result, SkillError};
use skillroute_core::{SkillContext, SkillGuard, SkillIO, SkillOutput};
use skillroute_skills::SkillModule;

/// Locales the deck templates exist for.
const SUPPORTED_LOCALES: [&str; 3] = ["en", "nb", "no"];

const MIN_SECTIONS: i64 = 4;
const MAX_SECTIONS: i64 = 8;
const DEFAULT_SECTIONS: i64 = 6;

const AGENDA: [&str; 5] = ["Why now", "What changes", "How it works", "Value", "Next steps"];

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Tone {
    Formal,
    #[default]
    Bold,
    Friendly,
}

impl Tone {
    fn as_str(self) -> &'static str {
        match self {
            Self::Formal => "formal",
            Self::Bold => "bold",
            Self::Friendly => "friendly",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BrandRules {
    max_sections: Option<i64>,
    cta_style: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeckRequest {
    topic: String,
    #[serde(default = "default_audience")]
    audience: String,
    #[serde(default)]
    tone: Tone,
    #[serde(default)]
    brand_rules: BrandRules,
}

fn default_audience() -> String {
    "General".into()
}

impl DeckRequest {
    fn from_input(input: &Value) -> Result<Self> {
        match input {
            Value::String(topic) => Ok(Self {
                topic: topic.trim().to_owned(),
                audience: default_audience(),
                tone: Tone::default(),
                brand_rules: BrandRules::default(),
            }),
            other => serde_json::from_value(other.clone())
                .map_err(|e| SkillError::InvalidInput(format!("expected a deck request: {e}"))),
        }
    }
}

/// The `brand-deck` module.  Carries its own guard.
#[derive(Debug, Default)]
pub struct BrandDeck;

#[async_trait]
impl SkillGuard for BrandDeck {
    async fn check(&self, io: &SkillIO, ctx: &SkillContext) -> Result<()> {
        if let Some(locale) = ctx.locale.as_deref() {
            if !SUPPORTED_LOCALES.contains(&locale) {
                return Err(SkillError::Rejected(format!("unsupported locale `{locale}`")));
            }
        }

        let has_topic = match &io.input {
            Value::String(s) => !s.trim().is_empty(),
            other => other
                .get("topic")
                .and_then(Value::as_str)
                .is_some_and(|t| !t.trim().is_empty()),
        };
        if !has_topic {
            return Err(SkillError::Rejected("missing 'topic'".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl SkillModule for BrandDeck {
    async fn execute(&self, io: &SkillIO, ctx: &SkillContext) -> Result<SkillOutput> {
        let request = DeckRequest::from_input(&io.input)?;
        let sections = request
            .brand_rules
            .max_sections
            .unwrap_or(DEFAULT_SECTIONS)
            .clamp(MIN_SECTIONS, MAX_SECTIONS);

        let mut outline = Vec::with_capacity(sections as usize + 3);
        outline.push(json!({ "type": "title", "text": request.topic }));
        outline.push(json!({ "type": "agenda", "bullets": AGENDA }));
        for i in 0..sections as usize {
            outline.push(json!({
                "type": "section",
                "title": format!(
                    "Section {}: {}",
                    i + 1,
                    section_title(i, &request.topic, &request.audience)
                ),
            }));
        }
        outline.push(json!({
            "type": "cta",
            "style": request.brand_rules.cta_style.as_deref().unwrap_or("primary"),
            "text": "Book a pilot this quarter",
        }));

        Ok(SkillOutput::new(json!({
            "format": "deck-outline",
            "audience": request.audience,
            "tone": request.tone.as_str(),
            "outline": outline,
        }))
        .with_meta("skill", "brand-deck")
        .with_meta("generatedAt", ctx.now.map(|t| t.to_rfc3339())))
    }

    fn guard(&self) -> Option<&dyn SkillGuard> {
        Some(self)
    }
}

fn section_title(i: usize, topic: &str, audience: &str) -> String {
    match i % 8 {
        0 => format!("The problem {topic} solves"),
        1 => "Architecture & approach".into(),
        2 => format!("Pilot plan for {audience}"),
        3 => "Impact & KPIs".into(),
        4 => "Cost & ROI".into(),
        5 => "Risks & mitigations".into(),
        6 => "Roadmap & resourcing".into(),
        _ => "Call to action".into(),
    }
}
