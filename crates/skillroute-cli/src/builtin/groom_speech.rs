//! `groom-speech`: draft a short wedding speech.

use async_trait::async_trait;
use chrono::{DateTime, Timelike, Utc};
use serde::Deserialize;
use serde_json::json;
use skillroute_core::error::{Result, SkillError};
use skillroute_core::{SkillContext, SkillIO, SkillOutput};
use skillroute_skills::SkillModule;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Length {
    Short,
    #[default]
    Medium,
    Long,
}

impl Length {
    fn target_words(self) -> u32 {
        match self {
            Self::Short => 400,
            Self::Medium => 650,
            Self::Long => 900,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Tone {
    #[default]
    Warm,
    Funny,
    Poetic,
}

impl Tone {
    fn as_str(self) -> &'static str {
        match self {
            Self::Warm => "warm",
            Self::Funny => "funny",
            Self::Poetic => "poetic",
        }
    }
}

#[derive(Debug, Deserialize)]
struct Names {
    groom: String,
    bride: String,
}

#[derive(Debug, Deserialize)]
struct SpeechRequest {
    names: Names,
    #[serde(default)]
    length: Length,
    #[serde(default)]
    anecdotes: Vec<String>,
    #[serde(default)]
    tone: Tone,
}

/// The `groom-speech` module.
#[derive(Debug, Default)]
pub struct GroomSpeech;

#[async_trait]
impl SkillModule for GroomSpeech {
    async fn execute(&self, io: &SkillIO, ctx: &SkillContext) -> Result<SkillOutput> {
        let request: SpeechRequest = serde_json::from_value(io.input.clone()).map_err(|e| {
            SkillError::InvalidInput(format!(
                "expected {{\"names\": {{\"groom\", \"bride\"}}}}: {e}"
            ))
        })?;

        let now = ctx.now.unwrap_or_else(Utc::now);
        let Names { groom, bride } = &request.names;

        let stories = if request.anecdotes.is_empty() {
            "They say love is finding your weirdo. I found mine.".to_owned()
        } else {
            let picked: Vec<&str> = request.anecdotes.iter().take(2).map(String::as_str).collect();
            format!("Quick stories: {}", picked.join(" · "))
        };

        let body = [
            format!(
                "Good {} everyone, family, friends and partners in mischief.",
                day_part(now)
            ),
            format!("I'm {groom}, and today I get to call {bride} my wife."),
            stories,
            "To our parents: thank you for your love and the thousand unseen acts that brought \
             us here."
                .to_owned(),
            format!("To {bride}: you are my calm and my comet."),
            "Let's raise a glass to love, luck, and a lifetime of laughter.".to_owned(),
        ]
        .join("\n\n");

        Ok(SkillOutput::new(json!({
            "format": "speech",
            "tone": request.tone.as_str(),
            "targetWords": request.length.target_words(),
            "text": body,
        }))
        .with_meta("skill", "groom-speech"))
    }
}

/// Morning before noon, afternoon before 18:00, evening after.
fn day_part(now: DateTime<Utc>) -> &'static str {
    match now.hour() {
        0..12 => "morning",
        12..18 => "afternoon",
        _ => "evening",
    }
}
