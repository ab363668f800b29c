//! Per-call data carried through a routing run.
//!
//! [`SkillContext`] describes the caller's environment, [`SkillIO`] the
//! request, and [`SkillOutput`] the response envelope.  All three are created
//! by the caller (or a skill) for a single call and are never retained by the
//! orchestrator.

use std::any::Any;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Relevance score produced by a skill's match step, meaningful in `[0, 1]`.
pub type SkillScore = f64;

/// Reason code carried by the output of a run where no skill qualified.
pub const NO_MATCH_REASON: &str = "threshold";

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Shared dependencies handed to skills (LLM clients, stores, HTTP clients).
///
/// Values are stored type-erased under a string key and recovered with a
/// typed lookup.  The orchestrator never reads this bag.  Cloning is cheap and
/// clones share the same entries.
#[derive(Clone, Default)]
pub struct Services {
    inner: Arc<DashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl Services {
    /// Create an empty service bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a service under `key`, replacing any previous entry.
    pub fn insert<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) {
        self.inner.insert(key.into(), Arc::new(value));
    }

    /// Look up a service by key and type.
    ///
    /// Returns `None` when the key is absent or holds a different type.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        let entry = self.inner.get(key)?;
        Arc::clone(entry.value()).downcast::<T>().ok()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services").field("keys", &self.keys()).finish()
    }
}

/// Per-run scratch memory.
///
/// Skills may write here through a shared `&SkillContext`; entries are plain
/// JSON values.
#[derive(Debug, Clone, Default)]
pub struct Scratch {
    inner: DashMap<String, Value>,
}

impl Scratch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.inner.insert(key.into(), value.into());
    }

    /// Return a copy of the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.get(key).map(|e| e.value().clone())
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.remove(key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Serialize the scratch contents as a JSON object.
    pub fn to_json(&self) -> Map<String, Value> {
        self.inner
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }
}

/// Caller-supplied environment passed by reference into every skill call.
#[derive(Debug, Clone, Default)]
pub struct SkillContext {
    /// Identity of the caller, if known.
    pub user_id: Option<String>,
    /// Preferred locale tag (e.g. `en`, `nb`).
    pub locale: Option<String>,
    /// Wall-clock time of the request.
    pub now: Option<DateTime<Utc>>,
    /// Injected dependencies.
    pub services: Services,
    /// Per-run memory.
    pub scratch: Scratch,
}

impl SkillContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn with_service<T: Any + Send + Sync>(self, key: impl Into<String>, value: T) -> Self {
        self.services.insert(key, value);
        self
    }

    /// Copy of this context for a new run: same identity and services, empty
    /// scratch.
    pub fn for_run(&self) -> Self {
        Self {
            user_id: self.user_id.clone(),
            locale: self.locale.clone(),
            now: self.now,
            services: self.services.clone(),
            scratch: Scratch::new(),
        }
    }

    /// Serializable view of the context, as handed to out-of-process skills.
    ///
    /// Services are not serializable and are represented by their keys only.
    pub fn to_json(&self) -> Value {
        json!({
            "userId": self.user_id,
            "locale": self.locale,
            "now": self.now.map(|t| t.to_rfc3339()),
            "services": self.services.keys(),
            "scratch": self.scratch.to_json(),
        })
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A routing request: opaque input plus optional structured hints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillIO {
    /// The raw utterance or structured request.
    pub input: Value,
    /// Hints extracted upstream (NER, regex, another router).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hints: Option<Map<String, Value>>,
}

impl SkillIO {
    pub fn new(input: impl Into<Value>) -> Self {
        Self {
            input: input.into(),
            hints: None,
        }
    }

    pub fn with_hints(mut self, hints: Map<String, Value>) -> Self {
        self.hints = Some(hints);
        self
    }

    /// Look up a single hint.
    pub fn hint(&self, key: &str) -> Option<&Value> {
        self.hints.as_ref()?.get(key)
    }

    /// The input as flat text: string input verbatim, anything else as its
    /// JSON serialization.
    pub fn input_text(&self) -> Cow<'_, str> {
        match &self.input {
            Value::String(s) => Cow::Borrowed(s),
            other => Cow::Owned(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// A named artifact attached to an output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Artifact {
    Text(String),
    /// Raw bytes, base64-encoded on the wire.
    Binary(#[serde(with = "base64_bytes")] Vec<u8>),
}

/// The response envelope returned by a skill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillOutput {
    /// Main value (text, JSON, a document outline, ...).
    pub result: Value,
    /// Files, images, logs by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub artifacts: BTreeMap<String, Artifact>,
    /// Trace/debug metadata.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
}

impl SkillOutput {
    pub fn new(result: impl Into<Value>) -> Self {
        Self {
            result: result.into(),
            ..Self::default()
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn with_artifact(mut self, name: impl Into<String>, artifact: Artifact) -> Self {
        self.artifacts.insert(name.into(), artifact);
        self
    }

    /// The standard output for a run where no skill cleared the threshold.
    ///
    /// `score` is the routed score (always 0 for a miss); `best_score` is the
    /// top of the scoreboard, kept for diagnostics.
    pub fn no_match(score: SkillScore, best_score: SkillScore) -> Self {
        Self::new(json!({
            "message": "No suitable skill found",
            "reason": NO_MATCH_REASON,
        }))
        .with_meta("score", score)
        .with_meta("best_score", best_score)
    }

    /// The machine-readable reason code if this is a no-match output.
    pub fn miss_reason(&self) -> Option<&str> {
        self.result.get("reason").and_then(Value::as_str)
    }

    pub fn is_no_match(&self) -> bool {
        self.miss_reason() == Some(NO_MATCH_REASON)
    }
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
