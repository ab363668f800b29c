//! Orchestrator configuration.
//!
//! [`OrchestratorOptions`] is the runtime configuration handed to
//! [`SkillOrchestrator::new`](crate::SkillOrchestrator::new).  Its numeric
//! part can be loaded from a config file through [`RoutingConfig`], which
//! deserializes a `[routing]` table such as:
//!
//! ```toml
//! [routing]
//! threshold = 0.4
//! top_k = 3
//! call_timeout_ms = 5000
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::observer::SkillObserver;

/// Minimum score a skill needs to be eligible, unless configured otherwise.
pub const DEFAULT_THRESHOLD: f64 = 0.4;

/// Number of top-ranked skills considered for selection, unless configured
/// otherwise.
pub const DEFAULT_TOP_K: usize = 3;

/// Configuration of a [`SkillOrchestrator`](crate::SkillOrchestrator).
#[derive(Clone)]
pub struct OrchestratorOptions {
    /// Minimum score, in `[0, 1]`, a skill needs to be selected.
    pub threshold: f64,
    /// Size of the ranking window inspected for the threshold.
    pub top_k: usize,
    /// Lifecycle listeners, notified in this order.
    pub observers: Vec<Arc<dyn SkillObserver>>,
    /// Optional deadline applied to every match, guard, and execute call.
    /// `None` waits indefinitely.
    pub call_timeout: Option<Duration>,
}

impl OrchestratorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the threshold.  Values outside `[0, 1]` are clamped; NaN falls
    /// back to the default.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = sanitize_threshold(threshold);
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn SkillObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            top_k: DEFAULT_TOP_K,
            observers: Vec::new(),
            call_timeout: None,
        }
    }
}

impl fmt::Debug for OrchestratorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrchestratorOptions")
            .field("threshold", &self.threshold)
            .field("top_k", &self.top_k)
            .field("observers", &self.observers.len())
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

/// Serializable routing settings, as read from a `[routing]` config table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub threshold: f64,
    pub top_k: usize,
    /// Per-call deadline in milliseconds.  Absent means no deadline.
    pub call_timeout_ms: Option<u64>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            top_k: DEFAULT_TOP_K,
            call_timeout_ms: None,
        }
    }
}

impl RoutingConfig {
    /// Build orchestrator options from these settings, with no observers.
    pub fn into_options(self) -> OrchestratorOptions {
        let mut options = OrchestratorOptions::new()
            .with_threshold(self.threshold)
            .with_top_k(self.top_k);
        if let Some(ms) = self.call_timeout_ms {
            options = options.with_call_timeout(Duration::from_millis(ms));
        }
        options
    }
}

fn sanitize_threshold(threshold: f64) -> f64 {
    if threshold.is_nan() {
        tracing::warn!("threshold is NaN, using default {DEFAULT_THRESHOLD}");
        return DEFAULT_THRESHOLD;
    }
    let clamped = threshold.clamp(0.0, 1.0);
    if clamped != threshold {
        tracing::warn!(threshold, clamped, "threshold outside [0, 1], clamped");
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let options = OrchestratorOptions::default();
        assert_eq!(options.threshold, 0.4);
        assert_eq!(options.top_k, 3);
        assert!(options.observers.is_empty());
        assert!(options.call_timeout.is_none());
    }

    #[test]
    fn threshold_is_clamped() {
        assert_eq!(OrchestratorOptions::new().with_threshold(1.5).threshold, 1.0);
        assert_eq!(OrchestratorOptions::new().with_threshold(-2.0).threshold, 0.0);
        assert_eq!(
            OrchestratorOptions::new().with_threshold(f64::NAN).threshold,
            DEFAULT_THRESHOLD
        );
    }

    #[test]
    fn routing_config_partial_table_uses_defaults() {
        let config: RoutingConfig = serde_json::from_str(r#"{ "top_k": 5 }"#).unwrap();
        assert_eq!(config.top_k, 5);
        assert_eq!(config.threshold, DEFAULT_THRESHOLD);
        assert!(config.call_timeout_ms.is_none());
    }

    #[test]
    fn routing_config_into_options() {
        let options = RoutingConfig {
            threshold: 0.7,
            top_k: 1,
            call_timeout_ms: Some(250),
        }
        .into_options();

        assert_eq!(options.threshold, 0.7);
        assert_eq!(options.top_k, 1);
        assert_eq!(options.call_timeout, Some(Duration::from_millis(250)));
    }
}
