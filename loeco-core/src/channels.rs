//! Channel classification and per-quantity tuning
//!
//! Channels are classified by an ordered `(keyword, class)` rule table,
//! evaluated first-match-wins against the lower-cased channel name. The
//! Kalman preset table works the same way. Nothing is cached between runs:
//! classification is a pure function of the name and the tables.

use serde::{Deserialize, Serialize};

use crate::constants::{
    CONTINUOUS_KEYWORDS, DISCRETE_KEYWORDS, KALMAN_DEFAULT_Q_BASE, KALMAN_DEFAULT_R,
    KALMAN_PRESETS,
};

/// How a channel is treated after resampling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelClass {
    /// Physical measurement: outlier rejection, smoothing, bounded interpolation
    Continuous,
    /// Status-like value: forward/backward fill only
    Discrete,
}

/// Kalman tuning for one physical quantity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KalmanPreset {
    /// Process noise growth per hour
    pub q_base: f64,
    /// Measurement noise variance
    pub r: f64,
}

impl Default for KalmanPreset {
    fn default() -> Self {
        Self {
            q_base: KALMAN_DEFAULT_Q_BASE,
            r: KALMAN_DEFAULT_R,
        }
    }
}

/// Ordered keyword tables driving classification and Kalman tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRules {
    classes: Vec<(String, ChannelClass)>,
    presets: Vec<(String, KalmanPreset)>,
    fallback_preset: KalmanPreset,
}

impl Default for ChannelRules {
    fn default() -> Self {
        let classes = CONTINUOUS_KEYWORDS
            .iter()
            .map(|k| (k.to_string(), ChannelClass::Continuous))
            .chain(
                DISCRETE_KEYWORDS
                    .iter()
                    .map(|k| (k.to_string(), ChannelClass::Discrete)),
            )
            .collect();

        let presets = KALMAN_PRESETS
            .iter()
            .map(|(k, q_base, r)| (k.to_string(), KalmanPreset { q_base: *q_base, r: *r }))
            .collect();

        Self {
            classes,
            presets,
            fallback_preset: KalmanPreset::default(),
        }
    }
}

impl ChannelRules {
    /// Empty tables: every channel is unclassified and uses the fallback preset
    pub fn empty() -> Self {
        Self {
            classes: Vec::new(),
            presets: Vec::new(),
            fallback_preset: KalmanPreset::default(),
        }
    }

    /// Append a classification rule (lowest priority so far)
    pub fn with_class(mut self, keyword: &str, class: ChannelClass) -> Self {
        self.classes.push((keyword.to_lowercase(), class));
        self
    }

    /// Append a Kalman preset rule (lowest priority so far)
    pub fn with_preset(mut self, keyword: &str, preset: KalmanPreset) -> Self {
        self.presets.push((keyword.to_lowercase(), preset));
        self
    }

    /// Insert a Kalman preset ahead of every existing rule
    pub fn with_priority_preset(mut self, keyword: &str, preset: KalmanPreset) -> Self {
        self.presets.insert(0, (keyword.to_lowercase(), preset));
        self
    }

    /// Classify a channel name, `None` if no keyword matches
    pub fn classify(&self, channel: &str) -> Option<ChannelClass> {
        let name = channel.to_lowercase();
        self.classes
            .iter()
            .find(|(keyword, _)| name.contains(keyword.as_str()))
            .map(|(_, class)| *class)
    }

    /// Kalman preset for a channel name
    pub fn preset_for(&self, channel: &str) -> KalmanPreset {
        let name = channel.to_lowercase();
        self.presets
            .iter()
            .find(|(keyword, _)| name.contains(keyword.as_str()))
            .map(|(_, preset)| *preset)
            .unwrap_or(self.fallback_preset)
    }
}
