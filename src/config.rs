//! Tracker tunables.
//!
//! Every knob has a default matching the reference tuning, so an empty JSON
//! object is a valid configuration.

use crate::error::TrackError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How new track identifiers are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdPolicy {
    /// Uniform draw from the inclusive range `[min, max]`, redrawn on
    /// collision.
    Random { min: u64, max: u64 },
    /// Increasing counter starting at `start`, skipping live ids.
    Monotonic { start: u64 },
}

impl Default for IdPolicy {
    fn default() -> Self {
        IdPolicy::Random {
            min: 100_000,
            max: 999_999,
        }
    }
}

/// Largest `iou_scale` and `|padding_cost|` accepted by `validate`.
pub const MAX_COST_MAGNITUDE: i64 = 1 << 40;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Consecutive misses a track may coast through before it is dropped.
    pub max_misses: usize,
    /// IoU is multiplied by this and rounded to build integer costs.
    pub iou_scale: i64,
    /// Cost written into padding cells of the square matrix.
    pub padding_cost: i64,
    /// Pairs overlapping less than this are split into a miss and a birth.
    /// Zero keeps every real pairing the solver picks.
    pub min_iou: f32,
    /// Diagonal of Q for `[cx, cy, vx, vy, w, h]`.
    pub process_noise: [f32; 6],
    /// Scale of R, applied uniformly to `[cx, cy, w, h]`.
    pub measurement_noise: f32,
    /// Scale of the identity covariance a new track starts with.
    pub initial_covariance: f32,
    pub id_policy: IdPolicy,
    /// Fixed seed for the id generator; `None` seeds from the OS.
    pub id_seed: Option<u64>,
    /// Seconds assumed before the first frame of a `FrameLoop`.
    pub initial_dt: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_misses: 10,
            iou_scale: 1000,
            padding_cost: -1000,
            min_iou: 0.0,
            process_noise: [1e-2, 1e-2, 2.0, 1.0, 1e-2, 1e-2],
            measurement_noise: 1e-1,
            initial_covariance: 1.0,
            id_policy: IdPolicy::default(),
            id_seed: None,
            initial_dt: 1.0 / 30.0,
        }
    }
}

impl TrackerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, TrackError> {
        let config: TrackerConfig = serde_json::from_str(json)
            .map_err(|e| TrackError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, TrackError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            TrackError::ConfigError(format!("{}: {}", path.display(), e))
        })?;
        Self::from_json_str(&contents)
    }

    pub fn with_max_misses(self, max_misses: usize) -> Self {
        Self { max_misses, ..self }
    }

    pub fn with_iou_scale(self, iou_scale: i64, padding_cost: i64) -> Self {
        Self {
            iou_scale,
            padding_cost,
            ..self
        }
    }

    pub fn with_noise(
        self,
        process_noise: [f32; 6],
        measurement_noise: f32,
    ) -> Self {
        Self {
            process_noise,
            measurement_noise,
            ..self
        }
    }

    pub fn with_min_iou(self, min_iou: f32) -> Self {
        Self { min_iou, ..self }
    }

    pub fn with_id_policy(self, id_policy: IdPolicy) -> Self {
        Self { id_policy, ..self }
    }

    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            id_seed: Some(seed),
            ..self
        }
    }

    pub fn validate(&self) -> Result<(), TrackError> {
        if !(1..=MAX_COST_MAGNITUDE).contains(&self.iou_scale) {
            return Err(TrackError::InvalidConfig(format!(
                "iou_scale must lie in [1, {}], got {}",
                MAX_COST_MAGNITUDE, self.iou_scale
            )));
        }
        if !(-MAX_COST_MAGNITUDE..=-1).contains(&self.padding_cost) {
            return Err(TrackError::InvalidConfig(format!(
                "padding_cost must lie in [-{}, -1], got {}",
                MAX_COST_MAGNITUDE, self.padding_cost
            )));
        }
        if !(0.0..=1.0).contains(&self.min_iou) {
            return Err(TrackError::InvalidConfig(format!(
                "min_iou must lie in [0, 1], got {}",
                self.min_iou
            )));
        }
        if self
            .process_noise
            .iter()
            .any(|q| !q.is_finite() || *q < 0.0)
        {
            return Err(TrackError::InvalidConfig(
                "process_noise entries must be finite and non-negative".into(),
            ));
        }
        if !(self.measurement_noise.is_finite() && self.measurement_noise > 0.0)
        {
            return Err(TrackError::InvalidConfig(format!(
                "measurement_noise must be positive, got {}",
                self.measurement_noise
            )));
        }
        if !(self.initial_covariance.is_finite()
            && self.initial_covariance > 0.0)
        {
            return Err(TrackError::InvalidConfig(format!(
                "initial_covariance must be positive, got {}",
                self.initial_covariance
            )));
        }
        if !(self.initial_dt.is_finite() && self.initial_dt >= 0.0) {
            return Err(TrackError::InvalidConfig(format!(
                "initial_dt must be non-negative, got {}",
                self.initial_dt
            )));
        }
        if let IdPolicy::Random { min, max } = self.id_policy {
            if min > max {
                return Err(TrackError::InvalidConfig(format!(
                    "id range is empty: [{}, {}]",
                    min, max
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        let config = TrackerConfig::from_json_str("{}").unwrap();
        assert_eq!(config, TrackerConfig::default());
    }

    #[test]
    fn test_partial_json_overrides() {
        let config = TrackerConfig::from_json_str(
            r#"{
                "max_misses": 3,
                "id_policy": {"kind": "monotonic", "start": 1},
                "id_seed": 7
            }"#,
        )
        .unwrap();
        assert_eq!(config.max_misses, 3);
        assert_eq!(config.id_policy, IdPolicy::Monotonic { start: 1 });
        assert_eq!(config.id_seed, Some(7));
        assert_eq!(config.iou_scale, 1000);
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad = TrackerConfig::default().with_iou_scale(0, -1);
        assert!(matches!(bad.validate(), Err(TrackError::InvalidConfig(_))));

        let bad = TrackerConfig::default().with_iou_scale(1000, 5);
        assert!(bad.validate().is_err());

        let bad = TrackerConfig::default().with_iou_scale(1000, i64::MIN);
        assert!(matches!(bad.validate(), Err(TrackError::InvalidConfig(_))));

        let bad = TrackerConfig::default()
            .with_iou_scale(MAX_COST_MAGNITUDE + 1, -1000);
        assert!(bad.validate().is_err());

        let bad = TrackerConfig::default()
            .with_id_policy(IdPolicy::Random { min: 10, max: 1 });
        assert!(bad.validate().is_err());

        let bad = TrackerConfig::default().with_min_iou(1.5);
        assert!(bad.validate().is_err());

        let bad = TrackerConfig::default().with_noise([1.0; 6], 0.0);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_accepts_cost_bounds() {
        let config = TrackerConfig::default()
            .with_iou_scale(MAX_COST_MAGNITUDE, -MAX_COST_MAGNITUDE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_json() {
        let err = TrackerConfig::from_json_str("{ max_misses: }");
        assert!(matches!(err, Err(TrackError::ConfigError(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = TrackerConfig::from_json_file("/nonexistent/tracker.json");
        assert!(matches!(err, Err(TrackError::ConfigError(_))));
    }
}
