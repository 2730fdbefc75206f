use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum TrackError {
    #[error("invalid detection: {0}")]
    InvalidDetection(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("failed to load config: {0}")]
    ConfigError(String),
    #[error("no free track id left in [{min}, {max}]")]
    IdSpaceExhausted { min: u64, max: u64 },
    #[error("assignment failed: {0}")]
    AssignmentError(String),
    #[error("kalman filter failed: {0}")]
    FilterError(String),
}
