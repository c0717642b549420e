use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("invalid observer location: {0}")]
    InvalidObserver(String),
    #[error("invalid prediction window: {0}")]
    InvalidWindow(String),
    #[error("invalid brightness calibration: {0}")]
    InvalidCalibration(String),
    #[error("propagator unavailable: {0}")]
    PropagatorUnavailable(String),
    #[error("propagation error: {0}")]
    Propagation(String),
}
