use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObservationError {
    #[error("pass {0} is not in the current predictions table")]
    UnknownPass(u32),
    #[error("observed altitude {0}° outside [0, 90]")]
    InvalidAltitude(f64),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
