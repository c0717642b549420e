mod brightness;
mod error;
mod event_finder;
mod observer;
mod pass_extractor;
mod propagation;
mod types;

pub use brightness::BrightnessModel;
pub use error::PredictError;
pub use observer::ObserverLocation;
pub use pass_extractor::{extract_passes, filter_by_altitude};
pub use propagation::Sgp4Propagator;
pub use types::{PassRecord, PredictionWindow, MAX_WINDOW_DAYS};
