mod analytics;
mod error;
mod export;
mod logbook;
mod types;

pub use analytics::{summarize, DailyPasses, Summary, WeatherStats};
pub use error::ObservationError;
pub use export::{export, load_predictions, save_predictions, ExportKind};
pub use logbook::ObservationLog;
pub use types::{NewObservation, ObservationLogEntry, Weather};
