use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::elements::{ElementsFetcher, HttpTransport};
use crate::observations::ObservationLog;
use crate::predict::PassRecord;

/// The predictions table of the latest run and the log written against it
#[derive(Debug, Default)]
pub struct Session {
    pub predictions: Vec<PassRecord>,
    pub log: ObservationLog,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub fetcher: Arc<ElementsFetcher<HttpTransport>>,
    pub session: Arc<Mutex<Session>>,
}
