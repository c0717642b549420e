mod cache;
mod error;
mod fetcher;
mod parsing;
mod transport;
mod types;

pub use error::{FetchError, TransportError};
pub use fetcher::{ElementsFetcher, FetchConfig};
pub use transport::HttpTransport;
pub use types::{ObjectId, OrbitalElementSet};
