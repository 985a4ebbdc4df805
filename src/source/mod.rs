pub mod http;

pub use http::HttpRaceDataSource;

use async_trait::async_trait;

use crate::error::IngestError;

/// Raw feed text, exactly as retrieved.
#[derive(Debug, Clone)]
pub struct RawFeeds {
    pub default_csv: String,
    pub eu_winners_csv: Option<String>,
}

/// Trait that every race-data source must implement.
#[async_trait]
pub trait RaceDataSource: Send + Sync {
    /// Fetch both feeds. Any failure aborts the whole fetch.
    async fn fetch(&self) -> Result<RawFeeds, IngestError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}
