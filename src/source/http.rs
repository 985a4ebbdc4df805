use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use super::{RaceDataSource, RawFeeds};
use crate::error::IngestError;

/// Fetches the ratio feeds from static URLs (e.g. raw files in a git repo).
#[derive(Clone)]
pub struct HttpRaceDataSource {
    http: Client,
    ratios_url: String,
    eu_winners_url: Option<String>,
}

impl HttpRaceDataSource {
    pub fn new(
        ratios_url: &str,
        eu_winners_url: Option<&str>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(HttpRaceDataSource {
            http,
            ratios_url: ratios_url.to_string(),
            eu_winners_url: eu_winners_url.map(str::to_string),
        })
    }

    async fn fetch_text(&self, url: &str) -> Result<String, IngestError> {
        debug!("Fetching race data: {}", url);

        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(IngestError::Status {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }

        let body = resp.text().await?;
        if body.trim().is_empty() {
            return Err(IngestError::EmptyPayload(url.to_string()));
        }
        info!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }
}

#[async_trait]
impl RaceDataSource for HttpRaceDataSource {
    async fn fetch(&self) -> Result<RawFeeds, IngestError> {
        let default_csv = self.fetch_text(&self.ratios_url).await?;
        let eu_winners_csv = match &self.eu_winners_url {
            Some(url) => Some(self.fetch_text(url).await?),
            None => None,
        };
        Ok(RawFeeds {
            default_csv,
            eu_winners_csv,
        })
    }

    fn name(&self) -> &str {
        &self.ratios_url
    }
}
