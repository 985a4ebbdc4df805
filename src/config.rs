use clap::Parser;
use url::Url;

/// Race finish-time predictor API
#[derive(Parser, Debug, Clone)]
#[command(name = "race-predictor", version, about)]
pub struct Config {
    /// API listen address
    #[arg(long, env = "API_ADDR", default_value = "0.0.0.0:8080")]
    pub api_addr: String,

    /// URL of the default ratio feed (long or matrix CSV)
    #[arg(
        long,
        env = "RATIOS_URL",
        default_value = "https://raw.githubusercontent.com/xlsrln/urtp/main/avg_ratios.csv"
    )]
    pub ratios_url: String,

    /// URL of the EU winner-times feed (EU mode is empty when unset)
    #[arg(long, env = "EU_WINNERS_URL")]
    pub eu_winners_url: Option<String>,

    /// Timeout for each feed download in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value = "10")]
    pub http_timeout_secs: u64,

    /// Re-fetch the feeds every N seconds (0 = only on POST /api/refresh)
    #[arg(long, env = "REFRESH_INTERVAL_SECS", default_value = "0")]
    pub refresh_interval_secs: u64,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.http_timeout_secs == 0 {
            anyhow::bail!("http_timeout_secs must be positive");
        }
        if self.api_addr.parse::<std::net::SocketAddr>().is_err() {
            anyhow::bail!("api_addr '{}' is not a socket address", self.api_addr);
        }
        check_url("ratios_url", &self.ratios_url)?;
        if let Some(url) = &self.eu_winners_url {
            check_url("eu_winners_url", url)?;
        }
        Ok(())
    }
}

fn check_url(field: &str, raw: &str) -> anyhow::Result<()> {
    let url = Url::parse(raw).map_err(|e| anyhow::anyhow!("{} '{}' is invalid: {}", field, raw, e))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("{} must be an http(s) URL, got '{}'", field, raw);
    }
    Ok(())
}
