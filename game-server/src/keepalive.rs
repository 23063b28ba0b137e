use std::time::Duration;
use tracing::{info, warn};

const FIRST_PING_DELAY: Duration = Duration::from_secs(30);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Periodically requests our own public `/health`.
pub struct KeepAlive {
    client: reqwest::Client,
    health_url: String,
    interval: Duration,
}

impl KeepAlive {
    pub fn new(base_url: &str, interval: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            health_url: health_url(base_url),
            interval: interval.max(MIN_INTERVAL),
        })
    }

    pub fn health_url(&self) -> &str {
        &self.health_url
    }

    pub async fn ping(&self) -> reqwest::Result<reqwest::StatusCode> {
        let response = self.client.get(&self.health_url).send().await?;
        Ok(response.status())
    }

    pub async fn run(self) {
        info!("Keep-alive pinging {} every {:?}", self.health_url, self.interval);
        tokio::time::sleep(FIRST_PING_DELAY).await;

        let mut interval = tokio::time::interval(self.interval);
        loop {
            interval.tick().await;
            match self.ping().await {
                Ok(status) => info!("Keep-alive ping answered with {}", status),
                Err(e) => warn!("Keep-alive ping failed: {}", e),
            }
        }
    }
}

fn health_url(base_url: &str) -> String {
    format!("{}/health", base_url.trim_end_matches('/'))
}
