//! Honeypot likelihood lookup for a single address

use log::debug;
use std::time::Duration;

const REFERER: &str = "https://honeyscore.shodan.io/";
const ORIGIN: &str = "https://honeyscore.shodan.io";

pub struct HoneyscoreClient {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl HoneyscoreClient {
    pub fn new(url: &str, api_key: &str, timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            url: url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Score between 0.0 and 1.0. Any failure reads as 0.0.
    pub async fn score(&self, ip: &str) -> f64 {
        match self.fetch(ip).await {
            Ok(body) => body.trim().parse().unwrap_or_else(|_| {
                debug!("honeyscore for {} was not a number", ip);
                0.0
            }),
            Err(e) => {
                debug!("honeyscore lookup for {} failed: {}", ip, e.without_url());
                0.0
            }
        }
    }

    async fn fetch(&self, ip: &str) -> reqwest::Result<String> {
        self.client
            .get(format!("{}/{}", self.url, ip))
            .query(&[("key", self.api_key.as_str())])
            .header(reqwest::header::REFERER, REFERER)
            .header(reqwest::header::ORIGIN, ORIGIN)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}
