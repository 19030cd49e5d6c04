//! Shodan backend - one GET with key and query in the query string

use super::{Credentials, DiscoveryBackend, Query};
use crate::sink::HostSet;
use crate::GatherError;
use serde::Deserialize;
use std::time::Duration;

const NAME: &str = "shodan";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    matches: Vec<SearchMatch>,
}

#[derive(Debug, Deserialize)]
struct SearchMatch {
    ip_str: String,
}

pub struct ShodanBackend {
    url: String,
    token: String,
    timeout: Duration,
}

impl ShodanBackend {
    pub fn new(url: &str, credentials: Credentials, timeout: Duration) -> crate::Result<Self> {
        match credentials {
            Credentials::Token(token) => Ok(Self {
                url: url.to_string(),
                token,
                timeout,
            }),
            other => Err(GatherError::Config(format!(
                "shodan needs a single API token, got {:?}",
                other
            ))),
        }
    }

    async fn fetch(&self, client: &reqwest::Client, query: &str) -> reqwest::Result<HostSet> {
        let response: SearchResponse = client
            .get(&self.url)
            .query(&[("key", self.token.as_str()), ("query", query)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.matches.into_iter().map(|m| m.ip_str).collect())
    }
}

#[async_trait::async_trait]
impl DiscoveryBackend for ShodanBackend {
    async fn search(&self, query: &Query) -> crate::Result<HostSet> {
        let client = query.client(NAME, self.timeout)?;
        self.fetch(&client, &query.text)
            .await
            .map_err(|e| GatherError::discovery(NAME, &query.text, e))
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
