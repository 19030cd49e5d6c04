//! Censys backend - one basic-auth POST with the query as a JSON body

use super::{Credentials, DiscoveryBackend, Query};
use crate::sink::HostSet;
use crate::GatherError;
use serde::Deserialize;
use std::time::Duration;

const NAME: &str = "censys";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    ip: String,
}

pub struct CensysBackend {
    url: String,
    id: String,
    token: String,
    timeout: Duration,
}

impl CensysBackend {
    pub fn new(url: &str, credentials: Credentials, timeout: Duration) -> crate::Result<Self> {
        match credentials {
            Credentials::TokenPair { id, token } => Ok(Self {
                url: url.to_string(),
                id,
                token,
                timeout,
            }),
            other => Err(GatherError::Config(format!(
                "censys needs an id/token pair, got {:?}",
                other
            ))),
        }
    }

    async fn fetch(&self, client: &reqwest::Client, query: &str) -> reqwest::Result<HostSet> {
        let response: SearchResponse = client
            .post(&self.url)
            .basic_auth(&self.id, Some(&self.token))
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.results.into_iter().map(|r| r.ip).collect())
    }
}

#[async_trait::async_trait]
impl DiscoveryBackend for CensysBackend {
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
