//! ZoomEye backend - login for a session token, then a bearer search

use super::{Credentials, DiscoveryBackend, Query};
use crate::sink::HostSet;
use crate::GatherError;
use log::debug;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

const NAME: &str = "zoomeye";
const FIRST_PAGE: &str = "1";
const FACET: &str = "ipv4";

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    matches: Vec<SearchMatch>,
}

#[derive(Debug, Deserialize)]
struct SearchMatch {
    ip: Value,
}

/// Addresses of one match: every entry of a multi-address list, otherwise
/// just the first (or only) one
fn match_addresses(ip: &Value) -> Vec<String> {
    match ip {
        Value::Array(items) if items.len() > 1 => items.iter().map(value_to_string).collect(),
        Value::Array(items) => items.first().map(value_to_string).into_iter().collect(),
        Value::Null => Vec::new(),
        other => vec![value_to_string(other)],
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub struct ZoomEyeBackend {
    login_url: String,
    search_url: String,
    credentials: Credentials,
    timeout: Duration,
}

impl ZoomEyeBackend {
    pub fn new(
        login_url: &str,
        search_url: &str,
        credentials: Credentials,
        timeout: Duration,
    ) -> crate::Result<Self> {
        if !matches!(
            credentials,
            Credentials::Login { .. } | Credentials::ObfuscatedLogin { .. }
        ) {
            return Err(GatherError::Config(format!(
                "zoomeye needs a login, got {:?}",
                credentials
            )));
        }
        Ok(Self {
            login_url: login_url.to_string(),
            search_url: search_url.to_string(),
            credentials,
            timeout,
        })
    }

    async fn login(&self, client: &reqwest::Client) -> reqwest::Result<String> {
        let (username, password) = self.credentials.login_pair().unwrap_or_default();
        let token: LoginResponse = client
            .post(&self.login_url)
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!("zoomeye login succeeded");
        Ok(token.access_token)
    }

    async fn fetch(&self, client: &reqwest::Client, query: &str) -> reqwest::Result<HostSet> {
        let token = self.login(client).await?;

        let response: SearchResponse = client
            .get(&self.search_url)
            .header(reqwest::header::AUTHORIZATION, format!("JWT {}", token))
            .query(&[("query", query), ("page", FIRST_PAGE), ("facet", FACET)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .matches
            .iter()
            .flat_map(|m| match_addresses(&m.ip))
            .collect())
    }
}

#[async_trait::async_trait]
impl DiscoveryBackend for ZoomEyeBackend {
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
