//! Host discovery through remote search-engine indexes
//!
//! Each backend turns a query string into a deduplicated [`HostSet`]. They all
//! share one contract: a backend either returns the complete set or fails with
//! [`GatherError::DiscoveryConnection`], and only a complete set ever reaches
//! the [`HostSink`].

pub mod censys;
pub mod credentials;
pub mod engine;
pub mod honeyscore;
pub mod request;
pub mod shodan;
pub mod zoomeye;

use crate::config::{GatherConfig, SaveMode};
use crate::sink::{HostSet, HostSink, PersistOutcome};
use crate::GatherError;
use log::info;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::Mutex;

pub use censys::CensysBackend;
pub use credentials::Credentials;
pub use engine::{BackendOutcome, DiscoveryEngine};
pub use honeyscore::HoneyscoreClient;
pub use request::RequestConfig;
pub use shodan::ShodanBackend;
pub use zoomeye::ZoomEyeBackend;

/// A search string plus the request settings it is sent with
#[derive(Debug, Clone)]
pub struct Query {
    pub text: String,
    pub request: RequestConfig,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            request: RequestConfig::default(),
        }
    }

    pub fn with_request(mut self, request: RequestConfig) -> Self {
        self.request = request;
        self
    }

    /// HTTP client honoring this query's proxy and identity
    pub(crate) fn client(
        &self,
        backend: &'static str,
        timeout: Duration,
    ) -> crate::Result<reqwest::Client> {
        self.request
            .client(timeout)
            .map_err(|e| GatherError::discovery(backend, &self.text, e))
    }
}

/// Discovery backend trait
#[async_trait::async_trait]
pub trait DiscoveryBackend: Send + Sync {
    /// Run the query and collect every address the service reports
    async fn search(&self, query: &Query) -> crate::Result<HostSet>;

    fn name(&self) -> &'static str;

    /// Search, then hand the complete set to the sink
    async fn run(
        &self,
        query: &Query,
        sink: &Mutex<HostSink>,
        mode: Option<SaveMode>,
    ) -> crate::Result<PersistOutcome> {
        info!("searching {} with given query '{}'", self.name(), query.text);
        let hosts = self.search(query).await?;
        info!("{} returned {} hosts", self.name(), hosts.len());

        let sink = sink.lock().await;
        sink.persist(&hosts, mode)
    }
}

/// Backend selection tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Censys,
    Shodan,
    ZoomEye,
}

impl BackendKind {
    pub fn all() -> [BackendKind; 3] {
        [BackendKind::Censys, BackendKind::Shodan, BackendKind::ZoomEye]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Censys => "censys",
            BackendKind::Shodan => "shodan",
            BackendKind::ZoomEye => "zoomeye",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = GatherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "censys" => Ok(BackendKind::Censys),
            "shodan" => Ok(BackendKind::Shodan),
            "zoomeye" => Ok(BackendKind::ZoomEye),
            other => Err(GatherError::Config(format!("unknown backend '{}'", other))),
        }
    }
}

/// Enum wrapper so heterogeneous backends can live in one collection
pub enum Backend {
    Censys(CensysBackend),
    Shodan(ShodanBackend),
    ZoomEye(ZoomEyeBackend),
}

impl Backend {
    /// Build the backend for `kind` from configured endpoints and tokens
    pub fn from_config(kind: BackendKind, config: &GatherConfig) -> crate::Result<Self> {
        let timeout = config.request_timeout();
        let missing = |what: &str| GatherError::Config(format!("{} token is not configured", what));

        Ok(match kind {
            BackendKind::Censys => {
                let id = config.tokens.censys_id.clone().ok_or_else(|| missing("Censys ID"))?;
                let token = config
                    .tokens
                    .censys_token
                    .clone()
                    .ok_or_else(|| missing("Censys API"))?;
                Backend::Censys(CensysBackend::new(
                    &config.api.censys_url,
                    Credentials::TokenPair { id, token },
                    timeout,
                )?)
            }
            BackendKind::Shodan => {
                let token = config.tokens.shodan.clone().ok_or_else(|| missing("Shodan API"))?;
                Backend::Shodan(ShodanBackend::new(
                    &config.api.shodan_url,
                    Credentials::Token(token),
                    timeout,
                )?)
            }
            BackendKind::ZoomEye => Backend::ZoomEye(ZoomEyeBackend::new(
                &config.api.zoomeye_login_url,
                &config.api.zoomeye_search_url,
                Credentials::ObfuscatedLogin {
                    user_file: config.zoomeye_user_file.clone(),
                    pass_file: config.zoomeye_pass_file.clone(),
                },
                timeout,
            )?),
        })
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::Censys(_) => BackendKind::Censys,
            Backend::Shodan(_) => BackendKind::Shodan,
            Backend::ZoomEye(_) => BackendKind::ZoomEye,
        }
    }
}

#[async_trait::async_trait]
impl DiscoveryBackend for Backend {
    async fn search(&self, query: &Query) -> crate::Result<HostSet> {
        match self {
            Backend::Censys(backend) => backend.search(query).await,
            Backend::Shodan(backend) => backend.search(query).await,
            Backend::ZoomEye(backend) => backend.search(query).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Backend::Censys(backend) => backend.name(),
            Backend::Shodan(backend) => backend.name(),
            Backend::ZoomEye(backend) => backend.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_round_trip() {
        for kind in BackendKind::all() {
            assert_eq!(kind.as_str().parse::<BackendKind>().unwrap(), kind);
        }
        assert_eq!("ZoomEye".parse::<BackendKind>().unwrap(), BackendKind::ZoomEye);
        assert!("bing".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_from_config_requires_tokens() {
        let config = GatherConfig::default();
        assert!(matches!(
            Backend::from_config(BackendKind::Shodan, &config),
            Err(GatherError::Config(_))
        ));
        assert!(matches!(
            Backend::from_config(BackendKind::Censys, &config),
            Err(GatherError::Config(_))
        ));
        // the session backend reads its credentials lazily
        let backend = Backend::from_config(BackendKind::ZoomEye, &config).unwrap();
        assert_eq!(backend.kind(), BackendKind::ZoomEye);
        assert_eq!(backend.name(), "zoomeye");
    }

    #[test]
    fn test_from_config_with_tokens() {
        let mut config = GatherConfig::default();
        config.tokens.shodan = Some("k".into());
        config.tokens.censys_id = Some("id".into());
        config.tokens.censys_token = Some("secret".into());

        assert_eq!(
            Backend::from_config(BackendKind::Shodan, &config).unwrap().kind(),
            BackendKind::Shodan
        );
        assert_eq!(
            Backend::from_config(BackendKind::Censys, &config).unwrap().name(),
            "censys"
        );
    }
}
