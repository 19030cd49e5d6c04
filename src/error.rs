//! Error handling for hostgather
//!
//! Three failure kinds reach the operator: a discovery backend could not be
//! reached (or answered with garbage), the scanner binary is missing, or the
//! scanner's output could not be parsed. Everything else is local plumbing.

use std::time::Duration;
use thiserror::Error;

/// Main error type for discovery and scan operations
#[derive(Debug, Error)]
pub enum GatherError {
    /// Any transport, auth, status or body failure from a discovery backend
    #[error("{backend} connection error for query '{query}': {message}")]
    DiscoveryConnection {
        backend: &'static str,
        query: String,
        message: String,
    },

    #[error("scanner binary not found (tried: {})", .candidates.join(", "))]
    ScannerNotFound { candidates: Vec<String> },

    /// Scanner output was not a parseable tree. `message` holds the error
    /// diagnostics when present, otherwise the raw stdout.
    #[error("failed to parse scan output for {host}: {message}")]
    ScanParse { host: String, message: String },

    #[error("scan of {host} timed out after {}s", .after.as_secs())]
    ScanTimeout { host: String, after: Duration },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatherError {
    /// Wrap a backend failure, dropping any URL (query strings may carry API keys)
    pub fn discovery(backend: &'static str, query: &str, err: reqwest::Error) -> Self {
        GatherError::DiscoveryConnection {
            backend,
            query: query.to_string(),
            message: err.without_url().to_string(),
        }
    }

    pub fn is_discovery(&self) -> bool {
        matches!(self, GatherError::DiscoveryConnection { .. })
    }

    /// Errors that end a scan invocation. A missing scanner ends all of them.
    pub fn is_fatal_for_scan(&self) -> bool {
        matches!(
            self,
            GatherError::ScannerNotFound { .. }
                | GatherError::ScanParse { .. }
                | GatherError::ScanTimeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scanner_not_found_lists_candidates() {
        let err = GatherError::ScannerNotFound {
            candidates: vec!["nmap".into(), "/usr/bin/nmap".into()],
        };
        assert_eq!(
            err.to_string(),
            "scanner binary not found (tried: nmap, /usr/bin/nmap)"
        );
        assert!(err.is_fatal_for_scan());
        assert!(!err.is_discovery());
    }

    #[test]
    fn test_discovery_error_carries_context() {
        let err = GatherError::DiscoveryConnection {
            backend: "shodan",
            query: "apache".into(),
            message: "HTTP status server error (500 Internal Server Error)".into(),
        };
        let text = err.to_string();
        assert!(text.contains("shodan"));
        assert!(text.contains("'apache'"));
        assert!(text.contains("500"));
        assert!(err.is_discovery());
    }

    #[test]
    fn test_timeout_message() {
        let err = GatherError::ScanTimeout {
            host: "10.0.0.1".into(),
            after: Duration::from_secs(90),
        };
        assert_eq!(err.to_string(), "scan of 10.0.0.1 timed out after 90s");
    }
}
