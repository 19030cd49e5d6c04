//! Utility modules shared by discovery and scanning

pub mod prompt;

use indicatif::{ProgressBar, ProgressStyle};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub use prompt::{ModeChoice, PolicyPrompter, Prompter, TerminalPrompter};

/// Platform line separator used for every text artifact we write
#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

/// Logging utilities
pub struct Logger;

impl Logger {
    /// Initialize logger with specified level
    pub fn init(level: log::LevelFilter) {
        env_logger::Builder::from_default_env()
            .filter_level(level)
            .format_timestamp_secs()
            .init();
    }

    /// Map a `-v` count to a level
    pub fn level_from_verbosity(verbose: u8) -> log::LevelFilter {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

/// Background progress spinner, stopped through a cancellation token
pub struct Spinner {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Spinner {
    /// Start spinning on the current tokio runtime
    pub fn start(message: impl Into<String>) -> Self {
        let token = CancellationToken::new();
        let child = token.child_token();
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.into());

        let handle = tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_millis(100));
            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = tick.tick() => bar.tick(),
                }
            }
            bar.finish_and_clear();
        });

        Self { token, handle }
    }

    /// Token that stops the spinner when cancelled; hand it to anything that may prompt
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub async fn stop(self) {
        self.token.cancel();
        let _ = self.handle.await;
    }
}

/// Random alphanumeric string for unique artifact names
pub fn random_file_name(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Check that `provided` is a usable IPv4 host address.
///
/// The unspecified, loopback and broadcast addresses are refused unless
/// `home_ok` is set, in which case only broadcast is refused.
pub fn validate_ip_addr(provided: &str, home_ok: bool) -> bool {
    let not_acceptable: &[&str] = if home_ok {
        &["255.255.255.255"]
    } else {
        &["0.0.0.0", "127.0.0.1", "255.255.255.255"]
    };

    if not_acceptable.contains(&provided) {
        return false;
    }
    provided.parse::<Ipv4Addr>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_file_name() {
        let a = random_file_name(10);
        let b = random_file_name(10);
        assert_eq!(a.len(), 10);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_validate_ip_addr() {
        assert!(validate_ip_addr("192.168.1.10", false));
        assert!(!validate_ip_addr("127.0.0.1", false));
        assert!(validate_ip_addr("127.0.0.1", true));
        assert!(!validate_ip_addr("255.255.255.255", true));
        assert!(!validate_ip_addr("999.1.1.1", false));
        assert!(!validate_ip_addr("example.com", false));
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(Logger::level_from_verbosity(0), log::LevelFilter::Warn);
        assert_eq!(Logger::level_from_verbosity(2), log::LevelFilter::Debug);
        assert_eq!(Logger::level_from_verbosity(9), log::LevelFilter::Trace);
    }

    #[tokio::test]
    async fn test_spinner_stops_on_cancel() {
        let spinner = Spinner::start("working");
        let token = spinner.token();
        token.cancel();
        tokio::time::timeout(Duration::from_secs(2), spinner.stop())
            .await
            .expect("spinner task should finish once cancelled");
    }
}
