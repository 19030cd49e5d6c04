//! Configuration module for hostgather

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::GatherError;

/// Default candidate locations for the nmap binary, probed in order
pub const NMAP_POSSIBLE_PATHS: &[&str] = &[
    "nmap",
    "/usr/bin/nmap",
    "/usr/local/bin/nmap",
    "/sw/bin/nmap",
    "/opt/local/bin/nmap",
];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatherConfig {
    /// Root directory for scan backups and host store backups
    pub home: PathBuf,

    /// Shared host store written by every discovery backend
    pub host_file: PathBuf,

    /// Per-request timeout for discovery backends, in seconds
    pub request_timeout_secs: u64,

    /// Kill the scanner after this many seconds (no limit when unset)
    pub scan_timeout_secs: Option<u64>,

    /// Remote endpoints
    pub api: ApiEndpoints,

    /// Static API tokens
    pub tokens: ApiTokens,

    /// Obfuscated credential blobs for the session backend
    pub zoomeye_user_file: PathBuf,
    pub zoomeye_pass_file: PathBuf,

    /// Candidate scanner binaries
    pub nmap_paths: Vec<String>,

    /// Newline-delimited list of accepted scanner flags
    pub nmap_options_file: PathBuf,

    /// Newline-delimited list of User-Agent strings for random selection
    pub agents_file: PathBuf,

    /// Answers used instead of operator prompts
    pub non_interactive: NonInteractivePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiEndpoints {
    pub censys_url: String,
    pub shodan_url: String,
    pub zoomeye_login_url: String,
    pub zoomeye_search_url: String,
    pub honeyscore_url: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            censys_url: "https://censys.io/api/v1/search/ipv4".to_string(),
            shodan_url: "https://api.shodan.io/shodan/host/search".to_string(),
            zoomeye_login_url: "https://api.zoomeye.org/user/login".to_string(),
            zoomeye_search_url: "https://api.zoomeye.org/web/search".to_string(),
            honeyscore_url: "https://api.shodan.io/labs/honeyscore".to_string(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiTokens {
    pub shodan: Option<String>,
    pub censys_id: Option<String>,
    pub censys_token: Option<String>,
}

impl std::fmt::Debug for ApiTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mark = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("ApiTokens")
            .field("shodan", &mark(&self.shodan))
            .field("censys_id", &mark(&self.censys_id))
            .field("censys_token", &mark(&self.censys_token))
            .finish()
    }
}

/// What to do with unknown scanner arguments when nobody can be asked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentPolicy {
    Reject,
    Accept,
}

/// How an existing host store is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveMode {
    Append,
    Overwrite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NonInteractivePolicy {
    pub enabled: bool,
    pub unknown_arguments: ArgumentPolicy,
    pub save_mode: SaveMode,
}

impl Default for NonInteractivePolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            unknown_arguments: ArgumentPolicy::Reject,
            save_mode: SaveMode::Append,
        }
    }
}

impl Default for GatherConfig {
    fn default() -> Self {
        let home = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".hostgather_home");
        let text_files = PathBuf::from("etc").join("text_files");

        Self {
            home,
            host_file: PathBuf::from("hosts.txt"),
            request_timeout_secs: 30,
            scan_timeout_secs: None,
            api: ApiEndpoints::default(),
            tokens: ApiTokens::default(),
            zoomeye_user_file: text_files.join("users.lst"),
            zoomeye_pass_file: text_files.join("passes.lst"),
            nmap_paths: NMAP_POSSIBLE_PATHS.iter().map(|p| p.to_string()).collect(),
            nmap_options_file: text_files.join("nmap_opts.lst"),
            agents_file: text_files.join("agents.txt"),
            non_interactive: NonInteractivePolicy::default(),
        }
    }
}

impl GatherConfig {
    /// Load configuration from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            GatherError::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: GatherConfig = toml::from_str(&content)
            .map_err(|e| GatherError::Config(format!("Failed to parse TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from ~/.hostgather.toml, falling back to defaults
    pub fn load_default_config() -> Self {
        let home_dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let path = home_dir.join(".hostgather.toml");

        if path.exists() {
            match Self::from_toml_file(&path) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    return config;
                }
                Err(e) => log::warn!("Ignoring {}: {}", path.display(), e),
            }
        }

        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(GatherError::Config(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.nmap_paths.is_empty() {
            return Err(GatherError::Config("nmap_paths cannot be empty".to_string()));
        }

        if self.scan_timeout_secs == Some(0) {
            return Err(GatherError::Config(
                "scan_timeout_secs must be greater than 0 when set".to_string(),
            ));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn scan_timeout(&self) -> Option<Duration> {
        self.scan_timeout_secs.map(Duration::from_secs)
    }

    pub fn xml_backup_dir(&self) -> PathBuf {
        self.home.join("nmap_scans").join("xml")
    }

    pub fn json_backup_dir(&self) -> PathBuf {
        self.home.join("nmap_scans").join("json")
    }

    pub fn host_backup_dir(&self) -> PathBuf {
        self.home.join("backups")
    }
}
