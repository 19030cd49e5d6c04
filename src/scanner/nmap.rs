//! Nmap process wrapper - launch, capture, back up, normalize

use super::arguments::KnownArguments;
use super::diagnostics::Diagnostics;
use super::parser::parse_nmap_xml;
use super::report::ScanReport;
use crate::config::GatherConfig;
use crate::utils::{random_file_name, Prompter};
use crate::GatherError;
use log::{debug, info, warn};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Arguments used when the caller supplies none
pub const DEFAULT_ARGUMENTS: &[&str] = &["-sV"];

/// Nmap-specific configuration
#[derive(Debug, Clone)]
pub struct NmapConfig {
    /// Path to nmap binary
    pub nmap_path: String,
    /// Newline-delimited list of accepted flags
    pub known_args_file: PathBuf,
    /// Raw XML output of every scan lands here
    pub xml_backup_dir: PathBuf,
    /// Normalized records land here
    pub json_backup_dir: PathBuf,
    /// Kill the scan after this long
    pub timeout: Option<Duration>,
}

impl NmapConfig {
    pub fn from_gather_config(config: &GatherConfig, nmap_path: impl Into<String>) -> Self {
        Self {
            nmap_path: nmap_path.into(),
            known_args_file: config.nmap_options_file.clone(),
            xml_backup_dir: config.xml_backup_dir(),
            json_backup_dir: config.json_backup_dir(),
            timeout: config.scan_timeout(),
        }
    }
}

/// Host plus scan parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTarget {
    pub host: String,
    /// Port range in scanner syntax, e.g. `1-1024,8080`
    pub ports: Option<String>,
    pub arguments: Vec<String>,
}

impl ScanTarget {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ports: None,
            arguments: Vec::new(),
        }
    }

    pub fn with_ports(mut self, ports: impl Into<String>) -> Self {
        self.ports = Some(ports.into());
        self
    }

    pub fn with_arguments(mut self, arguments: Vec<String>) -> Self {
        self.arguments = arguments;
        self
    }
}

/// Everything captured from one scanner run
#[derive(Debug, Clone)]
pub struct RawScan {
    pub host: String,
    pub command_line: Vec<String>,
    /// Lossy text view of stdout; the backup holds the exact bytes
    pub stdout: String,
    pub diagnostics: Diagnostics,
    /// Where the raw stdout was saved
    pub backup: PathBuf,
    pub exit_code: Option<i32>,
}

/// Command execution output
#[derive(Debug)]
struct CommandOutput {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    exit_code: Option<i32>,
}

/// Nmap integration engine
pub struct NmapEngine {
    config: NmapConfig,
    known: KnownArguments,
    prompter: Arc<dyn Prompter>,
}

impl NmapEngine {
    /// Create new Nmap engine; the known-arguments list is read once here
    pub fn new(config: NmapConfig, prompter: Arc<dyn Prompter>) -> Self {
        let known = KnownArguments::load(&config.known_args_file);
        debug!("{} known nmap arguments loaded", known.len());
        Self {
            config,
            known,
            prompter,
        }
    }

    pub fn config(&self) -> &NmapConfig {
        &self.config
    }

    /// Validated form of `arguments`, falling back to the defaults.
    ///
    /// Unknown entries go to the prompter, so call this once per scan
    /// invocation and hand the result to [`NmapEngine::scan_with`] for
    /// every host.
    pub fn validated_arguments(&self, arguments: &[String]) -> Vec<String> {
        if arguments.is_empty() {
            return DEFAULT_ARGUMENTS.iter().map(|a| a.to_string()).collect();
        }
        self.known.validate(arguments, self.prompter.as_ref())
    }

    /// Full argument vector: XML to stdout, host, optional ports, extras
    pub fn launch_arguments(&self, target: &ScanTarget, validated: &[String]) -> Vec<String> {
        let mut args = vec!["-oX".to_string(), "-".to_string(), target.host.clone()];
        if let Some(ports) = target.ports.as_deref().filter(|p| !p.is_empty()) {
            args.push("-p".to_string());
            args.push(ports.to_string());
        }
        args.extend(validated.iter().filter(|a| !a.is_empty()).cloned());
        args
    }

    /// Run the scanner against `target` and capture everything it printed.
    ///
    /// Stdout is saved to the backup directory before this returns, whatever
    /// happens to it afterwards.
    pub async fn launch(&self, target: &ScanTarget) -> crate::Result<RawScan> {
        let validated = self.validated_arguments(&target.arguments);
        self.launch_with(target, &validated).await
    }

    /// Like [`NmapEngine::launch`] with arguments that were already validated
    pub async fn launch_with(&self, target: &ScanTarget, validated: &[String]) -> crate::Result<RawScan> {
        let args = self.launch_arguments(target, validated);

        let mut command_line = vec![self.config.nmap_path.clone()];
        command_line.extend(args.iter().cloned());
        info!(
            "launching nmap scan against {} ({})",
            target.host,
            command_line.join(" ")
        );

        let output = match self.config.timeout {
            Some(limit) => timeout(limit, self.execute_nmap_command(&args))
                .await
                .map_err(|_| GatherError::ScanTimeout {
                    host: target.host.clone(),
                    after: limit,
                })??,
            None => self.execute_nmap_command(&args).await?,
        };

        if output.exit_code != Some(0) {
            warn!("nmap exited with status {:?}", output.exit_code);
        }

        let backup = write_xml_backup(&self.config.xml_backup_dir, &target.host, &output.stdout)?;
        debug!("raw scan output saved to {}", backup.display());

        Ok(RawScan {
            host: target.host.clone(),
            command_line,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            diagnostics: Diagnostics::classify(&String::from_utf8_lossy(&output.stderr)),
            backup,
            exit_code: output.exit_code,
        })
    }

    /// Launch, normalize the output into a report and save it as JSON
    pub async fn scan(&self, target: &ScanTarget) -> crate::Result<ScanReport> {
        let validated = self.validated_arguments(&target.arguments);
        self.scan_with(target, &validated).await
    }

    /// Like [`NmapEngine::scan`] with arguments that were already validated
    pub async fn scan_with(&self, target: &ScanTarget, validated: &[String]) -> crate::Result<ScanReport> {
        let raw = self.launch_with(target, validated).await?;
        for warning in raw.diagnostics.warnings() {
            warn!("{}", warning.line);
        }
        let report = parse_nmap_xml(&raw.host, &raw.stdout, &raw.diagnostics)?;

        let saved = write_json_backup(&self.config.json_backup_dir, &raw.host, &report)?;
        info!("scan record saved to {}", saved.display());
        Ok(report)
    }

    /// Execute Nmap command
    async fn execute_nmap_command(&self, args: &[String]) -> crate::Result<CommandOutput> {
        let mut cmd = Command::new(&self.config.nmap_path);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // output() drains both pipes concurrently before returning
        let output = cmd.output().await.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => GatherError::ScannerNotFound {
                candidates: vec![self.config.nmap_path.clone()],
            },
            _ => GatherError::Io(e),
        })?;

        Ok(CommandOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code(),
        })
    }
}

/// Unique artifact path: `<dir>/<host>_<10 random chars>.<ext>`
fn backup_path(dir: &Path, host: &str, extension: &str) -> PathBuf {
    let safe_host: String = host
        .chars()
        .map(|c| if c == '/' || c == ':' || c == '\\' { '_' } else { c })
        .collect();
    dir.join(format!("{}_{}.{}", safe_host, random_file_name(10), extension))
}

/// Save raw scanner output byte for byte
pub fn write_xml_backup(dir: &Path, host: &str, output: &[u8]) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = backup_path(dir, host, "xml");
    fs::write(&path, output)?;
    Ok(path)
}

/// Save any serializable record (normally a [`ScanReport`]) as pretty JSON
pub fn write_json_backup<T: Serialize>(dir: &Path, host: &str, record: &T) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = backup_path(dir, host, "json");
    let json = serde_json::to_string_pretty(record)?;
    fs::write(&path, json)?;
    Ok(path)
}
