//! Host store maintenance: load, dedupe, backup, manual additions

use super::{append_contents, replace_contents};
use crate::utils::{random_file_name, validate_ip_addr, LINE_ENDING};
use log::{info, warn};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Result of adding hosts by hand
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AddReport {
    pub added: Vec<String>,
    pub rejected: Vec<String>,
}

/// Newline-delimited store of host addresses
#[derive(Debug, Clone)]
pub struct HostStore {
    path: PathBuf,
}

impl HostStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored host, trimmed, blank lines skipped. A missing store is empty.
    pub fn load(&self) -> io::Result<Vec<String>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Rewrite the store without duplicates, keeping first-seen order.
    /// Returns how many lines were dropped. A missing store is left missing.
    pub fn clean(&self) -> io::Result<usize> {
        if !self.path.exists() {
            warn!("{} does not exist, nothing to clean", self.path.display());
            return Ok(0);
        }
        let hosts = self.load()?;
        let before = hosts.len();

        let mut seen = HashSet::new();
        let unique: Vec<String> = hosts.into_iter().filter(|h| seen.insert(h.clone())).collect();
        let removed = before - unique.len();

        let mut contents = String::new();
        for host in &unique {
            contents.push_str(host);
            contents.push_str(LINE_ENDING);
        }
        replace_contents(&self.path, contents.as_bytes())?;

        info!("cleaned {}: {} duplicates removed", self.path.display(), removed);
        Ok(removed)
    }

    /// Copy the store into `dir` under a unique, dated name
    pub fn backup(&self, dir: &Path) -> io::Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let name = format!(
            "hosts_{}_{}.txt",
            random_file_name(22),
            chrono::Local::now().format("%Y-%m-%d")
        );
        let target = dir.join(name);
        fs::copy(&self.path, &target)?;
        info!("backed up {} to {}", self.path.display(), target.display());
        Ok(target)
    }

    /// Append comma-separated hosts after validating each one
    pub fn add_single(&self, hosts: &str, home_ok: bool) -> io::Result<AddReport> {
        let mut report = AddReport::default();
        for host in hosts.split(',').map(str::trim).filter(|h| !h.is_empty()) {
            if validate_ip_addr(host, home_ok) {
                report.added.push(host.to_string());
            } else {
                warn!("'{}' is not a valid host address, skipping", host);
                report.rejected.push(host.to_string());
            }
        }

        if !report.added.is_empty() {
            let mut contents = String::new();
            for host in &report.added {
                contents.push_str(host);
                contents.push_str(LINE_ENDING);
            }
            append_contents(&self.path, contents.as_bytes())?;
        }

        Ok(report)
    }
}
