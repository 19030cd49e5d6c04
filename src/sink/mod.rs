//! Host sink - persistence boundary for discovered addresses
//!
//! Every backend funnels its complete result set through [`HostSink::persist`].
//! A store that already exists is never overwritten unless someone said so:
//! either the caller passes a [`SaveMode`] or the [`Prompter`] picks one.

pub mod store;

use crate::config::SaveMode;
use crate::utils::{ModeChoice, Prompter, LINE_ENDING};
use log::{error, info, warn};
use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;

pub use store::{AddReport, HostStore};

/// Deduplicated set of discovered IP address strings
pub type HostSet = BTreeSet<String>;

/// What a persist call actually did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistOutcome {
    pub path: PathBuf,
    pub mode: SaveMode,
    /// False when the operator gave an unusable answer and nothing was written
    pub saved: bool,
    pub written: usize,
}

/// Writes host sets into one store file
#[derive(Clone)]
pub struct HostSink {
    path: PathBuf,
    prompter: Arc<dyn Prompter>,
    progress: Option<CancellationToken>,
}

impl HostSink {
    pub fn new(path: impl Into<PathBuf>, prompter: Arc<dyn Prompter>) -> Self {
        Self {
            path: path.into(),
            prompter,
            progress: None,
        }
    }

    /// Progress indicator to silence before the operator is asked anything
    pub fn with_progress(mut self, token: CancellationToken) -> Self {
        self.progress = Some(token);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist `hosts` into the store, resolving the write mode first
    pub fn persist(&self, hosts: &HostSet, mode: Option<SaveMode>) -> crate::Result<PersistOutcome> {
        if mode.is_none() && self.path.exists() {
            if let Some(token) = &self.progress {
                token.cancel();
            }
        }
        write_hosts(hosts, &self.path, mode, self.prompter.as_ref())
    }
}

/// Write `hosts` one per line into `path`.
///
/// A missing file is simply created. For an existing file the explicit `mode`
/// wins; otherwise the prompter is asked, and an invalid answer resolves to
/// append without writing anything.
pub fn write_hosts(
    hosts: &HostSet,
    path: &Path,
    mode: Option<SaveMode>,
    prompter: &dyn Prompter,
) -> crate::Result<PersistOutcome> {
    let mode = if !path.exists() {
        SaveMode::Overwrite
    } else if let Some(mode) = mode {
        mode
    } else {
        match prompter.choose_save_mode(path) {
            ModeChoice::Append => SaveMode::Append,
            ModeChoice::Overwrite => SaveMode::Overwrite,
            ModeChoice::Invalid(answer) => {
                error!("invalid input provided ('{}'), appending to file", answer);
                error!("Search results NOT SAVED!");
                return Ok(PersistOutcome {
                    path: path.to_path_buf(),
                    mode: SaveMode::Append,
                    saved: false,
                    written: 0,
                });
            }
        }
    };

    let mut buffer = String::new();
    let mut written = 0;
    for host in hosts {
        let host = host.trim();
        if host.is_empty() {
            continue;
        }
        buffer.push_str(host);
        buffer.push_str(LINE_ENDING);
        written += 1;
    }

    match mode {
        SaveMode::Overwrite => {
            if path.exists() {
                warn!("Overwriting {}", path.display());
            }
            replace_contents(path, buffer.as_bytes())?;
        }
        SaveMode::Append => {
            info!("Appending to {}", path.display());
            append_contents(path, buffer.as_bytes())?;
        }
    }

    info!("successfully wrote {} hosts to '{}'", written, path.display());
    Ok(PersistOutcome {
        path: path.to_path_buf(),
        mode,
        saved: true,
        written,
    })
}

/// Swap the file's contents in one rename so readers never see a partial store
pub(crate) fn replace_contents(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Append `contents` to the file, or leave it exactly as it was on failure
pub(crate) fn append_contents(path: &Path, contents: &[u8]) -> io::Result<()> {
    append_with(path, |file| {
        file.write_all(contents)?;
        file.flush()
    })
}

fn append_with<F>(path: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let original_len = file.metadata()?.len();
    if let Err(e) = write(&mut file) {
        // drop whatever part of the batch made it to disk
        if let Err(truncate) = file.set_len(original_len) {
            error!("could not roll back {}: {}", path.display(), truncate);
        }
        return Err(e);
    }
    Ok(())
}
