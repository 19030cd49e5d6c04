//! Discovery engine - runs several backends at once against one sink

use super::{Backend, DiscoveryBackend, Query};
use crate::config::SaveMode;
use crate::sink::{HostSink, PersistOutcome};
use futures::future::join_all;
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Per-backend result of one aggregation run
#[derive(Debug)]
pub struct BackendOutcome {
    pub backend: &'static str,
    pub result: crate::Result<PersistOutcome>,
}

impl BackendOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Fans a query out to every selected backend.
///
/// Backends run concurrently; writes are serialized through the sink's lock.
/// One backend failing never affects the others.
pub struct DiscoveryEngine {
    backends: Vec<Backend>,
    sink: Arc<Mutex<HostSink>>,
    save_mode: Option<SaveMode>,
}

impl DiscoveryEngine {
    pub fn new(sink: HostSink) -> Self {
        Self {
            backends: Vec::new(),
            sink: Arc::new(Mutex::new(sink)),
            save_mode: None,
        }
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backends.push(backend);
        self
    }

    /// Write mode used for an existing store instead of asking
    pub fn with_save_mode(mut self, mode: SaveMode) -> Self {
        self.save_mode = Some(mode);
        self
    }

    pub fn backend_count(&self) -> usize {
        self.backends.len()
    }

    /// Run the query on every backend and collect one outcome each
    pub async fn run(&self, query: &Query) -> Vec<BackendOutcome> {
        let runs = self.backends.iter().map(|backend| async move {
            let result = backend.run(query, &self.sink, self.save_mode).await;
            match &result {
                Ok(outcome) if outcome.saved => info!(
                    "{}: {} hosts written to {}",
                    backend.name(),
                    outcome.written,
                    outcome.path.display()
                ),
                Ok(_) => warn!("{}: results were not saved", backend.name()),
                Err(e) => warn!("{}", e),
            }
            BackendOutcome {
                backend: backend.name(),
                result,
            }
        });

        join_all(runs).await
    }
}
