//! hostgather - discover exposed hosts through search-engine indexes and scan them
//!
//! Discovery backends query remote indexes and funnel every address they find
//! through a single [`HostSink`]. The scanner side wraps an external nmap
//! binary and normalizes its XML into a [`ScanReport`].

pub mod config;
pub mod discovery;
pub mod error;
pub mod scanner;
pub mod sink;
pub mod utils;

// Re-export commonly used types
pub use config::{GatherConfig, SaveMode};
pub use discovery::{Backend, BackendKind, DiscoveryBackend, DiscoveryEngine, Query};
pub use error::GatherError;
pub use scanner::{NmapEngine, ScanReport, ScanTarget};
pub use sink::{HostSet, HostSink, HostStore, PersistOutcome};

pub type Result<T> = std::result::Result<T, GatherError>;
