//! Scanner integration: locate the external binary, run it, normalize its output

pub mod arguments;
pub mod diagnostics;
pub mod locate;
pub mod nmap;
pub mod parser;
pub mod report;
pub mod xml;

pub use arguments::KnownArguments;
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use locate::locate;
pub use nmap::{write_json_backup, write_xml_backup, NmapConfig, NmapEngine, RawScan, ScanTarget};
pub use parser::parse_nmap_xml;
pub use report::{HostReport, PortEntry, ScanReport, ScanRun, ScanStats};
