//! Normalized scan result record
//!
//! Numeric values (counts, elapsed time, port numbers) stay as the strings
//! the scanner printed; use the `*_number` helpers to convert explicitly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root of one scan run, serialized as `{"nmap_scan": {...}}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub nmap_scan: ScanRun,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRun {
    pub full_command_line: String,
    pub scan_information: ScanInformation,
    pub scan_stats: ScanStats,
    /// Keyed by the host's IPv4 address, else its first reported address
    #[serde(flatten)]
    pub hosts: BTreeMap<String, HostReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanInformation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<String>,
    /// Per-protocol scan method summary
    #[serde(flatten)]
    pub protocols: BTreeMap<String, ProtocolInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolInfo {
    pub method: String,
    pub services: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub time_string: String,
    pub elapsed: String,
    pub hosts_up: String,
    pub down_hosts: String,
    pub total_hosts_scanned: String,
}

impl ScanStats {
    pub fn hosts_up_number(&self) -> Option<u32> {
        self.hosts_up.parse().ok()
    }

    pub fn elapsed_seconds(&self) -> Option<f64> {
        self.elapsed.parse().ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostReport {
    pub hostnames: Vec<Hostname>,
    /// `ipv4` / `ipv6` / `mac` to address
    pub addresses: BTreeMap<String, String>,
    /// MAC address to vendor, only for MACs the scanner named a vendor for
    pub vendors: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<HostStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<Uptime>,
    /// Protocol name to ports in report order
    #[serde(flatten)]
    pub protocols: BTreeMap<String, Vec<PortEntry>>,
}

impl HostReport {
    /// Ports for one protocol, empty when none were reported
    pub fn ports(&self, protocol: &str) -> &[PortEntry] {
        self.protocols
            .get(protocol)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn open_ports(&self) -> impl Iterator<Item = &PortEntry> {
        self.protocols
            .values()
            .flatten()
            .filter(|p| p.state == "open")
    }
}

/// Reported hostname; both fields are null when the host had none
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hostname {
    pub hostname: Option<String>,
    pub host_type: Option<String>,
}

impl Hostname {
    pub fn placeholder() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostStatus {
    pub state: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uptime {
    pub seconds: String,
    pub lastboot: String,
}

/// One scanned port with its service fingerprint; missing fields are ""
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortEntry {
    pub port: String,
    pub state: String,
    pub reason: String,
    pub name: String,
    pub product: String,
    pub version: String,
    pub extrainfo: String,
    pub conf: String,
    pub cpe: String,
}

impl PortEntry {
    pub fn port_number(&self) -> Option<u16> {
        self.port.parse().ok()
    }
}

impl ScanReport {
    pub fn host(&self, key: &str) -> Option<&HostReport> {
        self.nmap_scan.hosts.get(key)
    }

    pub fn hosts(&self) -> impl Iterator<Item = (&String, &HostReport)> {
        self.nmap_scan.hosts.iter()
    }
}
