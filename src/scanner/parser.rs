//! Turns the scanner's XML stdout into a [`ScanReport`]

use super::diagnostics::Diagnostics;
use super::report::{
    HostReport, HostStatus, Hostname, PortEntry, ProtocolInfo, ScanReport, ScanRun, ScanStats,
    Uptime,
};
use super::xml::Element;
use crate::GatherError;
use log::{debug, warn};

/// Parse `output` into the normalized record.
///
/// When the output is not a well-formed tree the error message carries the
/// error diagnostics if there are any, otherwise the raw output.
pub fn parse_nmap_xml(
    host: &str,
    output: &str,
    diagnostics: &Diagnostics,
) -> crate::Result<ScanReport> {
    let root = Element::parse(output).map_err(|reason| {
        debug!("scan output for {} did not parse: {}", host, reason);
        let errors = diagnostics.errors_text();
        GatherError::ScanParse {
            host: host.to_string(),
            message: if errors.is_empty() {
                output.to_string()
            } else {
                errors
            },
        }
    })?;

    let mut run = ScanRun {
        full_command_line: root.attr_or_empty("args"),
        scan_stats: scan_stats(&root),
        ..Default::default()
    };

    if diagnostics.has_errors() {
        run.scan_information.errors = Some(diagnostics.errors_text());
    }
    if diagnostics.warnings().next().is_some() {
        run.scan_information.warnings = Some(diagnostics.warnings_text());
    }
    for info in root.find_all("scaninfo") {
        run.scan_information.protocols.insert(
            info.attr_or_empty("protocol"),
            ProtocolInfo {
                method: info.attr_or_empty("type"),
                services: info.attr_or_empty("services"),
            },
        );
    }

    for attempted in root.find_all("host") {
        match host_report(attempted) {
            Some((key, report)) => {
                run.hosts.insert(key, report);
            }
            None => warn!("skipping a host entry without any address in scan of {}", host),
        }
    }

    Ok(ScanReport { nmap_scan: run })
}

fn scan_stats(root: &Element) -> ScanStats {
    let finished = root.find("runstats/finished");
    let hosts = root.find("runstats/hosts");
    let from = |element: Option<&Element>, key: &str| {
        element.map(|e| e.attr_or_empty(key)).unwrap_or_default()
    };

    ScanStats {
        time_string: from(finished, "timestr"),
        elapsed: from(finished, "elapsed"),
        hosts_up: from(hosts, "up"),
        down_hosts: from(hosts, "down"),
        total_hosts_scanned: from(hosts, "total"),
    }
}

/// Build one host entry and pick its key: IPv4 first, else the first address
fn host_report(attempted: &Element) -> Option<(String, HostReport)> {
    let mut report = HostReport::default();
    let mut key = None;

    for address in attempted.find_all("address") {
        let kind = address.attr_or_empty("addrtype");
        let addr = address.attr_or_empty("addr");
        if kind == "ipv4" {
            key = Some(addr.clone());
        } else if kind == "mac" {
            if let Some(vendor) = address.attr("vendor") {
                report.vendors.insert(addr.clone(), vendor.to_string());
            }
        }
        report.addresses.insert(kind, addr);
    }

    let key = match key {
        Some(key) => key,
        None => attempted.find("address")?.attr_or_empty("addr"),
    };

    let hostnames = attempted.find_all("hostnames/hostname");
    report.hostnames = if hostnames.is_empty() {
        vec![Hostname::placeholder()]
    } else {
        hostnames
            .into_iter()
            .map(|h| Hostname {
                hostname: h.attr("name").map(str::to_string),
                host_type: h.attr("type").map(str::to_string),
            })
            .collect()
    };

    // the last element wins when the scanner repeats one
    for status in attempted.find_all("status") {
        report.status = Some(HostStatus {
            state: status.attr_or_empty("state"),
            reason: status.attr_or_empty("reason"),
        });
    }
    for uptime in attempted.find_all("uptime") {
        report.uptime = Some(Uptime {
            seconds: uptime.attr_or_empty("seconds"),
            lastboot: uptime.attr_or_empty("lastboot"),
        });
    }

    for port in attempted.find_all("ports/port") {
        report
            .protocols
            .entry(port.attr_or_empty("protocol"))
            .or_default()
            .push(port_entry(port));
    }

    Some((key, report))
}

fn port_entry(port: &Element) -> PortEntry {
    let mut entry = PortEntry {
        port: port.attr_or_empty("portid"),
        ..Default::default()
    };

    if let Some(state) = port.find("state") {
        entry.state = state.attr_or_empty("state");
        entry.reason = state.attr_or_empty("reason");
    }

    for service in port.find_all("service") {
        entry.name = service.attr_or_empty("name");
        let copy_if_set = |key: &str, field: &mut String| {
            if let Some(value) = service.attr(key).filter(|v| !v.is_empty()) {
                *field = value.to_string();
            }
        };
        copy_if_set("product", &mut entry.product);
        copy_if_set("version", &mut entry.version);
        copy_if_set("extrainfo", &mut entry.extrainfo);
        copy_if_set("conf", &mut entry.conf);

        for cpe in service.find_all("cpe") {
            entry.cpe = cpe.text.clone();
        }
    }

    entry
}
