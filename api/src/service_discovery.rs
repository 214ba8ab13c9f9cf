//! Prometheus HTTP service discovery export of enabled targets.
//!
//! Each exported target becomes one target group whose labels feed the
//! blackbox exporter's `module` and the scrape `job`.

use crate::database::Target;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetGroup {
    pub targets: Vec<String>,
    pub labels: BTreeMap<String, String>,
}

/// Extra `probe_type` substrings accepted for a protocol
fn protocol_aliases(protocol: &str) -> &'static [&'static str] {
    match protocol {
        "icmp" => &["icmp", "ping"],
        "http" => &["http", "web", "url"],
        "tcp" => &["tcp", "socket"],
        _ => &[],
    }
}

fn matches_protocol(target: &Target, protocol: &str) -> bool {
    let probe_type = target.probe_type.to_lowercase();
    probe_type.contains(protocol)
        || protocol_aliases(protocol)
            .iter()
            .any(|alias| probe_type.contains(alias))
}

fn scrape_address(target: &Target, protocol: &str) -> String {
    match (protocol, target.port) {
        ("tcp", Some(port)) => format!("{}:{}", target.address, port),
        _ => target.address.clone(),
    }
}

fn target_group(target: &Target, protocol: &str) -> TargetGroup {
    let labels = BTreeMap::from([
        ("id".to_string(), target.id.to_string()),
        ("hostname".to_string(), target.hostname.clone()),
        ("module".to_string(), protocol.to_string()),
        ("region".to_string(), target.region.clone()),
        ("assignees".to_string(), target.assignees.clone()),
        ("job".to_string(), format!("blackbox_{}", protocol)),
    ]);
    TargetGroup {
        targets: vec![scrape_address(target, protocol)],
        labels,
    }
}

/// Builds target groups for `protocol` from already-enabled targets.
///
/// When nothing matches an `icmp` request, every enabled target is exported so
/// that reachability is still probed.
pub fn export_targets(enabled_targets: &[Target], protocol: &str) -> Vec<TargetGroup> {
    let protocol = protocol.to_lowercase();
    let mut matching: Vec<&Target> = enabled_targets
        .iter()
        .filter(|target| matches_protocol(target, &protocol))
        .collect();

    if matching.is_empty() && protocol == "icmp" && !enabled_targets.is_empty() {
        tracing::info!(
            enabled = enabled_targets.len(),
            "No ICMP targets found, exporting all enabled targets"
        );
        matching = enabled_targets.iter().collect();
    }

    tracing::debug!(protocol = %protocol, exported = matching.len(), "Service discovery export");
    matching
        .into_iter()
        .map(|target| target_group(target, &protocol))
        .collect()
}

/// Fixed response for checking a Prometheus SD configuration end to end
pub fn sample_targets() -> Vec<TargetGroup> {
    vec![TargetGroup {
        targets: vec!["192.168.56.104".to_string()],
        labels: BTreeMap::from([
            ("id".to_string(), "1".to_string()),
            ("hostname".to_string(), "example.com".to_string()),
            ("module".to_string(), "icmp".to_string()),
            ("region".to_string(), "US-East".to_string()),
            ("assignees".to_string(), "team-network".to_string()),
            ("job".to_string(), "blackbox_icmp".to_string()),
        ]),
    }]
}
