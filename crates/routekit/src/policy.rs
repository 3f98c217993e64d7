//! Host-safety policy for outbound probes
//!
//! Decides whether a target host may be contacted at all. Two mutually
//! exclusive modes:
//!
//! - **Blocklist mode** (no allow-list configured): resolve the host and
//!   reject loopback, RFC1918 private, unique-local, and link-local ranges.
//!   The link-local range covers cloud metadata endpoints and is never
//!   exempted.
//! - **Allow-list mode** (non-empty allow-list): only exact, case-insensitive
//!   hostname matches pass. Blocklist ranges are not consulted; the allow-list
//!   is the strictly narrower production policy.
//!
//! The `enable_testing` master switch dominates both modes and is checked
//! first, so the execution surface stays safe even if a UI gate is bypassed.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use tokio::net::lookup_host;

use crate::config::SecurityConfig;

/// Result of evaluating a host against the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostDecision {
    /// Host may be contacted.
    Allowed,
    /// Host must not be contacted.
    Rejected { reason: String },
}

impl HostDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, HostDecision::Allowed)
    }

    fn rejected(reason: impl Into<String>) -> Self {
        HostDecision::Rejected {
            reason: reason.into(),
        }
    }
}

/// Host-safety policy evaluator.
#[derive(Debug, Clone)]
pub struct HostPolicy {
    /// Allow-listed hostnames, lowercased at construction.
    allowed_hosts: Option<Vec<String>>,
    enable_testing: bool,
}

impl Default for HostPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl HostPolicy {
    /// Blocklist-mode policy with testing enabled.
    pub fn new() -> Self {
        Self {
            allowed_hosts: None,
            enable_testing: true,
        }
    }

    /// Allow-list-mode policy permitting exactly the given hosts.
    pub fn allow_hosts(hosts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            allowed_hosts: Some(hosts.into_iter().map(|h| normalize_host(&h.into())).collect()),
            enable_testing: true,
        }
    }

    /// Policy with the master switch off: rejects every host.
    pub fn disabled() -> Self {
        Self {
            allowed_hosts: None,
            enable_testing: false,
        }
    }

    pub fn from_config(config: &SecurityConfig) -> Self {
        Self {
            allowed_hosts: config
                .allowed_hosts
                .as_ref()
                .map(|hosts| hosts.iter().map(|h| normalize_host(h)).collect()),
            enable_testing: config.enable_testing,
        }
    }

    /// Evaluate a hostname or IP literal.
    ///
    /// In blocklist mode the host is resolved before range-checking;
    /// resolution failure is itself a rejection, not a pass-through.
    pub async fn evaluate(&self, host: &str) -> HostDecision {
        if !self.enable_testing {
            return HostDecision::rejected("testing is disabled");
        }

        if let Some(allowed) = &self.allowed_hosts {
            if !allowed.is_empty() {
                let candidate = normalize_host(host);
                return if allowed.iter().any(|h| *h == candidate) {
                    HostDecision::Allowed
                } else {
                    HostDecision::rejected(format!("host not in allow-list: {host}"))
                };
            }
        }

        let addrs = match self.resolve(host).await {
            Ok(addrs) => addrs,
            Err(reason) => return HostDecision::rejected(reason),
        };

        for addr in addrs {
            if let Some(range) = blocked_range(addr) {
                tracing::debug!(host, %addr, range, "host rejected by blocklist");
                return HostDecision::rejected(format!(
                    "host {host} resolves to blocked {range} address {addr}"
                ));
            }
        }

        HostDecision::Allowed
    }

    /// Resolve a host to its addresses. IP literals (including bracketed
    /// IPv6) skip DNS entirely.
    async fn resolve(&self, host: &str) -> std::result::Result<Vec<IpAddr>, String> {
        let bare = host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = bare.parse::<IpAddr>() {
            return Ok(vec![ip]);
        }

        match lookup_host((bare, 0u16)).await {
            Ok(addrs) => {
                let addrs: Vec<IpAddr> = addrs.map(|a| a.ip()).collect();
                if addrs.is_empty() {
                    Err(format!("unresolvable host: {host}"))
                } else {
                    Ok(addrs)
                }
            }
            Err(_) => Err(format!("unresolvable host: {host}")),
        }
    }
}

/// Lowercase a hostname and strip IPv6 brackets, so `[::1]` from a parsed
/// URL matches an allow-list entry written `::1`.
fn normalize_host(host: &str) -> String {
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .to_ascii_lowercase()
}

/// Name of the blocked range an address falls into, if any.
fn blocked_range(addr: IpAddr) -> Option<&'static str> {
    match addr {
        IpAddr::V4(v4) => blocked_v4_range(v4),
        IpAddr::V6(v6) => blocked_v6_range(v6),
    }
}

fn blocked_v4_range(addr: Ipv4Addr) -> Option<&'static str> {
    if addr.is_loopback() {
        Some("loopback")
    } else if addr.is_private() {
        Some("private")
    } else if addr.is_link_local() {
        Some("link-local")
    } else {
        None
    }
}

fn blocked_v6_range(addr: Ipv6Addr) -> Option<&'static str> {
    // IPv4-mapped addresses must be checked against the IPv4 ranges,
    // otherwise ::ffff:127.0.0.1 would slip through.
    if let Some(mapped) = addr.to_ipv4_mapped() {
        return blocked_v4_range(mapped);
    }
    if addr.is_loopback() {
        Some("loopback")
    } else if (addr.segments()[0] & 0xffc0) == 0xfe80 {
        Some("link-local")
    } else if (addr.segments()[0] & 0xfe00) == 0xfc00 {
        Some("unique-local")
    } else {
        None
    }
}
