//! Overlay network interface detection
//!
//! Overlay clients such as ZeroTier expose a virtual adapter to the OS.
//! Multicast traffic must be scoped to that adapter or the kernel routes it
//! out the physical NIC and it never reaches the overlay. The selector scans
//! the host's interfaces for the first one that is up, is not loopback,
//! carries an IPv4 address, and whose name or description contains the
//! configured marker substring.
//!
//! Selection is a read-only heuristic. No match is not an error; callers
//! fall back to the OS default interface.

use pnet::datalink;
use pnet::ipnetwork::IpNetwork;
use std::net::Ipv4Addr;
use tracing::debug;

/// The selected overlay interface
///
/// Owned by the socket session that detected it. Each sender and receiver
/// re-detects independently; handles are never cached or shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayInterface {
    /// OS interface name, e.g. `ztks5dwy3c`
    pub name: String,
    /// First IPv4 address assigned to the interface, used to scope
    /// multicast joins and egress
    pub ipv4: Ipv4Addr,
}

/// A host interface reduced to the fields selection cares about
///
/// Decoupled from the enumeration backend so the selection rule can be
/// exercised against a synthetic interface list.
#[derive(Debug, Clone)]
pub struct IfaceCandidate {
    /// OS interface name
    pub name: String,
    /// Adapter description (empty on platforms without one)
    pub description: String,
    /// Administratively up
    pub is_up: bool,
    /// Loopback interface
    pub is_loopback: bool,
    /// First assigned IPv4 address, if any
    pub ipv4: Option<Ipv4Addr>,
}

/// Select the overlay interface from the host's interface table
///
/// Returns `None` when no interface matches; callers then bind unscoped and
/// let the OS pick the route.
pub fn select_overlay_interface(marker: &str) -> Option<OverlayInterface> {
    let selected = select_from(host_candidates(), marker);
    match &selected {
        Some(iface) => debug!(name = %iface.name, ip = %iface.ipv4, "overlay interface detected"),
        None => debug!(marker, "no overlay interface matched"),
    }
    selected
}

/// Apply the selection rule to an explicit candidate list
///
/// First candidate wins that is up, is not loopback, has an IPv4 address,
/// and matches `marker` (case-insensitive substring of name or description).
pub fn select_from(
    candidates: impl IntoIterator<Item = IfaceCandidate>,
    marker: &str,
) -> Option<OverlayInterface> {
    let marker = marker.to_lowercase();
    candidates.into_iter().find_map(|c| {
        let usable = c.is_up && !c.is_loopback && matches_marker(&c, &marker);
        match (usable, c.ipv4) {
            (true, Some(ipv4)) => Some(OverlayInterface { name: c.name, ipv4 }),
            _ => None,
        }
    })
}

fn matches_marker(candidate: &IfaceCandidate, lowercase_marker: &str) -> bool {
    candidate.name.to_lowercase().contains(lowercase_marker)
        || candidate.description.to_lowercase().contains(lowercase_marker)
}

/// Enumerate host interfaces as candidates
///
/// Enumeration problems surface as an empty list, never as an error.
fn host_candidates() -> Vec<IfaceCandidate> {
    datalink::interfaces()
        .into_iter()
        .map(|iface| IfaceCandidate {
            is_up: iface.is_up(),
            is_loopback: iface.is_loopback(),
            ipv4: first_ipv4(&iface.ips),
            name: iface.name,
            description: iface.description,
        })
        .collect()
}

fn first_ipv4(ips: &[IpNetwork]) -> Option<Ipv4Addr> {
    ips.iter().find_map(|net| match net {
        IpNetwork::V4(v4) => Some(v4.ip()),
        IpNetwork::V6(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str) -> IfaceCandidate {
        IfaceCandidate {
            name: name.to_string(),
            description: String::new(),
            is_up: true,
            is_loopback: false,
            ipv4: Some(Ipv4Addr::new(10, 147, 17, 213)),
        }
    }

    #[test]
    fn test_selects_first_matching_interface() {
        let candidates = vec![
            candidate("eth0"),
            candidate("ztks5dwy3c"),
            candidate("ztanother1"),
        ];
        let selected = select_from(candidates, "zt").unwrap();
        assert_eq!(selected.name, "ztks5dwy3c");
    }

    #[test]
    fn test_returns_none_without_match() {
        let candidates = vec![candidate("eth0"), candidate("wlan0")];
        assert!(select_from(candidates, "zt").is_none());
    }

    #[test]
    fn test_marker_is_case_insensitive() {
        let mut c = candidate("utun7");
        c.description = "ZeroTier One [d5e5fb653f]".to_string();
        assert!(select_from(vec![c], "zerotier").is_some());
    }

    #[test]
    fn test_skips_down_interfaces() {
        let mut down = candidate("zt0");
        down.is_up = false;
        let up = candidate("zt1");

        let selected = select_from(vec![down, up], "zt").unwrap();
        assert_eq!(selected.name, "zt1");
    }

    #[test]
    fn test_skips_loopback() {
        let mut lo = candidate("ztlo");
        lo.is_loopback = true;
        assert!(select_from(vec![lo], "zt").is_none());
    }

    #[test]
    fn test_skips_interfaces_without_ipv4() {
        let mut bare = candidate("zt0");
        bare.ipv4 = None;
        let addressed = candidate("zt1");

        let selected = select_from(vec![bare, addressed], "zt").unwrap();
        assert_eq!(selected.name, "zt1");
    }

    #[test]
    fn test_empty_candidate_list() {
        assert!(select_from(Vec::new(), "zt").is_none());
    }

    #[test]
    fn test_host_enumeration_does_not_panic() {
        // Environment-dependent result; only the contract matters here
        let _ = select_overlay_interface("zt");
    }
}
