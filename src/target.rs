// src/target.rs
//! Target canonicalization
//!
//! Every job and every dedup key goes through [`canonicalize`], which turns
//! loosely formatted input (`https://host`, `*.host`, `host:8443`, `[::1]`)
//! into a single `host:port` form.

use url::{Host, Url};

/// Port used when a target doesn't carry one
pub const DEFAULT_PORT: u16 = 443;

const SCHEMES: [&str; 2] = ["https://", "http://"];

/// Canonicalize a raw target into `host:port`
///
/// `http://` and `https://` targets are parsed as URLs, so user-info, path,
/// query and fragment are dropped. Leading `*.` wildcard markers are removed,
/// the host is lowercased without its trailing dot, and [`DEFAULT_PORT`]
/// applies when no port is given, whatever the scheme. Applying it twice
/// gives the same result as applying it once.
pub fn canonicalize(raw: &str) -> String {
    let s = raw.trim();

    match strip_scheme(s) {
        Some(rest) => from_url(s).unwrap_or_else(|| from_bare(authority(rest))),
        None => from_bare(s),
    }
}

/// Remainder after an `http(s)://` prefix, matched case-insensitively
fn strip_scheme(s: &str) -> Option<&str> {
    SCHEMES.iter().find_map(|scheme| {
        s.get(..scheme.len())
            .filter(|prefix| prefix.eq_ignore_ascii_case(scheme))
            .map(|_| &s[scheme.len()..])
    })
}

/// `host[:port]` part of a scheme-less URL remainder
fn authority(rest: &str) -> &str {
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..end];
    authority.rsplit_once('@').map_or(authority, |(_, host)| host)
}

fn from_url(s: &str) -> Option<String> {
    let url = Url::parse(s).ok()?;

    let host = match url.host()? {
        Host::Domain(domain) => normalize_host(domain),
        Host::Ipv4(addr) => addr.to_string(),
        Host::Ipv6(addr) => addr.to_string(),
    };

    // the parser elides a port equal to the scheme default (`http://h:80`)
    let port = match url.port() {
        Some(port) => port,
        None if explicit_port(s) => url.port_or_known_default().unwrap_or(DEFAULT_PORT),
        None => DEFAULT_PORT,
    };

    Some(join_host_port(&host, &port.to_string()))
}

fn explicit_port(s: &str) -> bool {
    strip_scheme(s)
        .map(|rest| split_host_port(authority(rest)).1)
        .is_some_and(|port| port.is_some_and(|p| !p.is_empty()))
}

fn from_bare(s: &str) -> String {
    let (host, port) = split_host_port(s);
    let host = normalize_host(host);

    match port {
        Some(port) if !port.is_empty() => join_host_port(&host, port),
        _ => join_host_port(&host, &DEFAULT_PORT.to_string()),
    }
}

fn normalize_host(host: &str) -> String {
    let mut host = host;
    while let Some(rest) = host.strip_prefix("*.") {
        host = rest;
    }
    host.trim_end_matches('.').to_lowercase()
}

/// Strip leading wildcard markers from a SAN entry
///
/// Returns `None` when nothing usable is left.
pub fn strip_wildcard(name: &str) -> Option<&str> {
    let mut name = name.trim();
    while let Some(rest) = name.strip_prefix("*.") {
        name = rest;
    }
    if name.is_empty() || name == "*" {
        None
    } else {
        Some(name)
    }
}

/// Split `host[:port]`
///
/// Bracketed IPv6 literals keep their port; an unbracketed string with more
/// than one colon is treated as a bare IPv6 host without port.
pub fn split_host_port(s: &str) -> (&str, Option<&str>) {
    if let Some(rest) = s.strip_prefix('[') {
        if let Some(end) = rest.find(']') {
            let host = &rest[..end];
            let port = rest[end + 1..].strip_prefix(':');
            return (host, port);
        }
        return (s, None);
    }

    match s.matches(':').count() {
        1 => {
            let (host, port) = s.split_once(':').unwrap_or((s, ""));
            (host, Some(port))
        }
        _ => (s, None),
    }
}

/// Join host and port, bracketing IPv6 literals
pub fn join_host_port(host: &str, port: &str) -> String {
    if host.contains(':') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}
