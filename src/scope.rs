// src/scope.rs
//! Root-domain scope for recursive expansion

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::target::{split_host_port, strip_wildcard};

/// Limits which SAN-discovered hosts may join the next frontier
///
/// A host is in scope when it equals a root domain or is a subdomain of one.
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    roots: HashSet<String>,
}

impl ScopeFilter {
    /// Load root domains from a file (one per line, `#` comments allowed)
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::from_list(content.lines().map(str::to_string)))
    }

    pub fn from_list<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let roots = domains
            .into_iter()
            .filter_map(|d| {
                let d = d.as_ref().trim();
                if d.starts_with('#') {
                    return None;
                }
                strip_wildcard(d).map(|d| d.trim_end_matches('.').to_lowercase())
            })
            .filter(|d| !d.is_empty())
            .collect();

        Self { roots }
    }

    /// Check whether `host` (bare name or `host:port`) falls under a root domain
    pub fn contains(&self, host: &str) -> bool {
        let (name, _) = split_host_port(host);
        let name = name.trim_end_matches('.').to_lowercase();

        self.roots.iter().any(|root| {
            name == *root
                || name
                    .strip_suffix(root.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    pub fn count(&self) -> usize {
        self.roots.len()
    }
}
