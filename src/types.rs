// src/types.rs
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::target::strip_wildcard;

/// Common name and organization of a certificate subject or issuer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameInfo {
    #[serde(rename = "Common_Name_(CN)")]
    pub common_name: String,

    /// Comma-joined when the name carries several O attributes
    #[serde(rename = "Organization_(O)")]
    pub organization: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityPeriod {
    #[serde(rename = "Issued_On")]
    pub issued_on: DateTime<Utc>,

    #[serde(rename = "Expires_On")]
    pub expires_on: DateTime<Utc>,
}

impl ValidityPeriod {
    pub fn issued_on_rfc3339(&self) -> String {
        self.issued_on.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn expires_on_rfc3339(&self) -> String {
        self.expires_on.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Observable output of one successful TLS handshake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRecord {
    /// Canonical `host:port` the handshake was made against
    pub host: String,

    #[serde(rename = "Issued_To")]
    pub issued_to: NameInfo,

    #[serde(rename = "Issued_By")]
    pub issued_by: NameInfo,

    #[serde(rename = "Validity_Period")]
    pub validity_period: ValidityPeriod,

    /// DNS SAN entries as presented by the leaf certificate
    #[serde(rename = "Certificate_Subject_Alternative_Name", default)]
    pub subject_alternative_names: Vec<String>,
}

impl CertificateRecord {
    /// SAN entries usable as new targets: wildcards stripped, empties skipped
    pub fn discovered_hosts(&self) -> impl Iterator<Item = &str> {
        self.subject_alternative_names
            .iter()
            .filter_map(|name| strip_wildcard(name))
    }

    /// SANs joined the way the text outputs print them
    pub fn joined_sans(&self) -> String {
        self.subject_alternative_names.join(", ")
    }
}

impl fmt::Display for CertificateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.host)?;
        if !self.issued_to.common_name.is_empty() {
            write!(f, " (CN: {})", self.issued_to.common_name)?;
        }
        Ok(())
    }
}
