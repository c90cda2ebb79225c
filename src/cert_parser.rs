// src/cert_parser.rs
use chrono::{DateTime, Utc};
use x509_parser::extensions::ParsedExtension;
use x509_parser::prelude::*;

use crate::error::FetchError;
use crate::types::{CertificateRecord, NameInfo, ValidityPeriod};

/// Extracts a [`CertificateRecord`] from a DER-encoded leaf certificate
pub struct CertificateParser;

impl CertificateParser {
    /// Parse the leaf certificate presented by `host`
    pub fn parse_leaf(host: &str, der: &[u8]) -> Result<CertificateRecord, FetchError> {
        let (_, cert) = X509Certificate::from_der(der).map_err(|e| {
            FetchError::MalformedCertificate {
                host: host.to_string(),
                reason: format!("{:?}", e),
            }
        })?;

        let validity = cert.validity();
        let issued_on = Self::to_utc(host, validity.not_before.timestamp())?;
        let expires_on = Self::to_utc(host, validity.not_after.timestamp())?;

        Ok(CertificateRecord {
            host: host.to_string(),
            issued_to: Self::name_info(cert.subject()),
            issued_by: Self::name_info(cert.issuer()),
            validity_period: ValidityPeriod {
                issued_on,
                expires_on,
            },
            subject_alternative_names: Self::dns_names(&cert),
        })
    }

    /// All DNS names from the SAN extension, in presented order
    fn dns_names(cert: &X509Certificate) -> Vec<String> {
        let mut names = Vec::new();

        for ext in cert.extensions() {
            if let ParsedExtension::SubjectAlternativeName(san) = ext.parsed_extension() {
                for general_name in &san.general_names {
                    if let GeneralName::DNSName(dns_name) = general_name {
                        names.push(dns_name.to_string());
                    }
                }
            }
        }

        names
    }

    fn name_info(name: &X509Name) -> NameInfo {
        let common_name = name
            .iter_common_name()
            .find_map(|attr| attr.as_str().ok())
            .unwrap_or_default()
            .to_string();

        let organization = name
            .iter_organization()
            .filter_map(|attr| attr.as_str().ok())
            .collect::<Vec<_>>()
            .join(",");

        NameInfo {
            common_name,
            organization,
        }
    }

    fn to_utc(host: &str, timestamp: i64) -> Result<DateTime<Utc>, FetchError> {
        DateTime::from_timestamp(timestamp, 0).ok_or_else(|| FetchError::MalformedCertificate {
            host: host.to_string(),
            reason: format!("validity timestamp {} out of range", timestamp),
        })
    }
}
