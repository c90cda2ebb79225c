// src/fetcher.rs
//! TLS certificate fetcher
//!
//! Connects to a target, completes a TLS handshake without validating the
//! peer's chain, and turns the leaf certificate into a [`CertificateRecord`].
//! Self-signed, expired and mismatched certificates are all accepted.

use async_trait::async_trait;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use socket2::{SockRef, TcpKeepalive};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, trace};

use crate::cert_parser::CertificateParser;
use crate::error::{ConfigError, FetchError};
use crate::target::{canonicalize, split_host_port};
use crate::types::CertificateRecord;

/// Keep-alive probe interval for outgoing connections
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Idle time before the first keep-alive probe and the interval between probes
fn set_keepalive(sock: &TcpStream) -> io::Result<()> {
    let keepalive = TcpKeepalive::new()
        .with_time(KEEPALIVE_INTERVAL)
        .with_interval(KEEPALIVE_INTERVAL);
    SockRef::from(sock).set_tcp_keepalive(&keepalive)
}

/// Source of certificate records, one target at a time
#[async_trait]
pub trait CertFetcher: Send + Sync {
    /// Fetch the leaf certificate of `target` (any accepted input form)
    async fn fetch(&self, target: &str) -> Result<CertificateRecord, FetchError>;
}

/// Accepts whatever chain the peer presents
///
/// Handshake signatures are still checked against the presented leaf key, so
/// the peer must hold the private key of the certificate it sends.
#[derive(Debug)]
struct AcceptAnyCertificate {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// Fetches certificates over real TCP/TLS connections
#[derive(Clone)]
pub struct TlsFetcher {
    connector: TlsConnector,
    timeout: Duration,
}

impl TlsFetcher {
    /// Build a fetcher whose connect + handshake is bounded by `timeout`
    pub fn new(timeout: Duration) -> Result<Self, ConfigError> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());

        let config = ClientConfig::builder_with_provider(Arc::clone(&provider))
            .with_safe_default_protocol_versions()
            .map_err(|e| ConfigError::Tls(e.to_string()))?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate { provider }))
            .with_no_client_auth();

        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Connect and handshake, returning the DER of the peer's leaf certificate
    async fn leaf_der(&self, host: &str, hostname: &str, port: u16) -> Result<Vec<u8>, FetchError> {
        let server_name = ServerName::try_from(hostname.to_string()).map_err(|e| {
            FetchError::connect(host, io::Error::new(io::ErrorKind::InvalidInput, e))
        })?;

        let sock = TcpStream::connect((hostname, port))
            .await
            .map_err(|e| FetchError::connect(host, e))?;

        if let Err(e) = set_keepalive(&sock) {
            trace!("Failed to set keep-alive for {}: {}", host, e);
        }

        let tls_stream = self
            .connector
            .connect(server_name, sock)
            .await
            .map_err(|e| FetchError::connect(host, e))?;

        let leaf = tls_stream
            .get_ref()
            .1
            .peer_certificates()
            .and_then(|certs| certs.first())
            .map(|cert| cert.as_ref().to_vec());

        // the connection is closed here, whatever the outcome
        drop(tls_stream);

        leaf.ok_or_else(|| FetchError::NoCertificate {
            host: host.to_string(),
        })
    }
}

#[async_trait]
impl CertFetcher for TlsFetcher {
    async fn fetch(&self, target: &str) -> Result<CertificateRecord, FetchError> {
        let host = canonicalize(target);
        let (hostname, port) = split_host_port(&host);

        let port: u16 = port.unwrap_or_default().parse().map_err(|_| {
            FetchError::connect(
                host.as_str(),
                io::Error::new(io::ErrorKind::InvalidInput, "invalid port"),
            )
        })?;

        debug!("Fetching certificate from {}", host);

        let der = match tokio::time::timeout(self.timeout, self.leaf_der(&host, hostname, port)).await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(FetchError::connect(
                    host.as_str(),
                    io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("connect/handshake timed out after {:?}", self.timeout),
                    ),
                ));
            }
        };

        CertificateParser::parse_leaf(&host, &der)
    }
}
