// src/output/csv.rs
//! CSV output handler

use crate::output::OutputHandler;
use crate::types::CertificateRecord;
use async_trait::async_trait;
use std::io::{self, Write};
use std::sync::Mutex;

const HEADER: [&str; 8] = [
    "Host",
    "IssuedTo_CommonName",
    "IssuedTo_Organization",
    "IssuedBy_CommonName",
    "IssuedBy_Organization",
    "IssuedOn",
    "ExpiresOn",
    "SubjectAlternativeNames",
];

struct CsvState {
    writer: csv::Writer<Box<dyn Write + Send>>,
    header_written: bool,
}

impl CsvState {
    /// Write CSV header if not already written
    fn ensure_header(&mut self) -> anyhow::Result<()> {
        if !self.header_written {
            self.writer.write_record(HEADER)?;
            self.header_written = true;
        }
        Ok(())
    }
}

/// CSV output handler
///
/// The header is written even when no record arrives.
pub struct CsvOutput {
    state: Mutex<CsvState>,
}

impl CsvOutput {
    /// Create a new CsvOutput that writes to stdout
    pub fn new() -> Self {
        Self::from_writer(Box::new(io::stdout()))
    }

    /// Create a new CsvOutput that writes to a file
    pub fn to_file(file: std::fs::File) -> Self {
        Self::from_writer(Box::new(file))
    }

    pub fn from_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            state: Mutex::new(CsvState {
                writer: csv::Writer::from_writer(writer),
                header_written: false,
            }),
        }
    }

    fn row(record: &CertificateRecord) -> [String; 8] {
        [
            record.host.clone(),
            record.issued_to.common_name.clone(),
            record.issued_to.organization.clone(),
            record.issued_by.common_name.clone(),
            record.issued_by.organization.clone(),
            record.validity_period.issued_on_rfc3339(),
            record.validity_period.expires_on_rfc3339(),
            record.joined_sans(),
        ]
    }
}

impl Default for CsvOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutputHandler for CsvOutput {
    async fn emit_record(&self, record: &CertificateRecord) -> anyhow::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| anyhow::anyhow!("CSV writer lock poisoned"))?;

        state.ensure_header()?;
        state.writer.write_record(Self::row(record))?;
        state.writer.flush()?;
        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| anyhow::anyhow!("CSV writer lock poisoned"))?;

        state.ensure_header()?;
        state.writer.flush()?;
        Ok(())
    }
}
