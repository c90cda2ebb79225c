// src/output/san_list.rs
//! Default output: every SAN on its own line

use crate::output::OutputHandler;
use crate::types::CertificateRecord;
use async_trait::async_trait;
use std::io::{self, Write};
use std::sync::Mutex;

pub struct SanListOutput {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl SanListOutput {
    /// Create a new SanListOutput that writes to stdout
    pub fn new() -> Self {
        Self::from_writer(Box::new(io::stdout()))
    }

    /// Create a new SanListOutput that writes to a file
    pub fn to_file(file: std::fs::File) -> Self {
        Self::from_writer(Box::new(file))
    }

    pub fn from_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl Default for SanListOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutputHandler for SanListOutput {
    async fn emit_record(&self, record: &CertificateRecord) -> anyhow::Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow::anyhow!("SAN writer lock poisoned"))?;

        for name in &record.subject_alternative_names {
            writeln!(writer, "{}", name)?;
        }
        writer.flush()?;
        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow::anyhow!("SAN writer lock poisoned"))?;
        writer.flush()?;
        Ok(())
    }
}
