// src/output/summary.rs
//! One-line-per-record output with selectable fields

use crate::output::OutputHandler;
use crate::types::CertificateRecord;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use colored::Colorize;
use std::io::{self, Write};
use std::sync::Mutex;

/// Which fields follow the host on each line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummarySelection {
    pub san: bool,
    pub issued: bool,
    pub expires: bool,
    /// Only print records issued on the current UTC date
    pub today: bool,
}

/// Prints `host [issued] [expires] [sans]` with only the selected fields
pub struct SummaryOutput {
    writer: Mutex<Box<dyn Write + Send>>,
    selection: SummarySelection,
    use_colors: bool,
}

impl SummaryOutput {
    /// Create a new SummaryOutput that writes to stdout
    pub fn new(selection: SummarySelection) -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
            selection,
            use_colors: is_terminal::is_terminal(std::io::stdout()),
        }
    }

    /// Create a new SummaryOutput that writes to a file
    pub fn to_file(file: std::fs::File, selection: SummarySelection) -> Self {
        Self::from_writer(Box::new(file), selection)
    }

    pub fn from_writer(writer: Box<dyn Write + Send>, selection: SummarySelection) -> Self {
        Self {
            writer: Mutex::new(writer),
            selection,
            use_colors: false,
        }
    }

    /// Render the line for `record`, or `None` when the today filter drops it
    fn format_line(&self, record: &CertificateRecord, today: NaiveDate) -> Option<String> {
        let validity = &record.validity_period;

        if self.selection.today {
            if validity.issued_on.date_naive() != today {
                return None;
            }
            return Some(format!(
                "{} [{}]",
                self.host(record),
                validity.issued_on_rfc3339()
            ));
        }

        let mut line = self.host(record);
        if self.selection.issued {
            line.push_str(&format!(" [{}]", validity.issued_on_rfc3339()));
        }
        if self.selection.expires {
            line.push_str(&format!(" [{}]", validity.expires_on_rfc3339()));
        }
        if self.selection.san {
            line.push_str(&format!(" [{}]", record.joined_sans()));
        }
        Some(line)
    }

    fn host(&self, record: &CertificateRecord) -> String {
        if self.use_colors {
            record.host.cyan().bold().to_string()
        } else {
            record.host.clone()
        }
    }
}

#[async_trait]
impl OutputHandler for SummaryOutput {
    async fn emit_record(&self, record: &CertificateRecord) -> anyhow::Result<()> {
        let Some(line) = self.format_line(record, Utc::now().date_naive()) else {
            return Ok(());
        };

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow::anyhow!("Summary writer lock poisoned"))?;
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow::anyhow!("Summary writer lock poisoned"))?;
        writer.flush()?;
        Ok(())
    }
}
