// src/output/mod.rs
//! Result sink for certinfo
//!
//! The engine hands every certificate record to a single stream; this module
//! drains that stream and renders the records in the selected format.

use crate::types::CertificateRecord;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

pub mod csv;
pub mod json;
pub mod san_list;
pub mod summary;

/// Trait for output handlers that render certificate records
#[async_trait]
pub trait OutputHandler: Send + Sync {
    async fn emit_record(&self, record: &CertificateRecord) -> anyhow::Result<()>;

    /// Flush any buffered output
    async fn flush(&self) -> anyhow::Result<()>;
}

/// Feeds the result stream into the handler the flags selected
pub struct OutputManager {
    handler: Arc<dyn OutputHandler>,
}

impl OutputManager {
    pub fn new(handler: Arc<dyn OutputHandler>) -> Self {
        Self { handler }
    }

    pub async fn emit(&self, record: &CertificateRecord) -> anyhow::Result<()> {
        self.handler.emit_record(record).await
    }

    pub async fn flush(&self) -> anyhow::Result<()> {
        self.handler.flush().await
    }

    /// Drain `records` until the engine closes the stream, then flush
    ///
    /// Returns the number of records received.
    pub async fn consume(self, mut records: mpsc::Receiver<CertificateRecord>) -> anyhow::Result<usize> {
        let mut received = 0;

        while let Some(record) = records.recv().await {
            received += 1;
            if let Err(e) = self.emit(&record).await {
                tracing::warn!("Failed to write record for {}: {}", record.host, e);
            }
        }

        self.flush().await?;
        Ok(received)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    /// In-memory writer whose contents stay readable after being boxed
    #[derive(Clone, Default)]
    pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        pub fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
