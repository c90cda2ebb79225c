// src/input.rs
//! Line-oriented target source

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, error};

/// Read newline-delimited targets until EOF or the first I/O error
///
/// Lines are trimmed and blank lines skipped. On error the lines read so far
/// are returned.
pub async fn read_targets<R>(reader: R) -> Vec<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut targets = Vec::new();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if !line.is_empty() {
                    targets.push(line.to_string());
                }
            }
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read targets: {}", e);
                break;
            }
        }
    }

    debug!("Read {} targets", targets.len());
    targets
}
