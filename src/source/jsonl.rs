//! JSON Lines record reader
//!
//! Turns any async line reader (file, stdin, socket) into a [`RecordStream`].

use super::types::RecordStream;
use crate::error::Error;
use crate::types::JsonValue;
use futures::StreamExt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::warn;

/// Decode one JSON document per line
///
/// Blank lines are ignored. Lines that are not valid JSON, including lines
/// that are not valid UTF-8, are skipped with a warning; only read failures
/// of the underlying reader surface as errors. The first `skip` decoded
/// records are dropped, which is how a resumed job moves past records that
/// were already committed.
pub fn jsonl_records<R>(reader: R, skip: u64) -> RecordStream
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    futures::stream::unfold(
        (reader.split(b'\n'), 0u64, skip),
        |(mut lines, mut line_no, mut to_skip)| async move {
            loop {
                match lines.next_segment().await {
                    Ok(Some(line)) => {
                        line_no += 1;
                        let trimmed = line.trim_ascii();
                        if trimmed.is_empty() {
                            continue;
                        }
                        match serde_json::from_slice::<JsonValue>(trimmed) {
                            Ok(_) if to_skip > 0 => to_skip -= 1,
                            Ok(record) => return Some((Ok(record), (lines, line_no, to_skip))),
                            Err(e) => {
                                warn!(line = line_no, error = %e, "Skipping malformed record");
                            }
                        }
                    }
                    Ok(None) => return None,
                    Err(e) => {
                        let err = Error::stream(format!("Failed to read line {}: {e}", line_no + 1));
                        return Some((Err(err), (lines, line_no, to_skip)));
                    }
                }
            }
        },
    )
    .boxed()
}
