//! Splitting a pod log byte stream into display lines.
//!
//! Container output is arbitrary bytes. Lines are split on `\n`, decoded
//! lossily and sanitized, so a stray non-UTF-8 byte never ends a tail. A line
//! longer than the cap is emitted in cap-sized pieces, which bounds the memory
//! held per subscription.

use std::io;

use futures_util::io::{AsyncBufRead, AsyncBufReadExt};
use futures_util::{StreamExt, stream};
use podtail_types::{LineStream, SourceError};
use podtail_util::sanitize_log_line;

/// Longest line kept in one piece.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Turn a byte reader into a stream of sanitized lines of at most
/// `max_line_bytes` bytes each (before decoding).
pub fn split_lines<R>(reader: R, max_line_bytes: usize) -> LineStream
where
    R: AsyncBufRead + Send + 'static,
{
    let max_line_bytes = max_line_bytes.max(1);
    stream::unfold(Box::pin(reader), move |mut reader| async move {
        match next_line(&mut reader, max_line_bytes).await {
            Ok(Some(bytes)) => Some((Ok(sanitize_log_line(&String::from_utf8_lossy(&bytes))), reader)),
            Ok(None) => None,
            Err(error) => Some((Err(SourceError::Read(error)), reader)),
        }
    })
    .boxed()
}

/// Read up to the next `\n` (excluded) or `max` bytes, whichever comes first.
/// `None` at end of stream.
async fn next_line<R>(reader: &mut R, max: usize) -> io::Result<Option<Vec<u8>>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    loop {
        let (consumed, complete) = {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                return Ok((!line.is_empty()).then_some(line));
            }
            let window = &available[..available.len().min(max - line.len())];
            match window.iter().position(|byte| *byte == b'\n') {
                Some(index) => {
                    line.extend_from_slice(&window[..index]);
                    (index + 1, true)
                }
                None => {
                    line.extend_from_slice(window);
                    (window.len(), line.len() >= max)
                }
            }
        };
        reader.consume_unpin(consumed);
        if complete {
            return Ok(Some(line));
        }
    }
}
