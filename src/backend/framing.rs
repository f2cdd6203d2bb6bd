//! Splitting backend response bodies into frames.
//!
//! Both backends stream text over chunked HTTP, but frame it differently:
//! the hosted service sends Server-Sent Events separated by a blank line,
//! the local daemon sends one JSON document per line. [`FrameStream`]
//! handles the shared part (buffering raw bytes until a delimiter shows up,
//! so multi-byte characters split across transport chunks survive) and
//! [`parse_sse_event`] handles the SSE field syntax. Carriage returns are
//! dropped on the way in, so CRLF-terminated streams frame the same as LF.

use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use memchr::memmem;

use crate::error::Error;

/// Delimiter between SSE events.
pub const SSE_DELIMITER: &[u8] = b"\n\n";

/// Delimiter between newline-delimited JSON documents.
pub const LINE_DELIMITER: &[u8] = b"\n";

/// Upper bound on an unterminated frame before the stream is failed.
const MAX_FRAME_BYTES: usize = 1_000_000;

/// A stream adapter yielding delimiter-terminated UTF-8 frames from a
/// byte stream. A trailing unterminated frame is yielded at end of input.
pub struct FrameStream<S> {
    inner: S,
    finder: memmem::Finder<'static>,
    delimiter_len: usize,
    buffer: Vec<u8>,
    done: bool,
}

impl<S> FrameStream<S> {
    pub fn new(stream: S, delimiter: &'static [u8]) -> Self {
        Self {
            inner: stream,
            finder: memmem::Finder::new(delimiter),
            delimiter_len: delimiter.len(),
            buffer: Vec::new(),
            done: false,
        }
    }

    /// Pop the next complete frame off the buffer, if there is one.
    fn next_frame(&mut self) -> Option<Result<String, Error>> {
        let end = self.finder.find(&self.buffer)?;
        let frame: Vec<u8> = self.buffer.drain(..end + self.delimiter_len).collect();
        Some(decode(&frame[..end]))
    }
}

fn decode(bytes: &[u8]) -> Result<String, Error> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| Error::streaming(format!("Invalid UTF-8 in frame: {e}")))
}

impl<S, E> Stream for FrameStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Into<Error>,
{
    type Item = Result<String, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(frame) = self.next_frame() {
                return Poll::Ready(Some(frame));
            }
            if self.done {
                return Poll::Ready(None);
            }

            match ready!(self.inner.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => {
                    self.buffer
                        .extend(chunk.iter().copied().filter(|&b| b != b'\r'));
                    if self.buffer.len() > MAX_FRAME_BYTES
                        && self.finder.find(&self.buffer).is_none()
                    {
                        self.buffer.clear();
                        self.done = true;
                        return Poll::Ready(Some(Err(Error::streaming(
                            "frame exceeded maximum size",
                        ))));
                    }
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Poll::Ready(Some(Err(e.into())));
                }
                None => {
                    self.done = true;
                    let rest = std::mem::take(&mut self.buffer);
                    if rest.iter().all(u8::is_ascii_whitespace) {
                        return Poll::Ready(None);
                    }
                    return Poll::Ready(Some(decode(&rest)));
                }
            }
        }
    }
}

/// Extension trait to add framing to byte streams.
pub trait FrameStreamExt: Stream + Sized {
    /// Split this byte stream into SSE event blocks.
    fn sse_frames(self) -> FrameStream<Self> {
        FrameStream::new(self, SSE_DELIMITER)
    }

    /// Split this byte stream into newline-delimited JSON documents.
    fn json_lines(self) -> FrameStream<Self> {
        FrameStream::new(self, LINE_DELIMITER)
    }
}

impl<S: Stream> FrameStreamExt for S {}

/// A parsed Server-Sent Event. Only the fields the hosted service sends.
#[derive(Debug, Clone, PartialEq)]
pub struct SseEvent {
    pub event_type: Option<String>,
    pub data: String,
}

impl SseEvent {
    /// The OpenAI end-of-stream marker.
    pub fn is_done(&self) -> bool {
        self.data.trim() == "[DONE]"
    }
}

/// Parse one SSE event block. Blocks without `data` (comments, keep-alives)
/// yield `None`.
pub fn parse_sse_event(block: &str) -> Option<SseEvent> {
    let mut event_type = None;
    let mut data_lines = Vec::new();

    for line in block.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        let value = value.strip_prefix(' ').unwrap_or(value);
        match field {
            "event" => event_type = Some(value.to_string()),
            "data" => data_lines.push(value),
            _ => {}
        }
    }

    if data_lines.is_empty() {
        return None;
    }

    Some(SseEvent {
        event_type,
        data: data_lines.join("\n"),
    })
}
