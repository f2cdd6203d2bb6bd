//! SSE (Server-Sent Events) framing for streamed generations.
//!
//! Converts a stream of text fragments into `data:` lines. Each fragment
//! becomes one event: every line of the fragment gets its own `data:` line
//! and a blank line closes the event. No event names, ids or end sentinel.

use bytes::Bytes;
use futures::stream::Stream;
use tokio_stream::StreamExt;

/// Format one fragment as an SSE event. Empty fragments produce nothing.
pub fn format_fragment(fragment: &str) -> String {
    if fragment.is_empty() {
        return String::new();
    }

    let mut event = String::with_capacity(fragment.len() + 8);
    for line in fragment.split('\n') {
        event.push_str("data: ");
        event.push_str(line);
        event.push('\n');
    }
    event.push('\n');
    event
}

/// Convert a fragment stream into SSE body chunks, one chunk per fragment,
/// in input order. Errors pass through untouched.
pub fn fragments_to_sse<S, E>(fragments: S) -> impl Stream<Item = Result<Bytes, E>>
where
    S: Stream<Item = Result<String, E>>,
{
    fragments.filter_map(|fragment| match fragment {
        Ok(text) if text.is_empty() => None,
        Ok(text) => Some(Ok(Bytes::from(format_fragment(&text)))),
        Err(e) => Some(Err(e)),
    })
}
