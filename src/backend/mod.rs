//! LLM backend adapters.
//!
//! - [`hosted`]: OpenAI Responses API
//! - [`local`]: Ollama chat API
//! - [`framing`]: byte-stream framing shared by both
//!
//! Both adapters implement [`Backend`], so the dispatcher can pick one at
//! request time without knowing its wire format.

pub mod framing;
pub mod hosted;
pub mod local;

use std::pin::Pin;

use futures::Stream;
use reqwest::StatusCode;

use crate::error::Error;

pub use hosted::HostedBackend;
pub use local::LocalBackend;

/// Lazily produced text fragments. Finite and not restartable; dropping it
/// stops pulling from the backend.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, Error>> + Send>>;

/// A text generation service.
#[async_trait::async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Generate the full answer to `prompt` in one call.
    async fn generate(&self, prompt: &str) -> Result<String, Error>;

    /// Start generating an answer to `prompt`, yielding non-empty fragments
    /// in the order the backend produces them.
    ///
    /// Failures that happen before the first fragment (missing credential,
    /// connection refused, non-success status) are returned here rather
    /// than through the stream.
    async fn generate_stream(&self, prompt: &str) -> Result<FragmentStream, Error>;
}

/// Turn a non-success response into [`Error::Api`], keeping the service's
/// own message when its body carries one.
pub(crate) async fn error_for_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = match response.text().await {
        Ok(body) => error_message(status, &body),
        Err(e) => format!("{status} (failed to read error body: {e})"),
    };
    Err(Error::api(status.as_u16(), message))
}

/// Pull a human-readable message out of an error body. Handles both
/// `{"error": {"message": ...}}` (OpenAI) and `{"error": "..."}` (Ollama).
/// An empty body falls back to the status reason phrase.
fn error_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("no error message")
            .to_string();
    }
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.to_string();
    };
    let error = &value["error"];
    error["message"]
        .as_str()
        .or_else(|| error.as_str())
        .map(str::to_owned)
        .unwrap_or_else(|| body.to_string())
}
