//! Hosted backend: the OpenAI Responses API.
//!
//! Blocking calls read the aggregated output text. Streaming calls consume
//! the SSE event stream and keep only `response.output_text.delta` events.

use futures::{future, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::framing::{parse_sse_event, FrameStreamExt};
use super::{error_for_status, Backend, FragmentStream};
use crate::config::{HostedConfig, OPENAI_API_KEY_VAR};
use crate::error::Error;

/// OpenAI Responses API client.
pub struct HostedBackend {
    client: Client,
    config: HostedConfig,
}

impl HostedBackend {
    pub fn new(config: HostedConfig) -> Result<Self, Error> {
        let client = Client::builder().build()?;
        Ok(Self { client, config })
    }

    fn api_key(&self) -> Result<&str, Error> {
        self.config.api_key.as_deref().ok_or_else(|| {
            Error::MissingCredential(format!(
                "{OPENAI_API_KEY_VAR} is not set. Put it in a .env file or export it in your shell."
            ))
        })
    }

    async fn send(&self, request: &ResponsesRequest<'_>) -> Result<reqwest::Response, Error> {
        let api_key = self.api_key()?;

        debug!(
            model = request.model,
            stream = request.stream,
            "Sending hosted request"
        );

        let response = self
            .client
            .post(format!("{}/responses", self.config.base_url))
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await?;

        error_for_status(response).await
    }
}

#[async_trait::async_trait]
impl Backend for HostedBackend {
    async fn generate(&self, prompt: &str) -> Result<String, Error> {
        let request = ResponsesRequest {
            model: &self.config.model,
            input: prompt,
            stream: false,
        };
        let response: ResponsesResponse = self.send(&request).await?.json().await?;
        Ok(response.output_text())
    }

    async fn generate_stream(&self, prompt: &str) -> Result<FragmentStream, Error> {
        let request = ResponsesRequest {
            model: &self.config.stream_model,
            input: prompt,
            stream: true,
        };
        let response = self.send(&request).await?;

        let fragments = Box::pin(response.bytes_stream())
            .sse_frames()
            .filter_map(|frame| future::ready(fragment_from_frame(frame)));

        Ok(Box::pin(fragments))
    }
}

// ─── Wire types ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

/// Non-streaming response body. Only the fields needed to recover text.
#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ResponsesResponse {
    /// The convenience `output_text` when the service provides it, otherwise
    /// every `output_text` content part joined in order.
    fn output_text(self) -> String {
        if let Some(text) = self.output_text {
            return text;
        }
        self.output
            .into_iter()
            .flat_map(|item| item.content)
            .filter(|part| part.kind == "output_text")
            .filter_map(|part| part.text)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct ResponsesStreamEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    delta: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    response: Option<serde_json::Value>,
}

impl ResponsesStreamEvent {
    fn into_fragment(self) -> Result<Option<String>, Error> {
        match self.kind.as_str() {
            "response.output_text.delta" => Ok(self.delta.filter(|d| !d.is_empty())),
            "error" => Err(Error::streaming(
                self.message.unwrap_or_else(|| "unknown error".to_string()),
            )),
            "response.failed" => {
                let message = self
                    .response
                    .as_ref()
                    .and_then(|r| r.pointer("/error/message"))
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("response failed");
                Err(Error::streaming(message))
            }
            _ => Ok(None),
        }
    }
}

/// Turn one SSE frame into a fragment, an error, or nothing.
fn fragment_from_frame(frame: Result<String, Error>) -> Option<Result<String, Error>> {
    let frame = match frame {
        Ok(frame) => frame,
        Err(e) => return Some(Err(e)),
    };
    let event = parse_sse_event(&frame)?;
    if event.is_done() {
        return None;
    }
    match serde_json::from_str::<ResponsesStreamEvent>(&event.data) {
        Ok(event) => event.into_fragment().transpose(),
        Err(e) => {
            debug!("Skipping unparseable hosted stream event: {e}");
            None
        }
    }
}
