//! Local backend: an Ollama daemon's `/api/chat` endpoint.
//!
//! Streaming replies are newline-delimited JSON, one chunk per line.

use futures::{future, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::framing::FrameStreamExt;
use super::{error_for_status, Backend, FragmentStream};
use crate::config::LocalConfig;
use crate::error::Error;

/// Ollama chat client.
pub struct LocalBackend {
    client: Client,
    config: LocalConfig,
}

impl LocalBackend {
    pub fn new(config: LocalConfig) -> Result<Self, Error> {
        let client = Client::builder().build()?;
        Ok(Self { client, config })
    }

    async fn send(&self, prompt: &str, stream: bool) -> Result<reqwest::Response, Error> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream,
        };

        debug!(model = request.model, stream, "Sending local request");

        let response = self
            .client
            .post(format!("{}/api/chat", self.config.host))
            .json(&request)
            .send()
            .await?;

        error_for_status(response).await
    }
}

#[async_trait::async_trait]
impl Backend for LocalBackend {
    async fn generate(&self, prompt: &str) -> Result<String, Error> {
        let reply: Value = self.send(prompt, false).await?.json().await?;
        Ok(reply_content(reply))
    }

    async fn generate_stream(&self, prompt: &str) -> Result<FragmentStream, Error> {
        let response = self.send(prompt, true).await?;

        let fragments = Box::pin(response.bytes_stream())
            .json_lines()
            .filter_map(|line| future::ready(fragment_from_line(line)));

        Ok(Box::pin(fragments))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// One line of a streaming reply.
#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    message: Option<ChunkMessage>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
}

/// `message.content` of a blocking reply. Replies of an unexpected shape
/// degrade to their JSON text instead of failing.
fn reply_content(reply: Value) -> String {
    match reply.pointer("/message/content") {
        Some(Value::String(content)) => content.clone(),
        _ => reply.to_string(),
    }
}

fn fragment_from_line(line: Result<String, Error>) -> Option<Result<String, Error>> {
    let line = match line {
        Ok(line) => line,
        Err(e) => return Some(Err(e)),
    };
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<ChatChunk>(line) {
        Ok(ChatChunk { error: Some(e), .. }) => Some(Err(Error::streaming(e))),
        Ok(ChatChunk {
            message: Some(message),
            ..
        }) if !message.content.is_empty() => Some(Ok(message.content)),
        Ok(_) => None,
        Err(e) => {
            debug!("Skipping unparseable local stream line: {e}");
            None
        }
    }
}
