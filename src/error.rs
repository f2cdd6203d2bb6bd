//! Error taxonomy shared by the configuration, backend and HTTP layers.

use thiserror::Error;

use crate::config::Provider;

/// Errors that can occur while relaying a prompt.
#[derive(Error, Debug)]
pub enum Error {
    /// The configured provider selector is not one we know how to serve.
    #[error("unknown provider '{0}': expected 'local' or 'hosted'")]
    UnknownProvider(String),

    /// The selected backend needs a credential that is not configured.
    #[error("{0}")]
    MissingCredential(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// A backend failure, tagged with the provider that produced it.
    #[error("{provider} backend error: {message}")]
    Backend { provider: Provider, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Streaming error: {0}")]
    Streaming(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl Error {
    pub fn backend(provider: Provider, message: impl Into<String>) -> Self {
        Error::Backend {
            provider,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub fn streaming(message: impl Into<String>) -> Self {
        Error::Streaming(message.into())
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Error::Api {
            status,
            message: message.into(),
        }
    }

    /// Whether the caller, rather than this server, caused the failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::UnknownProvider(_))
    }

    /// Attach a provider tag to adapter-internal failures.
    ///
    /// Classification errors (unknown provider, missing credential, bad
    /// configuration) and already-tagged errors keep their original message.
    pub fn tagged(self, provider: Provider) -> Self {
        match self {
            Error::UnknownProvider(_)
            | Error::MissingCredential(_)
            | Error::Config(_)
            | Error::Backend { .. } => self,
            other => Error::backend(provider, other.to_string()),
        }
    }
}
