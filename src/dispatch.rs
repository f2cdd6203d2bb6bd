//! Request dispatcher: picks a backend from configuration and classifies
//! whatever goes wrong.

use std::sync::Arc;

use futures::TryStreamExt;
use tracing::{info, warn};

use crate::backend::{Backend, FragmentStream, HostedBackend, LocalBackend};
use crate::config::{Config, Provider};
use crate::error::Error;

/// How the caller wants the answer delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The whole text in one piece.
    Once,
    /// Fragments as the backend produces them.
    Stream,
}

/// The result of a dispatch, shaped by its [`Mode`].
pub enum Generation {
    Text(String),
    Stream(FragmentStream),
}

/// One adapter per provider.
#[derive(Clone)]
pub struct Backends {
    pub local: Arc<dyn Backend>,
    pub hosted: Arc<dyn Backend>,
}

impl Backends {
    /// Build the real adapters. No network traffic happens here.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        Ok(Self {
            local: Arc::new(LocalBackend::new(config.local.clone())?),
            hosted: Arc::new(HostedBackend::new(config.hosted.clone())?),
        })
    }

    pub fn get(&self, provider: Provider) -> &Arc<dyn Backend> {
        match provider {
            Provider::Local => &self.local,
            Provider::Hosted => &self.hosted,
        }
    }
}

/// Routes the configured prompt to the configured provider.
pub struct Dispatcher {
    config: Arc<Config>,
    backends: Backends,
}

impl Dispatcher {
    pub fn new(config: Arc<Config>, backends: Backends) -> Self {
        Self { config, backends }
    }

    pub fn from_config(config: Arc<Config>) -> Result<Self, Error> {
        let backends = Backends::from_config(&config)?;
        Ok(Self::new(config, backends))
    }

    /// Resolve the provider and run the prompt through it in `mode`.
    ///
    /// An unknown selector fails before any backend is touched. Adapter
    /// failures, including ones surfacing later from a returned stream,
    /// are tagged with the provider name.
    pub async fn dispatch(&self, mode: Mode) -> Result<Generation, Error> {
        match mode {
            Mode::Once => self.generate().await.map(Generation::Text),
            Mode::Stream => self.generate_stream().await.map(Generation::Stream),
        }
    }

    /// Generate the full text with the configured provider.
    pub async fn generate(&self) -> Result<String, Error> {
        let (provider, backend) = self.resolve(Mode::Once)?;
        backend
            .generate(&self.config.prompt)
            .await
            .map_err(|e| failed(provider, e))
    }

    /// Start streaming fragments from the configured provider.
    pub async fn generate_stream(&self) -> Result<FragmentStream, Error> {
        let (provider, backend) = self.resolve(Mode::Stream)?;
        let stream = backend
            .generate_stream(&self.config.prompt)
            .await
            .map_err(|e| failed(provider, e))?;
        Ok(Box::pin(stream.map_err(move |e| failed(provider, e))))
    }

    fn resolve(&self, mode: Mode) -> Result<(Provider, &Arc<dyn Backend>), Error> {
        let provider = self
            .config
            .provider()
            .inspect_err(|e| warn!(error = %e, "Rejecting request"))?;
        info!(%provider, ?mode, "Dispatching prompt");
        Ok((provider, self.backends.get(provider)))
    }
}

fn failed(provider: Provider, error: Error) -> Error {
    let error = error.tagged(provider);
    warn!(%provider, %error, "Backend call failed");
    error
}
