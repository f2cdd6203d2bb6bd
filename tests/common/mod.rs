//! Shared test fixtures: a deterministic backend that counts its calls.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::stream;
use llm_relay::backend::{Backend, FragmentStream};
use llm_relay::config::Config;
use llm_relay::{Backends, Dispatcher, Error};

/// Scripted backend. `Err` entries in `fragments` fail the stream at that
/// point; `failure` fails both calls up front.
pub struct StubBackend {
    pub text: String,
    pub fragments: Vec<Result<String, String>>,
    pub failure: Option<String>,
    calls: AtomicUsize,
}

impl StubBackend {
    pub fn new(text: &str, fragments: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            text: text.to_string(),
            fragments: fragments.iter().map(|f| Ok(f.to_string())).collect(),
            failure: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn with_fragments(fragments: Vec<Result<String, String>>) -> Arc<Self> {
        Arc::new(Self {
            text: String::new(),
            fragments,
            failure: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            text: String::new(),
            fragments: Vec::new(),
            failure: Some(message.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn call(&self) -> Result<(), Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(message) => Err(Error::api(503, message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl Backend for StubBackend {
    async fn generate(&self, _prompt: &str) -> Result<String, Error> {
        self.call()?;
        Ok(self.text.clone())
    }

    async fn generate_stream(&self, _prompt: &str) -> Result<FragmentStream, Error> {
        self.call()?;
        let items: Vec<Result<String, Error>> = self
            .fragments
            .iter()
            .cloned()
            .map(|f| f.map_err(Error::streaming))
            .collect();
        Ok(Box::pin(stream::iter(items)))
    }
}

pub fn config_for(provider: &str) -> Arc<Config> {
    Arc::new(Config {
        provider: provider.to_string(),
        ..Config::default()
    })
}

pub fn stub_dispatcher(
    provider: &str,
    local: &Arc<StubBackend>,
    hosted: &Arc<StubBackend>,
) -> Dispatcher {
    let backends = Backends {
        local: local.clone(),
        hosted: hosted.clone(),
    };
    Dispatcher::new(config_for(provider), backends)
}
