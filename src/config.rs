//! Runtime configuration for llm-relay.
//!
//! Settings come from the process environment, optionally layered over a
//! dotenv file. Everything is resolved once at startup into an immutable
//! [`Config`] that the dispatcher shares across requests.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::Parser;

use crate::error::Error;

pub const PROVIDER_VAR: &str = "LLM_PROVIDER";
pub const PROMPT_VAR: &str = "RELAY_PROMPT";
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const OPENAI_MODEL_VAR: &str = "OPENAI_MODEL";
pub const OPENAI_STREAM_MODEL_VAR: &str = "OPENAI_STREAM_MODEL";
pub const OPENAI_BASE_URL_VAR: &str = "OPENAI_BASE_URL";
pub const OLLAMA_MODEL_VAR: &str = "OLLAMA_MODEL";
pub const OLLAMA_HOST_VAR: &str = "OLLAMA_HOST";

pub const DEFAULT_PROMPT: &str = "Come up with a new business idea for AI Agents";

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "llm-relay", about = "Relay a prompt to a hosted or local LLM backend")]
pub struct Cli {
    /// HTTP listen address.
    #[arg(long, default_value = "0.0.0.0:8000")]
    pub listen: String,

    /// Dotenv file read before the process environment (missing is fine).
    #[arg(long, default_value = ".env")]
    pub env_file: PathBuf,

    /// Origin allowed by CORS. Repeat for several; none allows any origin.
    #[arg(long = "allow-origin")]
    pub allow_origins: Vec<String>,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub log_json: bool,
}

/// The two backends a request can be relayed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    /// Locally-running Ollama daemon.
    Local,
    /// Hosted OpenAI API.
    Hosted,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Local => "local",
            Provider::Hosted => "hosted",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "ollama" => Ok(Provider::Local),
            "hosted" | "openai" => Ok(Provider::Hosted),
            _ => Err(Error::UnknownProvider(s.to_string())),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Raw provider selector. Parsed per request so a bad value is reported
    /// to the caller instead of preventing startup.
    pub provider: String,

    /// Prompt sent to whichever backend is selected.
    pub prompt: String,

    /// Hosted backend settings.
    pub hosted: HostedConfig,

    /// Local backend settings.
    pub local: LocalConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Provider::Local.to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
            hosted: HostedConfig::default(),
            local: LocalConfig::default(),
        }
    }
}

/// Hosted (OpenAI) backend settings.
#[derive(Clone)]
pub struct HostedConfig {
    /// API key. Absence is valid until a hosted call is attempted.
    pub api_key: Option<String>,

    /// Model for blocking calls.
    pub model: String,

    /// Model for streaming calls.
    pub stream_model: String,

    /// API base URL, without a trailing slash.
    pub base_url: String,
}

impl Default for HostedConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-5.1".to_string(),
            stream_model: "gpt-4.1-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }
}

// Hand-written so the key never reaches a log line.
impl fmt::Debug for HostedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostedConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("stream_model", &self.stream_model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Local (Ollama) backend settings.
#[derive(Debug, Clone)]
pub struct LocalConfig {
    /// Model name as known to the daemon.
    pub model: String,

    /// Daemon URL, without a trailing slash.
    pub host: String,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            model: "llama3.2:3b-instruct-q4_K_M".to_string(),
            host: "http://127.0.0.1:11434".to_string(),
        }
    }
}

impl Config {
    /// Build a configuration from an arbitrary variable lookup.
    ///
    /// Blank values count as unset and fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Config::default();

        Self {
            provider: get(PROVIDER_VAR).unwrap_or(defaults.provider),
            prompt: get(PROMPT_VAR).unwrap_or(defaults.prompt),
            hosted: HostedConfig {
                api_key: get(OPENAI_API_KEY_VAR),
                model: get(OPENAI_MODEL_VAR).unwrap_or(defaults.hosted.model),
                stream_model: get(OPENAI_STREAM_MODEL_VAR)
                    .unwrap_or(defaults.hosted.stream_model),
                base_url: get(OPENAI_BASE_URL_VAR)
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or(defaults.hosted.base_url),
            },
            local: LocalConfig {
                model: get(OLLAMA_MODEL_VAR).unwrap_or(defaults.local.model),
                host: get(OLLAMA_HOST_VAR)
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or(defaults.local.host),
            },
        }
    }

    /// Load configuration from the process environment layered over a
    /// dotenv file. Process variables win; a missing file is not an error.
    pub fn from_env(env_file: &Path) -> Result<Self, Error> {
        Self::from_env_with(env_file, |key| std::env::var(key).ok())
    }

    /// [`Config::from_env`] with the process environment supplied by `env`.
    /// A blank variable falls through to the file value.
    pub fn from_env_with<F>(env_file: &Path, env: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file_vars = read_env_file(env_file)?;
        Ok(Self::from_lookup(|key| {
            env(key)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| file_vars.get(key).cloned())
        }))
    }

    /// Parse the provider selector.
    pub fn provider(&self) -> Result<Provider, Error> {
        self.provider.parse()
    }
}

/// Read a dotenv file without touching the process environment.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>, Error> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => {
            tracing::debug!("No env file at {:?}, using process environment only", path);
            return Ok(HashMap::new());
        }
        Err(e) => return Err(Error::config(format!("{}: {e}", path.display()))),
    };

    let mut vars = HashMap::new();
    for item in iter {
        let (key, value) = item.map_err(|e| Error::config(format!("{}: {e}", path.display())))?;
        vars.insert(key, value);
    }
    Ok(vars)
}
