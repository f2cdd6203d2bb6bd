//! llm-relay: relay a prompt to a hosted or local LLM backend.
//!
//! The provider is picked per request from configuration. Answers come back
//! either whole, as plain text, or streamed as Server-Sent Events built from
//! the backend's incremental output. Both backends stream in different wire
//! formats; the HTTP surface sees one.

pub mod backend;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod server;

pub use config::{Config, Provider};
pub use dispatch::{Backends, Dispatcher, Generation, Mode};
pub use error::Error;
