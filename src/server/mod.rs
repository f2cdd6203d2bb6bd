//! HTTP surface.
//!
//! - [`routes`]: router, handlers and error-to-response mapping
//! - [`streaming`]: SSE framing of fragment streams

pub mod routes;
pub mod streaming;
