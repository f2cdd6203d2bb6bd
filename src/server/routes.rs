//! HTTP routes.
//!
//! - GET /     full generated text as `text/plain`
//! - GET /api  generated text streamed as `text/event-stream`
//!
//! Both routes relay the configured prompt to the configured provider and
//! share the same error contract: 400 for an unknown provider, 500 for
//! everything else, plain-text body.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures::TryStreamExt;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::dispatch::Dispatcher;
use crate::error::Error;
use crate::server::streaming::fragments_to_sse;

/// Application state shared across handlers.
pub struct AppState {
    pub dispatcher: Dispatcher,
}

/// Build the axum router with both routes, request tracing and `cors`.
pub fn build_router(state: Arc<AppState>, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(generate_text))
        .route("/api", get(generate_stream))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// CORS for browser front ends. An empty list allows any origin.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer, Error> {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        let origins = origins
            .iter()
            .map(|o| {
                HeaderValue::from_str(o)
                    .map_err(|_| Error::config(format!("invalid CORS origin {o:?}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE]))
}

// ─── Route Handlers ────────────────────────────────────────────────────────

async fn generate_text(State(state): State<Arc<AppState>>) -> Result<String, Error> {
    let request_id = Uuid::new_v4();
    let span = info_span!("generate", %request_id);

    async move {
        let text = state.dispatcher.generate().await?;
        info!(chars = text.len(), "Generation complete");
        Ok::<_, Error>(text)
    }
    .instrument(span)
    .await
}

async fn generate_stream(State(state): State<Arc<AppState>>) -> Result<Response, Error> {
    let request_id = Uuid::new_v4();
    let span = info_span!("generate_stream", %request_id);

    let fragments = state
        .dispatcher
        .generate_stream()
        .instrument(span)
        .await?;

    // Headers are already out once the body starts; a failure from here on
    // can only cut the response short.
    let fragments = fragments.inspect_err(move |e| {
        error!(%request_id, error = %e, "Stream aborted");
    });

    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(fragments_to_sse(fragments)),
    )
        .into_response())
}

// ─── Error Mapping ─────────────────────────────────────────────────────────

impl Error {
    pub fn status_code(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
