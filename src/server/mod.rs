//! HTTP transport for the query service.
//!
//! # Endpoints
//!
//! - `GET|POST /graphserver?command=<name>`: run a query command; the
//!   optional JSON body carries `{nodeIds, expr, limit}`. A form-encoded
//!   POST may carry `command` in its body instead.
//! - `GET /graph3d`: the 3D projection
//!
//! CORS is permissive; the front-end is usually served from another origin.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{Form, FromRequest, Query, State},
    http::{header, HeaderMap, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info, warn};

use crate::query::{QueryError, QueryParams, QueryService};

#[derive(Debug, Deserialize)]
struct CommandQuery {
    command: Option<String>,
}

/// Build the router over a shared query service.
pub fn router(service: Arc<QueryService>) -> Router {
    Router::new()
        .route("/graphserver", get(handle_command).post(handle_command))
        .route("/graph3d", get(handle_graph3d))
        .layer(CorsLayer::permissive())
        .with_state(service)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: &str, service: Arc<QueryService>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "graph server listening");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("graph server shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

async fn handle_command(
    State(service): State<Arc<QueryService>>,
    Query(query): Query<CommandQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let command = match query.command {
        Some(command) => Some(command),
        None => form_command(&headers, &body).await,
    };
    let Some(command) = command else {
        debug!("request without command");
        return StatusCode::OK.into_response();
    };

    let params = QueryParams::from_body(&body);
    debug!(command = %command, "received command");

    match service.dispatch(&command, &params) {
        Ok(response) => json_response(&response),
        Err(QueryError::UnknownCommand(_)) => StatusCode::BAD_REQUEST.into_response(),
    }
}

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// `command` from a form-encoded body, if the request carries one.
async fn form_command(headers: &HeaderMap, body: &Bytes) -> Option<String> {
    let is_form = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with(FORM_CONTENT_TYPE));
    if !is_form {
        return None;
    }

    let request = Request::builder()
        .method(Method::POST)
        .header(header::CONTENT_TYPE, FORM_CONTENT_TYPE)
        .body(Body::from(body.clone()))
        .ok()?;
    match Form::<CommandQuery>::from_request(request, &()).await {
        Ok(Form(form)) => form.command,
        Err(e) => {
            debug!(error = %e, "malformed form body");
            None
        }
    }
}

async fn handle_graph3d(State(service): State<Arc<QueryService>>) -> Response {
    json_response(service.projection())
}

/// Serialize fully before answering; a failure sends a bare 500.
fn json_response<T: Serialize + ?Sized>(value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            error!(error = %e, "failed to serialize response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
