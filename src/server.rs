//! HTTP surface of the reconciliation service.
//!
//! **Reconciliation (per vocabulary and language):**
//! - `GET|POST /{vocid}/{lang}/reconcile`: metadata, batch search or extend
//! - `GET  /{vocid}/{lang}/reconcile/suggest/entity`: autocomplete
//! - `GET  /{vocid}/{lang}/reconcile/propose_properties`: extension properties
//! - `GET  /{vocid}/{lang}/reconcile/preview`: HTML preview of one concept
//!
//! **Health:**
//! - `GET  /health`: server status
//!
//! Parameters are read from the query string and, for POST, from a
//! form-encoded body; body values win. JSON responses are wrapped for JSONP
//! when a `callback` parameter is given.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::dispatch::{Dispatcher, RequestParams, Scope, render_json};
use crate::error::{ErrorKind, ReconcileError, ReconcileResult};
use crate::vocab::VocabularySource;

/// Shared, immutable server state.
pub struct ServerState<V> {
    dispatcher: Dispatcher<V>,
    started: Instant,
}

impl<V> ServerState<V> {
    pub fn new(dispatcher: Dispatcher<V>) -> Self {
        Self {
            dispatcher,
            started: Instant::now(),
        }
    }
}

/// Owned request scope and parameters, moved onto the blocking pool.
struct RequestContext {
    vocid: String,
    lang: String,
    service_url: String,
    params: RequestParams,
}

impl RequestContext {
    fn new<V: VocabularySource>(
        state: &ServerState<V>,
        (vocid, lang): (String, String),
        headers: &HeaderMap,
        params: RequestParams,
    ) -> Self {
        let config = state.dispatcher.config();
        let service_url = config.public_url.clone().unwrap_or_else(|| {
            let host = headers
                .get(header::HOST)
                .and_then(|h| h.to_str().ok())
                .map(str::to_string)
                .unwrap_or_else(|| format!("localhost:{}", config.port));
            format!("http://{host}")
        });
        Self {
            vocid,
            lang,
            service_url,
            params,
        }
    }

    fn scope(&self) -> Scope<'_> {
        Scope {
            vocid: &self.vocid,
            lang: &self.lang,
            service_url: &self.service_url,
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    api_base_url: String,
    uptime_secs: u64,
}

#[derive(Serialize)]
struct ErrorBody {
    status: &'static str,
    message: String,
}

// ── Responses ─────────────────────────────────────────────────────────────

fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
}

fn reply<T: Serialize>(status: StatusCode, value: &T, callback: Option<&str>) -> Response {
    match render_json(value, callback) {
        Ok(body) => {
            (status, [(header::CONTENT_TYPE, body.content_type)], body.body).into_response()
        }
        Err(e) => {
            tracing::error!("failed to encode response: {e}");
            internal_error()
        }
    }
}

fn status_for(err: &ReconcileError) -> StatusCode {
    match err.kind() {
        ErrorKind::ClientRequest => StatusCode::BAD_REQUEST,
        ErrorKind::UpstreamUnavailable if err.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::UpstreamUnavailable | ErrorKind::UpstreamShape => StatusCode::BAD_GATEWAY,
        ErrorKind::Config => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure(err: &ReconcileError, callback: Option<&str>) -> Response {
    let status = status_for(err);
    if status.is_server_error() {
        tracing::warn!(retryable = err.is_retryable(), "request failed: {err}");
    } else {
        tracing::debug!("rejected request: {err}");
    }
    let body = ErrorBody {
        status: "error",
        message: err.to_string(),
    };
    reply(status, &body, callback)
}

fn panicked(err: tokio::task::JoinError) -> Response {
    tracing::error!("request worker failed: {err}");
    internal_error()
}

/// Run a dispatcher operation on the blocking pool and render its JSON result.
async fn json_reply<V, T, F>(state: Arc<ServerState<V>>, ctx: RequestContext, op: F) -> Response
where
    V: VocabularySource + 'static,
    T: Serialize + Send + 'static,
    F: FnOnce(&Dispatcher<V>, &RequestContext) -> ReconcileResult<T> + Send + 'static,
{
    let callback = match ctx.params.callback() {
        Ok(callback) => callback.map(str::to_string),
        Err(e) => return failure(&ReconcileError::from(e), None),
    };
    match tokio::task::spawn_blocking(move || op(&state.dispatcher, &ctx)).await {
        Ok(Ok(value)) => reply(StatusCode::OK, &value, callback.as_deref()),
        Ok(Err(e)) => failure(&e, callback.as_deref()),
        Err(e) => panicked(e),
    }
}

fn query_only(query: HashMap<String, String>) -> RequestParams {
    RequestParams::merged(query, HashMap::new())
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn health<V: VocabularySource + 'static>(
    State(state): State<Arc<ServerState<V>>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        api_base_url: state.dispatcher.config().api_base_url.clone(),
        uptime_secs: state.started.elapsed().as_secs(),
    })
}

async fn reconcile_get<V: VocabularySource + 'static>(
    State(state): State<Arc<ServerState<V>>>,
    Path(scope): Path<(String, String)>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let ctx = RequestContext::new(&state, scope, &headers, query_only(query));
    json_reply(state, ctx, |d, ctx| d.reconcile(&ctx.scope(), &ctx.params)).await
}

async fn reconcile_post<V: VocabularySource + 'static>(
    State(state): State<Arc<ServerState<V>>>,
    Path(scope): Path<(String, String)>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Response {
    // No form body (or a non-form content type) leaves the query string.
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::debug!("no form body: {rejection}");
            HashMap::new()
        }
    };
    let ctx = RequestContext::new(&state, scope, &headers, RequestParams::merged(query, form));
    json_reply(state, ctx, |d, ctx| d.reconcile(&ctx.scope(), &ctx.params)).await
}

async fn suggest_entity<V: VocabularySource + 'static>(
    State(state): State<Arc<ServerState<V>>>,
    Path(scope): Path<(String, String)>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let ctx = RequestContext::new(&state, scope, &headers, query_only(query));
    json_reply(state, ctx, |d, ctx| d.suggest(&ctx.scope(), &ctx.params)).await
}

async fn propose_properties<V: VocabularySource + 'static>(
    State(state): State<Arc<ServerState<V>>>,
    Path(scope): Path<(String, String)>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let ctx = RequestContext::new(&state, scope, &headers, query_only(query));
    json_reply(state, ctx, |d, ctx| Ok(d.propose_properties(&ctx.params)?)).await
}

async fn preview<V: VocabularySource + 'static>(
    State(state): State<Arc<ServerState<V>>>,
    Path(scope): Path<(String, String)>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let ctx = RequestContext::new(&state, scope, &headers, query_only(query));
    let result =
        tokio::task::spawn_blocking(move || state.dispatcher.preview(&ctx.scope(), &ctx.params))
            .await;
    match result {
        Ok(Ok(preview)) => (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            preview.to_html(),
        )
            .into_response(),
        Ok(Err(e)) => failure(&e, None),
        Err(e) => panicked(e),
    }
}

/// Build the service router.
pub fn router<V: VocabularySource + 'static>(state: Arc<ServerState<V>>) -> Router {
    Router::new()
        .route("/health", get(health::<V>))
        .route(
            "/{vocid}/{lang}/reconcile",
            get(reconcile_get::<V>).post(reconcile_post::<V>),
        )
        .route(
            "/{vocid}/{lang}/reconcile/suggest/entity",
            get(suggest_entity::<V>),
        )
        .route(
            "/{vocid}/{lang}/reconcile/propose_properties",
            get(propose_properties::<V>),
        )
        .route("/{vocid}/{lang}/reconcile/preview", get(preview::<V>))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
