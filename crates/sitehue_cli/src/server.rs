//! HTTP API: color extraction plus the shared theme state.
//!
//! Every request runs inside an `http.request` span carrying a fresh request
//! id, which is echoed back in the `x-request-id` header.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sitehue_core::{PaletteKey, ThemeStore};
use sitehue_extract::{ExtractError, WebsiteDataAssembler};
use sitehue_observability::{http_request_span, record_duration, record_error};
use tracing::Instrument;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    assembler: Arc<WebsiteDataAssembler>,
    theme: Arc<ThemeStore>,
}

impl AppState {
    /// Wires a logging subscriber onto `theme`.
    pub fn new(assembler: WebsiteDataAssembler, theme: Arc<ThemeStore>) -> Self {
        theme.subscribe(|palette| {
            tracing::info!(
                primary = %palette.primary,
                secondary = %palette.secondary,
                accent = %palette.accent,
                text = %palette.text,
                "Theme updated"
            );
        });
        Self {
            assembler: Arc::new(assembler),
            theme,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/colors", post(extract_colors))
        .route("/api/theme", get(get_theme))
        .route("/api/theme/color", post(set_theme_color))
        .route("/api/theme/shuffle", post(shuffle_theme))
        .layer(middleware::from_fn(trace_request))
        .with_state(state)
}

async fn trace_request(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let span = http_request_span!(
        request.method().as_str(),
        request.uri().path(),
        request_id.as_str()
    );
    let started = Instant::now();

    async move {
        let mut response = next.run(request).await;
        let status = response.status().as_u16();
        tracing::Span::current().record("http.status_code", status);
        record_duration("duration_ms", started.elapsed());
        tracing::debug!(status, "Request handled");

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }
        response
    }
    .instrument(span)
    .await
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
}

fn error_response(status: StatusCode, error: &str, url: Option<&str>) -> Response {
    (status, Json(ErrorBody { error, url })).into_response()
}

#[derive(Deserialize, Default)]
struct ColorsRequest {
    #[serde(default)]
    url: Option<String>,
}

async fn extract_colors(State(state): State<AppState>, body: Bytes) -> Response {
    // A body that is not a JSON object with a string `url` counts as a missing url.
    let request: ColorsRequest = serde_json::from_slice(&body).unwrap_or_default();
    let url = request.url.unwrap_or_default();

    match state.assembler.extract(&url).await {
        Ok(data) => {
            state
                .theme
                .set_palette(data.colors.palette.clone(), Some(data.colors.favicon.as_slice()));
            Json(data).into_response()
        }
        Err(e) => {
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            if status.is_server_error() {
                record_error(&e);
            } else {
                tracing::warn!(url = %url, error = %e, "Extraction failed");
            }
            let url = match e {
                ExtractError::MissingUrl => None,
                _ => Some(url.as_str()),
            };
            error_response(status, e.user_message(), url)
        }
    }
}

async fn get_theme(State(state): State<AppState>) -> Response {
    Json(state.theme.palette()).into_response()
}

#[derive(Deserialize)]
struct ThemeColorRequest {
    key: String,
    color: String,
}

async fn set_theme_color(
    State(state): State<AppState>,
    body: Result<Json<ThemeColorRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, &rejection.body_text(), None);
        }
    };
    let key: PaletteKey = match request.key.parse() {
        Ok(key) => key,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string(), None),
    };
    let color = request.color.trim();
    if color.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "color is required", None);
    }

    Json(state.theme.set_color(key, color)).into_response()
}

async fn shuffle_theme(State(state): State<AppState>) -> Response {
    Json(state.theme.shuffle()).into_response()
}
