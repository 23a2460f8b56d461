use axum::{
    Json, Router,
    body::Bytes,
    extract::{FromRequestParts, State},
    http::{HeaderMap, Method, header::AUTHORIZATION, request::Parts},
    routing::{get, post},
};
use futures::future::join_all;
use serde::de::DeserializeOwned;
use tailcode_shared::webhook::{
    DeviceStatus, NotifyRequest, OkResponse, StatusResponse, WakeRequest, WakeResponse,
};
use tracing::info;

use super::response::{WebhookError, WebhookResult};
use super::state::AppState;
use crate::notify::{DEFAULT_TITLE, notify};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/wake", post(wake))
        .route("/status", post(status))
        .route("/notify", post(send_notification))
        .fallback(not_found)
        .with_state(state)
}

fn is_authorized(token: Option<&str>, headers: &HeaderMap) -> bool {
    let Some(expected) = token else {
        return true;
    };
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    header.strip_prefix("Bearer ").unwrap_or(header) == expected
}

/// Passes when no token is configured or the bearer token matches.
pub struct Authorized;

impl FromRequestParts<AppState> for Authorized {
    type Rejection = WebhookError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if is_authorized(state.token.as_deref(), &parts.headers) {
            Ok(Authorized)
        } else {
            Err(WebhookError::Unauthorized)
        }
    }
}

/// An empty body reads as `{}`.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, WebhookError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|_| WebhookError::bad_request("invalid json"))
}

async fn health() -> Json<OkResponse> {
    Json(OkResponse { ok: true })
}

/// Unknown paths. POSTs are checked for the token first, like every
/// other POST route.
async fn not_found(State(state): State<AppState>, method: Method, headers: HeaderMap) -> WebhookError {
    if method == Method::POST && !is_authorized(state.token.as_deref(), &headers) {
        return WebhookError::Unauthorized;
    }
    WebhookError::not_found("not found")
}

async fn wake(
    _auth: Authorized,
    State(state): State<AppState>,
    body: Bytes,
) -> WebhookResult<WakeResponse> {
    let request: WakeRequest = parse_body(&body)?;
    let name = request
        .device
        .filter(|d| !d.is_empty())
        .ok_or_else(|| WebhookError::bad_request("device required"))?;
    let device = state
        .config
        .device(&name)
        .ok_or_else(|| WebhookError::not_found(&format!("unknown device: {name}")))?;

    let result = state.waker().wake(device).await;
    info!(
        "Webhook wake {}: ok={} method={:?}",
        name,
        result.success,
        result.method_tag()
    );
    if result.success {
        notify(state.notifier.as_ref(), &format!("Waking {name}"), None).await;
    }
    Ok(Json(result.to_response()))
}

async fn status(_auth: Authorized, State(state): State<AppState>) -> WebhookResult<StatusResponse> {
    let checks = state
        .config
        .devices
        .iter()
        .map(|d| state.liveness.is_online(&d.hostname));
    let online = join_all(checks).await;

    let devices = state
        .config
        .devices
        .iter()
        .zip(online)
        .map(|(d, online)| DeviceStatus {
            name: d.name.clone(),
            hostname: d.hostname.clone(),
            online,
            role: d.role,
        })
        .collect();
    Ok(Json(StatusResponse { devices }))
}

async fn send_notification(
    _auth: Authorized,
    State(state): State<AppState>,
    body: Bytes,
) -> WebhookResult<OkResponse> {
    let request: NotifyRequest = parse_body(&body)?;
    let message = request
        .message
        .filter(|m| !m.is_empty())
        .ok_or_else(|| WebhookError::bad_request("message required"))?;
    let title = request.title.unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let ok = notify(state.notifier.as_ref(), &message, Some(&title)).await;
    Ok(Json(OkResponse { ok }))
}
