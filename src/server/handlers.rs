use super::error::ApiError;
use super::state::AppState;
use crate::core::capabilities::ApiSet;
use crate::macros::Interpreter;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

/// Reject with `Inactive: <name>` unless `flag` is enabled.
pub fn require(state: &AppState, flag: ApiSet) -> Result<(), ApiError> {
    if state.apis().active(flag) {
        return Ok(());
    }
    tracing::warn!(api = flag.name(), "call to inactive api");
    Err(ApiError::Inactive(flag.name()))
}

/// Run a blocking driver call off the async workers.
pub async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("worker failed: {}", e)))?
        .map_err(ApiError::Internal)
}

/// Read a body of at most `limit` bytes.
pub async fn read_limited(
    headers: &HeaderMap,
    body: Body,
    limit: usize,
) -> Result<Vec<u8>, ApiError> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|n| n > limit) {
        return Err(ApiError::TooLarge);
    }
    let bytes = axum::body::to_bytes(body, limit).await.map_err(|e| {
        tracing::warn!(limit, error = %e, "request body rejected");
        ApiError::TooLarge
    })?;
    Ok(bytes.to_vec())
}

async fn read_text(state: &AppState, headers: &HeaderMap, body: Body) -> Result<String, ApiError> {
    let bytes = read_limited(headers, body, state.limits.text).await?;
    let text = String::from_utf8(bytes)
        .map_err(|_| ApiError::BadRequest("text must be UTF-8".to_string()))?;
    Ok(clean_text(&text))
}

/// Drop control characters.
pub fn clean_text(text: &str) -> String {
    text.chars().filter(|c| !c.is_control()).collect()
}

/// POST /keyboard/type
pub async fn type_text(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Body,
) -> Result<StatusCode, ApiError> {
    require(&state, ApiSet::TYPE_TEXT)?;
    let text = read_text(&state, &headers, body).await?;
    tracing::info!(chars = text.chars().count(), "type text");
    let driver = state.driver.clone();
    blocking(move || driver.type_string(&text)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Only `arg` keys are allowed and each must carry a modifier name.
pub fn tap_modifiers(query: &[(String, String)]) -> Result<Vec<String>, ApiError> {
    let mut mods = Vec::with_capacity(query.len());
    for (key, value) in query {
        if key != "arg" {
            return Err(ApiError::BadRequest(format!("unknown query parameter {}", key)));
        }
        if value.is_empty() {
            return Err(ApiError::BadRequest("empty arg".to_string()));
        }
        mods.push(value.clone());
    }
    Ok(mods)
}

/// POST /keyboard/tap/:key
pub async fn tap_key(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<StatusCode, ApiError> {
    require(&state, ApiSet::KEY_TAP)?;
    let mods = tap_modifiers(&query)?;
    tracing::info!(key = %key, ?mods, "tap key");
    let driver = state.driver.clone();
    blocking(move || driver.key_tap(&key, &mods)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /clip
pub async fn clip_write(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Body,
) -> Result<StatusCode, ApiError> {
    require(&state, ApiSet::CLIPBOARD_WRITE)?;
    let text = read_text(&state, &headers, body).await?;
    tracing::info!(chars = text.chars().count(), "write clipboard");
    let clipboard = state.clipboard.clone();
    blocking(move || clipboard.write(&text)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /clip
pub async fn clip_read(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    require(&state, ApiSet::CLIPBOARD_READ)?;
    let clipboard = state.clipboard.clone();
    let text = blocking(move || clipboard.read()).await?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text))
}

/// GET /macros
pub async fn list_macros(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, ApiError> {
    require(&state, ApiSet::RUN_MACRO)?;
    let macros = state.macros();
    Ok(Json(macros.names().into_iter().map(String::from).collect()))
}

/// POST /macros/:name
///
/// Responds after the macro finished. The run is not cancelled if the client goes away.
pub async fn run_macro(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    require(&state, ApiSet::RUN_MACRO)?;
    let macros = state.macros();
    let Some(found) = macros.get(&name) else {
        return Err(ApiError::NotFound);
    };
    let steps = found.steps.clone();
    let driver = state.driver.clone();
    let pause = state.macro_pause;
    tracing::info!(name = %name, "run macro");
    let summary = tokio::task::spawn_blocking(move || {
        Interpreter::new(driver.as_ref(), pause).run(&steps)
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("macro worker failed: {}", e)))?;
    tracing::info!(
        name = %name,
        executed = summary.executed,
        skipped = summary.skipped,
        "macro finished"
    );
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct ApisResponse {
    pub active: Vec<&'static str>,
}

/// GET /apis
pub async fn list_apis(State(state): State<Arc<AppState>>) -> Json<ApisResponse> {
    Json(ApisResponse {
        active: state.apis().names(),
    })
}

/// POST /release
pub async fn release(State(state): State<Arc<AppState>>) -> StatusCode {
    state.lock.release();
    StatusCode::NO_CONTENT
}
