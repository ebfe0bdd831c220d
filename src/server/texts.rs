//! Named JSON text sets stored under `texts/`.

use super::error::ApiError;
use super::handlers::{blocking, read_limited, require};
use super::state::AppState;
use crate::constants;
use crate::core::capabilities::ApiSet;
use crate::util::fs::{self as app_fs, LockGuard};
use anyhow::Context;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

pub fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= constants::MAX_TEXT_SET_NAME
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

fn set_path(dir: &FsPath, name: &str) -> Result<PathBuf, ApiError> {
    if !valid_name(name) {
        tracing::warn!(name, "rejecting text set name");
        return Err(ApiError::BadRequest("invalid text set name".to_string()));
    }
    Ok(dir.join(format!("{}.json", name)))
}

/// Names of all stored sets, sorted.
pub fn list_sets(dir: &FsPath) -> anyhow::Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let pattern = format!(
        "{}/*.json",
        glob::Pattern::escape(&dir.display().to_string())
    );
    let mut names = Vec::new();
    for entry in glob::glob(&pattern).context("glob text sets")? {
        let path = entry.context("read text set entry")?;
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            if valid_name(stem) {
                names.push(stem.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

/// Write a set atomically while holding the texts lock.
pub fn save_set(dir: &FsPath, lock: &FsPath, name: &str, data: &[u8]) -> anyhow::Result<()> {
    app_fs::ensure_dir(dir, constants::DATA_DIR_MODE)?;
    let _lock = LockGuard::acquire(lock)?;
    app_fs::write_atomic(&dir.join(format!("{}.json", name)), data)
}

/// GET /texts
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>, ApiError> {
    let dir = state.paths.texts.clone();
    Ok(Json(blocking(move || list_sets(&dir)).await?))
}

/// GET /texts/:set
pub async fn load(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let path = set_path(&state.paths.texts, &name)?;
    let content = match tokio::fs::read(&path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(ApiError::NotFound),
        Err(e) => {
            return Err(ApiError::Internal(
                anyhow::Error::new(e).context(format!("read {}", path.display())),
            ))
        }
    };
    Ok(([(header::CONTENT_TYPE, "application/json")], content))
}

/// POST /texts/:set
pub async fn save(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Body,
) -> Result<StatusCode, ApiError> {
    require(&state, ApiSet::SAVE_TEXTS)?;
    set_path(&state.paths.texts, &name)?;
    let data = read_limited(&headers, body, state.limits.texts).await?;
    if let Err(e) = serde_json::from_slice::<serde_json::Value>(&data) {
        return Err(ApiError::BadRequest(format!("invalid JSON: {}", e)));
    }
    let dir = state.paths.texts.clone();
    let lock = state.paths.texts_lock.clone();
    tracing::info!(name = %name, bytes = data.len(), "save text set");
    blocking(move || save_set(&dir, &lock, &name, &data)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_valid_names() {
        assert!(valid_name("shopping"));
        assert!(valid_name("v1.2_final-draft"));
        assert!(!valid_name(""));
        assert!(!valid_name("a..b"));
        assert!(!valid_name("../etc"));
        assert!(!valid_name("a/b"));
        assert!(!valid_name("spaced name"));
        assert!(!valid_name(&"x".repeat(65)));
        assert!(valid_name(&"x".repeat(64)));
    }

    #[test]
    fn test_save_and_list() {
        let dir = TempDir::new().unwrap();
        let texts = dir.path().join("texts");
        let lock = dir.path().join("texts.lock");
        assert!(list_sets(&texts).unwrap().is_empty());

        save_set(&texts, &lock, "b", b"[]").unwrap();
        save_set(&texts, &lock, "a", b"{}").unwrap();
        std::fs::write(texts.join("notes.txt"), "ignored").unwrap();
        assert_eq!(list_sets(&texts).unwrap(), vec!["a", "b"]);
        assert_eq!(std::fs::read(texts.join("a.json")).unwrap(), b"{}");
    }
}
