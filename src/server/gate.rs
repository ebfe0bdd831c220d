//! Access gate: client policy, HTTP basic auth, and the single-client lock.

use super::error::ApiError;
use super::state::AppState;
use crate::core::client_policy::Rejection;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::prelude::*;
use rand::Rng;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

pub async fn gate(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let credentials = basic_credentials(&req);
    match admit(&state, peer, credentials).await {
        Ok(()) => next.run(req).await,
        Err(e) => e.into_response(),
    }
}

async fn admit(
    state: &Arc<AppState>,
    peer: Option<SocketAddr>,
    credentials: Option<(String, String)>,
) -> Result<(), ApiError> {
    let ip = state
        .policy
        .check_client(&state.lock, peer)
        .map_err(|rejection| match rejection {
            Rejection::Forbidden => ApiError::Forbidden,
            Rejection::Internal => {
                ApiError::Internal(anyhow::anyhow!("request without peer address"))
            }
        })?;

    let Some((user, password)) = credentials else {
        tracing::debug!(%ip, "request without basic credentials");
        return Err(ApiError::Unauthorized {
            realm: state.realm(),
        });
    };

    let store = state.credentials.clone();
    let check_user = user.clone();
    let ok = tokio::task::spawn_blocking(move || store.check(&check_user, &password))
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("credential check panicked: {}", e)))?;
    if !ok {
        tracing::warn!(%ip, user = %user, "failed login");
        tokio::time::sleep(failure_delay(state.failure_delay)).await;
        return Err(ApiError::Forbidden);
    }

    if !state.policy.multi_client && !state.lock.bind(ip) {
        tracing::warn!(%ip, "lost race for the client lock");
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

fn failure_delay((lo, hi): (Duration, Duration)) -> Duration {
    if hi <= lo {
        return lo;
    }
    rand::thread_rng().gen_range(lo..=hi)
}

/// Decode `Authorization: Basic base64(user:password)`.
fn basic_credentials(req: &Request) -> Option<(String, String)> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = BASE64_STANDARD.decode(encoded.trim()).ok()?;
    let text = String::from_utf8(decoded).ok()?;
    let (user, password) = text.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(auth: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/apis");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_basic_credentials() {
        let encoded = format!("Basic {}", BASE64_STANDARD.encode("foo:b:ar"));
        assert_eq!(
            basic_credentials(&request(Some(&encoded))),
            Some(("foo".to_string(), "b:ar".to_string()))
        );
        let lower = format!("basic {}", BASE64_STANDARD.encode("foo:bar"));
        assert!(basic_credentials(&request(Some(&lower))).is_some());
    }

    #[test]
    fn test_malformed_credentials() {
        assert_eq!(basic_credentials(&request(None)), None);
        assert_eq!(basic_credentials(&request(Some("Bearer abc"))), None);
        assert_eq!(basic_credentials(&request(Some("Basic !!!"))), None);
        let no_colon = format!("Basic {}", BASE64_STANDARD.encode("foobar"));
        assert_eq!(basic_credentials(&request(Some(&no_colon))), None);
    }

    #[test]
    fn test_failure_delay_within_bounds() {
        let lo = Duration::from_millis(10);
        let hi = Duration::from_millis(20);
        for _ in 0..50 {
            let d = failure_delay((lo, hi));
            assert!(d >= lo && d <= hi);
        }
        assert_eq!(failure_delay((hi, hi)), hi);
    }
}
