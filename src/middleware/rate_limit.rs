use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, Router};
use http::StatusCode;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::SmartIpKeyExtractor;
use tower_governor::{GovernorError, GovernorLayer};

use crate::config::RateLimitConfig;
use crate::error::ErrorResponse;
use crate::AppState;

const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

fn json_response(status: StatusCode, body: &ErrorResponse) -> http::Response<Body> {
    let body = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
    let mut resp = http::Response::new(Body::from(body));
    *resp.status_mut() = status;
    resp.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );
    resp
}

// Same JSON error shape as `AppError -> IntoResponse`
fn governor_error(error: GovernorError) -> http::Response<Body> {
    match error {
        GovernorError::TooManyRequests { wait_time, headers } => {
            let mut body = ErrorResponse::new("RATE_LIMITED", "Rate limit exceeded");
            body.error.details = Some(serde_json::json!({ "retry_after_seconds": wait_time }));

            let mut resp = json_response(StatusCode::TOO_MANY_REQUESTS, &body);
            if let Some(hmap) = headers {
                for (name, value) in hmap.iter() {
                    resp.headers_mut().append(name.clone(), value.clone());
                }
            }
            if let Ok(v) = http::HeaderValue::from_str(&wait_time.to_string()) {
                resp.headers_mut().insert(http::header::RETRY_AFTER, v);
            }
            resp
        }
        GovernorError::UnableToExtractKey => json_response(
            StatusCode::BAD_REQUEST,
            &ErrorResponse::new(
                "INVALID_REQUEST",
                "Unable to determine client IP for rate limiting",
            ),
        ),
        GovernorError::Other { code, msg, headers } => {
            let status =
                StatusCode::from_u16(code.as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let message = msg.unwrap_or_else(|| "Rate limiting error".to_string());
            let mut resp = json_response(status, &ErrorResponse::new("RATE_LIMIT_ERROR", message));
            if let Some(hmap) = headers {
                for (name, value) in hmap.iter() {
                    resp.headers_mut().append(name.clone(), value.clone());
                }
            }
            resp
        }
    }
}

/// Wrap `router` in a per-client-IP governor and start the task that prunes
/// its state. Must be called from inside the tokio runtime.
pub fn apply(
    router: Router<Arc<AppState>>,
    config: &RateLimitConfig,
) -> anyhow::Result<Router<Arc<AppState>>> {
    let mut builder = GovernorConfigBuilder::default().key_extractor(SmartIpKeyExtractor);
    builder.per_second(config.per_second.into());
    builder.burst_size(config.burst);
    builder.error_handler(governor_error);

    let gov_conf = Arc::new(
        builder
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Failed to build feed governor config"))?,
    );

    let limiter = gov_conf.limiter().clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            tracing::debug!("feed rate limiter size: {}", limiter.len());
            limiter.retain_recent();
        }
    });

    Ok(router.layer(GovernorLayer { config: gov_conf }))
}
