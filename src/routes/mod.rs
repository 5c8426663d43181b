pub mod health;
pub mod ical;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::middleware;
use crate::AppState;

/// Full application router: feed, health check and the static landing page.
pub fn router(state: Arc<AppState>) -> anyhow::Result<Router> {
    let mut feed = ical::router();
    if state.config.rate_limit.enabled {
        feed = middleware::rate_limit::apply(feed, &state.config.rate_limit)?;
    }

    let app = Router::new()
        .route("/health", get(health::health_check))
        .nest("/ical", feed)
        // Anything else falls through to the landing page directory
        .fallback_service(ServeDir::new(&state.config.server.static_dir))
        .with_state(state)
        .layer(axum::middleware::from_fn(
            middleware::security_headers::security_headers,
        ))
        .layer(TraceLayer::new_for_http());

    Ok(app)
}
