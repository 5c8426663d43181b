use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use serde::Deserialize;

use crate::error::AppResult;
use crate::services::feed::{self, FeedBuilder};
use crate::services::filter::Filter;
use crate::services::template::FormatSpec;
use crate::AppState;

pub const CALENDAR_CONTENT_TYPE: &str = "text/calendar; charset=UTF-8";

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/all.ics", get(all_ics))
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    pub title_format: Option<String>,
    pub description_format: Option<String>,
    /// Comma-separated subset of `gachi,league`.
    pub mode: Option<String>,
    /// Comma-separated rule keys, e.g. `splat_zones,rainmaker`.
    pub rule: Option<String>,
}

/// Whole schedule as an iCalendar feed.
async fn all_ics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> AppResult<Response> {
    let format = FormatSpec::new(
        query.title_format.as_deref(),
        query.description_format.as_deref(),
    );
    let mode = Filter::parse(query.mode.as_deref());
    let rule = Filter::parse(query.rule.as_deref());

    let events = FeedBuilder::build(&state.schedule, &format, &mode, &rule).await?;
    let body = feed::to_ical(&events, &state.config.calendar.name, Utc::now());

    Ok(([(header::CONTENT_TYPE, CALENDAR_CONTENT_TYPE)], body).into_response())
}
