use std::fmt;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::cache::ScheduleCache;

// ============================================================================
// Schedule Types
// ============================================================================

/// Battle category a slot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Regular,
    Gachi,
    League,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Regular, Mode::Gachi, Mode::League];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Regular => "regular",
            Mode::Gachi => "gachi",
            Mode::League => "league",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Mode::ALL.into_iter().find(|m| m.as_str() == s)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Envelope returned by the schedule API.
#[derive(Debug, Deserialize)]
pub struct ScheduleResponse {
    pub result: ScheduleSet,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleSet {
    pub regular: Vec<ScheduleSlot>,
    #[serde(default)]
    pub gachi: Vec<ScheduleSlot>,
    #[serde(default)]
    pub league: Vec<ScheduleSlot>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleSlot {
    pub start_t: i64,
    pub end_t: i64,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    /// Raw rule label, e.g. `ガチエリア`.
    pub rule: String,
    pub rule_ex: RuleInfo,
    #[serde(deserialize_with = "at_least_two_maps")]
    pub maps_ex: Vec<MapInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleInfo {
    /// Stable identifier such as `splat_zones`.
    pub key: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapInfo {
    pub name: String,
}

fn at_least_two_maps<'de, D>(deserializer: D) -> Result<Vec<MapInfo>, D::Error>
where
    D: Deserializer<'de>,
{
    let maps = Vec::<MapInfo>::deserialize(deserializer)?;
    if maps.len() < 2 {
        return Err(serde::de::Error::invalid_length(
            maps.len(),
            &"at least two maps",
        ));
    }
    Ok(maps)
}

impl ScheduleSlot {
    /// Rule label without the `バトル` and `ガチ` decorations.
    pub fn short_rule(&self) -> String {
        short_rule(&self.rule)
    }

    pub fn map1(&self) -> &str {
        &self.maps_ex[0].name
    }

    pub fn map2(&self) -> &str {
        &self.maps_ex[1].name
    }
}

/// Strip the first `バトル`, then the first `ガチ`.
pub fn short_rule(rule: &str) -> String {
    rule.replacen("バトル", "", 1).replacen("ガチ", "", 1)
}

// ============================================================================
// Client
// ============================================================================

/// Fetches the schedule from the upstream API, memoized through a
/// [`ScheduleCache`].
#[derive(Debug)]
pub struct ScheduleClient {
    upstream: Upstream,
    cache: ScheduleCache<Arc<ScheduleSet>>,
}

/// Handle to the schedule API, cloned into each cache refresh.
#[derive(Debug, Clone)]
struct Upstream {
    client: Client,
    api_url: String,
}

impl ScheduleClient {
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = Client::builder()
            .user_agent(&config.schedule.user_agent)
            .timeout(StdDuration::from_secs(config.schedule.request_timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(e.into()))?;

        let ttl = i64::try_from(config.schedule.cache_ttl_seconds)
            .map_err(|_| AppError::Config("cache TTL out of range".to_string()))?;

        Ok(Self {
            upstream: Upstream {
                client,
                api_url: config.schedule.api_url.clone(),
            },
            cache: ScheduleCache::new(Duration::seconds(ttl)),
        })
    }

    /// Current schedule, from cache when it is still fresh.
    pub async fn fetch(&self) -> AppResult<Arc<ScheduleSet>> {
        let upstream = self.upstream.clone();
        self.cache
            .fetch(move || async move {
                let set = upstream.fetch().await.inspect_err(|e| {
                    warn!("Schedule fetch from {} failed: {}", upstream.api_url, e);
                })?;
                Ok(Arc::new(set))
            })
            .await
    }

    pub fn cached_at(&self) -> Option<DateTime<Utc>> {
        self.cache.cached_at()
    }
}

impl Upstream {
    /// One GET against the upstream, no retries.
    async fn fetch(&self) -> AppResult<ScheduleSet> {
        info!("Fetching schedule from {}", self.api_url);

        let response = self.client.get(&self.api_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamFetch(format!(
                "status {}: {}",
                status, error_text
            )));
        }

        let body = response.bytes().await?;
        let parsed: ScheduleResponse = serde_json::from_slice(&body)
            .map_err(|e| AppError::UpstreamFetch(format!("invalid schedule JSON: {}", e)))?;

        info!(
            "Fetched schedule: {} regular, {} gachi, {} league slots",
            parsed.result.regular.len(),
            parsed.result.gachi.len(),
            parsed.result.league.len()
        );

        Ok(parsed.result)
    }
}
