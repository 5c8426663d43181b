use std::env;

use serde::Deserialize;

pub const DEFAULT_SCHEDULE_API_URL: &str = "https://spla2.yuu26.com/schedule";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub schedule: ScheduleConfig,
    pub calendar: CalendarConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory served at `/` (landing page). Read from env var `STATIC_DIR`.
    pub static_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    pub api_url: String,
    /// Sent as `User-Agent` on every upstream request.
    pub user_agent: String,
    /// How long a fetched schedule is served before the upstream is asked again.
    pub cache_ttl_seconds: u64,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarConfig {
    /// Published as `X-WR-CALNAME`.
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Allowed requests per second (per IP) for the feed endpoint
    pub per_second: u32,
    /// Burst size for the feed endpoint
    pub burst: u32,
}

fn default_user_agent() -> String {
    format!("splatoon-ical/{}", env!("CARGO_PKG_VERSION"))
}

fn parse_flag(v: &str, default: bool) -> bool {
    match v.to_lowercase().as_str() {
        "1" | "true" | "yes" => true,
        "0" | "false" | "no" => false,
        _ => default,
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,
                static_dir: env::var("STATIC_DIR").unwrap_or_else(|_| "public".to_string()),
            },
            schedule: ScheduleConfig {
                api_url: env::var("SCHEDULE_API_URL")
                    .unwrap_or_else(|_| DEFAULT_SCHEDULE_API_URL.to_string()),
                user_agent: env::var("SCHEDULE_USER_AGENT")
                    .unwrap_or_else(|_| default_user_agent()),
                cache_ttl_seconds: env::var("SCHEDULE_CACHE_TTL_SECONDS")
                    .unwrap_or_else(|_| "3600".to_string())
                    .parse()
                    .map_err(|_| {
                        ConfigError::InvalidValue("SCHEDULE_CACHE_TTL_SECONDS".to_string())
                    })?,
                request_timeout_seconds: env::var("SCHEDULE_REQUEST_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
            },
            calendar: CalendarConfig {
                name: env::var("CALENDAR_NAME")
                    .unwrap_or_else(|_| "Splatoon 2 Schedule".to_string()),
            },
            rate_limit: RateLimitConfig {
                enabled: match env::var("RATE_LIMIT_ENABLED") {
                    Ok(v) => parse_flag(&v, true),
                    Err(_) => true,
                },
                per_second: env::var("RATE_LIMIT_PER_SECOND")
                    .unwrap_or_else(|_| "2".to_string())
                    .parse()
                    .unwrap_or(2),
                burst: env::var("RATE_LIMIT_BURST")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()
                    .unwrap_or(20),
            },
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                static_dir: "public".to_string(),
            },
            schedule: ScheduleConfig {
                api_url: DEFAULT_SCHEDULE_API_URL.to_string(),
                user_agent: default_user_agent(),
                cache_ttl_seconds: 3600,
                request_timeout_seconds: 10,
            },
            calendar: CalendarConfig {
                name: "Splatoon 2 Schedule".to_string(),
            },
            rate_limit: RateLimitConfig {
                enabled: true,
                per_second: 2,
                burst: 20,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_upstream_constants() {
        let config = Config::default();
        assert_eq!(config.schedule.api_url, DEFAULT_SCHEDULE_API_URL);
        assert_eq!(config.schedule.cache_ttl_seconds, 3600);
        assert!(config.schedule.user_agent.starts_with("splatoon-ical/"));
    }

    #[test]
    fn parse_flag_accepts_common_spellings() {
        assert!(parse_flag("YES", false));
        assert!(!parse_flag("0", true));
        assert!(parse_flag("maybe", true));
    }
}
