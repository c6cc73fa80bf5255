use std::env;
use std::time::Duration;

use chrono::FixedOffset;

use crate::error::AppError;

const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_CACHE_TTL_SECS: u64 = 30;
// America/Santiago standard time
const DEFAULT_UTC_OFFSET_MINUTES: i32 = -180;

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub request_timeout: Duration,
    pub cache_ttl: Duration,
    pub utc_offset_minutes: i32,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
        }
    }

    pub fn new_from_env() -> Result<Self, AppError> {
        let base_url = env::var("BOOKING_API_URL")
            .map_err(|_| AppError::Config("BOOKING_API_URL is not set".to_string()))?;
        let token = env::var("BOOKING_TOKEN").ok().filter(|t| !t.is_empty());

        let request_timeout = parse_env_number("BOOKING_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let cache_ttl = parse_env_number("BOOKING_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?;
        let utc_offset_minutes =
            parse_env_number("BOOKING_UTC_OFFSET_MINUTES", DEFAULT_UTC_OFFSET_MINUTES)?;

        Ok(Self {
            token,
            request_timeout: Duration::from_secs(request_timeout),
            cache_ttl: Duration::from_secs(cache_ttl),
            utc_offset_minutes,
            ..Self::new(base_url)
        })
    }

    /// Offset used to derive the local calendar day of a slot.
    pub fn utc_offset(&self) -> Result<FixedOffset, AppError> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            AppError::Config(format!("invalid UTC offset: {} minutes", self.utc_offset_minutes))
        })
    }
}

fn parse_env_number<T: std::str::FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::Config(format!("{} is not a valid number: {}", key, value))),
        Err(_) => Ok(default),
    }
}
