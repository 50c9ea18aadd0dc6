//! Configuration management.
//!
//! Loads settings from environment variables and an optional .env file.

use std::str::FromStr;
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};

use crate::pipeline::{PipelineConfig, TimestampMode};
use crate::source::client::{FetchPolicy, SourceRequest, DEFAULT_USER_AGENT};
use crate::store::{DocumentPath, StoreError};

pub const DEFAULT_WEB_URL: &str = "https://www.premierleague.com/tables";
pub const DEFAULT_API_URL: &str = "https://api.football-data.org/v4/competitions/PL/standings";

/// Upper bound for configured durations.
const MAX_SECS: f64 = 86_400.0;

/// Application configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct Settings {
    // Source
    pub source_kind: SourceKind,
    pub source_url: String,
    pub source_user_agent: String,
    pub source_api_key: String,
    pub source_api_key_header: String,

    // Validation
    pub expected_team_count: usize,

    // Fetch policy
    pub fetch_timeout_secs: f64,
    pub fetch_max_attempts: u32,
    pub fetch_retry_delay_secs: f64,

    // Destination
    pub credentials_file: String,
    pub firestore_access_token: String,
    pub firestore_emulator_host: String,
    pub firestore_project_id: String,
    pub firestore_database: String,
    pub destination_collection: String,
    pub destination_document: String,
    pub timestamp_mode: TimestampKind,
    pub timestamp_utc_offset_hours: i32,

    // Run
    pub dry_run: bool,

    // Logging
    pub log_level: String,
    pub log_json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Public web page, parsed as markup.
    Web,
    /// JSON API authenticated with a key header.
    Api,
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "web" | "html" => Ok(Self::Web),
            "api" | "json" => Ok(Self::Api),
            _ => Err(format!("Invalid source kind: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampKind {
    Server,
    Client,
}

impl FromStr for TimestampKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "server" => Ok(Self::Server),
            "client" => Ok(Self::Client),
            _ => Err(format!("Invalid timestamp mode: {s}")),
        }
    }
}

impl Settings {
    /// Load settings from environment variables (and .env file).
    pub fn from_env() -> Self {
        // Try to load .env file (ignore if not found).
        let _ = dotenvy::dotenv();

        let source_kind = env_str("SOURCE_KIND", "web")
            .parse()
            .unwrap_or(SourceKind::Web);
        let default_url = match source_kind {
            SourceKind::Web => DEFAULT_WEB_URL,
            SourceKind::Api => DEFAULT_API_URL,
        };

        Self {
            source_kind,
            source_url: env_str("SOURCE_URL", default_url),
            source_user_agent: env_str("SOURCE_USER_AGENT", DEFAULT_USER_AGENT),
            source_api_key: env_str("SOURCE_API_KEY", ""),
            source_api_key_header: env_str("SOURCE_API_KEY_HEADER", "X-Auth-Token"),

            expected_team_count: env_usize("EXPECTED_TEAM_COUNT", 20),

            fetch_timeout_secs: env_f64("FETCH_TIMEOUT_SECONDS", 30.0),
            fetch_max_attempts: env_u32("FETCH_MAX_ATTEMPTS", 3),
            fetch_retry_delay_secs: env_f64("FETCH_RETRY_DELAY_SECONDS", 5.0),

            credentials_file: env_str("GOOGLE_APPLICATION_CREDENTIALS", ""),
            firestore_access_token: env_str("FIRESTORE_ACCESS_TOKEN", ""),
            firestore_emulator_host: env_str("FIRESTORE_EMULATOR_HOST", ""),
            firestore_project_id: env_str("FIRESTORE_PROJECT_ID", ""),
            firestore_database: env_str("FIRESTORE_DATABASE", "(default)"),
            destination_collection: env_str("DESTINATION_COLLECTION", "standings"),
            destination_document: env_str("DESTINATION_DOCUMENT", "currentWeek"),
            timestamp_mode: env_str("TIMESTAMP_MODE", "server")
                .parse()
                .unwrap_or(TimestampKind::Server),
            timestamp_utc_offset_hours: env_i32("TIMESTAMP_UTC_OFFSET_HOURS", 0),

            dry_run: env_bool("DRY_RUN", false),

            log_level: env_str("LOG_LEVEL", "info"),
            log_json: env_bool("LOG_JSON", false),
        }
    }

    /// Validate configuration for critical requirements.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if let Err(e) = self.source_request().url() {
            errors.push(format!("SOURCE_URL is invalid: {e}"));
        }
        if self.source_kind == SourceKind::Api && self.source_api_key.is_empty() {
            errors.push("SOURCE_API_KEY is required when SOURCE_KIND=api".to_string());
        }

        if self.expected_team_count == 0 {
            errors.push("EXPECTED_TEAM_COUNT must be >= 1".to_string());
        }
        if !self.fetch_timeout_secs.is_finite() || self.fetch_timeout_secs <= 0.0 {
            errors.push("FETCH_TIMEOUT_SECONDS must be > 0".to_string());
        }
        if self.fetch_max_attempts == 0 {
            errors.push("FETCH_MAX_ATTEMPTS must be >= 1".to_string());
        }
        if !self.fetch_retry_delay_secs.is_finite() || self.fetch_retry_delay_secs < 0.0 {
            errors.push("FETCH_RETRY_DELAY_SECONDS must be >= 0".to_string());
        }

        if let Err(e) = self.destination() {
            errors.push(format!("DESTINATION_COLLECTION/DESTINATION_DOCUMENT: {e}"));
        }
        if self.timestamp_mode == TimestampKind::Client && self.utc_offset().is_none() {
            errors.push("TIMESTAMP_UTC_OFFSET_HOURS must be in -23..=23".to_string());
        }

        if !self.dry_run
            && self.firestore_emulator_host.is_empty()
            && self.firestore_access_token.is_empty()
            && self.credentials_file.is_empty()
        {
            errors.push(
                "One of FIRESTORE_EMULATOR_HOST, FIRESTORE_ACCESS_TOKEN or \
                 GOOGLE_APPLICATION_CREDENTIALS is required"
                    .to_string(),
            );
        }
        if !self.dry_run
            && self.credentials_file.is_empty()
            && self.firestore_project_id.is_empty()
        {
            errors.push(
                "FIRESTORE_PROJECT_ID is required without a service account key".to_string(),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn source_request(&self) -> SourceRequest {
        let mut request = match self.source_kind {
            SourceKind::Web => SourceRequest::web_page(&self.source_url),
            SourceKind::Api => SourceRequest::json_api(
                &self.source_url,
                &self.source_api_key_header,
                &self.source_api_key,
            ),
        };
        request.user_agent = self.source_user_agent.clone();
        request
    }

    pub fn fetch_policy(&self) -> FetchPolicy {
        FetchPolicy {
            timeout: bounded_secs(self.fetch_timeout_secs, 0.001),
            max_attempts: self.fetch_max_attempts.max(1),
            retry_delay: bounded_secs(self.fetch_retry_delay_secs, 0.0),
        }
    }

    pub fn destination(&self) -> Result<DocumentPath, StoreError> {
        DocumentPath::new(&self.destination_collection, &self.destination_document)
    }

    /// Per-run pipeline settings. A bad destination path is a setup
    /// failure, reported before any stage runs.
    pub fn pipeline_config(&self) -> Result<PipelineConfig, StoreError> {
        Ok(PipelineConfig {
            expected_count: self.expected_team_count,
            destination: self.destination()?,
            timestamp: self.timestamp(),
            dry_run: self.dry_run,
        })
    }

    fn utc_offset(&self) -> Option<FixedOffset> {
        if !(-23..=23).contains(&self.timestamp_utc_offset_hours) {
            return None;
        }
        FixedOffset::east_opt(self.timestamp_utc_offset_hours * 3600)
    }

    pub fn timestamp(&self) -> TimestampMode {
        match self.timestamp_mode {
            TimestampKind::Server => TimestampMode::Server,
            TimestampKind::Client => {
                TimestampMode::Client(self.utc_offset().unwrap_or_else(|| Utc.fix()))
            }
        }
    }
}

fn bounded_secs(secs: f64, min: f64) -> Duration {
    if secs.is_nan() {
        return Duration::from_secs_f64(min);
    }
    Duration::from_secs_f64(secs.clamp(min, MAX_SECS))
}

// =============================================================================
// Environment helpers
// =============================================================================

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_i32(key: &str, default: i32) -> i32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim_start_matches('+').parse().ok())
        .unwrap_or(default)
}
