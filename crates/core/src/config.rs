use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key) {
        Some(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    /// Directory scanned for YAML rule documents.
    pub rules_dir: PathBuf,
    pub forecast: ForecastConfig,
    pub sentiment: SentimentConfig,
    pub realtime: RealtimeConfig,
    pub multimodal: MultimodalConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `SPIRIT_PROFILE` env var. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("SPIRIT_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            rules_dir: PathBuf::from(profiled_env_or(p, "RULES_DIR", "rules")),
            forecast: ForecastConfig::from_env_profiled(p),
            sentiment: SentimentConfig::from_env_profiled(p),
            realtime: RealtimeConfig::from_env_profiled(p),
            multimodal: MultimodalConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  rules:       dir={}", self.rules_dir.display());
        tracing::info!(
            "  forecast:    horizon={}, confidence={}, auto_tune={}, timeout={}s",
            self.forecast.default_horizon,
            self.forecast.confidence_level,
            self.forecast.auto_tune,
            self.forecast.timeout_secs
        );
        tracing::info!(
            "  sentiment:   negative<={}, emotion>={}, consecutive={}, cooldown={}m",
            self.sentiment.negative_threshold,
            self.sentiment.emotion_threshold,
            self.sentiment.consecutive_negative_limit,
            self.sentiment.cooldown_minutes
        );
        tracing::info!("  realtime:    heartbeat_ttl={}s", self.realtime.heartbeat_ttl_secs);
        tracing::info!(
            "  multimodal:  workers={}, cache={}, timeout={}s",
            self.multimodal.workers,
            self.multimodal.cache_capacity,
            self.multimodal.timeout_secs
        );
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: String::new(),
            rules_dir: PathBuf::from("rules"),
            forecast: ForecastConfig::default(),
            sentiment: SentimentConfig::default(),
            realtime: RealtimeConfig::default(),
            multimodal: MultimodalConfig::default(),
        }
    }
}

// ── Forecasting ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    pub default_horizon: usize,
    pub confidence_level: f64,
    pub auto_tune: bool,
    /// Budget for a single facade call.
    pub timeout_secs: u64,
    /// Anomaly detector sensitivity; contamination = 1 - sensitivity.
    pub anomaly_sensitivity: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            default_horizon: 30,
            confidence_level: 0.95,
            auto_tune: false,
            timeout_secs: 120,
            anomaly_sensitivity: 0.95,
        }
    }
}

impl ForecastConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            default_horizon: profiled_env_parse(p, "FORECAST_HORIZON", d.default_horizon),
            confidence_level: profiled_env_parse(p, "FORECAST_CONFIDENCE", d.confidence_level),
            auto_tune: profiled_env_bool(p, "FORECAST_AUTO_TUNE", d.auto_tune),
            timeout_secs: profiled_env_parse(p, "FORECAST_TIMEOUT_SECS", d.timeout_secs),
            anomaly_sensitivity: profiled_env_parse(
                p,
                "ANOMALY_SENSITIVITY",
                d.anomaly_sensitivity,
            ),
        }
    }
}

// ── Sentiment / alerting ──────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentConfig {
    /// Scores at or below this raise a negative-sentiment alert.
    pub negative_threshold: f64,
    /// Scores below this count as "negative" for streak tracking.
    pub streak_threshold: f64,
    /// Minimum dominant-emotion probability for an emotion alert.
    pub emotion_threshold: f64,
    pub consecutive_negative_limit: usize,
    pub cooldown_minutes: i64,
    /// Per-customer ring buffer size.
    pub trend_window: usize,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            negative_threshold: -0.5,
            streak_threshold: -0.2,
            emotion_threshold: 0.7,
            consecutive_negative_limit: 3,
            cooldown_minutes: 15,
            trend_window: 50,
        }
    }
}

impl SentimentConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            negative_threshold: profiled_env_parse(
                p,
                "SENTIMENT_NEGATIVE_THRESHOLD",
                d.negative_threshold,
            ),
            streak_threshold: profiled_env_parse(p, "SENTIMENT_STREAK_THRESHOLD", d.streak_threshold),
            emotion_threshold: profiled_env_parse(
                p,
                "SENTIMENT_EMOTION_THRESHOLD",
                d.emotion_threshold,
            ),
            consecutive_negative_limit: profiled_env_parse(
                p,
                "SENTIMENT_CONSECUTIVE_LIMIT",
                d.consecutive_negative_limit,
            ),
            cooldown_minutes: profiled_env_parse(p, "ALERT_COOLDOWN_MINUTES", d.cooldown_minutes),
            trend_window: profiled_env_parse(p, "SENTIMENT_TREND_WINDOW", d.trend_window),
        }
    }
}

// ── Realtime fan-out ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Subscribers that have not sent a heartbeat within this window are dropped.
    pub heartbeat_ttl_secs: i64,
    pub webhook_url: Option<String>,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            heartbeat_ttl_secs: 90,
            webhook_url: None,
        }
    }
}

impl RealtimeConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            heartbeat_ttl_secs: profiled_env_parse(p, "REALTIME_HEARTBEAT_TTL_SECS", 90),
            webhook_url: profiled_env_opt(p, "REALTIME_WEBHOOK_URL"),
        }
    }
}

// ── Multi-modal processing ────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultimodalConfig {
    pub workers: usize,
    pub cache_capacity: usize,
    pub timeout_secs: u64,
    /// Jobs that can wait in the queue before `process` applies backpressure.
    pub queue_capacity: usize,
}

impl Default for MultimodalConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            cache_capacity: 1000,
            timeout_secs: 30,
            queue_capacity: 256,
        }
    }
}

impl MultimodalConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            workers: profiled_env_parse(p, "MULTIMODAL_WORKERS", d.workers).max(1),
            cache_capacity: profiled_env_parse(p, "MULTIMODAL_CACHE_CAPACITY", d.cache_capacity),
            timeout_secs: profiled_env_parse(p, "MULTIMODAL_TIMEOUT_SECS", d.timeout_secs),
            queue_capacity: profiled_env_parse(p, "MULTIMODAL_QUEUE_CAPACITY", d.queue_capacity)
                .max(1),
        }
    }
}
