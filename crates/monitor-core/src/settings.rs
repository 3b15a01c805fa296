use clap::Parser;
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use crate::error::{MonitorError, Result};

// ── Defaults ───────────────────────────────────────────────────────────────────

/// Shortest allowed poll interval; anything at or below is clamped to this.
pub const MIN_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Wait after a failed poll before trying again.
pub const DEFAULT_RETRY_WAIT: Duration = Duration::from_secs(60);

/// Per-request timeout for login, fetch and webhook calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Consecutive session failures tolerated before logging in again.
pub const DEFAULT_RELOGIN_AFTER: u32 = 3;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Relay contest clarifications to a chat webhook
#[derive(Parser, Debug, Clone)]
#[command(
    name = "clar-monitor",
    about = "Relay contest clarifications to a chat webhook",
    version
)]
pub struct Settings {
    /// Path to the TOML config file (defaults to ~/.clar-monitor/config.toml)
    pub config: Option<PathBuf>,

    /// Logging level
    #[arg(
        long,
        env = "CLAR_MONITOR_LOG_LEVEL",
        default_value = "INFO",
        value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"]
    )]
    pub log_level: String,

    /// Append log output to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Parse the process arguments.
    pub fn load() -> Self {
        Self::load_from_args(std::env::args_os())
    }

    /// Same as [`Settings::load`] with an explicit argument list.
    pub fn load_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut settings = Settings::parse_from(args);
        // --debug overrides log level.
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// The config file to read, falling back to [`default_config_path`].
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(default_config_path)
    }
}

/// `~/.clar-monitor/config.toml`.
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".clar-monitor")
        .join("config.toml")
}

// ── MonitorConfig (file) ───────────────────────────────────────────────────────

/// Contents of the TOML config file.
///
/// Keys are snake_case; the CamelCase spellings used by older config files
/// (`AtCoderURL`, `SlackWebhookURL`, …) are accepted as aliases.
#[derive(Clone, Deserialize)]
pub struct MonitorConfig {
    /// Contest root, e.g. `https://atcoder.jp/contests/abc300`.
    #[serde(default, alias = "AtCoderURL")]
    pub base_url: String,
    #[serde(default, alias = "AtCoderUserID")]
    pub user_id: String,
    #[serde(default, alias = "AtCoderPass")]
    pub password: String,
    #[serde(default, alias = "SlackWebhookURL")]
    pub webhook_url: String,
    /// Duration string such as `"30s"` or `"1m30s"`.
    #[serde(default, alias = "CheckInterval")]
    pub check_interval: String,
    #[serde(default)]
    pub retry_wait: Option<String>,
    #[serde(default)]
    pub request_timeout: Option<String>,
    #[serde(default = "default_relogin_after")]
    pub relogin_after: u32,
}

fn default_relogin_after() -> u32 {
    DEFAULT_RELOGIN_AFTER
}

impl fmt::Debug for MonitorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorConfig")
            .field("base_url", &self.base_url)
            .field("user_id", &self.user_id)
            .field("password", &"<redacted>")
            .field("webhook_url", &self.webhook_url)
            .field("check_interval", &self.check_interval)
            .field("retry_wait", &self.retry_wait)
            .field("request_timeout", &self.request_timeout)
            .field("relogin_after", &self.relogin_after)
            .finish()
    }
}

impl MonitorConfig {
    /// Read and validate the config file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| MonitorError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate config text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: MonitorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs missing any of the required connection settings.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("base_url", &self.base_url),
            ("user_id", &self.user_id),
            ("password", &self.password),
            ("webhook_url", &self.webhook_url),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(MonitorError::Config(format!("missing required key '{key}'")));
            }
        }
        Ok(())
    }

    /// Poll interval, clamped to [`MIN_CHECK_INTERVAL`].
    pub fn check_interval(&self) -> Duration {
        let parsed = parse_duration(&self.check_interval);
        if parsed.is_none() {
            tracing::warn!(
                value = %self.check_interval,
                "invalid check_interval; using {}s",
                MIN_CHECK_INTERVAL.as_secs()
            );
        }
        floor_interval(parsed)
    }

    /// Backoff after a failed poll.
    pub fn retry_wait(&self) -> Duration {
        duration_or_default("retry_wait", self.retry_wait.as_deref(), DEFAULT_RETRY_WAIT)
    }

    /// Timeout applied to every HTTP request.
    pub fn request_timeout(&self) -> Duration {
        duration_or_default(
            "request_timeout",
            self.request_timeout.as_deref(),
            DEFAULT_REQUEST_TIMEOUT,
        )
    }
}

fn duration_or_default(key: &str, value: Option<&str>, default: Duration) -> Duration {
    let Some(raw) = value else {
        return default;
    };
    match parse_duration(raw) {
        Some(d) if !d.is_zero() => d,
        _ => {
            tracing::warn!(key, value = %raw, "invalid duration; using {:?}", default);
            default
        }
    }
}

// ── Durations ──────────────────────────────────────────────────────────────────

fn duration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d+)?(?:\.(\d*))?(ns|us|µs|μs|ms|s|m|h)").expect("valid duration regex")
    })
}

fn unit_nanos(unit: &str) -> Option<u128> {
    Some(match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60 * 1_000_000_000,
        "h" => 3_600 * 1_000_000_000,
        _ => return None,
    })
}

/// Parse a duration string such as `"30s"`, `"1m30s"`, `"1.5h"` or `"250ms"`.
///
/// A bare `"0"` is accepted. Returns `None` for anything else that does not
/// follow the `<number><unit>` grammar, including negative values.
///
/// # Examples
///
/// ```
/// use monitor_core::settings::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("30s"), Some(Duration::from_secs(30)));
/// assert_eq!(parse_duration("1m30s"), Some(Duration::from_secs(90)));
/// assert_eq!(parse_duration("soon"), None);
/// ```
pub fn parse_duration(input: &str) -> Option<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if input == "0" {
        return Some(Duration::ZERO);
    }

    let re = duration_regex();
    let mut rest = input;
    let mut total: u128 = 0;

    while !rest.is_empty() {
        let caps = re.captures(rest)?;
        let whole = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let frac = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        if whole.is_empty() && frac.is_empty() {
            return None;
        }
        let unit = unit_nanos(&caps[3])?;

        let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        total = total.checked_add(whole.checked_mul(unit)?)?;

        if !frac.is_empty() {
            // Digits past 18 cannot matter at nanosecond resolution.
            let digits = &frac[..frac.len().min(18)];
            let numerator: u128 = digits.parse().ok()?;
            let scale = 10u128.pow(digits.len() as u32);
            total = total.checked_add(numerator * unit / scale)?;
        }

        rest = &rest[caps[0].len()..];
    }

    let secs = u64::try_from(total / 1_000_000_000).ok()?;
    Some(Duration::new(secs, (total % 1_000_000_000) as u32))
}

/// Clamp a parsed interval to [`MIN_CHECK_INTERVAL`]; `None` maps to the floor.
pub fn floor_interval(interval: Option<Duration>) -> Duration {
    match interval {
        Some(d) if d > MIN_CHECK_INTERVAL => d,
        _ => MIN_CHECK_INTERVAL,
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
