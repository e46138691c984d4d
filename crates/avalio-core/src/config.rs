//! avalio.toml configuration parser.
//!
//! ```toml
//! log_level = "info"
//!
//! [[resources.http]]
//! name = "site"
//! url = "https://example.com"
//!
//! [[notificators.console]]
//! name = "console"
//!
//! [[monitors.cron]]
//! name = "every minute"
//! cron = "* * * * *"
//! resources = ["site"]
//! notificators = ["console"]
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

pub const DEFAULT_EXPECTED_STATUS: u16 = 200;
pub const DEFAULT_HTTP_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_HTTP_RETRY_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AvalioConfig {
    pub log_level: Option<String>,
    #[serde(default)]
    pub resources: ResourcesConfig,
    #[serde(default)]
    pub notificators: NotificatorsConfig,
    #[serde(default)]
    pub monitors: MonitorsConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourcesConfig {
    #[serde(default)]
    pub http: Vec<HttpResourceConfig>,
    #[serde(default)]
    pub ping: Vec<PingResourceConfig>,
}

/// A duration given either as plain seconds or as a string like "500ms".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub fn to_duration(&self) -> Option<Duration> {
        match self {
            DurationValue::Seconds(secs) => Some(Duration::from_secs(*secs)),
            DurationValue::Text(s) => parse_duration(s),
        }
    }

    fn describe(&self) -> String {
        match self {
            DurationValue::Seconds(secs) => secs.to_string(),
            DurationValue::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpResourceConfig {
    pub name: String,
    pub url: String,
    #[serde(default = "default_expected_status")]
    pub expected_status: u16,
    #[serde(alias = "max_retries")]
    pub max_attempts: Option<u32>,
    pub retry_delay: Option<DurationValue>,
    pub timeout: Option<DurationValue>,
}

impl HttpResourceConfig {
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts.unwrap_or(DEFAULT_HTTP_MAX_ATTEMPTS)
    }

    pub fn retry_delay(&self) -> ConfigResult<Duration> {
        resolve_duration(
            "resources.http",
            &self.name,
            self.retry_delay.as_ref(),
            DEFAULT_HTTP_RETRY_DELAY,
        )
    }

    pub fn timeout(&self) -> ConfigResult<Duration> {
        resolve_duration(
            "resources.http",
            &self.name,
            self.timeout.as_ref(),
            DEFAULT_REQUEST_TIMEOUT,
        )
    }

    fn validate(&self) -> ConfigResult<()> {
        require("resources.http", "name", &self.name)?;
        require("resources.http", "url", &self.url)?;
        if self.max_attempts == Some(0) {
            return Err(ConfigError::Invalid {
                section: "resources.http",
                name: self.name.clone(),
                reason: "max_attempts must be at least 1".to_string(),
            });
        }
        self.retry_delay()?;
        positive_timeout("resources.http", &self.name, self.timeout()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingResourceConfig {
    pub name: String,
    pub address: String,
    pub timeout: Option<DurationValue>,
}

impl PingResourceConfig {
    pub fn timeout(&self) -> ConfigResult<Duration> {
        resolve_duration(
            "resources.ping",
            &self.name,
            self.timeout.as_ref(),
            DEFAULT_REQUEST_TIMEOUT,
        )
    }

    fn validate(&self) -> ConfigResult<()> {
        require("resources.ping", "name", &self.name)?;
        require("resources.ping", "address", &self.address)?;
        positive_timeout("resources.ping", &self.name, self.timeout()?)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificatorsConfig {
    #[serde(default)]
    pub console: Vec<ConsoleNotificatorConfig>,
    #[serde(default)]
    pub telegram: Vec<TelegramNotificatorConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleNotificatorConfig {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramNotificatorConfig {
    pub name: String,
    pub chat_id: String,
    pub token: String,
    pub api_url: Option<String>,
}

impl TelegramNotificatorConfig {
    pub fn api_url(&self) -> &str {
        self.api_url
            .as_deref()
            .unwrap_or(DEFAULT_TELEGRAM_API_URL)
            .trim_end_matches('/')
    }

    fn validate(&self) -> ConfigResult<()> {
        require("notificators.telegram", "name", &self.name)?;
        require("notificators.telegram", "chat_id", &self.chat_id)?;
        require("notificators.telegram", "token", &self.token)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorsConfig {
    #[serde(default)]
    pub cron: Vec<CronMonitorConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CronMonitorConfig {
    pub name: String,
    pub cron: String,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub notificators: Vec<String>,
}

impl CronMonitorConfig {
    fn validate(&self) -> ConfigResult<()> {
        require("monitors.cron", "name", &self.name)?;
        require("monitors.cron", "cron", &self.cron)?;
        Ok(())
    }
}

impl AvalioConfig {
    /// Read and parse a config file without validating it.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let config = Self::from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Check required fields, durations, and name uniqueness.
    ///
    /// HTTP and ping resources share one name space. Monitor references
    /// are resolved later, when the application is assembled.
    pub fn validate(&self) -> ConfigResult<()> {
        let mut resource_names = HashSet::new();
        for r in &self.resources.http {
            r.validate()?;
            unique(&mut resource_names, "resource", &r.name)?;
        }
        for r in &self.resources.ping {
            r.validate()?;
            unique(&mut resource_names, "resource", &r.name)?;
        }

        let mut notificator_names = HashSet::new();
        for n in &self.notificators.console {
            require("notificators.console", "name", &n.name)?;
            unique(&mut notificator_names, "notificator", &n.name)?;
        }
        for n in &self.notificators.telegram {
            n.validate()?;
            unique(&mut notificator_names, "notificator", &n.name)?;
        }

        for m in &self.monitors.cron {
            m.validate()?;
        }
        Ok(())
    }
}

fn default_expected_status() -> u16 {
    DEFAULT_EXPECTED_STATUS
}

fn require(section: &'static str, field: &'static str, value: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingField { section, field });
    }
    Ok(())
}

fn unique<'a>(
    seen: &mut HashSet<&'a str>,
    category: &'static str,
    name: &'a str,
) -> ConfigResult<()> {
    if !seen.insert(name) {
        return Err(ConfigError::DuplicateName {
            category,
            name: name.to_string(),
        });
    }
    Ok(())
}

fn positive_timeout(section: &'static str, name: &str, timeout: Duration) -> ConfigResult<()> {
    if timeout.is_zero() {
        return Err(ConfigError::Invalid {
            section,
            name: name.to_string(),
            reason: "timeout must be positive".to_string(),
        });
    }
    Ok(())
}

fn resolve_duration(
    section: &'static str,
    name: &str,
    value: Option<&DurationValue>,
    default: Duration,
) -> ConfigResult<Duration> {
    match value {
        None => Ok(default),
        Some(v) => v.to_duration().ok_or_else(|| ConfigError::InvalidDuration {
            section,
            name: name.to_string(),
            value: v.describe(),
        }),
    }
}

/// Parse a duration string like "5s", "500ms", "1m".
///
/// A bare number is taken as seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.trim().parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.trim().parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FULL: &str = r#"
log_level = "debug"

[[resources.http]]
name = "site"
url = "https://example.com"
expected_status = 204
max_retries = 5
retry_delay = "500ms"
timeout = 3

[[resources.ping]]
name = "gateway"
address = "10.0.0.1"

[[notificators.console]]
name = "console"

[[notificators.telegram]]
name = "bot"
chat_id = "42"
token = "secret"

[[monitors.cron]]
name = "every minute"
cron = "* * * * *"
resources = ["site", "gateway"]
notificators = ["console", "bot"]
"#;

    #[test]
    fn parse_full_config() {
        let config = AvalioConfig::from_toml_str(FULL).unwrap();
        config.validate().unwrap();

        assert_eq!(config.log_level.as_deref(), Some("debug"));
        let http = &config.resources.http[0];
        assert_eq!(http.expected_status, 204);
        assert_eq!(http.max_attempts(), 5);
        assert_eq!(http.retry_delay().unwrap(), Duration::from_millis(500));
        assert_eq!(http.timeout().unwrap(), Duration::from_secs(3));

        let ping = &config.resources.ping[0];
        assert_eq!(ping.timeout().unwrap(), DEFAULT_REQUEST_TIMEOUT);

        assert_eq!(config.notificators.telegram[0].api_url(), DEFAULT_TELEGRAM_API_URL);
        assert_eq!(config.monitors.cron[0].resources, vec!["site", "gateway"]);
    }

    #[test]
    fn http_defaults() {
        let config = AvalioConfig::from_toml_str(
            r#"
[[resources.http]]
name = "site"
url = "http://localhost"
"#,
        )
        .unwrap();
        let http = &config.resources.http[0];
        assert_eq!(http.expected_status, 200);
        assert_eq!(http.max_attempts(), 3);
        assert_eq!(http.retry_delay().unwrap(), Duration::from_secs(1));
        assert_eq!(http.timeout().unwrap(), Duration::from_secs(10));
    }

    #[test]
    fn empty_config_is_valid() {
        let config = AvalioConfig::from_toml_str("").unwrap();
        config.validate().unwrap();
        assert!(config.monitors.cron.is_empty());
    }

    #[test]
    fn duplicate_resource_names_across_kinds_rejected() {
        let config = AvalioConfig::from_toml_str(
            r#"
[[resources.http]]
name = "box"
url = "http://localhost"

[[resources.ping]]
name = "box"
address = "127.0.0.1"
"#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName { category: "resource", .. }));
    }

    #[test]
    fn duplicate_notificator_names_rejected() {
        let config = AvalioConfig::from_toml_str(
            r#"
[[notificators.console]]
name = "out"

[[notificators.telegram]]
name = "out"
chat_id = "1"
token = "t"
"#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "duplicated notificator name: out");
    }

    #[test]
    fn telegram_requires_token() {
        let config = AvalioConfig::from_toml_str(
            r#"
[[notificators.telegram]]
name = "bot"
chat_id = "1"
token = ""
"#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "[[notificators.telegram]] - token can't be empty");
    }

    #[test]
    fn zero_attempts_rejected() {
        let config = AvalioConfig::from_toml_str(
            r#"
[[resources.http]]
name = "site"
url = "http://localhost"
max_attempts = 0
"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::Invalid { .. }
        ));
    }

    #[test]
    fn bad_duration_rejected() {
        let config = AvalioConfig::from_toml_str(
            r#"
[[resources.ping]]
name = "gw"
address = "10.0.0.1"
timeout = "soon"
"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::InvalidDuration { .. }
        ));
    }

    #[test]
    fn missing_cron_expression_rejected() {
        let config = AvalioConfig::from_toml_str(
            r#"
[[monitors.cron]]
name = "m"
cron = ""
"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::MissingField { field: "cron", .. }
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();
        let config = AvalioConfig::load(file.path()).unwrap();
        assert_eq!(config.resources.http.len(), 1);
    }

    #[test]
    fn zero_timeouts_rejected() {
        for toml in [
            "[[resources.http]]\nname = \"site\"\nurl = \"http://localhost\"\ntimeout = 0\n",
            "[[resources.http]]\nname = \"site\"\nurl = \"http://localhost\"\ntimeout = \"0s\"\n",
            "[[resources.ping]]\nname = \"gw\"\naddress = \"10.0.0.1\"\ntimeout = 0\n",
            "[[resources.ping]]\nname = \"gw\"\naddress = \"10.0.0.1\"\ntimeout = \"0ms\"\n",
        ] {
            let config = AvalioConfig::from_toml_str(toml).unwrap();
            let err = config.validate().unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { ref reason, .. } if reason == "timeout must be positive"),
                "{toml}: {err}"
            );
        }
    }

    #[test]
    fn huge_minute_duration_is_invalid() {
        assert_eq!(parse_duration("999999999999999999m"), None);

        let config = AvalioConfig::from_toml_str(
            r#"
[[resources.http]]
name = "site"
url = "http://localhost"
retry_delay = "999999999999999999m"
"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::InvalidDuration { .. }
        ));
    }

    #[test]
    fn load_missing_file_fails() {
        let err = AvalioConfig::load(Path::new("/nonexistent/avalio.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("5s"), Some(Duration::from_secs(5)));
        assert_eq!(parse_duration("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration("10"), Some(Duration::from_secs(10)));
        assert_eq!(parse_duration("0s"), Some(Duration::ZERO));
        assert_eq!(parse_duration("fast"), None);
    }
}
