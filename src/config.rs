//! Configuration management for ipwatch.

use crate::error::{MonitorError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Public IP fetch settings.
    pub ip_check: IpCheckConfig,

    /// Cloudflare DNS update settings.
    pub cloudflare: CloudflareConfig,

    /// Notification settings.
    #[serde(default)]
    pub notification: NotificationConfig,
}

/// Settings for the public IP fetch step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpCheckConfig {
    /// Echo-service URL returning the caller's public IP in its body.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Regular expression with one capture group extracting the IP.
    #[serde(default = "default_ip_pattern")]
    pub ip_pattern: String,

    /// Maximum fetch attempts.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Pause between fetch attempts, in seconds.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Path of the single-slot last-known-IP file.
    #[serde(default = "default_last_ip_file")]
    pub last_ip_file: PathBuf,
}

impl IpCheckConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

/// Settings for the Cloudflare record update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudflareConfig {
    /// Zone ID.
    pub zone_id: String,

    /// API token (or environment variable name if prefixed with $).
    pub api_token: String,

    /// DNS record type (e.g., "A").
    #[serde(default = "default_dns_type")]
    pub dns_type: String,

    /// DNS record name (e.g., "home.example.com").
    pub record_name: String,

    /// TTL in seconds.
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Whether the record is proxied through Cloudflare.
    #[serde(default)]
    pub proxied: bool,

    /// Maximum update attempts.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Pause between update attempts, in seconds.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl CloudflareConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

/// Notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Whether to send a notification when the IP changes.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// WxPusher credentials.
    #[serde(default)]
    pub wxpusher: WxPusherConfig,

    /// Service ports embedded in the notification message.
    #[serde(default)]
    pub services: ServicePorts,

    /// Maximum send attempts.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Pause between send attempts, in seconds.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl NotificationConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            wxpusher: WxPusherConfig::default(),
            services: ServicePorts::default(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

/// WxPusher credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WxPusherConfig {
    /// Application token (or environment variable name if prefixed with $).
    #[serde(default)]
    pub app_token: String,

    /// Recipient UIDs.
    #[serde(default)]
    pub uids: Vec<String>,
}

/// Ports of the services whose URLs are embedded in the notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicePorts {
    #[serde(default = "default_s1_port")]
    pub s1_port: u16,

    #[serde(default = "default_s2_port")]
    pub s2_port: u16,
}

impl Default for ServicePorts {
    fn default() -> Self {
        Self {
            s1_port: default_s1_port(),
            s2_port: default_s2_port(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.ipify.org".to_string()
}

fn default_ip_pattern() -> String {
    r"((?:\d{1,3}\.){3}\d{1,3})".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    5
}

fn default_last_ip_file() -> PathBuf {
    PathBuf::from("last_ip.txt")
}

fn default_dns_type() -> String {
    "A".to_string()
}

fn default_ttl() -> u32 {
    120
}

fn default_true() -> bool {
    true
}

fn default_s1_port() -> u16 {
    8080
}

fn default_s2_port() -> u16 {
    9090
}

impl Config {
    /// Get the default config file path.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| MonitorError::Config("Could not find config directory".to_string()))?;

        Ok(config_dir.join("ipwatch").join("config.toml"))
    }

    /// Load configuration from a specific path.
    ///
    /// A missing or malformed file is fatal: the monitor cannot run without
    /// zone and credential settings.
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Err(MonitorError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Generate example configuration.
    pub fn example() -> Self {
        Self {
            ip_check: IpCheckConfig {
                api_url: default_api_url(),
                ip_pattern: default_ip_pattern(),
                max_retries: 3,
                retry_delay_secs: 5,
                last_ip_file: default_last_ip_file(),
            },
            cloudflare: CloudflareConfig {
                zone_id: "your-zone-id".to_string(),
                api_token: "$CF_API_TOKEN".to_string(),
                dns_type: default_dns_type(),
                record_name: "home.example.com".to_string(),
                ttl: default_ttl(),
                proxied: false,
                max_retries: 3,
                retry_delay_secs: 5,
            },
            notification: NotificationConfig {
                enabled: true,
                wxpusher: WxPusherConfig {
                    app_token: "$WXPUSHER_APP_TOKEN".to_string(),
                    uids: vec!["UID_xxxxxxxx".to_string()],
                },
                services: ServicePorts::default(),
                max_retries: 3,
                retry_delay_secs: 5,
            },
        }
    }
}

/// Resolve environment variable references (values starting with $).
pub fn resolve_env(value: &str) -> String {
    if let Some(var_name) = value.strip_prefix('$') {
        std::env::var(var_name).unwrap_or_else(|_| {
            tracing::warn!("Environment variable {} not set", var_name);
            value.to_string()
        })
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config_round_trips() {
        let config = Config::example();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.cloudflare.record_name, "home.example.com");
        assert_eq!(parsed.notification.wxpusher.uids.len(), 1);
    }

    #[test]
    fn test_minimal_config_gets_defaults() {
        let text = r#"
            [ip_check]

            [cloudflare]
            zone_id = "z"
            api_token = "t"
            record_name = "home.example.com"
        "#;

        let config: Config = toml::from_str(text).unwrap();
        assert_eq!(config.ip_check.api_url, "https://api.ipify.org");
        assert_eq!(config.ip_check.max_retries, 3);
        assert_eq!(config.cloudflare.dns_type, "A");
        assert_eq!(config.cloudflare.ttl, 120);
        assert!(!config.cloudflare.proxied);
        assert!(config.notification.enabled);
        assert_eq!(config.notification.services.s1_port, 8080);
    }

    #[test]
    fn test_load_from_missing_file_is_fatal() {
        let path = PathBuf::from("/nonexistent/ipwatch-config.toml");
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, MonitorError::Config(_)));
    }

    #[test]
    fn test_resolve_env_with_value() {
        assert_eq!(resolve_env("plain_value"), "plain_value");
    }

    #[test]
    fn test_resolve_env_with_existing_var() {
        std::env::set_var("TEST_IPWATCH_VAR", "resolved_value");
        assert_eq!(resolve_env("$TEST_IPWATCH_VAR"), "resolved_value");
        std::env::remove_var("TEST_IPWATCH_VAR");
    }

    #[test]
    fn test_resolve_env_with_missing_var() {
        let result = resolve_env("$NONEXISTENT_VAR_12345");
        assert_eq!(result, "$NONEXISTENT_VAR_12345");
    }
}
