//! Configuration management for sysprobe
//!
//! Config file location:
//! - Linux: ~/.config/sysprobe/config.toml
//! - macOS: ~/Library/Application Support/dev.sysprobe.sysprobe/config.toml
//! - Windows: %APPDATA%/sysprobe/sysprobe/config/config.toml
//!
//! You can override the config location by setting `SYSPROBE_CONFIG_PATH`.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::host::HostSettings;
use crate::probes::ProbeSettings;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Lookup service endpoints
    #[serde(default)]
    pub services: ServicesConfig,

    /// Probe tuning
    #[serde(default)]
    pub probes: ProbesConfig,

    /// Diagnostics page server
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from file or create default
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

            let config: Config = toml::from_str(&content).with_context(|| {
                format!("Failed to parse config from {}", config_path.display())
            })?;

            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration and apply `SYSPROBE_*` environment overrides
    pub fn load_effective() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, toml)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("SYSPROBE_CONFIG_PATH") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Ok(PathBuf::from(trimmed));
            }
        }

        let proj_dirs = ProjectDirs::from("dev", "sysprobe", "sysprobe")
            .context("Could not determine project directories")?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Create default config file if it doesn't exist
    pub fn init() -> Result<Self> {
        let config = Self::load()?;

        let config_path = Self::config_path()?;
        if !config_path.exists() {
            config.save()?;
        }

        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(url) = env_string("SYSPROBE_IP_LOOKUP_URL") {
            self.services.ip_lookup_url = url;
        }
        if let Some(url) = env_string("SYSPROBE_GEOLOCATION_URL") {
            self.services.geolocation_url = url;
        }
        if let Some(seconds) = env_string("SYSPROBE_HTTP_TIMEOUT_SECONDS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|v| *v > 0)
        {
            self.services.timeout_seconds = seconds;
        }
        if let Some(delay) =
            env_string("SYSPROBE_ADBLOCK_DELAY_MS").and_then(|s| s.parse::<u64>().ok())
        {
            self.probes.adblock_delay_ms = delay;
        }
    }

    /// Settings handed to the native host
    pub fn host_settings(&self) -> HostSettings {
        HostSettings {
            user_agent: self.probes.user_agent.clone(),
            decoy_host: self.probes.decoy_host.clone(),
            control_host: control_host(&self.services.ip_lookup_url),
            cookie_store: self.services.cookie_store,
        }
    }

    /// Settings handed to the probes
    pub fn probe_settings(&self) -> ProbeSettings {
        ProbeSettings {
            adblock_delay: Duration::from_millis(self.probes.adblock_delay_ms),
            permission_fallback: self.probes.permission_fallback,
            collection_deadline: Duration::from_secs(
                self.probes.collection_timeout_seconds.max(1),
            ),
        }
    }
}

/// Hostname of the IP-lookup service; resolving it tells an offline resolver
/// apart from one that blocks the decoy
fn control_host(ip_lookup_url: &str) -> String {
    reqwest::Url::parse(ip_lookup_url.trim())
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| "api.ipify.org".to_string())
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Lookup service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// Endpoint returning `{"ip": ...}`
    #[serde(default = "default_ip_lookup_url")]
    pub ip_lookup_url: String,

    /// Endpoint returning `{"city": ..., "country_name": ...}`
    #[serde(default = "default_geolocation_url")]
    pub geolocation_url: String,

    /// Deadline for each lookup in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Keep a cookie store in the HTTP client
    #[serde(default = "default_true")]
    pub cookie_store: bool,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            ip_lookup_url: default_ip_lookup_url(),
            geolocation_url: default_geolocation_url(),
            timeout_seconds: default_timeout(),
            cookie_store: default_true(),
        }
    }
}

fn default_ip_lookup_url() -> String {
    "https://api.ipify.org?format=json".to_string()
}

fn default_geolocation_url() -> String {
    "https://ipapi.co/json/".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

/// Probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbesConfig {
    /// How long the ad-block decoy stays in place before it is measured
    #[serde(default = "default_adblock_delay_ms")]
    pub adblock_delay_ms: u64,

    /// Ad-serving hostname used as the decoy
    #[serde(default = "default_decoy_host")]
    pub decoy_host: String,

    /// Replaces the synthesized user agent
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Write "Unavailable" to permission slots left unresolved by a failed query
    #[serde(default)]
    pub permission_fallback: bool,

    /// Upper bound on a full collection; slow probes past it are reported unset
    #[serde(default = "default_collection_timeout")]
    pub collection_timeout_seconds: u64,
}

impl Default for ProbesConfig {
    fn default() -> Self {
        Self {
            adblock_delay_ms: default_adblock_delay_ms(),
            decoy_host: default_decoy_host(),
            user_agent: None,
            permission_fallback: false,
            collection_timeout_seconds: default_collection_timeout(),
        }
    }
}

fn default_collection_timeout() -> u64 {
    30
}

fn default_adblock_delay_ms() -> u64 {
    100
}

fn default_decoy_host() -> String {
    "pagead2.googlesyndication.com".to_string()
}

/// Diagnostics page server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Open the page in the default browser on start
    #[serde(default = "default_true")]
    pub open_browser: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            open_browser: default_true(),
        }
    }
}

fn default_port() -> u16 {
    3000
}

/// Get configuration file path for display purposes
pub fn get_config_path() -> Result<String> {
    let path = Config::config_path()?;
    Ok(path.display().to_string())
}
