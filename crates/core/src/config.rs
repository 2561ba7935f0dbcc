//! Tracker configuration — validated once at construction, immutable after.

use crate::error::{BeaconError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Two years, the default lifetime of the durable identity record.
fn default_cookie_lifetime_secs() -> i64 {
    63_072_000
}

/// Thirty minutes of idle time before a new session starts.
fn default_session_timeout_ms() -> u64 {
    1_800_000
}

fn default_cookie_path() -> String {
    "/".into()
}

fn default_cookie_secure() -> bool {
    true
}

fn default_same_site() -> SameSite {
    SameSite::Lax
}

fn default_storage() -> StorageStrategy {
    StorageStrategy::Cookie
}

fn default_platform() -> String {
    "web".into()
}

/// Which persistence variant backs the durable identity record.
/// Selected once per tracker instance, never re-evaluated per call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageStrategy {
    /// Domain-scoped cookies with secure/same-site attribute enforcement.
    Cookie,
    /// Origin key-value storage; no attributes, no backend-enforced expiry.
    LocalStorage,
    /// Instance-scoped memory; never survives a reload.
    Memory,
}

/// SameSite attribute applied to identity cookies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

/// Which identifiers are suppressed, and at which layer.
///
/// `Client` and `Both` disable durable persistence entirely; `Server` keeps
/// persisting real values locally (so disabling anonymization later resumes
/// a continuous identity) but withholds the network user id from payloads.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnonymizationMode {
    #[default]
    None,
    Client,
    Server,
    Both,
}

impl AnonymizationMode {
    /// Whether durable identity may be written to cookie/local storage.
    pub fn allows_persistence(self) -> bool {
        matches!(self, Self::None | Self::Server)
    }

    /// Whether domain/session/user identifiers may appear in payloads.
    pub fn exposes_client_ids(self) -> bool {
        matches!(self, Self::None | Self::Server)
    }

    /// Whether the network user id is replaced by the all-zero sentinel.
    pub fn masks_network_user_id(self) -> bool {
        matches!(self, Self::Server | Self::Both)
    }
}

/// Per-tracker-instance configuration.
///
/// Deserializable from TOML for server-side embeddings; constructed directly
/// by browser-shim hosts. [`TrackerConfig::validate`] runs once inside
/// `Tracker::new`, so a constructed tracker always holds a valid config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Tracker namespace; qualifies every storage key this instance owns.
    pub namespace: String,
    /// Application identifier stamped on every payload.
    pub app_id: String,
    #[serde(default = "default_platform")]
    pub platform: String,
    #[serde(default)]
    pub anonymize: AnonymizationMode,
    #[serde(default = "default_session_timeout_ms")]
    pub session_timeout_ms: u64,
    #[serde(default = "default_storage")]
    pub storage: StorageStrategy,
    /// Cookie scope domain; host-only cookie when absent.
    #[serde(default)]
    pub cookie_domain: Option<String>,
    #[serde(default = "default_cookie_path")]
    pub cookie_path: String,
    #[serde(default = "default_cookie_secure")]
    pub cookie_secure: bool,
    #[serde(default = "default_same_site")]
    pub cookie_same_site: SameSite,
    /// Lifetime of the durable record, in seconds. Also the logical expiry
    /// for local-storage records, which the backend itself never expires.
    #[serde(default = "default_cookie_lifetime_secs")]
    pub cookie_lifetime_secs: i64,
}

impl TrackerConfig {
    /// A config with defaults for everything but namespace and app id.
    pub fn new(namespace: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            app_id: app_id.into(),
            platform: default_platform(),
            anonymize: AnonymizationMode::default(),
            session_timeout_ms: default_session_timeout_ms(),
            storage: default_storage(),
            cookie_domain: None,
            cookie_path: default_cookie_path(),
            cookie_secure: default_cookie_secure(),
            cookie_same_site: default_same_site(),
            cookie_lifetime_secs: default_cookie_lifetime_secs(),
        }
    }

    /// Load configuration from a TOML file at the given path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| BeaconError::Config(format!("failed to parse config: {e}")))
    }

    /// Validate the configuration, returning an error for invalid values.
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(BeaconError::Config("namespace must not be empty".into()));
        }

        // The namespace lands in storage key names; keep it key-safe.
        if !self
            .namespace
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(BeaconError::Config(format!(
                "namespace may only contain ASCII alphanumerics, '-' and '_': {:?}",
                self.namespace
            )));
        }

        if self.app_id.is_empty() {
            return Err(BeaconError::Config("app_id must not be empty".into()));
        }

        if self.session_timeout_ms == 0 {
            return Err(BeaconError::Config(
                "session_timeout_ms must be greater than zero".into(),
            ));
        }

        if self.cookie_lifetime_secs <= 0 {
            return Err(BeaconError::Config(
                "cookie_lifetime_secs must be greater than zero".into(),
            ));
        }

        if self.storage == StorageStrategy::Cookie && self.cookie_path.is_empty() {
            return Err(BeaconError::Config(
                "cookie_path must not be empty when storage is cookie".into(),
            ));
        }

        Ok(())
    }
}
