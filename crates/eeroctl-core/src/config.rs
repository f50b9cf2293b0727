//! Application configuration management.
//!
//! This module handles loading the application configuration:
//! the API endpoint, the fixed client identification headers, where the
//! session cookie jar lives, and the named profiles the bridge controls.
//!
//! Configuration is stored at `~/.config/eeroctl/config.json`. A few
//! settings can be overridden from the environment (or a `.env` file).

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::api::ResourceRef;

/// Application name used for config/state directory paths
const APP_NAME: &str = "eeroctl";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_API_ENDPOINT: &str = "https://api-user.e2ro.com";
const DEFAULT_API_VERSION: &str = "2.2";

/// Per-request timeout in milliseconds
const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Seconds between paused-state polls
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Polls before giving up (30 minutes at the default interval)
const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 30;

pub const ENV_API_ENDPOINT: &str = "EERO_API_ENDPOINT";
pub const ENV_STATE_DIR: &str = "EERO_STATE_DIR";
pub const ENV_NETWORK_ID: &str = "EERO_NETWORK_ID";

/// Set by Heroku dynos, where only `/tmp` is writable
const ENV_DYNO: &str = "DYNO";

/// Client identification sent on every request. Fixed, never negotiated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientIdentity {
    pub user_agent: String,
    pub version: String,
    pub os: String,
    pub os_version: String,
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self {
            user_agent: "eero/6.63.0 (iPhone; iOS 17.0; Scale/2.00)".to_string(),
            version: "6.63.0".to_string(),
            os: "ios".to_string(),
            os_version: "17.0".to_string(),
        }
    }
}

/// A profile addressable by a short key, e.g. `living-room`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedProfile {
    /// Display name used in messages
    pub name: String,
    pub profile_url: ResourceRef,
}

impl NamedProfile {
    /// Network owning the profile, read off `/<ver>/networks/<id>/profiles/<id>`
    pub fn network(&self) -> Option<ResourceRef> {
        let (network, _) = self.profile_url.as_str().rsplit_once("/profiles/")?;
        ResourceRef::parse(network).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub interval_secs: u64,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_endpoint: String,
    pub api_version: String,
    pub client: ClientIdentity,
    pub timeout_ms: u64,
    pub state_dir: Option<PathBuf>,
    pub network_id: Option<String>,
    pub profiles: BTreeMap<String, NamedProfile>,
    pub poll: PollConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            client: ClientIdentity::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            state_dir: None,
            network_id: None,
            profiles: BTreeMap::new(),
            poll: PollConfig::default(),
        }
    }
}

impl Config {
    /// Load from the config file, then apply environment overrides
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Apply overrides from a variable lookup (the process environment in practice)
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENV_API_ENDPOINT).filter(|v| !v.is_empty()) {
            self.api_endpoint = endpoint.trim_end_matches('/').to_string();
        }
        if let Some(dir) = lookup(ENV_STATE_DIR).filter(|v| !v.is_empty()) {
            self.state_dir = Some(PathBuf::from(dir));
        } else if self.state_dir.is_none() && lookup(ENV_DYNO).is_some() {
            self.state_dir = Some(PathBuf::from("/tmp"));
        }
        if let Some(id) = lookup(ENV_NETWORK_ID).filter(|v| !v.is_empty()) {
            self.network_id = Some(id);
        }
    }

    /// Writable directory holding the cookie jar
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(APP_NAME))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Reference of the configured network, if any
    pub fn network_ref(&self) -> Option<ResourceRef> {
        self.network_id.as_ref().and_then(|id| {
            ResourceRef::parse(&format!("/{}/networks/{}", self.api_version, id)).ok()
        })
    }

    pub fn profile(&self, key: &str) -> Option<&NamedProfile> {
        self.profiles.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_endpoint, "https://api-user.e2ro.com");
        assert_eq!(config.api_version, "2.2");
        assert_eq!(config.timeout(), Duration::from_millis(5000));
        assert_eq!(config.poll.interval(), Duration::from_secs(60));
        assert_eq!(config.poll.max_attempts, 30);
        assert_eq!(config.client.os, "ios");
        assert!(config.network_ref().is_none());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(lookup(&[
            (ENV_API_ENDPOINT, "http://localhost:9000/"),
            (ENV_STATE_DIR, "/var/lib/eeroctl"),
            (ENV_NETWORK_ID, "13591687"),
        ]));
        assert_eq!(config.api_endpoint, "http://localhost:9000");
        assert_eq!(config.state_dir(), PathBuf::from("/var/lib/eeroctl"));
        assert_eq!(
            config.network_ref().unwrap().as_str(),
            "/2.2/networks/13591687"
        );
    }

    #[test]
    fn test_dyno_uses_tmp() {
        let mut config = Config::default();
        config.apply_env(lookup(&[(ENV_DYNO, "web.1")]));
        assert_eq!(config.state_dir(), PathBuf::from("/tmp"));

        // An explicit setting wins over the Heroku default
        let mut config = Config {
            state_dir: Some(PathBuf::from("/data")),
            ..Config::default()
        };
        config.apply_env(lookup(&[(ENV_DYNO, "web.1")]));
        assert_eq!(config.state_dir(), PathBuf::from("/data"));
    }

    #[test]
    fn test_parse_partial_config_with_profiles() {
        let json = r#"{
            "network_id": "13591687",
            "profiles": {
                "den": { "name": "Den TV", "profile_url": "/2.2/networks/13591687/profiles/24696147" }
            },
            "poll": { "interval_secs": 5 }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.api_version, "2.2");
        assert_eq!(config.poll.interval_secs, 5);
        assert_eq!(config.poll.max_attempts, 30);
        let den = config.profile("den").unwrap();
        assert_eq!(den.name, "Den TV");
        assert_eq!(den.profile_url.id(), Some("24696147"));
        assert_eq!(den.network().unwrap().as_str(), "/2.2/networks/13591687");
        assert!(config.profile("attic").is_none());
    }

    #[test]
    fn test_rejects_malformed_profile_url() {
        let json = r#"{ "profiles": { "x": { "name": "X", "profile_url": "profiles/1" } } }"#;
        assert!(serde_json::from_str::<Config>(json).is_err());
    }
}
