//! Named credential profiles for the Process API.
//!
//! Profiles live as top-level tables of a TOML file:
//!
//! ```toml
//! [cdse]
//! sh_client_id = "sh-1234"
//! sh_client_secret = "..."
//! sh_token_url = "https://identity.dataspace.copernicus.eu/auth/realms/CDSE/protocol/openid-connect/token"
//! sh_base_url = "https://sh.dataspace.copernicus.eu"
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CloudError, Result};

/// Copernicus Data Space Ecosystem OAuth token endpoint.
pub const CDSE_TOKEN_URL: &str =
    "https://identity.dataspace.copernicus.eu/auth/realms/CDSE/protocol/openid-connect/token";

/// Copernicus Data Space Ecosystem Sentinel Hub endpoint.
pub const CDSE_BASE_URL: &str = "https://sh.dataspace.copernicus.eu";

/// Conventional profile name for CDSE credentials.
pub const DEFAULT_PROFILE: &str = "cdse";

/// Connection settings for one Sentinel Hub deployment.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShConfig {
    pub sh_client_id: String,
    pub sh_client_secret: String,
    pub sh_token_url: String,
    pub sh_base_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Retries on transient failures
    pub max_retries: u32,
}

impl Default for ShConfig {
    fn default() -> Self {
        Self {
            sh_client_id: String::new(),
            sh_client_secret: String::new(),
            sh_token_url: CDSE_TOKEN_URL.to_string(),
            sh_base_url: CDSE_BASE_URL.to_string(),
            request_timeout_secs: 120,
            max_retries: 3,
        }
    }
}

impl ShConfig {
    /// CDSE endpoints with the given OAuth client credentials.
    pub fn cdse(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            sh_client_id: client_id.into(),
            sh_client_secret: client_secret.into(),
            ..Self::default()
        }
    }

    /// Whether both client id and secret are set.
    pub fn has_credentials(&self) -> bool {
        !self.sh_client_id.is_empty() && !self.sh_client_secret.is_empty()
    }

    /// Full URL of the Process API endpoint.
    pub fn process_url(&self) -> String {
        format!("{}/api/v1/process", self.sh_base_url.trim_end_matches('/'))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl fmt::Debug for ShConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secret = if self.sh_client_secret.is_empty() {
            ""
        } else {
            "<redacted>"
        };
        f.debug_struct("ShConfig")
            .field("sh_client_id", &self.sh_client_id)
            .field("sh_client_secret", &secret)
            .field("sh_token_url", &self.sh_token_url)
            .field("sh_base_url", &self.sh_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

/// A TOML file holding named [`ShConfig`] profiles.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config_dir>/forestwatch/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("forestwatch").join("config.toml"))
            .ok_or_else(|| CloudError::Config("cannot determine user config directory".into()))
    }

    /// Store at [`ConfigStore::default_path`].
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Self::default_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of all stored profiles, sorted.
    pub fn profiles(&self) -> Result<Vec<String>> {
        Ok(self.read_all()?.into_keys().collect())
    }

    /// Load the profile called `name`.
    pub fn load_profile(&self, name: &str) -> Result<ShConfig> {
        let mut profiles = self.read_all()?;
        let config = profiles.remove(name).ok_or_else(|| {
            CloudError::Config(format!(
                "profile '{}' not found in {}",
                name,
                self.path.display()
            ))
        })?;
        debug!(profile = name, path = %self.path.display(), "loaded profile");
        Ok(config)
    }

    /// Save `config` as profile `name`, keeping other profiles intact.
    pub fn save_profile(&self, name: &str, config: &ShConfig) -> Result<()> {
        if name.trim().is_empty() {
            return Err(CloudError::Config("profile name must not be empty".into()));
        }

        let mut profiles = self.read_all()?;
        profiles.insert(name.to_string(), config.clone());

        let text = toml::to_string_pretty(&profiles)
            .map_err(|e| CloudError::Config(format!("serializing profiles: {e}")))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, text)?;

        debug!(profile = name, path = %self.path.display(), "saved profile");
        Ok(())
    }

    fn read_all(&self) -> Result<BTreeMap<String, ShConfig>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        toml::from_str(&text).map_err(|e| {
            CloudError::Config(format!("parsing {}: {e}", self.path.display()))
        })
    }
}
