//! Client configuration.
//!
//! Stored as JSON in the data directory (`~/.lunarflow/config.json` by
//! default):
//! ```json
//! { "baseUrl": "http://localhost:8088", "userId": "me@example.com", "timeoutSecs": 120 }
//! ```
//! Every field is optional in the file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{ClientError, Result};

pub const CONFIG_FILE: &str = "config.json";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8088";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
  pub base_url: String,
  pub user_id: String,
  pub timeout_secs: u64,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      base_url: DEFAULT_BASE_URL.to_string(),
      user_id: String::new(),
      timeout_secs: DEFAULT_TIMEOUT_SECS,
    }
  }
}

impl ClientConfig {
  pub fn new(base_url: impl Into<String>, user_id: impl Into<String>) -> Self {
    Self {
      base_url: base_url.into(),
      user_id: user_id.into(),
      ..Self::default()
    }
  }

  /// Read `config.json` from a data directory. A missing file yields the
  /// defaults.
  pub fn load(data_dir: &Path) -> Result<Self> {
    let path = data_dir.join(CONFIG_FILE);
    if !path.exists() {
      debug!(path = %path.display(), "config_defaulted");
      return Ok(Self::default());
    }

    let content = std::fs::read_to_string(&path).map_err(|e| ClientError::Config {
      message: format!("failed to read {}: {}", path.display(), e),
    })?;

    serde_json::from_str(&content).map_err(|e| ClientError::Config {
      message: format!("failed to parse {}: {}", path.display(), e),
    })
  }

  /// Replace fields with the given overrides when present.
  pub fn with_overrides(mut self, base_url: Option<String>, user_id: Option<String>) -> Self {
    if let Some(base_url) = base_url {
      self.base_url = base_url;
    }
    if let Some(user_id) = user_id {
      self.user_id = user_id;
    }
    self
  }

  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }

  /// Parse and check the configuration before building a client.
  pub fn validate(&self) -> Result<Url> {
    if self.user_id.trim().is_empty() {
      return Err(ClientError::Config {
        message: "user id is required".to_string(),
      });
    }

    let mut base_url = Url::parse(&self.base_url)?;
    // Joining relative paths needs a trailing slash on the base.
    if !base_url.path().ends_with('/') {
      let path = format!("{}/", base_url.path());
      base_url.set_path(&path);
    }
    Ok(base_url)
  }
}
