use crate::util::errors::{IdentityError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Env var that forces full logical ids into member summaries
pub const SHOW_LOGICAL_IDS_ENV: &str = "MEMBER_IDENTITY_SHOW_LOGICAL_IDS";

/// Upper bound on any decoded length prefix
pub const DEFAULT_MAX_ARRAY_LEN: usize = 1024 * 1024;

static CURRENT: OnceLock<IdentityConfig> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Print full logical ids in `Display` output instead of a redacted marker
    #[serde(default)]
    pub show_logical_ids: bool,

    /// Largest array or string length a decoder accepts
    #[serde(default = "default_max_array_len")]
    pub max_array_len: usize,

    /// Directory holding the persisted local identity
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_max_array_len() -> usize {
    DEFAULT_MAX_ARRAY_LEN
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            show_logical_ids: false,
            max_array_len: default_max_array_len(),
            data_dir: default_data_dir(),
        }
    }
}

impl IdentityConfig {
    /// Load configuration from a TOML file, then apply env overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|e| {
            IdentityError::InvalidConfig(format!("Failed to read config file: {}", e))
        })?;

        let mut config: IdentityConfig = toml::from_str(&contents)?;
        config.apply_env();
        config.validate()?;

        tracing::info!(
            "Loaded identity config from {}: show_logical_ids={}, max_array_len={}",
            path.as_ref().display(),
            config.show_logical_ids,
            config.max_array_len
        );

        Ok(config)
    }

    /// Defaults plus env overrides
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(value) = std::env::var(SHOW_LOGICAL_IDS_ENV) {
            self.show_logical_ids = parse_flag(&value);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_array_len == 0 {
            return Err(IdentityError::InvalidConfig(
                "max_array_len must be greater than zero".to_string(),
            ));
        }

        if self.max_array_len > i32::MAX as usize {
            return Err(IdentityError::InvalidConfig(
                "max_array_len cannot exceed i32::MAX".to_string(),
            ));
        }

        if self.data_dir.as_os_str().is_empty() {
            return Err(IdentityError::InvalidConfig(
                "data_dir cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Install the process-wide config. Only the first call takes effect.
pub fn init(config: IdentityConfig) -> bool {
    match CURRENT.set(config) {
        Ok(()) => true,
        Err(_) => {
            tracing::warn!("Identity config already initialized, ignoring new value");
            false
        }
    }
}

/// The installed config, or defaults with env overrides if `init` never ran.
pub fn current() -> &'static IdentityConfig {
    CURRENT.get_or_init(IdentityConfig::from_env)
}
