//! Node configuration.
//!
//! Loaded from a TOML file; every section is optional and falls back to
//! defaults.

use std::collections::HashSet;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use stellar_core::user::normalize_email;
use stellar_core::{PlanetFields, Registration, Role};
use stellar_workflow::{EditPolicy, DEFAULT_MAX_IMAGE_BYTES};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub workflow: WorkflowConfig,
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Prefix of public image URLs.
    pub image_base_url: String,
    pub max_image_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            image_base_url: "http://localhost:9000/images".to_string(),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub edit_policy: EditPolicy,
}

/// Data loaded into the empty in-memory stores at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub planets: Vec<PlanetFields>,
    pub users: Vec<SeedUser>,
}

/// An account created at startup. The only way to get a moderator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedUser {
    pub full_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

impl SeedUser {
    pub fn registration(&self) -> Registration {
        Registration {
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }
}

impl NodeConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: NodeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be > 0".to_string()));
        }
        if self.storage.max_image_bytes == 0 {
            return Err(ConfigError::Invalid(
                "storage.max_image_bytes must be > 0".to_string(),
            ));
        }

        let mut emails = HashSet::new();
        for user in &self.seed.users {
            user.registration()
                .validate()
                .map_err(|e| ConfigError::Invalid(format!("seed.users: {e}")))?;
            if !emails.insert(normalize_email(&user.email)) {
                return Err(ConfigError::Invalid(format!(
                    "seed.users: duplicate email '{}'",
                    user.email
                )));
            }
        }

        for planet in &self.seed.planets {
            planet
                .validate()
                .map_err(|e| ConfigError::Invalid(format!("seed.planets: {e}")))?;
        }
        Ok(())
    }

    /// Address to bind.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("server address: {e}")))
    }
}
