//! Client configuration with TOML and environment variable support.
//!
//! ```toml
//! rpc_endpoint = "https://rpc.gorbchain.xyz"
//!
//! [programs]
//! token_program_id = "2dwpmEaGB8euNCirbwWdumWUZFH3V91mbPjoFbWT24An"
//! associated_token_program_id = "BWBbPGpceCtFCUuMFjYUYpHEnagcT58bNi9c44VJ4rkW"
//!
//! [confirmation]
//! poll_interval_ms = 2000
//! max_attempts = 30
//! commitment = "confirmed"
//! backoff = "fixed"
//! ```

use std::path::Path;
use std::time::Duration;

use gorb_token::{address_to_bytes, ProgramConfig};
use serde::{Deserialize, Serialize};

use crate::confirm::{Backoff, ConfirmationConfig};
use crate::error::ClientError;
use crate::ledger::Commitment;

pub const DEFAULT_RPC_ENDPOINT: &str = "https://rpc.gorbchain.xyz";

pub const ENV_RPC_ENDPOINT: &str = "GORB_RPC_ENDPOINT";
pub const ENV_TOKEN_PROGRAM_ID: &str = "GORB_TOKEN_PROGRAM_ID";
pub const ENV_ATA_PROGRAM_ID: &str = "GORB_ATA_PROGRAM_ID";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    #[default]
    Fixed,
    Exponential,
}

/// Polling settings as written in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmationSettings {
    pub poll_interval_ms: u64,
    pub max_attempts: u32,
    pub commitment: Commitment,
    pub backoff: BackoffKind,
    /// Cap for exponential backoff.
    pub max_backoff_ms: u64,
}

impl Default for ConfirmationSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2_000,
            max_attempts: 30,
            commitment: Commitment::Confirmed,
            backoff: BackoffKind::Fixed,
            max_backoff_ms: 16_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub rpc_endpoint: String,
    pub programs: ProgramConfig,
    pub confirmation: ConfirmationSettings,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_endpoint: DEFAULT_RPC_ENDPOINT.to_string(),
            programs: ProgramConfig::gorbchain(),
            confirmation: ConfirmationSettings::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ClientError> {
        let config: ClientConfig = toml::from_str(contents)
            .map_err(|e| ClientError::Config(format!("failed to parse TOML config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file. Environment variables are not applied.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ClientError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ClientError::Config(format!(
                "failed to read config file {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Load from a TOML file, then apply environment overrides.
    pub fn from_file_with_env<P: AsRef<Path>>(path: P) -> Result<Self, ClientError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Override fields from `GORB_RPC_ENDPOINT`, `GORB_TOKEN_PROGRAM_ID` and
    /// `GORB_ATA_PROGRAM_ID`.
    pub fn apply_env_overrides(&mut self) -> Result<(), ClientError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Override fields from an arbitrary variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENV_RPC_ENDPOINT) {
            self.rpc_endpoint = endpoint;
        }

        if let Some(id) = lookup(ENV_TOKEN_PROGRAM_ID) {
            self.programs.token_program_id = address_to_bytes(&id)
                .map_err(|e| ClientError::Config(format!("invalid {ENV_TOKEN_PROGRAM_ID}: {e}")))?;
        }

        if let Some(id) = lookup(ENV_ATA_PROGRAM_ID) {
            self.programs.associated_token_program_id = address_to_bytes(&id)
                .map_err(|e| ClientError::Config(format!("invalid {ENV_ATA_PROGRAM_ID}: {e}")))?;
        }

        self.validate()
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.rpc_endpoint.is_empty() {
            return Err(ClientError::Config("rpc_endpoint must not be empty".into()));
        }
        if !self.rpc_endpoint.starts_with("http://") && !self.rpc_endpoint.starts_with("https://")
        {
            return Err(ClientError::Config(format!(
                "rpc_endpoint must be an http(s) URL, got {}",
                self.rpc_endpoint
            )));
        }

        let confirmation = &self.confirmation;
        if confirmation.poll_interval_ms == 0 {
            return Err(ClientError::Config("poll_interval_ms must be > 0".into()));
        }
        if confirmation.max_attempts == 0 {
            return Err(ClientError::Config("max_attempts must be > 0".into()));
        }
        if confirmation.backoff == BackoffKind::Exponential
            && confirmation.max_backoff_ms < confirmation.poll_interval_ms
        {
            return Err(ClientError::Config(
                "max_backoff_ms must be >= poll_interval_ms".into(),
            ));
        }

        self.programs
            .validate()
            .map_err(|e| ClientError::Config(e.to_string()))
    }

    pub fn confirmation_config(&self) -> ConfirmationConfig {
        let settings = &self.confirmation;
        let backoff = match settings.backoff {
            BackoffKind::Fixed => Backoff::Fixed,
            BackoffKind::Exponential => Backoff::Exponential {
                max: Duration::from_millis(settings.max_backoff_ms),
            },
        };

        ConfirmationConfig {
            poll_interval: Duration::from_millis(settings.poll_interval_ms),
            max_attempts: settings.max_attempts,
            commitment: settings.commitment,
            backoff,
        }
    }
}
