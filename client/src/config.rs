//! Client configuration.
//!
//! Deployment details (program id, ballot address, network id) and the static
//! display strings the program does not store. Loaded from JSON; every field is
//! optional and falls back to [`ClientConfig::default`].

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// Id of the deployed `ballot` program (`5wQYNaQ8DgqpEqtpCHuYJBjoeGHsugiVhUWbDV5d3nBB`).
pub const DEFAULT_PROGRAM_ID: Pubkey = Pubkey::new_from_array([
    73, 94, 186, 171, 4, 27, 74, 13, 178, 112, 192, 118, 78, 77, 208, 232, 202, 108, 75, 186, 0,
    35, 197, 158, 230, 101, 128, 111, 71, 93, 127, 178,
]);

pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("`{field}` is not a valid address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("confirmation_timeout_secs must be greater than zero")]
    ZeroTimeout,
}

/// Per-candidate display metadata, keyed by candidate name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDisplay {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Static strings attached to every snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionDisplay {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub candidates: HashMap<String, CandidateDisplay>,
}

impl Default for ElectionDisplay {
    fn default() -> Self {
        Self {
            title: "Ballot".to_string(),
            description: "Each wallet can vote only once.".to_string(),
            candidates: HashMap::new(),
        }
    }
}

/// How long to wait for a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub program_id: Pubkey,
    /// Ballot account the gateway binds to. Without it, connecting only
    /// establishes the wallet session.
    pub ballot: Option<Pubkey>,
    pub confirmation: ConfirmationPolicy,
    /// Network id reported by local wallets.
    pub chain_id: u64,
    pub display: ElectionDisplay,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            program_id: DEFAULT_PROGRAM_ID,
            ballot: None,
            confirmation: ConfirmationPolicy::default(),
            chain_id: 0,
            display: ElectionDisplay::default(),
        }
    }
}

// On-disk shape; addresses stay strings until validated
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    program_id: Option<String>,
    ballot: Option<String>,
    confirmation_timeout_secs: Option<u64>,
    poll_interval_ms: Option<u64>,
    chain_id: Option<u64>,
    title: Option<String>,
    description: Option<String>,
    candidates: HashMap<String, CandidateDisplay>,
}

fn parse_address(field: &'static str, value: &str) -> Result<Pubkey, ConfigError> {
    Pubkey::from_str(value).map_err(|_| ConfigError::InvalidAddress {
        field,
        value: value.to_string(),
    })
}

impl ClientConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(text)?;
        let defaults = Self::default();

        let program_id = match raw.program_id.as_deref() {
            Some(value) => parse_address("program_id", value)?,
            None => defaults.program_id,
        };
        let ballot = raw
            .ballot
            .as_deref()
            .map(|value| parse_address("ballot", value))
            .transpose()?;

        let timeout = match raw.confirmation_timeout_secs {
            Some(0) => return Err(ConfigError::ZeroTimeout),
            Some(secs) => Duration::from_secs(secs),
            None => defaults.confirmation.timeout,
        };
        let poll_interval = raw
            .poll_interval_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.confirmation.poll_interval);

        Ok(Self {
            program_id,
            ballot,
            confirmation: ConfirmationPolicy {
                timeout,
                poll_interval,
            },
            chain_id: raw.chain_id.unwrap_or(defaults.chain_id),
            display: ElectionDisplay {
                title: raw.title.unwrap_or(defaults.display.title),
                description: raw.description.unwrap_or(defaults.display.description),
                candidates: raw.candidates,
            },
        })
    }

    pub fn with_ballot(mut self, ballot: Pubkey) -> Self {
        self.ballot = Some(ballot);
        self
    }
}
