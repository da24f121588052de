//! Configuration for settlement flows

use crate::{Error, Result};
use ledger_core::{crypto::PublicKey, Party};
use serde::{Deserialize, Serialize};

/// Settlement configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// The only party whose cash is accepted
    pub issuer: Party,

    /// Vault paging
    #[serde(default)]
    pub paging: PagingConfig,

    /// Limits applied when accepting a new IOU
    #[serde(default)]
    pub iou: IouPolicy,
}

/// Vault paging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingConfig {
    /// States fetched per vault query while selecting cash
    pub page_size: usize,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self { page_size: 5 }
    }
}

/// Borrower-side acceptance policy for new IOUs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IouPolicy {
    /// Largest IOU value a borrower accepts
    pub max_value: i64,
}

impl Default for IouPolicy {
    fn default() -> Self {
        Self { max_value: 100 }
    }
}

impl Config {
    /// Defaults around a trusted issuer
    pub fn new(issuer: Party) -> Self {
        Self {
            issuer,
            paging: PagingConfig::default(),
            iou: IouPolicy::default(),
        }
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    ///
    /// `SETTLEMENT_ISSUER_NAME` and `SETTLEMENT_ISSUER_KEY` (hex) are required.
    pub fn from_env() -> Result<Self> {
        let name = required_var("SETTLEMENT_ISSUER_NAME")?;
        let key: PublicKey = required_var("SETTLEMENT_ISSUER_KEY")?
            .parse()
            .map_err(|e| Error::Config(format!("SETTLEMENT_ISSUER_KEY: {}", e)))?;

        let mut config = Config::new(Party::new(name, key));

        if let Ok(size) = std::env::var("SETTLEMENT_PAGE_SIZE") {
            config.paging.page_size = size
                .parse()
                .map_err(|e| Error::Config(format!("SETTLEMENT_PAGE_SIZE: {}", e)))?;
        }

        if let Ok(max) = std::env::var("SETTLEMENT_MAX_IOU_VALUE") {
            config.iou.max_value = max
                .parse()
                .map_err(|e| Error::Config(format!("SETTLEMENT_MAX_IOU_VALUE: {}", e)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the flows cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.paging.page_size == 0 {
            return Err(Error::Config("paging.page_size must be positive".to_string()));
        }
        if self.iou.max_value <= 0 {
            return Err(Error::Config("iou.max_value must be positive".to_string()));
        }
        Ok(())
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| Error::Config(format!("{} is not set", name)))
}
