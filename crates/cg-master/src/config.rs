//! Rack configuration loaded from TOML.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::HostError;

/// One generator instance in the rack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Short name or URI
    pub kind: String,
    /// Seed for the drum generator's regeneration dice
    #[serde(default)]
    pub seed: Option<u64>,
    /// Control values by symbol
    #[serde(default)]
    pub controls: BTreeMap<String, f32>,
}

impl GeneratorConfig {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            seed: None,
            controls: BTreeMap::new(),
        }
    }

    pub fn with_control(mut self, symbol: &str, value: f32) -> Self {
        self.controls.insert(symbol.to_string(), value);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RackConfig {
    #[serde(default = "RackConfig::default_sample_rate")]
    pub sample_rate: u32,
    /// Frames per generator run
    #[serde(default = "RackConfig::default_block_size")]
    pub block_size: u32,
    /// Extra frames rendered after the last input event
    #[serde(default)]
    pub tail_frames: u64,
    #[serde(default, rename = "generator")]
    pub generators: Vec<GeneratorConfig>,
}

impl RackConfig {
    fn default_sample_rate() -> u32 {
        48_000
    }
    fn default_block_size() -> u32 {
        256
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, HostError> {
        let config: Self = toml::from_str(text).map_err(|e| HostError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, HostError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), HostError> {
        if self.sample_rate == 0 {
            return Err(HostError::Config("sample_rate must be positive".into()));
        }
        if self.block_size == 0 {
            return Err(HostError::Config("block_size must be positive".into()));
        }
        Ok(())
    }
}

impl Default for RackConfig {
    fn default() -> Self {
        Self {
            sample_rate: Self::default_sample_rate(),
            block_size: Self::default_block_size(),
            tail_frames: 0,
            generators: Vec::new(),
        }
    }
}
