//! Run configuration
//!
//! Loaded in two tiers:
//! 1. TOML file (missing keys fall back to defaults)
//! 2. `BRAINPRINT_*` environment variables

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::asymmetry::DistanceMetric;
use crate::command::FreeSurferTools;
use crate::error::{BrainprintError, Result};
use crate::spectrum::{Normalization, SpectrumOptions};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrainprintConfig {
    /// Number of eigenvalues to compute per surface
    pub num: usize,
    /// Skip white and pial cortical surfaces
    pub skip_cortex: bool,
    /// Skip the CerebNet lobule surfaces
    pub skip_cerebellum: bool,
    /// Compute left/right distances
    pub asymmetry: bool,
    pub asymmetry_distance: DistanceMetric,
    pub norm: Normalization,
    pub reweight: bool,
    /// Keep `<destination>/temp` after the run
    pub keep_temp: bool,
    /// Warn about structures whose labels are absent from the segmentation
    pub check_labels: bool,
    pub tools: FreeSurferTools,
}

impl Default for BrainprintConfig {
    fn default() -> Self {
        Self {
            num: 50,
            skip_cortex: false,
            skip_cerebellum: false,
            asymmetry: false,
            asymmetry_distance: DistanceMetric::Euclidean,
            norm: Normalization::None,
            reweight: false,
            keep_temp: false,
            check_labels: true,
            tools: FreeSurferTools::default(),
        }
    }
}

impl BrainprintConfig {
    pub fn spectrum_options(&self) -> SpectrumOptions {
        SpectrumOptions {
            num: self.num,
            norm: self.norm,
            reweight: self.reweight,
        }
    }
}

/// Parse configuration from TOML text.
pub fn parse_config(text: &str) -> Result<BrainprintConfig> {
    toml::from_str(text).map_err(|e| BrainprintError::Config(format!("Failed to parse config: {}", e)))
}

/// Load configuration from a TOML file, apply environment overrides and
/// validate the result.
pub fn load_config(path: &Path) -> Result<BrainprintConfig> {
    let content = fs::read_to_string(path)?;
    let mut config = parse_config(&content)?;
    apply_environment_overrides(&mut config)?;
    validate_config(&config)?;
    Ok(config)
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(BrainprintError::Config(format!("{} must be a boolean, got '{}'", key, value))),
    }
}

/// Apply `BRAINPRINT_*` environment variable overrides.
///
/// Supported: `BRAINPRINT_NUM`, `BRAINPRINT_SKIP_CORTEX`,
/// `BRAINPRINT_SKIP_CEREBELLUM`, `BRAINPRINT_ASYMMETRY`,
/// `BRAINPRINT_ASYMMETRY_DISTANCE`, `BRAINPRINT_NORM`,
/// `BRAINPRINT_REWEIGHT`, `BRAINPRINT_KEEP_TEMP`, `BRAINPRINT_CHECK_LABELS`.
pub fn apply_environment_overrides(config: &mut BrainprintConfig) -> Result<()> {
    apply_overrides(config, |key| env::var(key).ok())
}

fn apply_overrides<F>(config: &mut BrainprintConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("BRAINPRINT_NUM") {
        config.num = v
            .parse()
            .map_err(|_| BrainprintError::Config(format!("BRAINPRINT_NUM must be an integer, got '{}'", v)))?;
    }
    let flags: [(&str, &mut bool); 6] = [
        ("BRAINPRINT_SKIP_CORTEX", &mut config.skip_cortex),
        ("BRAINPRINT_SKIP_CEREBELLUM", &mut config.skip_cerebellum),
        ("BRAINPRINT_ASYMMETRY", &mut config.asymmetry),
        ("BRAINPRINT_REWEIGHT", &mut config.reweight),
        ("BRAINPRINT_KEEP_TEMP", &mut config.keep_temp),
        ("BRAINPRINT_CHECK_LABELS", &mut config.check_labels),
    ];
    for (key, slot) in flags {
        if let Some(v) = lookup(key) {
            *slot = parse_bool(key, &v)?;
        }
    }
    if let Some(v) = lookup("BRAINPRINT_ASYMMETRY_DISTANCE") {
        config.asymmetry_distance = v.parse()?;
    }
    if let Some(v) = lookup("BRAINPRINT_NORM") {
        config.norm = v.parse()?;
    }
    Ok(())
}

pub fn validate_config(config: &BrainprintConfig) -> Result<()> {
    if config.num == 0 {
        return Err(BrainprintError::Config("num must be at least 1".to_string()));
    }
    if let Some(empty) = config.tools.programs().iter().find(|p| p.trim().is_empty()) {
        return Err(BrainprintError::Config(format!("empty tool name '{}'", empty)));
    }
    Ok(())
}
