use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use brainwave::{AnalysisSettings, EffectParameters};

const CONFIG_FILE: &str = "brainwave.toml";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub analysis: AnalysisSettings,
    /// Baseline effect settings; presets and flags apply on top.
    #[serde(default)]
    pub effects: EffectParameters,
    #[serde(default)]
    pub reverb: ReverbConfig,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Directory for processed files; next to the input when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_suffix")]
    pub suffix: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReverbConfig {
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: None,
            suffix: default_suffix(),
        }
    }
}

fn default_suffix() -> String { "_processed".into() }

/// Explicit path, then `./brainwave.toml`, then `~/.config/brainwave/config.toml`,
/// then the platform config directory.
pub fn find_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from(CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("brainwave").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("brainwave").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Invalid config {}", path.display()))
}

fn parse_config(content: &str) -> Result<Config> {
    let mut config: Config = toml::from_str(content)?;
    config.analysis.validate()?;
    if config.effects.reverb_seed.is_none() {
        config.effects.reverb_seed = config.reverb.seed;
    }
    Ok(config)
}
