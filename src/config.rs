use crate::activity::DEFAULT_ACTIVITIES;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Theme at startup; toggling in the app is not written back.
    pub theme: Theme,
    pub data_dir: Option<PathBuf>,
    pub log_level: String,
    pub activities: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            theme: Theme::Dark,
            data_dir: None,
            log_level: "info".into(),
            activities: DEFAULT_ACTIVITIES.iter().map(|a| a.to_string()).collect(),
        }
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "daypad").context("locating config directory")?;
    Ok(dirs.config_dir().join("config.yml"))
}

/// Missing file means defaults; a file that exists must parse.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let data = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    if data.trim().is_empty() {
        return Ok(Config::default());
    }
    let config: Config = serde_yaml::from_str(&data)
        .with_context(|| format!("parsing config file {:?}", path))?;
    Ok(config)
}
