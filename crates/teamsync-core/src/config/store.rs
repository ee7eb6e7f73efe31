//! Config store for loading and saving teamsync.toml.

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::{CONFIG_FILE_NAME, TeamsyncConfig, parser};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    /// Store at `<config dir>/teamsync/teamsync.toml`.
    pub fn default_location() -> anyhow::Result<Self> {
        let global_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("teamsync");
        Ok(Self::in_dir(&global_dir))
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::from_path(dir.join(CONFIG_FILE_NAME))
    }

    pub fn from_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the config, treating a missing file as empty.
    pub fn load(&self) -> anyhow::Result<TeamsyncConfig> {
        if !self.config_path.exists() {
            tracing::debug!(path = %self.config_path.display(), "No config file, using defaults");
            return Ok(TeamsyncConfig::default());
        }
        parser::parse_teamsync_toml(&self.config_path)
    }

    /// Write a fresh config file, refusing to replace an existing one unless `force` is set.
    pub fn init(&self, config: &TeamsyncConfig, force: bool) -> anyhow::Result<()> {
        if self.config_path.exists() && !force {
            anyhow::bail!(
                "Config file already exists: {} (use --force to overwrite)",
                self.config_path.display()
            );
        }
        self.save(config)?;
        tracing::info!(path = %self.config_path.display(), "Wrote config file");
        Ok(())
    }

    pub fn save(&self, config: &TeamsyncConfig) -> anyhow::Result<()> {
        config.validate()?;
        let content = parser::to_toml(config).context("Failed to serialize config to TOML")?;
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        std::fs::write(&self.config_path, content).with_context(|| {
            format!(
                "Failed to write config file: {}",
                self.config_path.display()
            )
        })?;
        Ok(())
    }
}
