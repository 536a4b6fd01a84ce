//! TOML-backed configuration store for the CLI
//!
//! Holds the [`LibraryConfig`] values between runs. Access tokens never land here.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use gundeshapur_common::LibraryConfig;

/// Default config file name, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "gundeshapur.toml";

/// A config file on disk
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored values; a missing file is an empty configuration
    pub fn load(&self) -> Result<LibraryConfig> {
        if !self.path.exists() {
            return Ok(LibraryConfig::default());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }

    pub fn save(&self, config: &LibraryConfig) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(config).context("Failed to serialize configuration")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }

    /// Delete the file; returns whether there was one
    pub fn remove(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path)
            .with_context(|| format!("Failed to remove {}", self.path.display()))?;
        Ok(true)
    }
}

/// Build a fresh configuration from the setup answers.
///
/// Any previously connected spreadsheet is kept.
pub fn initialize(
    previous: LibraryConfig,
    api_key: &str,
    client_id: &str,
    admin_email: &str,
) -> Result<LibraryConfig> {
    if api_key.trim().is_empty() || client_id.trim().is_empty() {
        anyhow::bail!("Both API Key and Client ID are required.");
    }
    if admin_email.trim().is_empty() {
        anyhow::bail!("An administrator email is required.");
    }
    let mut config = LibraryConfig::new()
        .api_key(api_key.trim())
        .client_id(client_id.trim())
        .admin_email(admin_email.trim());
    config.spreadsheet_id = previous.spreadsheet_id;
    Ok(config)
}

/// Show only the tail of a secret
pub fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}
