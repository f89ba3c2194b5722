use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Workshop-level configuration, read from `.fixtrack/config.toml`.
///
/// Every field has a default so a missing file or a partial file both work.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProjectConfig {
    #[serde(default)]
    pub tickets: TicketConfig,
    #[serde(default)]
    pub lookup: LookupConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketConfig {
    /// Prefix for minted ticket numbers.
    #[serde(default = "default_prefix")]
    pub number_prefix: String,
    /// Attempts at minting a unique ticket number before giving up.
    #[serde(default = "default_retry_attempts")]
    pub create_retry_attempts: u32,
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            number_prefix: default_prefix(),
            create_retry_attempts: default_retry_attempts(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Page size applied when a caller does not pass an explicit limit.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
        }
    }
}

fn default_prefix() -> String {
    crate::ident::DEFAULT_TICKET_PREFIX.to_string()
}

const fn default_retry_attempts() -> u32 {
    3
}

const fn default_page_size() -> u32 {
    50
}

/// Load the project config, falling back to defaults when the file is
/// absent.
///
/// # Errors
///
/// Returns an error when the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".fixtrack/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Write the default config file if none exists yet. Used by `init`.
///
/// # Errors
///
/// Returns an error when the directory or file cannot be written.
pub fn write_default_config(project_root: &Path) -> Result<()> {
    let dir = project_root.join(".fixtrack");
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("create config directory {}", dir.display()))?;

    let path = dir.join("config.toml");
    if path.exists() {
        return Ok(());
    }

    let content = toml::to_string_pretty(&ProjectConfig::default())
        .context("serialize default config")?;
    std::fs::write(&path, content).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
