//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration comes from a TOML file (`orchard.toml`). Every
//! field has a built-in default, so a missing file is not an error: the
//! service logs a warning and starts with defaults.
//!
//! # Root folder priority
//!
//! 1. Command-line argument (highest priority)
//! 2. `ORCHARD_ROOT_FOLDER` environment variable
//! 3. `root_folder` in the TOML config file
//! 4. OS-dependent compiled default (fallback)

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::analysis::{
    AnalysisConfig, CatalogEntry, PageGeometry, RecommendationCatalog, UnknownCategoryPolicy,
};
use crate::{Error, Result};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "ORCHARD_ROOT_FOLDER";

/// Config file looked up inside the root folder
pub const CONFIG_FILE_NAME: &str = "orchard.toml";

/// Default HTTP port of orchard-ar
pub const DEFAULT_PORT: u16 = 5810;

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Root folder (priority 3, see module docs)
    pub root_folder: Option<PathBuf>,

    /// SQLite database file; relative paths resolve against the root folder
    pub database_path: PathBuf,

    /// Interface to bind the HTTP server to
    pub bind_address: String,

    /// HTTP server port
    pub port: u16,

    pub logging: LoggingConfig,

    pub auth: AuthConfig,

    pub analysis: AnalysisSection,

    /// Report page geometry
    pub report: PageGeometry,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            database_path: PathBuf::from("orchard.db"),
            bind_address: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            logging: LoggingConfig::default(),
            auth: AuthConfig::default(),
            analysis: AnalysisSection::default(),
            report: PageGeometry::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` wins when set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Session gate configuration
///
/// A single shared login. Disabled by default; when enabled both fields
/// must be non-empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub enabled: bool,
    pub email: String,
    pub password: String,
}

/// `[analysis]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnalysisSection {
    pub unknown_categories: UnknownCategoryPolicy,
    /// Replaces the built-in catalog when non-empty
    pub catalog: Vec<CatalogEntry>,
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded TOML configuration from {}", path.display());
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is missing
    ///
    /// A file that exists but does not parse is still an error.
    pub async fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            );
            return Ok(Self::default());
        }
        Self::load(path).await
    }

    fn validate(&self) -> Result<()> {
        if self.auth.enabled && (self.auth.email.trim().is_empty() || self.auth.password.is_empty()) {
            return Err(Error::Config(
                "auth.enabled requires auth.email and auth.password".to_string(),
            ));
        }
        let geometry = &self.report;
        if geometry.page_height <= geometry.top_margin + geometry.bottom_margin {
            return Err(Error::Config(
                "report.page_height must exceed the margins".to_string(),
            ));
        }
        if geometry.row_line_height <= 0.0 || geometry.row_padding < 0.0 {
            return Err(Error::Config(
                "report row sizes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the immutable analysis settings
    pub fn analysis_config(&self) -> Result<AnalysisConfig> {
        let catalog = if self.analysis.catalog.is_empty() {
            RecommendationCatalog::citrus_defaults()
        } else {
            RecommendationCatalog::new(self.analysis.catalog.clone())?
        };
        Ok(AnalysisConfig::new(catalog, self.analysis.unknown_categories))
    }

    /// Database path, resolved against the root folder when relative
    pub fn database_path_in(&self, root_folder: &Path) -> PathBuf {
        if self.database_path.is_absolute() {
            self.database_path.clone()
        } else {
            root_folder.join(&self.database_path)
        }
    }
}

/// Resolve the root folder following the module-level priority order
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml_value: Option<&Path>) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = toml_value {
        return path.to_path_buf();
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("orchard"))
        .unwrap_or_else(|| PathBuf::from("./orchard_data"))
}

/// Create the root folder if it does not exist yet
pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
        info!("Created root folder: {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.logging.level, "info");
        assert!(!config.auth.enabled);
        assert_eq!(config.analysis.unknown_categories, UnknownCategoryPolicy::Exclude);
    }

    #[test]
    fn test_empty_toml_is_all_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.database_path, PathBuf::from("orchard.db"));
        assert_eq!(config.report, PageGeometry::default());
    }

    #[test]
    fn test_relative_database_path_resolves_against_root() {
        let config = TomlConfig::default();
        assert_eq!(
            config.database_path_in(Path::new("/srv/orchard")),
            PathBuf::from("/srv/orchard/orchard.db")
        );
    }

    #[test]
    fn test_cli_root_folder_wins() {
        let resolved = resolve_root_folder(Some(Path::new("/from/cli")), Some(Path::new("/from/toml")));
        assert_eq!(resolved, PathBuf::from("/from/cli"));
    }
}
