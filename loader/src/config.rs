//! YAML configuration for compdb runs.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! platform: windows
//! diagnostics: true
//! generator:
//!   ninja: third_party/depot_tools/ninja.exe
//!   targets: [chrome]
//!   languages: [cc, cxx]
//!   timeout_secs: 600
//! ```
//!
//! Every field except `version` may be omitted. `platform` is `auto` or any
//! platform name: `windows`, `win`, `win32` and `win64` select Windows, other
//! names such as `linux` select the pass-through behavior.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use compdb_core::{NormalizeOptions, ParsePlatformError, Platform};
use serde::Deserialize;

use crate::error::{LoaderError, Result};
use crate::source::{DEFAULT_GENERATOR_TIMEOUT_SECS, DEFAULT_LANGUAGES, default_ninja};

/// Conventional configuration file name.
pub const CONFIG_FILE_NAME: &str = "compdb.yml";

/// Which platform to normalize for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlatformSetting {
    /// Use the platform this binary runs on.
    #[default]
    Auto,
    Windows,
    Other,
}

impl PlatformSetting {
    /// Resolves `Auto` to the host platform.
    pub fn resolve(self) -> Platform {
        match self {
            Self::Auto => Platform::host(),
            Self::Windows => Platform::Windows,
            Self::Other => Platform::Other,
        }
    }
}

impl From<Platform> for PlatformSetting {
    fn from(platform: Platform) -> Self {
        match platform {
            Platform::Windows => Self::Windows,
            Platform::Other => Self::Other,
        }
    }
}

impl FromStr for PlatformSetting {
    type Err = ParsePlatformError;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        if raw.trim().eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        raw.parse::<Platform>().map(Self::from)
    }
}

impl fmt::Display for PlatformSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Windows => write!(f, "windows"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Settings for generating a database with ninja.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Ninja executable.
    pub ninja: PathBuf,
    /// Extra targets passed before `-t compdb`.
    pub targets: Vec<String>,
    /// Ninja rule names to export.
    pub languages: Vec<String>,
    /// Seconds before the ninja process is killed.
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            ninja: default_ninja(),
            targets: Vec::new(),
            languages: DEFAULT_LANGUAGES.iter().map(|l| l.to_string()).collect(),
            timeout_secs: DEFAULT_GENERATOR_TIMEOUT_SECS,
        }
    }
}

/// Top-level configuration.
///
/// # Examples
///
/// ```
/// use compdb_loader::{Config, PlatformSetting};
///
/// let config = Config::from_yaml("version: \"1.0\"\nplatform: win64\n").unwrap();
/// assert_eq!(config.platform, PlatformSetting::Windows);
/// assert!(!config.diagnostics);
/// assert_eq!(config.generator.timeout_secs, 300);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Configuration format version (e.g. `"1.0"`).
    pub version: String,
    pub platform: PlatformSetting,
    /// Emit per-record diagnostics at `warn` level.
    pub diagnostics: bool,
    pub generator: GeneratorConfig,
}

/// On-disk shape of [`Config`]; `platform` stays a string until validated.
#[derive(Debug, Deserialize)]
struct RawConfig {
    version: String,
    #[serde(default)]
    platform: Option<String>,
    #[serde(default)]
    diagnostics: bool,
    #[serde(default)]
    generator: GeneratorConfig,
}

impl TryFrom<RawConfig> for Config {
    type Error = LoaderError;

    fn try_from(raw: RawConfig) -> Result<Self> {
        let platform = match raw.platform {
            Some(name) => name
                .parse::<PlatformSetting>()
                .map_err(|err| LoaderError::InvalidConfig(format!("platform: {err}")))?,
            None => PlatformSetting::default(),
        };
        Ok(Self {
            version: raw.version,
            platform,
            diagnostics: raw.diagnostics,
            generator: raw.generator,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            platform: PlatformSetting::default(),
            diagnostics: false,
            generator: GeneratorConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](LoaderError::IoError) if the file cannot be read,
    /// [`YamlError`](LoaderError::YamlError) if parsing fails, or
    /// [`InvalidConfig`](LoaderError::InvalidConfig) if a value is unusable.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parses and validates configuration from a YAML string.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let raw: RawConfig = serde_yaml::from_str(content)?;
        let config = Self::try_from(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values serde cannot.
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(LoaderError::InvalidConfig("version cannot be empty".into()));
        }
        if self.generator.timeout_secs == 0 {
            return Err(LoaderError::InvalidConfig(
                "generator.timeout_secs must be greater than 0".into(),
            ));
        }
        if self.generator.languages.is_empty() {
            return Err(LoaderError::InvalidConfig(
                "generator.languages cannot be empty".into(),
            ));
        }
        Ok(())
    }

    /// Platform to normalize for.
    pub fn resolve_platform(&self) -> Platform {
        self.platform.resolve()
    }

    /// Normalizer options derived from this configuration.
    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions::for_platform(self.resolve_platform()).with_diagnostics(self.diagnostics)
    }
}
