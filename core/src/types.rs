//! Compile database data model.
//!
//! Records are serialized with the exact field names used by
//! `compile_commands.json` so that a normalized database stays readable by
//! every consumer of the original format.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One entry of a compile database.
///
/// # Examples
///
/// ```
/// use compdb_core::CompileRecord;
///
/// let record = CompileRecord::new("/out/Default", "clang-cl.exe /c ../../a.cc", "../../a.cc");
/// assert_eq!(record.directory, "/out/Default");
/// assert!(record.output.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileRecord {
    /// Working directory the command runs from.
    pub directory: String,
    /// Full command line used to compile `file`.
    pub command: String,
    /// Source file, possibly relative to `directory`.
    pub file: String,
    /// Object file produced by the command, when the generator reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl CompileRecord {
    /// Creates a record without an `output` field.
    pub fn new(
        directory: impl Into<String>,
        command: impl Into<String>,
        file: impl Into<String>,
    ) -> Self {
        Self {
            directory: directory.into(),
            command: command.into(),
            file: file.into(),
            output: None,
        }
    }
}

/// Platform the database is normalized for.
///
/// Normalization only rewrites commands for [`Platform::Windows`]; every
/// other platform passes the database through untouched.
///
/// # Examples
///
/// ```
/// use compdb_core::Platform;
///
/// assert_eq!("windows".parse::<Platform>().unwrap(), Platform::Windows);
/// assert_eq!("win32".parse::<Platform>().unwrap(), Platform::Windows);
/// assert_eq!("linux".parse::<Platform>().unwrap(), Platform::Other);
/// assert!("".parse::<Platform>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Windows-style toolchain (clang-cl, response files, goma wrappers).
    Windows,
    /// Any other platform.
    Other,
}

impl Platform {
    /// Platform this binary was compiled for.
    pub fn host() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Other
        }
    }

    /// Returns `true` for [`Platform::Windows`].
    pub fn is_windows(self) -> bool {
        matches!(self, Self::Windows)
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::host()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Windows => write!(f, "windows"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Error returned when a platform name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown platform '{0}'")]
pub struct ParsePlatformError(String);

impl FromStr for Platform {
    type Err = ParsePlatformError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let value = raw.trim().to_ascii_lowercase();
        match value.as_str() {
            "windows" | "win" | "win32" | "win64" => Ok(Self::Windows),
            "" => Err(ParsePlatformError(raw.to_string())),
            _ if value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') => {
                Ok(Self::Other)
            }
            _ => Err(ParsePlatformError(raw.to_string())),
        }
    }
}
