//! Record sources: where a compile database comes from.
//!
//! A database is either read from `compile_commands.json` in a build
//! directory or produced on demand by running `ninja -t compdb`. Both are
//! [`RecordSource`]s, so callers never distinguish them.
//!
//! ```no_run
//! use compdb_loader::{FileSource, NinjaSource, RecordSource, SourceChain};
//!
//! // Prefer a fresh database from ninja, fall back to the file on disk.
//! let chain = SourceChain::new()
//!     .with(NinjaSource::new("out/Default"))
//!     .with(FileSource::in_build_dir("out/Default"));
//! let records = chain.load().unwrap();
//! println!("{} entries", records.len());
//! ```

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread::JoinHandle;
use std::time::Duration;

use compdb_core::CompileRecord;
use tracing::debug;
use wait_timeout::ChildExt;

use crate::config::GeneratorConfig;
use crate::error::{LoaderError, Result};
use crate::records::{DATABASE_FILE_NAME, parse_records, read_records};

/// Anything that can produce a compile database.
pub trait RecordSource {
    /// Produces the full record sequence.
    fn load(&self) -> Result<Vec<CompileRecord>>;

    /// Human-readable description used in logs and errors.
    fn describe(&self) -> String;
}

/// Reads a compile database JSON file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Reads exactly `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads `compile_commands.json` inside `build_dir`.
    pub fn in_build_dir(build_dir: impl AsRef<Path>) -> Self {
        Self::new(build_dir.as_ref().join(DATABASE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for FileSource {
    fn load(&self) -> Result<Vec<CompileRecord>> {
        debug!(path = %self.path.display(), "Reading compile database");
        read_records(&self.path)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Default ninja executable name for the host platform.
pub fn default_ninja() -> PathBuf {
    PathBuf::from(if cfg!(windows) { "ninja.exe" } else { "ninja" })
}

/// Default ninja rule names whose commands are exported.
pub const DEFAULT_LANGUAGES: &[&str] = &["cc", "cxx", "objc", "objcxx"];

/// Default limit on a ninja run.
pub const DEFAULT_GENERATOR_TIMEOUT_SECS: u64 = 300;

/// Generates a compile database with `ninja -C <dir> [targets] -t compdb <rules>`.
#[derive(Debug, Clone)]
pub struct NinjaSource {
    ninja: PathBuf,
    build_dir: PathBuf,
    targets: Vec<String>,
    languages: Vec<String>,
    timeout: Duration,
}

impl NinjaSource {
    /// Source for `build_dir` using the default ninja, rules and timeout.
    pub fn new(build_dir: impl Into<PathBuf>) -> Self {
        Self {
            ninja: default_ninja(),
            build_dir: build_dir.into(),
            targets: Vec::new(),
            languages: DEFAULT_LANGUAGES.iter().map(|l| l.to_string()).collect(),
            timeout: Duration::from_secs(DEFAULT_GENERATOR_TIMEOUT_SECS),
        }
    }

    /// Source for `build_dir` configured from `config`.
    pub fn from_config(build_dir: impl Into<PathBuf>, config: &GeneratorConfig) -> Self {
        Self {
            ninja: config.ninja.clone(),
            build_dir: build_dir.into(),
            targets: config.targets.clone(),
            languages: config.languages.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn with_ninja(mut self, ninja: impl Into<PathBuf>) -> Self {
        self.ninja = ninja.into();
        self
    }

    /// Adds extra targets passed to ninja before `-t compdb`.
    pub fn with_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets.extend(targets.into_iter().map(Into::into));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full argument list passed to ninja.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["-C".to_string(), self.build_dir.to_string_lossy().to_string()];
        args.extend(self.targets.iter().cloned());
        args.push("-t".to_string());
        args.push("compdb".to_string());
        args.extend(self.languages.iter().cloned());
        args
    }

    fn run(&self) -> Result<Vec<u8>> {
        let args = self.args();
        debug!(ninja = %self.ninja.display(), args = ?args, "Running compile database generator");

        let mut child = Command::new(&self.ninja)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| LoaderError::GeneratorSpawn {
                program: self.ninja.clone(),
                source,
            })?;

        // Drain both pipes while waiting so a full pipe buffer cannot stall ninja.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = match child.wait_timeout(self.timeout)? {
            Some(status) => status,
            None => {
                debug!(
                    timeout_secs = self.timeout.as_secs(),
                    "Generator timed out, killing process"
                );
                let _ = child.kill();
                let _ = child.wait();
                return Err(LoaderError::GeneratorTimeout(self.timeout.as_secs()));
            }
        };

        let stdout = collect(stdout)?;
        let stderr = collect(stderr)?;

        if !status.success() {
            return Err(LoaderError::GeneratorFailed {
                code: status.code(),
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }
        Ok(stdout)
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<std::io::Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn collect(handle: Option<JoinHandle<std::io::Result<Vec<u8>>>>) -> Result<Vec<u8>> {
    match handle {
        Some(handle) => match handle.join() {
            Ok(result) => Ok(result?),
            Err(_) => Err(LoaderError::IoError(std::io::Error::other(
                "generator output reader panicked",
            ))),
        },
        None => Ok(Vec::new()),
    }
}

impl RecordSource for NinjaSource {
    fn load(&self) -> Result<Vec<CompileRecord>> {
        let stdout = self.run()?;
        let raw = String::from_utf8(stdout).map_err(|err| {
            LoaderError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
        })?;
        parse_records(&raw)
    }

    fn describe(&self) -> String {
        format!("{} {}", self.ninja.display(), self.args().join(" "))
    }
}

/// Tries several sources in order; the first success wins.
#[derive(Default)]
pub struct SourceChain {
    sources: Vec<Box<dyn RecordSource>>,
}

impl SourceChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a source to the chain.
    pub fn with(mut self, source: impl RecordSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl RecordSource for SourceChain {
    /// Returns the first source that loads successfully.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::NoSourcesAvailable`] listing every failure when
    /// no source succeeds (or the chain is empty).
    fn load(&self) -> Result<Vec<CompileRecord>> {
        let mut failures = Vec::new();
        for source in &self.sources {
            match source.load() {
                Ok(records) => {
                    debug!(
                        source = %source.describe(),
                        entries = records.len(),
                        "Loaded compile database"
                    );
                    return Ok(records);
                }
                Err(err) => {
                    debug!(source = %source.describe(), error = %err, "Source failed, trying next");
                    failures.push(format!("{}: {err}", source.describe()));
                }
            }
        }
        Err(LoaderError::NoSourcesAvailable(failures))
    }

    fn describe(&self) -> String {
        self.sources
            .iter()
            .map(|s| s.describe())
            .collect::<Vec<_>>()
            .join(" | ")
    }
}
