//! Loading, generating and writing compile databases.
//!
//! This crate supplies the records that [`compdb_core::Normalizer`] rewrites
//! and persists the result:
//!
//! - [`RecordSource`] — one capability, "produce the records", implemented by
//!   [`FileSource`] (reads `compile_commands.json`), [`NinjaSource`] (runs
//!   `ninja -t compdb`) and [`SourceChain`] (first success wins).
//! - [`parse_records`], [`read_records`], [`write_records`] — JSON I/O using
//!   the exact `directory`/`command`/`file` field names.
//! - [`Config`] — YAML configuration for platform, diagnostics and ninja.
//!
//! # Quick start
//!
//! ```no_run
//! use compdb_core::Normalizer;
//! use compdb_loader::{Config, FileSource, RecordSource, write_records};
//!
//! let config = Config::load("compdb.yml").unwrap();
//! let records = FileSource::in_build_dir("out/Default").load().unwrap();
//! let normalized = Normalizer::new(config.normalize_options()).normalize(records);
//! write_records(std::io::stdout(), &normalized.records).unwrap();
//! ```

mod config;
mod error;
mod records;
mod source;

pub use config::{CONFIG_FILE_NAME, Config, GeneratorConfig, PlatformSetting};
pub use error::{LoaderError, Result};
pub use records::{
    DATABASE_FILE_NAME, parse_records, read_records, read_records_from, save_records,
    write_records,
};
pub use source::{
    DEFAULT_GENERATOR_TIMEOUT_SECS, DEFAULT_LANGUAGES, FileSource, NinjaSource, RecordSource,
    SourceChain, default_ninja,
};
