//! Compile database records and the Windows command-line normalizer.
//!
//! Ninja on Windows produces `compile_commands.json` entries that clang
//! tooling struggles with: commands are prefixed by distributed-compilation
//! wrappers, lack a `--driver-mode=cl` selector, hide arguments in `@*.rsp`
//! response files and carry console-only MSVC flags. This crate rewrites
//! such a database into one clang tools can consume:
//!
//! - [`CompileRecord`] — one `directory`/`command`/`file` entry.
//! - [`Platform`] — only [`Platform::Windows`] databases are rewritten.
//! - [`Normalizer`] — applies [`command`] and [`rsp`] rules to every record and
//!   drops entries referencing [`EXCLUDED_ARTIFACTS`].
//!
//! # Example
//!
//! ```
//! use compdb_core::*;
//!
//! let db = vec![
//!     CompileRecord::new("C:/out", "gomacc.exe clang-cl.exe /showIncludes /c a.cc", "a.cc"),
//!     CompileRecord::new("C:/out", "clang-cl.exe /Fdobj/x_nacl.cc.pdb /c x.cc", "x.cc"),
//! ];
//!
//! let normalizer = Normalizer::new(NormalizeOptions::for_platform(Platform::Windows));
//! let out = normalizer.normalize(db);
//! assert_eq!(out.records.len(), 1);
//! assert_eq!(out.records[0].command, "clang-cl.exe --driver-mode=cl /c a.cc");
//! assert_eq!(out.report.filtered, 1);
//! ```

pub mod command;
mod normalize;
pub mod rsp;
mod types;

pub use command::{rewrite_compiler_invocation, strip_noise_flags};
pub use normalize::{
    EXCLUDED_ARTIFACTS, NormalizeOptions, NormalizeReport, Normalized, Normalizer, RecordOutcome,
    RspStatus, is_excluded_artifact, normalize_database,
};
pub use rsp::{ResponseFileReference, RspExpansion, expand_response_file, find_response_file};
pub use types::{CompileRecord, ParsePlatformError, Platform};
