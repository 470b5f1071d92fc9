//! Per-record normalization and database post-filtering.
//!
//! ```
//! use compdb_core::{CompileRecord, NormalizeOptions, Platform, normalize_database};
//!
//! let records = vec![CompileRecord::new(
//!     "/out",
//!     "gomacc.exe clang-cl.exe /nologo /c ../a.cc",
//!     "../a.cc",
//! )];
//!
//! let options = NormalizeOptions::for_platform(Platform::Windows);
//! let windows = normalize_database(records.clone(), &options);
//! assert_eq!(windows[0].command, "clang-cl.exe --driver-mode=cl /c ../a.cc");
//!
//! let options = NormalizeOptions::for_platform(Platform::Other);
//! assert_eq!(normalize_database(records.clone(), &options), records);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::command::{parse_compiler_invocation, strip_noise_flags};
use crate::rsp::{RspExpansion, expand_response_file};
use crate::types::{CompileRecord, Platform};

/// Build artifacts from the NaCl toolchain that clang tooling cannot process.
pub const EXCLUDED_ARTIFACTS: &[&str] = &["_nacl.cc.pdb", "_nacl_win64.cc.pdb"];

/// Returns `true` when `command` references an excluded artifact.
pub fn is_excluded_artifact(command: &str) -> bool {
    EXCLUDED_ARTIFACTS
        .iter()
        .any(|artifact| command.contains(artifact))
}

/// Settings for a normalization run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeOptions {
    /// Platform the database targets; only Windows is rewritten.
    pub platform: Platform,
    /// Report per-record problems at `warn` level instead of `debug`.
    pub diagnostics: bool,
}

impl NormalizeOptions {
    /// Options for `platform` with diagnostics disabled.
    pub fn for_platform(platform: Platform) -> Self {
        Self {
            platform,
            diagnostics: false,
        }
    }

    /// Enables or disables diagnostics.
    pub fn with_diagnostics(mut self, diagnostics: bool) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}

/// Counters collected while normalizing a database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeReport {
    pub platform: Option<Platform>,
    pub records_read: usize,
    /// Commands matching the clang invocation shape.
    pub rewritten: usize,
    /// Commands left untouched because they did not match.
    pub unmatched: usize,
    pub rsp_expanded: usize,
    pub rsp_unreadable: usize,
    /// Records dropped by the excluded-artifact filter.
    pub filtered: usize,
    pub records_written: usize,
}

/// Normalized records together with the run report.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub records: Vec<CompileRecord>,
    pub report: NormalizeReport,
}

/// What happened to a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Rewritten { rsp: RspStatus },
    Unmatched,
}

/// Response-file handling for one rewritten record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RspStatus {
    None,
    Expanded,
    Unreadable,
}

/// Rewrites compile databases for clang tooling.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    options: NormalizeOptions,
}

impl Normalizer {
    pub fn new(options: NormalizeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &NormalizeOptions {
        &self.options
    }

    /// Normalizes a whole database.
    ///
    /// Non-Windows databases are returned unchanged. On Windows every record
    /// is rewritten, then records referencing [`EXCLUDED_ARTIFACTS`] are
    /// dropped. Order is preserved.
    pub fn normalize(&self, records: Vec<CompileRecord>) -> Normalized {
        let mut report = NormalizeReport {
            platform: Some(self.options.platform),
            records_read: records.len(),
            ..NormalizeReport::default()
        };

        if !self.options.platform.is_windows() {
            report.records_written = records.len();
            return Normalized { records, report };
        }

        debug!(entries = records.len(), "Read compile database entries");

        let rewritten: Vec<CompileRecord> = records
            .into_iter()
            .map(|record| {
                let (record, outcome) = self.normalize_record(record);
                match outcome {
                    RecordOutcome::Unmatched => report.unmatched += 1,
                    RecordOutcome::Rewritten { rsp } => {
                        report.rewritten += 1;
                        match rsp {
                            RspStatus::Expanded => report.rsp_expanded += 1,
                            RspStatus::Unreadable => report.rsp_unreadable += 1,
                            RspStatus::None => {}
                        }
                    }
                }
                record
            })
            .collect();

        let before = rewritten.len();
        let kept: Vec<CompileRecord> = rewritten
            .into_iter()
            .filter(|record| !is_excluded_artifact(&record.command))
            .collect();
        report.filtered = before - kept.len();
        report.records_written = kept.len();

        debug!(filtered = report.filtered, "Filtered excluded-artifact entries");

        Normalized {
            records: kept,
            report,
        }
    }

    /// Rewrites one record: wrapper stripping and driver mode, response-file
    /// expansion, then noise-flag removal.
    ///
    /// Applies regardless of the configured platform.
    pub fn normalize_record(&self, mut record: CompileRecord) -> (CompileRecord, RecordOutcome) {
        let Some(invocation) = parse_compiler_invocation(&record.command) else {
            self.diagnostic(|| {
                format!(
                    "compile command for '{}' didn't match the expected compiler invocation \
                     shape: {}",
                    record.file, record.command
                )
            });
            return (record, RecordOutcome::Unmatched);
        };
        let command = invocation.rebuild();

        let (command, rsp) = match expand_response_file(&command, &record.directory) {
            RspExpansion::NotReferenced => (command, RspStatus::None),
            RspExpansion::Expanded { command, path } => {
                debug!(file = %record.file, rsp = %path.display(), "Expanded response file");
                (command, RspStatus::Expanded)
            }
            RspExpansion::Unreadable { path, error } => {
                self.diagnostic(|| {
                    format!(
                        "couldn't read response file '{}' for '{}': {error}",
                        path.display(),
                        record.file
                    )
                });
                (command, RspStatus::Unreadable)
            }
        };

        record.command = strip_noise_flags(&command);
        (record, RecordOutcome::Rewritten { rsp })
    }

    fn diagnostic(&self, message: impl FnOnce() -> String) {
        if self.options.diagnostics {
            warn!("{}", message());
        } else {
            debug!("{}", message());
        }
    }
}

/// Normalizes `records` with `options`, discarding the report.
pub fn normalize_database(
    records: Vec<CompileRecord>,
    options: &NormalizeOptions,
) -> Vec<CompileRecord> {
    Normalizer::new(*options).normalize(records).records
}
