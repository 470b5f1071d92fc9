//! JSON reading and writing of compile databases.

use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use compdb_core::CompileRecord;

use crate::error::{LoaderError, Result};

/// File name of a compile database inside a build directory.
pub const DATABASE_FILE_NAME: &str = "compile_commands.json";

/// Parses a JSON array of compile records.
///
/// # Errors
///
/// Returns [`LoaderError::JsonError`] when `raw` is not valid JSON or not an
/// array of `directory`/`command`/`file` objects.
///
/// # Examples
///
/// ```
/// use compdb_loader::parse_records;
///
/// let raw = r#"[{"directory": "/out", "command": "cc -c a.c", "file": "a.c"}]"#;
/// let records = parse_records(raw).unwrap();
/// assert_eq!(records[0].file, "a.c");
///
/// assert!(parse_records(r#"{"directory": "/out"}"#).is_err());
/// ```
pub fn parse_records(raw: &str) -> Result<Vec<CompileRecord>> {
    Ok(serde_json::from_str(raw)?)
}

/// Reads records from any reader.
pub fn read_records_from(reader: impl Read) -> Result<Vec<CompileRecord>> {
    Ok(serde_json::from_reader(BufReader::new(reader))?)
}

/// Reads records from a JSON file.
///
/// # Errors
///
/// Returns [`LoaderError::DatabaseNotFound`] when `path` does not exist,
/// [`LoaderError::IoError`] for other read failures and
/// [`LoaderError::JsonError`] for malformed content.
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<CompileRecord>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => LoaderError::DatabaseNotFound(path.to_path_buf()),
        _ => LoaderError::IoError(err),
    })?;
    read_records_from(file)
}

/// Writes records as pretty-printed JSON followed by a newline.
pub fn write_records(writer: impl Write, records: &[CompileRecord]) -> Result<()> {
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Writes records to `path`, creating parent directories as needed.
pub fn save_records(path: impl AsRef<Path>, records: &[CompileRecord]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    write_records(std::fs::File::create(path)?, records)
}
