//! Response-file expansion.
//!
//! Ninja on Windows moves long argument lists into `@name.rsp` files, which
//! clang tooling does not read back. The first such reference in a command is
//! inlined; any later ones are left as they are.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::command::tokenize;

/// Extension a response-file token must end with.
pub const RSP_EXTENSION: &str = ".rsp";

/// A `@name.rsp` token found inside a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFileReference {
    /// File name as written after the `@`.
    pub name: String,
    /// Byte offset of the `@`.
    pub start: usize,
    /// Byte offset one past the end of the token.
    pub end: usize,
}

impl ResponseFileReference {
    /// Path of the response file relative to `directory`.
    pub fn resolve(&self, directory: impl AsRef<Path>) -> PathBuf {
        directory.as_ref().join(&self.name)
    }
}

/// Finds the first `@<name>.rsp` token in `command` that has whitespace on
/// both sides. A reference that ends the command is not recognized.
///
/// # Examples
///
/// ```
/// use compdb_core::rsp::find_response_file;
///
/// let found = find_response_file("clang-cl.exe @obj/a.rsp /c a.cc").unwrap();
/// assert_eq!(found.name, "obj/a.rsp");
/// assert_eq!(found.start, 13);
///
/// assert!(find_response_file("clang-cl.exe @.rsp /c").is_none());
/// assert!(find_response_file("clang-cl.exe -I@x.rsp").is_none());
/// assert!(find_response_file("clang-cl.exe /c a.cc @x.rsp").is_none());
/// ```
pub fn find_response_file(command: &str) -> Option<ResponseFileReference> {
    tokenize(command).into_iter().find_map(|token| {
        let name = token.text.strip_prefix('@')?;
        let delimited = token.end < command.len();
        if delimited && name.len() > RSP_EXTENSION.len() && name.ends_with(RSP_EXTENSION) {
            Some(ResponseFileReference {
                name: name.to_string(),
                start: token.start,
                end: token.end,
            })
        } else {
            None
        }
    })
}

/// Outcome of attempting to expand a response file.
#[derive(Debug)]
pub enum RspExpansion {
    /// The command had no response-file token.
    NotReferenced,
    /// The token was replaced by the file contents.
    Expanded { command: String, path: PathBuf },
    /// The file could not be read; the command is unchanged.
    Unreadable { path: PathBuf, error: io::Error },
}

impl RspExpansion {
    /// Returns the expanded command, or `original` when nothing was spliced.
    pub fn into_command(self, original: &str) -> String {
        match self {
            Self::Expanded { command, .. } => command,
            Self::NotReferenced | Self::Unreadable { .. } => original.to_string(),
        }
    }
}

/// Splices the contents of the first response file referenced by `command`.
///
/// The file is resolved against `directory`. Only the `@name.rsp` token is
/// replaced; the text around it is kept byte for byte. Invalid UTF-8 in the
/// file is replaced rather than rejected.
pub fn expand_response_file(command: &str, directory: impl AsRef<Path>) -> RspExpansion {
    let Some(reference) = find_response_file(command) else {
        return RspExpansion::NotReferenced;
    };
    let path = reference.resolve(directory);
    match fs::read(&path) {
        Ok(bytes) => {
            let contents = String::from_utf8_lossy(&bytes);
            let mut expanded = String::with_capacity(command.len() + contents.len());
            expanded.push_str(&command[..reference.start]);
            expanded.push_str(&contents);
            expanded.push_str(&command[reference.end..]);
            RspExpansion::Expanded {
                command: expanded,
                path,
            }
        }
        Err(error) => RspExpansion::Unreadable { path, error },
    }
}
