//! Command-line rewrite rules.
//!
//! Commands are split on whitespace with byte spans preserved, so rewrites
//! can slice the original string instead of re-quoting it. No shell quoting
//! is interpreted: a Windows command line is not parsed the same way by any
//! POSIX splitter, and clang-cl paths are assumed to contain no spaces.

/// Wrapper executables stripped from the front of a compiler invocation.
pub const KNOWN_WRAPPERS: &[&str] = &["gomacc.exe"];

/// Substring identifying the compiler token.
pub const COMPILER_MARKER: &str = "clang";

/// Driver-mode flag injected when the command does not select one.
pub const DRIVER_MODE_FLAG: &str = "--driver-mode=cl";

/// Spellings that mark an explicit driver-mode selection.
const DRIVER_MODE_MARKERS: &[&str] = &["--driver_mode", "--driver-mode"];

/// Visual Studio flags that only affect console output.
pub const NOISE_FLAGS: &[&str] = &["/nologo", "/showIncludes"];

/// One whitespace-delimited token and its byte range in the source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Splits `command` on whitespace, keeping byte offsets.
///
/// # Examples
///
/// ```
/// use compdb_core::command::tokenize;
///
/// let tokens = tokenize("  clang-cl  /c a.cc");
/// assert_eq!(tokens.len(), 3);
/// assert_eq!(tokens[0].text, "clang-cl");
/// assert_eq!(tokens[0].start, 2);
/// assert_eq!(tokens[2].end, 19);
/// ```
pub fn tokenize(command: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (idx, ch) in command.char_indices() {
        match (ch.is_whitespace(), start) {
            (true, Some(s)) => {
                tokens.push(Token {
                    text: &command[s..idx],
                    start: s,
                    end: idx,
                });
                start = None;
            }
            (false, None) => start = Some(idx),
            _ => {}
        }
    }
    if let Some(s) = start {
        tokens.push(Token {
            text: &command[s..],
            start: s,
            end: command.len(),
        });
    }
    tokens
}

/// A command split into wrapper prefix, compiler token and arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerInvocation<'a> {
    /// Text preceding the compiler token (the wrapper), if any.
    pub wrapper: Option<&'a str>,
    /// The compiler executable token.
    pub compiler: &'a str,
    /// Everything after the compiler token, leading whitespace removed.
    pub args: &'a str,
}

impl CompilerInvocation<'_> {
    /// Returns `true` when the arguments already select a driver mode.
    pub fn has_driver_mode(&self) -> bool {
        DRIVER_MODE_MARKERS
            .iter()
            .any(|marker| self.args.contains(marker))
    }

    /// Rebuilds the command as `<compiler> <driver-mode> <args>`.
    ///
    /// The driver-mode slot is left empty when the arguments already carry
    /// one, which leaves a double space for the noise-flag pass to collapse.
    pub fn rebuild(&self) -> String {
        let driver_mode = if self.has_driver_mode() {
            ""
        } else {
            DRIVER_MODE_FLAG
        };
        [self.compiler, driver_mode, self.args].join(" ")
    }
}

fn is_wrapper_token(token: &str) -> bool {
    let token = token.strip_suffix('"').unwrap_or(token);
    KNOWN_WRAPPERS.iter().any(|wrapper| token.ends_with(wrapper))
}

/// Splits `command` into wrapper, compiler and arguments.
///
/// A wrapper is everything up to and including a token ending in one of
/// [`KNOWN_WRAPPERS`] (a trailing `"` is allowed for quoted paths). When
/// several wrapper tokens appear, the last one followed by a compiler token
/// wins. Without a wrapper, the compiler must be the first token. The
/// compiler token must be followed by whitespace; the arguments may be empty.
///
/// # Examples
///
/// ```
/// use compdb_core::command::parse_compiler_invocation;
///
/// let parsed = parse_compiler_invocation(r#""C:\goma\gomacc.exe" clang-cl.exe /c a.cc"#).unwrap();
/// assert_eq!(parsed.wrapper, Some(r#""C:\goma\gomacc.exe""#));
/// assert_eq!(parsed.compiler, "clang-cl.exe");
/// assert_eq!(parsed.args, "/c a.cc");
///
/// assert!(parse_compiler_invocation("cl.exe /c a.cc").is_none());
/// ```
pub fn parse_compiler_invocation(command: &str) -> Option<CompilerInvocation<'_>> {
    let tokens = tokenize(command);

    let wrapped = tokens
        .iter()
        .enumerate()
        .rev()
        .filter(|(_, token)| is_wrapper_token(token.text))
        .find_map(|(idx, wrapper)| {
            invocation_at(command, &tokens, idx + 1)
                .map(|inv| CompilerInvocation {
                    wrapper: Some(command[..wrapper.end].trim_start()),
                    ..inv
                })
        });

    wrapped.or_else(|| invocation_at(command, &tokens, 0))
}

fn invocation_at<'a>(
    command: &'a str,
    tokens: &[Token<'a>],
    idx: usize,
) -> Option<CompilerInvocation<'a>> {
    let compiler = tokens.get(idx)?;
    if !compiler.text.contains(COMPILER_MARKER) {
        return None;
    }
    let rest = &command[compiler.end..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(CompilerInvocation {
        wrapper: None,
        compiler: compiler.text,
        args: rest.trim_start(),
    })
}

/// Strips a wrapper prefix and injects `--driver-mode=cl` when needed.
///
/// Returns `None` when `command` does not look like a clang invocation.
///
/// # Examples
///
/// ```
/// use compdb_core::command::rewrite_compiler_invocation;
///
/// let rewritten = rewrite_compiler_invocation("gomacc.exe clang-cl.exe /c a.cc").unwrap();
/// assert_eq!(rewritten, "clang-cl.exe --driver-mode=cl /c a.cc");
/// ```
pub fn rewrite_compiler_invocation(command: &str) -> Option<String> {
    parse_compiler_invocation(command).map(|inv| inv.rebuild())
}

/// Removes [`NOISE_FLAGS`] tokens and collapses whitespace to single spaces.
///
/// Only exact token matches are removed.
///
/// # Examples
///
/// ```
/// use compdb_core::command::strip_noise_flags;
///
/// assert_eq!(strip_noise_flags("cl  /nologo /c\ta.cc /showIncludes"), "cl /c a.cc");
/// assert_eq!(strip_noise_flags("cl /nologorotate"), "cl /nologorotate");
/// ```
pub fn strip_noise_flags(command: &str) -> String {
    command
        .split_whitespace()
        .filter(|arg| !NOISE_FLAGS.contains(arg))
        .collect::<Vec<_>>()
        .join(" ")
}
