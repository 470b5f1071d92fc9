use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

fn compdb() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_compdb"));
    command.env_remove("RUST_LOG");
    command
}

fn run(args: &[&str], cwd: &Path) -> Output {
    compdb()
        .args(args)
        .current_dir(cwd)
        .output()
        .expect("failed to run compdb")
}

fn parse_output(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

/// Writes a Windows-style compile database and one response file into `dir`.
fn write_windows_build(dir: &Path) {
    let d = dir.to_string_lossy();
    fs::create_dir_all(dir.join("obj")).unwrap();
    fs::write(dir.join("obj").join("a.cc.rsp"), "-DA=1").unwrap();
    let db = serde_json::json!([
        {
            "directory": d,
            "command": r#""C:\goma\gomacc.exe" clang-cl.exe @obj/a.cc.rsp /nologo /c ../../a.cc"#,
            "file": "../../a.cc"
        },
        {
            "directory": d,
            "command": "clang-cl.exe /Fdobj/x_nacl_win64.cc.pdb /c ../../x.cc",
            "file": "../../x.cc"
        },
        {
            "directory": d,
            "command": "clang-cl.exe --driver-mode=cl /showIncludes /c ../../b.cc",
            "file": "../../b.cc",
            "output": "obj/b.obj"
        }
    ]);
    fs::write(
        dir.join("compile_commands.json"),
        serde_json::to_string_pretty(&db).unwrap(),
    )
    .unwrap();
}

// ---------------------------------------------------------------------------
// normalize
// ---------------------------------------------------------------------------

#[test]
fn normalize_windows_build_dir_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    write_windows_build(dir.path());

    let output = run(
        &[
            "normalize",
            "--build-dir",
            dir.path().to_str().unwrap(),
            "--platform",
            "windows",
        ],
        dir.path(),
    );
    assert!(output.status.success(), "normalize should succeed");

    let json = parse_output(&output);
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(
        entries[0]["command"],
        "clang-cl.exe --driver-mode=cl -DA=1 /c ../../a.cc"
    );
    assert_eq!(entries[1]["command"], "clang-cl.exe --driver-mode=cl /c ../../b.cc");
    assert_eq!(entries[1]["output"], "obj/b.obj");
    assert!(entries[0].get("output").is_none());
}

#[test]
fn normalize_other_platform_is_passthrough() {
    let dir = tempfile::tempdir().unwrap();
    write_windows_build(dir.path());
    let input = dir.path().join("compile_commands.json");

    let output = run(
        &[
            "normalize",
            "--input",
            input.to_str().unwrap(),
            "--platform",
            "other",
        ],
        dir.path(),
    );
    assert!(output.status.success());

    let original: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&input).unwrap()).unwrap();
    assert_eq!(parse_output(&output), original);
}

#[test]
fn normalize_writes_output_file_and_report() {
    let dir = tempfile::tempdir().unwrap();
    write_windows_build(dir.path());
    let out_path = dir.path().join("clean").join("compile_commands.json");

    let output = run(
        &[
            "normalize",
            "--build-dir",
            dir.path().to_str().unwrap(),
            "--platform",
            "windows",
            "--output",
            out_path.to_str().unwrap(),
            "--report",
        ],
        dir.path(),
    );
    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Entries read: 3"));
    assert!(stderr.contains("Filtered: 1"));
    assert!(stderr.contains("1 expanded, 0 unreadable"));

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out_path).unwrap()).unwrap();
    assert_eq!(written.as_array().unwrap().len(), 2);
}

#[test]
fn normalize_reads_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let mut child = compdb()
        .args(["normalize", "--input", "-", "--platform", "windows"])
        .current_dir(dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn compdb");
    let input = r#"[{"directory": "/o", "command": "gomacc.exe clang-cl.exe /c a.cc", "file": "a.cc"}]"#;
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    assert_eq!(
        parse_output(&output)[0]["command"],
        "clang-cl.exe --driver-mode=cl /c a.cc"
    );
}

#[test]
fn normalize_malformed_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.json");
    fs::write(&input, r#"{"not": "an array"}"#).unwrap();

    let output = run(
        &["normalize", "--input", input.to_str().unwrap(), "--platform", "windows"],
        dir.path(),
    );
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("error:"));
}

#[test]
fn normalize_requires_a_source() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(&["normalize"], dir.path());
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--build-dir or --input"));
}

#[test]
fn normalize_uses_config_platform() {
    let dir = tempfile::tempdir().unwrap();
    write_windows_build(dir.path());
    fs::write(dir.path().join("compdb.yml"), "version: \"1.0\"\nplatform: windows\n").unwrap();

    let output = run(
        &["normalize", "--build-dir", dir.path().to_str().unwrap()],
        dir.path(),
    );
    assert!(output.status.success());
    assert_eq!(parse_output(&output).as_array().unwrap().len(), 2);
}

#[test]
fn normalize_generate_falls_back_to_file() {
    let dir = tempfile::tempdir().unwrap();
    write_windows_build(dir.path());

    let output = run(
        &[
            "normalize",
            "--build-dir",
            dir.path().to_str().unwrap(),
            "--generate",
            "--fallback",
            "--ninja",
            "/nonexistent/compdb-test-ninja",
            "--platform",
            "windows",
        ],
        dir.path(),
    );
    assert!(output.status.success());
    assert_eq!(parse_output(&output).as_array().unwrap().len(), 2);
}

#[test]
fn normalize_generate_without_fallback_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_windows_build(dir.path());

    let output = run(
        &[
            "normalize",
            "--build-dir",
            dir.path().to_str().unwrap(),
            "--generate",
            "--ninja",
            "/nonexistent/compdb-test-ninja",
        ],
        dir.path(),
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("compdb-test-ninja"));
}

// ---------------------------------------------------------------------------
// rewrite
// ---------------------------------------------------------------------------

#[test]
fn rewrite_prints_normalized_command() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(
        &[
            "rewrite",
            "--platform",
            "windows",
            "--command",
            r#""gomacc.exe" C:\tools\clang-cl.exe /nologo /c foo.cc"#,
        ],
        dir.path(),
    );
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        r"C:\tools\clang-cl.exe --driver-mode=cl /c foo.cc"
    );
}

#[test]
fn rewrite_expands_response_file_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("args.rsp"), "-DFOO=1").unwrap();

    let output = run(
        &[
            "rewrite",
            "--platform",
            "windows",
            "--directory",
            dir.path().to_str().unwrap(),
            "--command",
            "clang-cl.exe @args.rsp /c foo.cc",
        ],
        dir.path(),
    );
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "clang-cl.exe --driver-mode=cl -DFOO=1 /c foo.cc"
    );
}

#[test]
fn rewrite_verbose_reports_unreadable_response_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(
        &[
            "rewrite",
            "-v",
            "--platform",
            "windows",
            "--command",
            "clang-cl.exe @missing.rsp /c foo.cc",
        ],
        dir.path(),
    );
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "clang-cl.exe --driver-mode=cl @missing.rsp /c foo.cc"
    );
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing.rsp"));
}

#[test]
fn rewrite_filtered_command_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(
        &[
            "rewrite",
            "--platform",
            "windows",
            "--command",
            "clang-cl.exe /Fdx_nacl.cc.pdb /c foo.cc",
        ],
        dir.path(),
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("filtered"));
}
