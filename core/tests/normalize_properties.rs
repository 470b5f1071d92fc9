//! End-to-end behavior of the normalizer on realistic Windows databases.

use std::fs;
use std::path::Path;

use compdb_core::{CompileRecord, NormalizeOptions, Normalizer, Platform, normalize_database};

fn windows() -> NormalizeOptions {
    NormalizeOptions::for_platform(Platform::Windows)
}

fn dir_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

// ---------------------------------------------------------------------------
// Platform gating
// ---------------------------------------------------------------------------

#[test]
fn test_other_platform_is_idempotent_identity() {
    let db = vec![
        CompileRecord::new("/b", r#""gomacc.exe" clang-cl.exe /nologo /c a.cc"#, "a.cc"),
        CompileRecord::new("/b", "clang++ -c @args.rsp b.cc", "b.cc"),
    ];
    let options = NormalizeOptions::for_platform(Platform::Other);
    let once = normalize_database(db.clone(), &options);
    let twice = normalize_database(once.clone(), &options);
    assert_eq!(once, db);
    assert_eq!(twice, once);
}

#[test]
fn test_empty_database() {
    assert!(normalize_database(Vec::new(), &windows()).is_empty());
    let other = NormalizeOptions::for_platform(Platform::Other);
    assert!(normalize_database(Vec::new(), &other).is_empty());
}

// ---------------------------------------------------------------------------
// Rewrite rules
// ---------------------------------------------------------------------------

#[test]
fn test_wrapper_is_stripped() {
    let out = normalize_database(
        vec![CompileRecord::new(
            "/b",
            r#""gomacc.exe" C:\tools\clang-cl.exe /c foo.cc"#,
            "foo.cc",
        )],
        &windows(),
    );
    assert!(out[0].command.starts_with(r"C:\tools\clang-cl.exe"));
    assert!(!out[0].command.contains("gomacc"));
}

#[test]
fn test_no_duplicate_driver_mode() {
    let out = normalize_database(
        vec![CompileRecord::new(
            "/b",
            "gomacc.exe clang-cl.exe /c --driver_mode=cl foo.cc",
            "foo.cc",
        )],
        &windows(),
    );
    let command = &out[0].command;
    let count = command.matches("--driver_mode").count() + command.matches("--driver-mode").count();
    assert_eq!(count, 1);
}

#[test]
fn test_noise_flags_removed_only_as_whole_tokens() {
    let out = normalize_database(
        vec![CompileRecord::new(
            "/b",
            "clang-cl.exe /nologo /showIncludes /nologorotate /c foo.cc",
            "foo.cc",
        )],
        &windows(),
    );
    assert_eq!(
        out[0].command,
        "clang-cl.exe --driver-mode=cl /nologorotate /c foo.cc"
    );
}

// ---------------------------------------------------------------------------
// Response files
// ---------------------------------------------------------------------------

#[test]
fn test_response_file_is_spliced() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("args.rsp"), "-DFOO=1").unwrap();

    let out = normalize_database(
        vec![CompileRecord::new(
            dir_string(dir.path()),
            "clang-cl.exe @args.rsp /c foo.cc",
            "foo.cc",
        )],
        &windows(),
    );
    assert!(out[0].command.contains("-DFOO=1"));
    assert!(!out[0].command.contains("@args.rsp"));
}

#[test]
fn test_missing_response_file_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let db = vec![
        CompileRecord::new(dir_string(dir.path()), "clang-cl.exe @args.rsp /c foo.cc", "foo.cc"),
        CompileRecord::new(dir_string(dir.path()), "clang-cl.exe /c bar.cc", "bar.cc"),
    ];

    let out = normalize_database(db, &windows().with_diagnostics(true));
    assert_eq!(out.len(), 2);
    assert_eq!(
        out[0].command,
        "clang-cl.exe --driver-mode=cl @args.rsp /c foo.cc"
    );
    assert_eq!(out[1].command, "clang-cl.exe --driver-mode=cl /c bar.cc");
}

#[test]
fn test_response_file_relative_to_record_directory() {
    let root = tempfile::tempdir().unwrap();
    let out_dir = root.path().join("out").join("Default");
    fs::create_dir_all(out_dir.join("obj")).unwrap();
    fs::write(out_dir.join("obj").join("base.rsp"), "/I../../base -DBASE").unwrap();

    let out = normalize_database(
        vec![CompileRecord::new(
            dir_string(&out_dir),
            r#""C:\goma\gomacc.exe" ..\..\third_party\llvm-build\bin\clang-cl.exe @obj/base.rsp /nologo /c ../../base/a.cc"#,
            "../../base/a.cc",
        )],
        &windows(),
    );
    assert_eq!(
        out[0].command,
        r"..\..\third_party\llvm-build\bin\clang-cl.exe --driver-mode=cl /I../../base -DBASE /c ../../base/a.cc"
    );
}

// ---------------------------------------------------------------------------
// Post-filtering
// ---------------------------------------------------------------------------

#[test]
fn test_excluded_artifacts_dropped_in_order() {
    let db = vec![
        CompileRecord::new("/b", "clang-cl.exe /c one.cc", "one.cc"),
        CompileRecord::new("/b", "clang-cl.exe /Fdobj/a_nacl.cc.pdb /c two.cc", "two.cc"),
        CompileRecord::new("/b", "clang-cl.exe /c three.cc", "three.cc"),
        CompileRecord::new("/b", "clang-cl.exe /Fdobj/b_nacl_win64.cc.pdb /c four.cc", "four.cc"),
        CompileRecord::new("/b", "clang-cl.exe /c five.cc", "five.cc"),
    ];

    let out = Normalizer::new(windows()).normalize(db);
    let files: Vec<&str> = out.records.iter().map(|r| r.file.as_str()).collect();
    assert_eq!(files, vec!["one.cc", "three.cc", "five.cc"]);
    assert_eq!(out.report.filtered, 2);
}
