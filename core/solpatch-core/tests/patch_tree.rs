/// End-to-end runs over small fixture trees: what changes, what must not,
/// and that a second pass finds nothing left to do.
use std::fs;
use std::path::Path;

use proptest::prelude::*;
use solpatch_core::rewrite::SourceDirRewrite;
use solpatch_core::{default_root, patch_tree, run, PatchOptions};

const UNPATCHED: &str = "\
cmake_minimum_required(VERSION 3.13.0)
include(${CMAKE_SOURCE_DIR}/cmake/EthCompilerSettings.cmake)
target_include_directories(foo PRIVATE ${CMAKE_SOURCE_DIR}/include)
set(X ${CMAKE_SOURCE_DIR}/solidity/src)
";

const PATCHED: &str = "\
cmake_minimum_required(VERSION 3.13.0)
include(${CMAKE_SOURCE_DIR}/solidity/cmake/EthCompilerSettings.cmake)
target_include_directories(foo PRIVATE ${CMAKE_SOURCE_DIR}/solidity/include)
set(X ${CMAKE_SOURCE_DIR}/solidity/src)
";

fn fixture(root: &Path) {
    let lib = root.join("libsolidity");
    fs::create_dir_all(&lib).unwrap();
    fs::write(root.join("CMakeLists.txt"), UNPATCHED).unwrap();
    fs::write(lib.join("CMakeLists.txt"), UNPATCHED).unwrap();
    fs::write(lib.join("notes.cmake"), UNPATCHED).unwrap();
}

#[test]
fn patches_every_build_file_under_the_root() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = default_root(temp.path());
    fixture(&root);

    let report = patch_tree(&root).expect("patch");

    assert_eq!(report.scanned, 2);
    assert_eq!(report.patches.len(), 2);
    assert_eq!(report.total_replacements(), 4);
    assert!(report.patches.iter().all(|p| p.written && p.lines_changed == 2));
    assert_eq!(fs::read_to_string(root.join("CMakeLists.txt")).unwrap(), PATCHED);
    assert_eq!(
        fs::read_to_string(root.join("libsolidity/CMakeLists.txt")).unwrap(),
        PATCHED
    );
}

#[test]
fn other_files_are_never_touched() {
    let temp = tempfile::tempdir().expect("tempdir");
    fixture(temp.path());

    patch_tree(temp.path()).expect("patch");

    assert_eq!(
        fs::read_to_string(temp.path().join("libsolidity/notes.cmake")).unwrap(),
        UNPATCHED
    );
}

#[test]
fn second_run_is_a_no_op() {
    let temp = tempfile::tempdir().expect("tempdir");
    fixture(temp.path());

    patch_tree(temp.path()).expect("first run");
    let top = temp.path().join("CMakeLists.txt");
    let mtime = fs::metadata(&top).unwrap().modified().unwrap();

    let report = patch_tree(temp.path()).expect("second run");

    assert_eq!(report.scanned, 2);
    assert!(report.patches.is_empty());
    assert_eq!(fs::read_to_string(&top).unwrap(), PATCHED);
    assert_eq!(fs::metadata(&top).unwrap().modified().unwrap(), mtime);
}

#[test]
fn dry_run_reports_without_writing() {
    let temp = tempfile::tempdir().expect("tempdir");
    fixture(temp.path());

    let opts = PatchOptions {
        dry_run: true,
        ..PatchOptions::default()
    };
    let report = run(&[temp.path()], &opts).expect("dry run");

    assert_eq!(report.patches.len(), 2);
    assert!(report.patches.iter().all(|p| !p.written));
    assert_eq!(
        fs::read_to_string(temp.path().join("CMakeLists.txt")).unwrap(),
        UNPATCHED
    );
}

#[cfg(unix)]
#[test]
fn walk_error_aborts_the_run() {
    use std::os::unix::fs::symlink;

    let temp = tempfile::tempdir().expect("tempdir");
    fixture(temp.path());
    symlink(temp.path().join("gone"), temp.path().join("dangling")).unwrap();

    let opts = PatchOptions {
        follow_symlinks: true,
        ..PatchOptions::default()
    };
    let err = run(&[temp.path()], &opts).expect_err("dangling symlink");

    assert!(err.to_string().contains("failed to walk"), "{err:#}");
    assert_eq!(
        fs::read_to_string(temp.path().join("CMakeLists.txt")).unwrap(),
        UNPATCHED
    );
}

#[test]
fn tree_without_build_files_changes_nothing() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(temp.path().join("docs")).unwrap();
    fs::write(temp.path().join("docs/index.rst"), "${CMAKE_SOURCE_DIR}\n").unwrap();

    let report = patch_tree(temp.path()).expect("patch");

    assert_eq!(report.scanned, 0);
    assert!(report.patches.is_empty());
}

#[test]
fn missing_root_is_an_empty_run() {
    let temp = tempfile::tempdir().expect("tempdir");
    let report = patch_tree(default_root(temp.path())).expect("patch");

    assert_eq!(report.scanned, 0);
}

fn cmake_line() -> impl Strategy<Value = String> {
    let piece = prop_oneof![
        Just("${CMAKE_SOURCE_DIR}".to_string()),
        Just("${CMAKE_SOURCE_DIR}/solidity".to_string()),
        Just("/solidity".to_string()),
        Just("/".to_string()),
        "[a-zA-Z_(){} .$]{0,8}",
    ];
    (prop::collection::vec(piece, 0..6), prop_oneof![Just(""), Just("\n"), Just("\r\n")])
        .prop_map(|(pieces, eol)| pieces.concat() + eol)
}

proptest! {
    #[test]
    fn rewriting_is_idempotent(lines in prop::collection::vec(cmake_line(), 0..8)) {
        let rule = SourceDirRewrite::new().expect("pattern");
        let input = lines.concat();

        let once = rule.rewrite(input.as_bytes());
        let twice = rule.rewrite(&once.bytes);

        prop_assert_eq!(twice.replacements, 0);
        prop_assert_eq!(&twice.bytes, &once.bytes);
    }

    #[test]
    fn each_replacement_adds_the_submodule_prefix(line in cmake_line()) {
        let rule = SourceDirRewrite::new().expect("pattern");
        let out = rule.rewrite(line.as_bytes());
        let text = String::from_utf8(out.bytes).expect("utf8");

        // Every rewritten occurrence grew by exactly `/solidity`.
        prop_assert_eq!(text.len(), line.len() + out.replacements * "/solidity".len());
        prop_assert_eq!(text.lines().count(), line.lines().count());
    }
}
