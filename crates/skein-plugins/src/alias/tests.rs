//! Unit tests for alias tables.

use std::fs;
use std::path::Path;

use rstest::{fixture, rstest};

use super::*;
use crate::error::AliasError;

const DOCUMENT: &str = "\
aliases:
  my-alias:
    repository: git://example/plugin-a
    commit: abc123
  script:
    repository: https://github.com/bitrise-steplib/steps-script.git
    commit: 9d1c2f0
";

#[fixture]
fn table() -> AliasTable {
    AliasTable::from_yaml(Path::new("aliases.yml"), DOCUMENT).expect("document parses")
}

#[rstest]
fn parses_every_entry(table: AliasTable) {
    assert_eq!(table.len(), 2);
    assert!(!table.is_empty());
}

#[rstest]
fn resolves_known_alias(table: AliasTable) {
    let target = table.resolve("my-alias").expect("alias is known");
    assert_eq!(target.repository(), "git://example/plugin-a");
    assert_eq!(target.commit(), "abc123");
}

#[rstest]
#[case::unknown("not-an-alias")]
#[case::case_differs("My-Alias")]
#[case::empty("")]
fn unknown_names_are_not_errors(table: AliasTable, #[case] name: &str) {
    assert!(table.resolve(name).is_none());
}

#[rstest]
fn resolution_is_repeatable(table: AliasTable) {
    assert_eq!(table.resolve("script"), table.resolve("script"));
}

#[test]
fn empty_document_yields_empty_table() {
    let table = AliasTable::from_yaml(Path::new("aliases.yml"), "aliases: {}\n")
        .expect("document parses");
    assert!(table.is_empty());
}

#[test]
fn malformed_yaml_reports_origin() {
    let err = AliasTable::from_yaml(Path::new("broken.yml"), "aliases: [unterminated\n")
        .expect_err("document must fail");
    assert!(matches!(err, AliasError::Parse { .. }));
    assert!(
        err.to_string().contains("broken.yml"),
        "expected origin in message: {err}"
    );
}

#[rstest]
#[case::blank_repository("  repository: ''\n    commit: abc\n", "repository")]
#[case::blank_commit("  repository: git://example/p\n    commit: ' '\n", "commit")]
fn blank_fields_are_rejected(#[case] entry: &str, #[case] field: &str) {
    let text = format!("aliases:\n  broken:\n  {entry}");
    let err = AliasTable::from_yaml(Path::new("aliases.yml"), &text).expect_err("must fail");
    match err {
        AliasError::Invalid { name, message } => {
            assert_eq!(name, "broken");
            assert!(message.contains(field), "unexpected message: {message}");
        }
        other => panic!("expected Invalid, got {other:?}"),
    }
}

#[test]
fn unknown_fields_are_rejected() {
    let text = "aliases:\n  x:\n    repository: r\n    commit: c\n    branch: main\n";
    let err = AliasTable::from_yaml(Path::new("aliases.yml"), text).expect_err("must fail");
    assert!(matches!(err, AliasError::Parse { .. }));
}

#[test]
fn load_reads_file_from_disk() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("aliases.yml");
    fs::write(&path, DOCUMENT).expect("write alias file");
    let table = AliasTable::load(&path).expect("load alias file");
    assert!(table.resolve("my-alias").is_some());
}

#[test]
fn load_reports_missing_file() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let err = AliasTable::load(&dir.path().join("absent.yml")).expect_err("must fail");
    assert!(matches!(err, AliasError::Read { .. }));
}
