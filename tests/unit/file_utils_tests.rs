/*!
 * Tests for file and directory utilities
 */

use mqm_ape::file_utils::FileManager;
use serde_json::json;

use crate::common::{create_temp_dir, create_test_file};

#[test]
fn test_readLines_withoutTrailingNewline_shouldKeepLastLine() {
    let dir = create_temp_dir().unwrap();
    let path = create_test_file(dir.path(), "tgt.txt", "first\nsecond").unwrap();

    let lines = FileManager::read_lines(&path).unwrap();
    assert_eq!(lines, vec!["first", "second"]);
}

#[test]
fn test_readLines_withMissingFile_shouldReportPath() {
    let dir = create_temp_dir().unwrap();
    let err = FileManager::read_lines(dir.path().join("missing.txt")).unwrap_err();
    assert!(err.to_string().contains("missing.txt"));
}

#[test]
fn test_writeJson_shouldWritePrettyJson() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("results.json");

    FileManager::write_json(&path, &json!([{ "MQM_APE_score": -5.0 }])).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("\n"));
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(value[0]["MQM_APE_score"], -5.0);
}

#[test]
fn test_writeLines_withNoItems_shouldWriteEmptyFile() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("omitted.txt");

    FileManager::write_lines::<_, String>(&path, &[]).unwrap();
    assert!(FileManager::file_exists(&path));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
}

#[test]
fn test_ensureDir_shouldBeIdempotent() {
    let dir = create_temp_dir().unwrap();
    let nested = dir.path().join("a/b/c");

    FileManager::ensure_dir(&nested).unwrap();
    FileManager::ensure_dir(&nested).unwrap();
    assert!(nested.is_dir());
    assert!(!FileManager::file_exists(&nested));
}
