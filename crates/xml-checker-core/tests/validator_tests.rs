use std::fs;
use tempfile::tempdir;

use xml_checker_core::{validate, CheckFailure, Verdict};

#[test]
fn test_valid_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("valid.xml");
    fs::write(&path, "<root><child>text</child></root>").unwrap();

    let result = validate(&path);
    assert!(result.well_formed());
    assert_eq!(result.verdict(), &Verdict::WellFormed);
    assert_eq!(result.diagnostic(), None);
    assert_eq!(result.path(), path.as_path());
}

#[test]
fn test_malformed_files() {
    let dir = tempdir().unwrap();
    let cases = [
        ("unclosed.xml", "<root><child>text</root>"),
        ("truncated.xml", "<root><unclosed>"),
        ("half_tag.xml", "<root><chi"),
        ("empty.xml", ""),
        ("notxml.xml", "this is not xml at all"),
        ("two_roots.xml", "<a/><b/>"),
    ];

    for (name, content) in cases {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();

        let result = validate(&path);
        assert!(!result.well_formed(), "{name} should be malformed");
        assert!(
            matches!(result.failure(), Some(CheckFailure::Malformed { .. })),
            "{name}: {:?}",
            result.failure()
        );
        let diagnostic = result.diagnostic().unwrap();
        assert!(diagnostic.contains(name), "{diagnostic}");
        assert!(diagnostic.contains("XML is not well-formed"), "{diagnostic}");
    }
}

#[test]
fn test_nonexistent_file_is_access_failure() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nonexistent.xml");

    let result = validate(&path);
    assert!(!result.well_formed());
    assert!(matches!(result.failure(), Some(CheckFailure::Access { .. })));
    let diagnostic = result.diagnostic().unwrap();
    assert!(diagnostic.contains("nonexistent.xml"));
    assert!(diagnostic.contains("Unable to read file"));
    assert!(!diagnostic.contains("XML is not well-formed"));
}

#[test]
fn test_directory_is_access_failure() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("folder.xml");
    fs::create_dir(&path).unwrap();

    let result = validate(&path);
    assert!(matches!(result.failure(), Some(CheckFailure::Access { .. })));
}

#[test]
fn test_diagnostic_has_location() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("located.xml");
    fs::write(&path, "<root>\n  <a>\n  </b>\n</root>\n").unwrap();

    match validate(&path).failure() {
        Some(CheckFailure::Malformed { line, .. }) => assert_eq!(*line, 3),
        other => panic!("unexpected {other:?}"),
    }
}
