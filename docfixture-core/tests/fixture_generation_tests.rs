//! End-to-end generation of the standard catalog into a directory

use docfixture::{FixtureCatalog, FixtureDrift, FixtureError, Validity, MANIFEST_FILE};
use pretty_assertions::assert_eq;
use sha2::{Digest, Sha256};
use std::fs;
use tempfile::TempDir;

fn generated_dir() -> TempDir {
    let temp_dir = tempfile::tempdir().unwrap();
    FixtureCatalog::standard()
        .generate(temp_dir.path())
        .expect("generation should succeed");
    temp_dir
}

#[test]
fn test_directory_contains_exactly_the_catalog() {
    let temp_dir = generated_dir();
    let mut on_disk: Vec<String> = fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    on_disk.sort();

    let mut expected: Vec<String> = FixtureCatalog::standard()
        .definitions()
        .iter()
        .map(|d| d.output_name.to_string())
        .collect();
    expected.sort();

    assert_eq!(on_disk, expected);
}

#[test]
fn test_regeneration_overwrites_with_identical_bytes() {
    let temp_dir = generated_dir();
    let before = fs::read(temp_dir.path().join("data.xlsx")).unwrap();

    fs::write(temp_dir.path().join("data.xlsx"), b"stale").unwrap();
    FixtureCatalog::standard().generate(temp_dir.path()).unwrap();

    let after = fs::read(temp_dir.path().join("data.xlsx")).unwrap();
    assert!(before == after, "regenerated workbook differs");
}

#[test]
fn test_unrelated_files_are_left_alone() {
    let temp_dir = tempfile::tempdir().unwrap();
    let note = temp_dir.path().join("README.txt");
    fs::write(&note, "keep me").unwrap();

    FixtureCatalog::standard().generate(temp_dir.path()).unwrap();
    assert_eq!(fs::read_to_string(&note).unwrap(), "keep me");
}

#[test]
fn test_manifest_digests_match_files() {
    let temp_dir = generated_dir();
    let catalog = FixtureCatalog::standard();
    catalog.write_manifest(temp_dir.path()).unwrap();

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(temp_dir.path().join(MANIFEST_FILE)).unwrap())
            .unwrap();

    for entry in manifest["fixtures"].as_array().unwrap() {
        let name = entry["name"].as_str().unwrap();
        let bytes = fs::read(temp_dir.path().join(name)).unwrap();
        assert_eq!(entry["size"].as_u64().unwrap() as usize, bytes.len(), "{name}");
        assert_eq!(
            entry["sha256"].as_str().unwrap(),
            hex::encode(Sha256::digest(&bytes)),
            "{name}"
        );
    }
}

#[test]
fn test_verify_ignores_manifest_and_extra_files() {
    let temp_dir = generated_dir();
    let catalog = FixtureCatalog::standard();
    catalog.write_manifest(temp_dir.path()).unwrap();
    fs::write(temp_dir.path().join("scratch.bin"), [0u8; 4]).unwrap();

    assert_eq!(catalog.verify(temp_dir.path()).unwrap(), Vec::<FixtureDrift>::new());
}

#[test]
fn test_verify_on_missing_directory_reports_everything() {
    let temp_dir = tempfile::tempdir().unwrap();
    let drift = FixtureCatalog::standard()
        .verify(temp_dir.path().join("never-created"))
        .unwrap();
    assert_eq!(drift.len(), 10);
    assert!(drift
        .iter()
        .all(|d| matches!(d, FixtureDrift::Missing { .. })));
}

#[test]
fn test_generation_into_a_file_path_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    let blocker = temp_dir.path().join("blocker");
    fs::write(&blocker, b"not a directory").unwrap();

    match FixtureCatalog::standard().generate(&blocker) {
        Err(FixtureError::Persist { path, .. }) => assert_eq!(path, blocker),
        other => panic!("expected persist error, got {other:?}"),
    }
}

#[test]
fn test_generated_sizes_by_validity() {
    let temp_dir = tempfile::tempdir().unwrap();
    let generated = FixtureCatalog::standard().generate(temp_dir.path()).unwrap();

    for fixture in &generated {
        match fixture.validity {
            // a real archive or PDF is well past the magic bytes and junk
            Validity::ValidWithText | Validity::ValidEmpty => {
                assert!(fixture.size > 100, "{} too small", fixture.name)
            }
            Validity::Corrupted => assert!(fixture.size < 64, "{} too large", fixture.name),
        }
    }
}
