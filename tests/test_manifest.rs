//! Tests for loading manifests and configuration files from disk.

use figure_oxide::config::PlacementConfig;
use figure_oxide::document::ImageReinserter;
use figure_oxide::insertion::MarkdownImageMarker;
use figure_oxide::manifest::ImageManifest;
use figure_oxide::Error;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_load_manifest_object() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("manifest.json");
    fs::write(
        &path,
        r#"{
            "total_pages": 4,
            "images": [
                {"sequence_index": 1, "source_page": 1, "file_reference": "images/guide/image_001.png"},
                {"sequence_index": 2, "source_page": 4, "file_reference": "images/guide/image_002.png"}
            ]
        }"#,
    )
    .unwrap();

    let manifest = ImageManifest::load(&path).unwrap();
    assert_eq!(manifest.total_pages, Some(4));
    assert_eq!(manifest.images.len(), 2);
    assert_eq!(manifest.images[1].source_page, Some(4));
}

#[test]
fn test_load_manifest_array() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("images.json");
    fs::write(&path, r#"[{"sequence_index": 1, "file_reference": "a.png"}]"#).unwrap();

    let manifest = ImageManifest::load(&path).unwrap().with_total_pages(Some(7));
    assert_eq!(manifest.total_pages, Some(7));
    assert_eq!(manifest.images[0].source_page, None);
}

#[test]
fn test_missing_manifest_is_io_error() {
    let dir = TempDir::new().unwrap();
    let result = ImageManifest::load(dir.path().join("absent.json"));
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_manifest_and_config_drive_reinsertion() {
    let dir = TempDir::new().unwrap();
    let manifest_path = dir.path().join("manifest.json");
    let config_path = dir.path().join("placement.json");

    fs::write(
        &manifest_path,
        r#"{"total_pages": 2, "images": [
            {"sequence_index": 1, "source_page": 1, "file_reference": "img/1.png"},
            {"sequence_index": 2, "source_page": 2, "file_reference": "img/2.png"}
        ]}"#,
    )
    .unwrap();
    fs::write(&config_path, r#"{"fallback": {"snap_to_paragraph": false}}"#).unwrap();

    let manifest = ImageManifest::load(&manifest_path).unwrap();
    let config = PlacementConfig::from_json(&fs::read_to_string(&config_path).unwrap()).unwrap();
    assert!(!config.fallback.snap_to_paragraph);

    let text = "第一页内容\n如图 1-1 所示\n第二页内容\n结论";
    let report = ImageReinserter::new(config)
        .unwrap()
        .reinsert(text, &manifest.images, manifest.total_pages, &MarkdownImageMarker::default())
        .unwrap();

    assert_eq!(report.stats.strict, 1);
    assert_eq!(report.stats.page_ratio, 1);
    assert_eq!(report.assignments[1].target_line, 3);
    assert_eq!(
        report.text,
        "第一页内容\n如图 1-1 所示\n\n![image](img/1.png)\n第二页内容\n结论\n\n![image](img/2.png)"
    );
}
