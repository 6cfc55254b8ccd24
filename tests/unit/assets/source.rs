use super::*;

#[test]
fn normalize_asset_path_strips_root_and_dots() {
    assert_eq!(
        normalize_asset_path("/assets/parts/./body.svg").unwrap(),
        "assets/parts/body.svg"
    );
    assert_eq!(normalize_asset_path("a\\b.png").unwrap(), "a/b.png");
    assert!(normalize_asset_path("").is_err());
    assert!(normalize_asset_path("/").is_err());
    assert!(normalize_asset_path("a/../b.svg").is_err());
}

#[test]
fn image_ref_kind_and_serde() {
    assert!(ImageRef::path("x/Body.SVG").is_svg());
    assert!(!ImageRef::path("x/body.png").is_svg());
    assert!(ImageRef::Svg("<svg/>".into()).is_svg());
    assert_eq!(ImageRef::path("a.svg").as_path(), Some("a.svg"));
    assert_eq!(ImageRef::Svg("<svg/>".into()).label(), "<inline svg>");

    let json = serde_json::to_value(ImageRef::path("a.svg")).unwrap();
    assert_eq!(json, serde_json::json!({"kind": "path", "value": "a.svg"}));
}

#[test]
fn memory_source_reads_normalized_keys() {
    let mut src = MemoryAssetSource::new();
    assert!(src.is_empty());
    src.insert("/parts/ears.svg", b"abc".to_vec()).unwrap();
    assert_eq!(src.len(), 1);
    assert_eq!(src.read("parts/ears.svg").unwrap(), b"abc");
    let err = src.read("parts/eyes.svg").unwrap_err();
    assert!(err.to_string().contains("asset error:"));
}

#[test]
fn fs_source_reads_under_root() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("parts")).unwrap();
    std::fs::write(dir.path().join("parts/nose.svg"), b"<svg/>").unwrap();

    let src = FsAssetSource::new(dir.path());
    assert_eq!(src.root(), dir.path());
    assert_eq!(src.read("/parts/nose.svg").unwrap(), b"<svg/>");
    assert!(src.read("parts/none.svg").is_err());
    assert!(src.read("../etc/passwd").is_err());
}
