mod common;

use common::*;
use mpase::io::Manifest;
use mpase::{export_all, run_point_sets, ExportOptions, LevelSelector, Plane};
use std::fs;

#[test]
fn test_manifest_matches_files_on_disk() {
    let result = run_point_sets(twin_sets(), &small_config()).unwrap();
    let tmp = tempfile::tempdir().unwrap();
    let manifest = export_all(&result, tmp.path(), &ExportOptions::default()).unwrap();

    for file in [
        "meta_data.json",
        "background_mask.json",
        "density_a.json",
        "density_b.json",
        "contours_d3.json",
        "projections.json",
        "metrics_data.json",
        "points3d.json",
        "layout.json",
        "scales.json",
    ] {
        assert!(manifest.contains(file), "{file} missing from manifest");
    }
    assert!(!manifest.contains("manifest.json"));
    for entry in &manifest.files {
        let len = fs::metadata(tmp.path().join(&entry.file)).unwrap().len();
        assert_eq!(len, entry.bytes, "{}", entry.file);
    }

    let on_disk: Manifest =
        serde_json::from_slice(&fs::read(tmp.path().join("manifest.json")).unwrap()).unwrap();
    assert_eq!(on_disk, manifest);
}

#[test]
fn test_bundle_contents() {
    let result = run_point_sets(twin_sets(), &small_config()).unwrap();
    let tmp = tempfile::tempdir().unwrap();
    let opts = ExportOptions {
        include_density: false,
        layout: false,
        pf_levels: LevelSelector::One(90),
        ..ExportOptions::default()
    };
    let manifest = export_all(&result, tmp.path(), &opts).unwrap();
    assert!(!manifest.contains("density_a.json"));
    assert!(!manifest.contains("layout.json"));

    let read = |name: &str| -> serde_json::Value {
        serde_json::from_slice(&fs::read(tmp.path().join(name)).unwrap()).unwrap()
    };

    let meta = read("meta_data.json");
    assert_eq!(meta["levels"]["hdr"], serde_json::json!([100, 90, 50]));
    assert_eq!(meta["levels"]["pf"], serde_json::json!([90]));
    let (nx, ny) = result.grid.plane_size(Plane::XY);
    assert_eq!(meta["grid"]["XY"], serde_json::json!([nx, ny]));

    let contours = read("contours_d3.json");
    let contours = contours["contours"].as_array().unwrap();
    assert!(contours.iter().any(|c| c["variant"] == "pf"));
    assert!(contours.iter().filter(|c| c["variant"] == "pf").all(|c| c["level"] == 90));
    for c in contours.iter().filter(|c| c["plane"] == "XY") {
        for p in c["points"].as_array().unwrap() {
            let x = p[0].as_f64().unwrap();
            let y = p[1].as_f64().unwrap();
            assert!((0.0..=(nx - 1) as f64).contains(&x) && (0.0..=(ny - 1) as f64).contains(&y));
        }
    }

    let background = read("background_mask.json");
    assert_eq!(background["XY"].as_array().unwrap().len(), ny as usize);

    let points3d = read("points3d.json");
    assert_eq!(points3d["b"]["positions"].as_array().unwrap().len(), 400);
}

#[test]
fn test_undefined_distances_export_as_null() {
    let mut result = run_point_sets(twin_sets(), &small_config()).unwrap();
    result.metrics[0].mean_nn = f64::NAN;
    result.metrics[0].hausdorff = f64::NAN;
    let tmp = tempfile::tempdir().unwrap();
    export_all(&result, tmp.path(), &ExportOptions::default()).unwrap();

    let rows: serde_json::Value =
        serde_json::from_slice(&fs::read(tmp.path().join("metrics_data.json")).unwrap()).unwrap();
    assert!(rows[0]["mean_nn"].is_null());
    assert!(rows[0]["hausdorff"].is_null());
    assert!(rows[1]["mean_nn"].is_number());
}
