//! JSON and CSV artifacts of a run.
//!
//! All 2D coordinates are in pixel space with the origin at the top-left and
//! y increasing downward, matching the mask layout.

use crate::metrics::{MetricRow, CSV_HEADER};
use crate::result::{RunMeta, RunResult};
use mpase_core::{bounds, density_to_rows, mask_to_rows, LevelSelector, Plane, Result, Variant};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// Pretty-printed JSON; returns the number of bytes written.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<u64> {
    let bytes = serde_json::to_vec_pretty(value)?;
    fs::write(path, &bytes)?;
    Ok(bytes.len() as u64)
}

pub fn write_metrics_csv(path: &Path, rows: &[MetricRow]) -> Result<u64> {
    let mut out = String::with_capacity(64 * (rows.len() + 1));
    out.push_str(CSV_HEADER);
    out.push('\n');
    for row in rows {
        out.push_str(&row.to_csv_line());
        out.push('\n');
    }
    fs::write(path, out.as_bytes())?;
    Ok(out.len() as u64)
}

pub fn write_meta(path: &Path, meta: &RunMeta) -> Result<u64> {
    write_json(path, meta)
}

#[derive(Debug, Serialize)]
struct AlignedRecord {
    positions: Vec<[f64; 3]>,
    centroid: [f64; 3],
    rotation: [[f64; 3]; 3],
    translation: [f64; 3],
    scale: f64,
}

/// Aligned coordinates plus the transform that produced them, per label.
pub fn write_aligned_points(path: &Path, result: &RunResult) -> Result<u64> {
    let payload: BTreeMap<&str, AlignedRecord> = result
        .aligned
        .iter()
        .map(|s| {
            let r = &s.transform.rotation;
            let t = &s.transform.translation;
            let record = AlignedRecord {
                positions: s.points.iter().map(|p| [p.x, p.y, p.z]).collect(),
                centroid: [s.centroid.x, s.centroid.y, s.centroid.z],
                rotation: [0, 1, 2].map(|i| [r[(i, 0)], r[(i, 1)], r[(i, 2)]]),
                translation: [t.x, t.y, t.z],
                scale: s.scale,
            };
            (s.label.as_str(), record)
        })
        .collect();
    write_json(path, &payload)
}

/// What [`export_all`] writes besides the fixed files.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub include_density: bool,
    pub layout: bool,
    pub scales: bool,
    pub hdr_levels: LevelSelector,
    pub pf_levels: LevelSelector,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_density: true,
            layout: true,
            scales: true,
            hdr_levels: LevelSelector::All,
            pf_levels: LevelSelector::All,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub file: String,
    pub bytes: u64,
}

/// Every file of a bundle with its size. `manifest.json` itself is not listed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub files: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.bytes).sum()
    }

    pub fn contains(&self, file: &str) -> bool {
        self.files.iter().any(|f| f.file == file)
    }
}

struct Bundle<'a> {
    dir: &'a Path,
    manifest: Manifest,
}

impl Bundle<'_> {
    fn json<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) -> Result<()> {
        let bytes = write_json(&self.dir.join(name), value)?;
        self.manifest.files.push(ManifestEntry {
            file: name.to_owned(),
            bytes,
        });
        Ok(())
    }
}

#[derive(Serialize)]
struct ViewerMeta<'a> {
    planes: Vec<Plane>,
    /// `[nx, ny]` per plane.
    grid: BTreeMap<Plane, [u32; 2]>,
    levels: BTreeMap<&'static str, Vec<i32>>,
    labels: &'a [String],
}

#[derive(Serialize)]
struct ContourRecord<'a> {
    plane: Plane,
    variant: &'static str,
    level: i32,
    label: &'a str,
    points: Vec<[f64; 2]>,
}

#[derive(Serialize)]
struct PlaneLayout {
    origin: [f64; 3],
    normal: [f64; 3],
}

fn default_layout() -> BTreeMap<Plane, PlaneLayout> {
    BTreeMap::from([
        (
            Plane::XY,
            PlaneLayout {
                origin: [0.0, 0.0, 0.0],
                normal: [0.0, 0.0, 1.0],
            },
        ),
        (
            Plane::YZ,
            PlaneLayout {
                origin: [1.2, 0.0, 0.0],
                normal: [1.0, 0.0, 0.0],
            },
        ),
        (
            Plane::XZ,
            PlaneLayout {
                origin: [0.0, -1.2, 0.0],
                normal: [0.0, 1.0, 0.0],
            },
        ),
    ])
}

fn xy(points: &[Point2<f64>]) -> Vec<[f64; 2]> {
    points.iter().map(|p| [p.x, p.y]).collect()
}

fn selected_levels(result: &RunResult, variant: Variant, opts: &ExportOptions) -> Vec<i32> {
    let selector = match variant {
        Variant::Hdr => &opts.hdr_levels,
        Variant::PointFraction => &opts.pf_levels,
    };
    let mut levels: Vec<i32> = result
        .meta
        .planes
        .iter()
        .flat_map(|&p| result.shapes.select_levels(variant, p, selector))
        .collect();
    levels.sort_unstable_by(|a, b| b.cmp(a));
    levels.dedup();
    levels
}

/// Write the viewer bundle into `dir` and finish with `manifest.json`.
pub fn export_all(result: &RunResult, dir: &Path, opts: &ExportOptions) -> Result<Manifest> {
    fs::create_dir_all(dir)?;
    let mut bundle = Bundle {
        dir,
        manifest: Manifest::default(),
    };

    let hdr_levels = selected_levels(result, Variant::Hdr, opts);
    let pf_levels = selected_levels(result, Variant::PointFraction, opts);
    let meta = ViewerMeta {
        planes: result.background.keys().copied().collect(),
        grid: result
            .background
            .iter()
            .map(|(&p, m)| (p, [m.width(), m.height()]))
            .collect(),
        levels: BTreeMap::from([("hdr", hdr_levels.clone()), ("pf", pf_levels.clone())]),
        labels: &result.labels,
    };
    bundle.json("meta_data.json", &meta)?;

    let background: BTreeMap<Plane, Vec<Vec<u8>>> = result
        .background
        .iter()
        .map(|(&p, m)| (p, mask_to_rows(m)))
        .collect();
    bundle.json("background_mask.json", &background)?;

    if opts.include_density {
        if let Some(densities) = &result.densities {
            for (label, fields) in densities {
                let payload: BTreeMap<Plane, Vec<Vec<f32>>> =
                    fields.iter().map(|(&p, d)| (p, density_to_rows(d))).collect();
                bundle.json(&format!("density_{label}.json"), &payload)?;
            }
        }
    }

    let mut contours = Vec::new();
    for (variant, levels) in [(Variant::Hdr, &hdr_levels), (Variant::PointFraction, &pf_levels)] {
        for (key, shape) in result.shapes.iter() {
            if key.variant != variant || !levels.contains(&key.level) {
                continue;
            }
            if let Some(c) = &shape.contour {
                contours.push(ContourRecord {
                    plane: key.plane,
                    variant: variant.short_name(),
                    level: key.level,
                    label: &key.label,
                    points: xy(&c.points),
                });
            }
        }
    }
    bundle.json("contours_d3.json", &BTreeMap::from([("contours", contours)]))?;

    let projections: BTreeMap<Plane, BTreeMap<&str, Vec<[f64; 2]>>> = result
        .projections
        .iter()
        .map(|(&p, proj)| {
            let sets = proj
                .sets
                .iter()
                .map(|(label, pts)| (label.as_str(), xy(&proj.to_pixels(pts))))
                .collect();
            (p, sets)
        })
        .collect();
    bundle.json("projections.json", &projections)?;

    bundle.json("metrics_data.json", &result.metrics)?;

    let points3d: BTreeMap<&str, BTreeMap<&str, Vec<[f64; 3]>>> = result
        .aligned
        .iter()
        .map(|s| {
            let positions = s.points.iter().map(|p| [p.x, p.y, p.z]).collect();
            (s.label.as_str(), BTreeMap::from([("positions", positions)]))
        })
        .collect();
    bundle.json("points3d.json", &points3d)?;

    if opts.layout {
        bundle.json("layout.json", &default_layout())?;
    }
    if opts.scales {
        let all: Vec<_> = result.aligned.iter().flat_map(|s| s.points.iter().copied()).collect();
        let (mins, maxs) = bounds(&all)
            .map(|(mn, mx)| ([mn.x, mn.y, mn.z], [mx.x, mx.y, mx.z]))
            .unwrap_or(([0.0; 3], [0.0; 3]));
        let bbox = BTreeMap::from([("mins", mins), ("maxs", maxs)]);
        bundle.json("scales.json", &BTreeMap::from([("bbox", bbox)]))?;
    }

    let manifest = bundle.manifest;
    write_json(&dir.join("manifest.json"), &manifest)?;
    info!(
        dir = %dir.display(),
        files = manifest.files.len(),
        bytes = manifest.total_bytes(),
        "export bundle written"
    );
    Ok(manifest)
}
