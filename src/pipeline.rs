//! End-to-end run: align, grid, project, extract shapes, compare.

use crate::density::boot_density_2d;
use crate::grid::Grid;
use crate::hdr::make_hdr_shape;
use crate::io::{write_aligned_points, write_meta, write_metrics_csv};
use crate::metrics::pairwise_rows;
use crate::point_fraction::make_pf_shapes;
use crate::projection::PlaneProjection;
use crate::result::{AlignmentSummary, RunInput, RunMeta, RunResult};
use crate::shape::{ShapeProduct, ShapeTable};
use mpase_core::{
    centroid, AlignMode, AlignedPointSet, DensityMap, Error, Plane, PointSet, Result,
    RigidTransform, RunConfig,
};
use mpase_registration::align_to_reference;
use nalgebra::Point3;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use tracing::{debug, info, warn};

const SCALE_EPS: f64 = 1e-8;

/// Run the pipeline on in-memory sets or CSV files.
///
/// Every input is validated before any file is written.
pub fn run(input: RunInput, cfg: &RunConfig) -> Result<RunResult> {
    cfg.validate()?;
    if input.len() < 2 {
        return Err(Error::invalid_input(format!(
            "need at least 2 point sets for comparison, got {}",
            input.len()
        )));
    }
    let sources = input.sources();
    let sets = input.load()?;
    run_sets(sets, sources, cfg)
}

pub fn run_point_sets(sets: Vec<PointSet>, cfg: &RunConfig) -> Result<RunResult> {
    run(RunInput::Points(sets), cfg)
}

fn check_sets(sets: &mut [PointSet]) -> Result<()> {
    if sets.len() < 2 {
        return Err(Error::invalid_input("need at least 2 point sets for comparison"));
    }
    let mut seen = HashSet::new();
    for (i, set) in sets.iter_mut().enumerate() {
        if set.label.is_empty() {
            set.label = format!("S{i}");
        }
        if set.is_empty() {
            return Err(Error::invalid_input(format!("point set '{}' is empty", set.label)));
        }
        if set.points.iter().any(|p| !p.coords.iter().all(|v| v.is_finite())) {
            return Err(Error::invalid_input(format!(
                "point set '{}' has non-finite coordinates",
                set.label
            )));
        }
        if !seen.insert(set.label.clone()) {
            return Err(Error::invalid_input(format!("duplicate label '{}'", set.label)));
        }
    }
    Ok(())
}

struct Registered {
    points: Vec<Point3<f64>>,
    transform: RigidTransform,
    centroid: Point3<f64>,
    summary: AlignmentSummary,
}

/// Center every set and, in auto mode, register sets 1.. onto set 0.
fn register(sets: &[PointSet], cfg: &RunConfig) -> Result<Vec<Registered>> {
    let centered: Vec<(Point3<f64>, Vec<Point3<f64>>)> = sets
        .iter()
        .map(|s| {
            let c = centroid(&s.points).unwrap_or_else(Point3::origin);
            (c, s.centered())
        })
        .collect();
    let reference = &centered[0].1;

    centered
        .par_iter()
        .zip(sets.par_iter())
        .enumerate()
        .map(|(i, ((c, pts), set))| {
            if i == 0 || cfg.align_mode == AlignMode::Skip {
                return Ok(Registered {
                    points: pts.clone(),
                    transform: RigidTransform::identity(),
                    centroid: *c,
                    summary: AlignmentSummary {
                        label: set.label.clone(),
                        prealign_rmse: None,
                        icp_rmse: None,
                    },
                });
            }
            let alignment = align_to_reference(reference, pts, &cfg.common)?;
            info!(
                label = %set.label,
                prealign_rmse = alignment.prealign.rmse,
                icp_rmse = alignment.icp.final_rmse,
                "aligned to reference"
            );
            Ok(Registered {
                points: alignment.transform.apply_all(pts),
                transform: alignment.transform,
                centroid: *c,
                summary: AlignmentSummary {
                    label: set.label.clone(),
                    prealign_rmse: Some(alignment.prealign.rmse),
                    icp_rmse: Some(alignment.icp.final_rmse),
                },
            })
        })
        .collect()
}

/// Divide every set by the largest extent of their union box.
fn scale_to_unit(registered: Vec<Registered>, sets: &[PointSet]) -> Result<Vec<AlignedPointSet>> {
    let all: Vec<Point3<f64>> = registered.iter().flat_map(|r| r.points.iter().copied()).collect();
    let (mn, mx) = mpase_core::bounds(&all)
        .ok_or_else(|| Error::invalid_input("no points to scale"))?;
    let scale = (mx - mn).max() + SCALE_EPS;
    Ok(registered
        .into_iter()
        .zip(sets)
        .map(|(r, set)| AlignedPointSet {
            label: set.label.clone(),
            points: r.points.iter().map(|p| Point3::from(p.coords / scale)).collect(),
            transform: r.transform,
            centroid: r.centroid,
            scale,
        })
        .collect())
}

fn hdr_shapes(
    aligned: &[AlignedPointSet],
    grid: &Grid,
    planes: &[Plane],
    cfg: &RunConfig,
) -> Result<(BTreeMap<String, BTreeMap<Plane, DensityMap>>, Vec<(String, ShapeProduct)>)> {
    let densities: BTreeMap<String, BTreeMap<Plane, DensityMap>> = aligned
        .par_iter()
        .map(|s| {
            boot_density_2d(&s.points, grid, planes, &cfg.hdr, cfg.hdr.rng_seed)
                .map(|d| (s.label.clone(), d))
        })
        .collect::<Result<_>>()?;

    let shapes = aligned
        .par_iter()
        .flat_map_iter(|s| {
            let fields = densities.get(&s.label);
            planes.iter().flat_map(move |&plane| {
                let field = fields.and_then(|f| f.get(&plane));
                cfg.hdr.mass_levels.iter().filter_map(move |&m| {
                    field.map(|d| {
                        let shape = make_hdr_shape(d, plane, m, cfg.hdr.density_floor_frac);
                        (s.label.clone(), shape)
                    })
                })
            })
        })
        .collect();
    Ok((densities, shapes))
}

fn pf_shapes(
    aligned: &[AlignedPointSet],
    projections: &BTreeMap<Plane, PlaneProjection>,
    cfg: &RunConfig,
) -> Vec<(String, ShapeProduct)> {
    aligned
        .par_iter()
        .flat_map_iter(|s| {
            projections.values().flat_map(move |proj| {
                let points = proj.points(&s.label).unwrap_or_default();
                make_pf_shapes(points, &proj.xs, &proj.ys, proj.plane, &cfg.pf.frac_levels, &cfg.pf)
                    .into_iter()
                    .map(move |shape| (s.label.clone(), shape))
            })
        })
        .collect()
}

fn run_sets(mut sets: Vec<PointSet>, sources: Vec<String>, cfg: &RunConfig) -> Result<RunResult> {
    check_sets(&mut sets)?;
    let labels: Vec<String> = sets.iter().map(|s| s.label.clone()).collect();
    info!(sets = sets.len(), align_mode = cfg.align_mode.as_str(), "starting run");

    let registered = register(&sets, cfg)?;
    let alignment: Vec<AlignmentSummary> = registered.iter().map(|r| r.summary.clone()).collect();
    let aligned = scale_to_unit(registered, &sets)?;

    let union: Vec<Point3<f64>> = aligned.iter().flat_map(|s| s.points.iter().copied()).collect();
    let grid = Grid::from_points(&union, cfg.common.grid_base, cfg.common.pad_frac)?;
    info!(dims = ?grid.dims(), "shared grid built");

    let planes = cfg.selected_planes();
    let projections: BTreeMap<Plane, PlaneProjection> = planes
        .iter()
        .map(|&p| (p, PlaneProjection::new(&aligned, &grid, p)))
        .collect();
    let background: BTreeMap<Plane, _> = projections
        .iter()
        .map(|(&p, proj)| (p, proj.background_mask()))
        .collect();

    let mut meta = RunMeta {
        sources,
        labels: labels.clone(),
        cfg_common: cfg.common.clone(),
        cfg_hdr: None,
        cfg_pf: None,
        planes: planes.clone(),
        align_mode: cfg.align_mode,
        run_hdr: cfg.run_hdr,
        run_pf: cfg.run_pf,
        alignment,
        note: None,
    };

    if cfg.alignment_only || (!cfg.run_hdr && !cfg.run_pf) {
        meta.note = Some("Alignment-only run (no HDR/PF/metrics).".into());
        let result = RunResult {
            labels,
            aligned,
            grid,
            shapes: ShapeTable::new(),
            metrics: Vec::new(),
            background,
            densities: None,
            projections,
            meta,
        };
        if let Some(dir) = &cfg.out_dir {
            fs::create_dir_all(dir)?;
            write_aligned_points(&dir.join("aligned_points.json"), &result)?;
            write_meta(&dir.join("meta_data.json"), &result.meta)?;
            info!(dir = %dir.display(), "alignment artifacts written");
        }
        return Ok(result);
    }

    let mut shapes = ShapeTable::new();
    let mut densities = None;
    if cfg.run_hdr {
        meta.cfg_hdr = Some(cfg.hdr.clone());
        let (d, hdr) = hdr_shapes(&aligned, &grid, &planes, cfg)?;
        debug!(shapes = hdr.len(), "HDR shapes extracted");
        for (label, shape) in hdr {
            shapes.insert(label, shape);
        }
        densities = Some(d);
    }
    if cfg.run_pf {
        meta.cfg_pf = Some(cfg.pf.clone());
        let pf = pf_shapes(&aligned, &projections, cfg);
        debug!(shapes = pf.len(), "point-fraction shapes extracted");
        for (label, shape) in pf {
            shapes.insert(label, shape);
        }
    }

    let metrics = pairwise_rows(&shapes, &labels)?;
    let undefined = metrics.iter().filter(|r| r.hausdorff.is_nan()).count();
    if undefined > 0 {
        warn!(rows = undefined, "contour distances undefined for empty shapes");
    }
    info!(shapes = shapes.len(), rows = metrics.len(), "metrics computed");

    let result = RunResult {
        labels,
        aligned,
        grid,
        shapes,
        metrics,
        background,
        densities,
        projections,
        meta,
    };
    if let Some(dir) = &cfg.out_dir {
        fs::create_dir_all(dir)?;
        write_metrics_csv(&dir.join("metrics_data.csv"), &result.metrics)?;
        write_meta(&dir.join("meta_data.json"), &result.meta)?;
        info!(dir = %dir.display(), "run artifacts written");
    }
    Ok(result)
}
