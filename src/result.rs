//! Run inputs, metadata and the aggregate result.

use crate::grid::Grid;
use crate::io::{load_points, CsvColumns};
use crate::metrics::MetricRow;
use crate::projection::PlaneProjection;
use crate::shape::{ShapeProduct, ShapeTable};
use mpase_core::{
    AlignMode, AlignedPointSet, CfgCommon, CfgHdr, CfgPf, DensityMap, Error, LevelSelector, Mask,
    Plane, PointSet, Result, Variant,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Where the point sets come from.
#[derive(Debug, Clone)]
pub enum RunInput {
    Points(Vec<PointSet>),
    Csv { paths: Vec<PathBuf>, columns: CsvColumns },
}

impl RunInput {
    pub fn csv(paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        RunInput::Csv {
            paths: paths.into_iter().map(Into::into).collect(),
            columns: CsvColumns::default(),
        }
    }

    /// Source descriptions, one per set: file paths, or labels for in-memory sets.
    pub fn sources(&self) -> Vec<String> {
        match self {
            RunInput::Points(sets) => sets
                .iter()
                .enumerate()
                .map(|(i, s)| {
                    if s.label.is_empty() {
                        format!("S{i}")
                    } else {
                        s.label.clone()
                    }
                })
                .collect(),
            RunInput::Csv { paths, .. } => paths.iter().map(|p| p.display().to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RunInput::Points(sets) => sets.len(),
            RunInput::Csv { paths, .. } => paths.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Materialise the point sets, reading files when needed.
    pub fn load(self) -> Result<Vec<PointSet>> {
        match self {
            RunInput::Points(sets) => Ok(sets),
            RunInput::Csv { paths, columns } => {
                paths.iter().map(|p| load_points(p, &columns)).collect()
            }
        }
    }
}

/// Registration outcome of one set against the reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentSummary {
    pub label: String,
    /// Nearest-neighbour RMSE after the axis search, before refinement.
    pub prealign_rmse: Option<f64>,
    pub icp_rmse: Option<f64>,
}

/// Reproducibility record written next to the artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMeta {
    pub sources: Vec<String>,
    pub labels: Vec<String>,
    pub cfg_common: CfgCommon,
    /// Absent for alignment-only runs.
    pub cfg_hdr: Option<CfgHdr>,
    pub cfg_pf: Option<CfgPf>,
    pub planes: Vec<Plane>,
    pub align_mode: AlignMode,
    pub run_hdr: bool,
    pub run_pf: bool,
    pub alignment: Vec<AlignmentSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Everything one pipeline invocation produces.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub labels: Vec<String>,
    pub aligned: Vec<AlignedPointSet>,
    pub grid: Grid,
    pub shapes: ShapeTable,
    pub metrics: Vec<MetricRow>,
    pub background: BTreeMap<Plane, Mask>,
    /// label -> plane -> averaged density, present when HDR ran.
    pub densities: Option<BTreeMap<String, BTreeMap<Plane, DensityMap>>>,
    pub projections: BTreeMap<Plane, PlaneProjection>,
    pub meta: RunMeta,
}

impl RunResult {
    pub fn aligned_set(&self, label: &str) -> Option<&AlignedPointSet> {
        self.aligned.iter().find(|s| s.label == label)
    }

    pub fn shape(
        &self,
        variant: Variant,
        plane: Plane,
        level: i32,
        label: &str,
    ) -> Option<&ShapeProduct> {
        self.shapes.get(variant, plane, level, label)
    }

    pub fn density(&self, label: &str, plane: Plane) -> Option<&DensityMap> {
        self.densities.as_ref()?.get(label)?.get(&plane)
    }

    /// Metric rows of one plane and variant whose level the selector accepts.
    pub fn metrics_for(
        &self,
        plane: Plane,
        variant: Variant,
        levels: &LevelSelector,
    ) -> Vec<&MetricRow> {
        self.metrics
            .iter()
            .filter(|r| r.plane == plane && r.variant == variant && levels.contains(r.level))
            .collect()
    }

    /// Configured levels of a variant resolved through a selector, highest first.
    pub fn levels(&self, variant: Variant, selector: &LevelSelector) -> Vec<i32> {
        let configured = match variant {
            Variant::Hdr => self.meta.cfg_hdr.as_ref().map(|c| c.mass_levels.as_slice()),
            Variant::PointFraction => self.meta.cfg_pf.as_ref().map(|c| c.frac_levels.as_slice()),
        };
        configured.map_or_else(Vec::new, |levels| selector.resolve(levels))
    }

    pub fn metric(
        &self,
        plane: Plane,
        variant: Variant,
        level: i32,
        label_a: &str,
        label_b: &str,
    ) -> Result<&MetricRow> {
        self.metrics
            .iter()
            .find(|r| {
                r.plane == plane
                    && r.variant == variant
                    && r.level == level
                    && ((r.label_a == label_a && r.label_b == label_b)
                        || (r.label_a == label_b && r.label_b == label_a))
            })
            .ok_or_else(|| {
                Error::invalid_input(format!(
                    "no {variant} metric for {label_a}/{label_b} on {plane} at {level}%"
                ))
            })
    }
}
