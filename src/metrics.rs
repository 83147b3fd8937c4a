//! Pairwise comparison of shapes sharing a (plane, level, variant).

use crate::shape::{ShapeProduct, ShapeTable};
use mpase_core::{Plane, Result, Variant};
use mpase_scientific::{contour_distances, iou};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub plane: Plane,
    pub variant: Variant,
    pub level: i32,
    pub label_a: String,
    pub label_b: String,
    pub iou: f64,
    /// `NaN` when either contour is absent.
    pub mean_nn: f64,
    /// `NaN` when either contour is absent.
    pub hausdorff: f64,
}

pub const CSV_HEADER: &str = "plane,variant,level,label_a,label_b,iou,mean_nn,hausdorff";

impl MetricRow {
    pub fn between(
        label_a: &str,
        a: &ShapeProduct,
        label_b: &str,
        b: &ShapeProduct,
    ) -> Result<Self> {
        let (mean_nn, hausdorff) = contour_distances(
            a.contour.as_ref().map(|c| c.points.as_slice()),
            b.contour.as_ref().map(|c| c.points.as_slice()),
        );
        Ok(Self {
            plane: a.plane,
            variant: a.variant,
            level: a.level,
            label_a: label_a.to_owned(),
            label_b: label_b.to_owned(),
            iou: iou(&a.mask, &b.mask)?,
            mean_nn,
            hausdorff,
        })
    }

    /// One CSV line; undefined distances are left empty.
    pub fn to_csv_line(&self) -> String {
        let num = |v: f64| if v.is_finite() { v.to_string() } else { String::new() };
        format!(
            "{},{},{},{},{},{},{},{}",
            self.plane,
            self.variant,
            self.level,
            csv_field(&self.label_a),
            csv_field(&self.label_b),
            num(self.iou),
            num(self.mean_nn),
            num(self.hausdorff)
        )
    }
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_owned()
    }
}

/// Plane, variant ascending; level descending; then labels ascending.
pub fn row_order(a: &MetricRow, b: &MetricRow) -> Ordering {
    a.plane
        .as_str()
        .cmp(b.plane.as_str())
        .then_with(|| a.variant.as_str().cmp(b.variant.as_str()))
        .then_with(|| b.level.cmp(&a.level))
        .then_with(|| a.label_a.cmp(&b.label_a))
        .then_with(|| a.label_b.cmp(&b.label_b))
}

/// Rows for every pair `i < j` of `labels` (input order) that both have a
/// shape at the same (variant, plane, level). Missing shapes are skipped.
pub fn pairwise_rows(table: &ShapeTable, labels: &[String]) -> Result<Vec<MetricRow>> {
    let mut cells: Vec<(Variant, Plane, i32)> = table
        .iter()
        .map(|(k, _)| (k.variant, k.plane, k.level))
        .collect();
    cells.dedup();

    let mut jobs = Vec::new();
    for &(variant, plane, level) in &cells {
        for (i, a) in labels.iter().enumerate() {
            for b in &labels[i + 1..] {
                if let (Some(sa), Some(sb)) = (
                    table.get(variant, plane, level, a),
                    table.get(variant, plane, level, b),
                ) {
                    jobs.push((a.as_str(), sa, b.as_str(), sb));
                }
            }
        }
    }

    let mut rows = jobs
        .into_par_iter()
        .map(|(a, sa, b, sb)| MetricRow::between(a, sa, b, sb))
        .collect::<Result<Vec<_>>>()?;
    rows.sort_by(row_order);
    Ok(rows)
}
