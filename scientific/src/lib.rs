//! Scientific Computing
//!
//! Statistics used when comparing 2D silhouettes:
//! - [`kde`]: Gaussian kernel density log-scores and bandwidth heuristics
//! - [`geometry`]: mask IoU and contour-to-contour distances
//!
//! ## Example: Contour Distances
//!
//! ```rust
//! use mpase_scientific::geometry::contour_distances;
//! use nalgebra::Point2;
//!
//! let a = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)];
//! let b = vec![Point2::new(0.0, 1.0), Point2::new(1.0, 1.0)];
//! let (mean_nn, hausdorff) = contour_distances(Some(&a[..]), Some(&b[..]));
//! assert_eq!(mean_nn, 1.0);
//! assert_eq!(hausdorff, 1.0);
//! ```

pub mod geometry;
pub mod kde;

pub type Error = mpase_core::Error;
pub type Result<T> = mpase_core::Result<T>;

pub use geometry::*;
pub use kde::*;

pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    let sum: f64 = data.iter().sum();
    Some(sum / data.len() as f64)
}

/// Population standard deviation.
pub fn std(data: &[f64]) -> Option<f64> {
    let m = mean(data)?;
    let variance = data.iter().map(|&x| (x - m).powi(2)).sum::<f64>() / data.len() as f64;
    Some(variance.sqrt())
}
