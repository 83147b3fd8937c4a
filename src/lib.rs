//! Multi point-set alignment and silhouette extraction.
//!
//! Point sets are centered, registered onto the first set, scaled into a
//! shared box and rasterised on one grid. Each set then yields HDR
//! (density-mass) and point-fraction (density-rank) silhouettes per plane and
//! coverage level, and every pair of sets is compared by IoU, mean
//! nearest-neighbour distance and Hausdorff distance.
//!
//! ```no_run
//! use mpase::{run, RunConfig, RunInput};
//!
//! let cfg = RunConfig::fast().with_out_dir("out");
//! let result = run(RunInput::csv(["a.csv", "b.csv"]), &cfg)?;
//! println!("{} metric rows", result.metrics.len());
//! # Ok::<(), mpase::Error>(())
//! ```

pub use mpase_core as core;
pub use mpase_imgproc as imgproc;
pub use mpase_registration as registration;
pub use mpase_scientific as scientific;

pub mod density;
pub mod grid;
pub mod hdr;
pub mod io;
pub mod metrics;
pub mod pipeline;
pub mod point_fraction;
pub mod projection;
pub mod result;
pub mod shape;

pub use grid::Grid;
pub use io::{export_all, load_points, CsvColumns, ExportOptions, Manifest};
pub use metrics::{pairwise_rows, MetricRow};
pub use mpase_core::{
    AlignMode, BandwidthStrategy, CfgCommon, CfgHdr, CfgMorph, CfgPf, Error, LevelSelector, Plane,
    PointSet, Result, RunConfig, Variant,
};
pub use pipeline::{run, run_point_sets};
pub use projection::PlaneProjection;
pub use result::{AlignmentSummary, RunInput, RunMeta, RunResult};
pub use shape::{ShapeKey, ShapeProduct, ShapeTable};

/// Initialize a single global Rayon thread pool for all CPU-parallel routines.
///
/// Call this once at application startup. Repeated calls are idempotent and
/// return the first initialization result.
///
/// Priority order:
/// 1. explicit `num_threads`
/// 2. `MPASE_CPU_THREADS` env var
/// 3. Rayon default
pub fn init_thread_pool(num_threads: Option<usize>) -> Result<usize> {
    mpase_core::init_global_thread_pool(num_threads)
}
