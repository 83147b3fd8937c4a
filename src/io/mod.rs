//! Point loading and artifact export.

pub mod csv;
pub mod export;

pub use self::csv::{load_points, read_points, CsvColumns};
pub use export::{
    export_all, write_aligned_points, write_json, write_meta, write_metrics_csv, ExportOptions,
    Manifest, ManifestEntry,
};
