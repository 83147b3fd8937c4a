//! Point set registration algorithms
//!
//! This crate aligns centered 3D point sets onto a reference:
//! - PCA axis prealignment (48 permutation/sign candidates)
//! - Kabsch rigid fit
//! - Robust trimmed ICP

pub mod registration;

pub use registration::{
    align_to_reference, best_pca_prealign, icp_rigid_robust, kabsch, nn_rmse, pca_axes,
    Alignment, IcpParams, IcpResult, NearestIndex3, Prealignment,
};
