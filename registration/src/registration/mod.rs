//! Rigid registration of centered point sets
//!
//! - Principal-axis prealignment over the 48 axis permutations and sign flips
//! - Kabsch / orthogonal Procrustes fit
//! - Robust trimmed ICP with a fixed iteration budget

pub mod kabsch;
pub mod nearest;
pub mod pca;

pub use kabsch::kabsch;
pub use mpase_core::{Error, Result};
pub use nearest::NearestIndex3;
pub use pca::{best_pca_prealign, covariance, nn_rmse, pca_axes, Prealignment};

use mpase_core::stats::quantile_linear;
use mpase_core::{CfgCommon, RigidTransform};
use nalgebra::Point3;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use tracing::debug;

/// Fewest correspondences a Kabsch update is computed from.
const MIN_FIT_MATCHES: usize = 3;

/// Parameters of [`icp_rigid_robust`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IcpParams {
    /// Number of iterations; there is no early exit.
    pub iters: usize,
    /// Maximum points drawn from each set.
    pub sample: usize,
    /// Worst fraction of correspondences dropped each iteration.
    /// Trimming is applied only when `0 < trim_q < 0.5`.
    pub trim_q: f64,
    pub seed: u64,
}

impl Default for IcpParams {
    fn default() -> Self {
        Self::from(&CfgCommon::default())
    }
}

impl From<&CfgCommon> for IcpParams {
    fn from(cfg: &CfgCommon) -> Self {
        Self {
            iters: cfg.icp_iters,
            sample: cfg.sample_icp,
            trim_q: cfg.trim_q,
            seed: cfg.icp_seed,
        }
    }
}

/// ICP registration result
#[derive(Debug, Clone)]
pub struct IcpResult {
    /// Transform taking the moving set onto the reference.
    pub transform: RigidTransform,
    /// RMS distance of the retained correspondences, per iteration,
    /// measured before that iteration's update.
    pub rmse_history: Vec<f64>,
    /// RMS nearest distance of all sampled moving points after the last update.
    pub final_rmse: f64,
    pub iterations: usize,
}

fn subsample(points: &[Point3<f64>], cap: usize, rng: &mut StdRng) -> Vec<Point3<f64>> {
    if points.len() <= cap {
        return points.to_vec();
    }
    index::sample(rng, points.len(), cap)
        .into_iter()
        .map(|i| points[i])
        .collect()
}

/// Robust point-to-point ICP of `moving` onto `reference`.
///
/// Both sets are subsampled without replacement to at most `params.sample`
/// points from one generator seeded with `params.seed` (reference first).
/// Each iteration matches every transformed moving point to its nearest
/// reference point, keeps the matches at or below the `1 - trim_q` distance
/// quantile (all matches when fewer than three pass), and composes the
/// Kabsch update onto the running transform.
pub fn icp_rigid_robust(
    reference: &[Point3<f64>],
    moving: &[Point3<f64>],
    params: &IcpParams,
) -> Result<IcpResult> {
    if reference.len() < 3 || moving.len() < 3 {
        return Err(Error::degenerate(format!(
            "ICP needs at least 3 points per set, got {} and {}",
            reference.len(),
            moving.len()
        )));
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let a = subsample(reference, params.sample, &mut rng);
    let b = subsample(moving, params.sample, &mut rng);
    let tree = NearestIndex3::new(&a)?;
    let trim = params.trim_q > 0.0 && params.trim_q < 0.5;

    let mut transform = RigidTransform::identity();
    let mut rmse_history = Vec::with_capacity(params.iters);

    for _ in 0..params.iters {
        let bx = transform.apply_all(&b);
        let matches = tree.nearest_all(&bx);

        let mut thr = if trim {
            let d: Vec<f64> = matches.iter().map(|m| m.1).collect();
            quantile_linear(&d, 1.0 - params.trim_q)
        } else {
            f64::INFINITY
        };
        // Tiny sets: trimming must not starve the rigid fit.
        if matches.iter().filter(|m| m.1 <= thr).count() < MIN_FIT_MATCHES {
            thr = f64::INFINITY;
        }

        let mut targets = Vec::with_capacity(matches.len());
        let mut sources = Vec::with_capacity(matches.len());
        let mut sq = 0.0;
        for (p, &(idx, dist)) in bx.iter().zip(&matches) {
            if dist <= thr {
                targets.push(a[idx]);
                sources.push(*p);
                sq += dist * dist;
            }
        }
        rmse_history.push((sq / sources.len().max(1) as f64).sqrt());

        let update = kabsch(&targets, &sources)?;
        transform = update.compose(&transform);
    }

    let final_d = tree.distances(&transform.apply_all(&b));
    let final_rmse = (nearest::sum_sq(&final_d) / final_d.len() as f64).sqrt();

    debug!(
        iterations = params.iters,
        samples_ref = a.len(),
        samples_moving = b.len(),
        final_rmse,
        "ICP finished"
    );

    Ok(IcpResult {
        transform,
        rmse_history,
        final_rmse,
        iterations: params.iters,
    })
}

/// Prealignment followed by ICP refinement.
#[derive(Debug, Clone)]
pub struct Alignment {
    /// Composite transform: `icp ∘ prealign`.
    pub transform: RigidTransform,
    pub prealign: Prealignment,
    pub icp: IcpResult,
}

/// Align a centered `moving` set onto a centered `reference`.
pub fn align_to_reference(
    reference: &[Point3<f64>],
    moving: &[Point3<f64>],
    cfg: &CfgCommon,
) -> Result<Alignment> {
    let prealign = best_pca_prealign(moving, reference)?;
    let pre = RigidTransform::from_rotation(prealign.rotation);
    let pre_moved = pre.apply_all(moving);
    let icp = icp_rigid_robust(reference, &pre_moved, &IcpParams::from(cfg))?;
    Ok(Alignment {
        transform: icp.transform.compose(&pre),
        prealign,
        icp,
    })
}

mod mod_test;
