//! Principal axes and the 48-candidate axis prealignment.

use super::nearest::{sum_sq, NearestIndex3};
use mpase_core::{Error, Result};
use nalgebra::{Matrix3, Point3};
use tracing::debug;

/// Second eigenvalue below this fraction of the first marks a degenerate set.
const DEGENERATE_EIG_RATIO: f64 = 1e-12;

/// Sample covariance (`n - 1` normalization) of the points.
pub fn covariance(points: &[Point3<f64>]) -> Result<Matrix3<f64>> {
    let n = points.len();
    if n < 2 {
        return Err(Error::degenerate(format!(
            "covariance needs at least 2 points, got {n}"
        )));
    }
    let mean = points.iter().map(|p| p.coords).sum::<nalgebra::Vector3<f64>>() / n as f64;
    let mut cov = Matrix3::zeros();
    for p in points {
        let d = p.coords - mean;
        cov += d * d.transpose();
    }
    Ok(cov / (n - 1) as f64)
}

/// Principal axes as columns, sorted by descending variance and right-handed.
pub fn pca_axes(points: &[Point3<f64>]) -> Result<Matrix3<f64>> {
    if points.len() < 3 {
        return Err(Error::degenerate(format!(
            "principal axes need at least 3 points, got {}",
            points.len()
        )));
    }
    let cov = covariance(points)?;
    if cov.iter().any(|v| !v.is_finite()) {
        return Err(Error::invalid_input("point set contains non-finite coordinates"));
    }

    let eig = cov.symmetric_eigen();
    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| eig.eigenvalues[b].total_cmp(&eig.eigenvalues[a]));

    let largest = eig.eigenvalues[order[0]];
    let second = eig.eigenvalues[order[1]];
    if largest <= 0.0 || second <= DEGENERATE_EIG_RATIO * largest {
        return Err(Error::degenerate(format!(
            "point set is collinear or coincident (eigenvalues {largest:e}, {second:e})"
        )));
    }

    let mut axes = Matrix3::from_columns(&[
        eig.eigenvectors.column(order[0]).into_owned(),
        eig.eigenvectors.column(order[1]).into_owned(),
        eig.eigenvectors.column(order[2]).into_owned(),
    ]);
    if axes.determinant() < 0.0 {
        let flipped = axes.column(2) * -1.0;
        axes.set_column(2, &flipped);
    }
    Ok(axes)
}

/// Symmetric RMS nearest-neighbour distance between two sets.
pub fn nn_rmse(a: &[Point3<f64>], b: &[Point3<f64>]) -> Result<f64> {
    let ta = NearestIndex3::new(a)?;
    let tb = NearestIndex3::new(b)?;
    let total = sum_sq(&ta.distances(b)) + sum_sq(&tb.distances(a));
    Ok((total / (a.len() + b.len()) as f64).sqrt())
}

/// Best candidate rotation found by [`best_pca_prealign`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prealignment {
    pub rotation: Matrix3<f64>,
    pub rmse: f64,
    pub permutation: [usize; 3],
    pub signs: [f64; 3],
}

/// The 6 axis permutations in lexicographic order.
pub const PERMUTATIONS: [[usize; 3]; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
];

/// The 8 sign patterns, `+` before `-`, last axis varying fastest.
pub const SIGNS: [[f64; 3]; 8] = [
    [1.0, 1.0, 1.0],
    [1.0, 1.0, -1.0],
    [1.0, -1.0, 1.0],
    [1.0, -1.0, -1.0],
    [-1.0, 1.0, 1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [-1.0, -1.0, -1.0],
];

/// `P · S` with `P[i, perm[i]] = 1` and `S = diag(signs)`.
pub fn permutation_sign_matrix(perm: [usize; 3], signs: [f64; 3]) -> Matrix3<f64> {
    let mut m = Matrix3::zeros();
    for (i, &j) in perm.iter().enumerate() {
        m[(i, j)] = signs[j];
    }
    m
}

/// Rotate `moving` onto `reference` by matching principal axes.
///
/// Every candidate `Va · (P·S) · Vbᵀ` is scored with [`nn_rmse`]; the first
/// candidate with the strictly lowest score wins. Both sets are expected to be
/// centered. Reflections are part of the candidate set.
pub fn best_pca_prealign(
    moving: &[Point3<f64>],
    reference: &[Point3<f64>],
) -> Result<Prealignment> {
    let va = pca_axes(reference)?;
    let vb = pca_axes(moving)?;

    // Trees are built once; `|R b - a| = |b - Rᵀ a|` lets the reverse
    // direction query the unrotated moving set.
    let ta = NearestIndex3::new(reference)?;
    let tb = NearestIndex3::new(moving)?;
    let denom = (reference.len() + moving.len()) as f64;

    let mut best = Prealignment {
        rotation: Matrix3::identity(),
        rmse: f64::INFINITY,
        permutation: PERMUTATIONS[0],
        signs: SIGNS[0],
    };

    for perm in PERMUTATIONS {
        for signs in SIGNS {
            let rotation = va * permutation_sign_matrix(perm, signs) * vb.transpose();
            let forward = sum_sq(&ta.distances_rotated(moving, &rotation));
            let backward = sum_sq(&tb.distances_rotated(reference, &rotation.transpose()));
            let rmse = ((forward + backward) / denom).sqrt();
            if rmse < best.rmse {
                best = Prealignment {
                    rotation,
                    rmse,
                    permutation: perm,
                    signs,
                };
            }
        }
    }

    debug!(
        rmse = best.rmse,
        permutation = ?best.permutation,
        signs = ?best.signs,
        "PCA prealignment selected"
    );
    Ok(best)
}
