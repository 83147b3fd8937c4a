use mpase_core::{Error, Result, RigidTransform};
use nalgebra::{Point3, Vector3};

/// Least-squares rigid transform mapping `source[i]` onto `target[i]`.
///
/// The result is a proper rotation: when the SVD solution is a reflection
/// the right singular vector of the smallest singular value is negated.
pub fn kabsch(target: &[Point3<f64>], source: &[Point3<f64>]) -> Result<RigidTransform> {
    if target.len() != source.len() {
        return Err(Error::invalid_input(format!(
            "correspondence count mismatch: {} targets, {} sources",
            target.len(),
            source.len()
        )));
    }
    if target.len() < 3 {
        return Err(Error::degenerate(format!(
            "rigid fit needs at least 3 correspondences, got {}",
            target.len()
        )));
    }

    let n = target.len() as f64;
    let tc = target.iter().map(|p| p.coords).sum::<Vector3<f64>>() / n;
    let sc = source.iter().map(|p| p.coords).sum::<Vector3<f64>>() / n;

    let mut h = nalgebra::Matrix3::<f64>::zeros();
    for (t, s) in target.iter().zip(source) {
        h += (s.coords - sc) * (t.coords - tc).transpose();
    }

    let svd = h.svd(true, true);
    let u = svd
        .u
        .ok_or_else(|| Error::degenerate("SVD did not produce U"))?;
    let mut v_t = svd
        .v_t
        .ok_or_else(|| Error::degenerate("SVD did not produce Vᵀ"))?;

    let mut rotation = v_t.transpose() * u.transpose();
    if rotation.determinant() < 0.0 {
        let smallest = svd.singular_values.imin();
        let flipped = v_t.row(smallest) * -1.0;
        v_t.set_row(smallest, &flipped);
        rotation = v_t.transpose() * u.transpose();
    }

    let translation = tc - rotation * sc;
    Ok(RigidTransform::new(rotation, translation))
}
