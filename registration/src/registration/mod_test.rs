#[cfg(test)]
mod tests {
    use crate::registration::{
        align_to_reference, best_pca_prealign, icp_rigid_robust, kabsch, nn_rmse, pca_axes,
        IcpParams,
    };
    use mpase_core::{CfgCommon, Error, RigidTransform};
    use nalgebra::{Matrix3, Point3, Rotation3, Vector3};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Anisotropic blob with clearly separated principal variances.
    fn blob(n: usize, seed: u64) -> Vec<Point3<f64>> {
        let mut rng = StdRng::seed_from_u64(seed);
        let pts: Vec<Point3<f64>> = (0..n)
            .map(|_| {
                Point3::new(
                    rng.gen_range(-3.0..3.0),
                    rng.gen_range(-1.5..1.5),
                    rng.gen_range(-0.5..0.5),
                )
            })
            .collect();
        let c = mpase_core::centroid(&pts).unwrap();
        pts.iter().map(|p| Point3::from(p - c)).collect()
    }

    fn rotation_error(r: &Matrix3<f64>, expected: &Matrix3<f64>) -> f64 {
        (r - expected).norm()
    }

    #[test]
    fn test_kabsch_recovers_known_transform() {
        let src = blob(200, 1);
        let rot = Rotation3::from_euler_angles(0.3, -0.7, 1.1).into_inner();
        let t = Vector3::new(0.5, -2.0, 3.0);
        let truth = RigidTransform::new(rot, t);
        let dst = truth.apply_all(&src);

        let fit = kabsch(&dst, &src).unwrap();
        assert!(rotation_error(&fit.rotation, &rot) < 1e-9);
        assert!((fit.translation - t).norm() < 1e-9);
        assert!((fit.rotation.determinant() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_kabsch_never_returns_reflection() {
        let src = blob(100, 2);
        let mirrored: Vec<Point3<f64>> = src.iter().map(|p| Point3::new(p.x, p.y, -p.z)).collect();
        let fit = kabsch(&mirrored, &src).unwrap();
        assert!((fit.rotation.determinant() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_kabsch_rejects_bad_input() {
        let a = blob(5, 3);
        assert!(matches!(kabsch(&a, &a[..4]), Err(Error::InvalidInput(_))));
        assert!(matches!(kabsch(&a[..2], &a[..2]), Err(Error::Degenerate(_))));
    }

    #[test]
    fn test_pca_axes_sorted_and_right_handed() {
        let pts = blob(500, 4);
        let v = pca_axes(&pts).unwrap();
        assert!((v.determinant() - 1.0).abs() < 1e-9);
        // Dominant variance lies along x.
        assert!(v.column(0)[0].abs() > 0.95);
        assert!(v.column(2)[2].abs() > 0.95);
    }

    #[test]
    fn test_pca_axes_degenerate_input() {
        let line: Vec<Point3<f64>> = (0..20).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect();
        assert!(matches!(pca_axes(&line), Err(Error::Degenerate(_))));
        assert!(matches!(pca_axes(&line[..2]), Err(Error::Degenerate(_))));
    }

    #[test]
    fn test_prealign_recovers_axis_swap() {
        let a = blob(400, 5);
        // Swap x/y and flip z: a proper rotation from the 48 candidates.
        let swap = Matrix3::new(0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, -1.0);
        let b: Vec<Point3<f64>> = a.iter().map(|p| Point3::from(swap * p.coords)).collect();

        let pre = best_pca_prealign(&b, &a).unwrap();
        assert!(pre.rmse < 1e-9, "rmse {}", pre.rmse);
        let back: Vec<Point3<f64>> = b.iter().map(|p| Point3::from(pre.rotation * p.coords)).collect();
        assert!(nn_rmse(&a, &back).unwrap() < 1e-9);
    }

    #[test]
    fn test_icp_self_alignment_is_identity() {
        let a = blob(300, 6);
        let res = icp_rigid_robust(&a, &a, &IcpParams::default()).unwrap();
        assert_eq!(res.iterations, 30);
        assert_eq!(res.rmse_history.len(), 30);
        assert!(rotation_error(&res.transform.rotation, &Matrix3::identity()) < 1e-9);
        assert!(res.transform.translation.norm() < 1e-9);
        assert!(res.final_rmse < 1e-9);
    }

    #[test]
    fn test_icp_refines_small_offset() {
        let a = blob(600, 7);
        let rot = Rotation3::from_euler_angles(0.02, 0.03, -0.04).into_inner();
        let truth = RigidTransform::new(rot, Vector3::new(0.02, -0.03, 0.01));
        let b = truth.apply_all(&a);

        let params = IcpParams {
            trim_q: 0.0,
            ..IcpParams::default()
        };
        let res = icp_rigid_robust(&a, &b, &params).unwrap();
        let restored = res.transform.apply_all(&b);
        let err: f64 = restored
            .iter()
            .zip(&a)
            .map(|(p, q)| (p - q).norm())
            .fold(0.0, f64::max);
        assert!(err < 1e-3, "max residual {err}");
        assert!(res.rmse_history.first() >= res.rmse_history.last());
    }

    #[test]
    fn test_icp_subsampling_is_seeded() {
        let a = blob(400, 8);
        let b = blob(400, 9);
        let params = IcpParams {
            sample: 100,
            iters: 5,
            ..IcpParams::default()
        };
        let r1 = icp_rigid_robust(&a, &b, &params).unwrap();
        let r2 = icp_rigid_robust(&a, &b, &params).unwrap();
        assert_eq!(r1.transform, r2.transform);
        assert_eq!(r1.rmse_history, r2.rmse_history);
    }

    #[test]
    fn test_icp_on_three_points() {
        let a = vec![
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(-0.5, 0.8, 0.0),
            Point3::new(-0.5, -0.8, 0.1),
        ];
        let res = icp_rigid_robust(&a, &a, &IcpParams::default()).unwrap();
        assert!(res.final_rmse < 1e-9);

        let rot = Rotation3::from_euler_angles(0.01, -0.02, 0.015).into_inner();
        let b: Vec<Point3<f64>> = a.iter().map(|p| Point3::from(rot * p.coords)).collect();
        let res = icp_rigid_robust(&a, &b, &IcpParams::default()).unwrap();
        assert!(res.final_rmse < 1e-9, "rmse {}", res.final_rmse);

        let aligned = align_to_reference(&a, &b, &CfgCommon::default()).unwrap();
        assert!(nn_rmse(&a, &aligned.transform.apply_all(&b)).unwrap() < 1e-6);
    }

    #[test]
    fn test_align_to_reference_large_rotation() {
        let a = blob(800, 10);
        let rot = Rotation3::from_euler_angles(1.2, -0.4, 2.5).into_inner();
        let b: Vec<Point3<f64>> = a.iter().map(|p| Point3::from(rot * p.coords)).collect();

        let aligned = align_to_reference(&a, &b, &CfgCommon::default()).unwrap();
        let moved = aligned.transform.apply_all(&b);
        assert!(nn_rmse(&a, &moved).unwrap() < 1e-6);
        assert!((aligned.transform.rotation.determinant().abs() - 1.0).abs() < 1e-9);
    }
}
