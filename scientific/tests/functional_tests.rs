use mpase_core::{new_mask, set_pixel, BandwidthStrategy};
use mpase_scientific::*;
use nalgebra::Point2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn circle(cx: f64, cy: f64, r: f64, n: usize) -> Vec<Point2<f64>> {
    (0..n)
        .map(|i| {
            let t = i as f64 / n as f64 * std::f64::consts::TAU;
            Point2::new(cx + r * t.cos(), cy + r * t.sin())
        })
        .collect()
}

#[test]
fn test_concentric_contours_distance() {
    let inner = circle(0.0, 0.0, 1.0, 720);
    let outer = circle(0.0, 0.0, 3.0, 720);
    let (mean_nn, hausdorff) = contour_distances(Some(inner.as_slice()), Some(outer.as_slice()));
    assert!((mean_nn - 2.0).abs() < 1e-3);
    assert!((hausdorff - 2.0).abs() < 1e-3);

    let (m, h) = contour_distances(Some(inner.as_slice()), Some(inner.as_slice()));
    assert_eq!((m, h), (0.0, 0.0));
}

#[test]
fn test_iou_disjoint_and_identical() {
    let mut a = new_mask(10, 10);
    let mut b = new_mask(10, 10);
    for i in 0..5 {
        set_pixel(&mut a, i, i);
        set_pixel(&mut b, 9 - i, i);
    }
    assert!(iou(&a, &a).unwrap() > 0.999_999);
    assert_eq!(iou(&a, &b).unwrap(), 0.0);
}

#[test]
fn test_iou_bounds_and_symmetry_on_random_masks() {
    let mut rng = StdRng::seed_from_u64(17);
    for _ in 0..200 {
        let w = rng.gen_range(1..24);
        let h = rng.gen_range(1..24);
        let mut a = new_mask(w, h);
        let mut b = new_mask(w, h);
        let (pa, pb) = (rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0));
        for y in 0..h {
            for x in 0..w {
                if rng.gen_bool(pa) {
                    set_pixel(&mut a, x, y);
                }
                if rng.gen_bool(pb) {
                    set_pixel(&mut b, x, y);
                }
            }
        }
        let ab = iou(&a, &b).unwrap();
        let ba = iou(&b, &a).unwrap();
        assert!((0.0..=1.0 + 1e-9).contains(&ab), "iou {ab}");
        assert_eq!(ab, ba);

        set_pixel(&mut a, 0, 0);
        assert!((iou(&a, &a).unwrap() - 1.0).abs() < 1e-6);
    }
}

#[test]
fn test_kde_ranks_cluster_core_first() {
    let mut pts = circle(0.0, 0.0, 0.5, 40);
    pts.extend(circle(0.0, 0.0, 0.05, 40));
    pts.push(Point2::new(4.0, 4.0));
    let h = auto_bandwidth(&pts, BandwidthStrategy::MedianHalf, 0);
    let scores = kde_log_scores(&pts, h);
    let core_mean = mean(&scores[40..80]).unwrap();
    let rim_mean = mean(&scores[..40]).unwrap();
    assert!(core_mean > rim_mean);
    assert!(scores[80] < rim_mean);
}
