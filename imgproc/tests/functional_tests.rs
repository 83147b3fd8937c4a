use mpase_core::{is_set, mask_count, new_mask, set_pixel, Mask};
use mpase_imgproc::*;
use nalgebra::Point2;

fn ring(size: u32, inner: i32, outer: i32, gap: bool) -> Mask {
    let mut m = new_mask(size, size);
    let c = size as i32 / 2;
    for y in 0..size as i32 {
        for x in 0..size as i32 {
            let d2 = (x - c).pow(2) + (y - c).pow(2);
            let in_gap = gap && x > c && (y - c).abs() <= 1;
            if d2 >= inner * inner && d2 <= outer * outer && !in_gap {
                set_pixel(&mut m, x as u32, y as u32);
            }
        }
    }
    m
}

#[test]
fn test_fill_holes_closed_ring() {
    let m = ring(31, 6, 9, false);
    assert!(!is_set(&m, 15, 15));
    let filled = fill_holes(&m);
    assert!(is_set(&filled, 15, 15));
    assert!(mask_count(&filled) > mask_count(&m));
    // Nothing outside the ring changes.
    assert!(!is_set(&filled, 0, 0));
}

#[test]
fn test_fill_holes_open_c_shape() {
    let m = ring(31, 6, 9, true);
    let filled = fill_holes(&m);
    assert_eq!(filled, m);
    assert!(!is_set(&filled, 15, 15));
}

#[test]
fn test_largest_component_drops_specks() {
    let mut m = ring(31, 6, 9, false);
    set_pixel(&mut m, 0, 30);
    set_pixel(&mut m, 30, 0);
    let kept = largest_component(&m, false);
    assert!(!is_set(&kept, 0, 30));
    assert!(!is_set(&kept, 30, 0));
    assert_eq!(mask_count(&kept), mask_count(&m) - 2);

    let solid = largest_component(&m, true);
    assert!(is_set(&solid, 15, 15));
}

#[test]
fn test_contour_of_ring_is_outer_boundary() {
    let m = ring(41, 6, 12, false);
    let outer = contour_from_mask(&m).unwrap();
    assert!(outer.is_closed());
    let max_r = outer
        .points
        .iter()
        .map(|p| ((p.x - 20.0).powi(2) + (p.y - 20.0).powi(2)).sqrt())
        .fold(0.0, f64::max);
    assert!(max_r > 11.0 && max_r < 13.5, "outer radius {max_r}");

    let all = find_contours(&{
        let mut f = mpase_core::new_density(41, 41);
        for (d, &v) in f.iter_mut().zip(m.as_raw()) {
            *d = f32::from(u8::from(v > 0));
        }
        f
    }, 0.5);
    assert_eq!(all.len(), 2);
}

#[test]
fn test_rasterize_and_clean_cluster() {
    let xs: Vec<f64> = (0..64).map(|i| i as f64 / 63.0).collect();
    let ys: Vec<f64> = (0..48).map(|i| i as f64 / 47.0).collect();
    let mut pts = Vec::new();
    for i in 0..20 {
        for j in 0..20 {
            pts.push(Point2::new(0.3 + i as f64 * 0.01, 0.4 + j as f64 * 0.01));
        }
    }
    pts.push(Point2::new(0.95, 0.05));

    let raw = rasterize_points(&pts, &xs, &ys, 2);
    assert_eq!(raw.dimensions(), (64, 48));
    let k = cross_kernel();
    let cleaned = largest_component(&binary_open(&binary_close(&raw, &k, 1), &k, 1), true);
    assert!(mask_count(&cleaned) > 0);
    assert!(mask_count(&cleaned) < mask_count(&raw));
    assert_eq!(connected_components_with_stats(&cleaned, 4).count(), 1);
    assert!(contour_from_mask(&cleaned).is_some());
}

#[test]
fn test_histogram_then_smooth() {
    let edges: Vec<f64> = (0..=32).map(|i| i as f64).collect();
    let pts: Vec<Point2<f64>> = (0..100).map(|_| Point2::new(16.5, 10.5)).collect();
    let h = histogram_2d(&pts, &edges, &edges).unwrap();
    let d = gaussian_filter(&h, 1.2);
    let total: f32 = d.as_raw().iter().sum();
    assert!((total - 100.0).abs() < 1e-2);
    assert!(histogram_2d(&pts, &edges[..1], &edges).is_err());
}
