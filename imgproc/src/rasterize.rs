use mpase_core::{new_mask, Mask, MASK_ON};
use nalgebra::Point2;

/// Offsets `(dx, dy)` with `dx² + dy² <= r²`.
pub fn disk_offsets(radius: u32) -> Vec<(i32, i32)> {
    let r = radius as i32;
    let mut offsets = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= r * r {
                offsets.push((dx, dy));
            }
        }
    }
    offsets
}

/// Pixel whose center precedes `v`: the left insertion point into the
/// ascending `centers` minus one, clipped to the valid range.
pub fn pixel_index(centers: &[f64], v: f64) -> usize {
    let n = centers.len();
    if n == 0 {
        return 0;
    }
    let i = centers.partition_point(|&c| c < v);
    i.saturating_sub(1).min(n - 1)
}

/// OR-splat a disk of radius `disk_px` around the pixel of every point.
///
/// `xs` and `ys` are pixel center coordinates; the mask is `xs.len()` wide
/// and `ys.len()` tall.
pub fn rasterize_points(points: &[Point2<f64>], xs: &[f64], ys: &[f64], disk_px: u32) -> Mask {
    let (nx, ny) = (xs.len() as i32, ys.len() as i32);
    let mut mask = new_mask(nx as u32, ny as u32);
    if nx == 0 || ny == 0 {
        return mask;
    }
    let disk = disk_offsets(disk_px);
    let width = nx as usize;
    let data: &mut [u8] = &mut mask;

    for p in points {
        let cx = pixel_index(xs, p.x) as i32;
        let cy = pixel_index(ys, p.y) as i32;
        for &(dx, dy) in &disk {
            let (x, y) = (cx + dx, cy + dy);
            if x >= 0 && y >= 0 && x < nx && y < ny {
                data[y as usize * width + x as usize] = MASK_ON;
            }
        }
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpase_core::{is_set, mask_count};

    #[test]
    fn disk_sizes() {
        assert_eq!(disk_offsets(0), vec![(0, 0)]);
        assert_eq!(disk_offsets(1).len(), 5);
        assert_eq!(disk_offsets(2).len(), 13);
    }

    #[test]
    fn index_uses_left_insertion_minus_one() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(pixel_index(&xs, -5.0), 0);
        assert_eq!(pixel_index(&xs, 0.0), 0);
        assert_eq!(pixel_index(&xs, 1.0), 0);
        assert_eq!(pixel_index(&xs, 1.5), 1);
        assert_eq!(pixel_index(&xs, 3.0), 2);
        assert_eq!(pixel_index(&xs, 9.0), 3);
    }

    #[test]
    fn splat_is_clipped_at_border() {
        let xs: Vec<f64> = (0..10).map(f64::from).collect();
        let ys: Vec<f64> = (0..8).map(f64::from).collect();
        let m = rasterize_points(&[Point2::new(-1.0, -1.0)], &xs, &ys, 2);
        assert_eq!(m.dimensions(), (10, 8));
        // Quarter of the radius-2 disk survives in the corner.
        assert_eq!(mask_count(&m), 6);
        assert!(is_set(&m, 0, 0) && is_set(&m, 2, 0) && is_set(&m, 1, 1));
        assert!(!is_set(&m, 2, 1));
    }
}
