pub use image::{GrayImage, ImageBuffer, Luma};

/// Binary pixel mask, `width = nx`, `height = ny`. Non-zero pixels are set.
pub type Mask = GrayImage;

/// Single-channel floating point field laid out `[ny, nx]`.
pub type DensityMap = ImageBuffer<Luma<f32>, Vec<f32>>;

pub const MASK_ON: u8 = 255;

pub fn new_mask(width: u32, height: u32) -> Mask {
    GrayImage::new(width, height)
}

pub fn new_density(width: u32, height: u32) -> DensityMap {
    ImageBuffer::new(width, height)
}

pub fn density_from_vec(width: u32, height: u32, data: Vec<f32>) -> Option<DensityMap> {
    ImageBuffer::from_raw(width, height, data)
}

pub fn is_set(mask: &Mask, x: u32, y: u32) -> bool {
    mask.get_pixel(x, y)[0] > 0
}

pub fn set_pixel(mask: &mut Mask, x: u32, y: u32) {
    mask.put_pixel(x, y, Luma([MASK_ON]));
}

/// Number of set pixels.
pub fn mask_count(mask: &Mask) -> usize {
    mask.as_raw().iter().filter(|&&v| v > 0).count()
}

/// In-place union; masks must share dimensions.
pub fn mask_or_assign(dst: &mut Mask, src: &Mask) {
    debug_assert_eq!(dst.dimensions(), src.dimensions());
    for (d, s) in dst.iter_mut().zip(src.as_raw().iter()) {
        if *s > 0 {
            *d = MASK_ON;
        }
    }
}

/// Pixels set in both masks. Panics in debug builds on mismatched sizes.
pub fn mask_and_count(a: &Mask, b: &Mask) -> usize {
    debug_assert_eq!(a.dimensions(), b.dimensions());
    a.as_raw()
        .iter()
        .zip(b.as_raw().iter())
        .filter(|(&x, &y)| x > 0 && y > 0)
        .count()
}

/// Mask of pixels where `field >= threshold`.
pub fn mask_at_least(field: &DensityMap, threshold: f32) -> Mask {
    let (w, h) = field.dimensions();
    let data = field
        .as_raw()
        .iter()
        .map(|&v| if v >= threshold { MASK_ON } else { 0 })
        .collect();
    // Same dimensions and length as the source field.
    GrayImage::from_raw(w, h, data).unwrap_or_else(|| GrayImage::new(w, h))
}

/// Row-major boolean copy.
pub fn mask_to_rows(mask: &Mask) -> Vec<Vec<u8>> {
    mask.rows()
        .map(|row| row.map(|p| u8::from(p[0] > 0)).collect())
        .collect()
}

pub fn density_to_rows(field: &DensityMap) -> Vec<Vec<f32>> {
    field.rows().map(|row| row.map(|p| p[0]).collect()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_mask_counts() {
        let field = density_from_vec(3, 2, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let m = mask_at_least(&field, 2.5);
        assert_eq!(mask_count(&m), 3);
        assert!(!is_set(&m, 2, 0));
        assert!(is_set(&m, 0, 1));
        assert_eq!(mask_count(&mask_at_least(&field, f32::INFINITY)), 0);
    }

    #[test]
    fn union_and_rows() {
        let mut a = new_mask(2, 2);
        let mut b = new_mask(2, 2);
        set_pixel(&mut a, 0, 0);
        set_pixel(&mut b, 1, 1);
        mask_or_assign(&mut a, &b);
        assert_eq!(mask_to_rows(&a), vec![vec![1, 0], vec![0, 1]]);
    }
}
