use mpase_core::{new_mask, Mask, MASK_ON};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorphShape {
    Rectangle,
    Cross,
}

/// Structuring element offsets centered on the origin, without duplicates.
pub fn create_morph_kernel(shape: MorphShape, width: u32, height: u32) -> Vec<(i32, i32)> {
    let rx = width as i32 / 2;
    let ry = height as i32 / 2;
    let mut kernel = Vec::new();
    for dy in -ry..=ry {
        for dx in -rx..=rx {
            let keep = match shape {
                MorphShape::Rectangle => true,
                MorphShape::Cross => dx == 0 || dy == 0,
            };
            if keep {
                kernel.push((dx, dy));
            }
        }
    }
    kernel
}

/// 3×3 cross: the center and its four edge neighbours.
pub fn cross_kernel() -> Vec<(i32, i32)> {
    create_morph_kernel(MorphShape::Cross, 3, 3)
}

fn step(current: &Mask, kernel: &[(i32, i32)], dilate: bool) -> Mask {
    let (w, h) = (current.width() as i32, current.height() as i32);
    let src = current.as_raw();
    let mut output = new_mask(w as u32, h as u32);
    let dst: &mut [u8] = &mut output;

    for y in 0..h {
        for x in 0..w {
            // Everything outside the image is background.
            let sample = |&(kx, ky): &(i32, i32)| {
                let (px, py) = (x + kx, y + ky);
                px >= 0 && py >= 0 && px < w && py < h && src[(py * w + px) as usize] > 0
            };
            let on = if dilate {
                kernel.iter().any(sample)
            } else {
                kernel.iter().all(sample)
            };
            if on {
                dst[(y * w + x) as usize] = MASK_ON;
            }
        }
    }
    output
}

pub fn binary_dilate(mask: &Mask, kernel: &[(i32, i32)], iterations: u32) -> Mask {
    let mut output = mask.clone();
    for _ in 0..iterations {
        output = step(&output, kernel, true);
    }
    output
}

/// Erosion with a zero border: set pixels touching the edge are removed.
pub fn binary_erode(mask: &Mask, kernel: &[(i32, i32)], iterations: u32) -> Mask {
    let mut output = mask.clone();
    for _ in 0..iterations {
        output = step(&output, kernel, false);
    }
    output
}

/// Dilate then erode, `iterations` times each.
pub fn binary_close(mask: &Mask, kernel: &[(i32, i32)], iterations: u32) -> Mask {
    binary_erode(&binary_dilate(mask, kernel, iterations), kernel, iterations)
}

/// Erode then dilate, `iterations` times each.
pub fn binary_open(mask: &Mask, kernel: &[(i32, i32)], iterations: u32) -> Mask {
    binary_dilate(&binary_erode(mask, kernel, iterations), kernel, iterations)
}
