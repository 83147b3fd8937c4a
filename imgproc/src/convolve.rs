use mpase_core::DensityMap;
use rayon::prelude::*;

/// How samples beyond the field edge are synthesized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BorderMode {
    Constant(f32),
    Replicate,
    /// `d c b a | a b c d | d c b a`
    Reflect,
    /// `d c b | a b c d | c b a`
    Reflect101,
}

/// Kernel radius used for a given sigma (four standard deviations).
pub fn gaussian_radius(sigma: f64) -> usize {
    (4.0 * sigma + 0.5) as usize
}

/// Normalized 1D Gaussian of `2 * radius + 1` taps.
pub fn gaussian_kernel_1d(sigma: f64, radius: usize) -> Vec<f64> {
    let sigma2 = sigma * sigma;
    let mut kernel: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let x = i as f64 - radius as f64;
            (-0.5 * x * x / sigma2).exp()
        })
        .collect();
    let sum: f64 = kernel.iter().sum();
    if sum != 0.0 {
        for v in &mut kernel {
            *v /= sum;
        }
    }
    kernel
}

fn map_coord(coord: isize, len: usize, mode: BorderMode) -> Option<usize> {
    let n = len as isize;
    if (0..n).contains(&coord) {
        return Some(coord as usize);
    }
    match mode {
        BorderMode::Constant(_) => None,
        BorderMode::Replicate => Some(coord.clamp(0, n - 1) as usize),
        BorderMode::Reflect => {
            if n == 1 {
                return Some(0);
            }
            let period = 2 * n;
            let mut c = coord.rem_euclid(period);
            if c >= n {
                c = period - c - 1;
            }
            Some(c as usize)
        }
        BorderMode::Reflect101 => {
            if n == 1 {
                return Some(0);
            }
            let period = 2 * n - 2;
            let mut c = coord.rem_euclid(period);
            if c >= n {
                c = period - c;
            }
            Some(c as usize)
        }
    }
}

/// Correlate one line with `kernel` into `out`.
fn filter_line(line: &[f32], kernel: &[f64], border: BorderMode, out: &mut [f32]) {
    let radius = (kernel.len() / 2) as isize;
    let fill = match border {
        BorderMode::Constant(v) => v as f64,
        _ => 0.0,
    };
    for (i, o) in out.iter_mut().enumerate() {
        let mut acc = 0.0f64;
        for (k, &w) in kernel.iter().enumerate() {
            let src = i as isize + k as isize - radius;
            let v = match map_coord(src, line.len(), border) {
                Some(j) => line[j] as f64,
                None => fill,
            };
            acc += w * v;
        }
        *o = acc as f32;
    }
}

/// Separable Gaussian smoothing, rows first and then columns.
pub fn gaussian_filter_with_border(
    field: &DensityMap,
    sigma: f64,
    border: BorderMode,
) -> DensityMap {
    if sigma <= 0.0 {
        return field.clone();
    }
    let (w, h) = (field.width() as usize, field.height() as usize);
    if w == 0 || h == 0 {
        return field.clone();
    }
    let kernel = gaussian_kernel_1d(sigma, gaussian_radius(sigma));

    let mut rows = field.clone();
    let row_data: &mut [f32] = &mut rows;
    row_data
        .par_chunks_mut(w)
        .zip(field.as_raw().par_chunks(w))
        .for_each(|(dst, src)| filter_line(src, &kernel, border, dst));

    // Columns: transpose into contiguous lines, filter, write back.
    let mut cols = vec![0f32; w * h];
    let src = rows.as_raw();
    cols.par_chunks_mut(h).enumerate().for_each(|(x, dst)| {
        let line: Vec<f32> = (0..h).map(|y| src[y * w + x]).collect();
        filter_line(&line, &kernel, border, dst);
    });

    let mut out = field.clone();
    let data: &mut [f32] = &mut out;
    for x in 0..w {
        for y in 0..h {
            data[y * w + x] = cols[x * h + y];
        }
    }
    out
}

/// Gaussian smoothing with reflected borders; `sigma == 0` is the identity.
pub fn gaussian_filter(field: &DensityMap, sigma: f64) -> DensityMap {
    gaussian_filter_with_border(field, sigma, BorderMode::Reflect)
}
