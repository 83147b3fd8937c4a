use crate::{validate_image_size, ImgprocError, Result};
use mpase_core::{new_density, DensityMap};
use nalgebra::Point2;

/// Bin of `v` in ascending `edges`: half-open bins, the last one closed.
/// Values outside `[edges[0], edges[last]]` (and NaN) fall in no bin.
pub fn bin_index(edges: &[f64], v: f64) -> Option<usize> {
    let nbins = edges.len().checked_sub(1)?;
    if nbins == 0 || !(v >= edges[0] && v <= edges[nbins]) {
        return None;
    }
    let i = edges.partition_point(|&e| e <= v);
    Some((i - 1).min(nbins - 1))
}

fn check_edges(edges_x: &[f64], edges_y: &[f64]) -> Result<(u32, u32)> {
    if edges_x.len() < 2 || edges_y.len() < 2 {
        return Err(ImgprocError::AlgorithmError(
            "histogram needs at least two edges per axis".into(),
        ));
    }
    let nx = (edges_x.len() - 1) as u32;
    let ny = (edges_y.len() - 1) as u32;
    validate_image_size(nx, ny)?;
    Ok((nx, ny))
}

/// Flat `[ny, nx]` pixel index of every point, `None` when outside the edges.
pub fn bin_indices_2d(
    points: &[Point2<f64>],
    edges_x: &[f64],
    edges_y: &[f64],
) -> Result<Vec<Option<u32>>> {
    let (nx, _) = check_edges(edges_x, edges_y)?;
    Ok(points
        .iter()
        .map(|p| {
            let ix = bin_index(edges_x, p.x)?;
            let iy = bin_index(edges_y, p.y)?;
            Some((iy * nx as usize + ix) as u32)
        })
        .collect())
}

/// Count the points selected by `sample` (indices into `bins`, repeats allowed).
pub fn histogram_from_bins(bins: &[Option<u32>], sample: &[usize], nx: u32, ny: u32) -> DensityMap {
    let mut hist = new_density(nx, ny);
    let data: &mut [f32] = &mut hist;
    for &i in sample {
        if let Some(Some(b)) = bins.get(i) {
            data[*b as usize] += 1.0;
        }
    }
    hist
}

/// 2D point counts on the given bin edges, laid out `[ny, nx]`.
pub fn histogram_2d(
    points: &[Point2<f64>],
    edges_x: &[f64],
    edges_y: &[f64],
) -> Result<DensityMap> {
    let (nx, ny) = check_edges(edges_x, edges_y)?;
    let bins = bin_indices_2d(points, edges_x, edges_y)?;
    let all: Vec<usize> = (0..points.len()).collect();
    Ok(histogram_from_bins(&bins, &all, nx, ny))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_bin_is_closed() {
        let edges = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(bin_index(&edges, 0.0), Some(0));
        assert_eq!(bin_index(&edges, 1.0), Some(1));
        assert_eq!(bin_index(&edges, 2.999), Some(2));
        assert_eq!(bin_index(&edges, 3.0), Some(2));
        assert_eq!(bin_index(&edges, 3.0001), None);
        assert_eq!(bin_index(&edges, -0.1), None);
        assert_eq!(bin_index(&edges, f64::NAN), None);
    }

    #[test]
    fn counts_are_row_major_y_then_x() {
        let ex = [0.0, 1.0, 2.0, 3.0];
        let ey = [0.0, 1.0, 2.0];
        let pts = [
            Point2::new(2.5, 0.5),
            Point2::new(2.5, 0.7),
            Point2::new(0.1, 1.9),
            Point2::new(9.0, 0.5),
        ];
        let h = histogram_2d(&pts, &ex, &ey).unwrap();
        assert_eq!(h.dimensions(), (3, 2));
        assert_eq!(h.get_pixel(2, 0)[0], 2.0);
        assert_eq!(h.get_pixel(0, 1)[0], 1.0);
        assert_eq!(h.as_raw().iter().sum::<f32>(), 3.0);
    }

    #[test]
    fn resample_counts_repeats() {
        let ex = [0.0, 1.0, 2.0];
        let ey = [0.0, 1.0];
        let pts = [Point2::new(0.5, 0.5), Point2::new(1.5, 0.5)];
        let bins = bin_indices_2d(&pts, &ex, &ey).unwrap();
        let h = histogram_from_bins(&bins, &[1, 1, 1, 0], 2, 1);
        assert_eq!(h.as_raw(), &vec![1.0, 3.0]);
    }
}
