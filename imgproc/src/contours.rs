use mpase_core::{new_density, new_mask, DensityMap, Mask, MASK_ON};
use nalgebra::Point2;
use std::collections::{HashMap, VecDeque};

/// Ordered iso-line in pixel space: `x` is the column, `y` the row, origin
/// at the top-left. Closed loops repeat their first point at the end.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub points: Vec<Point2<f64>>,
}

impl Contour {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.points.len() > 2 && self.points.first() == self.points.last()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectedComponentStats {
    pub label: u32,
    pub area: u32,
    pub bbox: (u32, u32, u32, u32), // x, y, width, height
    pub centroid: (f64, f64),
}

/// Per-pixel component labels (0 = background) plus per-component stats.
#[derive(Debug, Clone)]
pub struct Labeling {
    pub width: u32,
    pub height: u32,
    pub labels: Vec<u32>,
    pub stats: Vec<ConnectedComponentStats>,
}

impl Labeling {
    pub fn count(&self) -> u32 {
        self.stats.len() as u32
    }

    /// Label of the component with the most pixels; lowest label on ties.
    pub fn largest(&self) -> Option<u32> {
        let mut best: Option<&ConnectedComponentStats> = None;
        for s in &self.stats {
            if best.map_or(true, |b| s.area > b.area) {
                best = Some(s);
            }
        }
        best.map(|s| s.label)
    }

    pub fn component_mask(&self, label: u32) -> Mask {
        let mut mask = new_mask(self.width, self.height);
        let data: &mut [u8] = &mut mask;
        for (d, &l) in data.iter_mut().zip(&self.labels) {
            if l == label {
                *d = MASK_ON;
            }
        }
        mask
    }
}

const NEIGH_4: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const NEIGH_8: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

fn in_bounds(x: i32, y: i32, w: i32, h: i32) -> bool {
    x >= 0 && y >= 0 && x < w && y < h
}

/// Label connected foreground regions in row-major discovery order.
/// `connectivity` is 4 or 8; anything other than 8 means 4.
pub fn connected_components_with_stats(binary: &Mask, connectivity: u8) -> Labeling {
    let w = binary.width() as i32;
    let h = binary.height() as i32;
    let data = binary.as_raw();
    let mut labels = vec![0u32; (w * h) as usize];
    let mut stats = Vec::new();
    let neigh: &[(i32, i32)] = if connectivity == 8 { &NEIGH_8 } else { &NEIGH_4 };

    for y in 0..h {
        for x in 0..w {
            let idx = (y * w + x) as usize;
            if data[idx] == 0 || labels[idx] != 0 {
                continue;
            }

            let label = stats.len() as u32 + 1;
            let mut q = VecDeque::new();
            q.push_back((x, y));
            labels[idx] = label;

            let (mut min_x, mut min_y, mut max_x, mut max_y) = (x, y, x, y);
            let (mut area, mut sum_x, mut sum_y) = (0u32, 0f64, 0f64);

            while let Some((cx, cy)) = q.pop_front() {
                area += 1;
                min_x = min_x.min(cx);
                min_y = min_y.min(cy);
                max_x = max_x.max(cx);
                max_y = max_y.max(cy);
                sum_x += cx as f64;
                sum_y += cy as f64;

                for &(dx, dy) in neigh {
                    let (nx, ny) = (cx + dx, cy + dy);
                    if !in_bounds(nx, ny, w, h) {
                        continue;
                    }
                    let nidx = (ny * w + nx) as usize;
                    if data[nidx] == 0 || labels[nidx] != 0 {
                        continue;
                    }
                    labels[nidx] = label;
                    q.push_back((nx, ny));
                }
            }

            stats.push(ConnectedComponentStats {
                label,
                area,
                bbox: (
                    min_x as u32,
                    min_y as u32,
                    (max_x - min_x + 1) as u32,
                    (max_y - min_y + 1) as u32,
                ),
                centroid: (sum_x / area as f64, sum_y / area as f64),
            });
        }
    }

    Labeling {
        width: w as u32,
        height: h as u32,
        labels,
        stats,
    }
}

/// Set every background pixel that is not 4-connected to the image border.
pub fn fill_holes(mask: &Mask) -> Mask {
    let w = mask.width() as i32;
    let h = mask.height() as i32;
    let data = mask.as_raw();
    let mut outside = vec![false; (w * h) as usize];
    let mut q = VecDeque::new();

    for y in 0..h {
        for x in 0..w {
            let on_border = x == 0 || y == 0 || x == w - 1 || y == h - 1;
            let idx = (y * w + x) as usize;
            if on_border && data[idx] == 0 && !outside[idx] {
                outside[idx] = true;
                q.push_back((x, y));
            }
        }
    }
    while let Some((cx, cy)) = q.pop_front() {
        for &(dx, dy) in &NEIGH_4 {
            let (nx, ny) = (cx + dx, cy + dy);
            if !in_bounds(nx, ny, w, h) {
                continue;
            }
            let nidx = (ny * w + nx) as usize;
            if data[nidx] == 0 && !outside[nidx] {
                outside[nidx] = true;
                q.push_back((nx, ny));
            }
        }
    }

    let mut filled = new_mask(w as u32, h as u32);
    let dst: &mut [u8] = &mut filled;
    for (d, is_outside) in dst.iter_mut().zip(outside) {
        if !is_outside {
            *d = MASK_ON;
        }
    }
    filled
}

/// Largest 4-connected component, optionally with its holes filled.
/// An empty mask is returned unchanged.
pub fn largest_component(mask: &Mask, fill: bool) -> Mask {
    let labeling = connected_components_with_stats(mask, 4);
    let Some(label) = labeling.largest() else {
        return mask.clone();
    };
    let component = labeling.component_mask(label);
    if fill {
        fill_holes(&component)
    } else {
        component
    }
}

// Cell edge ids: horizontal edge (r, c)-(r, c+1) is 2 * (r * w + c),
// vertical edge (r, c)-(r+1, c) is 2 * (r * w + c) + 1.
fn h_edge(r: usize, c: usize, w: usize) -> usize {
    2 * (r * w + c)
}

fn v_edge(r: usize, c: usize, w: usize) -> usize {
    2 * (r * w + c) + 1
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

/// Edge id of one side of cell `(r, c)`, interpolating its crossing on first use.
fn edge_crossing(
    field: &[f32],
    w: usize,
    level: f32,
    (r, c): (usize, usize),
    side: Side,
    points: &mut HashMap<usize, Point2<f64>>,
) -> usize {
    let (id, (r0, c0), (r1, c1)) = match side {
        Side::Top => (h_edge(r, c, w), (r, c), (r, c + 1)),
        Side::Bottom => (h_edge(r + 1, c, w), (r + 1, c), (r + 1, c + 1)),
        Side::Left => (v_edge(r, c, w), (r, c), (r + 1, c)),
        Side::Right => (v_edge(r, c + 1, w), (r, c + 1), (r + 1, c + 1)),
    };
    points.entry(id).or_insert_with(|| {
        let a = field[r0 * w + c0] as f64;
        let b = field[r1 * w + c1] as f64;
        let t = (level as f64 - a) / (b - a);
        Point2::new(
            c0 as f64 + t * (c1 - c0) as f64,
            r0 as f64 + t * (r1 - r0) as f64,
        )
    });
    id
}

/// Iso-lines of `field` at `level` by marching squares.
///
/// A corner is inside when its value is strictly greater than `level`.
/// Crossing points are linearly interpolated along cell edges, ambiguous
/// saddle cells are resolved by the mean of their four corners. Contours
/// are returned in the order their first segment is met in a row-major
/// cell scan.
pub fn find_contours(field: &DensityMap, level: f32) -> Vec<Contour> {
    use Side::*;

    let (w, h) = (field.width() as usize, field.height() as usize);
    if w < 2 || h < 2 || !level.is_finite() {
        return Vec::new();
    }
    let v = field.as_raw();

    let mut points: HashMap<usize, Point2<f64>> = HashMap::new();
    let mut segments: Vec<(usize, usize)> = Vec::new();

    for r in 0..h - 1 {
        for c in 0..w - 1 {
            let ul = v[r * w + c];
            let ur = v[r * w + c + 1];
            let ll = v[(r + 1) * w + c];
            let lr = v[(r + 1) * w + c + 1];
            let case = u8::from(ul > level)
                | u8::from(ur > level) << 1
                | u8::from(lr > level) << 2
                | u8::from(ll > level) << 3;
            let center_inside = (ul + ur + ll + lr) / 4.0 > level;

            let pairs: &[(Side, Side)] = match case {
                0 | 15 => &[],
                1 | 14 => &[(Left, Top)],
                2 | 13 => &[(Top, Right)],
                3 | 12 => &[(Left, Right)],
                4 | 11 => &[(Right, Bottom)],
                6 | 9 => &[(Top, Bottom)],
                7 | 8 => &[(Left, Bottom)],
                // ul and lr inside
                5 if center_inside => &[(Top, Right), (Left, Bottom)],
                5 => &[(Left, Top), (Right, Bottom)],
                // ur and ll inside
                _ if center_inside => &[(Left, Top), (Right, Bottom)],
                _ => &[(Top, Right), (Left, Bottom)],
            };
            for &(s0, s1) in pairs {
                let a = edge_crossing(v, w, level, (r, c), s0, &mut points);
                let b = edge_crossing(v, w, level, (r, c), s1, &mut points);
                segments.push((a, b));
            }
        }
    }

    assemble(&segments, &points)
}

/// Chain segments sharing an edge id into polylines.
fn assemble(segments: &[(usize, usize)], points: &HashMap<usize, Point2<f64>>) -> Vec<Contour> {
    let mut incident: HashMap<usize, Vec<usize>> = HashMap::new();
    for (i, &(a, b)) in segments.iter().enumerate() {
        incident.entry(a).or_default().push(i);
        incident.entry(b).or_default().push(i);
    }

    let mut used = vec![false; segments.len()];
    // Follow unused segments from `node`, returning the visited edge ids.
    let walk = |start: usize, used: &mut Vec<bool>| {
        let mut chain = Vec::new();
        let mut node = start;
        loop {
            let next = incident
                .get(&node)
                .and_then(|segs| segs.iter().copied().find(|&s| !used[s]));
            let Some(s) = next else { break };
            used[s] = true;
            let (a, b) = segments[s];
            node = if a == node { b } else { a };
            chain.push(node);
        }
        chain
    };

    let mut contours = Vec::new();
    for i in 0..segments.len() {
        if used[i] {
            continue;
        }
        used[i] = true;
        let (a, b) = segments[i];
        let forward = walk(b, &mut used);
        let closed = forward.last() == Some(&a);

        let mut ids: VecDeque<usize> = VecDeque::new();
        if closed {
            ids.push_back(a);
            ids.push_back(b);
            ids.extend(forward);
        } else {
            let backward = walk(a, &mut used);
            for id in backward {
                ids.push_front(id);
            }
            ids.push_back(a);
            ids.push_back(b);
            ids.extend(forward);
        }

        let pts: Vec<Point2<f64>> = ids.iter().filter_map(|id| points.get(id).copied()).collect();
        contours.push(Contour { points: pts });
    }
    contours
}

/// Contour with the most vertices; the first one wins ties.
pub fn longest_contour(contours: Vec<Contour>) -> Option<Contour> {
    let mut best: Option<Contour> = None;
    for c in contours {
        if best.as_ref().map_or(true, |b| c.len() > b.len()) {
            best = Some(c);
        }
    }
    best
}

/// Longest boundary of a binary mask traced at level 0.5.
/// `None` when the mask has no set pixel.
pub fn contour_from_mask(mask: &Mask) -> Option<Contour> {
    if !mask.as_raw().iter().any(|&v| v > 0) {
        return None;
    }
    let mut field = new_density(mask.width(), mask.height());
    let data: &mut [f32] = &mut field;
    for (d, &m) in data.iter_mut().zip(mask.as_raw()) {
        *d = if m > 0 { 1.0 } else { 0.0 };
    }
    longest_contour(find_contours(&field, 0.5))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpase_core::{mask_count, set_pixel};

    fn square_mask(w: u32, h: u32, x0: u32, y0: u32, side: u32) -> Mask {
        let mut m = new_mask(w, h);
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                set_pixel(&mut m, x, y);
            }
        }
        m
    }

    #[test]
    fn components_are_labelled_in_scan_order() {
        let mut m = square_mask(10, 10, 6, 6, 3);
        set_pixel(&mut m, 0, 0);
        set_pixel(&mut m, 1, 1);
        let four = connected_components_with_stats(&m, 4);
        assert_eq!(four.count(), 3);
        assert_eq!(four.stats[0].bbox, (0, 0, 1, 1));
        assert_eq!(four.largest(), Some(3));
        let eight = connected_components_with_stats(&m, 8);
        assert_eq!(eight.count(), 2);
        assert_eq!(eight.stats[0].area, 2);
    }

    #[test]
    fn largest_component_ties_keep_first() {
        let mut m = new_mask(6, 3);
        set_pixel(&mut m, 0, 0);
        set_pixel(&mut m, 4, 2);
        let kept = largest_component(&m, false);
        assert_eq!(mask_count(&kept), 1);
        assert!(mpase_core::is_set(&kept, 0, 0));
    }

    #[test]
    fn marching_squares_closed_loop() {
        let m = square_mask(8, 8, 2, 2, 3);
        let contours = find_contours(&{
            let mut f = new_density(8, 8);
            for (d, &v) in f.iter_mut().zip(m.as_raw()) {
                *d = if v > 0 { 1.0 } else { 0.0 };
            }
            f
        }, 0.5);
        assert_eq!(contours.len(), 1);
        let c = &contours[0];
        assert!(c.is_closed());
        // 3x3 block: 3 crossings per side plus 4 corner cuts, plus the repeat.
        assert_eq!(c.len(), 13);
        for p in &c.points {
            assert!(p.x >= 1.5 && p.x <= 4.5 && p.y >= 1.5 && p.y <= 4.5);
        }
    }

    #[test]
    fn interpolation_is_linear() {
        let f = mpase_core::density_from_vec(2, 2, vec![0.0, 4.0, 0.0, 4.0]).unwrap();
        let contours = find_contours(&f, 1.0);
        assert_eq!(contours.len(), 1);
        for p in &contours[0].points {
            assert!((p.x - 0.25).abs() < 1e-9);
        }
        assert!(!contours[0].is_closed());
    }

    #[test]
    fn empty_mask_has_no_contour() {
        assert!(contour_from_mask(&new_mask(5, 5)).is_none());
        assert!(contour_from_mask(&square_mask(9, 9, 3, 3, 2)).is_some());
    }
}
