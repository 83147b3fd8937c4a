use nalgebra::{Matrix3, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A labelled 3D point set as supplied by a loader.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSet {
    pub label: String,
    pub points: Vec<Point3<f64>>,
}

impl PointSet {
    pub fn new(label: impl Into<String>, points: Vec<Point3<f64>>) -> Self {
        Self {
            label: label.into(),
            points,
        }
    }

    pub fn from_rows(label: impl Into<String>, rows: &[[f64; 3]]) -> Self {
        Self::new(
            label,
            rows.iter().map(|r| Point3::new(r[0], r[1], r[2])).collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Arithmetic mean of the points, `None` for an empty set.
    pub fn centroid(&self) -> Option<Point3<f64>> {
        centroid(&self.points)
    }

    /// Copy of the points translated so the centroid sits at the origin.
    pub fn centered(&self) -> Vec<Point3<f64>> {
        match self.centroid() {
            Some(c) => self.points.iter().map(|p| Point3::from(p - c)).collect(),
            None => Vec::new(),
        }
    }

    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        bounds(&self.points)
    }
}

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc: Vector3<f64>, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}

/// Axis-aligned (min, max) corners.
pub fn bounds(points: &[Point3<f64>]) -> Option<(Point3<f64>, Point3<f64>)> {
    let first = points.first()?;
    let mut mn = *first;
    let mut mx = *first;
    for p in &points[1..] {
        for k in 0..3 {
            mn[k] = mn[k].min(p[k]);
            mx[k] = mx[k].max(p[k]);
        }
    }
    Some((mn, mx))
}

/// Rigid transform `x -> R x + t`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    pub rotation: Matrix3<f64>,
    pub translation: Vector3<f64>,
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl RigidTransform {
    pub fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }

    pub fn new(rotation: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn from_rotation(rotation: Matrix3<f64>) -> Self {
        Self::new(rotation, Vector3::zeros())
    }

    pub fn apply(&self, p: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation * p.coords + self.translation)
    }

    pub fn apply_all(&self, points: &[Point3<f64>]) -> Vec<Point3<f64>> {
        points.iter().map(|p| self.apply(p)).collect()
    }

    /// Transform equivalent to applying `first` and then `self`.
    pub fn compose(&self, first: &RigidTransform) -> RigidTransform {
        RigidTransform {
            rotation: self.rotation * first.rotation,
            translation: self.rotation * first.translation + self.translation,
        }
    }
}

/// A point set expressed in the shared reference frame.
///
/// `points = transform(raw - centroid) / scale`.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPointSet {
    pub label: String,
    pub points: Vec<Point3<f64>>,
    pub transform: RigidTransform,
    pub centroid: Point3<f64>,
    pub scale: f64,
}

impl AlignedPointSet {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
