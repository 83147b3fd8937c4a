//! Extracted shapes and their flat lookup table.

use mpase_core::{LevelSelector, Mask, Plane, Variant};
use mpase_imgproc::Contour;
use std::collections::BTreeMap;

/// One silhouette of one label at one (plane, level, variant).
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeProduct {
    pub plane: Plane,
    /// Coverage in integer percent.
    pub level: i32,
    pub variant: Variant,
    pub mask: Mask,
    /// Main boundary in pixel space; `None` when the mask has none.
    pub contour: Option<Contour>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShapeKey {
    pub variant: Variant,
    pub plane: Plane,
    pub level: i32,
    pub label: String,
}

impl ShapeKey {
    pub fn new(variant: Variant, plane: Plane, level: i32, label: impl Into<String>) -> Self {
        Self {
            variant,
            plane,
            level,
            label: label.into(),
        }
    }
}

/// Every shape of a run keyed by `(variant, plane, level, label)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeTable {
    shapes: BTreeMap<ShapeKey, ShapeProduct>,
}

impl ShapeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, shape: ShapeProduct) {
        let key = ShapeKey::new(shape.variant, shape.plane, shape.level, label);
        self.shapes.insert(key, shape);
    }

    pub fn get(
        &self,
        variant: Variant,
        plane: Plane,
        level: i32,
        label: &str,
    ) -> Option<&ShapeProduct> {
        self.shapes.get(&ShapeKey::new(variant, plane, level, label))
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ShapeKey, &ShapeProduct)> {
        self.shapes.iter()
    }

    /// Levels present for a variant and plane, highest first.
    pub fn levels(&self, variant: Variant, plane: Plane) -> Vec<i32> {
        let mut levels: Vec<i32> = self
            .shapes
            .keys()
            .filter(|k| k.variant == variant && k.plane == plane)
            .map(|k| k.level)
            .collect();
        levels.sort_unstable_by(|a, b| b.cmp(a));
        levels.dedup();
        levels
    }

    /// Present levels narrowed by a selector, highest first.
    pub fn select_levels(
        &self,
        variant: Variant,
        plane: Plane,
        selector: &LevelSelector,
    ) -> Vec<i32> {
        self.levels(variant, plane)
            .into_iter()
            .filter(|&l| selector.contains(l))
            .collect()
    }

    /// Labels with a shape at `(variant, plane, level)`, in key order.
    pub fn labels_at(&self, variant: Variant, plane: Plane, level: i32) -> Vec<&str> {
        self.shapes
            .keys()
            .filter(|k| k.variant == variant && k.plane == plane && k.level == level)
            .map(|k| k.label.as_str())
            .collect()
    }

    /// Variants that have at least one shape.
    pub fn variants(&self) -> Vec<Variant> {
        Variant::ALL
            .into_iter()
            .filter(|v| self.shapes.keys().any(|k| k.variant == *v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpase_core::new_mask;

    fn shape(variant: Variant, plane: Plane, level: i32) -> ShapeProduct {
        ShapeProduct {
            plane,
            level,
            variant,
            mask: new_mask(4, 4),
            contour: None,
        }
    }

    #[test]
    fn lookup_by_composite_key() {
        let mut table = ShapeTable::new();
        for label in ["b", "a"] {
            for level in [50, 100, 90] {
                table.insert(label, shape(Variant::Hdr, Plane::XY, level));
            }
        }
        table.insert("a", shape(Variant::PointFraction, Plane::YZ, 80));

        assert_eq!(table.len(), 7);
        assert!(table.get(Variant::Hdr, Plane::XY, 90, "b").is_some());
        assert!(table.get(Variant::Hdr, Plane::YZ, 90, "b").is_none());
        assert_eq!(table.levels(Variant::Hdr, Plane::XY), vec![100, 90, 50]);
        assert_eq!(
            table.select_levels(Variant::Hdr, Plane::XY, &LevelSelector::Many(vec![50, 90, 70])),
            vec![90, 50]
        );
        assert_eq!(table.labels_at(Variant::Hdr, Plane::XY, 50), vec!["a", "b"]);
        assert_eq!(table.variants(), vec![Variant::Hdr, Variant::PointFraction]);
    }
}
