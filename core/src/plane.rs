use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Orthogonal projection plane. Each plane keeps two axes and drops the third.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Plane {
    XY,
    YZ,
    XZ,
}

impl Plane {
    pub const ALL: [Plane; 3] = [Plane::XY, Plane::YZ, Plane::XZ];

    /// Retained axis indices, horizontal first.
    pub fn axes(self) -> (usize, usize) {
        match self {
            Plane::XY => (0, 1),
            Plane::YZ => (1, 2),
            Plane::XZ => (0, 2),
        }
    }

    pub fn dropped_axis(self) -> usize {
        match self {
            Plane::XY => 2,
            Plane::YZ => 0,
            Plane::XZ => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Plane::XY => "XY",
            Plane::YZ => "YZ",
            Plane::XZ => "XZ",
        }
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plane {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "XY" => Ok(Plane::XY),
            "YZ" => Ok(Plane::YZ),
            "XZ" => Ok(Plane::XZ),
            other => Err(Error::config(format!("unknown plane '{other}'"))),
        }
    }
}

/// Shape extraction policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Hdr,
    PointFraction,
}

impl Variant {
    pub const ALL: [Variant; 2] = [Variant::Hdr, Variant::PointFraction];

    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Hdr => "hdr",
            Variant::PointFraction => "point_fraction",
        }
    }

    /// Short form used by the viewer bundle.
    pub fn short_name(self) -> &'static str {
        match self {
            Variant::Hdr => "hdr",
            Variant::PointFraction => "pf",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hdr" => Ok(Variant::Hdr),
            "point_fraction" | "pf" => Ok(Variant::PointFraction),
            other => Err(Error::config(format!("unknown variant '{other}'"))),
        }
    }
}
