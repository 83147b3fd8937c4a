//! Run configuration.
//!
//! Every stage reads its parameters from an immutable value object that is
//! passed into a pipeline invocation. Defaults mirror the reference analysis
//! settings; any field missing from a JSON document falls back to them.

use crate::{Error, Plane, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Ten coverage levels from 100% down to 50%.
pub const DEFAULT_LEVELS: [f64; 10] = [1.00, 0.99, 0.98, 0.97, 0.96, 0.95, 0.90, 0.80, 0.60, 0.50];

/// Minimum number of rows a CSV-sourced point set must keep.
pub const MIN_CSV_POINTS: usize = 50;

/// Grid and alignment parameters shared by every variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CfgCommon {
    /// Bins spanned by the longest padded axis.
    pub grid_base: usize,
    /// Padding added on every side, as a fraction of the largest extent.
    pub pad_frac: f64,
    /// Fraction of worst ICP correspondences discarded per iteration.
    pub trim_q: f64,
    pub icp_iters: usize,
    /// Upper bound on points per set used by ICP.
    pub sample_icp: usize,
    pub icp_seed: u64,
}

impl Default for CfgCommon {
    fn default() -> Self {
        Self {
            grid_base: 160,
            pad_frac: 0.05,
            trim_q: 0.10,
            icp_iters: 30,
            sample_icp: 50_000,
            icp_seed: 11,
        }
    }
}

impl CfgCommon {
    pub fn validate(&self) -> Result<()> {
        if self.grid_base == 0 {
            return Err(Error::config("grid_base must be >= 1"));
        }
        if !(self.pad_frac >= 0.0 && self.pad_frac.is_finite()) {
            return Err(Error::config(format!(
                "pad_frac must be a finite value >= 0, got {}",
                self.pad_frac
            )));
        }
        if !(0.0..1.0).contains(&self.trim_q) {
            return Err(Error::config(format!(
                "trim_q must lie in [0, 1), got {}",
                self.trim_q
            )));
        }
        if self.sample_icp < 3 {
            return Err(Error::config("sample_icp must be >= 3"));
        }
        Ok(())
    }
}

/// Bootstrap density and high-density-region parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CfgHdr {
    pub n_boot: usize,
    /// Resample size as a fraction of the set size (drawn with replacement).
    pub sample_frac: f64,
    /// Gaussian blur width in pixels.
    pub sigma_px: f64,
    /// Densities below this fraction of the maximum are zeroed before thresholding.
    pub density_floor_frac: f64,
    pub mass_levels: Vec<f64>,
    pub rng_seed: u64,
}

impl Default for CfgHdr {
    fn default() -> Self {
        Self {
            n_boot: 256,
            sample_frac: 1.0,
            sigma_px: 1.2,
            density_floor_frac: 0.002,
            mass_levels: DEFAULT_LEVELS.to_vec(),
            rng_seed: 0,
        }
    }
}

impl CfgHdr {
    pub fn validate(&self) -> Result<()> {
        if self.n_boot == 0 {
            return Err(Error::config("n_boot must be >= 1"));
        }
        if !(self.sample_frac > 0.0 && self.sample_frac.is_finite()) {
            return Err(Error::config(format!(
                "sample_frac must be > 0, got {}",
                self.sample_frac
            )));
        }
        if !(self.sigma_px >= 0.0 && self.sigma_px.is_finite()) {
            return Err(Error::config(format!(
                "sigma_px must be >= 0, got {}",
                self.sigma_px
            )));
        }
        if !(0.0..1.0).contains(&self.density_floor_frac) {
            return Err(Error::config(format!(
                "density_floor_frac must lie in [0, 1), got {}",
                self.density_floor_frac
            )));
        }
        validate_levels("mass_levels", &self.mass_levels)
    }
}

/// Morphological cleanup applied to point-fraction masks, in this order:
/// closing, opening, then largest component (with optional hole filling).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CfgMorph {
    pub closing: u32,
    pub opening: u32,
    pub keep_largest: bool,
    pub fill_holes: bool,
}

impl Default for CfgMorph {
    fn default() -> Self {
        Self {
            closing: 1,
            opening: 1,
            keep_largest: true,
            fill_holes: true,
        }
    }
}

impl CfgMorph {
    /// No cleanup at all.
    pub fn none() -> Self {
        Self {
            closing: 0,
            opening: 0,
            keep_largest: false,
            fill_holes: false,
        }
    }
}

/// Automatic KDE bandwidth heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandwidthStrategy {
    /// Half the median pairwise distance of a subsample.
    #[default]
    MedianHalf,
    /// Scott's rule on the mean per-axis standard deviation.
    Scott,
}

/// Point-fraction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CfgPf {
    pub frac_levels: Vec<f64>,
    /// Fixed KDE bandwidth; estimated per set and plane when absent.
    pub bandwidth: Option<f64>,
    pub bandwidth_strategy: BandwidthStrategy,
    /// Seed for the pairwise-distance subsample of the bandwidth heuristic.
    pub bandwidth_seed: u64,
    pub disk_px: u32,
    pub morph: CfgMorph,
}

impl Default for CfgPf {
    fn default() -> Self {
        Self {
            frac_levels: DEFAULT_LEVELS.to_vec(),
            bandwidth: None,
            bandwidth_strategy: BandwidthStrategy::default(),
            bandwidth_seed: 0,
            disk_px: 2,
            morph: CfgMorph::default(),
        }
    }
}

impl CfgPf {
    pub fn validate(&self) -> Result<()> {
        if let Some(bw) = self.bandwidth {
            if !(bw > 0.0 && bw.is_finite()) {
                return Err(Error::config(format!("bandwidth must be > 0, got {bw}")));
            }
        }
        validate_levels("frac_levels", &self.frac_levels)
    }
}

fn validate_levels(name: &str, levels: &[f64]) -> Result<()> {
    if let Some(bad) = levels.iter().find(|&&l| !(l > 0.0 && l <= 1.0)) {
        return Err(Error::config(format!(
            "{name} entries must lie in (0, 1], got {bad}"
        )));
    }
    Ok(())
}

/// Integer percent label of a coverage fraction.
pub fn level_percent(frac: f64) -> i32 {
    (frac * 100.0).round() as i32
}

/// Cross-set alignment policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignMode {
    /// Center, PCA-prealign and ICP-refine every set onto the first.
    #[default]
    Auto,
    /// Center only.
    Skip,
}

impl AlignMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AlignMode::Auto => "auto",
            AlignMode::Skip => "skip",
        }
    }
}

/// Everything a single pipeline invocation needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub common: CfgCommon,
    pub hdr: CfgHdr,
    pub pf: CfgPf,
    pub align_mode: AlignMode,
    pub planes: Vec<Plane>,
    pub run_hdr: bool,
    pub run_pf: bool,
    /// Stop after alignment and projection.
    pub alignment_only: bool,
    /// Side artifacts are written here when set.
    pub out_dir: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            common: CfgCommon::default(),
            hdr: CfgHdr::default(),
            pf: CfgPf::default(),
            align_mode: AlignMode::default(),
            planes: Plane::ALL.to_vec(),
            run_hdr: true,
            run_pf: true,
            alignment_only: false,
            out_dir: None,
        }
    }
}

impl RunConfig {
    /// Cheaper preset for previews: fewer bootstraps and ICP iterations.
    pub fn fast() -> Self {
        Self {
            common: CfgCommon {
                icp_iters: 10,
                sample_icp: 10_000,
                ..CfgCommon::default()
            },
            hdr: CfgHdr {
                n_boot: 32,
                ..CfgHdr::default()
            },
            ..Self::default()
        }
    }

    pub fn with_out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.out_dir = Some(dir.into());
        self
    }

    pub fn with_planes(mut self, planes: &[Plane]) -> Self {
        self.planes = planes.to_vec();
        self
    }

    pub fn with_align_mode(mut self, mode: AlignMode) -> Self {
        self.align_mode = mode;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: RunConfig = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        self.common.validate()?;
        if self.run_hdr {
            self.hdr.validate()?;
        }
        if self.run_pf {
            self.pf.validate()?;
        }
        if self.planes.is_empty() {
            return Err(Error::config("at least one plane must be selected"));
        }
        Ok(())
    }

    /// Selected planes in canonical order without duplicates.
    pub fn selected_planes(&self) -> Vec<Plane> {
        Plane::ALL
            .into_iter()
            .filter(|p| self.planes.contains(p))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(RunConfig::default().validate().is_ok());
        assert!(RunConfig::fast().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut cfg = RunConfig::default();
        cfg.common.trim_q = 1.5;
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));

        let mut cfg = RunConfig::default();
        cfg.pf.frac_levels = vec![0.0];
        assert!(cfg.validate().is_err());

        let mut cfg = RunConfig::default();
        cfg.planes.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn level_percent_rounds() {
        assert_eq!(level_percent(0.97), 97);
        assert_eq!(level_percent(1.0), 100);
        assert_eq!(level_percent(0.555), 56);
    }

    #[test]
    fn selected_planes_are_canonical() {
        let cfg = RunConfig::default().with_planes(&[Plane::XZ, Plane::XY, Plane::XZ]);
        assert_eq!(cfg.selected_planes(), vec![Plane::XY, Plane::XZ]);
    }
}
