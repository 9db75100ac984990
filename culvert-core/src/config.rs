//! Tunable engineering constants for the sizing engine.
//!
//! A `SizingConfig` is built once (defaults, or a JSON override read at
//! start-up) and passed by reference into every sizing call. Nothing in the
//! engine mutates it.

use crate::region::Region;
use serde::{Deserialize, Serialize};

/// Stream-gradient bands that select the risk safety factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyBands {
    /// Gradients (%) strictly below this are low risk.
    pub medium_from_percent: f64,
    /// Gradients (%) strictly above this are high risk.
    pub high_above_percent: f64,
    pub low_factor: f64,
    pub medium_factor: f64,
    pub high_factor: f64,
}

impl Default for SafetyBands {
    fn default() -> Self {
        Self {
            medium_from_percent: 3.0,
            high_above_percent: 8.0,
            low_factor: 1.1,
            medium_factor: 1.2,
            high_factor: 1.3,
        }
    }
}

/// Design-storm rainfall intensity (mm/hr) each region's regression was fitted to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineRainfall {
    pub coastal: f64,
    pub interior: f64,
    pub northern: f64,
}

impl Default for BaselineRainfall {
    fn default() -> Self {
        Self {
            coastal: 65.0,
            interior: 45.0,
            northern: 35.0,
        }
    }
}

impl BaselineRainfall {
    pub fn for_region(&self, region: Region) -> f64 {
        match region {
            Region::Coastal => self.coastal,
            Region::Interior => self.interior,
            Region::Northern => self.northern,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    /// Capacity margin the solver demands on top of the design flow.
    pub capacity_margin: f64,
    /// Slope floor (decimal) used by the capacity solve.
    pub minimum_slope: f64,
    /// Width/depth ratio above which a box culvert is sized instead of a pipe.
    pub box_ratio_threshold: f64,
    pub box_minimum_mm: u32,
    pub box_step_mm: u32,
    pub box_max_span_mm: u32,
    pub box_max_rise_mm: u32,
    /// Largest governing dimension that can still be hauled to site.
    pub max_transportable_mm: u32,
    /// Smallest climate multiplier applied whenever climate factors are on.
    pub climate_minimum_factor: f64,
    pub baseline_rainfall: BaselineRainfall,
    pub safety: SafetyBands,
    /// Inlet control needs a gradient (%) steeper than this...
    pub inlet_min_gradient_percent: f64,
    /// ...and a barrel smoother than this roughness.
    pub inlet_max_roughness: f64,
    /// Gradients (%) below this are always outlet controlled.
    pub outlet_max_gradient_percent: f64,
    /// Barrels rougher than this are always outlet controlled.
    pub outlet_min_roughness: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            capacity_margin: 1.2,
            minimum_slope: 0.005,
            box_ratio_threshold: 3.0,
            box_minimum_mm: 800,
            box_step_mm: 200,
            box_max_span_mm: 6000,
            box_max_rise_mm: 3000,
            max_transportable_mm: 1800,
            climate_minimum_factor: 1.1,
            baseline_rainfall: BaselineRainfall::default(),
            safety: SafetyBands::default(),
            inlet_min_gradient_percent: 3.0,
            inlet_max_roughness: 0.015,
            outlet_max_gradient_percent: 1.0,
            outlet_min_roughness: 0.02,
        }
    }
}

impl SizingConfig {
    /// Parse a JSON override; omitted keys keep their defaults.
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let config: SizingConfig = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    /// Reject values that would break the solver's termination or ordering.
    pub fn check(&self) -> anyhow::Result<()> {
        if !(self.capacity_margin >= 1.0) {
            anyhow::bail!("capacity_margin must be at least 1.0");
        }
        if !(self.minimum_slope > 0.0) {
            anyhow::bail!("minimum_slope must be greater than zero");
        }
        if self.box_step_mm == 0 {
            anyhow::bail!("box_step_mm must be greater than zero");
        }
        if self.box_minimum_mm > self.box_max_span_mm || self.box_minimum_mm > self.box_max_rise_mm
        {
            anyhow::bail!("box_minimum_mm exceeds the maximum box dimensions");
        }
        if self.safety.medium_from_percent > self.safety.high_above_percent {
            anyhow::bail!("safety bands overlap");
        }
        if !(self.climate_minimum_factor >= 1.0) {
            anyhow::bail!("climate_minimum_factor must be at least 1.0");
        }
        Ok(())
    }
}
