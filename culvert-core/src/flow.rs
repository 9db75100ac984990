//! Regional design-flow estimation.
//!
//! Two estimators implement [`FlowEstimator`]: the power-law regression used
//! by default, and a discharge table with linear interpolation built from
//! the embedded `regional_discharge.csv` fixture. Either can be handed to
//! the orchestrator without changing it.
//!
//! Drainage areas arrive in hectares and are converted to km² here.

use crate::config::SizingConfig;
use crate::error::TableError;
use crate::math::hectares_to_km2;
use crate::region::Region;
use csv::ReaderBuilder;
use std::collections::BTreeMap;

/// Embedded regional discharge breakpoints: `region,area_km2,flow_m3s`.
pub static DISCHARGE_TABLE_CSV: &str = include_str!("../../fixtures/regional_discharge.csv");

/// Strategy for turning a catchment into a base design flow (m³/s).
pub trait FlowEstimator {
    /// Base Q100-equivalent flow before climate and safety adjustment.
    fn estimate(&self, drainage_area_ha: f64, region: Region) -> f64;

    fn name(&self) -> &'static str;
}

/// `Q = a * A^b` with per-region coefficients.
#[derive(Debug, Clone, Copy, Default)]
pub struct PowerLawEstimator;

impl FlowEstimator for PowerLawEstimator {
    fn estimate(&self, drainage_area_ha: f64, region: Region) -> f64 {
        let coefficients = region.regression();
        coefficients.a * hectares_to_km2(drainage_area_ha).powf(coefficients.b)
    }

    fn name(&self) -> &'static str {
        "power-law regression"
    }
}

/// Piecewise-linear discharge table per region.
#[derive(Debug, Clone)]
pub struct LookupTableEstimator {
    /// Breakpoints sorted by area: (area_km2, flow_m3s).
    tables: BTreeMap<Region, Vec<(f64, f64)>>,
}

impl LookupTableEstimator {
    /// Build from the embedded fixture.
    pub fn embedded() -> Result<Self, TableError> {
        Self::parse_discharge_csv(DISCHARGE_TABLE_CSV)
    }

    /// Parse a `region,area_km2,flow_m3s` CSV (with headers).
    pub fn parse_discharge_csv(csv_object: &str) -> Result<Self, TableError> {
        let mut tables: BTreeMap<Region, Vec<(f64, f64)>> = BTreeMap::new();
        let mut rdr = ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .from_reader(csv_object.as_bytes());
        for (index, row) in rdr.records().enumerate() {
            let record = row?;
            let row_number = index + 1;
            let invalid = |message: String| TableError::InvalidRow {
                row: row_number,
                message,
            };
            let region = record
                .get(0)
                .unwrap_or("")
                .parse::<Region>()
                .map_err(invalid)?;
            let area = parse_cell(record.get(1)).map_err(invalid)?;
            let flow = parse_cell(record.get(2)).map_err(invalid)?;
            if area < 0.0 || flow < 0.0 {
                return Err(invalid("negative breakpoint".to_string()));
            }
            tables.entry(region).or_default().push((area, flow));
        }
        for region in Region::ALL {
            match tables.get_mut(&region) {
                Some(points) if !points.is_empty() => {
                    points.sort_by(|a, b| a.0.total_cmp(&b.0));
                }
                _ => return Err(TableError::EmptyRegion(region.to_string())),
            }
        }
        log::debug!(
            "[Culvert] flow: loaded discharge table with {} breakpoints",
            tables.values().map(Vec::len).sum::<usize>()
        );
        Ok(Self { tables })
    }

    pub fn breakpoints(&self, region: Region) -> &[(f64, f64)] {
        self.tables.get(&region).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn parse_cell(cell: Option<&str>) -> Result<f64, String> {
    let text = cell.unwrap_or("").trim();
    text.parse::<f64>()
        .map_err(|_| format!("'{}' is not a number", text))
}

/// Linear interpolation over sorted breakpoints, clamped to the end values.
pub fn interpolate(points: &[(f64, f64)], x: f64) -> f64 {
    let (first, last) = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return 0.0,
    };
    if x <= first.0 {
        return first.1;
    }
    if x >= last.0 {
        return last.1;
    }
    for window in points.windows(2) {
        let (x0, y0) = window[0];
        let (x1, y1) = window[1];
        if x <= x1 {
            if x1 == x0 {
                return y1;
            }
            return y0 + (y1 - y0) * (x - x0) / (x1 - x0);
        }
    }
    last.1
}

impl FlowEstimator for LookupTableEstimator {
    fn estimate(&self, drainage_area_ha: f64, region: Region) -> f64 {
        let points = self.breakpoints(region);
        let area_km2 = hectares_to_km2(drainage_area_ha);
        if let (Some(first), Some(last)) = (points.first(), points.last()) {
            if area_km2 < first.0 || area_km2 > last.0 {
                log::warn!(
                    "[Culvert] flow: {:.3} km² outside {} table ({}..{}), clamping",
                    area_km2,
                    region,
                    first.0,
                    last.0
                );
            }
        }
        interpolate(points, area_km2)
    }

    fn name(&self) -> &'static str {
        "discharge lookup table"
    }
}

/// Multiplier for projected rainfall; never below the configured minimum.
///
/// Without a projection the minimum factor applies.
pub fn climate_factor(config: &SizingConfig, region: Region, projected_rainfall: Option<f64>) -> f64 {
    let baseline = config.baseline_rainfall.for_region(region);
    let ratio = match projected_rainfall {
        Some(projected) if baseline > 0.0 => projected / baseline,
        _ => 0.0,
    };
    ratio.max(config.climate_minimum_factor)
}

/// Risk safety factor for a stream gradient in percent.
pub fn safety_factor(config: &SizingConfig, stream_gradient: f64) -> f64 {
    let bands = &config.safety;
    if stream_gradient < bands.medium_from_percent {
        bands.low_factor
    } else if stream_gradient <= bands.high_above_percent {
        bands.medium_factor
    } else {
        bands.high_factor
    }
}
