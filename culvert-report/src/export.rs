//! CSV export, one row per field card.
//!
//! Areas, ratios, flows and velocities are written at two decimals, factors
//! at three, and sizes as integer millimetres.

use culvert_core::solver::CaliforniaEstimate;
use culvert_core::FieldCard;
use culvert_utils::dates::format_rfc3339;
use culvert_utils::format::{three_dp, two_dp};
use serde::Serialize;
use std::io::Write;

pub const CSV_HEADERS: [&str; 31] = [
    "id",
    "timestamp",
    "created_at",
    "region",
    "material",
    "drainage_area_ha",
    "stream_gradient_pct",
    "avg_top_width_m",
    "bottom_width_m",
    "avg_depth_m",
    "cross_section_m2",
    "width_depth_ratio",
    "base_flow_m3s",
    "climate_factor",
    "safety_factor",
    "design_flow_m3s",
    "culvert",
    "recommended_size_mm",
    "method",
    "transportability_mm",
    "end_area_mm",
    "california_mm",
    "manning_mm",
    "max_flow_m3s",
    "velocity_ms",
    "controlling_factor",
    "capacity_sufficient",
    "transportable",
    "latitude",
    "longitude",
    "notes",
];

#[derive(Serialize)]
struct CardRow<'a> {
    id: &'a str,
    timestamp: String,
    created_at: Option<String>,
    region: &'static str,
    material: &'static str,
    drainage_area_ha: String,
    stream_gradient_pct: String,
    avg_top_width_m: String,
    bottom_width_m: String,
    avg_depth_m: String,
    cross_section_m2: String,
    width_depth_ratio: String,
    base_flow_m3s: String,
    climate_factor: String,
    safety_factor: String,
    design_flow_m3s: String,
    culvert: String,
    recommended_size_mm: u32,
    method: &'static str,
    transportability_mm: Option<u32>,
    end_area_mm: u32,
    /// Empty when the channel was beyond the California table.
    california_mm: Option<u32>,
    manning_mm: u32,
    max_flow_m3s: String,
    velocity_ms: String,
    controlling_factor: String,
    capacity_sufficient: bool,
    transportable: bool,
    latitude: Option<f64>,
    longitude: Option<f64>,
    notes: &'a str,
}

impl<'a> CardRow<'a> {
    fn from_card(card: &'a FieldCard) -> Self {
        let input = &card.input;
        let geometry = card.geometry();
        let result = &card.result;
        let california_mm = match result.comparison.california {
            CaliforniaEstimate::Size(mm) => Some(mm),
            CaliforniaEstimate::Exceeded => None,
        };
        Self {
            id: &card.id,
            timestamp: format_rfc3339(&card.timestamp),
            created_at: card.created_at.as_ref().map(format_rfc3339),
            region: input.region.name(),
            material: input.culvert_material.name(),
            drainage_area_ha: two_dp(input.drainage_area),
            stream_gradient_pct: two_dp(input.stream_gradient),
            avg_top_width_m: two_dp(geometry.average_top_width),
            bottom_width_m: two_dp(geometry.bottom_width),
            avg_depth_m: two_dp(geometry.average_depth),
            cross_section_m2: two_dp(geometry.cross_sectional_area),
            width_depth_ratio: two_dp(geometry.width_to_depth_ratio),
            base_flow_m3s: two_dp(result.base_flow),
            climate_factor: three_dp(result.climate_factor),
            safety_factor: three_dp(result.safety_factor),
            design_flow_m3s: two_dp(result.design_flow),
            culvert: result.culvert.describe(),
            recommended_size_mm: result.recommended_size,
            method: result.method.name(),
            transportability_mm: result.transportability_size,
            end_area_mm: result.comparison.end_area_mm,
            california_mm,
            manning_mm: result.comparison.manning_mm,
            max_flow_m3s: two_dp(result.capacity.max_flow),
            velocity_ms: two_dp(result.capacity.velocity),
            controlling_factor: result.controlling_factor.to_string(),
            capacity_sufficient: result.capacity_sufficient,
            transportable: result.transportable,
            latitude: card.location.map(|l| l.latitude),
            longitude: card.location.map(|l| l.longitude),
            notes: card.notes.as_deref().unwrap_or(""),
        }
    }
}

/// Write `cards` as CSV with a header row, in the order given.
pub fn write_csv<W: Write>(cards: &[FieldCard], writer: W) -> anyhow::Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(CSV_HEADERS)?;
    for card in cards {
        wtr.serialize(CardRow::from_card(card))?;
    }
    wtr.flush()?;
    log::info!("[Culvert] export: wrote {} field cards as CSV", cards.len());
    Ok(())
}

pub fn to_csv_string(cards: &[FieldCard]) -> anyhow::Result<String> {
    let mut buf = Vec::new();
    write_csv(cards, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}
