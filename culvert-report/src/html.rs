//! Printable HTML page for a single field card.

use culvert_core::solver::CaliforniaEstimate;
use culvert_core::FieldCard;
use culvert_utils::dates::format_timestamp;
use culvert_utils::format::{measurement_list, mm, three_dp, two_dp};
use std::fmt::{self, Write};

/// Escape text for use in element content and quoted attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

struct Section {
    title: &'static str,
    rows: Vec<(&'static str, String)>,
}

impl Section {
    fn new(title: &'static str) -> Self {
        Self {
            title,
            rows: Vec::new(),
        }
    }

    fn row(mut self, label: &'static str, value: impl Into<String>) -> Self {
        self.rows.push((label, value.into()));
        self
    }

    fn render(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "<section>\n<h2>{}</h2>\n<table>", self.title)?;
        for (label, value) in &self.rows {
            writeln!(
                out,
                "<tr><th>{}</th><td>{}</td></tr>",
                label,
                escape_html(value)
            )?;
        }
        writeln!(out, "</table>\n</section>")
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

/// Standalone HTML document for `card`.
pub fn render_field_card(card: &FieldCard) -> Result<String, fmt::Error> {
    let input = &card.input;
    let geometry = card.geometry();
    let result = &card.result;

    let mut site = Section::new("Site")
        .row("Card", card.id.clone())
        .row("Calculated", format_timestamp(&card.timestamp))
        .row("Region", input.region.name())
        .row("Drainage area", format!("{} ha", two_dp(input.drainage_area)))
        .row("Stream gradient", format!("{} %", two_dp(input.stream_gradient)));
    if let Some(location) = card.location {
        let accuracy = location
            .accuracy
            .map(|a| format!(" (±{} m)", two_dp(a)))
            .unwrap_or_default();
        site = site.row(
            "Location",
            format!("{:.6}, {:.6}{}", location.latitude, location.longitude, accuracy),
        );
    }
    if let Some(updated) = card.updated_at {
        site = site.row("Last saved", format_timestamp(&updated));
    }

    let stream = Section::new("Stream geometry")
        .row("Top widths", format!("{} m", measurement_list(&geometry.top_widths)))
        .row("Bottom width", format!("{} m", two_dp(geometry.bottom_width)))
        .row("Depths", format!("{} m", measurement_list(&geometry.depths)))
        .row("Average top width", format!("{} m", two_dp(geometry.average_top_width)))
        .row("Average depth", format!("{} m", two_dp(geometry.average_depth)))
        .row("Cross-section", format!("{} m²", two_dp(geometry.cross_sectional_area)))
        .row("Width/depth ratio", two_dp(geometry.width_to_depth_ratio));

    let mut sizing = Section::new("Sizing result")
        .row("Recommended", mm(result.recommended_size))
        .row("Culvert", result.culvert.describe())
        .row("Material", input.culvert_material.name())
        .row("Governing method", result.method.name())
        .row("Base flow", format!("{} m³/s", two_dp(result.base_flow)))
        .row("Climate factor", three_dp(result.climate_factor))
        .row("Safety factor", three_dp(result.safety_factor))
        .row("Design flow", format!("{} m³/s", two_dp(result.design_flow)))
        .row("Capacity", format!("{} m³/s", two_dp(result.capacity.max_flow)))
        .row("Velocity", format!("{} m/s", two_dp(result.capacity.velocity)))
        .row("Controlling factor", result.controlling_factor.to_string())
        .row("Capacity sufficient", yes_no(result.capacity_sufficient))
        .row("Transportable", yes_no(result.transportable));
    if !result.capacity_sufficient {
        sizing = sizing.row(
            "Warning",
            "largest available size does not meet the required capacity",
        );
    }

    let comparison = &result.comparison;
    let california = match comparison.california {
        CaliforniaEstimate::Size(size) => mm(size),
        CaliforniaEstimate::Exceeded => "beyond table".to_string(),
    };
    let transportability = comparison
        .transportability_mm
        .map(mm)
        .unwrap_or_else(|| "not checked".to_string());
    let methods = Section::new("Method comparison")
        .row("End-Area", mm(comparison.end_area_mm))
        .row("Lookup Table (California)", california)
        .row("Manning", mm(comparison.manning_mm))
        .row("Transportability Matrix", transportability);

    let mut out = String::new();
    writeln!(
        out,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>Field card {}</title>\n</head>\n<body>\n<h1>Culvert field card {}</h1>",
        escape_html(&card.id),
        escape_html(&card.id)
    )?;
    for section in [&site, &stream, &sizing, &methods] {
        section.render(&mut out)?;
    }
    if let Some(notes) = &card.notes {
        writeln!(
            out,
            "<section>\n<h2>Notes</h2>\n<p>{}</p>\n</section>",
            escape_html(notes)
        )?;
    }
    out.push_str("</body>\n</html>\n");
    Ok(out)
}
