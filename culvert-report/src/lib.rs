//! Field-card output for the office: a flat CSV for spreadsheets and a
//! printable HTML page per crossing.

pub mod export;
pub mod html;

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{TimeZone, Utc};
    use culvert_core::{
        compute_culvert_sizing, CulvertMaterial, CulvertSizingInput, FieldCard, Location, Region,
        StreamGeometry,
    };

    pub(crate) fn sample_card(notes: Option<&str>) -> FieldCard {
        let input = CulvertSizingInput {
            drainage_area: 50.0,
            stream_gradient: 2.0,
            region: Region::Coastal,
            culvert_material: CulvertMaterial::Csp,
            stream_geometry: StreamGeometry::from_measurements(vec![1.5, 1.6], 1.0, vec![0.6]),
            use_climate_factors: false,
            projected_rainfall: None,
            use_transportability: true,
        };
        let result = compute_culvert_sizing(&input).unwrap();
        let timestamp = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let location = Location {
            latitude: 49.25,
            longitude: -123.1,
            accuracy: None,
        };
        FieldCard::assemble(
            input,
            result,
            timestamp,
            Some(location),
            notes.map(str::to_string),
        )
    }
}
