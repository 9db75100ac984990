//! Sizing request types and input validation.
//!
//! Invalid input is rejected here, before any computation starts, with one
//! [`FieldError`] per offending field.

use crate::error::{FieldError, InputField, InvalidReason, ValidationErrors};
use crate::geometry::StreamGeometry;
use crate::material::CulvertMaterial;
use crate::region::Region;
use serde::{Deserialize, Serialize};

/// Most width or depth readings a technician records per crossing.
pub const MAX_MEASUREMENTS: usize = 5;

/// A typed, validated-on-demand sizing request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CulvertSizingInput {
    /// Drainage area upstream of the crossing, in hectares.
    pub drainage_area: f64,
    /// Stream gradient in percent.
    pub stream_gradient: f64,
    pub region: Region,
    pub culvert_material: CulvertMaterial,
    pub stream_geometry: StreamGeometry,
    pub use_climate_factors: bool,
    /// Projected design rainfall intensity in mm/hr.
    pub projected_rainfall: Option<f64>,
    pub use_transportability: bool,
}

impl CulvertSizingInput {
    /// Check every invariant of the request, reporting all failures at once.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();
        push_err(&mut errors, check_positive(InputField::DrainageArea, self.drainage_area));
        push_err(
            &mut errors,
            check_non_negative(InputField::StreamGradient, self.stream_gradient),
        );
        push_err(
            &mut errors,
            check_measurements(InputField::TopWidths, &self.stream_geometry.top_widths),
        );
        push_err(
            &mut errors,
            check_non_negative(InputField::BottomWidth, self.stream_geometry.bottom_width),
        );
        push_err(
            &mut errors,
            check_measurements(InputField::Depths, &self.stream_geometry.depths),
        );
        if let Some(rainfall) = self.projected_rainfall {
            push_err(&mut errors, check_positive(InputField::ProjectedRainfall, rainfall));
        }
        if errors.is_empty() {
            push_err(&mut errors, check_geometry(&self.stream_geometry));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(errors))
        }
    }
}

/// The form as captured in the field, every value still a string.
///
/// Blank list entries are ignored, so a form with five width boxes of which
/// two are filled in carries two measurements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldForm {
    pub drainage_area: String,
    pub stream_gradient: String,
    pub region: String,
    pub culvert_material: String,
    pub top_widths: Vec<String>,
    pub bottom_width: String,
    pub depths: Vec<String>,
    pub use_climate_factors: bool,
    pub projected_rainfall: String,
    pub use_transportability: bool,
}

impl FieldForm {
    /// Split a comma separated list of readings ("2.0, 2.4,").
    pub fn split_list(list: &str) -> Vec<String> {
        list.split(',').map(|s| s.trim().to_string()).collect()
    }

    /// Parse and validate the form into a sizing request.
    pub fn parse(&self) -> Result<CulvertSizingInput, ValidationErrors> {
        let mut errors = Vec::new();

        let drainage_area = collect(
            &mut errors,
            parse_number(InputField::DrainageArea, &self.drainage_area)
                .and_then(|v| check_positive(InputField::DrainageArea, v).map(|_| v)),
        );
        let stream_gradient = collect(
            &mut errors,
            parse_number(InputField::StreamGradient, &self.stream_gradient)
                .and_then(|v| check_non_negative(InputField::StreamGradient, v).map(|_| v)),
        );
        let region = collect(
            &mut errors,
            parse_choice::<Region>(InputField::Region, &self.region),
        );
        let culvert_material = collect(
            &mut errors,
            parse_choice::<CulvertMaterial>(InputField::CulvertMaterial, &self.culvert_material),
        );
        let top_widths = collect(
            &mut errors,
            parse_list(InputField::TopWidths, &self.top_widths).and_then(|v| {
                check_measurements(InputField::TopWidths, &v).map(|_| v)
            }),
        );
        let bottom_width = collect(
            &mut errors,
            parse_number(InputField::BottomWidth, &self.bottom_width)
                .and_then(|v| check_non_negative(InputField::BottomWidth, v).map(|_| v)),
        );
        let depths = collect(
            &mut errors,
            parse_list(InputField::Depths, &self.depths)
                .and_then(|v| check_measurements(InputField::Depths, &v).map(|_| v)),
        );
        let projected_rainfall = if self.projected_rainfall.trim().is_empty() {
            Some(None)
        } else {
            collect(
                &mut errors,
                parse_number(InputField::ProjectedRainfall, &self.projected_rainfall).and_then(
                    |v| check_positive(InputField::ProjectedRainfall, v).map(|_| Some(v)),
                ),
            )
        };

        match (
            drainage_area,
            stream_gradient,
            region,
            culvert_material,
            top_widths,
            bottom_width,
            depths,
            projected_rainfall,
        ) {
            (
                Some(drainage_area),
                Some(stream_gradient),
                Some(region),
                Some(culvert_material),
                Some(top_widths),
                Some(bottom_width),
                Some(depths),
                Some(projected_rainfall),
            ) if errors.is_empty() => Ok(CulvertSizingInput {
                drainage_area,
                stream_gradient,
                region,
                culvert_material,
                stream_geometry: StreamGeometry::from_measurements(top_widths, bottom_width, depths),
                use_climate_factors: self.use_climate_factors,
                projected_rainfall,
                use_transportability: self.use_transportability,
            }),
            _ => Err(ValidationErrors(errors)),
        }
    }
}

fn push_err(errors: &mut Vec<FieldError>, result: Result<(), FieldError>) {
    if let Err(e) = result {
        errors.push(e);
    }
}

fn collect<T>(errors: &mut Vec<FieldError>, result: Result<T, FieldError>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            errors.push(e);
            None
        }
    }
}

fn parse_number(field: InputField, raw: &str) -> Result<f64, FieldError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FieldError::new(field, InvalidReason::Missing));
    }
    let value = trimmed
        .parse::<f64>()
        .map_err(|_| FieldError::new(field, InvalidReason::NotANumber(trimmed.to_string())))?;
    if !value.is_finite() {
        return Err(FieldError::new(field, InvalidReason::NotFinite));
    }
    Ok(value)
}

fn parse_list(field: InputField, raw: &[String]) -> Result<Vec<f64>, FieldError> {
    raw.iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_number(field, s))
        .collect()
}

fn parse_choice<T>(field: InputField, raw: &str) -> Result<T, FieldError>
where
    T: std::str::FromStr<Err = String>,
{
    if raw.trim().is_empty() {
        return Err(FieldError::new(field, InvalidReason::Missing));
    }
    raw.parse::<T>()
        .map_err(|msg| FieldError::new(field, InvalidReason::Unrecognized(msg)))
}

fn check_finite(field: InputField, value: f64) -> Result<(), FieldError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(FieldError::new(field, InvalidReason::NotFinite))
    }
}

fn check_positive(field: InputField, value: f64) -> Result<(), FieldError> {
    check_finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(FieldError::new(field, InvalidReason::NotPositive))
    }
}

fn check_non_negative(field: InputField, value: f64) -> Result<(), FieldError> {
    check_finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(FieldError::new(field, InvalidReason::Negative))
    }
}

fn check_measurements(field: InputField, values: &[f64]) -> Result<(), FieldError> {
    if values.is_empty() {
        return Err(FieldError::new(field, InvalidReason::Missing));
    }
    if values.len() > MAX_MEASUREMENTS {
        return Err(FieldError::new(
            field,
            InvalidReason::TooManyEntries {
                max: MAX_MEASUREMENTS,
                found: values.len(),
            },
        ));
    }
    values
        .iter()
        .try_for_each(|&v| check_non_negative(field, v))
}

/// Derived channel values must be the ones the measurements give.
fn check_geometry(geometry: &StreamGeometry) -> Result<(), FieldError> {
    let derived = StreamGeometry::from_measurements(
        geometry.top_widths.clone(),
        geometry.bottom_width,
        geometry.depths.clone(),
    );
    if *geometry == derived {
        Ok(())
    } else {
        Err(FieldError::new(InputField::StreamGeometry, InvalidReason::Inconsistent))
    }
}
