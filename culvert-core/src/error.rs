/// Error types for culvert sizing input and embedded tables
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Input fields that can fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InputField {
    DrainageArea,
    StreamGradient,
    Region,
    CulvertMaterial,
    TopWidths,
    BottomWidth,
    Depths,
    ProjectedRainfall,
    StreamGeometry,
}

impl InputField {
    pub fn name(&self) -> &'static str {
        match self {
            InputField::DrainageArea => "drainageArea",
            InputField::StreamGradient => "streamGradient",
            InputField::Region => "region",
            InputField::CulvertMaterial => "culvertMaterial",
            InputField::TopWidths => "topWidths",
            InputField::BottomWidth => "bottomWidth",
            InputField::Depths => "depths",
            InputField::ProjectedRainfall => "projectedRainfall",
            InputField::StreamGeometry => "streamGeometry",
        }
    }
}

impl fmt::Display for InputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a field was rejected.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum InvalidReason {
    #[error("is required")]
    Missing,

    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("must not be negative")]
    Negative,

    #[error("must be greater than zero")]
    NotPositive,

    #[error("must be a finite number")]
    NotFinite,

    #[error("accepts at most {max} entries (found {found})")]
    TooManyEntries { max: usize, found: usize },

    #[error("{0}")]
    Unrecognized(String),

    #[error("does not match its measurements")]
    Inconsistent,
}

/// A single offending input field.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{field} {reason}")]
pub struct FieldError {
    pub field: InputField,
    pub reason: InvalidReason,
}

impl FieldError {
    pub fn new(field: InputField, reason: InvalidReason) -> Self {
        Self { field, reason }
    }
}

/// Every field that failed validation for one request.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("invalid input: {}", join_field_errors(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn fields(&self) -> Vec<InputField> {
        self.0.iter().map(|e| e.field).collect()
    }

    pub fn contains(&self, field: InputField) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

/// Failure to load an embedded engineering table.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("Failed to parse CSV: {0}")]
    CsvParse(#[from] csv::Error),

    #[error("Invalid table row {row}: {message}")]
    InvalidRow { row: usize, message: String },

    #[error("No breakpoints for region {0}")]
    EmptyRegion(String),
}
