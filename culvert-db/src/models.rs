//! Lightweight row structs returned by listing queries.

use serde::Serialize;

/// One line of the field-card list, read without decoding the payload.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldCardSummary {
    pub id: String,
    /// RFC 3339 creation time.
    pub created_at: String,
    pub region: String,
    /// Recommended culvert size in mm.
    pub recommended_size_mm: u32,
}
