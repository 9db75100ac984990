use crate::geometry::StreamGeometry;
use crate::input::CulvertSizingInput;
use crate::sizing::CulvertSizingResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};

/// Cards assembled by this process so far; keeps ids apart within one millisecond.
static ASSEMBLED: AtomicU32 = AtomicU32::new(0);

/// GPS fix captured at the crossing. Passed through unvalidated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy in metres, when the receiver reports one.
    pub accuracy: Option<f64>,
}

/// A completed sizing calculation as stored and exported.
///
/// Created once per calculation. Only `notes` changes afterwards; the store
/// owns `created_at` and `updated_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldCard {
    pub id: String,
    /// When the calculation was run.
    pub timestamp: DateTime<Utc>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub location: Option<Location>,
    pub notes: Option<String>,
    pub input: CulvertSizingInput,
    pub result: CulvertSizingResult,
}

impl FieldCard {
    /// Wrap a sizing result and the request that produced it.
    pub fn assemble(
        input: CulvertSizingInput,
        result: CulvertSizingResult,
        timestamp: DateTime<Utc>,
        location: Option<Location>,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: Self::id_for(&timestamp),
            timestamp,
            created_at: None,
            updated_at: None,
            location,
            notes: notes.filter(|n| !n.trim().is_empty()),
            input,
            result,
        }
    }

    /// Fresh card id: calculation time, process and sequence number,
    /// e.g. `FC-1700000000123-3f2a-0`.
    ///
    /// Every call returns a new id, so only re-saving the same card replaces it.
    pub fn id_for(timestamp: &DateTime<Utc>) -> String {
        let sequence = ASSEMBLED.fetch_add(1, Ordering::Relaxed);
        format!(
            "FC-{}-{:x}-{}",
            timestamp.timestamp_millis(),
            std::process::id(),
            sequence
        )
    }

    pub fn geometry(&self) -> &StreamGeometry {
        &self.input.stream_geometry
    }
}
