//! Bulk import and export of field cards as JSON.
//!
//! The format is a JSON array of cards in the same camelCase shape the
//! store keeps as its payload, so a dump from one device loads on another.
//! Imported cards are written through the normal save path and receive
//! fresh store timestamps.

use crate::Database;
use chrono::Utc;
use culvert_core::{FieldCard, FieldCardStore};

impl Database {
    /// Load a JSON array of cards, upserting each by id. Returns the count.
    ///
    /// # Example JSON
    /// ```text
    /// [{"id":"FC-1700000000000-1a2b-0","timestamp":"2023-11-14T22:13:20Z", ... }]
    /// ```
    pub fn load_field_cards_json(&self, json: &str) -> anyhow::Result<usize> {
        let cards: Vec<FieldCard> = serde_json::from_str(json)?;
        // oldest first, so imported cards keep their relative order
        let mut ordered: Vec<&FieldCard> = cards.iter().collect();
        ordered.sort_by_key(|card| card.created_at.unwrap_or(card.timestamp));
        for card in &ordered {
            self.write_card(card, Utc::now())?;
        }
        log::info!("[Culvert] loader: Loaded {} field cards", ordered.len());
        Ok(ordered.len())
    }

    /// All cards as a pretty-printed JSON array, newest first.
    pub fn dump_field_cards_json(&self) -> anyhow::Result<String> {
        let cards = self.get_field_cards()?;
        log::info!("[Culvert] loader: Dumped {} field cards", cards.len());
        Ok(serde_json::to_string_pretty(&cards)?)
    }
}
