//! Storage interface for field cards.
//!
//! The engine never touches a storage medium itself; anything that keeps
//! cards keyed by id with these semantics can back the app.

use crate::field_card::FieldCard;

pub trait FieldCardStore {
    /// Insert `card`, or replace the card with the same id (last write wins).
    ///
    /// The store sets `created_at` on first insert and `updated_at` on every
    /// write, both strictly increasing across writes. Returns the card as stored.
    fn save_field_card(&self, card: &FieldCard) -> anyhow::Result<FieldCard>;

    /// All cards, newest first.
    fn get_field_cards(&self) -> anyhow::Result<Vec<FieldCard>>;

    fn get_field_card(&self, id: &str) -> anyhow::Result<Option<FieldCard>>;

    /// Remove the card; `false` if no card had that id.
    fn delete_field_card(&self, id: &str) -> anyhow::Result<bool>;

    /// Replace the notes on an existing card, refreshing `updated_at`.
    fn update_notes(&self, id: &str, notes: Option<&str>) -> anyhow::Result<Option<FieldCard>>;
}
