//! Field-card reads and writes.
//!
//! Timestamps are handed out by the `store_clock` row: every write takes
//! `max(now, last + 1)` milliseconds, so `created_at` and `updated_at` are
//! strictly increasing across the life of the database. The JSON payload is
//! stored without trusting its own timestamps; they are refreshed from the
//! columns on every read.

use crate::models::FieldCardSummary;
use crate::Database;
use chrono::{DateTime, Utc};
use culvert_core::{FieldCard, FieldCardStore};
use culvert_utils::dates::{format_rfc3339, from_epoch_millis};
use rusqlite::{params, Connection, OptionalExtension};

/// Next store timestamp in milliseconds, never equal to or before the last one.
fn next_stamp(conn: &Connection, now: DateTime<Utc>) -> rusqlite::Result<i64> {
    let last: i64 = conn.query_row(
        "SELECT last_millis FROM store_clock WHERE id = 0",
        [],
        |row| row.get(0),
    )?;
    let stamp = now.timestamp_millis().max(last + 1);
    conn.execute(
        "UPDATE store_clock SET last_millis = ?1 WHERE id = 0",
        params![stamp],
    )?;
    Ok(stamp)
}

fn decode_card(payload: &str, created_at: i64, updated_at: i64) -> anyhow::Result<FieldCard> {
    let mut card: FieldCard = serde_json::from_str(payload)?;
    card.created_at = Some(from_epoch_millis(created_at)?);
    card.updated_at = Some(from_epoch_millis(updated_at)?);
    Ok(card)
}

impl Database {
    /// Upsert `card` stamped at `now` (or later, if the clock has moved past it).
    ///
    /// An existing card keeps its `created_at`.
    pub(crate) fn write_card(&self, card: &FieldCard, now: DateTime<Utc>) -> anyhow::Result<FieldCard> {
        let mut conn = self.conn.borrow_mut();
        let tx = conn.transaction()?;
        let existing: Option<i64> = tx
            .query_row(
                "SELECT created_at FROM field_cards WHERE id = ?1",
                params![card.id],
                |row| row.get(0),
            )
            .optional()?;
        let stamp = next_stamp(&tx, now)?;
        let created = existing.unwrap_or(stamp);

        let mut stored = card.clone();
        stored.created_at = Some(from_epoch_millis(created)?);
        stored.updated_at = Some(from_epoch_millis(stamp)?);
        let payload = serde_json::to_string(&stored)?;

        tx.execute(
            "INSERT INTO field_cards (id, created_at, updated_at, region, recommended_size_mm, payload)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                updated_at = excluded.updated_at,
                region = excluded.region,
                recommended_size_mm = excluded.recommended_size_mm,
                payload = excluded.payload",
            params![
                stored.id,
                created,
                stamp,
                stored.input.region.name(),
                stored.result.recommended_size,
                payload
            ],
        )?;
        tx.commit()?;
        log::info!(
            "[Culvert] db: {} field card {} at {}",
            if existing.is_some() { "updated" } else { "saved" },
            stored.id,
            stamp
        );
        Ok(stored)
    }

    fn set_notes(
        &self,
        id: &str,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<FieldCard>> {
        let Some(mut card) = self.get_field_card(id)? else {
            log::warn!("[Culvert] db: no field card {} to annotate", id);
            return Ok(None);
        };
        card.notes = notes
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        self.write_card(&card, now).map(Some)
    }

    /// List rows without decoding payloads, newest first.
    pub fn query_summaries(&self) -> anyhow::Result<Vec<FieldCardSummary>> {
        self.query_summaries_since(None)
    }

    /// Like [`query_summaries`](Self::query_summaries), limited to cards
    /// created at or after `since`.
    pub fn query_summaries_since(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> anyhow::Result<Vec<FieldCardSummary>> {
        let since_millis = since.map(|ts| ts.timestamp_millis()).unwrap_or(i64::MIN);
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT id, created_at, region, recommended_size_mm
             FROM field_cards
             WHERE created_at >= ?1
             ORDER BY created_at DESC",
        )?;
        let rows = stmt
            .query_map(params![since_millis], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, u32>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        let summaries = rows
            .into_iter()
            .map(|(id, created, region, recommended_size_mm)| {
                Ok(FieldCardSummary {
                    id,
                    created_at: format_rfc3339(&from_epoch_millis(created)?),
                    region,
                    recommended_size_mm,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        log::info!(
            "[Culvert] query: query_summaries returned {} records",
            summaries.len()
        );
        Ok(summaries)
    }
}

impl FieldCardStore for Database {
    fn save_field_card(&self, card: &FieldCard) -> anyhow::Result<FieldCard> {
        self.write_card(card, Utc::now())
    }

    fn get_field_cards(&self) -> anyhow::Result<Vec<FieldCard>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT payload, created_at, updated_at
             FROM field_cards
             ORDER BY created_at DESC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        let cards = rows
            .iter()
            .map(|(payload, created, updated)| decode_card(payload, *created, *updated))
            .collect::<anyhow::Result<Vec<_>>>()?;
        log::info!(
            "[Culvert] query: get_field_cards returned {} records",
            cards.len()
        );
        Ok(cards)
    }

    fn get_field_card(&self, id: &str) -> anyhow::Result<Option<FieldCard>> {
        let conn = self.conn.borrow();
        let row = conn
            .query_row(
                "SELECT payload, created_at, updated_at FROM field_cards WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;
        row.map(|(payload, created, updated)| decode_card(&payload, created, updated))
            .transpose()
    }

    fn delete_field_card(&self, id: &str) -> anyhow::Result<bool> {
        let conn = self.conn.borrow();
        let removed = conn.execute("DELETE FROM field_cards WHERE id = ?1", params![id])?;
        log::info!("[Culvert] db: delete {} removed {} rows", id, removed);
        Ok(removed > 0)
    }

    fn update_notes(&self, id: &str, notes: Option<&str>) -> anyhow::Result<Option<FieldCard>> {
        self.set_notes(id, notes, Utc::now())
    }
}
