//! SQL schema for the field-card store.
//!
//! Applied as a single batch whenever a database is opened.

/// Returns the full SQL schema as a single batch string.
///
/// - `field_cards` - one row per card; the full card is kept as a JSON
///   `payload`, with the columns used for ordering and filtering alongside
/// - `store_clock` - single row holding the last timestamp handed out, so
///   `created_at`/`updated_at` keep increasing even after deletes
pub fn create_schema() -> &'static str {
    r#"
    CREATE TABLE IF NOT EXISTS field_cards (
        id TEXT PRIMARY KEY,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        region TEXT NOT NULL,
        recommended_size_mm INTEGER NOT NULL,
        payload TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_cards_created ON field_cards(created_at);
    CREATE INDEX IF NOT EXISTS idx_cards_region ON field_cards(region);

    CREATE TABLE IF NOT EXISTS store_clock (
        id INTEGER PRIMARY KEY CHECK (id = 0),
        last_millis INTEGER NOT NULL
    );
    INSERT OR IGNORE INTO store_clock (id, last_millis) VALUES (0, 0);
    "#
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn schema_is_valid_sql() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(create_schema())
            .expect("Schema SQL should be valid");
    }

    #[test]
    fn schema_creates_all_tables() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(create_schema()).unwrap();

        for table in &["field_cards", "store_clock"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table '{}' should exist", table);
        }
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(create_schema()).unwrap();
        conn.execute_batch(create_schema())
            .expect("Applying schema twice should succeed due to IF NOT EXISTS");

        let clock_rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM store_clock", [], |row| row.get(0))
            .unwrap();
        assert_eq!(clock_rows, 1);
    }
}
