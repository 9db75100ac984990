//! SQLite field-card store for the culvert sizing app.
//!
//! Cards are kept whole as JSON, keyed by id, with a few columns pulled out
//! for ordering and listing. The store can live in memory (tests, one-off
//! calculations) or in a file on the device.
//!
//! # Usage
//!
//! ```rust
//! use culvert_db::Database;
//!
//! let db = Database::new().unwrap();
//! assert!(db.query_summaries().unwrap().is_empty());
//! ```
//!
//! Writes and reads go through [`culvert_core::FieldCardStore`]; see
//! [`schema::create_schema`] for the tables.

pub mod schema;
mod loader;
mod queries;
pub mod models;

use rusqlite::Connection;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// SQLite database holding field cards.
///
/// Cheaply cloneable (via `Rc`); clones share one connection.
#[derive(Clone)]
pub struct Database {
    conn: Rc<RefCell<Connection>>,
}

impl Database {
    /// Create an empty in-memory database with the schema applied.
    pub fn new() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    /// Open (or create) a database file, applying the schema if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        log::info!("[Culvert] db: opened {}", path.as_ref().display());
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch(schema::create_schema())?;
        Ok(Self {
            conn: Rc::new(RefCell::new(conn)),
        })
    }
}
