use std::path::Path;

use rusqlite::Connection;

mod catalog;
pub mod error;
mod helpers;
mod migrations;
mod pricing;
mod rates;
mod settings;
mod tickets;

pub use error::{DbError, Result};
pub use settings::{DEFAULT_CURRENCY, SETTING_CURRENCY, SETTING_MINOR_UNITS};

pub struct Db {
    conn: Connection,
}

impl Db {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self { conn })
    }
}
