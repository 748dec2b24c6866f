use rusqlite::params;
use tariff_core::DEFAULT_MINOR_UNITS;

use crate::Db;
use crate::error::Result;

pub const SETTING_CURRENCY: &str = "currency";
pub const SETTING_MINOR_UNITS: &str = "currency_minor_units";
pub const DEFAULT_CURRENCY: &str = "BRL";

impl Db {
    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM app_setting WHERE key = ?1")?;
        let mut rows = stmt.query([key])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get::<_, String>(0)?))
        } else {
            Ok(None)
        }
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO app_setting (key, value)
            VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_currency(&self) -> Result<String> {
        let currency = self
            .get_setting(SETTING_CURRENCY)?
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
        Ok(currency)
    }

    pub fn set_currency(&self, currency: &str) -> Result<()> {
        self.set_setting(SETTING_CURRENCY, currency)
    }

    pub fn get_minor_units(&self) -> Result<u32> {
        let units = self
            .get_setting(SETTING_MINOR_UNITS)?
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MINOR_UNITS);
        Ok(units)
    }

    pub fn set_minor_units(&self, units: u32) -> Result<()> {
        self.set_setting(SETTING_MINOR_UNITS, &units.to_string())
    }
}
