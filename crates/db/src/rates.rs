use chrono::Utc;
use rusqlite::{OptionalExtension, params};
use tariff_core::{Rate, RateInput};

use crate::Db;
use crate::error::{DbError, Result};
use crate::helpers::{decimal_text, row_to_rate};

impl Db {
    pub fn list_rates(&self) -> Result<Vec<Rate>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, vehicle_category, rate_type, unit_price, unit,
                   courtesy_minutes, active, config_json
            FROM rate
            ORDER BY vehicle_category ASC, id ASC
            "#,
        )?;
        let rows = stmt
            .query_map([], row_to_rate)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn get_rate(&self, id: i64) -> Result<Option<Rate>> {
        self.conn
            .query_row(
                r#"
                SELECT id, name, vehicle_category, rate_type, unit_price, unit,
                       courtesy_minutes, active, config_json
                FROM rate
                WHERE id = ?1
                "#,
                params![id],
                row_to_rate,
            )
            .optional()
            .map_err(DbError::from)
    }

    pub fn count_rates(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM rate", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn create_rate(&self, input: &RateInput) -> Result<Rate> {
        let now = Utc::now().to_rfc3339();
        let config = serde_json::to_string(&input.config)?;
        self.conn.execute(
            r#"
            INSERT INTO rate (
              name, vehicle_category, rate_type, unit_price, unit,
              courtesy_minutes, active, config_json, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                input.name,
                input.vehicle_category,
                input.rate_type.as_str(),
                decimal_text(input.unit_price),
                input.unit.as_str(),
                input.courtesy_minutes,
                input.active,
                config,
                now,
                now
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_rate(id)?
            .ok_or(DbError::NotFound { entity: "rate", id })
    }

    pub fn update_rate(&self, id: i64, input: &RateInput) -> Result<Rate> {
        let now = Utc::now().to_rfc3339();
        let config = serde_json::to_string(&input.config)?;
        let updated = self.conn.execute(
            r#"
            UPDATE rate
            SET name = ?1, vehicle_category = ?2, rate_type = ?3, unit_price = ?4,
                unit = ?5, courtesy_minutes = ?6, active = ?7, config_json = ?8,
                updated_at = ?9
            WHERE id = ?10
            "#,
            params![
                input.name,
                input.vehicle_category,
                input.rate_type.as_str(),
                decimal_text(input.unit_price),
                input.unit.as_str(),
                input.courtesy_minutes,
                input.active,
                config,
                now,
                id
            ],
        )?;
        if updated == 0 {
            return Err(DbError::NotFound { entity: "rate", id });
        }
        self.get_rate(id)?
            .ok_or(DbError::NotFound { entity: "rate", id })
    }

    /// Deletes a rate with its windows, rules and outgoing thresholds.
    /// Thresholds of other rates that target it are removed as well.
    pub fn delete_rate(&mut self, id: i64) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM threshold WHERE target_rate_id = ?1",
            params![id],
        )?;
        tx.execute(
            "UPDATE time_window SET extra_rate_id = NULL WHERE extra_rate_id = ?1",
            params![id],
        )?;
        let deleted = tx.execute("DELETE FROM rate WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(DbError::NotFound { entity: "rate", id });
        }
        tx.commit()?;
        Ok(())
    }
}
