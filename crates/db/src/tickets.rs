use chrono::{NaiveDateTime, Utc};
use rusqlite::{OptionalExtension, params};
use tariff_core::{FeeResult, Ticket, TicketInput};

use crate::Db;
use crate::error::{DbError, Result};
use crate::helpers::{decimal_text, row_to_ticket};

impl Db {
    pub fn open_ticket(&self, input: &TicketInput) -> Result<Ticket> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            r#"
            INSERT INTO ticket (plate, vehicle_category, rate_id, entry_at, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                input.plate,
                input.vehicle_category,
                input.rate_id,
                input.entry_at,
                now
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_ticket(id)?
            .ok_or(DbError::NotFound { entity: "ticket", id })
    }

    pub fn get_ticket(&self, id: i64) -> Result<Option<Ticket>> {
        self.conn
            .query_row(
                r#"
                SELECT id, plate, vehicle_category, rate_id, entry_at, exit_at,
                       total_value, fee_json
                FROM ticket
                WHERE id = ?1
                "#,
                params![id],
                row_to_ticket,
            )
            .optional()
            .map_err(DbError::from)
    }

    pub fn find_open_ticket(&self, plate: &str) -> Result<Option<Ticket>> {
        self.conn
            .query_row(
                r#"
                SELECT id, plate, vehicle_category, rate_id, entry_at, exit_at,
                       total_value, fee_json
                FROM ticket
                WHERE plate = ?1 AND exit_at IS NULL
                ORDER BY entry_at DESC, id DESC
                LIMIT 1
                "#,
                params![plate],
                row_to_ticket,
            )
            .optional()
            .map_err(DbError::from)
    }

    pub fn list_open_tickets(&self) -> Result<Vec<Ticket>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, plate, vehicle_category, rate_id, entry_at, exit_at,
                   total_value, fee_json
            FROM ticket
            WHERE exit_at IS NULL
            ORDER BY entry_at ASC, id ASC
            "#,
        )?;
        let rows = stmt
            .query_map([], row_to_ticket)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Records the exit and the fee charged. Only open tickets are closed.
    pub fn close_ticket(&self, id: i64, exit_at: NaiveDateTime, fee: &FeeResult) -> Result<Ticket> {
        let updated = self.conn.execute(
            r#"
            UPDATE ticket
            SET exit_at = ?1, total_value = ?2, fee_json = ?3
            WHERE id = ?4 AND exit_at IS NULL
            "#,
            params![
                exit_at,
                decimal_text(fee.amount),
                serde_json::to_string(fee)?,
                id
            ],
        )?;
        if updated == 0 {
            return Err(DbError::NotFound { entity: "open ticket", id });
        }
        self.get_ticket(id)?
            .ok_or(DbError::NotFound { entity: "ticket", id })
    }
}
