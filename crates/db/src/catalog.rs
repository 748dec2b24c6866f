use chrono::Utc;
use rusqlite::params;
use tariff_core::{TariffCatalog, TariffSnapshot};
use tracing::info;

use crate::Db;
use crate::error::Result;
use crate::helpers::{decimal_text, row_to_rule, row_to_threshold, row_to_window};

impl Db {
    /// Every stored tariff record, ids preserved.
    pub fn tariff_snapshot(&self) -> Result<TariffSnapshot> {
        let rates = self.list_rates()?;
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, rate_id, window_type, start_time, end_time, start_day, end_day,
                   duration_limit_minutes, extra_rate_id, active, metadata_json
            FROM time_window
            ORDER BY rate_id ASC, position ASC, id ASC
            "#,
        )?;
        let windows = stmt
            .query_map([], row_to_window)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, rate_id, rule_type, conditions_json, adjustment_json, priority,
                   sequence, active, description
            FROM pricing_rule
            ORDER BY rate_id ASC, priority ASC, sequence ASC, id ASC
            "#,
        )?;
        let rules = stmt
            .query_map([], row_to_rule)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, source_rate_id, target_rate_id, amount, auto_apply
            FROM threshold
            ORDER BY source_rate_id ASC, position ASC, id ASC
            "#,
        )?;
        let thresholds = stmt
            .query_map([], row_to_threshold)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(TariffSnapshot {
            rates,
            windows,
            rules,
            thresholds,
        })
    }

    pub fn load_catalog(&self) -> Result<TariffCatalog> {
        Ok(TariffCatalog::from_snapshot(self.tariff_snapshot()?))
    }

    /// Swaps the whole tariff configuration for `snapshot`, keeping its ids so
    /// extra-rate and threshold references stay valid.
    pub fn replace_tariffs(&mut self, snapshot: &TariffSnapshot) -> Result<usize> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM threshold", [])?;
        tx.execute("DELETE FROM pricing_rule", [])?;
        tx.execute("DELETE FROM time_window", [])?;
        tx.execute("DELETE FROM rate", [])?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO rate (
                  id, name, vehicle_category, rate_type, unit_price, unit,
                  courtesy_minutes, active, config_json, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
            )?;
            for rate in &snapshot.rates {
                stmt.execute(params![
                    rate.id,
                    rate.name,
                    rate.vehicle_category,
                    rate.rate_type.as_str(),
                    decimal_text(rate.unit_price),
                    rate.unit.as_str(),
                    rate.courtesy_minutes,
                    rate.active,
                    serde_json::to_string(&rate.config)?,
                    now,
                    now
                ])?;
            }
        }
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO time_window (
                  id, rate_id, window_type, start_time, end_time, start_day, end_day,
                  duration_limit_minutes, extra_rate_id, position, active, metadata_json
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
            )?;
            for (position, window) in snapshot.windows.iter().enumerate() {
                stmt.execute(params![
                    window.id,
                    window.rate_id,
                    window.window_type.as_str(),
                    window.start_time,
                    window.end_time,
                    window.start_day,
                    window.end_day,
                    window.duration_limit_minutes,
                    window.extra_rate_id,
                    position as i64,
                    window.active,
                    serde_json::to_string(&window.metadata)?
                ])?;
            }
        }
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO pricing_rule (
                  id, rate_id, rule_type, conditions_json, adjustment_json, priority,
                  sequence, active, description
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )?;
            for rule in &snapshot.rules {
                stmt.execute(params![
                    rule.id,
                    rule.rate_id,
                    rule.rule_type.as_str(),
                    serde_json::to_string(&rule.conditions)?,
                    serde_json::to_string(&rule.adjustment)?,
                    rule.priority,
                    rule.sequence,
                    rule.active,
                    rule.description
                ])?;
            }
        }
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO threshold (id, source_rate_id, target_rate_id, amount, auto_apply, position)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )?;
            for (position, threshold) in snapshot.thresholds.iter().enumerate() {
                stmt.execute(params![
                    threshold.id,
                    threshold.source_rate_id,
                    threshold.target_rate_id,
                    decimal_text(threshold.amount),
                    threshold.auto_apply,
                    position as i64
                ])?;
            }
        }
        tx.commit()?;
        info!(rates = snapshot.rates.len(), "tariff configuration replaced");
        Ok(snapshot.rates.len())
    }
}
