use rusqlite::params;
use tariff_core::{
    PricingRule, PricingRuleInput, RatePlan, Threshold, ThresholdInput, TimeWindow,
    TimeWindowInput,
};

use crate::Db;
use crate::error::Result;
use crate::helpers::{decimal_text, row_to_rule, row_to_threshold, row_to_window};

impl Db {
    pub fn list_windows(&self, rate_id: i64) -> Result<Vec<TimeWindow>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, rate_id, window_type, start_time, end_time, start_day, end_day,
                   duration_limit_minutes, extra_rate_id, active, metadata_json
            FROM time_window
            WHERE rate_id = ?1
            ORDER BY position ASC, id ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![rate_id], row_to_window)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Replaces the windows of a rate. Input order decides which window governs.
    pub fn replace_windows(
        &mut self,
        rate_id: i64,
        windows: &[TimeWindowInput],
    ) -> Result<Vec<TimeWindow>> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM time_window WHERE rate_id = ?1", params![rate_id])?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO time_window (
                  rate_id, window_type, start_time, end_time, start_day, end_day,
                  duration_limit_minutes, extra_rate_id, position, active, metadata_json
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
            )?;
            for (position, window) in windows.iter().enumerate() {
                stmt.execute(params![
                    rate_id,
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
        tx.commit()?;
        self.list_windows(rate_id)
    }

    pub fn list_rules(&self, rate_id: i64) -> Result<Vec<PricingRule>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, rate_id, rule_type, conditions_json, adjustment_json, priority,
                   sequence, active, description
            FROM pricing_rule
            WHERE rate_id = ?1
            ORDER BY priority ASC, sequence ASC, id ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![rate_id], row_to_rule)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Replaces the rules of a rate. Each rule gets a fresh sequence number in
    /// input order, so ties on priority resolve the way they were listed.
    pub fn replace_rules(
        &mut self,
        rate_id: i64,
        rules: &[PricingRuleInput],
    ) -> Result<Vec<PricingRule>> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM pricing_rule WHERE rate_id = ?1", params![rate_id])?;
        let mut sequence: i64 = tx.query_row(
            "SELECT COALESCE(MAX(sequence), 0) FROM pricing_rule",
            [],
            |row| row.get(0),
        )?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO pricing_rule (
                  rate_id, rule_type, conditions_json, adjustment_json, priority,
                  sequence, active, description
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )?;
            for rule in rules {
                sequence += 1;
                stmt.execute(params![
                    rate_id,
                    rule.rule_type.as_str(),
                    serde_json::to_string(&rule.conditions)?,
                    serde_json::to_string(&rule.adjustment)?,
                    rule.priority,
                    sequence,
                    rule.active,
                    rule.description
                ])?;
            }
        }
        tx.commit()?;
        self.list_rules(rate_id)
    }

    pub fn list_thresholds(&self, rate_id: i64) -> Result<Vec<Threshold>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, source_rate_id, target_rate_id, amount, auto_apply
            FROM threshold
            WHERE source_rate_id = ?1
            ORDER BY position ASC, id ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![rate_id], row_to_threshold)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn replace_thresholds(
        &mut self,
        rate_id: i64,
        thresholds: &[ThresholdInput],
    ) -> Result<Vec<Threshold>> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM threshold WHERE source_rate_id = ?1",
            params![rate_id],
        )?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO threshold (source_rate_id, target_rate_id, amount, auto_apply, position)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )?;
            for (position, threshold) in thresholds.iter().enumerate() {
                stmt.execute(params![
                    rate_id,
                    threshold.target_rate_id,
                    decimal_text(threshold.amount),
                    threshold.auto_apply,
                    position as i64
                ])?;
            }
        }
        tx.commit()?;
        self.list_thresholds(rate_id)
    }

    /// A rate with its windows, rules and thresholds, or `None` if it is unknown.
    pub fn load_plan(&self, rate_id: i64) -> Result<Option<RatePlan>> {
        let Some(rate) = self.get_rate(rate_id)? else {
            return Ok(None);
        };
        let mut plan = RatePlan::new(rate);
        plan.windows = self.list_windows(rate_id)?;
        plan.rules = self.list_rules(rate_id)?;
        plan.thresholds = self.list_thresholds(rate_id)?;
        Ok(Some(plan))
    }
}
