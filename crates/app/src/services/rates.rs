use rust_decimal::Decimal;
use tariff_core::{
    PricingRule, PricingRuleInput, Rate, RateInput, RatePlan, TariffSnapshot, Threshold,
    ThresholdInput, TimeWindow, TimeWindowInput,
};
use tariff_db::Db;

use crate::error::{AppError, Result};
use crate::services::{SharedConfig, missing_rate, open_db, require_plan, sync_defaults};

#[derive(Clone)]
pub struct RatesService {
    config: SharedConfig,
}

impl RatesService {
    pub(super) fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    fn db(&self) -> Result<Db> {
        open_db(&self.config)
    }

    pub fn list(&self) -> Result<Vec<Rate>> {
        let db = self.db()?;
        Ok(db.list_rates()?)
    }

    pub fn plan(&self, rate_id: i64) -> Result<RatePlan> {
        let db = self.db()?;
        require_plan(&db, rate_id)
    }

    /// Every stored rate, window, rule and threshold, in defaults-file form.
    pub fn snapshot(&self) -> Result<TariffSnapshot> {
        let db = self.db()?;
        Ok(db.tariff_snapshot()?)
    }

    /// Creates a rate when `id` is `None`, otherwise updates it in place.
    pub fn upsert(&self, id: Option<i64>, input: &RateInput) -> Result<Rate> {
        validate_rate(input)?;
        let db = self.db()?;
        let rate = match id {
            Some(id) => db.update_rate(id, input)?,
            None => db.create_rate(input)?,
        };
        sync_defaults(&self.config, &db);
        Ok(rate)
    }

    pub fn delete(&self, rate_id: i64) -> Result<()> {
        let mut db = self.db()?;
        db.delete_rate(rate_id)?;
        sync_defaults(&self.config, &db);
        Ok(())
    }

    pub fn replace_windows(
        &self,
        rate_id: i64,
        windows: &[TimeWindowInput],
    ) -> Result<Vec<TimeWindow>> {
        let mut db = self.db()?;
        require_rate(&db, rate_id)?;
        for window in windows {
            validate_window(&db, rate_id, window)?;
        }
        let stored = db.replace_windows(rate_id, windows)?;
        sync_defaults(&self.config, &db);
        Ok(stored)
    }

    pub fn replace_rules(
        &self,
        rate_id: i64,
        rules: &[PricingRuleInput],
    ) -> Result<Vec<PricingRule>> {
        let mut db = self.db()?;
        require_rate(&db, rate_id)?;
        let stored = db.replace_rules(rate_id, rules)?;
        sync_defaults(&self.config, &db);
        Ok(stored)
    }

    pub fn replace_thresholds(
        &self,
        rate_id: i64,
        thresholds: &[ThresholdInput],
    ) -> Result<Vec<Threshold>> {
        let mut db = self.db()?;
        require_rate(&db, rate_id)?;
        for threshold in thresholds {
            if threshold.target_rate_id == rate_id {
                return Err(AppError::InvalidInput(
                    "a threshold cannot target its own rate".to_string(),
                ));
            }
            if threshold.amount < Decimal::ZERO {
                return Err(AppError::InvalidInput(
                    "threshold amount must not be negative".to_string(),
                ));
            }
            require_rate(&db, threshold.target_rate_id)?;
        }
        let stored = db.replace_thresholds(rate_id, thresholds)?;
        sync_defaults(&self.config, &db);
        Ok(stored)
    }
}

fn require_rate(db: &Db, rate_id: i64) -> Result<Rate> {
    db.get_rate(rate_id)?.ok_or_else(|| missing_rate(rate_id))
}

fn validate_rate(input: &RateInput) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(AppError::InvalidInput("rate name is required".to_string()));
    }
    if input.vehicle_category.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "vehicle category is required".to_string(),
        ));
    }
    if input.unit_price < Decimal::ZERO {
        return Err(AppError::InvalidInput(
            "unit price must not be negative".to_string(),
        ));
    }
    Ok(())
}

fn validate_window(db: &Db, rate_id: i64, window: &TimeWindowInput) -> Result<()> {
    for day in [window.start_day, window.end_day].into_iter().flatten() {
        if day > 6 {
            return Err(AppError::InvalidInput(format!(
                "day of week {day} is out of range 0-6"
            )));
        }
    }
    if let Some(extra) = window.extra_rate_id {
        if extra == rate_id {
            return Err(AppError::InvalidInput(
                "a window cannot bill its excess at its own rate".to_string(),
            ));
        }
        require_rate(db, extra)?;
    }
    Ok(())
}
