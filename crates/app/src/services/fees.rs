use serde::Serialize;
use tariff_core::{
    FeeResult, PricingRule, PricingRuleInput, RatePlan, StayInterval, TariffCatalog,
    compute_fee_with,
};
use tariff_db::Db;
use tracing::{debug, warn};

use crate::error::{AppError, Result};
use crate::services::{SharedConfig, fee_options, missing_rate, open_db};

/// One sample stay priced under the stored rules and under the candidates.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewSample {
    pub stay: StayInterval,
    pub current: FeeResult,
    pub candidate: FeeResult,
}

#[derive(Clone)]
pub struct FeesService {
    config: SharedConfig,
}

impl FeesService {
    pub(super) fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    fn db(&self) -> Result<Db> {
        open_db(&self.config)
    }

    /// Prices a stay without persisting anything.
    pub fn quote(&self, rate_id: i64, stay: &StayInterval) -> Result<FeeResult> {
        let db = self.db()?;
        let catalog = db.load_catalog()?;
        let plan = active_plan(&catalog, rate_id)?;
        let result = compute_fee_with(stay, plan, &catalog, fee_options(&db)?)?;
        log_issues(&result);
        debug!(rate_id, amount = %result.amount, minutes = result.elapsed_minutes, "quoted stay");
        Ok(result)
    }

    /// Prices each sample twice, once with the stored rules of the rate and
    /// once with `rules` in their place.
    pub fn preview(
        &self,
        rate_id: i64,
        rules: &[PricingRuleInput],
        samples: &[StayInterval],
    ) -> Result<Vec<PreviewSample>> {
        let db = self.db()?;
        let options = fee_options(&db)?;
        let catalog = db.load_catalog()?;
        let current_plan = active_plan(&catalog, rate_id)?;
        let mut candidate_plan = current_plan.clone();
        candidate_plan.rules = candidate_rules(rate_id, rules);
        let mut candidate_catalog = catalog.clone();
        candidate_catalog.insert(candidate_plan.clone());

        samples
            .iter()
            .map(|stay| -> Result<PreviewSample> {
                let current = compute_fee_with(stay, current_plan, &catalog, options)?;
                let candidate =
                    compute_fee_with(stay, &candidate_plan, &candidate_catalog, options)?;
                Ok(PreviewSample {
                    stay: stay.clone(),
                    current,
                    candidate,
                })
            })
            .collect()
    }
}

fn active_plan(catalog: &TariffCatalog, rate_id: i64) -> Result<&RatePlan> {
    let plan = catalog.plan(rate_id).ok_or_else(|| missing_rate(rate_id))?;
    if !plan.rate.active {
        return Err(AppError::InvalidInput(format!(
            "rate {rate_id} is inactive"
        )));
    }
    Ok(plan)
}

/// Unsaved rules get negative ids so they never collide with stored ones.
fn candidate_rules(rate_id: i64, rules: &[PricingRuleInput]) -> Vec<PricingRule> {
    rules
        .iter()
        .enumerate()
        .map(|(index, rule)| PricingRule {
            id: -(index as i64 + 1),
            rate_id,
            rule_type: rule.rule_type,
            conditions: rule.conditions.clone(),
            adjustment: rule.adjustment.clone(),
            priority: rule.priority,
            sequence: index as i64,
            active: rule.active,
            description: rule.description.clone(),
        })
        .collect()
}

fn log_issues(result: &FeeResult) {
    for issue in &result.issues {
        warn!(
            rate_id = result.rate_id,
            source = ?issue.source,
            id = issue.id,
            "{}",
            issue.message
        );
    }
}
