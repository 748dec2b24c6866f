use std::collections::BTreeMap;

use crate::model::{Rate, RatePlan, RateType, TariffSnapshot};

/// Resolved, read-only tariff configuration keyed by rate id.
///
/// The calculator uses it to look up extra rates for window excess and the
/// targets of thresholds; it never fetches anything itself.
#[derive(Debug, Clone, Default)]
pub struct TariffCatalog {
    plans: BTreeMap<i64, RatePlan>,
}

impl TariffCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: TariffSnapshot) -> Self {
        let mut catalog = Self::new();
        for rate in snapshot.rates {
            catalog.insert(RatePlan::new(rate));
        }
        for window in snapshot.windows {
            if let Some(plan) = catalog.plans.get_mut(&window.rate_id) {
                plan.windows.push(window);
            }
        }
        for rule in snapshot.rules {
            if let Some(plan) = catalog.plans.get_mut(&rule.rate_id) {
                plan.rules.push(rule);
            }
        }
        for threshold in snapshot.thresholds {
            if let Some(plan) = catalog.plans.get_mut(&threshold.source_rate_id) {
                plan.thresholds.push(threshold);
            }
        }
        catalog
    }

    pub fn insert(&mut self, plan: RatePlan) {
        self.plans.insert(plan.rate.id, plan);
    }

    pub fn plan(&self, rate_id: i64) -> Option<&RatePlan> {
        self.plans.get(&rate_id)
    }

    pub fn rate(&self, rate_id: i64) -> Option<&Rate> {
        self.plans.get(&rate_id).map(|plan| &plan.rate)
    }

    pub fn rates(&self) -> impl Iterator<Item = &Rate> {
        self.plans.values().map(|plan| &plan.rate)
    }

    /// Active hourly/fraction rate for a vehicle category, lowest id first.
    pub fn hourly_rate_for(&self, category: &str) -> Option<&Rate> {
        self.rates().find(|rate| {
            rate.active
                && rate.rate_type == RateType::Hourly
                && rate.vehicle_category.eq_ignore_ascii_case(category)
        })
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    pub fn snapshot(&self) -> TariffSnapshot {
        let mut snapshot = TariffSnapshot::default();
        for plan in self.plans.values() {
            snapshot.rates.push(plan.rate.clone());
            snapshot.windows.extend(plan.windows.iter().cloned());
            snapshot.rules.extend(plan.rules.iter().cloned());
            snapshot.thresholds.extend(plan.thresholds.iter().cloned());
        }
        snapshot
    }
}
