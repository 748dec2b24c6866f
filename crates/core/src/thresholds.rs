use rust_decimal::Decimal;

use crate::catalog::TariffCatalog;
use crate::model::{RatePlan, Threshold};
use crate::outcome::{ConfigIssue, IssueSource, report};

/// Picks the tightest exceeded threshold of a plan together with its target.
///
/// The lowest threshold amount still below `amount` wins; ties keep the
/// first threshold listed.
pub(crate) fn select<'a>(
    plan: &'a RatePlan,
    amount: Decimal,
    catalog: &'a TariffCatalog,
    issues: &mut Vec<ConfigIssue>,
) -> Option<(&'a Threshold, &'a RatePlan)> {
    let mut best: Option<(&Threshold, &RatePlan)> = None;
    for threshold in &plan.thresholds {
        if threshold.source_rate_id != plan.rate.id {
            report(
                issues,
                IssueSource::Threshold,
                threshold.id,
                format!("threshold belongs to rate {}", threshold.source_rate_id),
            );
            continue;
        }
        if threshold.target_rate_id == threshold.source_rate_id {
            report(
                issues,
                IssueSource::Threshold,
                threshold.id,
                "threshold targets its own source rate",
            );
            continue;
        }
        if threshold.amount.is_sign_negative() && !threshold.amount.is_zero() {
            report(
                issues,
                IssueSource::Threshold,
                threshold.id,
                format!("threshold amount {} is negative", threshold.amount),
            );
            continue;
        }
        if amount <= threshold.amount {
            continue;
        }
        let Some(target) = catalog.plan(threshold.target_rate_id) else {
            report(
                issues,
                IssueSource::Threshold,
                threshold.id,
                format!("target rate {} not found", threshold.target_rate_id),
            );
            continue;
        };
        if !target.rate.active {
            report(
                issues,
                IssueSource::Threshold,
                threshold.id,
                format!("target rate {} is inactive", threshold.target_rate_id),
            );
            continue;
        }
        if best.is_none_or(|(current, _)| threshold.amount < current.amount) {
            best = Some((threshold, target));
        }
    }
    best
}
