use rust_decimal::Decimal;
use tracing::debug;

use crate::catalog::TariffCatalog;
use crate::error::FeeError;
use crate::model::{Rate, RatePlan, RateType, RateUnit, StayInterval};
use crate::money::{DEFAULT_MINOR_UNITS, round_money};
use crate::outcome::{
    BreakdownLine, ConfigIssue, FeeResult, IssueSource, LineKind, RateSuggestion, WindowMatch,
    report,
};
use crate::rules;
use crate::thresholds;
use crate::timeline::{Segment, SegmentKind, Span, chop, elapsed_minutes, whole_seconds};
use crate::windows::Matcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeOptions {
    /// Decimal places of the currency's minor unit.
    pub minor_units: u32,
}

impl Default for FeeOptions {
    fn default() -> Self {
        Self {
            minor_units: DEFAULT_MINOR_UNITS,
        }
    }
}

/// Computes the fee for a stay under `plan`, rounding to two decimals.
///
/// `catalog` resolves the rates a plan refers to (extra rates for window
/// excess, threshold targets). Exit before entry is the only error.
pub fn compute_fee(
    stay: &StayInterval,
    plan: &RatePlan,
    catalog: &TariffCatalog,
) -> Result<FeeResult, FeeError> {
    compute_fee_with(stay, plan, catalog, FeeOptions::default())
}

pub fn compute_fee_with(
    stay: &StayInterval,
    plan: &RatePlan,
    catalog: &TariffCatalog,
    options: FeeOptions,
) -> Result<FeeResult, FeeError> {
    if stay.exit < stay.entry {
        return Err(FeeError::InvalidInterval {
            entry: stay.entry,
            exit: stay.exit,
        });
    }
    let span = Span::new(whole_seconds(stay.entry), whole_seconds(stay.exit));
    let pricing = Pricing {
        stay: span,
        elapsed_minutes: elapsed_minutes(&span),
        category: &stay.vehicle_category,
        catalog,
        minor_units: options.minor_units,
    };
    let mut issues = Vec::new();
    if !plan.rate.active {
        report(
            &mut issues,
            IssueSource::Rate,
            plan.rate.id,
            "rate is inactive",
        );
    }

    let priced = pricing.price(plan, &mut issues);
    let mut result = FeeResult {
        amount: priced.amount,
        rate_id: plan.rate.id,
        elapsed_minutes: pricing.elapsed_minutes,
        courtesy_applied: priced.courtesy_applied,
        window: priced.window,
        breakdown: priced.lines,
        applied_rule_ids: priced.applied,
        substituted_rate_id: None,
        suggestion: None,
        issues: Vec::new(),
    };
    if !priced.courtesy_applied {
        pricing.advise(plan, &mut result, &mut issues);
    }
    result.issues = issues;
    debug!(
        rate_id = result.rate_id,
        elapsed_minutes = result.elapsed_minutes,
        amount = %result.amount,
        "fee computed"
    );
    Ok(result)
}

struct PricedPlan {
    amount: Decimal,
    courtesy_applied: bool,
    window: Option<WindowMatch>,
    lines: Vec<BreakdownLine>,
    applied: Vec<i64>,
}

struct Pricing<'a> {
    stay: Span,
    elapsed_minutes: i64,
    category: &'a str,
    catalog: &'a TariffCatalog,
    minor_units: u32,
}

impl<'a> Pricing<'a> {
    fn price(&self, plan: &'a RatePlan, issues: &mut Vec<ConfigIssue>) -> PricedPlan {
        let rate = &plan.rate;
        if self.elapsed_minutes <= i64::from(rate.courtesy_minutes) {
            let line = BreakdownLine::new(
                LineKind::Courtesy,
                format!("within {} courtesy minutes", rate.courtesy_minutes),
                Decimal::ZERO,
            )
            .with_rate(rate.id)
            .with_quantity(u32::try_from(self.elapsed_minutes).unwrap_or(u32::MAX));
            return PricedPlan {
                amount: Decimal::ZERO,
                courtesy_applied: true,
                window: None,
                lines: vec![line],
                applied: Vec::new(),
            };
        }

        let matcher = Matcher {
            stay: self.stay,
            elapsed_minutes: self.elapsed_minutes,
            rate,
            category: self.category,
            catalog: self.catalog,
        };
        let (segments, window) = match matcher.price(plan, issues) {
            Some(pricing) => (pricing.segments, Some(pricing.matched)),
            None => (unit_segments(&self.stay, rate), None),
        };
        let mut lines = segment_lines(rate, &segments);
        let outcome = rules::evaluate(&self.stay, rate.id, &plan.rules, segments, issues);
        lines.extend(outcome.lines);

        let amount = round_money(outcome.amount.max(Decimal::ZERO), self.minor_units);
        let listed: Decimal = lines.iter().map(|line| line.amount).sum();
        if listed != amount {
            lines.push(
                BreakdownLine::new(
                    LineKind::Rounding,
                    format!("rounded to {} decimal places", self.minor_units),
                    amount - listed,
                )
                .with_rate(rate.id),
            );
        }
        PricedPlan {
            amount,
            courtesy_applied: false,
            window,
            lines,
            applied: outcome.applied,
        }
    }

    /// Applies the tightest exceeded threshold: substitutes the target rate
    /// when it auto-applies, otherwise attaches a suggestion.
    fn advise(&self, plan: &'a RatePlan, result: &mut FeeResult, issues: &mut Vec<ConfigIssue>) {
        let Some((threshold, target)) = thresholds::select(plan, result.amount, self.catalog, issues)
        else {
            return;
        };
        let priced = self.price(target, issues);
        if !threshold.auto_apply {
            debug!(
                threshold_id = threshold.id,
                target_rate_id = target.rate.id,
                target_amount = %priced.amount,
                "threshold suggests another rate"
            );
            result.suggestion = Some(RateSuggestion {
                threshold_id: threshold.id,
                target_rate_id: target.rate.id,
                target_amount: priced.amount,
            });
            return;
        }

        debug!(
            threshold_id = threshold.id,
            source_amount = %result.amount,
            target_rate_id = target.rate.id,
            target_amount = %priced.amount,
            "threshold substituted rate"
        );
        let mut breakdown = vec![
            BreakdownLine::new(
                LineKind::Substitution,
                format!(
                    "{} under rate {} exceeds {}; charged as {}",
                    result.amount, plan.rate.id, threshold.amount, target.rate.name
                ),
                Decimal::ZERO,
            )
            .with_rate(target.rate.id),
        ];
        breakdown.extend(priced.lines);
        result.amount = priced.amount;
        result.rate_id = target.rate.id;
        result.substituted_rate_id = Some(target.rate.id);
        result.courtesy_applied = priced.courtesy_applied;
        result.window = priced.window;
        result.breakdown = breakdown;
        result.applied_rule_ids = priced.applied;
    }
}

/// Started billing units of a rate without window semantics. Daily rates
/// without windows bill per started day.
fn unit_segments(stay: &Span, rate: &Rate) -> Vec<Segment> {
    let unit_minutes = match rate.rate_type {
        RateType::Daily => RateUnit::Day.minutes(),
        _ => rate.unit.minutes(),
    };
    chop(std::slice::from_ref(stay), unit_minutes * 60)
        .into_iter()
        .map(|spans| Segment {
            kind: SegmentKind::Base,
            rate_id: rate.id,
            spans,
            amount: rate.unit_price,
        })
        .collect()
}

fn segment_lines(rate: &Rate, segments: &[Segment]) -> Vec<BreakdownLine> {
    let mut lines: Vec<BreakdownLine> = Vec::new();
    for segment in segments {
        let (kind, window_id) = match segment.kind {
            SegmentKind::Covered { window_id } => (LineKind::Covered, window_id),
            SegmentKind::Excess => (LineKind::Excess, None),
            SegmentKind::Base | SegmentKind::Tier | SegmentKind::Carried => (LineKind::Base, None),
        };
        if let Some(last) = lines.last_mut()
            && last.kind == kind
            && last.rate_id == Some(segment.rate_id)
            && last.window_id == window_id
        {
            last.quantity += 1;
            last.amount += segment.amount;
            continue;
        }
        let description = match (kind, window_id) {
            (LineKind::Covered, Some(id)) => format!("window {id} at {}", rate.unit_price),
            (LineKind::Covered, None) => format!("flat {} rate", rate.rate_type),
            (LineKind::Excess, _) => format!("excess billed at rate {}", segment.rate_id),
            _ => format!("{} per {}", rate.unit_price, rate.unit),
        };
        lines.push(
            BreakdownLine::new(kind, description, segment.amount)
                .with_rate(segment.rate_id)
                .with_window(window_id)
                .with_quantity(1),
        );
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Adjustment, PricingRule, ProgressiveRange, RuleConditions, RuleType, Threshold,
        TimeWindow, WindowType,
    };
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
    use rust_decimal_macros::dec;

    // 2025-03-03 is a Monday.
    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .and_then(|date| date.and_hms_opt(hour, minute, 0))
            .expect("valid timestamp")
    }

    fn time(hour: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(hour, 0, 0)
    }

    fn stay(entry: NaiveDateTime, exit: NaiveDateTime) -> StayInterval {
        StayInterval {
            entry,
            exit,
            vehicle_category: "car".to_string(),
        }
    }

    fn rate(id: i64, rate_type: RateType, unit_price: Decimal, unit: RateUnit) -> Rate {
        Rate {
            id,
            name: format!("rate {id}"),
            vehicle_category: "car".to_string(),
            rate_type,
            unit_price,
            unit,
            courtesy_minutes: 0,
            active: true,
            config: Default::default(),
        }
    }

    fn hourly(id: i64, unit_price: Decimal) -> RatePlan {
        RatePlan::new(rate(id, RateType::Hourly, unit_price, RateUnit::Hour))
    }

    fn window(id: i64, rate_id: i64, window_type: WindowType) -> TimeWindow {
        TimeWindow {
            id,
            rate_id,
            window_type,
            start_time: None,
            end_time: None,
            start_day: None,
            end_day: None,
            duration_limit_minutes: None,
            extra_rate_id: None,
            active: true,
            metadata: Default::default(),
        }
    }

    fn rule(id: i64, rate_id: i64, rule_type: RuleType, adjustment: Adjustment) -> PricingRule {
        PricingRule {
            id,
            rate_id,
            rule_type,
            conditions: RuleConditions::default(),
            adjustment,
            priority: 0,
            sequence: id,
            active: true,
            description: None,
        }
    }

    fn multiplier(id: i64, rate_id: i64, value: Decimal, hours: (u8, u8)) -> PricingRule {
        let mut rule = rule(id, rate_id, RuleType::TimeRange, Adjustment::Multiplier { value });
        rule.conditions.hour_start = Some(hours.0);
        rule.conditions.hour_end = Some(hours.1);
        rule
    }

    fn progressive(id: i64, rate_id: i64, ranges: &[(u32, Option<u32>, Decimal)]) -> PricingRule {
        let ranges = ranges
            .iter()
            .map(|(from, to, value)| ProgressiveRange {
                from: *from,
                to: *to,
                value: *value,
            })
            .collect();
        rule(
            id,
            rate_id,
            RuleType::HourlyProgression,
            Adjustment::Progressive { ranges },
        )
    }

    fn cap(id: i64, rate_id: i64, value: Decimal) -> PricingRule {
        rule(id, rate_id, RuleType::DailyMax, Adjustment::Cap { value })
    }

    fn catalog_of(plans: &[&RatePlan]) -> TariffCatalog {
        let mut catalog = TariffCatalog::new();
        for plan in plans {
            catalog.insert((*plan).clone());
        }
        catalog
    }

    fn quote(
        plan: &RatePlan,
        catalog: &TariffCatalog,
        entry: NaiveDateTime,
        exit: NaiveDateTime,
    ) -> FeeResult {
        compute_fee(&stay(entry, exit), plan, catalog).expect("fee")
    }

    fn assert_lines_sum(result: &FeeResult) {
        let listed: Decimal = result.breakdown.iter().map(|line| line.amount).sum();
        assert_eq!(listed, result.amount, "breakdown {:?}", result.breakdown);
    }

    #[test]
    fn courtesy_minutes_waive_the_fee() {
        let mut plan = hourly(1, dec!(10));
        plan.rate.courtesy_minutes = 15;
        let catalog = catalog_of(&[&plan]);

        let waived = quote(&plan, &catalog, at(3, 10, 0), at(3, 10, 15));
        assert_eq!(waived.amount, Decimal::ZERO);
        assert!(waived.courtesy_applied);
        assert_eq!(waived.breakdown[0].kind, LineKind::Courtesy);

        let charged = quote(&plan, &catalog, at(3, 10, 0), at(3, 10, 16));
        assert_eq!(charged.amount, dec!(10));
        assert!(!charged.courtesy_applied);
        assert_lines_sum(&charged);
    }

    #[test]
    fn courtesy_skips_thresholds() {
        let mut plan = hourly(1, dec!(10));
        plan.rate.courtesy_minutes = 30;
        plan.thresholds.push(Threshold {
            id: 1,
            source_rate_id: 1,
            target_rate_id: 2,
            amount: dec!(-1),
            auto_apply: true,
        });
        let catalog = catalog_of(&[&plan]);
        let result = quote(&plan, &catalog, at(3, 10, 0), at(3, 10, 20));
        assert_eq!(result.amount, Decimal::ZERO);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn zero_length_stay_is_free() {
        let plan = hourly(1, dec!(10));
        let catalog = catalog_of(&[&plan]);
        let result = quote(&plan, &catalog, at(3, 10, 0), at(3, 10, 0));
        assert_eq!(result.amount, Decimal::ZERO);
        assert_eq!(result.elapsed_minutes, 0);
    }

    #[test]
    fn exit_before_entry_is_rejected() {
        let plan = hourly(1, dec!(10));
        let catalog = catalog_of(&[&plan]);
        let err = compute_fee(&stay(at(3, 10, 0), at(3, 9, 59)), &plan, &catalog)
            .expect_err("invalid interval");
        assert_eq!(
            err,
            FeeError::InvalidInterval {
                entry: at(3, 10, 0),
                exit: at(3, 9, 59),
            }
        );
    }

    #[test]
    fn amounts_round_half_up_to_cents() {
        let plan = hourly(1, dec!(3.333));
        let catalog = catalog_of(&[&plan]);
        let result = quote(&plan, &catalog, at(3, 8, 0), at(3, 11, 0));
        assert_eq!(result.amount, dec!(10.00));
        assert_eq!(result.amount.scale(), 2);
        assert!(result.breakdown.iter().any(|line| line.kind == LineKind::Rounding));
        assert_lines_sum(&result);

        let per_minute = RatePlan::new(rate(2, RateType::Hourly, dec!(0.125), RateUnit::Minute));
        let catalog = catalog_of(&[&per_minute]);
        let result = quote(&per_minute, &catalog, at(3, 8, 0), at(3, 8, 1));
        assert_eq!(result.amount, dec!(0.13));
    }

    #[test]
    fn minor_units_follow_options() {
        let plan = hourly(1, dec!(3.333));
        let catalog = catalog_of(&[&plan]);
        let result = compute_fee_with(
            &stay(at(3, 8, 0), at(3, 11, 0)),
            &plan,
            &catalog,
            FeeOptions { minor_units: 0 },
        )
        .expect("fee");
        assert_eq!(result.amount, dec!(10));
    }

    #[test]
    fn identical_inputs_give_identical_results() {
        let mut plan = hourly(1, dec!(7.5));
        plan.rules.push(multiplier(1, 1, dec!(1.5), (17, 19)));
        plan.rules.push(cap(2, 1, dec!(60)));
        let catalog = catalog_of(&[&plan]);
        let first = quote(&plan, &catalog, at(3, 15, 10), at(3, 21, 5));
        let second = quote(&plan, &catalog, at(3, 15, 10), at(3, 21, 5));
        assert_eq!(first, second);
    }

    fn overnight_plan(extra_rate_id: Option<i64>) -> RatePlan {
        let mut plan = RatePlan::new(rate(1, RateType::Overnight, dec!(30), RateUnit::Day));
        let mut night = window(10, 1, WindowType::Overnight);
        night.start_time = time(20);
        night.end_time = time(8);
        night.extra_rate_id = extra_rate_id;
        plan.windows.push(night);
        plan
    }

    #[test]
    fn overnight_window_covers_stay_across_midnight() {
        let plan = overnight_plan(None);
        let catalog = catalog_of(&[&plan]);
        let result = quote(&plan, &catalog, at(3, 22, 0), at(4, 6, 0));
        let matched = result.window.clone().expect("window match");
        assert_eq!(matched.window_id, Some(10));
        assert_eq!(matched.excess_minutes, 0);
        assert_eq!(matched.covered_minutes, 480);
        assert_eq!(result.amount, dec!(30));
        assert_lines_sum(&result);
    }

    #[test]
    fn overnight_excess_uses_category_hourly_rate() {
        let plan = overnight_plan(None);
        let extra = hourly(2, dec!(5));
        let catalog = catalog_of(&[&plan, &extra]);
        let result = quote(&plan, &catalog, at(3, 18, 0), at(4, 9, 0));
        let matched = result.window.clone().expect("window match");
        assert_eq!(matched.excess_minutes, 180);
        assert_eq!(matched.excess_rate_id, Some(2));
        assert_eq!(matched.covered_amount, dec!(30));
        assert_eq!(result.amount, dec!(45));
        assert_lines_sum(&result);
    }

    #[test]
    fn excess_without_any_hourly_rate_is_prorated_and_reported() {
        let plan = overnight_plan(Some(99));
        let catalog = catalog_of(&[&plan]);
        let result = quote(&plan, &catalog, at(3, 18, 0), at(4, 9, 0));
        // 30 per day is 1.25 per hour; three excess hours.
        assert_eq!(result.amount, dec!(33.75));
        assert_eq!(result.window.as_ref().and_then(|m| m.excess_rate_id), None);
        assert!(result.issues.iter().any(|issue| issue.source == IssueSource::Window));
        assert!(result.issues.iter().any(|issue| issue.source == IssueSource::Rate));
    }

    #[test]
    fn weekly_limit_bills_the_extra_day_at_extra_rate() {
        let mut plan = RatePlan::new(rate(1, RateType::Weekly, dec!(200), RateUnit::Week));
        let mut week = window(10, 1, WindowType::Weekly);
        week.duration_limit_minutes = Some(10_080);
        week.extra_rate_id = Some(2);
        plan.windows.push(week);
        let extra = hourly(2, dec!(5));
        let catalog = catalog_of(&[&plan, &extra]);

        let result = quote(&plan, &catalog, at(3, 8, 0), at(11, 8, 0));
        let matched = result.window.clone().expect("window match");
        assert_eq!(matched.excess_minutes, 1_440);
        assert_eq!(matched.covered_minutes, 10_080);
        assert_eq!(matched.excess_rate_id, Some(2));
        assert_eq!(result.amount, dec!(320));
        assert_lines_sum(&result);
    }

    #[test]
    fn weekly_rate_without_windows_bills_flat() {
        let plan = RatePlan::new(rate(1, RateType::Weekly, dec!(200), RateUnit::Week));
        let catalog = catalog_of(&[&plan]);
        let result = quote(&plan, &catalog, at(3, 8, 0), at(5, 8, 0));
        assert_eq!(result.amount, dec!(200));
        let matched = result.window.expect("flat match");
        assert_eq!(matched.window_id, None);
        assert_eq!(matched.excess_minutes, 0);
    }

    #[test]
    fn weekly_window_outside_its_days_bills_everything_as_excess() {
        let mut plan = RatePlan::new(rate(1, RateType::Weekly, dec!(200), RateUnit::Week));
        let mut weekdays = window(10, 1, WindowType::Weekly);
        weekdays.duration_limit_minutes = Some(7_200);
        weekdays.start_day = Some(1);
        weekdays.end_day = Some(5);
        plan.windows.push(weekdays);
        let extra = hourly(2, dec!(5));
        let catalog = catalog_of(&[&plan, &extra]);

        // 2025-03-08 is a Saturday.
        let result = quote(&plan, &catalog, at(8, 10, 0), at(8, 13, 30));
        let matched = result.window.clone().expect("window match");
        assert_eq!(matched.window_id, None);
        assert_eq!(matched.excess_minutes, 210);
        assert_eq!(result.amount, dec!(20));
    }

    #[test]
    fn malformed_window_falls_back_to_flat_value() {
        let mut plan = RatePlan::new(rate(1, RateType::Overnight, dec!(30), RateUnit::Day));
        let mut broken = window(10, 1, WindowType::Overnight);
        broken.start_time = time(20);
        plan.windows.push(broken);
        let catalog = catalog_of(&[&plan]);
        let result = quote(&plan, &catalog, at(3, 18, 0), at(4, 9, 0));
        assert_eq!(result.amount, dec!(30));
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].id, 10);
    }

    #[test]
    fn daily_rate_without_windows_bills_per_started_day() {
        let plan = RatePlan::new(rate(1, RateType::Daily, dec!(40), RateUnit::Day));
        let catalog = catalog_of(&[&plan]);
        let result = quote(&plan, &catalog, at(3, 8, 0), at(4, 9, 0));
        assert_eq!(result.amount, dec!(80));
        assert!(result.window.is_none());
    }

    #[test]
    fn daily_max_caps_after_multipliers() {
        let mut plan = hourly(1, dec!(10));
        plan.rules.push(multiplier(1, 1, dec!(2), (9, 12)));
        plan.rules.push(cap(2, 1, dec!(80)));
        let catalog = catalog_of(&[&plan]);
        let result = quote(&plan, &catalog, at(3, 8, 0), at(3, 20, 0));
        assert_eq!(result.amount, dec!(80));
        assert_eq!(result.applied_rule_ids, vec![1, 2]);
        assert_lines_sum(&result);
    }

    #[test]
    fn daily_max_applies_per_day_of_stay() {
        let mut plan = hourly(1, dec!(10));
        plan.rules.push(cap(1, 1, dec!(80)));
        let catalog = catalog_of(&[&plan]);
        let result = quote(&plan, &catalog, at(3, 8, 0), at(4, 14, 0));
        assert_eq!(result.amount, dec!(140));
        assert_lines_sum(&result);
    }

    fn threshold_plans(auto_apply: bool) -> (RatePlan, RatePlan) {
        let mut source = hourly(1, dec!(9.5));
        source.thresholds.push(Threshold {
            id: 1,
            source_rate_id: 1,
            target_rate_id: 3,
            amount: dec!(90),
            auto_apply,
        });
        let target = RatePlan::new(rate(3, RateType::Daily, dec!(70), RateUnit::Day));
        (source, target)
    }

    #[test]
    fn auto_threshold_substitutes_target_rate() {
        let (source, target) = threshold_plans(true);
        let catalog = catalog_of(&[&source, &target]);
        let result = quote(&source, &catalog, at(3, 8, 0), at(3, 18, 0));
        assert_eq!(result.amount, dec!(70));
        assert_eq!(result.substituted_rate_id, Some(3));
        assert_eq!(result.rate_id, 3);
        assert!(result.suggestion.is_none());
        assert_eq!(result.breakdown[0].kind, LineKind::Substitution);
        assert_lines_sum(&result);
    }

    #[test]
    fn manual_threshold_only_suggests() {
        let (source, target) = threshold_plans(false);
        let catalog = catalog_of(&[&source, &target]);
        let result = quote(&source, &catalog, at(3, 8, 0), at(3, 18, 0));
        assert_eq!(result.amount, dec!(95));
        assert_eq!(result.substituted_rate_id, None);
        let suggestion = result.suggestion.expect("suggestion");
        assert_eq!(suggestion.target_rate_id, 3);
        assert_eq!(suggestion.target_amount, dec!(70));
    }

    #[test]
    fn lowest_exceeded_threshold_wins() {
        let (mut source, target) = threshold_plans(false);
        source.thresholds.push(Threshold {
            id: 2,
            source_rate_id: 1,
            target_rate_id: 4,
            amount: dec!(50),
            auto_apply: false,
        });
        let cheaper = RatePlan::new(rate(4, RateType::Daily, dec!(60), RateUnit::Day));
        let catalog = catalog_of(&[&source, &target, &cheaper]);
        let result = quote(&source, &catalog, at(3, 8, 0), at(3, 18, 0));
        let suggestion = result.suggestion.expect("suggestion");
        assert_eq!(suggestion.threshold_id, 2);
        assert_eq!(suggestion.target_amount, dec!(60));
    }

    #[test]
    fn broken_thresholds_are_reported_and_skipped() {
        let mut source = hourly(1, dec!(10));
        source.thresholds.push(Threshold {
            id: 1,
            source_rate_id: 1,
            target_rate_id: 1,
            amount: dec!(5),
            auto_apply: true,
        });
        source.thresholds.push(Threshold {
            id: 2,
            source_rate_id: 1,
            target_rate_id: 42,
            amount: dec!(5),
            auto_apply: true,
        });
        let mut inactive = RatePlan::new(rate(3, RateType::Daily, dec!(1), RateUnit::Day));
        inactive.rate.active = false;
        source.thresholds.push(Threshold {
            id: 3,
            source_rate_id: 1,
            target_rate_id: 3,
            amount: dec!(5),
            auto_apply: true,
        });
        let catalog = catalog_of(&[&source, &inactive]);
        let result = quote(&source, &catalog, at(3, 8, 0), at(3, 10, 0));
        assert_eq!(result.amount, dec!(20));
        assert_eq!(result.substituted_rate_id, None);
        let ids: Vec<i64> = result.issues.iter().map(|issue| issue.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn progressive_tiers_price_each_started_hour() {
        let mut plan = hourly(1, dec!(10));
        plan.rules.push(progressive(
            1,
            1,
            &[
                (0, Some(2), dec!(10)),
                (2, Some(5), dec!(8)),
                (5, Some(999), dec!(6)),
            ],
        ));
        let catalog = catalog_of(&[&plan]);
        let result = quote(&plan, &catalog, at(3, 8, 0), at(3, 14, 0));
        assert_eq!(result.amount, dec!(50));
        assert_lines_sum(&result);
    }

    #[test]
    fn overlapping_tiers_resolve_to_last_range() {
        let mut plan = hourly(1, dec!(10));
        plan.rules.push(progressive(
            1,
            1,
            &[(0, Some(3), dec!(10)), (2, Some(5), dec!(8))],
        ));
        let catalog = catalog_of(&[&plan]);
        let result = quote(&plan, &catalog, at(3, 8, 0), at(3, 12, 0));
        assert_eq!(result.amount, dec!(36));
    }

    #[test]
    fn hours_outside_every_tier_keep_base_price() {
        let mut plan = hourly(1, dec!(4));
        plan.rules.push(progressive(
            1,
            1,
            &[(0, Some(1), dec!(10)), (3, Some(5), dec!(1))],
        ));
        let catalog = catalog_of(&[&plan]);
        let result = quote(&plan, &catalog, at(3, 8, 0), at(3, 11, 0));
        assert_eq!(result.amount, dec!(18));
    }

    #[test]
    fn first_hour_override_replaces_first_unit() {
        let mut plan = hourly(1, dec!(10));
        plan.rules.push(rule(
            1,
            1,
            RuleType::FirstHour,
            Adjustment::Override { value: dec!(15) },
        ));
        let catalog = catalog_of(&[&plan]);
        let result = quote(&plan, &catalog, at(3, 8, 0), at(3, 11, 0));
        assert_eq!(result.amount, dec!(35));
        assert_eq!(result.applied_rule_ids, vec![1]);
        assert_lines_sum(&result);
    }

    #[test]
    fn first_hour_override_keeps_rest_of_day_unit() {
        let mut plan = RatePlan::new(rate(1, RateType::Daily, dec!(48), RateUnit::Day));
        plan.rules.push(rule(
            1,
            1,
            RuleType::FirstHour,
            Adjustment::Override { value: dec!(5) },
        ));
        let catalog = catalog_of(&[&plan]);
        let result = quote(&plan, &catalog, at(3, 8, 0), at(3, 18, 0));
        // 5 for 08:00-09:00, then nine tenths of the 48 day price.
        assert_eq!(result.amount, dec!(48.20));
        assert_eq!(result.applied_rule_ids, vec![1]);
        assert_lines_sum(&result);
    }

    #[test]
    fn time_range_with_equal_hours_is_rejected() {
        let mut plan = hourly(1, dec!(10));
        plan.rules.push(multiplier(1, 1, dec!(2), (8, 8)));
        let catalog = catalog_of(&[&plan]);
        let result = quote(&plan, &catalog, at(3, 10, 0), at(3, 13, 0));
        assert_eq!(result.amount, dec!(30));
        assert!(result.applied_rule_ids.is_empty());
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].id, 1);
    }

    #[test]
    fn time_range_ending_at_24_covers_whole_day() {
        let mut plan = hourly(1, dec!(10));
        plan.rules.push(multiplier(1, 1, dec!(2), (0, 24)));
        let catalog = catalog_of(&[&plan]);
        let result = quote(&plan, &catalog, at(3, 10, 0), at(3, 13, 0));
        assert_eq!(result.amount, dec!(60));
        assert_eq!(result.applied_rule_ids, vec![1]);
    }

    #[test]
    fn time_range_scales_only_hours_inside_range() {
        let mut plan = hourly(1, dec!(10));
        plan.rules.push(multiplier(1, 1, dec!(2), (18, 20)));
        let catalog = catalog_of(&[&plan]);
        let result = quote(&plan, &catalog, at(3, 17, 0), at(3, 20, 0));
        assert_eq!(result.amount, dec!(50));

        plan.rules[0].conditions.days_of_week = vec![0];
        let catalog = catalog_of(&[&plan]);
        let result = quote(&plan, &catalog, at(3, 17, 0), at(3, 20, 0));
        assert_eq!(result.amount, dec!(30));
        assert!(result.applied_rule_ids.is_empty());
    }

    #[test]
    fn rules_compose_in_priority_order() {
        let mut plan = hourly(1, dec!(10));
        let mut double = multiplier(1, 1, dec!(2), (0, 24));
        let mut tiers = progressive(2, 1, &[(0, None, dec!(12.5))]);
        double.priority = 1;
        tiers.priority = 2;
        plan.rules = vec![tiers.clone(), double.clone()];
        let catalog = catalog_of(&[&plan]);
        let result = quote(&plan, &catalog, at(3, 8, 0), at(3, 12, 0));
        assert_eq!(result.amount, dec!(50));
        assert_eq!(result.applied_rule_ids, vec![1, 2]);

        double.priority = 3;
        plan.rules = vec![tiers, double];
        let catalog = catalog_of(&[&plan]);
        let result = quote(&plan, &catalog, at(3, 8, 0), at(3, 12, 0));
        assert_eq!(result.amount, dec!(100));
        assert_eq!(result.applied_rule_ids, vec![2, 1]);
    }

    #[test]
    fn malformed_and_inactive_rules_are_skipped() {
        let mut plan = hourly(1, dec!(10));
        plan.rules.push(rule(
            1,
            1,
            RuleType::FirstHour,
            Adjustment::Cap { value: dec!(1) },
        ));
        let mut inactive = cap(2, 1, dec!(1));
        inactive.active = false;
        plan.rules.push(inactive);
        plan.rules.push(progressive(3, 1, &[(4, Some(2), dec!(1))]));
        plan.rules.push(multiplier(4, 1, dec!(3), (25, 2)));
        let catalog = catalog_of(&[&plan]);
        let result = quote(&plan, &catalog, at(3, 8, 0), at(3, 11, 0));
        assert_eq!(result.amount, dec!(30));
        assert!(result.applied_rule_ids.is_empty());
        let ids: Vec<i64> = result.issues.iter().map(|issue| issue.id).collect();
        assert_eq!(ids, vec![1, 3, 4]);
    }

    #[test]
    fn inactive_rate_is_reported_but_priced() {
        let mut plan = hourly(1, dec!(10));
        plan.rate.active = false;
        let catalog = catalog_of(&[&plan]);
        let result = quote(&plan, &catalog, at(3, 8, 0), at(3, 9, 0));
        assert_eq!(result.amount, dec!(10));
        assert_eq!(result.issues[0].source, IssueSource::Rate);
    }

    #[test]
    fn breakdown_sums_with_windows_and_rules() {
        let mut plan = overnight_plan(None);
        plan.rules.push(multiplier(1, 1, dec!(1.5), (18, 19)));
        let extra = hourly(2, dec!(5));
        let catalog = catalog_of(&[&plan, &extra]);
        let result = quote(&plan, &catalog, at(3, 18, 0), at(4, 9, 0));
        assert_eq!(result.amount, dec!(47.5));
        assert_lines_sum(&result);
        assert!(result.amount >= Decimal::ZERO);
    }
}
