use chrono::{Duration, NaiveTime};
use rust_decimal::Decimal;
use tracing::debug;

use crate::model::{Adjustment, PricingRule, ProgressiveRange, RuleType};
use crate::outcome::{BreakdownLine, ConfigIssue, IssueSource, LineKind, report};
use crate::timeline::{
    Segment, SegmentKind, Span, attributed, blocks, occurrences, prorate, started_units, total,
    weekday_index,
};

const DAY_SECONDS: i64 = 86_400;

/// A validated rule, ready to run against the priced segments.
enum Step<'a> {
    FirstHour(Decimal),
    TimeRange {
        multiplier: Decimal,
        start: NaiveTime,
        end: NaiveTime,
        days: &'a [u8],
    },
    Progression(&'a [ProgressiveRange]),
    Cap(Decimal),
}

fn adjustment_kind(adjustment: &Adjustment) -> &'static str {
    match adjustment {
        Adjustment::Override { .. } => "override",
        Adjustment::Cap { .. } => "cap",
        Adjustment::Multiplier { .. } => "multiplier",
        Adjustment::Progressive { .. } => "progressive",
    }
}

fn non_negative(value: Decimal, what: &str) -> Result<Decimal, String> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(format!("{what} {value} is negative"));
    }
    Ok(value)
}

fn hour_time(hour: u8) -> NaiveTime {
    NaiveTime::from_hms_opt(u32::from(hour % 24), 0, 0).unwrap_or_default()
}

fn compile(rule: &PricingRule) -> Result<Step<'_>, String> {
    match (rule.rule_type, &rule.adjustment) {
        (RuleType::FirstHour, Adjustment::Override { value }) => {
            non_negative(*value, "override").map(Step::FirstHour)
        }
        (RuleType::DailyMax, Adjustment::Cap { value }) => {
            non_negative(*value, "cap").map(Step::Cap)
        }
        (RuleType::TimeRange, Adjustment::Multiplier { value }) => {
            let multiplier = non_negative(*value, "multiplier")?;
            let conditions = &rule.conditions;
            let (Some(hour_start), Some(hour_end)) = (conditions.hour_start, conditions.hour_end)
            else {
                return Err("time_range needs hour_start and hour_end".to_string());
            };
            if hour_start > 23 || hour_end > 24 {
                return Err(format!("hours {hour_start}..{hour_end} are out of range"));
            }
            if hour_start == hour_end {
                return Err(format!("hours {hour_start}..{hour_end} are empty"));
            }
            if let Some(day) = conditions.days_of_week.iter().find(|day| **day > 6) {
                return Err(format!("day of week {day} is out of range"));
            }
            Ok(Step::TimeRange {
                multiplier,
                start: hour_time(hour_start),
                end: hour_time(hour_end),
                days: &conditions.days_of_week,
            })
        }
        (RuleType::HourlyProgression, Adjustment::Progressive { ranges }) => {
            if ranges.is_empty() {
                return Err("progressive adjustment has no ranges".to_string());
            }
            for range in ranges {
                if let Some(to) = range.to
                    && to <= range.from
                {
                    return Err(format!("range {}..{} is empty", range.from, to));
                }
                non_negative(range.value, "range value")?;
            }
            Ok(Step::Progression(ranges))
        }
        (rule_type, adjustment) => Err(format!(
            "{rule_type} rule cannot carry a {} adjustment",
            adjustment_kind(adjustment)
        )),
    }
}

fn describe(rule: &PricingRule) -> String {
    rule.description
        .clone()
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| rule.rule_type.to_string())
}

pub(crate) struct RuleOutcome {
    pub amount: Decimal,
    pub applied: Vec<i64>,
    pub lines: Vec<BreakdownLine>,
}

/// Runs the active rules of a rate over its priced segments.
///
/// Non-cap rules run in `(priority, sequence, id)` order and each one sees
/// the amounts left by the previous ones; `daily_max` caps run afterwards.
pub(crate) fn evaluate(
    stay: &Span,
    rate_id: i64,
    rules: &[PricingRule],
    mut segments: Vec<Segment>,
    issues: &mut Vec<ConfigIssue>,
) -> RuleOutcome {
    let mut ordered = Vec::new();
    for rule in rules.iter().filter(|rule| rule.active) {
        if rule.rate_id != rate_id {
            report(
                issues,
                IssueSource::Rule,
                rule.id,
                format!("rule belongs to rate {}", rule.rate_id),
            );
            continue;
        }
        match compile(rule) {
            Ok(step) => ordered.push((rule, step)),
            Err(message) => report(issues, IssueSource::Rule, rule.id, message),
        }
    }
    ordered.sort_by_key(|(rule, _)| rule.order_key());
    let (caps, steps): (Vec<_>, Vec<_>) = ordered
        .into_iter()
        .partition(|(_, step)| matches!(step, Step::Cap(_)));

    let mut applied = Vec::new();
    let mut lines = Vec::new();
    for (rule, step) in steps {
        let before = total(&segments);
        let took_effect = match step {
            Step::FirstHour(value) => first_hour(stay, &mut segments, value),
            Step::TimeRange {
                multiplier,
                start,
                end,
                days,
            } => time_range(&mut segments, multiplier, start, end, days),
            Step::Progression(ranges) => {
                segments = progression(stay, rate_id, &segments, ranges);
                !segments.is_empty()
            }
            Step::Cap(_) => false,
        };
        if !took_effect {
            continue;
        }
        let delta = total(&segments) - before;
        debug!(rule_id = rule.id, rule_type = %rule.rule_type, %delta, "rule applied");
        applied.push(rule.id);
        lines.push(BreakdownLine::new(LineKind::Adjustment, describe(rule), delta).with_rule(rule.id));
    }

    let mut amount = total(&segments);
    if !caps.is_empty() {
        let mut per_day: Vec<Decimal> = blocks(stay, DAY_SECONDS)
            .iter()
            .map(|block| attributed(&segments, block))
            .collect();
        for (rule, step) in caps {
            let Step::Cap(cap) = step else {
                continue;
            };
            let mut reduced = false;
            for value in per_day.iter_mut().filter(|value| **value > cap) {
                *value = cap;
                reduced = true;
            }
            if !reduced {
                continue;
            }
            let capped: Decimal = per_day.iter().sum();
            debug!(rule_id = rule.id, %cap, %capped, "daily cap applied");
            applied.push(rule.id);
            lines.push(
                BreakdownLine::new(LineKind::Cap, describe(rule), capped - amount)
                    .with_rule(rule.id)
                    .with_quantity(per_day.len() as u32),
            );
            amount = capped;
        }
    }

    RuleOutcome {
        amount,
        applied,
        lines,
    }
}

fn time_billed(segment: &Segment) -> bool {
    !matches!(segment.kind, SegmentKind::Covered { .. })
}

/// Replaces the price attributed to the first hour of the stay with a single
/// override value. Time-billed segments reaching past the first hour keep
/// their time share of the rest.
fn first_hour(stay: &Span, segments: &mut [Segment], value: Decimal) -> bool {
    let first = Span::new(stay.start, stay.start + Duration::minutes(60));
    let mut touched = false;
    for segment in segments
        .iter_mut()
        .filter(|segment| time_billed(segment))
        .filter(|segment| segment.start().is_some_and(|start| start < first.end))
    {
        let whole = segment.seconds();
        let rest = whole - segment.overlap_seconds(&first);
        let head = if touched { Decimal::ZERO } else { value };
        segment.amount = head + prorate(segment.amount, rest, whole);
        touched = true;
    }
    touched
}

fn time_range(
    segments: &mut [Segment],
    multiplier: Decimal,
    start: NaiveTime,
    end: NaiveTime,
    days: &[u8],
) -> bool {
    let factor = multiplier - Decimal::ONE;
    let mut touched = false;
    for segment in segments.iter_mut() {
        let whole = segment.seconds();
        let inside: i64 = segment
            .spans
            .iter()
            .map(|span| {
                occurrences(span, start, end)
                    .iter()
                    .filter(|occurrence| {
                        days.is_empty() || days.contains(&weekday_index(occurrence.day))
                    })
                    .map(|occurrence| occurrence.span.overlap_seconds(span))
                    .sum::<i64>()
            })
            .sum();
        if inside == 0 {
            continue;
        }
        segment.amount += prorate(segment.amount, inside, whole) * factor;
        touched = true;
    }
    touched
}

/// Re-prices the stay hour by hour. Overlapping ranges resolve to the last
/// one listed; hours outside every range keep what they were worth before.
fn progression(
    stay: &Span,
    rate_id: i64,
    segments: &[Segment],
    ranges: &[ProgressiveRange],
) -> Vec<Segment> {
    let hours = started_units(stay.seconds(), 60);
    (0..hours)
        .map(|hour| {
            let start = stay.start + Duration::hours(hour);
            let span = Span::new(start, (start + Duration::hours(1)).min(stay.end));
            let tier = u32::try_from(hour)
                .ok()
                .and_then(|hour| ranges.iter().rev().find(|range| range.contains(hour)));
            match tier {
                Some(range) => Segment {
                    kind: SegmentKind::Tier,
                    rate_id,
                    spans: vec![span],
                    amount: range.value,
                },
                None => Segment {
                    kind: SegmentKind::Carried,
                    rate_id,
                    spans: vec![span],
                    amount: attributed(segments, &span),
                },
            }
        })
        .collect()
}
