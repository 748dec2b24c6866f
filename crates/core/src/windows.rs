use chrono::{Duration, NaiveTime};
use rust_decimal::Decimal;
use tracing::debug;

use crate::catalog::TariffCatalog;
use crate::model::{Rate, RatePlan, TimeWindow, WindowFamily};
use crate::outcome::{ConfigIssue, IssueSource, WindowMatch, report};
use crate::timeline::{
    Segment, SegmentKind, Span, chop, day_in_range, occurrences, total, uncovered, weekday_index,
};

/// Window match plus the priced segments it produced.
pub(crate) struct WindowPricing {
    pub matched: WindowMatch,
    pub segments: Vec<Segment>,
}

enum WindowShape {
    TimeOfDay {
        start: NaiveTime,
        end: NaiveTime,
    },
    Span {
        days: Option<(u8, u8)>,
        limit_minutes: i64,
    },
}

struct UsableWindow<'a> {
    window: &'a TimeWindow,
    shape: WindowShape,
}

fn shape(window: &TimeWindow) -> Result<WindowShape, String> {
    match window.window_type.family() {
        WindowFamily::TimeOfDay => match (window.start_time, window.end_time) {
            (Some(start), Some(end)) => Ok(WindowShape::TimeOfDay { start, end }),
            _ => Err(format!(
                "{} window needs both start and end time",
                window.window_type
            )),
        },
        WindowFamily::Span => {
            let limit = window
                .duration_limit_minutes
                .filter(|minutes| *minutes > 0)
                .ok_or_else(|| {
                    format!("{} window needs a positive duration limit", window.window_type)
                })?;
            let days = match (window.start_day, window.end_day) {
                (None, None) => None,
                (Some(start), Some(end)) if start <= 6 && end <= 6 => Some((start, end)),
                (Some(_), Some(_)) => return Err("days must be between 0 and 6".to_string()),
                _ => return Err("start and end day must be set together".to_string()),
            };
            Ok(WindowShape::Span {
                days,
                limit_minutes: i64::from(limit),
            })
        }
    }
}

fn usable_windows<'a>(
    plan: &'a RatePlan,
    family: WindowFamily,
    issues: &mut Vec<ConfigIssue>,
) -> Vec<UsableWindow<'a>> {
    let mut usable = Vec::new();
    for window in plan.windows.iter().filter(|window| window.active) {
        if window.rate_id != plan.rate.id {
            report(
                issues,
                IssueSource::Window,
                window.id,
                format!("window belongs to rate {}", window.rate_id),
            );
            continue;
        }
        if window.window_type.family() != family {
            report(
                issues,
                IssueSource::Window,
                window.id,
                format!(
                    "{} window does not apply to a {} rate",
                    window.window_type, plan.rate.rate_type
                ),
            );
            continue;
        }
        match shape(window) {
            Ok(shape) => usable.push(UsableWindow { window, shape }),
            Err(message) => report(issues, IssueSource::Window, window.id, message),
        }
    }
    usable
}

pub(crate) struct Matcher<'a> {
    pub stay: Span,
    pub elapsed_minutes: i64,
    pub rate: &'a Rate,
    pub category: &'a str,
    pub catalog: &'a TariffCatalog,
}

impl<'a> Matcher<'a> {
    /// Prices the stay through the rate's windows. `None` means the rate has
    /// no window semantics and is billed per unit instead.
    pub fn price(&self, plan: &'a RatePlan, issues: &mut Vec<ConfigIssue>) -> Option<WindowPricing> {
        let family = self.rate.rate_type.window_family()?;
        let usable = usable_windows(plan, family, issues);
        let Some(first) = usable.first() else {
            if !self.rate.rate_type.requires_window() {
                return None;
            }
            debug!(rate_id = self.rate.id, "no usable window; billing flat rate value");
            return Some(self.flat());
        };
        for candidate in &usable {
            let pricing = match candidate.shape {
                WindowShape::TimeOfDay { start, end } => {
                    self.time_of_day(candidate.window, start, end, issues)
                }
                WindowShape::Span {
                    days,
                    limit_minutes,
                } => self.duration_span(candidate.window, days, limit_minutes, issues),
            };
            if let Some(pricing) = pricing {
                debug!(
                    rate_id = self.rate.id,
                    window_id = candidate.window.id,
                    excess_minutes = pricing.matched.excess_minutes,
                    "window matched"
                );
                return Some(pricing);
            }
        }
        debug!(rate_id = self.rate.id, "no window applies; whole stay is excess");
        Some(self.finish(None, first.window, Vec::new(), vec![self.stay], issues))
    }

    fn flat(&self) -> WindowPricing {
        let segment = Segment {
            kind: SegmentKind::Covered { window_id: None },
            rate_id: self.rate.id,
            spans: vec![self.stay],
            amount: self.rate.unit_price,
        };
        WindowPricing {
            matched: WindowMatch {
                window_id: None,
                window_type: None,
                covered_amount: self.rate.unit_price,
                covered_minutes: self.elapsed_minutes,
                excess_minutes: 0,
                excess_rate_id: None,
            },
            segments: vec![segment],
        }
    }

    fn time_of_day(
        &self,
        window: &TimeWindow,
        start: NaiveTime,
        end: NaiveTime,
        issues: &mut Vec<ConfigIssue>,
    ) -> Option<WindowPricing> {
        let found = occurrences(&self.stay, start, end);
        if found.is_empty() {
            return None;
        }
        let covered: Vec<Span> = found
            .iter()
            .filter_map(|occurrence| occurrence.span.clip(&self.stay))
            .collect();
        let gaps = uncovered(&self.stay, &covered);
        let segments = covered
            .into_iter()
            .map(|span| self.covered_segment(window, span))
            .collect();
        Some(self.finish(Some(window), window, segments, gaps, issues))
    }

    fn duration_span(
        &self,
        window: &TimeWindow,
        days: Option<(u8, u8)>,
        limit_minutes: i64,
        issues: &mut Vec<ConfigIssue>,
    ) -> Option<WindowPricing> {
        if let Some((from, to)) = days
            && !day_in_range(weekday_index(self.stay.start.date()), from, to)
        {
            return None;
        }
        let limit_end = self.stay.start + Duration::minutes(limit_minutes);
        let covered = Span::new(self.stay.start, limit_end.min(self.stay.end));
        let gaps = if limit_end < self.stay.end {
            vec![Span::new(limit_end, self.stay.end)]
        } else {
            Vec::new()
        };
        let segments = vec![self.covered_segment(window, covered)];
        Some(self.finish(Some(window), window, segments, gaps, issues))
    }

    fn covered_segment(&self, window: &TimeWindow, span: Span) -> Segment {
        Segment {
            kind: SegmentKind::Covered {
                window_id: Some(window.id),
            },
            rate_id: self.rate.id,
            spans: vec![span],
            amount: self.rate.unit_price,
        }
    }

    fn finish(
        &self,
        governing: Option<&TimeWindow>,
        extra_source: &TimeWindow,
        covered: Vec<Segment>,
        gaps: Vec<Span>,
        issues: &mut Vec<ConfigIssue>,
    ) -> WindowPricing {
        let excess_seconds: i64 = gaps.iter().map(Span::seconds).sum();
        let excess_minutes = (excess_seconds + 59) / 60;
        let covered_amount = total(&covered);
        let mut segments = covered;
        let mut excess_rate_id = None;
        if !gaps.is_empty() {
            let (excess, rate_id) = self.excess(extra_source, &gaps, issues);
            segments.extend(excess);
            excess_rate_id = rate_id;
        }
        segments.sort_by_key(Segment::start);
        WindowPricing {
            matched: WindowMatch {
                window_id: governing.map(|window| window.id),
                window_type: governing.map(|window| window.window_type),
                covered_amount,
                covered_minutes: (self.elapsed_minutes - excess_minutes).max(0),
                excess_minutes,
                excess_rate_id,
            },
            segments,
        }
    }

    fn excess(
        &self,
        source: &TimeWindow,
        gaps: &[Span],
        issues: &mut Vec<ConfigIssue>,
    ) -> (Vec<Segment>, Option<i64>) {
        if let Some(extra) = self.extra_rate(source, issues) {
            let segments = chop(gaps, extra.unit.minutes() * 60)
                .into_iter()
                .map(|spans| Segment {
                    kind: SegmentKind::Excess,
                    rate_id: extra.id,
                    spans,
                    amount: extra.unit_price,
                })
                .collect();
            return (segments, Some(extra.id));
        }
        let per_hour =
            self.rate.unit_price * Decimal::from(60) / Decimal::from(self.rate.unit.minutes());
        let segments = chop(gaps, 3_600)
            .into_iter()
            .map(|spans| Segment {
                kind: SegmentKind::Excess,
                rate_id: self.rate.id,
                spans,
                amount: per_hour,
            })
            .collect();
        (segments, None)
    }

    fn extra_rate(&self, source: &TimeWindow, issues: &mut Vec<ConfigIssue>) -> Option<&'a Rate> {
        if let Some(id) = source.extra_rate_id {
            match self.catalog.rate(id) {
                Some(rate) => return Some(rate),
                None => report(
                    issues,
                    IssueSource::Window,
                    source.id,
                    format!("extra rate {id} not found; using the category hourly rate"),
                ),
            }
        }
        if let Some(rate) = self.catalog.hourly_rate_for(self.category) {
            return Some(rate);
        }
        report(
            issues,
            IssueSource::Rate,
            self.rate.id,
            format!(
                "no hourly rate for category `{}`; excess billed pro rata per hour",
                self.category
            ),
        );
        None
    }
}
