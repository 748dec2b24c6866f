use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Span {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn seconds(&self) -> i64 {
        (self.end - self.start).num_seconds().max(0)
    }

    pub fn overlap_seconds(&self, other: &Span) -> i64 {
        self.clip(other).map(|span| span.seconds()).unwrap_or(0)
    }

    pub fn clip(&self, other: &Span) -> Option<Span> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (end > start).then(|| Span::new(start, end))
    }
}

/// Drops sub-second precision so span arithmetic stays in whole seconds.
pub(crate) fn whole_seconds(value: NaiveDateTime) -> NaiveDateTime {
    value.with_nanosecond(0).unwrap_or(value)
}

/// Started minutes between two instants; a partial minute counts as one.
pub(crate) fn elapsed_minutes(span: &Span) -> i64 {
    (span.seconds() + 59) / 60
}

/// Number of started units of `unit_minutes` needed to cover `seconds`.
pub(crate) fn started_units(seconds: i64, unit_minutes: i64) -> i64 {
    let unit = unit_minutes.max(1) * 60;
    (seconds.max(0) + unit - 1) / unit
}

pub(crate) fn weekday_index(day: NaiveDate) -> u8 {
    day.weekday().num_days_from_sunday() as u8
}

/// Inclusive day-of-week range test; `end < start` wraps through Saturday.
pub(crate) fn day_in_range(day: u8, start: u8, end: u8) -> bool {
    if start <= end {
        day >= start && day <= end
    } else {
        day >= start || day <= end
    }
}

/// A single run of a repeating time-of-day range, keyed by the day it starts.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Occurrence {
    pub day: NaiveDate,
    pub span: Span,
}

/// Every occurrence of `[start, end)` that overlaps `within`, in time order.
pub(crate) fn occurrences(within: &Span, start: NaiveTime, end: NaiveTime) -> Vec<Occurrence> {
    let mut found = Vec::new();
    let mut day = within.start.date() - Duration::days(1);
    let last = within.end.date();
    while day <= last {
        let occurrence_end = if end > start {
            day.and_time(end)
        } else {
            (day + Duration::days(1)).and_time(end)
        };
        let span = Span::new(day.and_time(start), occurrence_end);
        if span.overlap_seconds(within) > 0 {
            found.push(Occurrence { day, span });
        }
        day = day + Duration::days(1);
    }
    found
}

/// Parts of `within` not covered by `covered`, which must be sorted and disjoint.
pub(crate) fn uncovered(within: &Span, covered: &[Span]) -> Vec<Span> {
    let mut gaps = Vec::new();
    let mut cursor = within.start;
    for span in covered {
        let Some(clipped) = span.clip(within) else {
            continue;
        };
        if clipped.start > cursor {
            gaps.push(Span::new(cursor, clipped.start));
        }
        cursor = cursor.max(clipped.end);
    }
    if cursor < within.end {
        gaps.push(Span::new(cursor, within.end));
    }
    gaps
}

/// Splits consecutive spans into billing units of `unit_seconds`; the last
/// unit may be short and a unit may straddle a gap between spans.
pub(crate) fn chop(spans: &[Span], unit_seconds: i64) -> Vec<Vec<Span>> {
    let unit_seconds = unit_seconds.max(1);
    let mut chunks = Vec::new();
    let mut current: Vec<Span> = Vec::new();
    let mut room = unit_seconds;
    for span in spans {
        let mut cursor = span.start;
        while cursor < span.end {
            let take = (span.end - cursor).num_seconds().min(room);
            if take <= 0 {
                break;
            }
            let next = cursor + Duration::seconds(take);
            current.push(Span::new(cursor, next));
            room -= take;
            cursor = next;
            if room == 0 {
                chunks.push(std::mem::take(&mut current));
                room = unit_seconds;
            }
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Consecutive blocks of `block_seconds` starting at `within.start`.
pub(crate) fn blocks(within: &Span, block_seconds: i64) -> Vec<Span> {
    chop(std::slice::from_ref(within), block_seconds)
        .into_iter()
        .filter_map(|chunk| {
            let first = chunk.first()?;
            let last = chunk.last()?;
            Some(Span::new(first.start, last.end))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SegmentKind {
    Base,
    Covered { window_id: Option<i64> },
    Excess,
    Tier,
    Carried,
}

/// A priced piece of the stay. Rules rewrite amounts; spans never change.
#[derive(Debug, Clone)]
pub(crate) struct Segment {
    pub kind: SegmentKind,
    pub rate_id: i64,
    pub spans: Vec<Span>,
    pub amount: Decimal,
}

impl Segment {
    pub fn start(&self) -> Option<NaiveDateTime> {
        self.spans.first().map(|span| span.start)
    }

    pub fn seconds(&self) -> i64 {
        self.spans.iter().map(Span::seconds).sum()
    }

    pub fn overlap_seconds(&self, other: &Span) -> i64 {
        self.spans.iter().map(|span| span.overlap_seconds(other)).sum()
    }
}

pub(crate) fn prorate(amount: Decimal, part: i64, whole: i64) -> Decimal {
    if whole <= 0 || part <= 0 {
        return Decimal::ZERO;
    }
    if part >= whole {
        return amount;
    }
    amount * Decimal::from(part) / Decimal::from(whole)
}

/// Share of the segment amounts that falls inside `span`, split by time.
pub(crate) fn attributed(segments: &[Segment], span: &Span) -> Decimal {
    segments
        .iter()
        .map(|segment| {
            let total = segment.seconds();
            if total == 0 {
                let starts_inside = segment
                    .start()
                    .is_some_and(|start| start >= span.start && start < span.end);
                return if starts_inside {
                    segment.amount
                } else {
                    Decimal::ZERO
                };
            }
            prorate(segment.amount, segment.overlap_seconds(span), total)
        })
        .sum()
}

pub(crate) fn total(segments: &[Segment]) -> Decimal {
    segments.iter().map(|segment| segment.amount).sum()
}
