use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ParseKindError;
use crate::outcome::FeeResult;

fn default_true() -> bool {
    true
}

macro_rules! text_enum {
    ($name:ident, $label:literal, { $($variant:ident => $text:literal $(| $alias:literal)*),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseKindError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value.trim().to_ascii_lowercase().as_str() {
                    $($text $(| $alias)* => Ok(Self::$variant),)+
                    _ => Err(ParseKindError::new($label, value)),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateType {
    #[serde(alias = "fraction")]
    Hourly,
    Daily,
    Overnight,
    Weekly,
    Biweekly,
    Monthly,
}

text_enum!(RateType, "rate type", {
    Hourly => "hourly" | "fraction",
    Daily => "daily",
    Overnight => "overnight",
    Weekly => "weekly",
    Biweekly => "biweekly",
    Monthly => "monthly",
});

impl RateType {
    /// Window family consulted by the matcher, if this rate type has one.
    pub fn window_family(self) -> Option<WindowFamily> {
        match self {
            Self::Daily | Self::Overnight => Some(WindowFamily::TimeOfDay),
            Self::Weekly | Self::Biweekly => Some(WindowFamily::Span),
            Self::Hourly | Self::Monthly => None,
        }
    }

    /// Rate types that bill flat when no usable window is configured.
    pub fn requires_window(self) -> bool {
        matches!(self, Self::Overnight | Self::Weekly | Self::Biweekly)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateUnit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
}

text_enum!(RateUnit, "rate unit", {
    Minute => "minute",
    Hour => "hour",
    Day => "day",
    Week => "week",
    Month => "month",
});

impl RateUnit {
    /// Length of one billing unit. A month is billed as 30 days.
    pub fn minutes(self) -> i64 {
        match self {
            Self::Minute => 1,
            Self::Hour => 60,
            Self::Day => 1_440,
            Self::Week => 10_080,
            Self::Month => 43_200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub id: i64,
    pub name: String,
    pub vehicle_category: String,
    pub rate_type: RateType,
    pub unit_price: Decimal,
    pub unit: RateUnit,
    #[serde(default)]
    pub courtesy_minutes: u32,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub config: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateInput {
    pub name: String,
    pub vehicle_category: String,
    pub rate_type: RateType,
    pub unit_price: Decimal,
    pub unit: RateUnit,
    #[serde(default)]
    pub courtesy_minutes: u32,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub config: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowType {
    Daily,
    Overnight,
    Weekly,
    Biweekly,
}

text_enum!(WindowType, "window type", {
    Daily => "daily",
    Overnight => "overnight",
    Weekly => "weekly",
    Biweekly => "biweekly",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowFamily {
    /// Time-of-day ranges repeating every calendar day.
    TimeOfDay,
    /// Day-of-week ranges with a duration limit.
    Span,
}

impl WindowType {
    pub fn family(self) -> WindowFamily {
        match self {
            Self::Daily | Self::Overnight => WindowFamily::TimeOfDay,
            Self::Weekly | Self::Biweekly => WindowFamily::Span,
        }
    }
}

/// Time-of-day or day-of-week constraint attached to a rate.
///
/// `end_time` earlier than `start_time` encodes a window that crosses
/// midnight; equal times encode a full day. Days are numbered 0 (Sunday)
/// through 6 (Saturday) and wrap the same way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub id: i64,
    pub rate_id: i64,
    pub window_type: WindowType,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub start_day: Option<u8>,
    pub end_day: Option<u8>,
    pub duration_limit_minutes: Option<u32>,
    pub extra_rate_id: Option<i64>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeWindowInput {
    pub window_type: WindowType,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub start_day: Option<u8>,
    pub end_day: Option<u8>,
    pub duration_limit_minutes: Option<u32>,
    pub extra_rate_id: Option<i64>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    FirstHour,
    DailyMax,
    TimeRange,
    HourlyProgression,
}

text_enum!(RuleType, "rule type", {
    FirstHour => "first_hour",
    DailyMax => "daily_max",
    TimeRange => "time_range",
    HourlyProgression => "hourly_progression",
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConditions {
    pub hour_start: Option<u8>,
    pub hour_end: Option<u8>,
    #[serde(default)]
    pub days_of_week: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressiveRange {
    pub from: u32,
    pub to: Option<u32>,
    pub value: Decimal,
}

impl ProgressiveRange {
    pub fn contains(&self, hour: u32) -> bool {
        hour >= self.from && self.to.is_none_or(|to| hour < to)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Adjustment {
    Override { value: Decimal },
    Cap { value: Decimal },
    Multiplier { value: Decimal },
    Progressive { ranges: Vec<ProgressiveRange> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRule {
    pub id: i64,
    pub rate_id: i64,
    pub rule_type: RuleType,
    #[serde(default)]
    pub conditions: RuleConditions,
    pub adjustment: Adjustment,
    #[serde(default)]
    pub priority: i32,
    /// Creation order, used to break priority ties.
    #[serde(default)]
    pub sequence: i64,
    #[serde(default = "default_true")]
    pub active: bool,
    pub description: Option<String>,
}

impl PricingRule {
    pub fn order_key(&self) -> (i32, i64, i64) {
        (self.priority, self.sequence, self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingRuleInput {
    pub rule_type: RuleType,
    #[serde(default)]
    pub conditions: RuleConditions,
    pub adjustment: Adjustment,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_true")]
    pub active: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub id: i64,
    pub source_rate_id: i64,
    pub target_rate_id: i64,
    pub amount: Decimal,
    #[serde(default)]
    pub auto_apply: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdInput {
    pub target_rate_id: i64,
    pub amount: Decimal,
    #[serde(default)]
    pub auto_apply: bool,
}

/// Entry/exit pair being billed, in the lot's wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayInterval {
    pub entry: NaiveDateTime,
    pub exit: NaiveDateTime,
    pub vehicle_category: String,
}

/// A vehicle parked under a rate. Open until it has an exit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub plate: String,
    pub vehicle_category: String,
    pub rate_id: i64,
    pub entry_at: NaiveDateTime,
    pub exit_at: Option<NaiveDateTime>,
    pub total_value: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<FeeResult>,
}

impl Ticket {
    pub fn is_open(&self) -> bool {
        self.exit_at.is_none()
    }

    pub fn stay_until(&self, exit: NaiveDateTime) -> StayInterval {
        StayInterval {
            entry: self.entry_at,
            exit,
            vehicle_category: self.vehicle_category.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketInput {
    pub plate: String,
    pub vehicle_category: String,
    pub rate_id: i64,
    pub entry_at: NaiveDateTime,
}

/// A rate together with everything attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatePlan {
    pub rate: Rate,
    #[serde(default)]
    pub windows: Vec<TimeWindow>,
    #[serde(default)]
    pub rules: Vec<PricingRule>,
    #[serde(default)]
    pub thresholds: Vec<Threshold>,
}

impl RatePlan {
    pub fn new(rate: Rate) -> Self {
        Self {
            rate,
            windows: Vec::new(),
            rules: Vec::new(),
            thresholds: Vec::new(),
        }
    }
}

/// Flat, id-preserving export of every tariff record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TariffSnapshot {
    pub rates: Vec<Rate>,
    #[serde(default)]
    pub windows: Vec<TimeWindow>,
    #[serde(default)]
    pub rules: Vec<PricingRule>,
    #[serde(default)]
    pub thresholds: Vec<Threshold>,
}
