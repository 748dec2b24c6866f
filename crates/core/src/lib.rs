//! Parking tariff engine: pure fee computation over resolved rate plans.

mod calculator;
mod catalog;
mod error;
mod model;
mod money;
mod outcome;
mod rules;
mod thresholds;
mod timeline;
mod windows;

pub use calculator::{FeeOptions, compute_fee, compute_fee_with};
pub use catalog::TariffCatalog;
pub use error::{FeeError, ParseKindError};
pub use model::{
    Adjustment, PricingRule, PricingRuleInput, ProgressiveRange, Rate, RateInput, RatePlan,
    RateType, RateUnit, RuleConditions, RuleType, StayInterval, TariffSnapshot, Threshold,
    ThresholdInput, Ticket, TicketInput, TimeWindow, TimeWindowInput, WindowFamily, WindowType,
};
pub use money::{DEFAULT_MINOR_UNITS, round_money};
pub use outcome::{
    BreakdownLine, ConfigIssue, FeeResult, IssueSource, LineKind, RateSuggestion, WindowMatch,
};
