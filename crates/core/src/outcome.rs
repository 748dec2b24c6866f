use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::WindowType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeResult {
    pub amount: Decimal,
    /// Rate the amount was charged under (the target when substituted).
    pub rate_id: i64,
    pub elapsed_minutes: i64,
    pub courtesy_applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<WindowMatch>,
    pub breakdown: Vec<BreakdownLine>,
    pub applied_rule_ids: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub substituted_rate_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<RateSuggestion>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<ConfigIssue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowMatch {
    /// Governing window; `None` when the flat or all-excess fallback applied.
    pub window_id: Option<i64>,
    pub window_type: Option<WindowType>,
    pub covered_amount: Decimal,
    pub covered_minutes: i64,
    pub excess_minutes: i64,
    pub excess_rate_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSuggestion {
    pub threshold_id: i64,
    pub target_rate_id: i64,
    pub target_amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Courtesy,
    Base,
    Covered,
    Excess,
    Adjustment,
    Cap,
    Rounding,
    Substitution,
}

/// One auditable step of a fee computation. Line amounts sum to the fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownLine {
    pub kind: LineKind,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<i64>,
    pub quantity: u32,
    pub amount: Decimal,
}

impl BreakdownLine {
    pub(crate) fn new(kind: LineKind, description: impl Into<String>, amount: Decimal) -> Self {
        Self {
            kind,
            description: description.into(),
            rate_id: None,
            window_id: None,
            rule_id: None,
            quantity: 0,
            amount,
        }
    }

    pub(crate) fn with_rate(mut self, rate_id: i64) -> Self {
        self.rate_id = Some(rate_id);
        self
    }

    pub(crate) fn with_window(mut self, window_id: Option<i64>) -> Self {
        self.window_id = window_id;
        self
    }

    pub(crate) fn with_rule(mut self, rule_id: i64) -> Self {
        self.rule_id = Some(rule_id);
        self
    }

    pub(crate) fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSource {
    Rate,
    Window,
    Rule,
    Threshold,
}

/// A configuration record that was skipped or degraded during a computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigIssue {
    pub source: IssueSource,
    pub id: i64,
    pub message: String,
}

pub(crate) fn report(
    issues: &mut Vec<ConfigIssue>,
    source: IssueSource,
    id: i64,
    message: impl Into<String>,
) {
    let message = message.into();
    warn!(source = ?source, id, "tariff configuration error: {message}");
    issues.push(ConfigIssue {
        source,
        id,
        message,
    });
}
