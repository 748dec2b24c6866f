use serde::Deserialize;
use tariff_core::{PricingRuleInput, RateInput, ThresholdInput, TimeWindowInput};

#[derive(Debug, Deserialize, Default)]
pub struct EmptyRequest {}

#[derive(Debug, Deserialize)]
pub struct RateIdRequest {
    pub rate_id: i64,
}

/// Creates a rate when `id` is absent, updates it otherwise.
#[derive(Debug, Deserialize)]
pub struct RateUpsertRequest {
    pub id: Option<i64>,
    #[serde(flatten)]
    pub rate: RateInput,
}

#[derive(Debug, Deserialize)]
pub struct WindowsReplaceRequest {
    pub rate_id: i64,
    pub windows: Vec<TimeWindowInput>,
}

#[derive(Debug, Deserialize)]
pub struct RulesReplaceRequest {
    pub rate_id: i64,
    pub rules: Vec<PricingRuleInput>,
}

#[derive(Debug, Deserialize)]
pub struct ThresholdsReplaceRequest {
    pub rate_id: i64,
    pub thresholds: Vec<ThresholdInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StayRequest {
    pub entry: String,
    pub exit: String,
    pub vehicle_category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub rate_id: i64,
    #[serde(flatten)]
    pub stay: StayRequest,
}

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub rate_id: i64,
    pub rules: Vec<PricingRuleInput>,
    pub samples: Vec<StayRequest>,
}

#[derive(Debug, Deserialize)]
pub struct CheckInRequest {
    pub plate: String,
    pub rate_id: i64,
    pub vehicle_category: Option<String>,
    pub entry: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckOutRequest {
    pub id: i64,
    pub exit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TicketIdRequest {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct SettingsPutRequest {
    pub currency: Option<String>,
    pub minor_units: Option<u32>,
}
