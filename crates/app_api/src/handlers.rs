use tariff_app::{CheckIn, PreviewSample, Result, StayParams, parse_timestamp, resolve_stay};
use tariff_core::{
    FeeResult, PricingRule, Rate, RatePlan, StayInterval, TariffSnapshot, Threshold, Ticket,
    TimeWindow,
};

use crate::{
    AppContext, CheckInRequest, CheckOutRequest, DeletedResponse, OkResponse, PreviewRequest,
    QuoteRequest, RateIdRequest, RateUpsertRequest, RulesReplaceRequest, SettingsPutRequest,
    SettingsResponse, StayRequest, ThresholdsReplaceRequest, TicketIdRequest,
    WindowsReplaceRequest,
};

fn resolve_request_stay(stay: StayRequest, default_category: &str) -> Result<StayInterval> {
    resolve_stay(
        &StayParams {
            entry: stay.entry,
            exit: stay.exit,
            vehicle_category: stay.vehicle_category,
        },
        default_category,
    )
}

pub fn rates_list(ctx: &AppContext) -> Result<Vec<Rate>> {
    ctx.app_state.services.rates.list()
}

pub fn rates_get(ctx: &AppContext, req: RateIdRequest) -> Result<RatePlan> {
    ctx.app_state.services.rates.plan(req.rate_id)
}

pub fn rates_upsert(ctx: &AppContext, req: RateUpsertRequest) -> Result<Rate> {
    ctx.app_state.services.rates.upsert(req.id, &req.rate)
}

pub fn rates_delete(ctx: &AppContext, req: RateIdRequest) -> Result<DeletedResponse> {
    ctx.app_state.services.rates.delete(req.rate_id)?;
    Ok(DeletedResponse {
        deleted: req.rate_id,
    })
}

pub fn windows_replace(ctx: &AppContext, req: WindowsReplaceRequest) -> Result<Vec<TimeWindow>> {
    ctx.app_state
        .services
        .rates
        .replace_windows(req.rate_id, &req.windows)
}

pub fn rules_replace(ctx: &AppContext, req: RulesReplaceRequest) -> Result<Vec<PricingRule>> {
    ctx.app_state
        .services
        .rates
        .replace_rules(req.rate_id, &req.rules)
}

pub fn thresholds_replace(
    ctx: &AppContext,
    req: ThresholdsReplaceRequest,
) -> Result<Vec<Threshold>> {
    ctx.app_state
        .services
        .rates
        .replace_thresholds(req.rate_id, &req.thresholds)
}

pub fn tariffs_export(ctx: &AppContext) -> Result<TariffSnapshot> {
    ctx.app_state.services.rates.snapshot()
}

pub fn fees_quote(ctx: &AppContext, req: QuoteRequest) -> Result<FeeResult> {
    let plan = ctx.app_state.services.rates.plan(req.rate_id)?;
    let stay = resolve_request_stay(req.stay, &plan.rate.vehicle_category)?;
    ctx.app_state.services.fees.quote(req.rate_id, &stay)
}

pub fn fees_preview(ctx: &AppContext, req: PreviewRequest) -> Result<Vec<PreviewSample>> {
    let plan = ctx.app_state.services.rates.plan(req.rate_id)?;
    let samples = req
        .samples
        .into_iter()
        .map(|stay| resolve_request_stay(stay, &plan.rate.vehicle_category))
        .collect::<Result<Vec<_>>>()?;
    ctx.app_state
        .services
        .fees
        .preview(req.rate_id, &req.rules, &samples)
}

pub fn tickets_check_in(ctx: &AppContext, req: CheckInRequest) -> Result<Ticket> {
    let entry_at = req.entry.as_deref().map(parse_timestamp).transpose()?;
    ctx.app_state.services.tickets.check_in(CheckIn {
        plate: req.plate,
        rate_id: req.rate_id,
        vehicle_category: req.vehicle_category,
        entry_at,
    })
}

pub fn tickets_check_out(ctx: &AppContext, req: CheckOutRequest) -> Result<Ticket> {
    let exit_at = req.exit.as_deref().map(parse_timestamp).transpose()?;
    ctx.app_state.services.tickets.check_out(req.id, exit_at)
}

pub fn tickets_get(ctx: &AppContext, req: TicketIdRequest) -> Result<Ticket> {
    ctx.app_state.services.tickets.get(req.id)
}

pub fn tickets_open(ctx: &AppContext) -> Result<Vec<Ticket>> {
    ctx.app_state.services.tickets.list_open()
}

pub fn settings_get(ctx: &AppContext) -> Result<SettingsResponse> {
    let snapshot = ctx.app_state.services.settings.get()?;
    Ok(SettingsResponse {
        currency: snapshot.currency,
        minor_units: snapshot.minor_units,
        db_path: ctx.app_state.config.db_path.to_string_lossy().to_string(),
        tariff_defaults_path: ctx
            .app_state
            .config
            .tariff_defaults_path
            .to_string_lossy()
            .to_string(),
        app_data_dir: ctx.app_data_dir.to_string_lossy().to_string(),
    })
}

pub fn settings_put(ctx: &AppContext, req: SettingsPutRequest) -> Result<SettingsResponse> {
    ctx.app_state
        .services
        .settings
        .update(req.currency.as_deref(), req.minor_units)?;
    settings_get(ctx)
}

pub fn ok() -> OkResponse {
    OkResponse { ok: true }
}
