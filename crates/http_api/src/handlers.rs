use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};

use app_api::{
    CheckInRequest, CheckOutRequest, EmptyRequest, PreviewRequest, QuoteRequest, RateIdRequest,
    RateUpsertRequest, RulesReplaceRequest, SettingsPutRequest, ThresholdsReplaceRequest,
    TicketIdRequest, WindowsReplaceRequest,
};

use crate::{errors::HttpError, state::HttpState};

pub async fn rates_list(
    State(state): State<HttpState>,
    Json(_): Json<EmptyRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = app_api::rates_list(&state.context)?;
    Ok(Json(response))
}

pub async fn rates_get(
    State(state): State<HttpState>,
    Json(req): Json<RateIdRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = app_api::rates_get(&state.context, req)?;
    Ok(Json(response))
}

pub async fn rates_upsert(
    State(state): State<HttpState>,
    Json(req): Json<RateUpsertRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = app_api::rates_upsert(&state.context, req)?;
    Ok(Json(response))
}

pub async fn rates_delete(
    State(state): State<HttpState>,
    Json(req): Json<RateIdRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = app_api::rates_delete(&state.context, req)?;
    Ok(Json(response))
}

pub async fn windows_replace(
    State(state): State<HttpState>,
    Json(req): Json<WindowsReplaceRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = app_api::windows_replace(&state.context, req)?;
    Ok(Json(response))
}

pub async fn rules_replace(
    State(state): State<HttpState>,
    Json(req): Json<RulesReplaceRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = app_api::rules_replace(&state.context, req)?;
    Ok(Json(response))
}

pub async fn thresholds_replace(
    State(state): State<HttpState>,
    Json(req): Json<ThresholdsReplaceRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = app_api::thresholds_replace(&state.context, req)?;
    Ok(Json(response))
}

pub async fn tariffs_export(
    State(state): State<HttpState>,
    Json(_): Json<EmptyRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = app_api::tariffs_export(&state.context)?;
    Ok(Json(response))
}

pub async fn fees_quote(
    State(state): State<HttpState>,
    Json(req): Json<QuoteRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = app_api::fees_quote(&state.context, req)?;
    Ok(Json(response))
}

pub async fn fees_preview(
    State(state): State<HttpState>,
    Json(req): Json<PreviewRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = app_api::fees_preview(&state.context, req)?;
    Ok(Json(response))
}

pub async fn tickets_check_in(
    State(state): State<HttpState>,
    Json(req): Json<CheckInRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = app_api::tickets_check_in(&state.context, req)?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn tickets_check_out(
    State(state): State<HttpState>,
    Json(req): Json<CheckOutRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = app_api::tickets_check_out(&state.context, req)?;
    Ok(Json(response))
}

pub async fn tickets_get(
    State(state): State<HttpState>,
    Json(req): Json<TicketIdRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = app_api::tickets_get(&state.context, req)?;
    Ok(Json(response))
}

pub async fn tickets_open(
    State(state): State<HttpState>,
    Json(_): Json<EmptyRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = app_api::tickets_open(&state.context)?;
    Ok(Json(response))
}

pub async fn settings_get(
    State(state): State<HttpState>,
    Json(_): Json<EmptyRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = app_api::settings_get(&state.context)?;
    Ok(Json(response))
}

pub async fn settings_put(
    State(state): State<HttpState>,
    Json(req): Json<SettingsPutRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = app_api::settings_put(&state.context, req)?;
    Ok(Json(response))
}

pub async fn health() -> impl IntoResponse {
    Json(app_api::ok())
}

pub async fn not_found() -> HttpError {
    HttpError::new(
        StatusCode::NOT_FOUND,
        "no such endpoint",
        Some("not_found".to_string()),
    )
}
