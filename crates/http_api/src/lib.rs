mod errors;
mod handlers;
mod middleware;
mod state;

use axum::{Router, middleware as axum_middleware, routing::post};

pub use state::HttpState;

pub fn router(state: HttpState) -> Router<()> {
    let api = Router::new()
        .route("/rates_list", post(handlers::rates_list))
        .route("/rates_get", post(handlers::rates_get))
        .route("/rates_upsert", post(handlers::rates_upsert))
        .route("/rates_delete", post(handlers::rates_delete))
        .route("/windows_replace", post(handlers::windows_replace))
        .route("/rules_replace", post(handlers::rules_replace))
        .route("/thresholds_replace", post(handlers::thresholds_replace))
        .route("/tariffs_export", post(handlers::tariffs_export))
        .route("/fees_quote", post(handlers::fees_quote))
        .route("/fees_preview", post(handlers::fees_preview))
        .route("/tickets_check_in", post(handlers::tickets_check_in))
        .route("/tickets_check_out", post(handlers::tickets_check_out))
        .route("/tickets_get", post(handlers::tickets_get))
        .route("/tickets_open", post(handlers::tickets_open))
        .route("/settings_get", post(handlers::settings_get))
        .route("/settings_put", post(handlers::settings_put))
        .route("/health", post(handlers::health));

    Router::new()
        .nest("/api", api)
        .fallback(handlers::not_found)
        .layer(axum_middleware::from_fn(middleware::log_requests))
        .with_state(state)
}
