pub mod app;
pub mod config;
pub mod error;
pub mod services;
pub mod startup;
pub mod tariffs;
pub mod util;

pub use app::{AppConfig, AppState};
pub use config::StayParams;
pub use error::{ApiError, AppError, Result};
pub use services::{AppServices, CheckIn, PreviewSample, SettingsSnapshot};
pub use startup::{AppPaths, ensure_app_data_dir};
pub use tariffs::{
    apply_tariff_defaults, load_initial_tariffs, load_tariff_defaults, sync_tariff_defaults,
    write_tariff_defaults,
};
pub use util::time::{now_local, parse_timestamp, resolve_stay};
