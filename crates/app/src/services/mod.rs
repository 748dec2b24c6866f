mod fees;
mod rates;
mod settings;
mod tickets;

use std::sync::Arc;

use tariff_core::{FeeOptions, RatePlan};
use tariff_db::Db;
use tracing::warn;

use crate::app::AppConfig;
use crate::error::{AppError, Result};
use crate::tariffs;

pub use fees::{FeesService, PreviewSample};
pub use rates::RatesService;
pub use settings::{SettingsService, SettingsSnapshot};
pub use tickets::{CheckIn, TicketsService};

type SharedConfig = Arc<AppConfig>;

/// Service registry for app-level operations.
#[derive(Clone)]
pub struct AppServices {
    pub rates: RatesService,
    pub fees: FeesService,
    pub tickets: TicketsService,
    pub settings: SettingsService,
}

impl AppServices {
    pub fn new(config: &AppConfig) -> Self {
        let shared = Arc::new(config.clone());
        Self {
            rates: RatesService::new(shared.clone()),
            fees: FeesService::new(shared.clone()),
            tickets: TicketsService::new(shared.clone()),
            settings: SettingsService::new(shared),
        }
    }
}

fn open_db(config: &SharedConfig) -> Result<Db> {
    Ok(Db::open(&config.db_path)?)
}

fn require_plan(db: &Db, rate_id: i64) -> Result<RatePlan> {
    db.load_plan(rate_id)?.ok_or_else(|| missing_rate(rate_id))
}

fn missing_rate(rate_id: i64) -> AppError {
    AppError::NotFound(format!("rate {rate_id} not found"))
}

fn fee_options(db: &Db) -> Result<FeeOptions> {
    Ok(FeeOptions {
        minor_units: db.get_minor_units()?,
    })
}

/// Mirrors the tariff tables into the defaults file. Failures are logged and
/// never undo the change that triggered them.
fn sync_defaults(config: &SharedConfig, db: &Db) {
    let written = db
        .tariff_snapshot()
        .map_err(AppError::from)
        .and_then(|snapshot| {
            tariffs::write_tariff_defaults(&config.tariff_defaults_path, &snapshot)
        });
    if let Err(err) = written {
        warn!(error = %err, "failed to update tariff defaults");
    }
}
