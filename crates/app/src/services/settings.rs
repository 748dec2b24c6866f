use serde::{Deserialize, Serialize};
use tariff_db::Db;

use crate::error::{AppError, Result};
use crate::services::{SharedConfig, open_db};

const MAX_MINOR_UNITS: u32 = 6;

/// User-configurable settings stored in the DB.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsSnapshot {
    pub currency: String,
    pub minor_units: u32,
}

#[derive(Clone)]
pub struct SettingsService {
    config: SharedConfig,
}

impl SettingsService {
    pub(super) fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    fn db(&self) -> Result<Db> {
        open_db(&self.config)
    }

    pub fn get(&self) -> Result<SettingsSnapshot> {
        let db = self.db()?;
        Ok(SettingsSnapshot {
            currency: db.get_currency()?,
            minor_units: db.get_minor_units()?,
        })
    }

    pub fn update(&self, currency: Option<&str>, minor_units: Option<u32>) -> Result<()> {
        let db = self.db()?;
        if let Some(currency) = currency {
            let currency = currency.trim();
            if currency.is_empty() {
                return Err(AppError::InvalidInput("currency is required".to_string()));
            }
            db.set_currency(&currency.to_uppercase())?;
        }
        if let Some(units) = minor_units {
            if units > MAX_MINOR_UNITS {
                return Err(AppError::InvalidInput(format!(
                    "minor units must be at most {MAX_MINOR_UNITS}"
                )));
            }
            db.set_minor_units(units)?;
        }
        Ok(())
    }
}
