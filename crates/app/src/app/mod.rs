use std::path::{Path, PathBuf};

use tariff_core::TariffSnapshot;
use tariff_db::Db;
use tracing::info;

use crate::error::{AppError, Result};
use crate::services::AppServices;
use crate::tariffs;

/// Paths and files needed to run the tariff engine locally.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub tariff_defaults_path: PathBuf,
}

/// Application state shared by the frontends (HTTP server, CLI).
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub services: AppServices,
}

impl AppState {
    pub fn new(db_path: PathBuf, tariff_defaults_path: PathBuf) -> Self {
        let config = AppConfig {
            db_path,
            tariff_defaults_path,
        };
        let services = AppServices::new(&config);
        Self { config, services }
    }

    pub fn is_fresh_db(&self) -> bool {
        !self.config.db_path.exists()
    }

    pub fn setup_db(&self) -> Result<()> {
        setup_db(&self.config.db_path)
    }

    pub fn initialize(&self) -> Result<()> {
        let is_fresh_db = self.is_fresh_db();
        self.setup_db()
            .map_err(|err| AppError::Message(format!("initialize db: {}", err)))?;
        if is_fresh_db {
            self.apply_tariff_defaults()?;
        }
        self.sync_tariff_defaults()?;
        info!(db = %self.config.db_path.display(), fresh = is_fresh_db, "tariff store ready");
        Ok(())
    }

    pub fn open_db(&self) -> Result<Db> {
        Ok(Db::open(&self.config.db_path)?)
    }

    pub fn apply_tariff_defaults(&self) -> Result<()> {
        tariffs::apply_tariff_defaults(&self.config.db_path, &self.config.tariff_defaults_path)
    }

    pub fn sync_tariff_defaults(&self) -> Result<()> {
        tariffs::sync_tariff_defaults(&self.config.db_path, &self.config.tariff_defaults_path)
    }

    pub fn write_tariff_defaults(&self, snapshot: &TariffSnapshot) -> Result<()> {
        tariffs::write_tariff_defaults(&self.config.tariff_defaults_path, snapshot)
    }
}

pub fn setup_db(path: &Path) -> Result<()> {
    let mut db = Db::open(path)?;
    db.migrate()?;
    Ok(())
}
