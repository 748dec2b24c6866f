use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use tariff_core::TariffSnapshot;
use tariff_db::Db;
use tracing::info;

use crate::error::{AppError, Result};

/// Seeds the tariff tables from the defaults file, or from the bundled
/// tariffs when no defaults file exists yet.
pub fn apply_tariff_defaults(db_path: &Path, defaults_path: &Path) -> Result<()> {
    let snapshot = if defaults_path.exists() {
        load_tariff_defaults(defaults_path)?
    } else {
        load_initial_tariffs()?
    };
    let mut db = Db::open(db_path)?;
    let rates = db.replace_tariffs(&snapshot)?;
    info!(rates, path = %defaults_path.display(), "applied tariff defaults");
    Ok(())
}

/// Rewrites the defaults file from the database.
pub fn sync_tariff_defaults(db_path: &Path, defaults_path: &Path) -> Result<()> {
    let db = Db::open(db_path)?;
    let snapshot = db.tariff_snapshot()?;
    if snapshot.rates.is_empty() && !defaults_path.exists() {
        return Ok(());
    }
    write_tariff_defaults(defaults_path, &snapshot)
}

pub fn load_tariff_defaults(path: &Path) -> Result<TariffSnapshot> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(AppError::from)
}

pub fn load_initial_tariffs() -> Result<TariffSnapshot> {
    let data = include_str!("../initial-tariffs.json");
    serde_json::from_str(data).map_err(AppError::from)
}

pub fn write_tariff_defaults(path: &Path, snapshot: &TariffSnapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, snapshot).map_err(AppError::from)
}
