#![allow(dead_code)]

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use tariff_core::{RateInput, RateType, RateUnit, TimeWindowInput, WindowType};
use tariff_db::Db;
use tempfile::TempDir;

pub struct TestDb {
    pub _dir: TempDir,
    pub db: Db,
    pub path: PathBuf,
}

pub fn setup_db() -> TestDb {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("test.sqlite");
    let mut db = Db::open(&path).expect("open db");
    db.migrate().expect("migrate db");
    TestDb {
        _dir: dir,
        db,
        path,
    }
}

pub fn rate_input(name: &str, rate_type: RateType, unit_price: Decimal, unit: RateUnit) -> RateInput {
    RateInput {
        name: name.to_string(),
        vehicle_category: "car".to_string(),
        rate_type,
        unit_price,
        unit,
        courtesy_minutes: 0,
        active: true,
        config: Default::default(),
    }
}

pub fn overnight_window(extra_rate_id: Option<i64>) -> TimeWindowInput {
    TimeWindowInput {
        window_type: WindowType::Overnight,
        start_time: chrono::NaiveTime::from_hms_opt(20, 0, 0),
        end_time: chrono::NaiveTime::from_hms_opt(8, 0, 0),
        start_day: None,
        end_day: None,
        duration_limit_minutes: None,
        extra_rate_id,
        active: true,
        metadata: Default::default(),
    }
}

pub fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .expect("valid timestamp")
}
