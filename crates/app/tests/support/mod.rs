#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use tariff_app::AppState;
use tariff_core::StayInterval;
use tempfile::TempDir;

pub struct TestApp {
    pub dir: TempDir,
    pub state: AppState,
}

/// Fresh app state seeded with the bundled tariffs.
pub fn setup_app() -> TestApp {
    let dir = tempfile::tempdir().expect("temp dir");
    let state = AppState::new(
        dir.path().join("tariff.sqlite"),
        dir.path().join("tariff-defaults.json"),
    );
    state.initialize().expect("initialize");
    TestApp { dir, state }
}

// 2025-03-03 is a Monday.
pub fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .expect("valid timestamp")
}

pub fn car_stay(entry: NaiveDateTime, exit: NaiveDateTime) -> StayInterval {
    StayInterval {
        entry,
        exit,
        vehicle_category: "car".to_string(),
    }
}
