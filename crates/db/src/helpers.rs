use std::str::FromStr;

use rusqlite::Row;
use rusqlite::types::Type;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use tariff_core::{PricingRule, Rate, Threshold, Ticket, TimeWindow};

fn conversion_error(
    index: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))
}

fn parsed<T>(row: &Row<'_>, index: usize) -> std::result::Result<T, rusqlite::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text: String = row.get(index)?;
    text.parse::<T>().map_err(|err| conversion_error(index, err))
}

fn parsed_opt<T>(row: &Row<'_>, index: usize) -> std::result::Result<Option<T>, rusqlite::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text: Option<String> = row.get(index)?;
    text.map(|text| text.parse::<T>().map_err(|err| conversion_error(index, err)))
        .transpose()
}

fn json<T: DeserializeOwned>(row: &Row<'_>, index: usize) -> std::result::Result<T, rusqlite::Error> {
    let text: String = row.get(index)?;
    serde_json::from_str(&text).map_err(|err| conversion_error(index, err))
}

fn json_opt<T: DeserializeOwned>(
    row: &Row<'_>,
    index: usize,
) -> std::result::Result<Option<T>, rusqlite::Error> {
    let text: Option<String> = row.get(index)?;
    text.map(|text| serde_json::from_str(&text).map_err(|err| conversion_error(index, err)))
        .transpose()
}

pub(crate) fn decimal_text(value: Decimal) -> String {
    value.normalize().to_string()
}

pub(crate) fn row_to_rate(row: &Row<'_>) -> std::result::Result<Rate, rusqlite::Error> {
    Ok(Rate {
        id: row.get(0)?,
        name: row.get(1)?,
        vehicle_category: row.get(2)?,
        rate_type: parsed(row, 3)?,
        unit_price: parsed::<Decimal>(row, 4)?,
        unit: parsed(row, 5)?,
        courtesy_minutes: row.get(6)?,
        active: row.get(7)?,
        config: json(row, 8)?,
    })
}

pub(crate) fn row_to_window(row: &Row<'_>) -> std::result::Result<TimeWindow, rusqlite::Error> {
    Ok(TimeWindow {
        id: row.get(0)?,
        rate_id: row.get(1)?,
        window_type: parsed(row, 2)?,
        start_time: row.get(3)?,
        end_time: row.get(4)?,
        start_day: row.get(5)?,
        end_day: row.get(6)?,
        duration_limit_minutes: row.get(7)?,
        extra_rate_id: row.get(8)?,
        active: row.get(9)?,
        metadata: json(row, 10)?,
    })
}

pub(crate) fn row_to_rule(row: &Row<'_>) -> std::result::Result<PricingRule, rusqlite::Error> {
    Ok(PricingRule {
        id: row.get(0)?,
        rate_id: row.get(1)?,
        rule_type: parsed(row, 2)?,
        conditions: json(row, 3)?,
        adjustment: json(row, 4)?,
        priority: row.get(5)?,
        sequence: row.get(6)?,
        active: row.get(7)?,
        description: row.get(8)?,
    })
}

pub(crate) fn row_to_threshold(row: &Row<'_>) -> std::result::Result<Threshold, rusqlite::Error> {
    Ok(Threshold {
        id: row.get(0)?,
        source_rate_id: row.get(1)?,
        target_rate_id: row.get(2)?,
        amount: parsed::<Decimal>(row, 3)?,
        auto_apply: row.get(4)?,
    })
}

pub(crate) fn row_to_ticket(row: &Row<'_>) -> std::result::Result<Ticket, rusqlite::Error> {
    Ok(Ticket {
        id: row.get(0)?,
        plate: row.get(1)?,
        vehicle_category: row.get(2)?,
        rate_id: row.get(3)?,
        entry_at: row.get(4)?,
        exit_at: row.get(5)?,
        total_value: parsed_opt::<Decimal>(row, 6)?,
        fee: json_opt(row, 7)?,
    })
}
