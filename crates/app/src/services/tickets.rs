use chrono::NaiveDateTime;
use tariff_core::{Ticket, TicketInput, compute_fee_with};
use tariff_db::Db;
use tracing::info;

use crate::error::{AppError, Result};
use crate::services::{SharedConfig, fee_options, missing_rate, open_db};
use crate::util::time::now_local;

/// Check-in details. Category falls back to the rate's category and entry to
/// the current local time.
#[derive(Debug, Clone, Default)]
pub struct CheckIn {
    pub plate: String,
    pub rate_id: i64,
    pub vehicle_category: Option<String>,
    pub entry_at: Option<NaiveDateTime>,
}

#[derive(Clone)]
pub struct TicketsService {
    config: SharedConfig,
}

impl TicketsService {
    pub(super) fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    fn db(&self) -> Result<Db> {
        open_db(&self.config)
    }

    pub fn check_in(&self, request: CheckIn) -> Result<Ticket> {
        let plate = normalize_plate(&request.plate);
        if plate.is_empty() {
            return Err(AppError::InvalidInput("plate is required".to_string()));
        }
        let db = self.db()?;
        let rate = db
            .get_rate(request.rate_id)?
            .ok_or_else(|| missing_rate(request.rate_id))?;
        if !rate.active {
            return Err(AppError::InvalidInput(format!(
                "rate {} is inactive",
                rate.id
            )));
        }
        if let Some(open) = db.find_open_ticket(&plate)? {
            return Err(AppError::InvalidInput(format!(
                "plate {plate} already has open ticket {}",
                open.id
            )));
        }
        let vehicle_category = request
            .vehicle_category
            .map(|category| category.trim().to_string())
            .filter(|category| !category.is_empty())
            .unwrap_or(rate.vehicle_category);
        let ticket = db.open_ticket(&TicketInput {
            plate,
            vehicle_category,
            rate_id: rate.id,
            entry_at: request.entry_at.unwrap_or_else(now_local),
        })?;
        info!(ticket = ticket.id, plate = %ticket.plate, rate_id = ticket.rate_id, "checked in");
        Ok(ticket)
    }

    /// Closes an open ticket, pricing the stay under the ticket's rate.
    pub fn check_out(&self, id: i64, exit_at: Option<NaiveDateTime>) -> Result<Ticket> {
        let db = self.db()?;
        let ticket = db
            .get_ticket(id)?
            .ok_or_else(|| AppError::NotFound(format!("ticket {id} not found")))?;
        if !ticket.is_open() {
            return Err(AppError::InvalidInput(format!(
                "ticket {id} is already closed"
            )));
        }
        let catalog = db.load_catalog()?;
        let plan = catalog
            .plan(ticket.rate_id)
            .ok_or_else(|| missing_rate(ticket.rate_id))?;
        let exit_at = exit_at.unwrap_or_else(now_local);
        let stay = ticket.stay_until(exit_at);
        let fee = compute_fee_with(&stay, plan, &catalog, fee_options(&db)?)?;
        let closed = db.close_ticket(id, exit_at, &fee)?;
        info!(ticket = id, amount = %fee.amount, minutes = fee.elapsed_minutes, "checked out");
        Ok(closed)
    }

    pub fn get(&self, id: i64) -> Result<Ticket> {
        let db = self.db()?;
        db.get_ticket(id)?
            .ok_or_else(|| AppError::NotFound(format!("ticket {id} not found")))
    }

    pub fn list_open(&self) -> Result<Vec<Ticket>> {
        let db = self.db()?;
        Ok(db.list_open_tickets()?)
    }
}

fn normalize_plate(plate: &str) -> String {
    plate
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != '-')
        .flat_map(char::to_uppercase)
        .collect()
}
