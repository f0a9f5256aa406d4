//! Store access for tickets.
//!
//! The live `tickets` table has drifted between schema versions, so inserts
//! and reference lookups try a fixed list of column shapes in order and
//! keep the first one the store accepts. Attempts never run concurrently.

use log::{info, warn};

use super::{NewTicket, TicketLookup, TicketsError};
use crate::tables::{Row, StoreError, TableQuery, TableStore};

pub const REFERENCE_COLUMNS: [&str; 3] = ["ticket_number", "ticket_id", "reference"];

pub const CREATE_FAILED: &str = "Failed to create ticket.";
pub const LOOKUP_FAILED: &str = "Failed to look up tickets.";
pub const NO_TICKETS_FOUND: &str = "No tickets found.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadVariant {
    /// Every known field under its snake_case column.
    Full,
    TitleAndDescription,
    /// Older schema naming the title column `subject`.
    SubjectAndDescription,
}

impl PayloadVariant {
    pub const ALL: [PayloadVariant; 3] = [
        PayloadVariant::Full,
        PayloadVariant::TitleAndDescription,
        PayloadVariant::SubjectAndDescription,
    ];

    /// Builds the insert payload; absent or empty values are left out.
    pub fn payload(self, ticket: &NewTicket) -> Row {
        let mut row = Row::new();
        match self {
            Self::Full => {
                put(&mut row, "title", Some(&ticket.title));
                put(&mut row, "description", Some(&ticket.description));
                put(&mut row, "category", ticket.category.as_deref());
                put(&mut row, "priority", ticket.priority.map(|p| p.as_str()));
                put(&mut row, "customer_name", ticket.customer_name.as_deref());
                put(&mut row, "customer_email", ticket.customer_email.as_deref());
                put(&mut row, "policy_number", ticket.policy_number.as_deref());
            }
            Self::TitleAndDescription => {
                put(&mut row, "title", Some(&ticket.title));
                put(&mut row, "description", Some(&ticket.description));
            }
            Self::SubjectAndDescription => {
                put(&mut row, "subject", Some(&ticket.title));
                put(&mut row, "description", Some(&ticket.description));
            }
        }
        row
    }
}

fn put(row: &mut Row, column: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        row.insert(column.to_string(), value.into());
    }
}

pub async fn insert_ticket(
    store: &dyn TableStore,
    table: &str,
    ticket: &NewTicket,
) -> Result<Row, TicketsError> {
    let mut last_error: Option<StoreError> = None;

    for variant in PayloadVariant::ALL {
        match store.insert(table, variant.payload(ticket)).await {
            Ok(row) => {
                if variant != PayloadVariant::Full {
                    info!("Ticket stored using fallback payload {:?}", variant);
                }
                return Ok(row);
            }
            Err(e) => {
                warn!("Ticket insert with {:?} payload rejected: {}", variant, e);
                last_error = Some(e);
            }
        }
    }

    Err(TicketsError::Store {
        message: CREATE_FAILED.to_string(),
        details: last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unable to create ticket.".to_string()),
    })
}

pub async fn find_tickets(
    store: &dyn TableStore,
    table: &str,
    lookup: &TicketLookup,
) -> Result<Vec<Row>, TicketsError> {
    let base = lookup.base_query();

    let Some(reference) = lookup.reference.as_deref() else {
        let rows = store.select(table, &base).await.map_err(|e| {
            warn!("Ticket lookup failed: {}", e);
            lookup_failed(e.to_string())
        })?;
        return found(rows);
    };

    let mut any_succeeded = false;
    let mut last_error: Option<StoreError> = None;

    for column in REFERENCE_COLUMNS {
        let query: TableQuery = base.clone().eq(column, reference);
        match store.select(table, &query).await {
            Ok(rows) if !rows.is_empty() => return Ok(rows),
            Ok(_) => any_succeeded = true,
            Err(e) => {
                warn!("Ticket lookup by {} failed: {}", column, e);
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) if !any_succeeded => Err(lookup_failed(e.to_string())),
        _ => Err(TicketsError::NotFound(NO_TICKETS_FOUND.to_string())),
    }
}

fn found(rows: Vec<Row>) -> Result<Vec<Row>, TicketsError> {
    if rows.is_empty() {
        Err(TicketsError::NotFound(NO_TICKETS_FOUND.to_string()))
    } else {
        Ok(rows)
    }
}

fn lookup_failed(details: String) -> TicketsError {
    TicketsError::Store {
        message: LOOKUP_FAILED.to_string(),
        details,
    }
}
