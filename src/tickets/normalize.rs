//! Client-facing ticket shapes built from loosely-typed store rows.
//!
//! Each output field takes the first non-null value among its column aliases.

use serde::Serialize;
use serde_json::Value;

use crate::tables::Row;

pub const REFERENCE_ALIASES: [&str; 4] = ["ticket_number", "ticket_id", "reference", "id"];
const TITLE_ALIASES: [&str; 2] = ["title", "subject"];
const CUSTOMER_NAME_ALIASES: [&str; 2] = ["customer_name", "customerName"];
const CUSTOMER_EMAIL_ALIASES: [&str; 3] = ["customer_email", "email", "customerEmail"];
const POLICY_NUMBER_ALIASES: [&str; 2] = ["policy_number", "policyNumber"];
const CREATED_AT_ALIASES: [&str; 2] = ["created_at", "createdAt"];
const UPDATED_AT_ALIASES: [&str; 2] = ["updated_at", "updatedAt"];

pub fn first_of(row: &Row, aliases: &[&str]) -> Value {
    aliases
        .iter()
        .filter_map(|alias| row.get(*alias))
        .find(|value| !value.is_null())
        .cloned()
        .unwrap_or(Value::Null)
}

pub fn field(row: &Row, column: &str) -> Value {
    first_of(row, &[column])
}

pub fn reference_of(row: &Row) -> Value {
    first_of(row, &REFERENCE_ALIASES)
}

/// Shape returned after a ticket is created.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketSummary {
    pub id: Value,
    pub reference: Value,
    pub status: Value,
    pub priority: Value,
    pub created_at: Value,
}

/// Shape returned by lookups: the summary plus descriptive fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketView {
    pub id: Value,
    pub reference: Value,
    pub title: Value,
    pub description: Value,
    pub category: Value,
    pub status: Value,
    pub priority: Value,
    pub customer_name: Value,
    pub customer_email: Value,
    pub policy_number: Value,
    pub created_at: Value,
    pub updated_at: Value,
}

impl From<&Row> for TicketSummary {
    fn from(row: &Row) -> Self {
        Self {
            id: field(row, "id"),
            reference: reference_of(row),
            status: field(row, "status"),
            priority: field(row, "priority"),
            created_at: first_of(row, &CREATED_AT_ALIASES),
        }
    }
}

impl From<&Row> for TicketView {
    fn from(row: &Row) -> Self {
        Self {
            id: field(row, "id"),
            reference: reference_of(row),
            title: first_of(row, &TITLE_ALIASES),
            description: field(row, "description"),
            category: field(row, "category"),
            status: field(row, "status"),
            priority: field(row, "priority"),
            customer_name: first_of(row, &CUSTOMER_NAME_ALIASES),
            customer_email: first_of(row, &CUSTOMER_EMAIL_ALIASES),
            policy_number: first_of(row, &POLICY_NUMBER_ALIASES),
            created_at: first_of(row, &CREATED_AT_ALIASES),
            updated_at: first_of(row, &UPDATED_AT_ALIASES),
        }
    }
}
