pub mod error;
pub mod normalize;
pub mod service;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use crate::core::shared::state::AppState;
use crate::core::shared::utils::{is_valid_email, non_empty, non_empty_text, normalize_text};
use crate::core::urls::ApiUrls;
use crate::tables::TableQuery;

pub use error::TicketsError;
pub use normalize::{TicketSummary, TicketView};

pub const DEFAULT_TITLE: &str = "Insurance Complaint";
pub const DEFAULT_LOOKUP_LIMIT: usize = 10;
pub const MAX_LOOKUP_LIMIT: usize = 50;
pub const LOOKUP_FILTERS_REQUIRED: &str =
    "Provide at least one filter: reference, ticketId, email, or policyNumber.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl FromStr for Priority {
    type Err = TicketsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(TicketsError::validation(
                "Priority must be low, medium, high, or urgent.",
            )),
        }
    }
}

/// Raw create payload. Fields stay loosely typed so that a wrong JSON type
/// is treated like a missing value instead of failing the whole body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    pub title: Option<Value>,
    pub description: Option<Value>,
    pub category: Option<Value>,
    pub priority: Option<Value>,
    pub customer_name: Option<Value>,
    pub customer_email: Option<Value>,
    pub policy_number: Option<Value>,
}

/// A create payload that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub priority: Option<Priority>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub policy_number: Option<String>,
}

fn parse_priority(value: Option<&Value>) -> Result<Option<Priority>, TicketsError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => s.parse().map(Some),
        Some(_) => Err(TicketsError::validation(
            "Priority must be low, medium, high, or urgent.",
        )),
    }
}

impl TryFrom<CreateTicketRequest> for NewTicket {
    type Error = TicketsError;

    fn try_from(req: CreateTicketRequest) -> Result<Self, Self::Error> {
        let description = normalize_text(req.description.as_ref());
        if description.is_empty() {
            return Err(TicketsError::validation("Description is required."));
        }

        let customer_email = non_empty_text(req.customer_email.as_ref());
        if customer_email.as_deref().is_some_and(|e| !is_valid_email(e)) {
            return Err(TicketsError::validation("Customer email is invalid."));
        }

        let priority = parse_priority(req.priority.as_ref())?;

        Ok(Self {
            title: non_empty_text(req.title.as_ref()).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            description,
            category: non_empty_text(req.category.as_ref()),
            priority,
            customer_name: non_empty_text(req.customer_name.as_ref()),
            customer_email,
            policy_number: non_empty_text(req.policy_number.as_ref()),
        })
    }
}

impl NewTicket {
    pub fn from_json(body: &[u8]) -> Result<Self, TicketsError> {
        let request: CreateTicketRequest = serde_json::from_slice(body)
            .map_err(|_| TicketsError::validation("Invalid request payload."))?;
        Self::try_from(request)
    }
}

/// Validated lookup filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketLookup {
    pub reference: Option<String>,
    pub ticket_id: Option<String>,
    pub email: Option<String>,
    pub policy_number: Option<String>,
    pub limit: usize,
}

/// Limit from the query string: default when absent or not a number, clamped to `[1, 50]`.
pub fn parse_limit(raw: Option<&str>) -> usize {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|n| n.is_finite())
        .map(|n| (n.trunc() as i64).clamp(1, MAX_LOOKUP_LIMIT as i64) as usize)
        .unwrap_or(DEFAULT_LOOKUP_LIMIT)
}

impl TicketLookup {
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, TicketsError> {
        let get = |key: &str| non_empty(params.get(key).map(String::as_str));

        let lookup = Self {
            reference: get("reference"),
            ticket_id: get("ticketId"),
            email: get("email"),
            policy_number: get("policyNumber"),
            limit: parse_limit(params.get("limit").map(String::as_str)),
        };

        if lookup.reference.is_none()
            && lookup.ticket_id.is_none()
            && lookup.email.is_none()
            && lookup.policy_number.is_none()
        {
            return Err(TicketsError::validation(LOOKUP_FILTERS_REQUIRED));
        }

        if lookup.email.as_deref().is_some_and(|e| !is_valid_email(e)) {
            return Err(TicketsError::validation("Email is invalid."));
        }

        Ok(lookup)
    }

    /// Every filter except the reference, whose column is resolved by the service.
    pub fn base_query(&self) -> TableQuery {
        let mut query = TableQuery::new();
        if let Some(id) = &self.ticket_id {
            query = query.eq("id", id);
        }
        if let Some(email) = &self.email {
            query = query.eq("customer_email", email);
        }
        if let Some(policy_number) = &self.policy_number {
            query = query.eq("policy_number", policy_number);
        }
        query.order_desc("created_at").limit(self.limit)
    }
}

#[derive(Debug, Serialize)]
pub struct CreateTicketResponse {
    pub message: String,
    pub ticket: TicketSummary,
}

#[derive(Debug, Serialize)]
pub struct LookupResponse {
    pub count: usize,
    pub tickets: Vec<TicketView>,
}

pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<CreateTicketResponse>), TicketsError> {
    let ticket = NewTicket::from_json(&body).inspect_err(|e| warn!("Rejected ticket: {}", e))?;

    let row = service::insert_ticket(state.tables.as_ref(), state.tickets_table(), &ticket).await?;
    let summary = TicketSummary::from(&row);
    info!("Ticket created: {}", summary.reference);

    Ok((
        StatusCode::CREATED,
        Json(CreateTicketResponse {
            message: "Ticket created successfully.".to_string(),
            ticket: summary,
        }),
    ))
}

pub async fn lookup_tickets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<LookupResponse>, TicketsError> {
    let lookup = TicketLookup::from_params(&params)?;

    let rows = service::find_tickets(state.tables.as_ref(), state.tickets_table(), &lookup).await?;
    let tickets: Vec<TicketView> = rows.iter().map(TicketView::from).collect();

    Ok(Json(LookupResponse {
        count: tickets.len(),
        tickets,
    }))
}

pub fn configure_tickets_routes() -> Router<Arc<AppState>> {
    Router::new().route(ApiUrls::TICKETS, get(lookup_tickets).post(create_ticket))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_blank_description_rejected() {
        for body in [
            r#"{}"#,
            r#"{"description": ""}"#,
            r#"{"description": "   \n\t "}"#,
            r#"{"description": 12, "title": "x"}"#,
        ] {
            assert_eq!(
                NewTicket::from_json(body.as_bytes()),
                Err(TicketsError::validation("Description is required.")),
                "body {body}"
            );
        }
    }

    #[test]
    fn test_malformed_json_rejected() {
        for body in ["", "not json", "[1,2]", "null", r#"{"description": "x""#] {
            assert_eq!(
                NewTicket::from_json(body.as_bytes()),
                Err(TicketsError::validation("Invalid request payload.")),
                "body {body:?}"
            );
        }
    }

    #[test]
    fn test_priority_must_be_known() {
        for priority in [
            r#""critical""#,
            r#""High""#,
            r#"" high ""#,
            r#""   ""#,
            "5",
            "0",
            "true",
            "false",
        ] {
            let body = format!(r#"{{"description": "Claim denied", "priority": {priority}}}"#);
            assert_eq!(
                NewTicket::from_json(body.as_bytes()),
                Err(TicketsError::validation(
                    "Priority must be low, medium, high, or urgent."
                )),
                "priority {priority}"
            );
        }

        let ticket = NewTicket::from_json(br#"{"description": "x", "priority": "urgent"}"#)
            .expect("valid");
        assert_eq!(ticket.priority, Some(Priority::Urgent));

        let ticket = NewTicket::from_json(br#"{"description": "x", "priority": ""}"#).expect("valid");
        assert_eq!(ticket.priority, None);
    }

    #[test]
    fn test_customer_email_validated() {
        for email in ["jane", "jane@insurer", "jane@@insurer.co"] {
            let body = format!(r#"{{"description": "x", "customerEmail": "{email}"}}"#);
            assert_eq!(
                NewTicket::from_json(body.as_bytes()),
                Err(TicketsError::validation("Customer email is invalid.")),
                "email {email}"
            );
        }
    }

    #[test]
    fn test_defaults_and_trimming() {
        let ticket = NewTicket::from_json(
            br#"{"description": "  Claim denied unfairly ", "title": " ", "category": "",
                 "customerName": " Jane ", "customerEmail": " jane@insurer.co "}"#,
        )
        .expect("valid");

        assert_eq!(
            ticket,
            NewTicket {
                title: DEFAULT_TITLE.to_string(),
                description: "Claim denied unfairly".to_string(),
                category: None,
                priority: None,
                customer_name: Some("Jane".to_string()),
                customer_email: Some("jane@insurer.co".to_string()),
                policy_number: None,
            }
        );
    }

    #[test]
    fn test_limit_parsing() {
        assert_eq!(parse_limit(Some("0")), 1);
        assert_eq!(parse_limit(Some("-5")), 1);
        assert_eq!(parse_limit(Some("abc")), 10);
        assert_eq!(parse_limit(Some("500")), 50);
        assert_eq!(parse_limit(Some("25")), 25);
        assert_eq!(parse_limit(Some("7.9")), 7);
        assert_eq!(parse_limit(Some("")), 10);
        assert_eq!(parse_limit(None), 10);
    }

    #[test]
    fn test_lookup_requires_a_filter() {
        let err = TicketLookup::from_params(&params(&[("limit", "5"), ("email", "  ")]))
            .expect_err("no usable filter");
        assert_eq!(err, TicketsError::validation(LOOKUP_FILTERS_REQUIRED));
        for name in ["reference", "ticketId", "email", "policyNumber"] {
            assert!(LOOKUP_FILTERS_REQUIRED.contains(name));
        }
    }

    #[test]
    fn test_lookup_validates_email() {
        let err = TicketLookup::from_params(&params(&[("email", "jane.insurer.co")]))
            .expect_err("bad email");
        assert_eq!(err, TicketsError::validation("Email is invalid."));
    }

    #[test]
    fn test_base_query_applies_every_supplied_filter() {
        let lookup = TicketLookup::from_params(&params(&[
            ("reference", "TKT-1"),
            ("ticketId", "42"),
            ("email", "jane@insurer.co"),
            ("policyNumber", "POL-7"),
            ("limit", "3"),
        ]))
        .expect("valid");

        let query = lookup.base_query();
        assert_eq!(query.filter_value("id"), Some("42"));
        assert_eq!(query.filter_value("customer_email"), Some("jane@insurer.co"));
        assert_eq!(query.filter_value("policy_number"), Some("POL-7"));
        assert_eq!(query.filter_value("reference"), None);
        assert_eq!(query.limit, Some(3));
        assert_eq!(query.order.map(|o| (o.column, o.descending)), Some(("created_at".to_string(), true)));
    }
}
