//! Lookup service: resolve tickets from heterogeneous search keys.
//!
//! Every key is validated and normalized BEFORE any SQL runs; a malformed
//! key is a `Validation` error, while a well-formed key that matches
//! nothing is a successful empty list. Results resolve the referenced
//! customer's summary fields, never the full record, and order non-terminal
//! tickets before terminal ones, most recently received first.

use crate::error::TicketError;
use crate::model::{Priority, Status};
use crate::store::from_us;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params_from_iter};
use serde::Serialize;
use std::fmt::Write as _;
use std::str::FromStr;

/// Exactly one search criterion per query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchKey {
    /// Exact match; expected to return at most one ticket.
    TicketNumber(String),
    /// Normalized to digits-only; minimum 10 digits.
    Phone(String),
    /// Case-insensitive substring match against the customer's name.
    Name(String),
    /// Case-insensitive exact match, validated as a well-formed address.
    Email(String),
}

/// Pagination window for lookup and reporting queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct Page {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Summary fields of the referenced customer, resolved for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerSummary {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: Option<String>,
}

/// One lookup result row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketHit {
    pub ticket_id: String,
    pub ticket_number: String,
    pub status: Status,
    pub priority: Priority,
    pub device_type: String,
    pub brand: String,
    pub model: String,
    pub total_cost: i64,
    pub received_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub customer: CustomerSummary,
}

/// Read-only filter for reporting consumers: page through tickets by
/// status and received-date range. No mutation path exists through here.
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    pub status: Option<Status>,
    pub received_from: Option<DateTime<Utc>>,
    pub received_to: Option<DateTime<Utc>>,
    pub page: Page,
}

/// Non-terminal tickets sort before terminal ones; within each group,
/// most recently received first. Ticket id breaks remaining ties so
/// pagination is stable.
const ORDER_CLAUSE: &str = "ORDER BY CASE WHEN t.status IN ('delivered', 'cancelled') THEN 1 ELSE 0 END ASC, \
     t.received_at_us DESC, t.ticket_id ASC";

const SELECT_COLUMNS: &str = "t.ticket_id, t.ticket_number, t.status, t.priority, \
     t.device_type, t.brand, t.model, t.total_cost, \
     t.received_at_us, t.updated_at_us, \
     c.name, c.phone_digits, c.email, c.address";

/// Strip formatting from a phone number and require at least 10 digits.
///
/// # Errors
///
/// `Validation` when fewer than 10 digits remain.
pub fn normalize_phone(input: &str) -> Result<String, TicketError> {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < 10 {
        return Err(TicketError::Validation {
            detail: format!(
                "phone must contain at least 10 digits, got {}",
                digits.len()
            ),
        });
    }
    Ok(digits)
}

/// Check that an email is plausibly well-formed: one `@`, a non-empty
/// local part, and a dotted domain.
///
/// # Errors
///
/// `Validation` when the address is malformed.
pub fn validate_email(input: &str) -> Result<(), TicketError> {
    let trimmed = input.trim();
    let malformed = || TicketError::Validation {
        detail: format!("malformed email address '{trimmed}'"),
    };

    let (local, domain) = trimmed.split_once('@').ok_or_else(malformed)?;
    if local.is_empty()
        || domain.is_empty()
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || trimmed.chars().any(char::is_whitespace)
        || domain.contains('@')
    {
        return Err(malformed());
    }
    Ok(())
}

/// Resolve tickets for one search key.
///
/// # Errors
///
/// `Validation` when the key is malformed (checked before any query);
/// `Storage` for database failures. No match is `Ok(vec![])`, not an
/// error.
pub fn find_tickets(
    conn: &Connection,
    key: &SearchKey,
    page: Page,
) -> Result<Vec<TicketHit>, TicketError> {
    let (condition, value) = match key {
        SearchKey::TicketNumber(number) => {
            let number = number.trim();
            if number.is_empty() {
                return Err(TicketError::Validation {
                    detail: "ticket number must not be blank".to_string(),
                });
            }
            ("t.ticket_number = ?1".to_string(), number.to_string())
        }
        SearchKey::Phone(phone) => {
            let digits = normalize_phone(phone)?;
            ("c.phone_digits = ?1".to_string(), digits)
        }
        SearchKey::Name(name) => {
            let name = name.trim();
            if name.is_empty() {
                return Err(TicketError::Validation {
                    detail: "name must not be blank".to_string(),
                });
            }
            (
                "c.name LIKE '%' || ?1 || '%' ESCAPE '\\' COLLATE NOCASE".to_string(),
                escape_like(name),
            )
        }
        SearchKey::Email(email) => {
            validate_email(email)?;
            (
                "c.email = ?1 COLLATE NOCASE".to_string(),
                email.trim().to_string(),
            )
        }
    };

    let sql = format!(
        "SELECT {SELECT_COLUMNS}
         FROM tickets t
         INNER JOIN customers c ON c.customer_id = t.customer_id
         WHERE {condition} {ORDER_CLAUSE}{}",
        page_clause(page)
    );

    run_hit_query(conn, &sql, &[&value])
}

/// Page through tickets for reporting, filtered by status and received
/// date range.
///
/// # Errors
///
/// `Storage` for database failures.
pub fn list_tickets(
    conn: &Connection,
    filter: &TicketFilter,
) -> Result<Vec<TicketHit>, TicketError> {
    let mut conditions: Vec<String> = Vec::new();
    let mut values: Vec<String> = Vec::new();

    if let Some(status) = filter.status {
        values.push(status.to_string());
        conditions.push(format!("t.status = ?{}", values.len()));
    }
    if let Some(from) = filter.received_from {
        values.push(from.timestamp_micros().to_string());
        conditions.push(format!(
            "t.received_at_us >= CAST(?{} AS INTEGER)",
            values.len()
        ));
    }
    if let Some(to) = filter.received_to {
        values.push(to.timestamp_micros().to_string());
        conditions.push(format!(
            "t.received_at_us <= CAST(?{} AS INTEGER)",
            values.len()
        ));
    }

    let mut where_clause = String::new();
    if !conditions.is_empty() {
        let _ = write!(where_clause, "WHERE {} ", conditions.join(" AND "));
    }

    let sql = format!(
        "SELECT {SELECT_COLUMNS}
         FROM tickets t
         INNER JOIN customers c ON c.customer_id = t.customer_id
         {where_clause}{ORDER_CLAUSE}{}",
        page_clause(filter.page)
    );

    let params: Vec<&str> = values.iter().map(String::as_str).collect();
    run_hit_query(conn, &sql, &params)
}

fn page_clause(page: Page) -> String {
    match (page.limit, page.offset) {
        (Some(limit), Some(offset)) => format!(" LIMIT {limit} OFFSET {offset}"),
        (Some(limit), None) => format!(" LIMIT {limit}"),
        (None, Some(offset)) => format!(" LIMIT -1 OFFSET {offset}"),
        (None, None) => String::new(),
    }
}

fn run_hit_query(
    conn: &Connection,
    sql: &str,
    params: &[&str],
) -> Result<Vec<TicketHit>, TicketError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params_from_iter(params.iter()), row_to_hit)?;

    let mut hits = Vec::new();
    for row in rows {
        hits.push(row?);
    }
    Ok(hits)
}

fn row_to_hit(row: &rusqlite::Row<'_>) -> rusqlite::Result<TicketHit> {
    let status_text: String = row.get(2)?;
    let priority_text: String = row.get(3)?;

    Ok(TicketHit {
        ticket_id: row.get(0)?,
        ticket_number: row.get(1)?,
        status: Status::from_str(&status_text).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?,
        priority: Priority::from_str(&priority_text).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?,
        device_type: row.get(4)?,
        brand: row.get(5)?,
        model: row.get(6)?,
        total_cost: row.get(7)?,
        received_at: from_us(8, row.get(8)?)?,
        updated_at: from_us(9, row.get(9)?)?,
        customer: CustomerSummary {
            name: row.get(10)?,
            phone: row.get(11)?,
            email: row.get(12)?,
            address: row.get(13)?,
        },
    })
}

fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
