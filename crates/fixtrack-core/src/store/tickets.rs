//! Ticket operations: intake, cost updates, status transitions, the
//! communication log, and completion.
//!
//! Mutations follow one discipline: load the current row, compute the
//! effect in memory, then write conditionally on `version` being unchanged.
//! A write that matches zero rows is a [`TicketError::ConcurrencyConflict`]
//! and the whole read-compute-write cycle retries, up to
//! [`OCC_RETRY_ATTEMPTS`] times. The row update and any ledger or
//! communication append commit in the same transaction.

use crate::config::TicketConfig;
use crate::error::TicketError;
use crate::ident;
use crate::ledger::{self, CostDelta};
use crate::model::{Channels, Costs, Device, PriceEntry, Priority, Status, Ticket, Transition};
use crate::notify::{DeliveryOutcome, NotificationRequest, Notifier, TemplateContext};
use crate::store::{customers, from_us, to_us};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Transaction, params, types::Type};
use serde::Serialize;
use std::str::FromStr;

/// Bounded retries for optimistic-concurrency conflicts.
pub const OCC_RETRY_ATTEMPTS: u32 = 3;

/// Input for ticket intake.
#[derive(Debug, Clone, Default)]
pub struct NewTicket {
    pub customer_id: String,
    pub device: Device,
    pub issue_description: String,
    pub priority: Priority,
    pub repair_cost: i64,
    pub parts_cost: i64,
    pub labor_cost: i64,
    pub technician: Option<String>,
    pub notes: Option<String>,
    pub estimated_completion: Option<DateTime<Utc>>,
    pub warranty_days: Option<u32>,
}

/// Partial edit of the staff-facing descriptive fields. Absent fields
/// retain their prior value.
#[derive(Debug, Clone, Default)]
pub struct DetailsUpdate {
    pub device: Option<Device>,
    pub issue_description: Option<String>,
    pub diagnosis: Option<String>,
    pub technician: Option<String>,
    pub notes: Option<String>,
}

impl DetailsUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.device.is_none()
            && self.issue_description.is_none()
            && self.diagnosis.is_none()
            && self.technician.is_none()
            && self.notes.is_none()
    }
}

/// Result of [`complete`]: the delivered ticket plus the best-effort
/// notification outcome. Delivery failure never rolls back the status
/// change.
#[derive(Debug, Serialize)]
pub struct CompletionOutcome {
    pub ticket: Ticket,
    pub request: NotificationRequest,
    pub delivery: DeliveryOutcome,
}

/// Create a ticket in `received` status with an empty price history.
///
/// Ticket numbers are minted locally and validated against the store's
/// UNIQUE constraint; a collision mints a fresh candidate, bounded by
/// `config.create_retry_attempts`.
///
/// # Errors
///
/// `InvalidCost` for negative initial components, `Validation` for an
/// unknown customer, `DuplicateTicket` when every minting attempt
/// collided, `Storage` otherwise.
pub fn create_ticket(
    conn: &Connection,
    config: &TicketConfig,
    new: &NewTicket,
    now: DateTime<Utc>,
) -> Result<Ticket, TicketError> {
    let costs = Costs::new(new.repair_cost, new.parts_cost, new.labor_cost)?;
    let attempts = config.create_retry_attempts.max(1);
    let mut last_candidate = String::new();

    for attempt in 0..attempts {
        let ticket_id = ident::mint_ticket_id();
        let ticket_number = ident::mint_ticket_number(&config.number_prefix);
        last_candidate.clone_from(&ticket_number);

        let result = conn.execute(
            "INSERT INTO tickets (
                ticket_id, ticket_number, customer_id,
                device_type, brand, model,
                issue_description, technician, notes,
                status, priority,
                repair_cost, parts_cost, labor_cost, total_cost,
                estimated_completion_us, warranty_days,
                received_at_us, updated_at_us, version
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?18, 0)",
            params![
                ticket_id,
                ticket_number,
                new.customer_id,
                new.device.device_type,
                new.device.brand,
                new.device.model,
                new.issue_description,
                new.technician,
                new.notes,
                Status::Received.to_string(),
                new.priority.to_string(),
                costs.repair_cost,
                costs.parts_cost,
                costs.labor_cost,
                costs.total_cost,
                new.estimated_completion.map(to_us),
                new.warranty_days,
                to_us(now),
            ],
        );

        match result {
            Ok(_) => {
                tracing::info!(ticket = %ticket_number, "created ticket");
                return require_ticket(conn, &ticket_id);
            }
            Err(err) if is_unique_violation(&err) => {
                tracing::warn!(
                    ticket = %ticket_number,
                    attempt,
                    "ticket identifier collided; minting a fresh candidate"
                );
            }
            Err(err) if is_foreign_key_violation(&err) => {
                return Err(TicketError::Validation {
                    detail: format!("unknown customer '{}'", new.customer_id),
                });
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(TicketError::DuplicateTicket {
        ticket_number: last_candidate,
    })
}

/// Fetch a ticket (with its full history) by opaque id.
///
/// # Errors
///
/// `Storage` for database failures.
pub fn get_ticket(conn: &Connection, ticket_id: &str) -> Result<Option<Ticket>, TicketError> {
    load_ticket(conn, "ticket_id", ticket_id)
}

/// Fetch a ticket by its human-facing number; callers of this function
/// expect exactly one result.
///
/// # Errors
///
/// `NotFound` when no ticket carries the number; `Storage` for database
/// failures.
pub fn get_by_ticket_number(conn: &Connection, number: &str) -> Result<Ticket, TicketError> {
    load_ticket(conn, "ticket_number", number)?.ok_or_else(|| TicketError::NotFound {
        key: number.to_string(),
    })
}

/// Apply a partial cost edit through the ledger, with OCC retry.
///
/// # Errors
///
/// `InvalidCost`, `TerminalState`, `NotFound`, `ConcurrencyConflict` (after
/// retries), or `Storage`.
pub fn update_costs(
    conn: &mut Connection,
    ticket_id: &str,
    delta: &CostDelta,
    actor: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Ticket, TicketError> {
    let mut attempt = 0;
    loop {
        let snapshot = require_ticket(conn, ticket_id)?;
        match try_update_costs(conn, &snapshot, delta, actor, now) {
            Err(err @ TicketError::ConcurrencyConflict { .. }) => {
                attempt += 1;
                if attempt >= OCC_RETRY_ATTEMPTS {
                    return Err(err);
                }
                tracing::debug!(ticket = ticket_id, attempt, "cost update conflicted; retrying");
            }
            other => return other,
        }
    }
}

/// Single attempt at a cost edit against a caller-held snapshot.
///
/// Exposed so callers that already hold a [`Ticket`] can detect a
/// concurrent modification themselves instead of having the store retry.
///
/// # Errors
///
/// `ConcurrencyConflict` when the stored version no longer matches the
/// snapshot; the validation and business-rule errors of [`update_costs`]
/// otherwise.
pub fn try_update_costs(
    conn: &mut Connection,
    snapshot: &Ticket,
    delta: &CostDelta,
    actor: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Ticket, TicketError> {
    if snapshot.status.is_terminal() {
        return Err(TicketError::TerminalState {
            status: snapshot.status,
        });
    }

    let (costs, entry) = ledger::apply_cost_update(
        &snapshot.costs,
        snapshot.last_recorded_total(),
        delta,
        actor,
        now,
    )?;

    let tx = conn.transaction()?;
    let changed = tx.execute(
        "UPDATE tickets
         SET repair_cost = ?1, parts_cost = ?2, labor_cost = ?3, total_cost = ?4,
             updated_at_us = ?5, version = version + 1
         WHERE ticket_id = ?6 AND version = ?7",
        params![
            costs.repair_cost,
            costs.parts_cost,
            costs.labor_cost,
            costs.total_cost,
            to_us(now),
            snapshot.id,
            snapshot.version,
        ],
    )?;

    if changed == 0 {
        return Err(TicketError::ConcurrencyConflict {
            ticket_id: snapshot.id.clone(),
        });
    }

    if let Some(entry) = &entry {
        append_price_entry(&tx, &snapshot.id, entry)?;
    }
    tx.commit()?;

    require_ticket(conn, &snapshot.id)
}

/// Edit the descriptive fields (device, issue, diagnosis, technician,
/// notes), with OCC retry. Like cost and status, these freeze once the
/// ticket is terminal.
///
/// # Errors
///
/// `TerminalState`, `NotFound`, `ConcurrencyConflict` (after retries), or
/// `Storage`.
pub fn update_details(
    conn: &mut Connection,
    ticket_id: &str,
    update: &DetailsUpdate,
    now: DateTime<Utc>,
) -> Result<Ticket, TicketError> {
    let mut attempt = 0;
    loop {
        let snapshot = require_ticket(conn, ticket_id)?;
        if snapshot.status.is_terminal() {
            return Err(TicketError::TerminalState {
                status: snapshot.status,
            });
        }
        if update.is_empty() {
            return Ok(snapshot);
        }

        let device = update.device.as_ref().unwrap_or(&snapshot.device);
        let issue = update
            .issue_description
            .as_ref()
            .unwrap_or(&snapshot.issue_description);
        let diagnosis = update.diagnosis.as_ref().or(snapshot.diagnosis.as_ref());
        let technician = update.technician.as_ref().or(snapshot.technician.as_ref());
        let notes = update.notes.as_ref().or(snapshot.notes.as_ref());

        let changed = conn.execute(
            "UPDATE tickets
             SET device_type = ?1, brand = ?2, model = ?3,
                 issue_description = ?4, diagnosis = ?5, technician = ?6, notes = ?7,
                 updated_at_us = ?8, version = version + 1
             WHERE ticket_id = ?9 AND version = ?10",
            params![
                device.device_type,
                device.brand,
                device.model,
                issue,
                diagnosis,
                technician,
                notes,
                to_us(now),
                ticket_id,
                snapshot.version,
            ],
        )?;

        if changed > 0 {
            return require_ticket(conn, ticket_id);
        }

        attempt += 1;
        if attempt >= OCC_RETRY_ATTEMPTS {
            return Err(TicketError::ConcurrencyConflict {
                ticket_id: ticket_id.to_string(),
            });
        }
        tracing::debug!(ticket = ticket_id, attempt, "details edit conflicted; retrying");
    }
}

/// Move a ticket along the status graph, with OCC retry.
///
/// A transition to the current status succeeds without touching the row.
///
/// # Errors
///
/// `InvalidTransition`, `TerminalState`, `NotFound`, `ConcurrencyConflict`
/// (after retries), or `Storage`.
pub fn transition(
    conn: &mut Connection,
    ticket_id: &str,
    target: Status,
    now: DateTime<Utc>,
) -> Result<Ticket, TicketError> {
    let mut attempt = 0;
    loop {
        let snapshot = require_ticket(conn, ticket_id)?;
        if snapshot.status.can_transition_to(target)? == Transition::NoOp {
            return Ok(snapshot);
        }

        let changed = conn.execute(
            "UPDATE tickets SET status = ?1, updated_at_us = ?2, version = version + 1
             WHERE ticket_id = ?3 AND version = ?4",
            params![target.to_string(), to_us(now), ticket_id, snapshot.version],
        )?;

        if changed > 0 {
            tracing::info!(ticket = %snapshot.ticket_number, from = %snapshot.status, to = %target, "transitioned");
            return require_ticket(conn, ticket_id);
        }

        attempt += 1;
        if attempt >= OCC_RETRY_ATTEMPTS {
            return Err(TicketError::ConcurrencyConflict {
                ticket_id: ticket_id.to_string(),
            });
        }
        tracing::debug!(ticket = ticket_id, attempt, "transition conflicted; retrying");
    }
}

/// Append a customer-facing message to the communication log.
///
/// Independent of status and cost mutation, and deliberately permitted on
/// terminal tickets: the lifecycle freeze covers cost and status, not the
/// record of what the customer was told.
///
/// # Errors
///
/// `EmptyMessage` for a blank message, `NotFound`, `ConcurrencyConflict`
/// (after retries), or `Storage`.
pub fn log_update(
    conn: &mut Connection,
    ticket_id: &str,
    message: &str,
    channels: Channels,
    now: DateTime<Utc>,
) -> Result<Ticket, TicketError> {
    if message.trim().is_empty() {
        return Err(TicketError::EmptyMessage);
    }

    let mut attempt = 0;
    loop {
        let snapshot = require_ticket(conn, ticket_id)?;

        let tx = conn.transaction()?;
        let changed = tx.execute(
            "UPDATE tickets SET updated_at_us = ?1, version = version + 1
             WHERE ticket_id = ?2 AND version = ?3",
            params![to_us(now), ticket_id, snapshot.version],
        )?;

        if changed > 0 {
            append_comm_entry(&tx, ticket_id, message.trim(), channels, now)?;
            tx.commit()?;
            return require_ticket(conn, ticket_id);
        }

        drop(tx);
        attempt += 1;
        if attempt >= OCC_RETRY_ATTEMPTS {
            return Err(TicketError::ConcurrencyConflict {
                ticket_id: ticket_id.to_string(),
            });
        }
        tracing::debug!(ticket = ticket_id, attempt, "comm log conflicted; retrying");
    }
}

/// Deliver a ticket: transition to `delivered`, take a final ledger
/// snapshot if the recorded total drifted, record the customer message,
/// then hand the notification request to the external sender.
///
/// The message is logged as intent in the same transaction as the status
/// change; the notifier runs after commit and its outcome is reported
/// alongside the result, never as a mutation failure.
///
/// # Errors
///
/// `EmptyMessage` for a blank message, plus the transition and storage
/// errors of [`transition`].
pub fn complete(
    conn: &mut Connection,
    ticket_id: &str,
    actor: Option<&str>,
    message: &str,
    channels: Channels,
    notifier: &dyn Notifier,
    now: DateTime<Utc>,
) -> Result<CompletionOutcome, TicketError> {
    if message.trim().is_empty() {
        return Err(TicketError::EmptyMessage);
    }

    let mut attempt = 0;
    let ticket = loop {
        let snapshot = require_ticket(conn, ticket_id)?;
        snapshot.status.can_transition_to(Status::Delivered)?;

        let (costs, entry) = ledger::apply_cost_update(
            &snapshot.costs,
            snapshot.last_recorded_total(),
            &CostDelta::default(),
            actor,
            now,
        )?;

        let tx = conn.transaction()?;
        let changed = tx.execute(
            "UPDATE tickets
             SET status = ?1, total_cost = ?2, updated_at_us = ?3, version = version + 1
             WHERE ticket_id = ?4 AND version = ?5",
            params![
                Status::Delivered.to_string(),
                costs.total_cost,
                to_us(now),
                ticket_id,
                snapshot.version,
            ],
        )?;

        if changed > 0 {
            if let Some(entry) = &entry {
                append_price_entry(&tx, ticket_id, entry)?;
            }
            append_comm_entry(&tx, ticket_id, message.trim(), channels, now)?;
            tx.commit()?;
            break require_ticket(conn, ticket_id)?;
        }

        drop(tx);
        attempt += 1;
        if attempt >= OCC_RETRY_ATTEMPTS {
            return Err(TicketError::ConcurrencyConflict {
                ticket_id: ticket_id.to_string(),
            });
        }
        tracing::debug!(ticket = ticket_id, attempt, "completion conflicted; retrying");
    };

    let customer = customers::get_customer(conn, &ticket.customer_id)?;
    let request = NotificationRequest {
        ticket_number: ticket.ticket_number.clone(),
        customer_email: customer.as_ref().map(|c| c.email.clone()),
        customer_phone: customer.as_ref().map(|c| c.phone_digits.clone()),
        message: message.trim().to_string(),
        channels,
        context: TemplateContext {
            status: ticket.status,
            total_cost: ticket.costs.total_cost,
            estimated_completion: ticket.estimated_completion,
        },
    };

    let delivery = notifier.send(&request);
    if let DeliveryOutcome::Failed { reason } = &delivery {
        tracing::warn!(ticket = %ticket.ticket_number, reason, "notification delivery failed");
    }

    Ok(CompletionOutcome {
        ticket,
        request,
        delivery,
    })
}

// ---------------------------------------------------------------------------
// Row loading
// ---------------------------------------------------------------------------

fn require_ticket(conn: &Connection, ticket_id: &str) -> Result<Ticket, TicketError> {
    get_ticket(conn, ticket_id)?.ok_or_else(|| TicketError::NotFound {
        key: ticket_id.to_string(),
    })
}

fn load_ticket(
    conn: &Connection,
    column: &str,
    value: &str,
) -> Result<Option<Ticket>, TicketError> {
    // `column` is one of two compile-time literals, never caller input.
    let sql = format!(
        "SELECT ticket_id, ticket_number, customer_id,
                device_type, brand, model,
                issue_description, diagnosis, technician, notes,
                status, priority,
                repair_cost, parts_cost, labor_cost, total_cost,
                estimated_completion_us, warranty_days,
                received_at_us, updated_at_us, version
         FROM tickets WHERE {column} = ?1"
    );

    let mut stmt = conn.prepare(&sql)?;
    let result = stmt.query_row(params![value], row_to_ticket);

    let mut ticket = match result {
        Ok(ticket) => ticket,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    ticket.price_history = load_price_history(conn, &ticket.id)?;
    ticket.updates = load_comm_log(conn, &ticket.id)?;
    Ok(Some(ticket))
}

fn row_to_ticket(row: &rusqlite::Row<'_>) -> rusqlite::Result<Ticket> {
    let status_text: String = row.get(10)?;
    let priority_text: String = row.get(11)?;

    let estimated_completion = row
        .get::<_, Option<i64>>(16)?
        .map(|us| from_us(16, us))
        .transpose()?;

    Ok(Ticket {
        id: row.get(0)?,
        ticket_number: row.get(1)?,
        customer_id: row.get(2)?,
        device: Device {
            device_type: row.get(3)?,
            brand: row.get(4)?,
            model: row.get(5)?,
        },
        issue_description: row.get(6)?,
        diagnosis: row.get(7)?,
        technician: row.get(8)?,
        notes: row.get(9)?,
        status: Status::from_str(&status_text)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(10, Type::Text, Box::new(e)))?,
        priority: Priority::from_str(&priority_text)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(11, Type::Text, Box::new(e)))?,
        costs: Costs {
            repair_cost: row.get(12)?,
            parts_cost: row.get(13)?,
            labor_cost: row.get(14)?,
            total_cost: row.get(15)?,
        },
        price_history: Vec::new(),
        updates: Vec::new(),
        estimated_completion,
        warranty_days: row.get(17)?,
        received_at: from_us(18, row.get(18)?)?,
        updated_at: from_us(19, row.get(19)?)?,
        version: row.get(20)?,
    })
}

fn load_price_history(conn: &Connection, ticket_id: &str) -> Result<Vec<PriceEntry>, TicketError> {
    let mut stmt = conn.prepare(
        "SELECT repair_cost, parts_cost, labor_cost, total_cost, updated_at_us, updated_by
         FROM price_history WHERE ticket_id = ?1
         ORDER BY updated_at_us ASC, entry_id ASC",
    )?;

    let rows = stmt.query_map(params![ticket_id], |row| {
        Ok(PriceEntry {
            repair_cost: row.get(0)?,
            parts_cost: row.get(1)?,
            labor_cost: row.get(2)?,
            total_cost: row.get(3)?,
            updated_at: from_us(4, row.get(4)?)?,
            updated_by: row.get(5)?,
        })
    })?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(row?);
    }
    Ok(entries)
}

fn load_comm_log(
    conn: &Connection,
    ticket_id: &str,
) -> Result<Vec<crate::model::CommEntry>, TicketError> {
    let mut stmt = conn.prepare(
        "SELECT message, sent_at_us, via_whatsapp, via_email
         FROM comm_log WHERE ticket_id = ?1
         ORDER BY sent_at_us ASC, entry_id ASC",
    )?;

    let rows = stmt.query_map(params![ticket_id], |row| {
        Ok(crate::model::CommEntry {
            message: row.get(0)?,
            sent_at: from_us(1, row.get(1)?)?,
            via: Channels {
                whatsapp: row.get::<_, i64>(2)? != 0,
                email: row.get::<_, i64>(3)? != 0,
            },
        })
    })?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(row?);
    }
    Ok(entries)
}

fn append_price_entry(
    tx: &Transaction<'_>,
    ticket_id: &str,
    entry: &PriceEntry,
) -> Result<(), TicketError> {
    tx.execute(
        "INSERT INTO price_history (ticket_id, repair_cost, parts_cost, labor_cost, total_cost, updated_at_us, updated_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            ticket_id,
            entry.repair_cost,
            entry.parts_cost,
            entry.labor_cost,
            entry.total_cost,
            to_us(entry.updated_at),
            entry.updated_by,
        ],
    )?;
    Ok(())
}

fn append_comm_entry(
    tx: &Transaction<'_>,
    ticket_id: &str,
    message: &str,
    channels: Channels,
    now: DateTime<Utc>,
) -> Result<(), TicketError> {
    tx.execute(
        "INSERT INTO comm_log (ticket_id, message, sent_at_us, via_whatsapp, via_email)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            ticket_id,
            message,
            to_us(now),
            i64::from(channels.whatsapp),
            i64::from(channels.email),
        ],
    )?;
    Ok(())
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, Some(msg))
            if e.code == rusqlite::ErrorCode::ConstraintViolation
                && msg.contains("UNIQUE")
    )
}

fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, Some(msg))
            if e.code == rusqlite::ErrorCode::ConstraintViolation
                && msg.contains("FOREIGN KEY")
    )
}
