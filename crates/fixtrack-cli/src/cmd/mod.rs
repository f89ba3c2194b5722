//! Command handlers for `fxt`.
//!
//! Each command lives in its own module with an `Args` struct and a
//! `run_*` entry point taking the parsed args, the output mode, and the
//! project root. Shared rendering helpers live here.

pub mod complete;
pub mod cost;
pub mod customer;
pub mod edit;
pub mod find;
pub mod init;
pub mod intake;
pub mod list;
pub mod log;
pub mod show;
pub mod status;

use crate::output::{CliError, OutputMode, kv, render_error};
use chrono::{DateTime, NaiveDate, Utc};
use fixtrack_core::Channels;
use fixtrack_core::store::lookup::TicketHit;
use rusqlite::Connection;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Database location relative to the project root.
pub const STORE_RELATIVE_PATH: &str = ".fixtrack/tickets.db";

pub fn store_path(project_root: &Path) -> PathBuf {
    project_root.join(STORE_RELATIVE_PATH)
}

/// Open the store for an already-initialized project.
///
/// # Errors
///
/// Renders a hint and fails when the project has not been initialized, or
/// when the database cannot be opened.
pub fn open_project(project_root: &Path, output: OutputMode) -> anyhow::Result<Connection> {
    let path = store_path(project_root);
    if !path.exists() {
        let error = CliError::with_details(
            "no fixtrack project found in this directory",
            "Run `fxt init` first",
            "E1001",
        );
        render_error(output, &error)?;
        anyhow::bail!("{}", error.message);
    }
    fixtrack_core::store::open_store(&path)
}

/// Parse a money amount like `125`, `125.5`, or `125.50` into cents.
///
/// # Errors
///
/// Returns a message suitable for clap when the input is not a plain
/// decimal amount with at most two fractional digits.
pub fn parse_money(input: &str) -> Result<i64, String> {
    let trimmed = input.trim();
    let unsigned = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let (dollars, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    let valid = !unsigned.is_empty()
        && (!dollars.is_empty() || !fraction.is_empty())
        && dollars.chars().all(|c| c.is_ascii_digit())
        && fraction.chars().all(|c| c.is_ascii_digit())
        && fraction.len() <= 2;
    if !valid {
        return Err(format!(
            "invalid amount {trimmed:?}; expected e.g. 125 or 125.50"
        ));
    }

    let whole: i64 = if dollars.is_empty() {
        0
    } else {
        dollars.parse().map_err(|_| "amount out of range".to_string())?
    };
    let mut cents: i64 = if fraction.is_empty() {
        0
    } else {
        fraction.parse().map_err(|_| "amount out of range".to_string())?
    };
    if fraction.len() == 1 {
        cents *= 10;
    }

    let total = whole
        .checked_mul(100)
        .and_then(|w| w.checked_add(cents))
        .ok_or_else(|| "amount out of range".to_string())?;
    Ok(if trimmed.starts_with('-') { -total } else { total })
}

/// Format cents as a plain decimal amount.
pub fn fmt_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    format!("{sign}{}.{:02}", cents / 100, cents % 100)
}

/// Parse a `YYYY-MM-DD` date into a UTC timestamp at midnight.
///
/// # Errors
///
/// Returns a message suitable for clap on malformed input.
pub fn parse_date(input: &str) -> Result<DateTime<Utc>, String> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid date {input:?}; expected YYYY-MM-DD"))
        .map(|date| {
            date.and_hms_opt(0, 0, 0)
                .unwrap_or_default()
                .and_utc()
        })
}

/// Build a [`Channels`] from the shared `--whatsapp`/`--email` flags.
pub const fn channels_from_flags(whatsapp: bool, email: bool) -> Channels {
    Channels { whatsapp, email }
}

/// Render one lookup hit per line in human mode.
pub fn write_hits(w: &mut dyn Write, hits: &[TicketHit]) -> io::Result<()> {
    if hits.is_empty() {
        writeln!(w, "No matching tickets.")?;
        return Ok(());
    }
    for hit in hits {
        writeln!(
            w,
            "{}  {:<16}  {} {} {}  {:>10}  {}",
            hit.ticket_number,
            hit.status.to_string(),
            hit.device_type,
            hit.brand,
            hit.model,
            fmt_cents(hit.total_cost),
            hit.customer.name,
        )?;
    }
    writeln!(w, "{} ticket(s)", hits.len())?;
    Ok(())
}

/// Render the full ticket detail in human mode.
pub fn write_ticket(w: &mut dyn Write, ticket: &fixtrack_core::Ticket) -> io::Result<()> {
    kv(w, "ticket", &ticket.ticket_number)?;
    kv(w, "id", &ticket.id)?;
    kv(w, "customer", &ticket.customer_id)?;
    kv(
        w,
        "device",
        format!(
            "{} {} {}",
            ticket.device.device_type, ticket.device.brand, ticket.device.model
        ),
    )?;
    kv(w, "issue", &ticket.issue_description)?;
    if let Some(diagnosis) = &ticket.diagnosis {
        kv(w, "diagnosis", diagnosis)?;
    }
    if let Some(technician) = &ticket.technician {
        kv(w, "technician", technician)?;
    }
    kv(w, "status", ticket.status.to_string())?;
    kv(w, "priority", ticket.priority.to_string())?;
    kv(
        w,
        "costs",
        format!(
            "repair {} + parts {} + labor {} = {}",
            fmt_cents(ticket.costs.repair_cost),
            fmt_cents(ticket.costs.parts_cost),
            fmt_cents(ticket.costs.labor_cost),
            fmt_cents(ticket.costs.total_cost),
        ),
    )?;
    if let Some(eta) = ticket.estimated_completion {
        kv(w, "est. done", eta.format("%Y-%m-%d").to_string())?;
    }
    if let Some(days) = ticket.warranty_days {
        kv(w, "warranty", format!("{days} days"))?;
    }
    kv(w, "received", ticket.received_at.to_rfc3339())?;
    kv(w, "updated", ticket.updated_at.to_rfc3339())?;
    kv(w, "version", ticket.version.to_string())?;

    if !ticket.price_history.is_empty() {
        writeln!(w, "\nprice history:")?;
        for entry in &ticket.price_history {
            writeln!(
                w,
                "  {}  {:>10}  by {}",
                entry.updated_at.format("%Y-%m-%d %H:%M"),
                fmt_cents(entry.total_cost),
                entry.updated_by,
            )?;
        }
    }

    if !ticket.updates.is_empty() {
        writeln!(w, "\nupdates:")?;
        for entry in &ticket.updates {
            writeln!(
                w,
                "  {}  [{}]  {}",
                entry.sent_at.format("%Y-%m-%d %H:%M"),
                entry.via,
                entry.message,
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{fmt_cents, parse_date, parse_money};

    #[test]
    fn money_parses_whole_and_fractional_amounts() {
        assert_eq!(parse_money("125"), Ok(12_500));
        assert_eq!(parse_money("125.5"), Ok(12_550));
        assert_eq!(parse_money("125.50"), Ok(12_550));
        assert_eq!(parse_money("0.07"), Ok(7));
        assert_eq!(parse_money(".50"), Ok(50));
        assert_eq!(parse_money("-3.25"), Ok(-325));
    }

    #[test]
    fn money_rejects_garbage() {
        assert!(parse_money("").is_err());
        assert!(parse_money("abc").is_err());
        assert!(parse_money("1.234").is_err());
        assert!(parse_money("1,50").is_err());
        assert!(parse_money(".").is_err());
    }

    #[test]
    fn cents_format_round_trips() {
        assert_eq!(fmt_cents(12_550), "125.50");
        assert_eq!(fmt_cents(7), "0.07");
        assert_eq!(fmt_cents(-325), "-3.25");
        assert_eq!(fmt_cents(0), "0.00");
    }

    #[test]
    fn dates_parse_to_utc_midnight() {
        let parsed = parse_date("2026-03-01").expect("valid date");
        assert_eq!(parsed.to_rfc3339(), "2026-03-01T00:00:00+00:00");
        assert!(parse_date("03/01/2026").is_err());
    }
}
