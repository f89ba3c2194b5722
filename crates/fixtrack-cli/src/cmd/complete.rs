//! `fxt complete` — deliver a ticket and notify the customer.

use crate::actor;
use crate::cmd;
use crate::output::{OutputMode, fail_with, kv, render};
use chrono::Utc;
use clap::Args;
use fixtrack_core::store::tickets;
use fixtrack_core::{DeliveryOutcome, LoggingNotifier};
use std::path::Path;

#[derive(Args, Debug)]
pub struct CompleteArgs {
    /// Ticket number, e.g. FT-7K2M9P.
    #[arg(value_name = "TICKET")]
    pub ticket: String,

    /// Pickup message sent to the customer.
    #[arg(short, long, default_value = "Your device is ready for pickup.")]
    pub message: String,

    /// Notify via WhatsApp.
    #[arg(long)]
    pub whatsapp: bool,

    /// Notify via email.
    #[arg(long)]
    pub email: bool,
}

pub fn run_complete(
    args: &CompleteArgs,
    actor_flag: Option<&str>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let mut conn = cmd::open_project(project_root, output)?;
    let actor = actor::resolve_actor(actor_flag);
    let channels = cmd::channels_from_flags(args.whatsapp, args.email);
    let notifier = LoggingNotifier;

    let ticket = tickets::get_by_ticket_number(&conn, &args.ticket)
        .map_err(|e| fail_with(output, &e))?;
    let outcome = tickets::complete(
        &mut conn,
        &ticket.id,
        actor.as_deref(),
        &args.message,
        channels,
        &notifier,
        Utc::now(),
    )
    .map_err(|e| fail_with(output, &e))?;

    render(output, &outcome, |outcome, w| {
        kv(w, "ticket", &outcome.ticket.ticket_number)?;
        kv(w, "status", outcome.ticket.status.to_string())?;
        kv(w, "total", cmd::fmt_cents(outcome.ticket.costs.total_cost))?;
        let delivery = match &outcome.delivery {
            DeliveryOutcome::Sent => "sent".to_string(),
            DeliveryOutcome::Skipped => "skipped (no channels)".to_string(),
            DeliveryOutcome::Failed { reason } => format!("failed: {reason}"),
        };
        kv(w, "notification", delivery)
    })
}
