//! `fxt log` — append a customer-facing update to a ticket.

use crate::cmd;
use crate::output::{OutputMode, fail_with, kv, render};
use chrono::Utc;
use clap::Args;
use fixtrack_core::store::tickets;
use std::path::Path;

#[derive(Args, Debug)]
pub struct LogArgs {
    /// Ticket number, e.g. FT-7K2M9P.
    #[arg(value_name = "TICKET")]
    pub ticket: String,

    /// Message text sent to the customer.
    #[arg(short, long)]
    pub message: String,

    /// Record that the message went out via WhatsApp.
    #[arg(long)]
    pub whatsapp: bool,

    /// Record that the message went out via email.
    #[arg(long)]
    pub email: bool,
}

pub fn run_log(args: &LogArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let mut conn = cmd::open_project(project_root, output)?;
    let channels = cmd::channels_from_flags(args.whatsapp, args.email);

    let ticket = tickets::get_by_ticket_number(&conn, &args.ticket)
        .map_err(|e| fail_with(output, &e))?;
    let ticket = tickets::log_update(&mut conn, &ticket.id, &args.message, channels, Utc::now())
        .map_err(|e| fail_with(output, &e))?;

    render(output, &ticket, |ticket, w| {
        kv(w, "ticket", &ticket.ticket_number)?;
        kv(w, "updates", format!("{} entries", ticket.updates.len()))
    })
}
