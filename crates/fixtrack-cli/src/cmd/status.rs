//! `fxt status` — move a ticket through its lifecycle.

use crate::cmd;
use crate::output::{OutputMode, fail_with, kv, render};
use chrono::Utc;
use clap::Args;
use fixtrack_core::Status;
use fixtrack_core::store::tickets;
use std::path::Path;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Ticket number, e.g. FT-7K2M9P.
    #[arg(value_name = "TICKET")]
    pub ticket: String,

    /// Target status: received, diagnosed, in_repair, ready_for_pickup,
    /// delivered, or cancelled.
    #[arg(value_name = "STATUS")]
    pub to: Status,
}

pub fn run_status(args: &StatusArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let mut conn = cmd::open_project(project_root, output)?;

    let ticket = tickets::get_by_ticket_number(&conn, &args.ticket)
        .map_err(|e| fail_with(output, &e))?;
    let ticket = tickets::transition(&mut conn, &ticket.id, args.to, Utc::now())
        .map_err(|e| fail_with(output, &e))?;

    render(output, &ticket, |ticket, w| {
        kv(w, "ticket", &ticket.ticket_number)?;
        kv(w, "status", ticket.status.to_string())?;
        kv(w, "version", ticket.version.to_string())
    })
}
