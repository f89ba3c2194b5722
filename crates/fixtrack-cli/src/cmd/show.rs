//! `fxt show` — full detail for one ticket.

use crate::cmd;
use crate::output::{OutputMode, fail_with, render};
use clap::Args;
use fixtrack_core::store::tickets;
use std::path::Path;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Ticket number, e.g. FT-7K2M9P.
    #[arg(value_name = "TICKET")]
    pub ticket: String,
}

pub fn run_show(args: &ShowArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let conn = cmd::open_project(project_root, output)?;

    let ticket = tickets::get_by_ticket_number(&conn, &args.ticket)
        .map_err(|e| fail_with(output, &e))?;

    render(output, &ticket, |ticket, w| cmd::write_ticket(w, ticket))
}
