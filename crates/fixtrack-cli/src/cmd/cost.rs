//! `fxt cost` — edit cost components on a ticket.

use crate::actor;
use crate::cmd;
use crate::output::{OutputMode, fail_with, kv, render};
use chrono::Utc;
use clap::Args;
use fixtrack_core::CostDelta;
use fixtrack_core::store::tickets;
use std::path::Path;

#[derive(Args, Debug)]
pub struct CostArgs {
    /// Ticket number, e.g. FT-7K2M9P.
    #[arg(value_name = "TICKET")]
    pub ticket: String,

    /// New repair cost, e.g. 125.50. Omitted components keep their value.
    #[arg(long, value_parser = cmd::parse_money)]
    pub repair: Option<i64>,

    /// New parts cost.
    #[arg(long, value_parser = cmd::parse_money)]
    pub parts: Option<i64>,

    /// New labor cost.
    #[arg(long, value_parser = cmd::parse_money)]
    pub labor: Option<i64>,
}

pub fn run_cost(
    args: &CostArgs,
    actor_flag: Option<&str>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let mut conn = cmd::open_project(project_root, output)?;
    let actor = actor::resolve_actor(actor_flag);

    let delta = CostDelta {
        repair_cost: args.repair,
        parts_cost: args.parts,
        labor_cost: args.labor,
    };

    let ticket = tickets::get_by_ticket_number(&conn, &args.ticket)
        .map_err(|e| fail_with(output, &e))?;
    let ticket = tickets::update_costs(&mut conn, &ticket.id, &delta, actor.as_deref(), Utc::now())
        .map_err(|e| fail_with(output, &e))?;

    render(output, &ticket, |ticket, w| {
        kv(w, "ticket", &ticket.ticket_number)?;
        kv(
            w,
            "costs",
            format!(
                "repair {} + parts {} + labor {} = {}",
                cmd::fmt_cents(ticket.costs.repair_cost),
                cmd::fmt_cents(ticket.costs.parts_cost),
                cmd::fmt_cents(ticket.costs.labor_cost),
                cmd::fmt_cents(ticket.costs.total_cost),
            ),
        )?;
        kv(w, "history", format!("{} entries", ticket.price_history.len()))
    })
}
