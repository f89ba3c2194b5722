//! `fxt intake` — open a repair ticket.

use crate::cmd;
use crate::output::{OutputMode, fail_with, kv, render};
use chrono::{DateTime, Utc};
use clap::Args;
use fixtrack_core::store::tickets::{self, NewTicket};
use fixtrack_core::{Device, Priority};
use std::path::Path;

#[derive(Args, Debug)]
pub struct IntakeArgs {
    /// Customer ID (`cu-...`) the device belongs to.
    #[arg(short, long)]
    pub customer: String,

    /// Device category, e.g. laptop or phone.
    #[arg(long)]
    pub device_type: String,

    /// Device brand.
    #[arg(long)]
    pub brand: String,

    /// Device model.
    #[arg(long)]
    pub model: String,

    /// What the customer reports as broken.
    #[arg(short, long)]
    pub issue: String,

    /// Ticket priority: low, medium, or high.
    #[arg(long, default_value = "medium")]
    pub priority: Priority,

    /// Initial repair cost estimate, e.g. 125.50.
    #[arg(long, value_parser = cmd::parse_money, default_value = "0")]
    pub repair: i64,

    /// Initial parts cost estimate.
    #[arg(long, value_parser = cmd::parse_money, default_value = "0")]
    pub parts: i64,

    /// Initial labor cost estimate.
    #[arg(long, value_parser = cmd::parse_money, default_value = "0")]
    pub labor: i64,

    /// Assigned technician.
    #[arg(long)]
    pub technician: Option<String>,

    /// Free-form intake notes.
    #[arg(long)]
    pub notes: Option<String>,

    /// Estimated completion date (YYYY-MM-DD).
    #[arg(long, value_parser = cmd::parse_date)]
    pub estimated_completion: Option<DateTime<Utc>>,

    /// Warranty period in days.
    #[arg(long)]
    pub warranty_days: Option<u32>,
}

pub fn run_intake(args: &IntakeArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let conn = cmd::open_project(project_root, output)?;
    let config = fixtrack_core::load_project_config(project_root)?;

    let new = NewTicket {
        customer_id: args.customer.clone(),
        device: Device {
            device_type: args.device_type.clone(),
            brand: args.brand.clone(),
            model: args.model.clone(),
        },
        issue_description: args.issue.clone(),
        priority: args.priority,
        repair_cost: args.repair,
        parts_cost: args.parts,
        labor_cost: args.labor,
        technician: args.technician.clone(),
        notes: args.notes.clone(),
        estimated_completion: args.estimated_completion,
        warranty_days: args.warranty_days,
    };

    let ticket = tickets::create_ticket(&conn, &config.tickets, &new, Utc::now())
        .map_err(|e| fail_with(output, &e))?;

    render(output, &ticket, |ticket, w| {
        kv(w, "ticket", &ticket.ticket_number)?;
        kv(w, "id", &ticket.id)?;
        kv(w, "status", ticket.status.to_string())?;
        kv(w, "total", cmd::fmt_cents(ticket.costs.total_cost))
    })
}
