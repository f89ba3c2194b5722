//! `fxt edit` — edit the descriptive fields on a ticket.

use crate::cmd;
use crate::output::{OutputMode, fail_with, kv, render};
use chrono::Utc;
use clap::Args;
use fixtrack_core::Device;
use fixtrack_core::store::tickets::{self, DetailsUpdate};
use std::path::Path;

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Ticket number, e.g. FT-7K2M9P.
    #[arg(value_name = "TICKET")]
    pub ticket: String,

    /// Diagnosis after inspection.
    #[arg(long)]
    pub diagnosis: Option<String>,

    /// Assigned technician.
    #[arg(long)]
    pub technician: Option<String>,

    /// Free-form notes.
    #[arg(long)]
    pub notes: Option<String>,

    /// Corrected issue description.
    #[arg(long)]
    pub issue: Option<String>,

    /// Corrected device category. Requires --brand and --model.
    #[arg(long, requires = "brand", requires = "model")]
    pub device_type: Option<String>,

    /// Corrected device brand.
    #[arg(long, requires = "device_type")]
    pub brand: Option<String>,

    /// Corrected device model.
    #[arg(long, requires = "device_type")]
    pub model: Option<String>,
}

impl EditArgs {
    fn device(&self) -> Option<Device> {
        match (&self.device_type, &self.brand, &self.model) {
            (Some(device_type), Some(brand), Some(model)) => Some(Device {
                device_type: device_type.clone(),
                brand: brand.clone(),
                model: model.clone(),
            }),
            _ => None,
        }
    }
}

pub fn run_edit(args: &EditArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let mut conn = cmd::open_project(project_root, output)?;

    let update = DetailsUpdate {
        device: args.device(),
        issue_description: args.issue.clone(),
        diagnosis: args.diagnosis.clone(),
        technician: args.technician.clone(),
        notes: args.notes.clone(),
    };

    let ticket = tickets::get_by_ticket_number(&conn, &args.ticket)
        .map_err(|e| fail_with(output, &e))?;
    let ticket = tickets::update_details(&mut conn, &ticket.id, &update, Utc::now())
        .map_err(|e| fail_with(output, &e))?;

    render(output, &ticket, |ticket, w| {
        kv(w, "ticket", &ticket.ticket_number)?;
        if let Some(diagnosis) = &ticket.diagnosis {
            kv(w, "diagnosis", diagnosis)?;
        }
        if let Some(technician) = &ticket.technician {
            kv(w, "technician", technician)?;
        }
        kv(w, "version", ticket.version.to_string())
    })
}
