//! `fxt list` — filtered ticket listing for workshop reporting.

use crate::cmd;
use crate::output::{OutputMode, fail_with, render};
use chrono::{DateTime, Utc};
use clap::Args;
use fixtrack_core::Status;
use fixtrack_core::store::lookup::{self, Page, TicketFilter};
use std::path::Path;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only tickets currently in this status.
    #[arg(short, long)]
    pub status: Option<Status>,

    /// Only tickets received on or after this date (YYYY-MM-DD).
    #[arg(long, value_parser = cmd::parse_date)]
    pub from: Option<DateTime<Utc>>,

    /// Only tickets received before this date (YYYY-MM-DD).
    #[arg(long, value_parser = cmd::parse_date)]
    pub to: Option<DateTime<Utc>>,

    /// Maximum number of results.
    #[arg(long)]
    pub limit: Option<u32>,

    /// Number of results to skip.
    #[arg(long)]
    pub offset: Option<u32>,
}

pub fn run_list(args: &ListArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let conn = cmd::open_project(project_root, output)?;
    let config = fixtrack_core::load_project_config(project_root)?;

    let filter = TicketFilter {
        status: args.status,
        received_from: args.from,
        received_to: args.to,
        page: Page {
            limit: args.limit.or(Some(config.lookup.default_page_size)),
            offset: args.offset,
        },
    };
    let hits = lookup::list_tickets(&conn, &filter).map_err(|e| fail_with(output, &e))?;

    render(output, &hits, |hits, w| cmd::write_hits(w, hits))
}
