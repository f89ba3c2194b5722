//! `fxt find` — look up tickets by number, phone, name, or email.

use crate::cmd;
use crate::output::{OutputMode, fail_with, render};
use clap::Args;
use fixtrack_core::store::lookup::{self, Page, SearchKey};
use std::path::Path;

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct FindKey {
    /// Exact ticket number, e.g. FT-7K2M9P.
    #[arg(short = 't', long)]
    pub number: Option<String>,

    /// Customer phone number; punctuation ignored, needs ten digits.
    #[arg(short, long)]
    pub phone: Option<String>,

    /// Customer name substring, case-insensitive.
    #[arg(short, long)]
    pub name: Option<String>,

    /// Exact customer email, case-insensitive.
    #[arg(short, long)]
    pub email: Option<String>,
}

#[derive(Args, Debug)]
pub struct FindArgs {
    #[command(flatten)]
    pub key: FindKey,

    /// Maximum number of results.
    #[arg(long)]
    pub limit: Option<u32>,

    /// Number of results to skip.
    #[arg(long)]
    pub offset: Option<u32>,
}

impl FindArgs {
    fn search_key(&self) -> SearchKey {
        if let Some(number) = &self.key.number {
            SearchKey::TicketNumber(number.clone())
        } else if let Some(phone) = &self.key.phone {
            SearchKey::Phone(phone.clone())
        } else if let Some(name) = &self.key.name {
            SearchKey::Name(name.clone())
        } else if let Some(email) = &self.key.email {
            SearchKey::Email(email.clone())
        } else {
            // clap's required group guarantees one key is present
            unreachable!("clap enforces exactly one search key")
        }
    }
}

pub fn run_find(args: &FindArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let conn = cmd::open_project(project_root, output)?;
    let config = fixtrack_core::load_project_config(project_root)?;

    let page = Page {
        limit: args.limit.or(Some(config.lookup.default_page_size)),
        offset: args.offset,
    };
    let hits = lookup::find_tickets(&conn, &args.search_key(), page)
        .map_err(|e| fail_with(output, &e))?;

    render(output, &hits, |hits, w| cmd::write_hits(w, hits))
}
