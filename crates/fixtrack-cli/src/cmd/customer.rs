//! `fxt customer add` — register a customer.

use crate::cmd;
use crate::output::{OutputMode, fail_with, kv, render};
use chrono::Utc;
use clap::Args;
use fixtrack_core::store::customers::{self, NewCustomer};
use std::path::Path;

#[derive(Args, Debug)]
pub struct CustomerAddArgs {
    /// Customer name.
    #[arg(short, long)]
    pub name: String,

    /// Contact phone number; at least ten digits, any punctuation.
    #[arg(short, long)]
    pub phone: String,

    /// Contact email address.
    #[arg(short, long)]
    pub email: String,

    /// Postal address.
    #[arg(long)]
    pub address: Option<String>,
}

pub fn run_customer_add(
    args: &CustomerAddArgs,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let conn = cmd::open_project(project_root, output)?;

    let new = NewCustomer {
        name: args.name.clone(),
        phone: args.phone.clone(),
        email: args.email.clone(),
        address: args.address.clone(),
    };
    let record = customers::add_customer(&conn, &new, Utc::now())
        .map_err(|e| fail_with(output, &e))?;

    render(output, &record, |record, w| {
        kv(w, "customer", &record.customer_id)?;
        kv(w, "name", &record.name)?;
        kv(w, "phone", &record.phone_digits)?;
        kv(w, "email", &record.email)
    })
}
