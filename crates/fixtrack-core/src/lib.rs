//! fixtrack-core: repair ticket lifecycle and price-history ledger.
//!
//! The aggregate is [`model::Ticket`]: one repair work order tracked from
//! intake to delivery, with a tamper-evident ledger of cost changes and an
//! append-only communication log. The [`store`] module persists tickets in
//! SQLite with optimistic concurrency and serves lookups by ticket number,
//! phone, name, or email.
//!
//! # Conventions
//!
//! - **Errors**: typed [`error::TicketError`] on the operation surface;
//!   `anyhow::Result` with context at the store-opening seam.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`).

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod ident;
pub mod ledger;
pub mod model;
pub mod notify;
pub mod store;

pub use config::{ProjectConfig, load_project_config};
pub use error::{ErrorCode, TicketError};
pub use ledger::{CostDelta, apply_cost_update};
pub use model::{Channels, Costs, Device, Priority, Status, Ticket};
pub use notify::{DeliveryOutcome, LoggingNotifier, NotificationRequest, Notifier};
