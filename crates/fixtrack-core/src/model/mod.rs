//! Domain model for repair tickets.
//!
//! `ticket` holds the aggregate and its enums; `history` holds the two
//! append-only record types (price ledger entries and communication log
//! entries). Nothing in this module touches storage.

pub mod history;
pub mod ticket;

pub use history::{CommEntry, PriceEntry, UNATTRIBUTED};
pub use ticket::{Channels, Costs, Device, Priority, Status, Ticket, Transition};
