//! Cost ledger: derives `total_cost` and decides when a price-history entry
//! is owed.
//!
//! The logic is a pure function over `(old costs, last recorded total,
//! delta)` so it can be exercised without a database and so the store can
//! call it inside its write transaction. The append rule is
//! dedup-on-unchanged-total: every actual price change is recorded with
//! who/when, while repeated saves with an unchanged total stay silent.

use crate::error::TicketError;
use crate::model::{Costs, PriceEntry, UNATTRIBUTED};
use chrono::{DateTime, Utc};

/// A partial cost edit. Absent components retain their prior value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CostDelta {
    pub repair_cost: Option<i64>,
    pub parts_cost: Option<i64>,
    pub labor_cost: Option<i64>,
}

impl CostDelta {
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.repair_cost.is_none() && self.parts_cost.is_none() && self.labor_cost.is_none()
    }
}

/// Merge a delta into the current costs and decide whether a ledger entry
/// must be appended.
///
/// `last_recorded_total` is the total of the most recent `PriceEntry`, or
/// `None` when the history is empty. An entry is owed when the history is
/// empty or the newly derived total differs from the last recorded one.
///
/// Ticket creation does not go through this function: the first save sets
/// the cost fields directly and records nothing, because there is no prior
/// total to compare against.
///
/// # Errors
///
/// `InvalidCost` when any provided component is negative. The caller's
/// costs are untouched on error.
pub fn apply_cost_update(
    current: &Costs,
    last_recorded_total: Option<i64>,
    delta: &CostDelta,
    actor: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(Costs, Option<PriceEntry>), TicketError> {
    let merged = Costs::new(
        delta.repair_cost.unwrap_or(current.repair_cost),
        delta.parts_cost.unwrap_or(current.parts_cost),
        delta.labor_cost.unwrap_or(current.labor_cost),
    )?;

    let append = match last_recorded_total {
        None => true,
        Some(total) => total != merged.total_cost,
    };

    let entry = append.then(|| PriceEntry {
        repair_cost: merged.repair_cost,
        parts_cost: merged.parts_cost,
        labor_cost: merged.labor_cost,
        total_cost: merged.total_cost,
        updated_at: now,
        updated_by: actor.unwrap_or(UNATTRIBUTED).to_string(),
    });

    Ok((merged, entry))
}
