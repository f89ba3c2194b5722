use crate::model::ticket::Channels;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Attribution recorded when the calling layer supplied no actor.
///
/// Missing attribution is a recorded fact, not an error; the authorization
/// layer owns actor identity and the ledger only stores what it is given.
pub const UNATTRIBUTED: &str = "unattributed";

/// One immutable snapshot of the cost fields, recorded when the derived
/// total actually changed (dedup-on-unchanged-total).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub repair_cost: i64,
    pub parts_cost: i64,
    pub labor_cost: i64,
    pub total_cost: i64,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
}

/// One customer-facing message recorded against a ticket.
///
/// Recording is intent, not confirmed delivery; the notifier reports its
/// outcome separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommEntry {
    pub message: String,
    pub sent_at: DateTime<Utc>,
    pub via: Channels,
}

#[cfg(test)]
mod tests {
    use super::{PriceEntry, UNATTRIBUTED};
    use chrono::Utc;

    #[test]
    fn price_entry_json_shape_is_stable() {
        let entry = PriceEntry {
            repair_cost: 500,
            parts_cost: 200,
            labor_cost: 100,
            total_cost: 800,
            updated_at: Utc::now(),
            updated_by: UNATTRIBUTED.to_string(),
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["total_cost"], 800);
        assert_eq!(json["updated_by"], UNATTRIBUTED);
        assert!(json.get("updated_at").is_some());
    }
}
