use crate::error::TicketError;
use crate::model::history::{CommEntry, PriceEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The six lifecycle statuses of a repair ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Received,
    Diagnosed,
    InRepair,
    ReadyForPickup,
    Delivered,
    Cancelled,
}

/// Outcome of a successful transition check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Move to the target status and refresh `updated_at`.
    Apply,
    /// Target equals the current status; succeed without touching the row.
    /// Matters for retried client requests.
    NoOp,
}

impl Status {
    pub const ALL: [Self; 6] = [
        Self::Received,
        Self::Diagnosed,
        Self::InRepair,
        Self::ReadyForPickup,
        Self::Delivered,
        Self::Cancelled,
    ];

    const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Diagnosed => "diagnosed",
            Self::InRepair => "in_repair",
            Self::ReadyForPickup => "ready_for_pickup",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Delivered and cancelled tickets accept no further cost or status
    /// mutation.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Validate a transition from `self` to `target`.
    ///
    /// Valid transitions:
    /// - `received -> diagnosed`
    /// - `diagnosed -> in_repair`
    /// - `in_repair -> ready_for_pickup`
    /// - `ready_for_pickup -> delivered`
    /// - any non-terminal status `-> cancelled`
    ///
    /// A transition to the current status is an idempotent no-op success.
    /// The terminal check runs first, so `delivered -> delivered` is still
    /// rejected with `TerminalState`.
    pub fn can_transition_to(self, target: Self) -> Result<Transition, TicketError> {
        if self.is_terminal() {
            return Err(TicketError::TerminalState { status: self });
        }

        if self == target {
            return Ok(Transition::NoOp);
        }

        let allowed = matches!(
            (self, target),
            (Self::Received, Self::Diagnosed)
                | (Self::Diagnosed, Self::InRepair)
                | (Self::InRepair, Self::ReadyForPickup)
                | (Self::ReadyForPickup, Self::Delivered)
                | (
                    Self::Received | Self::Diagnosed | Self::InRepair | Self::ReadyForPickup,
                    Self::Cancelled,
                )
        );

        if allowed {
            Ok(Transition::Apply)
        } else {
            Err(TicketError::InvalidTransition {
                from: self,
                to: target,
            })
        }
    }
}

/// Advisory priority, independent of status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// The delivery channels a customer-facing message was sent through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Channels {
    #[serde(default)]
    pub whatsapp: bool,
    #[serde(default)]
    pub email: bool,
}

impl Channels {
    #[must_use]
    pub const fn none() -> Self {
        Self {
            whatsapp: false,
            email: false,
        }
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        !self.whatsapp && !self.email
    }
}

impl fmt::Display for Channels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.whatsapp, self.email) {
            (true, true) => f.write_str("whatsapp,email"),
            (true, false) => f.write_str("whatsapp"),
            (false, true) => f.write_str("email"),
            (false, false) => f.write_str("none"),
        }
    }
}

/// Free-form description of the device under repair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Device {
    pub device_type: String,
    pub brand: String,
    pub model: String,
}

/// Cost components in cents. `total_cost` is derived, never caller-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Costs {
    pub repair_cost: i64,
    pub parts_cost: i64,
    pub labor_cost: i64,
    pub total_cost: i64,
}

impl Costs {
    /// Build a cost record, rejecting negative components and deriving the
    /// total.
    pub fn new(repair_cost: i64, parts_cost: i64, labor_cost: i64) -> Result<Self, TicketError> {
        if repair_cost < 0 {
            return Err(TicketError::InvalidCost {
                field: "repair_cost",
                value: repair_cost,
            });
        }
        if parts_cost < 0 {
            return Err(TicketError::InvalidCost {
                field: "parts_cost",
                value: parts_cost,
            });
        }
        if labor_cost < 0 {
            return Err(TicketError::InvalidCost {
                field: "labor_cost",
                value: labor_cost,
            });
        }

        Ok(Self {
            repair_cost,
            parts_cost,
            labor_cost,
            total_cost: repair_cost + parts_cost + labor_cost,
        })
    }
}

/// The aggregate root: one repair work order for one customer's device.
///
/// `price_history` and `updates` are append-only; entries are never edited
/// or reordered after insertion. `version` backs the store's optimistic
/// concurrency check and is owned by the storage layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub ticket_number: String,
    pub customer_id: String,
    pub device: Device,
    pub issue_description: String,
    pub diagnosis: Option<String>,
    pub technician: Option<String>,
    pub notes: Option<String>,
    pub status: Status,
    pub priority: Priority,
    pub costs: Costs,
    pub price_history: Vec<PriceEntry>,
    pub updates: Vec<CommEntry>,
    pub estimated_completion: Option<DateTime<Utc>>,
    pub warranty_days: Option<u32>,
    pub received_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl Ticket {
    /// Total recorded by the most recent ledger entry, if any.
    #[must_use]
    pub fn last_recorded_total(&self) -> Option<i64> {
        self.price_history.last().map(|entry| entry.total_cost)
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase()
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "received" => Ok(Self::Received),
            "diagnosed" => Ok(Self::Diagnosed),
            "in_repair" | "in-repair" => Ok(Self::InRepair),
            "ready_for_pickup" | "ready-for-pickup" | "ready" => Ok(Self::ReadyForPickup),
            "delivered" => Ok(Self::Delivered),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParseEnumError {
                expected: "priority",
                got: s.to_string(),
            }),
        }
    }
}
