use crate::model::Status;
use thiserror::Error;

/// Typed failures for every ticket operation.
///
/// Validation variants (`InvalidCost`, `EmptyMessage`, `Validation`) are
/// caller mistakes and are never retried. `ConcurrencyConflict` and
/// `DuplicateTicket` are transient and retried internally by the store
/// before they ever reach a caller. `TerminalState` and `InvalidTransition`
/// are business-rule violations and surface immediately.
#[derive(Debug, Error)]
pub enum TicketError {
    #[error("cost component '{field}' is negative ({value})")]
    InvalidCost { field: &'static str, value: i64 },

    #[error("ticket is {status} and can no longer be modified")]
    TerminalState { status: Status },

    #[error("cannot move ticket from {from} to {to}")]
    InvalidTransition { from: Status, to: Status },

    #[error("ticket number '{ticket_number}' already exists")]
    DuplicateTicket { ticket_number: String },

    #[error("communication log message must not be blank")]
    EmptyMessage,

    #[error("invalid lookup criteria: {detail}")]
    Validation { detail: String },

    #[error("no ticket found for '{key}'")]
    NotFound { key: String },

    #[error("ticket '{ticket_id}' was modified concurrently")]
    ConcurrencyConflict { ticket_id: String },

    #[error("storage failure: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl TicketError {
    /// The stable machine code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidCost { .. } => ErrorCode::InvalidCost,
            Self::TerminalState { .. } => ErrorCode::TerminalState,
            Self::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            Self::DuplicateTicket { .. } => ErrorCode::DuplicateTicket,
            Self::EmptyMessage => ErrorCode::EmptyMessage,
            Self::Validation { .. } => ErrorCode::Validation,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::ConcurrencyConflict { .. } => ErrorCode::ConcurrencyConflict,
            Self::Storage(_) => ErrorCode::Storage,
        }
    }

    /// Whether the store's mutation loop may retry after this error.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConcurrencyConflict { .. } | Self::DuplicateTicket { .. }
        )
    }
}

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidCost,
    TerminalState,
    InvalidTransition,
    DuplicateTicket,
    EmptyMessage,
    Validation,
    NotFound,
    ConcurrencyConflict,
    Storage,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidCost => "E2001",
            Self::TerminalState => "E2002",
            Self::InvalidTransition => "E2003",
            Self::DuplicateTicket => "E2004",
            Self::EmptyMessage => "E2005",
            Self::Validation => "E2006",
            Self::NotFound => "E2007",
            Self::ConcurrencyConflict => "E5001",
            Self::Storage => "E5002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidCost => "Negative cost component",
            Self::TerminalState => "Ticket is in a terminal status",
            Self::InvalidTransition => "Invalid status transition",
            Self::DuplicateTicket => "Ticket number collision",
            Self::EmptyMessage => "Blank communication log message",
            Self::Validation => "Malformed lookup criteria",
            Self::NotFound => "Ticket not found",
            Self::ConcurrencyConflict => "Concurrent modification",
            Self::Storage => "Storage failure",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InvalidCost => Some("Cost components must be zero or positive, in cents."),
            Self::TerminalState => {
                Some("Delivered and cancelled tickets are frozen; open a new ticket instead.")
            }
            Self::InvalidTransition => Some(
                "Follow the lifecycle: received -> diagnosed -> in_repair -> ready_for_pickup -> delivered.",
            ),
            Self::DuplicateTicket => None,
            Self::EmptyMessage => Some("Provide a non-empty message before logging an update."),
            Self::Validation => Some("Phone lookups need at least 10 digits; emails must be well-formed."),
            Self::NotFound => None,
            Self::ConcurrencyConflict => Some("Reload the ticket and retry the change."),
            Self::Storage => Some("Check the database file and its permissions."),
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
