use serde::{Deserialize, Serialize};

/// Lifecycle status of an invoice.
///
/// The transition table below is advisory: the `mark_as_*` mutators on
/// [`Invoice`](super::Invoice) write status unconditionally, while
/// [`Invoice::try_transition`](super::Invoice::try_transition) consults it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Due,
    Processing,
    RequiresAuth,
    Failed,
    Succeeded,
    Disputed,
    Cancelled,
    Abandoned,
    Refunded,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 10] = [
        InvoiceStatus::Draft,
        InvoiceStatus::Due,
        InvoiceStatus::Processing,
        InvoiceStatus::RequiresAuth,
        InvoiceStatus::Failed,
        InvoiceStatus::Succeeded,
        InvoiceStatus::Disputed,
        InvoiceStatus::Cancelled,
        InvoiceStatus::Abandoned,
        InvoiceStatus::Refunded,
    ];

    /// Statuses reachable in one step from `self`.
    pub fn allowed_transitions(&self) -> &'static [InvoiceStatus] {
        use InvoiceStatus::*;

        match self {
            Draft => &[Due, Succeeded, Cancelled],
            Due => &[Processing, Succeeded, Cancelled, Failed],
            Processing => &[Succeeded, Failed, RequiresAuth],
            Failed => &[Due, Processing, Abandoned, Cancelled],
            RequiresAuth => &[Succeeded, Failed],
            Succeeded => &[Disputed, Refunded],
            Disputed | Cancelled | Abandoned | Refunded => &[],
        }
    }

    pub fn can_transition_to(&self, target: InvoiceStatus) -> bool {
        self.allowed_transitions().contains(&target)
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Due => "due",
            InvoiceStatus::Processing => "processing",
            InvoiceStatus::RequiresAuth => "requires_auth",
            InvoiceStatus::Failed => "failed",
            InvoiceStatus::Succeeded => "succeeded",
            InvoiceStatus::Disputed => "disputed",
            InvoiceStatus::Cancelled => "cancelled",
            InvoiceStatus::Abandoned => "abandoned",
            InvoiceStatus::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(InvoiceStatus::Draft),
            "due" => Ok(InvoiceStatus::Due),
            "processing" => Ok(InvoiceStatus::Processing),
            "requires_auth" | "requires_action" => Ok(InvoiceStatus::RequiresAuth),
            "failed" => Ok(InvoiceStatus::Failed),
            "succeeded" | "paid" => Ok(InvoiceStatus::Succeeded),
            "disputed" => Ok(InvoiceStatus::Disputed),
            "cancelled" | "canceled" => Ok(InvoiceStatus::Cancelled),
            "abandoned" => Ok(InvoiceStatus::Abandoned),
            "refunded" => Ok(InvoiceStatus::Refunded),
            _ => Err(format!("Unknown invoice status: {}", s)),
        }
    }
}
