//! Stock reconciliation handoff (opname) model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpnameStatus {
    Pending,
    Approved,
    Rejected,
}

impl OpnameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpnameStatus::Pending => "pending",
            OpnameStatus::Approved => "approved",
            OpnameStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OpnameStatus::Pending),
            "approved" => Some(OpnameStatus::Approved),
            "rejected" => Some(OpnameStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OpnameStatus::Approved | OpnameStatus::Rejected)
    }

    pub fn can_transition_to(&self, next: OpnameStatus) -> bool {
        matches!(
            (self, next),
            (OpnameStatus::Pending, OpnameStatus::Approved | OpnameStatus::Rejected)
        )
    }
}

/// Physical count handoff for one item. Approval sets the item's stock
/// to `counted_stock` in the same database transaction; rejection
/// requires a reason and signals the submitter to redo the count.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct StockOpname {
    pub opname_id: Uuid,
    pub item_id: Uuid,
    pub counted_stock: i32,
    pub submitted_by: Uuid,
    pub status: String,
    pub rejection_reason: Option<String>,
    pub submitted_utc: DateTime<Utc>,
    pub resolved_utc: Option<DateTime<Utc>>,
    pub resolved_by: Option<Uuid>,
}

impl StockOpname {
    pub fn parsed_status(&self) -> Option<OpnameStatus> {
        OpnameStatus::parse(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_resolves_either_way() {
        assert!(OpnameStatus::Pending.can_transition_to(OpnameStatus::Approved));
        assert!(OpnameStatus::Pending.can_transition_to(OpnameStatus::Rejected));
    }

    #[test]
    fn resolved_opnames_are_terminal() {
        for terminal in [OpnameStatus::Approved, OpnameStatus::Rejected] {
            assert!(terminal.is_terminal());
            assert!(!terminal.can_transition_to(OpnameStatus::Pending));
        }
    }
}
