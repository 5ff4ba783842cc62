//! Cashier deposit (setoran kasir) model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepositStatus {
    Pending,
    Approved,
}

impl DepositStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DepositStatus::Pending => "pending",
            DepositStatus::Approved => "approved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(DepositStatus::Pending),
            "approved" => Some(DepositStatus::Approved),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, next: DepositStatus) -> bool {
        matches!((self, next), (DepositStatus::Pending, DepositStatus::Approved))
    }
}

/// Cash handover from a cashier to the admin. Approval is bookkeeping
/// only - no further monetary side effect.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CashierDeposit {
    pub deposit_id: Uuid,
    pub kasir_id: Uuid,
    pub nominal: Decimal,
    pub status: String,
    pub submitted_utc: DateTime<Utc>,
    pub approved_utc: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
}

impl CashierDeposit {
    pub fn parsed_status(&self) -> Option<DepositStatus> {
        DepositStatus::parse(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_is_the_only_transition() {
        assert!(DepositStatus::Pending.can_transition_to(DepositStatus::Approved));
        assert!(!DepositStatus::Approved.can_transition_to(DepositStatus::Pending));
        assert!(!DepositStatus::Approved.can_transition_to(DepositStatus::Approved));
    }
}
