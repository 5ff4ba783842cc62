//! Debt payment (pembayaran hutang) model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebtPaymentStatus {
    Pending,
    Approved,
    Rejected,
}

impl DebtPaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebtPaymentStatus::Pending => "pending",
            DebtPaymentStatus::Approved => "approved",
            DebtPaymentStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(DebtPaymentStatus::Pending),
            "approved" => Some(DebtPaymentStatus::Approved),
            "rejected" => Some(DebtPaymentStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DebtPaymentStatus::Approved | DebtPaymentStatus::Rejected)
    }

    pub fn can_transition_to(&self, next: DebtPaymentStatus) -> bool {
        matches!(
            (self, next),
            (
                DebtPaymentStatus::Pending,
                DebtPaymentStatus::Approved | DebtPaymentStatus::Rejected
            )
        )
    }
}

/// How the member settles the debt: cash handed to the cashier, or a
/// deduction from their prepaid saldo. Saldo-sourced payments verify
/// `can_afford_saldo` under the member row lock at approval time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebtSource {
    Cash,
    Saldo,
}

impl DebtSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebtSource::Cash => "cash",
            DebtSource::Saldo => "saldo",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(DebtSource::Cash),
            "saldo" => Some(DebtSource::Saldo),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DebtPayment {
    pub payment_id: Uuid,
    pub member_id: Uuid,
    pub nominal: Decimal,
    pub source: String,
    pub status: String,
    pub requested_utc: DateTime<Utc>,
    pub resolved_utc: Option<DateTime<Utc>>,
    pub resolved_by: Option<Uuid>,
}

impl DebtPayment {
    pub fn parsed_status(&self) -> Option<DebtPaymentStatus> {
        DebtPaymentStatus::parse(&self.status)
    }

    pub fn parsed_source(&self) -> Option<DebtSource> {
        DebtSource::parse(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_resolves_either_way() {
        let s = DebtPaymentStatus::Pending;
        assert!(s.can_transition_to(DebtPaymentStatus::Approved));
        assert!(s.can_transition_to(DebtPaymentStatus::Rejected));
    }

    #[test]
    fn resolved_payments_are_terminal() {
        for terminal in [DebtPaymentStatus::Approved, DebtPaymentStatus::Rejected] {
            assert!(terminal.is_terminal());
            assert!(!terminal.can_transition_to(DebtPaymentStatus::Pending));
            assert!(!terminal.can_transition_to(DebtPaymentStatus::Approved));
            assert!(!terminal.can_transition_to(DebtPaymentStatus::Rejected));
        }
    }

    #[test]
    fn unknown_source_is_rejected() {
        assert_eq!(DebtSource::parse("transfer"), None);
    }
}
