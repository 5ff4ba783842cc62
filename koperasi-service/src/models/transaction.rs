//! Sale transaction (transaksi) model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Payment method. Closed set; unknown strings are a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Qr,
    Ewallet,
    Transfer,
    Hutang,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Qr => "qr",
            PaymentMethod::Ewallet => "ewallet",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Hutang => "hutang",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(PaymentMethod::Cash),
            "qr" => Some(PaymentMethod::Qr),
            "ewallet" => Some(PaymentMethod::Ewallet),
            "transfer" => Some(PaymentMethod::Transfer),
            "hutang" => Some(PaymentMethod::Hutang),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transaction status. `Selesai` and `Dibatalkan` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Selesai,
    Dibatalkan,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Selesai => "selesai",
            TransactionStatus::Dibatalkan => "dibatalkan",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TransactionStatus::Pending),
            "selesai" => Some(TransactionStatus::Selesai),
            "dibatalkan" => Some(TransactionStatus::Dibatalkan),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Selesai | TransactionStatus::Dibatalkan)
    }

    /// Legal transitions: pending -> selesai | dibatalkan. The database
    /// enforces the same rule with a status-guarded UPDATE.
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        matches!(
            (self, next),
            (
                TransactionStatus::Pending,
                TransactionStatus::Selesai | TransactionStatus::Dibatalkan
            )
        )
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transaction row. `member_id` is NULL for walk-in cash sales;
/// `kasir_id` is set when a cashier posts or settles the sale.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: Uuid,
    pub member_id: Option<Uuid>,
    pub kasir_id: Option<Uuid>,
    pub total_price: Decimal,
    pub total_profit: Decimal,
    pub payment_method: String,
    pub status: String,
    pub created_utc: DateTime<Utc>,
    pub settled_utc: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn parsed_status(&self) -> Option<TransactionStatus> {
        TransactionStatus::parse(&self.status)
    }

    pub fn parsed_payment_method(&self) -> Option<PaymentMethod> {
        PaymentMethod::parse(&self.payment_method)
    }
}

/// Line row with price and cost snapshots taken at posting time, so
/// later item edits never change historical totals.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TransactionLine {
    pub line_id: Uuid,
    pub transaction_id: Uuid,
    pub item_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub unit_cost: Decimal,
    pub subtotal: Decimal,
    pub profit: Decimal,
}

/// One requested line of a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLine {
    pub item_id: Uuid,
    pub quantity: i32,
}

/// Input for posting a sale.
#[derive(Debug, Clone)]
pub struct PostSale {
    pub member_id: Option<Uuid>,
    /// Set for cashier-posted direct sales; those start out `selesai`.
    pub kasir_id: Option<Uuid>,
    pub lines: Vec<SaleLine>,
    pub payment_method: PaymentMethod,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_method_round_trips() {
        for method in [
            PaymentMethod::Cash,
            PaymentMethod::Qr,
            PaymentMethod::Ewallet,
            PaymentMethod::Transfer,
            PaymentMethod::Hutang,
        ] {
            assert_eq!(PaymentMethod::parse(method.as_str()), Some(method));
        }
        assert_eq!(PaymentMethod::parse("credit"), None);
    }

    #[test]
    fn pending_transitions_to_both_terminals() {
        let s = TransactionStatus::Pending;
        assert!(s.can_transition_to(TransactionStatus::Selesai));
        assert!(s.can_transition_to(TransactionStatus::Dibatalkan));
    }

    #[test]
    fn terminal_states_admit_no_transition() {
        for terminal in [TransactionStatus::Selesai, TransactionStatus::Dibatalkan] {
            assert!(terminal.is_terminal());
            for next in [
                TransactionStatus::Pending,
                TransactionStatus::Selesai,
                TransactionStatus::Dibatalkan,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn pending_cannot_transition_to_itself() {
        assert!(!TransactionStatus::Pending.can_transition_to(TransactionStatus::Pending));
    }
}
