//! Member (anggota) model and the balance/debt invariant checker.
//!
//! The guard methods here are pure. The database layer re-invokes them
//! on a row-locked snapshot at commit time - a guard result from an
//! earlier read is never trusted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Member row. Saldo, hutang and shu are mutated only by the ledger
/// posting operations in the database service; members are deactivated,
/// never deleted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Member {
    pub member_id: Uuid,
    pub user_id: Option<Uuid>,
    pub member_number: String,
    pub saldo: Decimal,
    pub hutang: Decimal,
    pub shu: Decimal,
    pub active: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Member {
    /// A hutang-financed purchase must fit inside the configured limit.
    pub fn can_afford_hutang(&self, debt_limit: Decimal, amount: Decimal) -> bool {
        self.hutang + amount <= debt_limit
    }

    pub fn can_afford_saldo(&self, amount: Decimal) -> bool {
        self.saldo >= amount
    }

    pub fn can_reduce_debt(&self, amount: Decimal) -> bool {
        amount <= self.hutang
    }

    pub fn can_reduce_shu(&self, amount: Decimal) -> bool {
        amount <= self.shu
    }
}

/// Input for creating a member.
#[derive(Debug, Clone)]
pub struct CreateMember {
    pub user_id: Option<Uuid>,
    pub member_number: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn member(saldo: Decimal, hutang: Decimal, shu: Decimal) -> Member {
        Member {
            member_id: Uuid::new_v4(),
            user_id: None,
            member_number: "A-001".to_string(),
            saldo,
            hutang,
            shu,
            active: true,
            created_utc: Utc::now(),
            updated_utc: Utc::now(),
        }
    }

    #[test]
    fn hutang_headroom_is_limit_minus_current_debt() {
        let m = member(dec!(0), dec!(600), dec!(0));
        assert!(m.can_afford_hutang(dec!(1000), dec!(400)));
        assert!(!m.can_afford_hutang(dec!(1000), dec!(401)));
    }

    #[test]
    fn hutang_headroom_exact_boundary_is_allowed() {
        let m = member(dec!(0), dec!(0), dec!(0));
        assert!(m.can_afford_hutang(dec!(1000), dec!(1000)));
        assert!(!m.can_afford_hutang(dec!(1000), dec!(1000.01)));
    }

    #[test]
    fn saldo_guard() {
        let m = member(dec!(2000), dec!(0), dec!(0));
        assert!(m.can_afford_saldo(dec!(2000)));
        assert!(!m.can_afford_saldo(dec!(2000.01)));
    }

    #[test]
    fn debt_reduction_cannot_exceed_outstanding_hutang() {
        let m = member(dec!(0), dec!(1000), dec!(0));
        assert!(m.can_reduce_debt(dec!(1000)));
        assert!(!m.can_reduce_debt(dec!(1000.01)));
    }

    #[test]
    fn shu_reduction_cannot_exceed_accrued_shu() {
        let m = member(dec!(0), dec!(0), dec!(5000));
        assert!(m.can_reduce_shu(dec!(3000)));
        assert!(!m.can_reduce_shu(dec!(6000)));
    }
}
