//! SHU (sisa hasil usaha) distribution model and split calculator.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Fixed-percentage split of a distributable amount: 60% member share,
/// 10% reserve, 30% cooperative fund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShuShares {
    pub share_60: Decimal,
    pub share_10: Decimal,
    pub share_30: Decimal,
}

impl ShuShares {
    /// Split `total` into the three shares, exact to the cent. The two
    /// smaller shares are truncated at two decimals and the rounding
    /// remainder goes to the 60% share, so the shares always sum back
    /// to `total` with no drift.
    pub fn split(total: Decimal) -> Self {
        let pct_10 = Decimal::new(10, 2);
        let pct_30 = Decimal::new(30, 2);

        let share_10 =
            (total * pct_10).round_dp_with_strategy(2, RoundingStrategy::ToZero);
        let share_30 =
            (total * pct_30).round_dp_with_strategy(2, RoundingStrategy::ToZero);
        let share_60 = total - share_10 - share_30;

        Self {
            share_60,
            share_10,
            share_30,
        }
    }

    pub fn total(&self) -> Decimal {
        self.share_60 + self.share_10 + self.share_30
    }
}

/// One distribution row per member per year. Insert-only: re-running a
/// distribution for the same member and year is a conflict, enforced by
/// a unique constraint on (member_id, year).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ShuDistribution {
    pub distribution_id: Uuid,
    pub member_id: Uuid,
    pub year: i32,
    pub share_60: Decimal,
    pub share_10: Decimal,
    pub share_30: Decimal,
    pub total_shu: Decimal,
    pub created_utc: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn split_sums_back_exactly() {
        for total in [
            dec!(100000),
            dec!(0.01),
            dec!(0.02),
            dec!(1),
            dec!(999999.99),
            dec!(123456.78),
            dec!(0),
        ] {
            let shares = ShuShares::split(total);
            assert_eq!(shares.total(), total, "drift for total {}", total);
        }
    }

    #[test]
    fn clean_amount_splits_to_exact_percentages() {
        let shares = ShuShares::split(dec!(100000));
        assert_eq!(shares.share_60, dec!(60000));
        assert_eq!(shares.share_10, dec!(10000));
        assert_eq!(shares.share_30, dec!(30000));
    }

    #[test]
    fn rounding_remainder_goes_to_largest_share() {
        // 0.01 * 10% and 30% both truncate to zero; the whole cent
        // lands in the 60% share.
        let shares = ShuShares::split(dec!(0.01));
        assert_eq!(shares.share_10, dec!(0));
        assert_eq!(shares.share_30, dec!(0));
        assert_eq!(shares.share_60, dec!(0.01));
    }

    #[test]
    fn awkward_amount_keeps_cent_accuracy() {
        let shares = ShuShares::split(dec!(33333.33));
        assert_eq!(shares.total(), dec!(33333.33));
        // Smaller shares never exceed their exact percentage.
        assert!(shares.share_10 <= dec!(3333.333));
        assert!(shares.share_30 <= dec!(9999.999));
        // The 60% share absorbs the remainder, so it is at least its
        // exact percentage.
        assert!(shares.share_60 >= dec!(19999.998));
    }
}
