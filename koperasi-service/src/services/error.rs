//! Error kinds for ledger posting operations.
//!
//! Business rule violations carry a specific kind so callers branch on
//! the variant, never on message text. Every violation aborts the whole
//! database transaction; nothing is ever partially applied.

use koperasi_core::error::AppError;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PostingError {
    #[error("insufficient stock for item '{name}': requested {requested}, available {available}")]
    OutOfStock {
        name: String,
        requested: i32,
        available: i32,
    },

    #[error("insufficient saldo: required {required}, available {available}")]
    InsufficientBalance {
        required: Decimal,
        available: Decimal,
    },

    #[error("insufficient debt headroom: required {required}, headroom {headroom}")]
    InsufficientDebtHeadroom {
        required: Decimal,
        headroom: Decimal,
    },

    #[error("payment nominal {nominal} exceeds outstanding hutang {hutang}")]
    InsufficientDebt { nominal: Decimal, hutang: Decimal },

    #[error("topup nominal {nominal} exceeds accrued shu {shu}")]
    InsufficientShu { nominal: Decimal, shu: Decimal },

    /// The entity was already moved out of the expected state by a
    /// concurrent caller. Reported distinctly from validation errors so
    /// the caller can refresh and retry.
    #[error("{entity} already processed")]
    AlreadyProcessed { entity: &'static str },

    #[error("duplicate {entity}")]
    Duplicate { entity: &'static str },

    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("database error: {0}")]
    Database(anyhow::Error),
}

impl From<sqlx::Error> for PostingError {
    fn from(err: sqlx::Error) -> Self {
        PostingError::Database(anyhow::Error::new(err))
    }
}

impl From<PostingError> for AppError {
    fn from(err: PostingError) -> Self {
        match err {
            PostingError::OutOfStock { .. }
            | PostingError::InsufficientBalance { .. }
            | PostingError::InsufficientDebtHeadroom { .. }
            | PostingError::InsufficientDebt { .. }
            | PostingError::InsufficientShu { .. } => {
                AppError::BadRequest(anyhow::anyhow!("{}", err))
            }
            PostingError::AlreadyProcessed { .. } | PostingError::Duplicate { .. } => {
                AppError::Conflict(anyhow::anyhow!("{}", err))
            }
            PostingError::NotFound { .. } => AppError::NotFound(anyhow::anyhow!("{}", err)),
            PostingError::ValidationFailed(msg) => {
                AppError::UnprocessableEntity(anyhow::anyhow!("validation failed: {}", msg))
            }
            PostingError::Database(e) => AppError::DatabaseError(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn violation_messages_name_the_precondition() {
        let err = PostingError::OutOfStock {
            name: "Gula 1kg".to_string(),
            requested: 5,
            available: 2,
        };
        assert!(err.to_string().contains("Gula 1kg"));
        assert!(err.to_string().contains("requested 5"));

        let err = PostingError::InsufficientDebtHeadroom {
            required: dec!(500),
            headroom: dec!(100),
        };
        assert!(err.to_string().contains("headroom 100"));
    }

    #[test]
    fn conflict_kinds_map_to_conflict() {
        let app: AppError = PostingError::AlreadyProcessed {
            entity: "transaction",
        }
        .into();
        assert!(matches!(app, AppError::Conflict(_)));
    }
}
