pub mod database;
pub mod error;
pub mod jwt;
pub mod metrics;

pub use database::Database;
pub use error::PostingError;
pub use jwt::{JwtService, TokenClaims};
pub use metrics::{get_metrics, init_metrics};
