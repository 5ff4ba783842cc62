pub mod auth;
pub mod debt;
pub mod deposits;
pub mod health;
pub mod items;
pub mod members;
pub mod opname;
pub mod reports;
pub mod sales;
pub mod shu;
