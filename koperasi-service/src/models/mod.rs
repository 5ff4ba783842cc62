//! Domain models for the koperasi service.

pub mod debt;
pub mod deposit;
pub mod item;
pub mod member;
pub mod opname;
pub mod shu;
pub mod transaction;
pub mod user;

pub use debt::{DebtPayment, DebtPaymentStatus, DebtSource};
pub use deposit::{CashierDeposit, DepositStatus};
pub use item::{CreateItem, Item, UpdateItem};
pub use member::{CreateMember, Member};
pub use opname::{OpnameStatus, StockOpname};
pub use shu::{ShuDistribution, ShuShares};
pub use transaction::{
    PaymentMethod, PostSale, SaleLine, Transaction, TransactionLine, TransactionStatus,
};
pub use user::{Role, User};
