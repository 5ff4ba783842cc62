//! Database service for koperasi-service.
//!
//! All balance, stock and status mutations go through here. Every
//! multi-row mutation runs inside a single database transaction with
//! row-level locks on each row it reads then writes; either all rows
//! change consistently or none do.

use crate::models::{
    CashierDeposit, CreateItem, CreateMember, DebtPayment, DebtPaymentStatus, DebtSource,
    DepositStatus, Item, Member, OpnameStatus, PostSale, ShuDistribution, ShuShares, StockOpname,
    Transaction, TransactionLine, TransactionStatus, UpdateItem, User,
};
use crate::services::error::PostingError;
use crate::services::metrics::DB_QUERY_DURATION;
use chrono::{DateTime, Utc};
use koperasi_core::error::AppError;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{FromRow, Postgres, Transaction as SqlxTransaction};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

const MEMBER_COLUMNS: &str =
    "member_id, user_id, member_number, saldo, hutang, shu, active, created_utc, updated_utc";
const ITEM_COLUMNS: &str =
    "item_id, name, stock, cost_price, sale_price, active, created_utc, updated_utc";
const TRANSACTION_COLUMNS: &str = "transaction_id, member_id, kasir_id, total_price, total_profit, payment_method, status, created_utc, settled_utc";
const LINE_COLUMNS: &str =
    "line_id, transaction_id, item_id, quantity, unit_price, unit_cost, subtotal, profit";
const DEBT_PAYMENT_COLUMNS: &str =
    "payment_id, member_id, nominal, source, status, requested_utc, resolved_utc, resolved_by";
const DEPOSIT_COLUMNS: &str =
    "deposit_id, kasir_id, nominal, status, submitted_utc, approved_utc, approved_by";
const OPNAME_COLUMNS: &str = "opname_id, item_id, counted_stock, submitted_by, status, rejection_reason, submitted_utc, resolved_utc, resolved_by";
const SHU_COLUMNS: &str =
    "distribution_id, member_id, year, share_60, share_10, share_30, total_shu, created_utc";

/// Aggregate figures for the admin report endpoint.
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct SalesSummary {
    pub transaction_count: i64,
    pub total_revenue: Decimal,
    pub total_profit: Decimal,
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "koperasi-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // User Operations
    // -------------------------------------------------------------------------

    /// Create a user account.
    #[instrument(skip(self, password_hash), fields(username = %username, role = %role))]
    pub async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        role: &str,
        full_name: &str,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (user_id, username, password_hash, role, full_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING user_id, username, password_hash, role, full_name, active, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(password_hash)
        .bind(role)
        .bind(full_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Username '{}' already exists", username))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create user: {}", e)),
        })?;

        info!(user_id = %user.user_id, "User created");

        Ok(user)
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT user_id, username, password_hash, role, full_name, active, created_utc FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get user: {}", e)))?;

        Ok(user)
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT user_id, username, password_hash, role, full_name, active, created_utc FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get user: {}", e)))?;

        Ok(user)
    }

    // -------------------------------------------------------------------------
    // Member Operations
    // -------------------------------------------------------------------------

    /// Create a member. Saldo, hutang and shu start at zero and are
    /// mutated only by the posting operations below.
    #[instrument(skip(self, input), fields(member_number = %input.member_number))]
    pub async fn create_member(&self, input: &CreateMember) -> Result<Member, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_member"])
            .start_timer();

        let member = sqlx::query_as::<_, Member>(&format!(
            r#"
            INSERT INTO members (member_id, user_id, member_number)
            VALUES ($1, $2, $3)
            RETURNING {MEMBER_COLUMNS}
            "#,
        ))
        .bind(Uuid::new_v4())
        .bind(input.user_id)
        .bind(&input.member_number)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "Member number '{}' already exists",
                    input.member_number
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create member: {}", e)),
        })?;

        timer.observe_duration();

        info!(member_id = %member.member_id, "Member created");

        Ok(member)
    }

    pub async fn get_member(&self, member_id: Uuid) -> Result<Option<Member>, AppError> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE member_id = $1"
        ))
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get member: {}", e)))?;

        Ok(member)
    }

    /// Resolve the member row owned by an authenticated user. Member
    /// scoped operations go through this instead of trusting a client
    /// supplied member id.
    pub async fn get_member_by_user(&self, user_id: Uuid) -> Result<Option<Member>, AppError> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get member: {}", e)))?;

        Ok(member)
    }

    pub async fn list_members(
        &self,
        page_size: i32,
        page_token: Option<Uuid>,
    ) -> Result<Vec<Member>, AppError> {
        let limit = page_size.clamp(1, 100) as i64;

        let members = if let Some(cursor) = page_token {
            sqlx::query_as::<_, Member>(&format!(
                "SELECT {MEMBER_COLUMNS} FROM members WHERE member_id > $1 ORDER BY member_id LIMIT $2"
            ))
            .bind(cursor)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, Member>(&format!(
                "SELECT {MEMBER_COLUMNS} FROM members ORDER BY member_id LIMIT $1"
            ))
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list members: {}", e)))?;

        Ok(members)
    }

    /// Members are never deleted, only deactivated.
    #[instrument(skip(self), fields(member_id = %member_id))]
    pub async fn deactivate_member(&self, member_id: Uuid) -> Result<Option<Member>, AppError> {
        let member = sqlx::query_as::<_, Member>(&format!(
            r#"
            UPDATE members SET active = FALSE, updated_utc = now()
            WHERE member_id = $1
            RETURNING {MEMBER_COLUMNS}
            "#
        ))
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to deactivate member: {}", e))
        })?;

        Ok(member)
    }

    // -------------------------------------------------------------------------
    // Item Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_item(&self, input: &CreateItem) -> Result<Item, AppError> {
        let item = sqlx::query_as::<_, Item>(&format!(
            r#"
            INSERT INTO items (item_id, name, stock, cost_price, sale_price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(input.stock)
        .bind(input.cost_price)
        .bind(input.sale_price)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create item: {}", e)))?;

        info!(item_id = %item.item_id, "Item created");

        Ok(item)
    }

    pub async fn get_item(&self, item_id: Uuid) -> Result<Option<Item>, AppError> {
        let item = sqlx::query_as::<_, Item>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE item_id = $1"
        ))
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get item: {}", e)))?;

        Ok(item)
    }

    pub async fn list_items(
        &self,
        active_only: bool,
        page_size: i32,
        page_token: Option<Uuid>,
    ) -> Result<Vec<Item>, AppError> {
        let limit = page_size.clamp(1, 100) as i64;

        let items = if let Some(cursor) = page_token {
            sqlx::query_as::<_, Item>(&format!(
                r#"
                SELECT {ITEM_COLUMNS} FROM items
                WHERE ($1 = FALSE OR active) AND item_id > $2
                ORDER BY item_id LIMIT $3
                "#
            ))
            .bind(active_only)
            .bind(cursor)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, Item>(&format!(
                r#"
                SELECT {ITEM_COLUMNS} FROM items
                WHERE ($1 = FALSE OR active)
                ORDER BY item_id LIMIT $2
                "#
            ))
            .bind(active_only)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list items: {}", e)))?;

        Ok(items)
    }

    /// Admin edit. Historical transaction lines keep their snapshots;
    /// this only affects future sales.
    #[instrument(skip(self, input), fields(item_id = %item_id))]
    pub async fn update_item(
        &self,
        item_id: Uuid,
        input: &UpdateItem,
    ) -> Result<Option<Item>, AppError> {
        let item = sqlx::query_as::<_, Item>(&format!(
            r#"
            UPDATE items
            SET name = COALESCE($2, name),
                stock = COALESCE($3, stock),
                cost_price = COALESCE($4, cost_price),
                sale_price = COALESCE($5, sale_price),
                updated_utc = now()
            WHERE item_id = $1
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(item_id)
        .bind(&input.name)
        .bind(input.stock)
        .bind(input.cost_price)
        .bind(input.sale_price)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update item: {}", e)))?;

        Ok(item)
    }

    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn deactivate_item(&self, item_id: Uuid) -> Result<Option<Item>, AppError> {
        let item = sqlx::query_as::<_, Item>(&format!(
            r#"
            UPDATE items SET active = FALSE, updated_utc = now()
            WHERE item_id = $1
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to deactivate item: {}", e)))?;

        Ok(item)
    }

    // -------------------------------------------------------------------------
    // Sale Posting
    // -------------------------------------------------------------------------

    /// Post a sale: decrement stock for every line, charge hutang when
    /// debt-financed, and insert the transaction with its snapshot
    /// lines - all in one database transaction.
    ///
    /// Items are locked and checked in the order submitted; the first
    /// violation aborts the whole unit with no partial effect. A
    /// cashier-posted sale starts out `selesai`, a member self-checkout
    /// starts out `pending`.
    #[instrument(skip(self, input), fields(line_count = input.lines.len(), payment_method = %input.payment_method))]
    pub async fn post_sale(
        &self,
        input: &PostSale,
        debt_limit: Decimal,
    ) -> Result<(Transaction, Vec<TransactionLine>), PostingError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["post_sale"])
            .start_timer();

        // Shape validation happens before any database access.
        if input.lines.is_empty() {
            return Err(PostingError::ValidationFailed(
                "sale must have at least one line".to_string(),
            ));
        }
        for line in &input.lines {
            if line.quantity <= 0 {
                return Err(PostingError::ValidationFailed(format!(
                    "quantity must be positive for item {}",
                    line.item_id
                )));
            }
        }
        if input.payment_method == crate::models::PaymentMethod::Hutang && input.member_id.is_none()
        {
            return Err(PostingError::ValidationFailed(
                "hutang sale requires a member".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        // Lock, check and decrement each item in submitted order. The
        // decrement happens under the lock so a duplicated item id in
        // the same sale sees its own earlier decrement.
        let mut total_price = Decimal::ZERO;
        let mut total_profit = Decimal::ZERO;
        let mut snapshots = Vec::with_capacity(input.lines.len());

        for line in &input.lines {
            let item = sqlx::query_as::<_, Item>(&format!(
                "SELECT {ITEM_COLUMNS} FROM items WHERE item_id = $1 AND active FOR UPDATE"
            ))
            .bind(line.item_id)
            .fetch_optional(&mut *tx)
            .await?;

            let item = item.ok_or(PostingError::NotFound { entity: "item" })?;

            if item.stock < line.quantity {
                return Err(PostingError::OutOfStock {
                    name: item.name,
                    requested: line.quantity,
                    available: item.stock,
                });
            }

            sqlx::query("UPDATE items SET stock = stock - $2, updated_utc = now() WHERE item_id = $1")
                .bind(item.item_id)
                .bind(line.quantity)
                .execute(&mut *tx)
                .await?;

            let qty = Decimal::from(line.quantity);
            let subtotal = item.sale_price * qty;
            let profit = item.unit_profit() * qty;
            total_price += subtotal;
            total_profit += profit;

            snapshots.push((line.item_id, line.quantity, item.sale_price, item.cost_price, subtotal, profit));
        }

        // Debt-financed purchases charge hutang now, with headroom
        // re-checked under the member row lock - never trusted from an
        // earlier read.
        if input.payment_method == crate::models::PaymentMethod::Hutang {
            let member_id = input.member_id.ok_or_else(|| {
                PostingError::ValidationFailed("hutang sale requires a member".to_string())
            })?;
            let member = Self::lock_member(&mut tx, member_id).await?;

            if !member.can_afford_hutang(debt_limit, total_price) {
                return Err(PostingError::InsufficientDebtHeadroom {
                    required: total_price,
                    headroom: debt_limit - member.hutang,
                });
            }

            sqlx::query(
                "UPDATE members SET hutang = hutang + $2, updated_utc = now() WHERE member_id = $1",
            )
            .bind(member_id)
            .bind(total_price)
            .execute(&mut *tx)
            .await?;
        }

        let status = if input.kasir_id.is_some() {
            TransactionStatus::Selesai
        } else {
            TransactionStatus::Pending
        };
        let settled_utc: Option<DateTime<Utc>> = if input.kasir_id.is_some() {
            Some(Utc::now())
        } else {
            None
        };

        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            INSERT INTO transactions
                (transaction_id, member_id, kasir_id, total_price, total_profit, payment_method, status, settled_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(input.member_id)
        .bind(input.kasir_id)
        .bind(total_price)
        .bind(total_profit)
        .bind(input.payment_method.as_str())
        .bind(status.as_str())
        .bind(settled_utc)
        .fetch_one(&mut *tx)
        .await?;

        let mut lines = Vec::with_capacity(snapshots.len());
        for (item_id, quantity, unit_price, unit_cost, subtotal, profit) in snapshots {
            let line = sqlx::query_as::<_, TransactionLine>(&format!(
                r#"
                INSERT INTO transaction_lines
                    (line_id, transaction_id, item_id, quantity, unit_price, unit_cost, subtotal, profit)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING {LINE_COLUMNS}
                "#
            ))
            .bind(Uuid::new_v4())
            .bind(transaction.transaction_id)
            .bind(item_id)
            .bind(quantity)
            .bind(unit_price)
            .bind(unit_cost)
            .bind(subtotal)
            .bind(profit)
            .fetch_one(&mut *tx)
            .await?;
            lines.push(line);
        }

        tx.commit().await?;

        timer.observe_duration();

        info!(
            transaction_id = %transaction.transaction_id,
            total_price = %total_price,
            status = %transaction.status,
            "Sale posted"
        );

        Ok((transaction, lines))
    }

    /// Settle a pending sale. The status-guarded UPDATE is the
    /// concurrency control: zero affected rows means another caller
    /// already moved the transaction out of `pending`.
    #[instrument(skip(self), fields(transaction_id = %transaction_id, kasir_id = %kasir_id))]
    pub async fn settle_sale(
        &self,
        transaction_id: Uuid,
        kasir_id: Uuid,
    ) -> Result<Transaction, PostingError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["settle_sale"])
            .start_timer();

        let updated = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            UPDATE transactions
            SET status = 'selesai', kasir_id = $2, settled_utc = now()
            WHERE transaction_id = $1 AND status = 'pending'
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(transaction_id)
        .bind(kasir_id)
        .fetch_optional(&self.pool)
        .await?;

        timer.observe_duration();

        match updated {
            Some(transaction) => {
                info!(transaction_id = %transaction_id, "Sale settled");
                Ok(transaction)
            }
            None => Err(self.transaction_guard_failure(transaction_id).await?),
        }
    }

    /// Cancel a pending sale: flips the status, restores stock for
    /// every line and reverses a hutang charge, atomically.
    #[instrument(skip(self), fields(transaction_id = %transaction_id))]
    pub async fn cancel_sale(&self, transaction_id: Uuid) -> Result<Transaction, PostingError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["cancel_sale"])
            .start_timer();

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            UPDATE transactions
            SET status = 'dibatalkan'
            WHERE transaction_id = $1 AND status = 'pending'
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(transaction_id)
        .fetch_optional(&mut *tx)
        .await?;

        let transaction = match updated {
            Some(t) => t,
            None => {
                tx.rollback().await.ok();
                return Err(self.transaction_guard_failure(transaction_id).await?);
            }
        };

        let lines = sqlx::query_as::<_, TransactionLine>(&format!(
            "SELECT {LINE_COLUMNS} FROM transaction_lines WHERE transaction_id = $1"
        ))
        .bind(transaction_id)
        .fetch_all(&mut *tx)
        .await?;

        for line in &lines {
            sqlx::query("UPDATE items SET stock = stock + $2, updated_utc = now() WHERE item_id = $1")
                .bind(line.item_id)
                .bind(line.quantity)
                .execute(&mut *tx)
                .await?;
        }

        if transaction.payment_method == "hutang" {
            if let Some(member_id) = transaction.member_id {
                Self::lock_member(&mut tx, member_id).await?;
                // The charge may have been partially repaid in the
                // meantime; hutang never goes below zero.
                sqlx::query(
                    "UPDATE members SET hutang = GREATEST(hutang - $2, 0), updated_utc = now() WHERE member_id = $1",
                )
                .bind(member_id)
                .bind(transaction.total_price)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        timer.observe_duration();

        info!(transaction_id = %transaction_id, "Sale cancelled");

        Ok(transaction)
    }

    pub async fn get_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Option<(Transaction, Vec<TransactionLine>)>, AppError> {
        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE transaction_id = $1"
        ))
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get transaction: {}", e)))?;

        let transaction = match transaction {
            Some(t) => t,
            None => return Ok(None),
        };

        let lines = sqlx::query_as::<_, TransactionLine>(&format!(
            "SELECT {LINE_COLUMNS} FROM transaction_lines WHERE transaction_id = $1 ORDER BY line_id"
        ))
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get lines: {}", e)))?;

        Ok(Some((transaction, lines)))
    }

    pub async fn list_transactions(
        &self,
        member_id: Option<Uuid>,
        status: Option<TransactionStatus>,
        page_size: i32,
    ) -> Result<Vec<Transaction>, AppError> {
        let limit = page_size.clamp(1, 100) as i64;

        let transactions = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS} FROM transactions
            WHERE ($1::uuid IS NULL OR member_id = $1)
              AND ($2::varchar IS NULL OR status = $2)
            ORDER BY created_utc DESC
            LIMIT $3
            "#
        ))
        .bind(member_id)
        .bind(status.map(|s| s.as_str()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list transactions: {}", e))
        })?;

        Ok(transactions)
    }

    // -------------------------------------------------------------------------
    // Debt Payments
    // -------------------------------------------------------------------------

    /// Record a member's request to pay down hutang. The nominal is
    /// checked advisorily here and decisively at approval time.
    #[instrument(skip(self), fields(member_id = %member_id, nominal = %nominal))]
    pub async fn create_debt_payment(
        &self,
        member_id: Uuid,
        nominal: Decimal,
        source: DebtSource,
    ) -> Result<DebtPayment, PostingError> {
        if nominal <= Decimal::ZERO {
            return Err(PostingError::ValidationFailed(
                "nominal must be positive".to_string(),
            ));
        }

        let member = self
            .get_member(member_id)
            .await
            .map_err(|e| PostingError::Database(anyhow::anyhow!("{}", e)))?
            .ok_or(PostingError::NotFound { entity: "member" })?;

        if !member.can_reduce_debt(nominal) {
            return Err(PostingError::InsufficientDebt {
                nominal,
                hutang: member.hutang,
            });
        }

        let payment = sqlx::query_as::<_, DebtPayment>(&format!(
            r#"
            INSERT INTO debt_payments (payment_id, member_id, nominal, source)
            VALUES ($1, $2, $3, $4)
            RETURNING {DEBT_PAYMENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(member_id)
        .bind(nominal)
        .bind(source.as_str())
        .fetch_one(&self.pool)
        .await?;

        info!(payment_id = %payment.payment_id, "Debt payment requested");

        Ok(payment)
    }

    /// Approve a debt payment. The member row is locked and the nominal
    /// re-verified against hutang as it is *now*, not as it was when
    /// the payment was requested. Saldo-sourced payments additionally
    /// verify and debit saldo under the same lock.
    #[instrument(skip(self), fields(payment_id = %payment_id, resolver = %resolved_by))]
    pub async fn approve_debt_payment(
        &self,
        payment_id: Uuid,
        resolved_by: Uuid,
    ) -> Result<DebtPayment, PostingError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["approve_debt_payment"])
            .start_timer();

        let mut tx = self.pool.begin().await?;

        let payment = sqlx::query_as::<_, DebtPayment>(&format!(
            "SELECT {DEBT_PAYMENT_COLUMNS} FROM debt_payments WHERE payment_id = $1 FOR UPDATE"
        ))
        .bind(payment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(PostingError::NotFound {
            entity: "debt payment",
        })?;

        if payment.status != "pending" {
            return Err(PostingError::AlreadyProcessed {
                entity: "debt payment",
            });
        }

        let member = Self::lock_member(&mut tx, payment.member_id).await?;

        if !member.can_reduce_debt(payment.nominal) {
            return Err(PostingError::InsufficientDebt {
                nominal: payment.nominal,
                hutang: member.hutang,
            });
        }

        let from_saldo = payment.source == "saldo";
        if from_saldo && !member.can_afford_saldo(payment.nominal) {
            return Err(PostingError::InsufficientBalance {
                required: payment.nominal,
                available: member.saldo,
            });
        }

        if from_saldo {
            sqlx::query(
                "UPDATE members SET hutang = hutang - $2, saldo = saldo - $2, updated_utc = now() WHERE member_id = $1",
            )
            .bind(payment.member_id)
            .bind(payment.nominal)
            .execute(&mut *tx)
            .await?;
        } else {
            sqlx::query(
                "UPDATE members SET hutang = hutang - $2, updated_utc = now() WHERE member_id = $1",
            )
            .bind(payment.member_id)
            .bind(payment.nominal)
            .execute(&mut *tx)
            .await?;
        }

        let approved = sqlx::query_as::<_, DebtPayment>(&format!(
            r#"
            UPDATE debt_payments
            SET status = 'approved', resolved_utc = now(), resolved_by = $2
            WHERE payment_id = $1 AND status = 'pending'
            RETURNING {DEBT_PAYMENT_COLUMNS}
            "#
        ))
        .bind(payment_id)
        .bind(resolved_by)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(PostingError::AlreadyProcessed {
            entity: "debt payment",
        })?;

        tx.commit().await?;

        timer.observe_duration();

        info!(payment_id = %payment_id, nominal = %approved.nominal, "Debt payment approved");

        Ok(approved)
    }

    /// Reject a debt payment. No monetary effect.
    #[instrument(skip(self), fields(payment_id = %payment_id))]
    pub async fn reject_debt_payment(
        &self,
        payment_id: Uuid,
        resolved_by: Uuid,
    ) -> Result<DebtPayment, PostingError> {
        let rejected = sqlx::query_as::<_, DebtPayment>(&format!(
            r#"
            UPDATE debt_payments
            SET status = 'rejected', resolved_utc = now(), resolved_by = $2
            WHERE payment_id = $1 AND status = 'pending'
            RETURNING {DEBT_PAYMENT_COLUMNS}
            "#
        ))
        .bind(payment_id)
        .bind(resolved_by)
        .fetch_optional(&self.pool)
        .await?;

        match rejected {
            Some(payment) => Ok(payment),
            None => {
                let exists = sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM debt_payments WHERE payment_id = $1",
                )
                .bind(payment_id)
                .fetch_one(&self.pool)
                .await?;

                if exists > 0 {
                    Err(PostingError::AlreadyProcessed {
                        entity: "debt payment",
                    })
                } else {
                    Err(PostingError::NotFound {
                        entity: "debt payment",
                    })
                }
            }
        }
    }

    pub async fn list_debt_payments(
        &self,
        member_id: Option<Uuid>,
        status: Option<DebtPaymentStatus>,
        page_size: i32,
    ) -> Result<Vec<DebtPayment>, AppError> {
        let limit = page_size.clamp(1, 100) as i64;

        let payments = sqlx::query_as::<_, DebtPayment>(&format!(
            r#"
            SELECT {DEBT_PAYMENT_COLUMNS} FROM debt_payments
            WHERE ($1::uuid IS NULL OR member_id = $1)
              AND ($2::varchar IS NULL OR status = $2)
            ORDER BY requested_utc DESC
            LIMIT $3
            "#
        ))
        .bind(member_id)
        .bind(status.map(|s| s.as_str()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list debt payments: {}", e))
        })?;

        Ok(payments)
    }

    // -------------------------------------------------------------------------
    // SHU Operations
    // -------------------------------------------------------------------------

    /// Record a yearly SHU distribution for one member. The split is
    /// computed here and the member share accrues onto the member's shu
    /// balance in the same transaction. Insert-only: a second run for
    /// the same member and year is a conflict.
    #[instrument(skip(self), fields(member_id = %member_id, year = year, amount = %amount))]
    pub async fn distribute_shu(
        &self,
        member_id: Uuid,
        year: i32,
        amount: Decimal,
    ) -> Result<ShuDistribution, PostingError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["distribute_shu"])
            .start_timer();

        if amount < Decimal::ZERO {
            return Err(PostingError::ValidationFailed(
                "distributable amount must be non-negative".to_string(),
            ));
        }
        // The shares columns hold two decimal places; a finer-grained
        // amount would be rounded on insert and no longer sum to the
        // stored total.
        if amount.round_dp(2) != amount {
            return Err(PostingError::ValidationFailed(
                "distributable amount must have at most two decimal places".to_string(),
            ));
        }

        let shares = ShuShares::split(amount);

        let mut tx = self.pool.begin().await?;

        Self::lock_member(&mut tx, member_id).await?;

        let distribution = sqlx::query_as::<_, ShuDistribution>(&format!(
            r#"
            INSERT INTO shu_distributions
                (distribution_id, member_id, year, share_60, share_10, share_30, total_shu)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {SHU_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(member_id)
        .bind(year)
        .bind(shares.share_60)
        .bind(shares.share_10)
        .bind(shares.share_30)
        .bind(amount)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                PostingError::Duplicate {
                    entity: "shu distribution for this member and year",
                }
            }
            _ => PostingError::Database(anyhow::anyhow!("Failed to insert distribution: {}", e)),
        })?;

        // The member share accrues onto the spendable-via-topup balance.
        sqlx::query("UPDATE members SET shu = shu + $2, updated_utc = now() WHERE member_id = $1")
            .bind(member_id)
            .bind(shares.share_60)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        timer.observe_duration();

        info!(distribution_id = %distribution.distribution_id, "SHU distributed");

        Ok(distribution)
    }

    /// Move accrued SHU into spendable saldo. Verified and applied
    /// under the member row lock.
    #[instrument(skip(self), fields(member_id = %member_id, nominal = %nominal))]
    pub async fn apply_shu_topup(
        &self,
        member_id: Uuid,
        nominal: Decimal,
    ) -> Result<Member, PostingError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["apply_shu_topup"])
            .start_timer();

        if nominal <= Decimal::ZERO {
            return Err(PostingError::ValidationFailed(
                "nominal must be positive".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let member = Self::lock_member(&mut tx, member_id).await?;

        if !member.can_reduce_shu(nominal) {
            return Err(PostingError::InsufficientShu {
                nominal,
                shu: member.shu,
            });
        }

        let updated = sqlx::query_as::<_, Member>(&format!(
            r#"
            UPDATE members
            SET shu = shu - $2, saldo = saldo + $2, updated_utc = now()
            WHERE member_id = $1
            RETURNING {MEMBER_COLUMNS}
            "#
        ))
        .bind(member_id)
        .bind(nominal)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        timer.observe_duration();

        info!(member_id = %member_id, nominal = %nominal, "SHU topup applied");

        Ok(updated)
    }

    pub async fn list_shu_distributions(
        &self,
        member_id: Option<Uuid>,
        year: Option<i32>,
    ) -> Result<Vec<ShuDistribution>, AppError> {
        let distributions = sqlx::query_as::<_, ShuDistribution>(&format!(
            r#"
            SELECT {SHU_COLUMNS} FROM shu_distributions
            WHERE ($1::uuid IS NULL OR member_id = $1)
              AND ($2::int IS NULL OR year = $2)
            ORDER BY year DESC, created_utc DESC
            "#
        ))
        .bind(member_id)
        .bind(year)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list distributions: {}", e))
        })?;

        Ok(distributions)
    }

    // -------------------------------------------------------------------------
    // Cashier Deposits
    // -------------------------------------------------------------------------

    #[instrument(skip(self), fields(kasir_id = %kasir_id, nominal = %nominal))]
    pub async fn create_deposit(
        &self,
        kasir_id: Uuid,
        nominal: Decimal,
    ) -> Result<CashierDeposit, PostingError> {
        if nominal <= Decimal::ZERO {
            return Err(PostingError::ValidationFailed(
                "nominal must be positive".to_string(),
            ));
        }

        let deposit = sqlx::query_as::<_, CashierDeposit>(&format!(
            r#"
            INSERT INTO cashier_deposits (deposit_id, kasir_id, nominal)
            VALUES ($1, $2, $3)
            RETURNING {DEPOSIT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(kasir_id)
        .bind(nominal)
        .fetch_one(&self.pool)
        .await?;

        info!(deposit_id = %deposit.deposit_id, "Cashier deposit submitted");

        Ok(deposit)
    }

    /// Approve a cash handover. Bookkeeping only - no monetary side
    /// effect beyond the status flip.
    #[instrument(skip(self), fields(deposit_id = %deposit_id))]
    pub async fn approve_deposit(
        &self,
        deposit_id: Uuid,
        approved_by: Uuid,
    ) -> Result<CashierDeposit, PostingError> {
        let approved = sqlx::query_as::<_, CashierDeposit>(&format!(
            r#"
            UPDATE cashier_deposits
            SET status = 'approved', approved_utc = now(), approved_by = $2
            WHERE deposit_id = $1 AND status = 'pending'
            RETURNING {DEPOSIT_COLUMNS}
            "#
        ))
        .bind(deposit_id)
        .bind(approved_by)
        .fetch_optional(&self.pool)
        .await?;

        match approved {
            Some(deposit) => Ok(deposit),
            None => {
                let exists = sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM cashier_deposits WHERE deposit_id = $1",
                )
                .bind(deposit_id)
                .fetch_one(&self.pool)
                .await?;

                if exists > 0 {
                    Err(PostingError::AlreadyProcessed { entity: "deposit" })
                } else {
                    Err(PostingError::NotFound { entity: "deposit" })
                }
            }
        }
    }

    pub async fn list_deposits(
        &self,
        kasir_id: Option<Uuid>,
        status: Option<DepositStatus>,
    ) -> Result<Vec<CashierDeposit>, AppError> {
        let deposits = sqlx::query_as::<_, CashierDeposit>(&format!(
            r#"
            SELECT {DEPOSIT_COLUMNS} FROM cashier_deposits
            WHERE ($1::uuid IS NULL OR kasir_id = $1)
              AND ($2::varchar IS NULL OR status = $2)
            ORDER BY submitted_utc DESC
            "#
        ))
        .bind(kasir_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list deposits: {}", e)))?;

        Ok(deposits)
    }

    // -------------------------------------------------------------------------
    // Stock Opname
    // -------------------------------------------------------------------------

    #[instrument(skip(self), fields(item_id = %item_id, counted_stock = counted_stock))]
    pub async fn create_opname(
        &self,
        item_id: Uuid,
        counted_stock: i32,
        submitted_by: Uuid,
    ) -> Result<StockOpname, PostingError> {
        if counted_stock < 0 {
            return Err(PostingError::ValidationFailed(
                "counted stock must be non-negative".to_string(),
            ));
        }

        let item = self
            .get_item(item_id)
            .await
            .map_err(|e| PostingError::Database(anyhow::anyhow!("{}", e)))?;
        if item.is_none() {
            return Err(PostingError::NotFound { entity: "item" });
        }

        let opname = sqlx::query_as::<_, StockOpname>(&format!(
            r#"
            INSERT INTO stock_opnames (opname_id, item_id, counted_stock, submitted_by)
            VALUES ($1, $2, $3, $4)
            RETURNING {OPNAME_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(item_id)
        .bind(counted_stock)
        .bind(submitted_by)
        .fetch_one(&self.pool)
        .await?;

        info!(opname_id = %opname.opname_id, "Stock opname submitted");

        Ok(opname)
    }

    /// Approve an opname: the item row is locked and its stock set to
    /// the counted value in the same transaction as the status flip.
    #[instrument(skip(self), fields(opname_id = %opname_id))]
    pub async fn approve_opname(
        &self,
        opname_id: Uuid,
        resolved_by: Uuid,
    ) -> Result<StockOpname, PostingError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["approve_opname"])
            .start_timer();

        let mut tx = self.pool.begin().await?;

        let opname = sqlx::query_as::<_, StockOpname>(&format!(
            "SELECT {OPNAME_COLUMNS} FROM stock_opnames WHERE opname_id = $1 FOR UPDATE"
        ))
        .bind(opname_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(PostingError::NotFound { entity: "opname" })?;

        if opname.status != "pending" {
            return Err(PostingError::AlreadyProcessed { entity: "opname" });
        }

        sqlx::query("SELECT item_id FROM items WHERE item_id = $1 FOR UPDATE")
            .bind(opname.item_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE items SET stock = $2, updated_utc = now() WHERE item_id = $1")
            .bind(opname.item_id)
            .bind(opname.counted_stock)
            .execute(&mut *tx)
            .await?;

        let approved = sqlx::query_as::<_, StockOpname>(&format!(
            r#"
            UPDATE stock_opnames
            SET status = 'approved', resolved_utc = now(), resolved_by = $2
            WHERE opname_id = $1 AND status = 'pending'
            RETURNING {OPNAME_COLUMNS}
            "#
        ))
        .bind(opname_id)
        .bind(resolved_by)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(PostingError::AlreadyProcessed { entity: "opname" })?;

        tx.commit().await?;

        timer.observe_duration();

        info!(opname_id = %opname_id, counted_stock = opname.counted_stock, "Opname approved");

        Ok(approved)
    }

    /// Reject an opname. A reason is required; it signals the submitter
    /// to redo the count.
    #[instrument(skip(self, reason), fields(opname_id = %opname_id))]
    pub async fn reject_opname(
        &self,
        opname_id: Uuid,
        resolved_by: Uuid,
        reason: &str,
    ) -> Result<StockOpname, PostingError> {
        if reason.trim().is_empty() {
            return Err(PostingError::ValidationFailed(
                "rejection requires a reason".to_string(),
            ));
        }

        let rejected = sqlx::query_as::<_, StockOpname>(&format!(
            r#"
            UPDATE stock_opnames
            SET status = 'rejected', rejection_reason = $3, resolved_utc = now(), resolved_by = $2
            WHERE opname_id = $1 AND status = 'pending'
            RETURNING {OPNAME_COLUMNS}
            "#
        ))
        .bind(opname_id)
        .bind(resolved_by)
        .bind(reason)
        .fetch_optional(&self.pool)
        .await?;

        match rejected {
            Some(opname) => Ok(opname),
            None => {
                let exists = sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM stock_opnames WHERE opname_id = $1",
                )
                .bind(opname_id)
                .fetch_one(&self.pool)
                .await?;

                if exists > 0 {
                    Err(PostingError::AlreadyProcessed { entity: "opname" })
                } else {
                    Err(PostingError::NotFound { entity: "opname" })
                }
            }
        }
    }

    pub async fn list_opnames(
        &self,
        status: Option<OpnameStatus>,
    ) -> Result<Vec<StockOpname>, AppError> {
        let opnames = sqlx::query_as::<_, StockOpname>(&format!(
            r#"
            SELECT {OPNAME_COLUMNS} FROM stock_opnames
            WHERE ($1::varchar IS NULL OR status = $1)
            ORDER BY submitted_utc DESC
            "#
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list opnames: {}", e)))?;

        Ok(opnames)
    }

    // -------------------------------------------------------------------------
    // Reports
    // -------------------------------------------------------------------------

    /// Aggregate settled sales for the admin dashboard.
    #[instrument(skip(self))]
    pub async fn sales_summary(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<SalesSummary, AppError> {
        let summary = sqlx::query_as::<_, SalesSummary>(
            r#"
            SELECT COUNT(*) AS transaction_count,
                   COALESCE(SUM(total_price), 0) AS total_revenue,
                   COALESCE(SUM(total_profit), 0) AS total_profit
            FROM transactions
            WHERE status = 'selesai'
              AND ($1::timestamptz IS NULL OR created_utc >= $1)
              AND ($2::timestamptz IS NULL OR created_utc <= $2)
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get summary: {}", e)))?;

        Ok(summary)
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    /// Lock an active member row for the remainder of the transaction.
    async fn lock_member(
        tx: &mut SqlxTransaction<'_, Postgres>,
        member_id: Uuid,
    ) -> Result<Member, PostingError> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE member_id = $1 AND active FOR UPDATE"
        ))
        .bind(member_id)
        .fetch_optional(&mut **tx)
        .await?;

        member.ok_or(PostingError::NotFound { entity: "member" })
    }

    /// Classify a failed status-guarded transaction UPDATE: either the
    /// row does not exist, or a concurrent transition already happened.
    async fn transaction_guard_failure(
        &self,
        transaction_id: Uuid,
    ) -> Result<PostingError, PostingError> {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM transactions WHERE transaction_id = $1",
        )
        .bind(transaction_id)
        .fetch_one(&self.pool)
        .await?;

        if exists > 0 {
            Ok(PostingError::AlreadyProcessed {
                entity: "transaction",
            })
        } else {
            Ok(PostingError::NotFound {
                entity: "transaction",
            })
        }
    }
}
