use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, Row, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::domain::{Account, AccountId, JournalEntry, OperationType, User, UserId};

use super::{MIGRATION_001_INITIAL, MIGRATION_002_JOURNAL};

/// Row counts used by the ledger integrity check.
#[derive(Debug, Clone)]
pub struct LedgerStats {
    pub user_count: i64,
    pub account_count: i64,
    pub journal_count: i64,
}

/// Repository for persisting and querying users, accounts and the operation journal.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        sqlx::raw_sql(MIGRATION_002_JOURNAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 002")?;

        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start a unit of work. Nothing it writes is visible until `commit`;
    /// dropping it without committing rolls every write back.
    pub async fn begin(&self) -> Result<UnitOfWork> {
        let tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;
        Ok(UnitOfWork { tx })
    }

    // ========================
    // User operations
    // ========================

    /// Save a new user to the database.
    pub async fn save_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(user.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save user")?;
        Ok(())
    }

    /// Get a user by ID.
    pub async fn find_user(&self, id: UserId) -> Result<Option<User>> {
        fetch_user(&self.pool, id).await
    }

    /// Get a user by username.
    pub async fn find_user_by_name(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, created_at
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by name")?;

        row.as_ref().map(row_to_user).transpose()
    }

    /// List all users ordered by username.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query("SELECT id, username, created_at FROM users ORDER BY username")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list users")?;

        rows.iter().map(row_to_user).collect()
    }

    // ========================
    // Account operations
    // ========================

    /// Get an account by ID.
    pub async fn find_account(&self, id: AccountId) -> Result<Option<Account>> {
        fetch_account(&self.pool, id).await
    }

    /// List the accounts of one owner in the order they were created.
    pub async fn find_accounts_by_owner(&self, owner_id: UserId) -> Result<Vec<Account>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, balance, enabled, created_at
            FROM accounts
            WHERE owner_id = ?
            ORDER BY rowid
            "#,
        )
        .bind(owner_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list accounts for owner")?;

        rows.iter().map(row_to_account).collect()
    }

    /// List every account in the order they were created.
    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query(
            "SELECT id, owner_id, balance, enabled, created_at FROM accounts ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list accounts")?;

        rows.iter().map(row_to_account).collect()
    }

    /// Insert or update an account outside of a unit of work.
    pub async fn save_account(&self, account: &Account) -> Result<()> {
        store_account(&self.pool, account).await
    }

    // ========================
    // Journal operations
    // ========================

    /// Journal entries of one account in insertion order.
    pub async fn journal_for_account(&self, account_id: AccountId) -> Result<Vec<JournalEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT sequence, id, account_id, initial_amount, final_amount, operation_type, operation_time
            FROM journal
            WHERE account_id = ?
            ORDER BY sequence
            "#,
        )
        .bind(account_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch journal for account")?;

        rows.iter().map(row_to_journal_entry).collect()
    }

    /// Get row counts for integrity checking.
    pub async fn get_stats(&self) -> Result<LedgerStats> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) as user_count,
                (SELECT COUNT(*) FROM accounts) as account_count,
                (SELECT COUNT(*) FROM journal) as journal_count
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to count ledger rows")?;

        Ok(LedgerStats {
            user_count: row.get("user_count"),
            account_count: row.get("account_count"),
            journal_count: row.get("journal_count"),
        })
    }
}

/// A single storage transaction spanning an account update and its journal entry.
pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

impl UnitOfWork {
    /// Get an account by ID within this transaction.
    pub async fn find_account(&mut self, id: AccountId) -> Result<Option<Account>> {
        fetch_account(&mut *self.tx, id).await
    }

    /// Get a user by ID within this transaction.
    pub async fn find_user(&mut self, id: UserId) -> Result<Option<User>> {
        fetch_user(&mut *self.tx, id).await
    }

    /// Insert or update an account.
    pub async fn save_account(&mut self, account: &Account) -> Result<()> {
        store_account(&mut *self.tx, account).await
    }

    /// Append a journal entry. Assigns the next sequence number to `entry`.
    pub async fn append_journal(&mut self, entry: &mut JournalEntry) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO journal (id, account_id, initial_amount, final_amount, operation_type, operation_time)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(entry.account_id.to_string())
        .bind(entry.initial_amount.to_string())
        .bind(entry.final_amount.to_string())
        .bind(entry.operation_type.as_str())
        .bind(entry.operation_time.to_rfc3339())
        .execute(&mut *self.tx)
        .await
        .context("Failed to append journal entry")?;

        entry.sequence = result.last_insert_rowid();
        Ok(())
    }

    /// Make every write of this unit of work durable.
    pub async fn commit(self) -> Result<()> {
        self.tx
            .commit()
            .await
            .context("Failed to commit transaction")
    }

    /// Discard every write of this unit of work.
    pub async fn rollback(self) -> Result<()> {
        self.tx
            .rollback()
            .await
            .context("Failed to roll back transaction")
    }
}

async fn fetch_user<'e, E>(executor: E, id: UserId) -> Result<Option<User>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        r#"
        SELECT id, username, created_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id.to_string())
    .fetch_optional(executor)
    .await
    .context("Failed to fetch user")?;

    row.as_ref().map(row_to_user).transpose()
}

async fn fetch_account<'e, E>(executor: E, id: AccountId) -> Result<Option<Account>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        r#"
        SELECT id, owner_id, balance, enabled, created_at
        FROM accounts
        WHERE id = ?
        "#,
    )
    .bind(id.to_string())
    .fetch_optional(executor)
    .await
    .context("Failed to fetch account")?;

    row.as_ref().map(row_to_account).transpose()
}

/// Owner and creation time are fixed once the row exists; only balance and flag change.
async fn store_account<'e, E>(executor: E, account: &Account) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO accounts (id, owner_id, balance, enabled, created_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            balance = excluded.balance,
            enabled = excluded.enabled
        "#,
    )
    .bind(account.id.to_string())
    .bind(account.owner_id.to_string())
    .bind(account.balance.to_string())
    .bind(account.enabled)
    .bind(account.created_at.to_rfc3339())
    .execute(executor)
    .await
    .context("Failed to save account")?;
    Ok(())
}

fn parse_timestamp(value: &str, what: &'static str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("Invalid {} timestamp", what))?
        .with_timezone(&Utc))
}

fn parse_decimal(value: &str, what: &'static str) -> Result<Decimal> {
    Decimal::from_str(value).with_context(|| format!("Invalid {}: {}", what, value))
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let id_str: String = row.get("id");
    let created_at_str: String = row.get("created_at");

    Ok(User {
        id: Uuid::parse_str(&id_str).context("Invalid user ID")?,
        username: row.get("username"),
        created_at: parse_timestamp(&created_at_str, "created_at")?,
    })
}

fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Result<Account> {
    let id_str: String = row.get("id");
    let owner_str: String = row.get("owner_id");
    let balance_str: String = row.get("balance");
    let created_at_str: String = row.get("created_at");

    Ok(Account {
        id: Uuid::parse_str(&id_str).context("Invalid account ID")?,
        owner_id: Uuid::parse_str(&owner_str).context("Invalid owner ID")?,
        balance: parse_decimal(&balance_str, "balance")?,
        enabled: row.get::<i32, _>("enabled") != 0,
        created_at: parse_timestamp(&created_at_str, "created_at")?,
    })
}

fn row_to_journal_entry(row: &sqlx::sqlite::SqliteRow) -> Result<JournalEntry> {
    let id_str: String = row.get("id");
    let account_str: String = row.get("account_id");
    let initial_str: String = row.get("initial_amount");
    let final_str: String = row.get("final_amount");
    let operation_str: String = row.get("operation_type");
    let operation_time_str: String = row.get("operation_time");

    Ok(JournalEntry {
        id: Uuid::parse_str(&id_str).context("Invalid journal entry ID")?,
        sequence: row.get("sequence"),
        account_id: Uuid::parse_str(&account_str).context("Invalid account ID")?,
        initial_amount: parse_decimal(&initial_str, "initial amount")?,
        final_amount: parse_decimal(&final_str, "final amount")?,
        operation_type: OperationType::from_str(&operation_str)
            .map_err(|e| anyhow::anyhow!("Invalid journal row: {}", e))?,
        operation_time: parse_timestamp(&operation_time_str, "operation_time")?,
    })
}
