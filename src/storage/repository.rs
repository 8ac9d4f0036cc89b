use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite, SqlitePool};

use crate::domain::{
    Account, AccountId, Cents, NewTransaction, Transaction, TransactionType,
};

use super::MIGRATION_001_INITIAL;

/// Repository for persisting and querying accounts and their transactions.
#[derive(Clone)]
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

    /// Run database migrations. Safe to run more than once.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Start a unit of work. Nothing written through it is visible to other
    /// connections until [`LedgerTx::commit`]; dropping it rolls back.
    ///
    /// The write lock is taken up front, so concurrent units of work queue on
    /// the busy timeout instead of failing when their read turns into a write.
    pub async fn begin(&self) -> Result<LedgerTx> {
        let tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .context("Failed to begin transaction")?;
        Ok(LedgerTx { tx })
    }

    // ========================
    // Account operations
    // ========================

    /// Insert a new account. The id is assigned by the database.
    pub async fn insert_account(&self, holder_name: &str, balance: Cents) -> Result<Account> {
        insert_account(&self.pool, holder_name, balance).await
    }

    /// Get an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        fetch_account(&self.pool, id).await
    }

    /// Insert or update an account under its current id.
    pub async fn save_account(&self, account: &Account) -> Result<()> {
        upsert_account(&self.pool, account).await
    }

    /// Delete an account by ID. Returns false if no row matched.
    pub async fn delete_account(&self, id: AccountId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete account")?;
        Ok(result.rows_affected() > 0)
    }

    /// List all accounts in storage order.
    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query(
            r#"
            SELECT id, account_holder_name, balance_cents
            FROM accounts
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list accounts")?;

        rows.iter().map(row_to_account).collect()
    }

    // ========================
    // Transaction operations
    // ========================

    /// Append a transaction record.
    pub async fn insert_transaction(&self, new: NewTransaction) -> Result<Transaction> {
        insert_transaction(&self.pool, new).await
    }

    /// List transactions recorded against an account, newest first.
    pub async fn list_transactions_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, account_id, amount_cents, transaction_type, timestamp
            FROM transactions
            WHERE account_id = ?
            ORDER BY timestamp DESC, id DESC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list transactions for account")?;

        rows.iter().map(row_to_transaction).collect()
    }
}

/// The writes of one ledger operation, applied together on commit.
pub struct LedgerTx {
    tx: sqlx::Transaction<'static, Sqlite>,
}

impl LedgerTx {
    pub async fn get_account(&mut self, id: AccountId) -> Result<Option<Account>> {
        fetch_account(&mut *self.tx, id).await
    }

    pub async fn save_account(&mut self, account: &Account) -> Result<()> {
        upsert_account(&mut *self.tx, account).await
    }

    pub async fn insert_transaction(&mut self, new: NewTransaction) -> Result<Transaction> {
        insert_transaction(&mut *self.tx, new).await
    }

    pub async fn commit(self) -> Result<()> {
        self.tx
            .commit()
            .await
            .context("Failed to commit transaction")
    }
}

/// Timestamps are stored as fixed-width RFC 3339 so that text order is time order.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

async fn insert_account<'e, E>(executor: E, holder_name: &str, balance: Cents) -> Result<Account>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        r#"
        INSERT INTO accounts (account_holder_name, balance_cents)
        VALUES (?, ?)
        RETURNING id
        "#,
    )
    .bind(holder_name)
    .bind(balance)
    .fetch_one(executor)
    .await
    .context("Failed to insert account")?;

    Ok(Account {
        id: row.get("id"),
        account_holder_name: holder_name.to_string(),
        balance,
    })
}

async fn fetch_account<'e, E>(executor: E, id: AccountId) -> Result<Option<Account>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        r#"
        SELECT id, account_holder_name, balance_cents
        FROM accounts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
    .context("Failed to fetch account")?;

    row.as_ref().map(row_to_account).transpose()
}

async fn upsert_account<'e, E>(executor: E, account: &Account) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO accounts (id, account_holder_name, balance_cents)
        VALUES (?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            account_holder_name = excluded.account_holder_name,
            balance_cents = excluded.balance_cents
        "#,
    )
    .bind(account.id)
    .bind(&account.account_holder_name)
    .bind(account.balance)
    .execute(executor)
    .await
    .context("Failed to save account")?;
    Ok(())
}

async fn insert_transaction<'e, E>(executor: E, new: NewTransaction) -> Result<Transaction>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        r#"
        INSERT INTO transactions (account_id, amount_cents, transaction_type, timestamp)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(new.account_id)
    .bind(new.amount)
    .bind(new.transaction_type.as_str())
    .bind(format_timestamp(new.timestamp))
    .fetch_one(executor)
    .await
    .context("Failed to save transaction")?;

    Ok(new.with_id(row.get("id")))
}

fn row_to_account(row: &SqliteRow) -> Result<Account> {
    Ok(Account {
        id: row.try_get("id").context("Invalid account ID")?,
        account_holder_name: row
            .try_get("account_holder_name")
            .context("Invalid account holder name")?,
        balance: row.try_get("balance_cents").context("Invalid balance")?,
    })
}

fn row_to_transaction(row: &SqliteRow) -> Result<Transaction> {
    let type_str: String = row.get("transaction_type");
    let timestamp_str: String = row.get("timestamp");

    Ok(Transaction {
        id: row.get("id"),
        account_id: row.get("account_id"),
        amount: row.get("amount_cents"),
        transaction_type: type_str
            .parse::<TransactionType>()
            .context("Invalid transaction type")?,
        timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
            .context("Invalid transaction timestamp")?
            .with_timezone(&Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    async fn memory_repo() -> Repository {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let repo = Repository::new(pool);
        repo.migrate().await.unwrap();
        repo
    }

    #[tokio::test]
    async fn test_ids_are_assigned_by_store() {
        let repo = memory_repo().await;
        let a = repo.insert_account("H1", 10000).await.unwrap();
        let b = repo.insert_account("H2", 0).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(repo.get_account(a.id).await.unwrap(), Some(a));
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let repo = memory_repo().await;
        repo.insert_account("H1", 100).await.unwrap();
        repo.migrate().await.unwrap();
        assert_eq!(repo.list_accounts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_account_updates_in_place() {
        let repo = memory_repo().await;
        let mut acc = repo.insert_account("H1", 10000).await.unwrap();
        acc.balance = 42;
        repo.save_account(&acc).await.unwrap();

        let loaded = repo.get_account(acc.id).await.unwrap().unwrap();
        assert_eq!(loaded.balance, 42);
        assert_eq!(repo.list_accounts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_reports_missing_rows() {
        let repo = memory_repo().await;
        let acc = repo.insert_account("H1", 0).await.unwrap();
        assert!(repo.delete_account(acc.id).await.unwrap());
        assert!(!repo.delete_account(acc.id).await.unwrap());
        assert_eq!(repo.get_account(acc.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_transactions_sorted_newest_first() {
        let repo = memory_repo().await;
        let early = Utc.with_ymd_and_hms(2024, 1, 5, 9, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 1, 20, 9, 0, 0).unwrap();

        for (ts, tt) in [(late, TransactionType::Withdraw), (early, TransactionType::Deposit)] {
            repo.insert_transaction(NewTransaction {
                account_id: 7,
                amount: 100,
                transaction_type: tt,
                timestamp: ts,
            })
            .await
            .unwrap();
        }

        let txs = repo.list_transactions_for_account(7).await.unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].timestamp, late);
        assert_eq!(txs[1].timestamp, early);
        assert!(repo.list_transactions_for_account(8).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_uncommitted_tx_rolls_back() {
        let repo = memory_repo().await;
        let acc = repo.insert_account("H1", 10000).await.unwrap();

        {
            let mut tx = repo.begin().await.unwrap();
            let mut loaded = tx.get_account(acc.id).await.unwrap().unwrap();
            loaded.balance = 0;
            tx.save_account(&loaded).await.unwrap();
            tx.insert_transaction(NewTransaction::now(acc.id, 10000, TransactionType::Withdraw))
                .await
                .unwrap();
        }

        assert_eq!(repo.get_account(acc.id).await.unwrap().unwrap().balance, 10000);
        assert!(repo.list_transactions_for_account(acc.id).await.unwrap().is_empty());
    }
}
