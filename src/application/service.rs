use tracing::{debug, info};

use crate::domain::{
    Account, AccountId, Cents, NewTransaction, Transaction, TransactionType,
};
use crate::storage::{LedgerTx, Repository};

use super::AppError;

/// Application service for account and funds operations.
/// This is the primary interface for any client (CLI, HTTP API, export).
///
/// Every mutating operation loads, checks and writes inside one store
/// transaction, so an account's balance and its transaction log are committed
/// together or not at all.
#[derive(Clone)]
pub struct AccountService {
    repo: Repository,
}

impl AccountService {
    /// Create a new account service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Open the database at the given path, creating and migrating it if needed.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // Account operations
    // ========================

    /// Create a new account with an opening balance.
    pub async fn create_account(
        &self,
        holder_name: String,
        initial_balance: Cents,
    ) -> Result<Account, AppError> {
        let account = self.repo.insert_account(&holder_name, initial_balance).await?;
        info!(account_id = account.id, holder = %account.account_holder_name, "account created");
        Ok(account)
    }

    /// Get an account by id.
    pub async fn get_account_by_id(&self, id: AccountId) -> Result<Account, AppError> {
        self.repo
            .get_account(id)
            .await?
            .ok_or(AppError::AccountNotFound(id))
    }

    /// List every account in store order.
    pub async fn get_all_accounts(&self) -> Result<Vec<Account>, AppError> {
        Ok(self.repo.list_accounts().await?)
    }

    /// Delete an account. Its transactions are left in place.
    pub async fn delete_account(&self, id: AccountId) -> Result<(), AppError> {
        self.get_account_by_id(id).await?;
        if !self.repo.delete_account(id).await? {
            // Removed by someone else between the lookup and the delete.
            return Err(AppError::AccountNotFound(id));
        }
        info!(account_id = id, "account deleted");
        Ok(())
    }

    // ========================
    // Funds operations
    // ========================

    /// Add `amount` to an account and log a DEPOSIT.
    pub async fn deposit(&self, id: AccountId, amount: Cents) -> Result<Account, AppError> {
        let mut tx = self.repo.begin().await?;
        let mut account = load_account(&mut tx, id).await?;

        account.credit(amount)?;
        tx.save_account(&account).await?;
        tx.insert_transaction(NewTransaction::now(id, amount, TransactionType::Deposit))
            .await?;
        tx.commit().await?;

        debug!(account_id = id, amount, balance = account.balance, "deposit recorded");
        Ok(account)
    }

    /// Take `amount` from an account and log a WITHDRAW.
    pub async fn withdraw(&self, id: AccountId, amount: Cents) -> Result<Account, AppError> {
        let mut tx = self.repo.begin().await?;
        let mut account = load_account(&mut tx, id).await?;

        ensure_covers(&account, amount)?;
        account.debit(amount)?;
        tx.save_account(&account).await?;
        tx.insert_transaction(NewTransaction::now(id, amount, TransactionType::Withdraw))
            .await?;
        tx.commit().await?;

        debug!(account_id = id, amount, balance = account.balance, "withdrawal recorded");
        Ok(account)
    }

    /// Move `amount` from one account to another, logging a DEBIT against the
    /// source and a CREDIT against the destination.
    pub async fn transfer_funds(
        &self,
        from_id: AccountId,
        to_id: AccountId,
        amount: Cents,
    ) -> Result<(), AppError> {
        let mut tx = self.repo.begin().await?;
        let mut from = load_account(&mut tx, from_id).await?;
        let mut to = load_account(&mut tx, to_id).await?;

        ensure_covers(&from, amount)?;

        from.debit(amount)?;
        if from_id == to_id {
            // Same row on both sides: net zero.
            from.credit(amount)?;
            tx.save_account(&from).await?;
        } else {
            to.credit(amount)?;
            tx.save_account(&from).await?;
            tx.save_account(&to).await?;
        }

        tx.insert_transaction(NewTransaction::now(from_id, amount, TransactionType::Debit))
            .await?;
        tx.insert_transaction(NewTransaction::now(to_id, amount, TransactionType::Credit))
            .await?;
        tx.commit().await?;

        debug!(from_id, to_id, amount, "transfer recorded");
        Ok(())
    }

    // ========================
    // Transaction history
    // ========================

    /// Transactions recorded against `account_id`, newest first.
    /// An unknown id yields an empty list.
    pub async fn get_account_transactions(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, AppError> {
        Ok(self.repo.list_transactions_for_account(account_id).await?)
    }
}

async fn load_account(tx: &mut LedgerTx, id: AccountId) -> Result<Account, AppError> {
    tx.get_account(id)
        .await?
        .ok_or(AppError::AccountNotFound(id))
}

fn ensure_covers(account: &Account, amount: Cents) -> Result<(), AppError> {
    if account.can_cover(amount) {
        Ok(())
    } else {
        Err(AppError::InsufficientFunds {
            account_id: account.id,
            balance: account.balance,
            required: amount,
        })
    }
}
