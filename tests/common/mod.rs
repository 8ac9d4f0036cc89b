// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use bankbook::application::AccountService;
use bankbook::domain::{Account, Transaction, TransactionType};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(AccountService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = AccountService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Test fixture: the two holders used throughout the scenarios
pub struct Holders {
    pub h1: Account,
    pub h2: Account,
}

impl Holders {
    /// H1 opens with 100.00, H2 with 0.00
    pub async fn create(service: &AccountService) -> Result<Self> {
        let h1 = service.create_account("H1".into(), 10000).await?;
        let h2 = service.create_account("H2".into(), 0).await?;
        Ok(Self { h1, h2 })
    }
}

/// Pick out (type, amount) pairs for compact assertions.
pub fn movements(transactions: &[Transaction]) -> Vec<(TransactionType, i64)> {
    transactions
        .iter()
        .map(|tx| (tx.transaction_type, tx.amount))
        .collect()
}
