use thiserror::Error;

use crate::domain::{format_cents, AccountId, BalanceOutOfRange, Cents};

fn money(cents: &Cents) -> String {
    format_cents(*cents)
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error(
        "Insufficient funds in account {account_id}: balance {}, required {}",
        money(.balance),
        money(.required)
    )]
    InsufficientFunds {
        account_id: AccountId,
        balance: Cents,
        required: Cents,
    },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Database error: {0:#}")]
    Database(#[from] anyhow::Error),
}

impl From<BalanceOutOfRange> for AppError {
    fn from(err: BalanceOutOfRange) -> Self {
        AppError::InvalidAmount(err.to_string())
    }
}
