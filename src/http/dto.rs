use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::AppError;
use crate::domain::{
    cents_from_units, cents_to_units, Account, AccountId, Cents, Transaction, TransactionId,
    TransactionType,
};

/// Account as exposed over HTTP. Balance is in currency units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    pub id: AccountId,
    pub account_holder_name: String,
    pub balance: f64,
}

impl From<Account> for AccountDto {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            account_holder_name: account.account_holder_name,
            balance: cents_to_units(account.balance),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDto {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub amount: f64,
    pub transaction_type: TransactionType,
    pub timestamp: DateTime<Utc>,
}

impl From<Transaction> for TransactionDto {
    fn from(tx: Transaction) -> Self {
        Self {
            id: tx.id,
            account_id: tx.account_id,
            amount: cents_to_units(tx.amount),
            transaction_type: tx.transaction_type,
            timestamp: tx.timestamp,
        }
    }
}

/// Body of `POST /api/accounts`. Any `id` sent by the client is ignored.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub account_holder_name: String,
    #[serde(default)]
    pub balance: f64,
}

/// Body of the deposit and withdraw endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AmountRequest {
    pub amount: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    pub amount: f64,
}

/// Convert a JSON amount into cents.
pub fn to_cents(units: f64) -> Result<Cents, AppError> {
    cents_from_units(units)
        .ok_or_else(|| AppError::InvalidAmount(format!("{} is not a representable amount", units)))
}
