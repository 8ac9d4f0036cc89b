use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountId, Cents};

pub type TransactionId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Deposit,
    Withdraw,
    /// Source side of a transfer
    Debit,
    /// Destination side of a transfer
    Credit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "DEPOSIT",
            TransactionType::Withdraw => "WITHDRAW",
            TransactionType::Debit => "DEBIT",
            TransactionType::Credit => "CREDIT",
        }
    }

    /// Sign of this movement when applied to a balance.
    pub fn signum(&self) -> i64 {
        match self {
            TransactionType::Deposit | TransactionType::Credit => 1,
            TransactionType::Withdraw | TransactionType::Debit => -1,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTransactionType(pub String);

impl fmt::Display for UnknownTransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown transaction type: {}", self.0)
    }
}

impl std::error::Error for UnknownTransactionType {}

impl FromStr for TransactionType {
    type Err = UnknownTransactionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DEPOSIT" => Ok(TransactionType::Deposit),
            "WITHDRAW" => Ok(TransactionType::Withdraw),
            "DEBIT" => Ok(TransactionType::Debit),
            "CREDIT" => Ok(TransactionType::Credit),
            _ => Err(UnknownTransactionType(s.to_string())),
        }
    }
}

/// An immutable record of one balance movement against one account.
/// Transactions are append-only; the id is assigned when the row is inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// Weak reference: the account may have been deleted since.
    pub account_id: AccountId,
    pub amount: Cents,
    pub transaction_type: TransactionType,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Amount with the sign it contributes to the account balance.
    /// `None` if the negated amount does not fit in `Cents`.
    pub fn signed_amount(&self) -> Option<Cents> {
        self.amount.checked_mul(self.transaction_type.signum())
    }
}

/// A transaction that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub account_id: AccountId,
    pub amount: Cents,
    pub transaction_type: TransactionType,
    pub timestamp: DateTime<Utc>,
}

impl NewTransaction {
    /// Build a record stamped with the current time.
    pub fn now(account_id: AccountId, amount: Cents, transaction_type: TransactionType) -> Self {
        Self {
            account_id,
            amount,
            transaction_type,
            timestamp: Utc::now(),
        }
    }

    pub fn with_id(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            account_id: self.account_id,
            amount: self.amount,
            transaction_type: self.transaction_type,
            timestamp: self.timestamp,
        }
    }
}

/// Sum of the signed amounts of `transactions`, or `None` on overflow.
pub fn net_movement<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Option<Cents> {
    transactions
        .into_iter()
        .try_fold(0 as Cents, |total, tx| total.checked_add(tx.signed_amount()?))
}
