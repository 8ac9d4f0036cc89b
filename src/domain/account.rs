use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Cents;

/// Store-assigned account identifier.
pub type AccountId = i64;

/// A named balance-holding entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub account_holder_name: String,
    /// Balance in cents. Kept non-negative by withdrawals and transfers,
    /// although deposits are not validated.
    pub balance: Cents,
}

impl Account {
    /// Returns true if the balance covers `amount`.
    pub fn can_cover(&self, amount: Cents) -> bool {
        self.balance >= amount
    }

    /// Add `amount` to the balance. The balance is left untouched on overflow.
    pub fn credit(&mut self, amount: Cents) -> Result<(), BalanceOutOfRange> {
        self.balance = self.balance.checked_add(amount).ok_or(BalanceOutOfRange)?;
        Ok(())
    }

    /// Subtract `amount` from the balance. The balance is left untouched on overflow.
    pub fn debit(&mut self, amount: Cents) -> Result<(), BalanceOutOfRange> {
        self.balance = self.balance.checked_sub(amount).ok_or(BalanceOutOfRange)?;
        Ok(())
    }
}

/// A balance change whose result does not fit in `Cents`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("balance out of range")]
pub struct BalanceOutOfRange;
