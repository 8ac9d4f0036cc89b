use std::io::Write;
use std::str::FromStr;

use anyhow::{bail, Result};

use crate::application::AccountService;
use crate::domain::{format_cents, AccountId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => bail!("Unknown export format '{}'. Use csv or json", other),
        }
    }
}

/// Writes an account's transaction history, newest first.
pub struct Exporter<'a> {
    service: &'a AccountService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a AccountService) -> Self {
        Self { service }
    }

    /// Export in the requested format. Returns the number of transactions written.
    pub async fn export_transactions<W: Write>(
        &self,
        account_id: AccountId,
        format: ExportFormat,
        writer: W,
    ) -> Result<usize> {
        match format {
            ExportFormat::Csv => self.export_transactions_csv(account_id, writer).await,
            ExportFormat::Json => self.export_transactions_json(account_id, writer).await,
        }
    }

    /// Export transactions to CSV. Amounts are written as decimal strings.
    pub async fn export_transactions_csv<W: Write>(
        &self,
        account_id: AccountId,
        writer: W,
    ) -> Result<usize> {
        let transactions = self.service.get_account_transactions(account_id).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["id", "account_id", "transaction_type", "amount", "timestamp"])?;

        for tx in &transactions {
            csv_writer.write_record([
                tx.id.to_string(),
                tx.account_id.to_string(),
                tx.transaction_type.to_string(),
                format_cents(tx.amount),
                tx.timestamp.to_rfc3339(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(transactions.len())
    }

    /// Export transactions as a pretty-printed JSON array.
    pub async fn export_transactions_json<W: Write>(
        &self,
        account_id: AccountId,
        mut writer: W,
    ) -> Result<usize> {
        let transactions = self.service.get_account_transactions(account_id).await?;
        serde_json::to_writer_pretty(&mut writer, &transactions)?;
        writeln!(writer)?;
        Ok(transactions.len())
    }
}
