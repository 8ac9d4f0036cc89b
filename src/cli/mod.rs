use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::application::AccountService;
use crate::domain::{format_cents, parse_cents, AccountId, Cents};
use crate::io::{ExportFormat, Exporter};

/// Bankbook - Account Ledger
#[derive(Parser)]
#[command(name = "bankbook")]
#[command(about = "Create accounts, move money between them and inspect their history")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "BANKBOOK_DATABASE", default_value = "bankbook.db")]
    pub database: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Add money to an account
    Deposit {
        /// Account ID
        id: AccountId,

        /// Amount (e.g., "50.00" or "50")
        #[arg(allow_negative_numbers = true)]
        amount: String,
    },

    /// Take money out of an account
    Withdraw {
        /// Account ID
        id: AccountId,

        /// Amount (e.g., "30.00" or "30")
        #[arg(allow_negative_numbers = true)]
        amount: String,
    },

    /// Move money between two accounts
    Transfer {
        /// Amount to transfer (e.g., "120.00" or "120")
        #[arg(allow_negative_numbers = true)]
        amount: String,

        /// Source account ID
        #[arg(long)]
        from: AccountId,

        /// Destination account ID
        #[arg(long)]
        to: AccountId,
    },

    /// List transactions for an account, newest first
    Transactions {
        /// Account ID
        id: AccountId,
    },

    /// Export an account's transactions to CSV or JSON
    Export {
        /// Account ID
        id: AccountId,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Format: csv, json
        #[arg(short, long, default_value = "csv")]
        format: String,
    },

    /// Run the HTTP API
    Serve {
        /// Address to listen on
        #[arg(long, env = "BANKBOOK_BIND", default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a new account
    Create {
        /// Account holder name
        holder: String,

        /// Opening balance (e.g., "100.00")
        #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
        balance: String,
    },

    /// Show a single account
    Show {
        /// Account ID
        id: AccountId,
    },

    /// List all accounts
    List,

    /// Delete an account (its transactions are kept)
    Delete {
        /// Account ID
        id: AccountId,
    },
}

impl Cli {
    /// Log filter used when `RUST_LOG` is not set.
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose { "bankbook=debug,tower_http=debug,info" } else { "info" }
    }

    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                AccountService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Account(account_cmd) => {
                let service = AccountService::connect(&self.database).await?;
                run_account_command(&service, account_cmd).await?;
            }

            Commands::Deposit { id, amount } => {
                let service = AccountService::connect(&self.database).await?;
                let amount_cents = parse_amount(&amount)?;
                let account = service.deposit(id, amount_cents).await?;
                println!(
                    "Deposited {} into account {}. New balance: {}",
                    format_cents(amount_cents),
                    account.id,
                    format_cents(account.balance)
                );
            }

            Commands::Withdraw { id, amount } => {
                let service = AccountService::connect(&self.database).await?;
                let amount_cents = parse_amount(&amount)?;
                let account = service.withdraw(id, amount_cents).await?;
                println!(
                    "Withdrew {} from account {}. New balance: {}",
                    format_cents(amount_cents),
                    account.id,
                    format_cents(account.balance)
                );
            }

            Commands::Transfer { amount, from, to } => {
                let service = AccountService::connect(&self.database).await?;
                let amount_cents = parse_amount(&amount)?;
                service.transfer_funds(from, to, amount_cents).await?;
                println!(
                    "Transferred {} from account {} to account {}",
                    format_cents(amount_cents),
                    from,
                    to
                );
            }

            Commands::Transactions { id } => {
                let service = AccountService::connect(&self.database).await?;
                run_transactions_command(&service, id).await?;
            }

            Commands::Export { id, output, format } => {
                let service = AccountService::connect(&self.database).await?;
                let format: ExportFormat = format.parse()?;
                run_export_command(&service, id, format, output).await?;
            }

            Commands::Serve { bind } => {
                let service = AccountService::init(&self.database).await?;
                info!("Serving database {}", self.database);
                crate::http::serve(service, bind).await?;
            }
        }

        Ok(())
    }
}

async fn run_account_command(service: &AccountService, cmd: AccountCommands) -> Result<()> {
    match cmd {
        AccountCommands::Create { holder, balance } => {
            let opening = parse_amount(&balance)?;
            let account = service.create_account(holder, opening).await?;
            println!(
                "Created account {} for {} with balance {}",
                account.id,
                account.account_holder_name,
                format_cents(account.balance)
            );
        }

        AccountCommands::Show { id } => {
            let account = service.get_account_by_id(id).await?;
            println!("Account: {}", account.id);
            println!("  Holder:  {}", account.account_holder_name);
            println!("  Balance: {}", format_cents(account.balance));
        }

        AccountCommands::List => {
            let accounts = service.get_all_accounts().await?;
            if accounts.is_empty() {
                println!("No accounts found.");
            } else {
                println!("{:<8} {:<24} {:>14}", "ID", "HOLDER", "BALANCE");
                println!("{}", "-".repeat(48));
                for account in accounts {
                    println!(
                        "{:<8} {:<24} {:>14}",
                        account.id,
                        truncate(&account.account_holder_name, 24),
                        format_cents(account.balance)
                    );
                }
            }
        }

        AccountCommands::Delete { id } => {
            service.delete_account(id).await?;
            println!("Account deleted successfully");
        }
    }
    Ok(())
}

async fn run_transactions_command(service: &AccountService, id: AccountId) -> Result<()> {
    let transactions = service.get_account_transactions(id).await?;

    if transactions.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }

    println!(
        "{:<8} {:<20} {:<10} {:>12}",
        "ID", "TIMESTAMP", "TYPE", "AMOUNT"
    );
    println!("{}", "-".repeat(53));
    for tx in transactions {
        println!(
            "{:<8} {:<20} {:<10} {:>12}",
            tx.id,
            tx.timestamp.format("%Y-%m-%d %H:%M:%S"),
            tx.transaction_type,
            format_cents(tx.amount)
        );
    }
    Ok(())
}

async fn run_export_command(
    service: &AccountService,
    id: AccountId,
    format: ExportFormat,
    output: Option<String>,
) -> Result<()> {
    let exporter = Exporter::new(service);

    let count = match &output {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("Failed to create {}", path))?;
            let mut writer = BufWriter::new(file);
            let count = exporter.export_transactions(id, format, &mut writer).await?;
            writer.flush()?;
            count
        }
        None => {
            let stdout = io::stdout();
            exporter
                .export_transactions(id, format, stdout.lock())
                .await?
        }
    };

    if let Some(path) = output {
        eprintln!("Exported {} transaction(s) to {}", count, path);
    }
    Ok(())
}

fn parse_amount(input: &str) -> Result<Cents> {
    parse_cents(input).with_context(|| format!("Invalid amount '{}'. Use '50.00' or '50'", input))
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}
