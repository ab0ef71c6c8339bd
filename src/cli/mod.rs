use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use uuid::Uuid;

use crate::application::AccountService;
use crate::config::{AppConfig, DEFAULT_CONFIG_PATH};
use crate::domain::{AccountView, BlockingOperation, OperationType, format_amount, parse_amount};
use crate::telemetry;

/// Reckoning - bank account ledger
#[derive(Parser)]
#[command(name = "reckoning")]
#[command(about = "A bank account ledger with an append-only operation journal")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "reckoning.db")]
    pub database: String,

    /// Configuration file, relative to the working directory (defaults are used when it does not exist)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// User management commands
    #[command(subcommand)]
    User(UserCommands),

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Pay money into an account
    Credit {
        /// Account ID
        account: Uuid,

        /// Amount (e.g., "50.00" or "50")
        #[arg(allow_negative_numbers = true)]
        amount: String,
    },

    /// Withdraw money from an account
    Debit {
        /// Account ID
        account: Uuid,

        /// Amount (e.g., "50.00" or "50")
        #[arg(allow_negative_numbers = true)]
        amount: String,
    },

    /// Verify every balance against the journal
    Check,
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Register a new user
    Create {
        /// Username (must be unique)
        username: String,
    },

    /// List all users
    List,
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Open a new account with a zero balance
    Create {
        /// Owner username
        #[arg(short, long)]
        user: String,
    },

    /// List the accounts of a user
    List {
        /// Owner username
        #[arg(short, long)]
        user: String,
    },

    /// Show an account
    Show {
        /// Account ID
        id: Uuid,
    },

    /// Block an account (rejects credits and debits)
    Block {
        /// Account ID
        id: Uuid,
    },

    /// Unblock an account
    Unblock {
        /// Account ID
        id: Uuid,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = AppConfig::load_or_default(&self.config)?;
        telemetry::init(&config.log_level, self.verbose);
        let settings = config.ledger;
        let json = self.json;

        match self.command {
            Commands::Init => {
                AccountService::init(&self.database, settings).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::User(user_cmd) => {
                let service = AccountService::connect(&self.database, settings).await?;
                run_user_command(&service, user_cmd, json).await?;
            }

            Commands::Account(account_cmd) => {
                let service = AccountService::connect(&self.database, settings).await?;
                run_account_command(&service, account_cmd, json).await?;
            }

            Commands::Credit { account, amount } => {
                let service = AccountService::connect(&self.database, settings).await?;
                run_operation_command(&service, account, OperationType::Credit, &amount, json)
                    .await?;
            }

            Commands::Debit { account, amount } => {
                let service = AccountService::connect(&self.database, settings).await?;
                run_operation_command(&service, account, OperationType::Debit, &amount, json)
                    .await?;
            }

            Commands::Check => {
                let service = AccountService::connect(&self.database, settings).await?;
                run_check_command(&service).await?;
            }
        }

        Ok(())
    }
}

async fn run_user_command(service: &AccountService, cmd: UserCommands, json: bool) -> Result<()> {
    match cmd {
        UserCommands::Create { username } => {
            let user = service.register_user(&username).await?;
            if json {
                print_json(&user)?;
            } else {
                println!("Created user: {} ({})", user.username, user.id);
            }
        }

        UserCommands::List => {
            let users = service.list_users().await?;
            if json {
                print_json(&users)?;
            } else if users.is_empty() {
                println!("No users found.");
            } else {
                println!("{:<24} {:<36}", "USERNAME", "ID");
                println!("{}", "-".repeat(61));
                for user in users {
                    println!("{:<24} {:<36}", user.username, user.id);
                }
            }
        }
    }

    Ok(())
}

async fn run_account_command(
    service: &AccountService,
    cmd: AccountCommands,
    json: bool,
) -> Result<()> {
    match cmd {
        AccountCommands::Create { user } => {
            let owner = service.get_user_by_name(&user).await?;
            let view = service.create_account(owner.id).await?;
            if json {
                print_json(&view)?;
            } else {
                println!("Created account {} for {}", view.id, owner.username);
            }
        }

        AccountCommands::List { user } => {
            let owner = service.get_user_by_name(&user).await?;
            let accounts = service.list_accounts_for_user(owner.id).await?;
            if json {
                print_json(&accounts)?;
            } else if accounts.is_empty() {
                println!("No accounts found for {}.", owner.username);
            } else {
                println!("{:<36} {:>14} {:<8}", "ID", "BALANCE", "STATUS");
                println!("{}", "-".repeat(60));
                for account in accounts {
                    println!(
                        "{:<36} {:>14} {:<8}",
                        account.id,
                        format_amount(account.balance),
                        status_label(&account)
                    );
                }
            }
        }

        AccountCommands::Show { id } => {
            let view = service.get_account(id).await?;
            if json {
                print_json(&view)?;
            } else {
                print_account(&view);
            }
        }

        AccountCommands::Block { id } => {
            let view = service
                .blocking_operation(id, BlockingOperation::Block)
                .await?;
            if json {
                print_json(&view)?;
            } else {
                println!("Blocked account: {}", view.id);
            }
        }

        AccountCommands::Unblock { id } => {
            let view = service
                .blocking_operation(id, BlockingOperation::Unblock)
                .await?;
            if json {
                print_json(&view)?;
            } else {
                println!("Unblocked account: {}", view.id);
            }
        }
    }

    Ok(())
}

async fn run_operation_command(
    service: &AccountService,
    account_id: Uuid,
    operation: OperationType,
    amount: &str,
    json: bool,
) -> Result<()> {
    let amount = parse_amount(amount).context("Invalid amount format. Use '50.00' or '50'")?;
    let view = service
        .apply_operation(account_id, operation, amount)
        .await?;

    if json {
        print_json(&view)?;
    } else {
        println!(
            "Recorded {}: {} on {} (balance {})",
            operation,
            format_amount(amount),
            view.id,
            format_amount(view.balance)
        );
    }

    Ok(())
}

async fn run_check_command(service: &AccountService) -> Result<()> {
    println!("Checking ledger integrity...\n");

    let report = service.check_integrity().await?;

    println!("Users:           {}", report.user_count);
    println!("Accounts:        {}", report.account_count);
    println!("Journal entries: {}", report.journal_count);
    println!();

    let settings = service.settings();
    println!("Rounding:        {}", settings.rounding);
    println!("Amount policy:   {}", settings.amount_policy);
    println!();

    if report.is_healthy() {
        println!("Ledger is consistent.");
    } else {
        println!("Issues found:");
        for issue in &report.issues {
            println!("  - {}", issue);
        }
        anyhow::bail!("Ledger integrity check failed");
    }

    Ok(())
}

fn print_account(view: &AccountView) {
    println!("Account: {}", view.id);
    println!("  Owner:   {}", view.owner_id);
    println!("  Balance: {}", format_amount(view.balance));
    println!("  Status:  {}", status_label(view));
}

fn status_label(view: &AccountView) -> &'static str {
    if view.enabled { "enabled" } else { "blocked" }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
