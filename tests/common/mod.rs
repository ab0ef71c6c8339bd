// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::str::FromStr;

use anyhow::Result;
use reckoning::application::AccountService;
use reckoning::config::LedgerSettings;
use reckoning::domain::{AccountView, OperationType, User};
use rust_decimal::Decimal;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database and default rules
pub async fn test_service() -> Result<(AccountService, TempDir)> {
    test_service_with(LedgerSettings::default()).await
}

/// Helper to create a test service with explicit ledger rules
pub async fn test_service_with(settings: LedgerSettings) -> Result<(AccountService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = AccountService::init(db_path.to_str().unwrap(), settings).await?;
    Ok((service, temp_dir))
}

/// Helper to build an exact decimal from a literal
pub fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

/// Test fixture: a registered user with one fresh account
pub struct Holder {
    pub user: User,
    pub account: AccountView,
}

impl Holder {
    /// Register `username` and open an account with a zero balance
    pub async fn create(service: &AccountService, username: &str) -> Result<Self> {
        let user = service.register_user(username).await?;
        let account = service.create_account(user.id).await?;
        Ok(Self { user, account })
    }

    /// Register `username` and open an account funded with `balance`
    pub async fn funded(service: &AccountService, username: &str, balance: &str) -> Result<Self> {
        let mut holder = Self::create(service, username).await?;
        holder.account = service
            .apply_operation(holder.account.id, OperationType::Credit, dec(balance))
            .await?;
        Ok(holder)
    }
}
