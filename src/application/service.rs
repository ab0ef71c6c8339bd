use chrono::Utc;
use rust_decimal::Decimal;

use crate::config::LedgerSettings;
use crate::domain::{
    Account, AccountId, AccountView, BlockingOperation, IntegrityReport, OperationType, User,
    UserId, format_amount, normalize_username, verify_account_journal,
};
use crate::storage::Repository;

use super::AppError;

/// Application service providing the account ledger operations.
/// This is the primary interface for any client (CLI, API, etc.).
pub struct AccountService {
    repo: Repository,
    settings: LedgerSettings,
}

impl AccountService {
    /// Create a new service with the given repository and ledger rules.
    pub fn new(repo: Repository, settings: LedgerSettings) -> Self {
        Self { repo, settings }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str, settings: LedgerSettings) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo, settings))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str, settings: LedgerSettings) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo, settings))
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub fn settings(&self) -> LedgerSettings {
        self.settings
    }

    // ========================
    // User operations
    // ========================

    /// Register a new account holder.
    pub async fn register_user(&self, username: &str) -> Result<User, AppError> {
        let username = normalize_username(username)
            .ok_or_else(|| AppError::InvalidUsername(username.to_string()))?;

        if self.repo.find_user_by_name(&username).await?.is_some() {
            return Err(AppError::UserAlreadyExists(username));
        }

        let user = User::new(username);
        self.repo.save_user(&user).await?;

        tracing::info!("User {} registered", user.username);
        Ok(user)
    }

    /// Get a user by username.
    pub async fn get_user_by_name(&self, username: &str) -> Result<User, AppError> {
        self.repo
            .find_user_by_name(username.trim())
            .await?
            .ok_or_else(|| AppError::UserNotFound(username.to_string()))
    }

    /// List all users.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.repo.list_users().await?)
    }

    // ========================
    // Account operations
    // ========================

    /// Open a new account for an existing user: zero balance, enabled.
    pub async fn create_account(&self, owner_id: UserId) -> Result<AccountView, AppError> {
        let mut uow = self.repo.begin().await?;

        let owner = uow
            .find_user(owner_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(owner_id.to_string()))?;

        let account = Account::new(owner.id);
        uow.save_account(&account).await?;
        uow.commit().await?;

        tracing::info!("Account of user {} created", owner.username);
        Ok(AccountView::from(&account))
    }

    /// Get a single account.
    pub async fn get_account(&self, account_id: AccountId) -> Result<AccountView, AppError> {
        self.repo
            .find_account(account_id)
            .await?
            .map(AccountView::from)
            .ok_or(AppError::AccountNotFound(account_id))
    }

    /// All accounts of one owner; empty when the owner has none (or does not exist).
    pub async fn list_accounts_for_user(
        &self,
        owner_id: UserId,
    ) -> Result<Vec<AccountView>, AppError> {
        let accounts = self.repo.find_accounts_by_owner(owner_id).await?;
        Ok(accounts.iter().map(AccountView::from).collect())
    }

    /// Enable or disable an account. Applying the current state again is not an error.
    pub async fn blocking_operation(
        &self,
        account_id: AccountId,
        operation: BlockingOperation,
    ) -> Result<AccountView, AppError> {
        let mut uow = self.repo.begin().await?;

        let mut account = uow
            .find_account(account_id)
            .await?
            .ok_or(AppError::AccountNotFound(account_id))?;

        account.enabled = operation.enabled();
        uow.save_account(&account).await?;
        uow.commit().await?;

        tracing::info!("Account {} {}ed", account.id, operation);
        Ok(AccountView::from(&account))
    }

    /// Credit or debit an account and journal the change.
    ///
    /// The account update and the journal entry are written in one unit of work:
    /// either both are committed or neither is. Blocked accounts, and operations
    /// whose resulting balance is out of range, are rejected before anything is written.
    pub async fn apply_operation(
        &self,
        account_id: AccountId,
        operation: OperationType,
        amount: Decimal,
    ) -> Result<AccountView, AppError> {
        if !self.settings.amount_policy.permits(amount) {
            return Err(AppError::InvalidAmount(format!(
                "{} is not allowed under the {} amount policy",
                amount, self.settings.amount_policy
            )));
        }

        let mut uow = self.repo.begin().await?;

        let mut account = uow
            .find_account(account_id)
            .await?
            .ok_or(AppError::AccountNotFound(account_id))?;

        if account.is_blocked() {
            tracing::info!("Account {} blocked", account.id);
            return Err(AppError::AccountBlocked(account.id));
        }

        let mut entry = account
            .apply(operation, amount, self.settings.rounding, Utc::now())
            .map_err(|err| {
                tracing::warn!("Rejected {} on account {}: {}", operation, account_id, err);
                AppError::InvalidAmount(err.to_string())
            })?;

        uow.save_account(&account).await?;
        uow.append_journal(&mut entry).await?;
        uow.commit().await?;

        tracing::debug!(
            "Account {} changed by {} {}: {} -> {}",
            account.id,
            operation,
            amount,
            format_amount(entry.initial_amount),
            format_amount(entry.final_amount)
        );

        Ok(AccountView::from(&account))
    }

    // ========================
    // Integrity operations
    // ========================

    /// Check every account's balance against its journal.
    pub async fn check_integrity(&self) -> Result<IntegrityReport, AppError> {
        let stats = self.repo.get_stats().await?;
        let mut report = IntegrityReport {
            user_count: stats.user_count,
            account_count: stats.account_count,
            journal_count: stats.journal_count,
            issues: Vec::new(),
        };

        for account in self.repo.list_accounts().await? {
            let entries = self.repo.journal_for_account(account.id).await?;
            report
                .issues
                .extend(verify_account_journal(&account, &entries));
        }

        if !report.is_healthy() {
            tracing::warn!("Integrity check found {} issue(s)", report.issues.len());
        }

        Ok(report)
    }
}
