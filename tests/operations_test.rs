mod common;

use anyhow::Result;
use common::{Holder, dec, test_service, test_service_with};
use reckoning::application::AppError;
use reckoning::config::LedgerSettings;
use reckoning::domain::{AmountPolicy, BlockingOperation, OperationType, RoundingRule};
use uuid::Uuid;

#[tokio::test]
async fn test_credit_increases_balance_and_journals() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let holder = Holder::funded(&service, "alice", "100.00").await?;

    let view = service
        .apply_operation(holder.account.id, OperationType::Credit, dec("50.00"))
        .await?;

    assert_eq!(view.balance, dec("150.00"));
    assert_eq!(view.balance.to_string(), "150.00");

    let journal = service
        .repository()
        .journal_for_account(holder.account.id)
        .await?;
    assert_eq!(journal.len(), 2, "funding entry plus the credit");

    let last = journal.last().unwrap();
    assert_eq!(last.initial_amount, dec("100.00"));
    assert_eq!(last.final_amount, dec("150.00"));
    assert_eq!(last.operation_type, OperationType::Credit);
    assert_eq!(last.account_id, holder.account.id);

    Ok(())
}

#[tokio::test]
async fn test_debit_can_drive_balance_negative() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let holder = Holder::funded(&service, "alice", "100.00").await?;

    let view = service
        .apply_operation(holder.account.id, OperationType::Debit, dec("200.00"))
        .await?;

    assert_eq!(view.balance, dec("-100.00"));

    let journal = service
        .repository()
        .journal_for_account(holder.account.id)
        .await?;
    let last = journal.last().unwrap();
    assert_eq!(last.initial_amount, dec("100.00"));
    assert_eq!(last.final_amount, dec("-100.00"));
    assert_eq!(last.operation_type, OperationType::Debit);

    let stored = service.get_account(holder.account.id).await?;
    assert_eq!(stored.balance, dec("-100.00"));

    Ok(())
}

#[tokio::test]
async fn test_each_operation_adds_exactly_one_entry() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let holder = Holder::create(&service, "alice").await?;
    let id = holder.account.id;

    let operations = [
        (OperationType::Credit, "10.00"),
        (OperationType::Debit, "2.50"),
        (OperationType::Credit, "0.75"),
        (OperationType::Debit, "20.00"),
    ];

    let mut previous = holder.account.balance;
    for (count, (operation, amount)) in operations.iter().enumerate() {
        let view = service.apply_operation(id, *operation, dec(amount)).await?;
        let journal = service.repository().journal_for_account(id).await?;

        assert_eq!(journal.len(), count + 1);
        let entry = journal.last().unwrap();
        assert_eq!(entry.initial_amount, previous);
        assert_eq!(entry.final_amount, view.balance);
        previous = view.balance;
    }

    assert_eq!(previous, dec("-11.75"));

    let journal = service.repository().journal_for_account(id).await?;
    let sequences: Vec<i64> = journal.iter().map(|e| e.sequence).collect();
    let mut sorted = sequences.clone();
    sorted.sort();
    assert_eq!(sequences, sorted, "journal is insertion ordered");

    Ok(())
}

#[tokio::test]
async fn test_balance_is_rounded_half_down() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let holder = Holder::funded(&service, "alice", "1.00").await?;
    let id = holder.account.id;

    // 1.00 + 0.005 = 1.005 -> 1.00
    let view = service
        .apply_operation(id, OperationType::Credit, dec("0.005"))
        .await?;
    assert_eq!(view.balance, dec("1.00"));

    // 1.00 - 2.005 = -1.005 -> -1.01
    let view = service
        .apply_operation(id, OperationType::Debit, dec("2.005"))
        .await?;
    assert_eq!(view.balance, dec("-1.01"));
    assert_eq!(view.balance.to_string(), "-1.01");

    Ok(())
}

#[tokio::test]
async fn test_configured_rounding_rule_is_used() -> Result<()> {
    let settings = LedgerSettings {
        rounding: RoundingRule::HalfUp,
        ..LedgerSettings::default()
    };
    let (service, _temp) = test_service_with(settings).await?;
    let holder = Holder::funded(&service, "alice", "1.00").await?;

    let view = service
        .apply_operation(holder.account.id, OperationType::Credit, dec("0.005"))
        .await?;
    assert_eq!(view.balance, dec("1.01"));

    Ok(())
}

#[tokio::test]
async fn test_blocked_account_rejects_operations() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let holder = Holder::funded(&service, "alice", "100.00").await?;
    let id = holder.account.id;

    service
        .blocking_operation(id, BlockingOperation::Block)
        .await?;

    for operation in [OperationType::Credit, OperationType::Debit] {
        let result = service.apply_operation(id, operation, dec("10.00")).await;
        assert!(
            matches!(result, Err(AppError::AccountBlocked(blocked)) if blocked == id),
            "{operation} on a blocked account must fail"
        );
    }

    let stored = service.get_account(id).await?;
    assert_eq!(stored.balance, dec("100.00"));
    assert_eq!(
        service.repository().journal_for_account(id).await?.len(),
        1,
        "only the funding entry exists"
    );

    Ok(())
}

#[tokio::test]
async fn test_blocked_fresh_account_has_no_journal() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let holder = Holder::create(&service, "alice").await?;
    let id = holder.account.id;

    service
        .blocking_operation(id, BlockingOperation::Block)
        .await?;
    let result = service
        .apply_operation(id, OperationType::Credit, dec("5.00"))
        .await;

    assert!(matches!(result, Err(AppError::AccountBlocked(_))));
    assert!(service.repository().journal_for_account(id).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_unknown_account_is_not_found() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let missing = Uuid::new_v4();

    let err = service
        .apply_operation(missing, OperationType::Credit, dec("1.00"))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(matches!(err, AppError::AccountNotFound(id) if id == missing));

    Ok(())
}

#[tokio::test]
async fn test_negative_amount_rejected_by_default() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let holder = Holder::funded(&service, "alice", "10.00").await?;
    let id = holder.account.id;

    let result = service
        .apply_operation(id, OperationType::Debit, dec("-5.00"))
        .await;
    assert!(matches!(result, Err(AppError::InvalidAmount(_))));

    assert_eq!(service.get_account(id).await?.balance, dec("10.00"));
    assert_eq!(service.repository().journal_for_account(id).await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_negative_amount_allowed_by_policy() -> Result<()> {
    let settings = LedgerSettings {
        amount_policy: AmountPolicy::AllowNegative,
        ..LedgerSettings::default()
    };
    let (service, _temp) = test_service_with(settings).await?;
    let holder = Holder::funded(&service, "alice", "10.00").await?;

    // A debit of a negative amount credits the account
    let view = service
        .apply_operation(holder.account.id, OperationType::Debit, dec("-5.00"))
        .await?;
    assert_eq!(view.balance, dec("15.00"));

    Ok(())
}

#[tokio::test]
async fn test_zero_amount_is_journaled() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let holder = Holder::funded(&service, "alice", "3.00").await?;

    let view = service
        .apply_operation(holder.account.id, OperationType::Credit, dec("0"))
        .await?;
    assert_eq!(view.balance, dec("3.00"));

    let journal = service
        .repository()
        .journal_for_account(holder.account.id)
        .await?;
    assert_eq!(journal.len(), 2);
    assert_eq!(journal[1].initial_amount, journal[1].final_amount);

    Ok(())
}

#[tokio::test]
async fn test_balance_beyond_decimal_range_is_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let holder = Holder::create(&service, "alice").await?;
    let id = holder.account.id;

    // Fits a Decimal, but not with two fractional digits
    let result = service
        .apply_operation(id, OperationType::Credit, dec("79228162514264337593543950335"))
        .await;
    assert!(matches!(result, Err(AppError::InvalidAmount(_))));
    assert_eq!(service.get_account(id).await?.balance, dec("0.00"));
    assert!(service.repository().journal_for_account(id).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_overflowing_credit_leaves_account_untouched() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let holder = Holder::funded(&service, "alice", "700000000000000000000000000.00").await?;
    let id = holder.account.id;

    for amount in ["79228162514264337593543950335", "700000000000000000000000000.00"] {
        let result = service
            .apply_operation(id, OperationType::Credit, dec(amount))
            .await;
        assert!(
            matches!(result, Err(AppError::InvalidAmount(_))),
            "credit of {amount} must be rejected"
        );
    }

    let stored = service.get_account(id).await?;
    assert_eq!(stored.balance, dec("700000000000000000000000000.00"));
    assert_eq!(service.repository().journal_for_account(id).await?.len(), 1);

    // The account is still usable afterwards
    let view = service
        .apply_operation(id, OperationType::Debit, dec("0.01"))
        .await?;
    assert_eq!(view.balance, dec("699999999999999999999999999.99"));

    Ok(())
}

#[tokio::test]
async fn test_failed_journal_write_rolls_back_balance() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let holder = Holder::funded(&service, "alice", "100.00").await?;
    let id = holder.account.id;

    sqlx::query(
        "CREATE TRIGGER journal_unavailable BEFORE INSERT ON journal \
         BEGIN SELECT RAISE(ABORT, 'journal unavailable'); END",
    )
    .execute(service.repository().pool())
    .await?;

    let result = service
        .apply_operation(id, OperationType::Debit, dec("40.00"))
        .await;
    assert!(matches!(result, Err(AppError::Database(_))));

    assert_eq!(service.get_account(id).await?.balance, dec("100.00"));
    assert_eq!(service.repository().journal_for_account(id).await?.len(), 1);

    Ok(())
}
