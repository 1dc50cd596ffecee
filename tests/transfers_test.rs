mod common;

use anyhow::Result;
use chrono::Utc;
use common::{test_service, ScenarioBank};
use minibank::application::AppError;
use uuid::Uuid;

#[tokio::test]
async fn test_transfer_moves_money_and_conserves_total() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let bank = ScenarioBank::setup(&service).await?;

    let total_before = bank.total_balance(&service).await?;

    // Scenario 1: 2000.00 from acc1 to acc2
    let receipt = service
        .transfer(bank.acc1, bank.acc2, 200_000, Utc::now())
        .await?;

    assert_eq!(service.get_account(bank.acc1).await?.balance_cents, 300_000);
    assert_eq!(service.get_account(bank.acc2).await?.balance_cents, 1_200_000);
    assert_eq!(receipt.transaction.amount_cents, 200_000);
    // 2000.00 is below the large-transfer threshold
    assert!(receipt.audit_marker.is_none());

    let total_after = bank.total_balance(&service).await?;
    assert_eq!(total_before, total_after, "transfers only redistribute");

    let transactions = service.list_transactions().await?;
    assert_eq!(transactions.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_scenario_chain() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let bank = ScenarioBank::setup(&service).await?;

    // Scenario 1: transfer(1, 2, 2000.00)
    service
        .transfer(bank.acc1, bank.acc2, 200_000, Utc::now())
        .await?;
    assert_eq!(service.get_account(bank.acc1).await?.balance_cents, 300_000);
    assert_eq!(service.get_account(bank.acc2).await?.balance_cents, 1_200_000);

    // Scenario 2: transfer(2, 3, 3000.00)
    service
        .transfer(bank.acc2, bank.acc3, 300_000, Utc::now())
        .await?;
    assert_eq!(service.get_account(bank.acc2).await?.balance_cents, 900_000);
    assert_eq!(service.get_account(bank.acc3).await?.balance_cents, 1_000_000);

    // Scenario 3: transfer(3, 1, 8000.00) - above the threshold, so the
    // ledger gains the transaction plus one audit marker
    let receipt = service
        .transfer(bank.acc3, bank.acc1, 800_000, Utc::now())
        .await?;
    assert_eq!(service.get_account(bank.acc3).await?.balance_cents, 200_000);
    assert_eq!(service.get_account(bank.acc1).await?.balance_cents, 1_100_000);
    assert!(receipt.audit_marker.is_some());

    // Scenario 4: transfer(3, 1, 999999.00) fails; balances unchanged
    let err = service
        .transfer(bank.acc3, bank.acc1, 99_999_900, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientBalance { .. }));
    assert_eq!(service.get_account(bank.acc3).await?.balance_cents, 200_000);
    assert_eq!(service.get_account(bank.acc1).await?.balance_cents, 1_100_000);

    // 3 real transfers + 1 audit marker
    let transactions = service.list_transactions().await?;
    assert_eq!(transactions.len(), 4);

    Ok(())
}

#[tokio::test]
async fn test_insufficient_balance_leaves_store_unmodified() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let bank = ScenarioBank::setup(&service).await?;

    let err = service
        .transfer(bank.acc1, bank.acc2, 500_001, Utc::now())
        .await
        .unwrap_err();

    match err {
        AppError::InsufficientBalance {
            balance, required, ..
        } => {
            assert_eq!(balance, 500_000);
            assert_eq!(required, 500_001);
        }
        other => panic!("expected InsufficientBalance, got {:?}", other),
    }

    assert_eq!(service.get_account(bank.acc1).await?.balance_cents, 500_000);
    assert_eq!(service.get_account(bank.acc2).await?.balance_cents, 1_000_000);
    assert!(service.list_transactions().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_exact_balance_transfer_succeeds() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let bank = ScenarioBank::setup(&service).await?;

    // senderBalance >= amount allows draining the account to zero
    service
        .transfer(bank.acc1, bank.acc2, 500_000, Utc::now())
        .await?;
    assert_eq!(service.get_account(bank.acc1).await?.balance_cents, 0);

    Ok(())
}

#[tokio::test]
async fn test_large_transfer_appends_exactly_one_audit_marker() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let bank = ScenarioBank::setup(&service).await?;

    let receipt = service
        .transfer(bank.acc2, bank.acc3, 600_000, Utc::now())
        .await?;

    let marker = receipt.audit_marker.expect("6000.00 exceeds the threshold");
    assert_eq!(marker.amount_cents, 0);
    assert_eq!(marker.from_account, bank.acc2);
    assert_eq!(marker.to_account, bank.acc3);
    assert!(marker.is_audit_marker());

    let transactions = service.list_transactions().await?;
    assert_eq!(transactions.len(), 2);
    let markers: Vec<_> = transactions.iter().filter(|t| t.is_audit_marker()).collect();
    assert_eq!(markers.len(), 1);

    // The marker follows its transfer in insertion order
    assert!(transactions[0].amount_cents > 0);
    assert_eq!(transactions[1].amount_cents, 0);
    assert!(transactions[0].sequence < transactions[1].sequence);

    // Markers carry zero amount, so the total is still conserved
    assert_eq!(bank.total_balance(&service).await?, 2_200_000);

    Ok(())
}

#[tokio::test]
async fn test_transfer_at_threshold_has_no_marker() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let bank = ScenarioBank::setup(&service).await?;

    // Exactly 5000.00: the rule is strictly greater-than
    let receipt = service
        .transfer(bank.acc2, bank.acc1, 500_000, Utc::now())
        .await?;
    assert!(receipt.audit_marker.is_none());
    assert_eq!(service.list_transactions().await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_transfer_to_unknown_account_fails() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let bank = ScenarioBank::setup(&service).await?;

    let unknown = Uuid::new_v4();

    let err = service
        .transfer(bank.acc1, unknown, 100_000, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AccountNotFound(_)));

    let err = service
        .transfer(unknown, bank.acc1, 100_000, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AccountNotFound(_)));

    // Nothing was recorded and no balance moved
    assert!(service.list_transactions().await?.is_empty());
    assert_eq!(service.get_account(bank.acc1).await?.balance_cents, 500_000);

    Ok(())
}

#[tokio::test]
async fn test_transfer_rejects_invalid_amounts() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let bank = ScenarioBank::setup(&service).await?;

    let err = service
        .transfer(bank.acc1, bank.acc2, 0, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = service
        .transfer(bank.acc1, bank.acc2, -100, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = service
        .transfer(bank.acc1, bank.acc1, 100, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    Ok(())
}

#[tokio::test]
async fn test_integrity_check_on_healthy_ledger() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let bank = ScenarioBank::setup(&service).await?;

    service
        .transfer(bank.acc2, bank.acc1, 600_000, Utc::now())
        .await?;

    let stats = service.check_integrity().await?;
    assert_eq!(stats.customer_count, 3);
    assert_eq!(stats.account_count, 3);
    assert_eq!(stats.transaction_count, 2); // transfer + audit marker
    assert_eq!(stats.total_balance_cents, 2_200_000);
    assert_eq!(stats.invalid_account_refs, 0);
    assert_eq!(stats.negative_balances, 0);
    assert_eq!(stats.negative_amounts, 0);

    Ok(())
}
