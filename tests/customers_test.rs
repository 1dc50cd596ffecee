mod common;

use anyhow::Result;
use common::test_service;
use minibank::application::AppError;
use minibank::domain::AccountType;
use uuid::Uuid;

#[tokio::test]
async fn test_register_customer() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let customer = service
        .open_customer("Alice", "alice@example.com", Some("555-0101".into()))
        .await?;
    assert_eq!(customer.name, "Alice");
    assert_eq!(customer.email, "alice@example.com");
    assert_eq!(customer.phone.as_deref(), Some("555-0101"));

    let fetched = service.get_customer(customer.id).await?;
    assert_eq!(fetched.email, customer.email);

    let by_email = service.get_customer_by_email("alice@example.com").await?;
    assert_eq!(by_email.id, customer.id);

    Ok(())
}

#[tokio::test]
async fn test_duplicate_email_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service
        .open_customer("Alice", "alice@example.com", None)
        .await?;

    let err = service
        .open_customer("Other Alice", "alice@example.com", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicateEmail(_)));

    assert_eq!(service.list_customers().await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_registration_requires_name_and_email() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let err = service
        .open_customer("", "alice@example.com", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = service.open_customer("Alice", "   ", None).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    assert!(service.list_customers().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_open_account_for_unknown_customer_fails() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let err = service
        .open_account(Uuid::new_v4(), AccountType::Savings, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::CustomerNotFound(_)));

    Ok(())
}

#[tokio::test]
async fn test_open_account_with_starting_balance() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let customer = service
        .open_customer("Alice", "alice@example.com", None)
        .await?;

    let savings = service
        .open_account(customer.id, AccountType::Savings, 500_000)
        .await?;
    assert_eq!(savings.balance_cents, 500_000);
    assert_eq!(savings.account_type, AccountType::Savings);

    // Default starting balance is zero
    let current = service
        .open_account(customer.id, AccountType::Current, 0)
        .await?;
    assert_eq!(current.balance_cents, 0);

    let accounts = service.list_accounts_for_customer(customer.id).await?;
    assert_eq!(accounts.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_open_account_rejects_negative_balance() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let customer = service
        .open_customer("Alice", "alice@example.com", None)
        .await?;

    let err = service
        .open_account(customer.id, AccountType::Savings, -1)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    Ok(())
}

#[tokio::test]
async fn test_account_summaries_include_owner_names() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let alice = service
        .open_customer("Alice", "alice@example.com", None)
        .await?;
    let bob = service.open_customer("Bob", "bob@example.com", None).await?;

    service
        .open_account(alice.id, AccountType::Savings, 100_000)
        .await?;
    service
        .open_account(bob.id, AccountType::Current, 200_000)
        .await?;

    let summaries = service.account_summaries().await?;
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].customer_name, "Alice");
    assert_eq!(summaries[1].customer_name, "Bob");

    Ok(())
}
