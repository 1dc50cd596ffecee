use thiserror::Error;

use crate::domain::{AccountId, Cents};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("A customer with email {0} is already registered")]
    DuplicateEmail(String),

    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("Insufficient balance in account {account_id}: balance {balance}, required {required}")]
    InsufficientBalance {
        account_id: AccountId,
        balance: Cents,
        required: Cents,
    },

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
