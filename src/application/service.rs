use chrono::{DateTime, Utc};

use crate::domain::{
    Account, AccountId, AccountType, Cents, Customer, CustomerId, Transaction,
};
use crate::storage::{
    AccountSummary, IntegrityStats, MonthlySpendingRow, Repository, TopCustomerRow,
    TransactionViewRow, TransferOutcome,
};

use super::AppError;

/// Result of a completed transfer: the recorded transaction plus the
/// zero-amount audit marker, when the amount crossed the large-transfer
/// threshold.
#[derive(Debug)]
pub struct TransferReceipt {
    pub transaction: Transaction,
    pub audit_marker: Option<Transaction>,
}

/// Application service providing the bank's operations.
/// This is the primary interface for any client (CLI, tests, exporters).
pub struct BankService {
    repo: Repository,
}

impl BankService {
    /// Create a new bank service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // Customer operations
    // ========================

    /// Register a new customer. Name and email are required; email must be
    /// unique.
    pub async fn open_customer(
        &self,
        name: &str,
        email: &str,
        phone: Option<String>,
    ) -> Result<Customer, AppError> {
        let name = name.trim();
        let email = email.trim();

        if name.is_empty() {
            return Err(AppError::Validation("customer name is required".into()));
        }
        if email.is_empty() {
            return Err(AppError::Validation("customer email is required".into()));
        }

        if self.repo.get_customer_by_email(email).await?.is_some() {
            return Err(AppError::DuplicateEmail(email.to_string()));
        }

        let mut customer = Customer::new(name, email);
        if let Some(phone) = phone {
            customer = customer.with_phone(phone);
        }

        self.repo.save_customer(&customer).await?;
        Ok(customer)
    }

    /// Get a customer by ID.
    pub async fn get_customer(&self, id: CustomerId) -> Result<Customer, AppError> {
        self.repo
            .get_customer(id)
            .await?
            .ok_or_else(|| AppError::CustomerNotFound(id.to_string()))
    }

    /// Get a customer by email.
    pub async fn get_customer_by_email(&self, email: &str) -> Result<Customer, AppError> {
        self.repo
            .get_customer_by_email(email)
            .await?
            .ok_or_else(|| AppError::CustomerNotFound(email.to_string()))
    }

    /// List all customers.
    pub async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        Ok(self.repo.list_customers().await?)
    }

    // ========================
    // Account operations
    // ========================

    /// Open an account for an existing customer with a starting balance.
    pub async fn open_account(
        &self,
        customer_id: CustomerId,
        account_type: AccountType,
        initial_balance_cents: Cents,
    ) -> Result<Account, AppError> {
        if initial_balance_cents < 0 {
            return Err(AppError::Validation(
                "initial balance cannot be negative".into(),
            ));
        }

        if self.repo.get_customer(customer_id).await?.is_none() {
            return Err(AppError::CustomerNotFound(customer_id.to_string()));
        }

        let account = Account::new(customer_id, account_type, initial_balance_cents);
        self.repo.save_account(&account).await?;
        Ok(account)
    }

    /// Get an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<Account, AppError> {
        self.repo
            .get_account(id)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(id.to_string()))
    }

    /// List all accounts owned by a customer.
    pub async fn list_accounts_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Account>, AppError> {
        Ok(self.repo.list_accounts_for_customer(customer_id).await?)
    }

    /// List all accounts with their owning customer's name.
    pub async fn account_summaries(&self) -> Result<Vec<AccountSummary>, AppError> {
        Ok(self.repo.list_account_summaries().await?)
    }

    // ========================
    // Transfer
    // ========================

    /// Move money between two accounts. Debit, credit, the transaction
    /// record and any audit marker are one atomic unit of work; on failure
    /// nothing is persisted.
    pub async fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount_cents: Cents,
        transaction_date: DateTime<Utc>,
    ) -> Result<TransferReceipt, AppError> {
        if amount_cents <= 0 {
            return Err(AppError::Validation(
                "transfer amount must be positive".into(),
            ));
        }
        if from == to {
            return Err(AppError::Validation(
                "cannot transfer an account to itself".into(),
            ));
        }

        match self
            .repo
            .transfer(from, to, amount_cents, transaction_date)
            .await?
        {
            TransferOutcome::Completed {
                transaction,
                audit_marker,
            } => Ok(TransferReceipt {
                transaction,
                audit_marker,
            }),
            TransferOutcome::InsufficientBalance { balance } => {
                Err(AppError::InsufficientBalance {
                    account_id: from,
                    balance,
                    required: amount_cents,
                })
            }
            TransferOutcome::MissingAccount { account_id } => {
                Err(AppError::AccountNotFound(account_id.to_string()))
            }
        }
    }

    /// Get a single transaction by ID.
    pub async fn get_transaction(
        &self,
        id: crate::domain::TransactionId,
    ) -> Result<Transaction, AppError> {
        self.repo
            .get_transaction(id)
            .await?
            .ok_or_else(|| AppError::TransactionNotFound(id.to_string()))
    }

    /// List raw transactions in insertion order.
    pub async fn list_transactions(&self) -> Result<Vec<Transaction>, AppError> {
        Ok(self.repo.list_transactions().await?)
    }

    // ========================
    // Reporting views
    // ========================

    /// The joined transaction view: transaction, sender and receiver
    /// customer names, in insertion order.
    pub async fn transactions_view(&self) -> Result<Vec<TransactionViewRow>, AppError> {
        Ok(self.repo.transactions_view().await?)
    }

    /// Total spent per sender customer per calendar month.
    pub async fn monthly_spending(&self) -> Result<Vec<MonthlySpendingRow>, AppError> {
        Ok(self.repo.monthly_spending().await?)
    }

    /// Transactions above the suspicious-amount threshold.
    pub async fn suspicious_transactions(&self) -> Result<Vec<TransactionViewRow>, AppError> {
        Ok(self.repo.suspicious_transactions().await?)
    }

    /// Sender customers ordered by descending transaction count.
    pub async fn top_customers(&self, limit: i64) -> Result<Vec<TopCustomerRow>, AppError> {
        Ok(self.repo.top_customers(limit).await?)
    }

    // ========================
    // Integrity
    // ========================

    /// Check ledger integrity and return the stats.
    pub async fn check_integrity(&self) -> Result<IntegrityStats, AppError> {
        Ok(self.repo.get_integrity_stats().await?)
    }
}
