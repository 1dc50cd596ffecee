use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::domain::{
    Account, AccountId, AccountType, Cents, Customer, CustomerId, SUSPICIOUS_AMOUNT_CENTS,
    Transaction, TransactionId,
};

use super::MIGRATION_001_INITIAL;

/// One row of the joined transaction view: transaction plus the names of the
/// sending and receiving customers. Recomputed on every query.
#[derive(Debug, Clone)]
pub struct TransactionViewRow {
    pub transaction_id: TransactionId,
    pub sequence: i64,
    pub sender_name: String,
    pub receiver_name: String,
    pub amount_cents: Cents,
    pub transaction_date: DateTime<Utc>,
}

/// Total spent per sender customer per calendar month.
#[derive(Debug, Clone)]
pub struct MonthlySpendingRow {
    pub customer_name: String,
    /// Calendar month as "YYYY-MM"
    pub month: String,
    pub total_spent_cents: Cents,
}

/// Transaction count per sender customer, for the top-customers report.
#[derive(Debug, Clone)]
pub struct TopCustomerRow {
    pub customer_name: String,
    pub transaction_count: i64,
}

/// Account joined with its owning customer's name, for balance listings.
#[derive(Debug, Clone)]
pub struct AccountSummary {
    pub account: Account,
    pub customer_name: String,
}

/// Outcome of the atomic transfer unit of work. Business failures are values
/// here; the application layer maps them to errors. Storage failures proper
/// surface as `anyhow::Error`.
#[derive(Debug, Clone)]
pub enum TransferOutcome {
    Completed {
        transaction: Transaction,
        audit_marker: Option<Transaction>,
    },
    InsufficientBalance {
        balance: Cents,
    },
    MissingAccount {
        account_id: AccountId,
    },
}

/// Statistics for ledger integrity verification.
#[derive(Debug, Clone)]
pub struct IntegrityStats {
    pub customer_count: i64,
    pub account_count: i64,
    pub transaction_count: i64,
    pub total_balance_cents: Cents,
    pub invalid_account_refs: i64,
    pub negative_balances: i64,
    /// Amounts below zero. Zero-amount rows are legitimate audit markers and
    /// are not counted here.
    pub negative_amounts: i64,
}

/// Repository for persisting and querying customers, accounts and the
/// transaction ledger.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Customer operations
    // ========================

    /// Save a new customer to the database.
    pub async fn save_customer(&self, customer: &Customer) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO customers (id, name, email, phone, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(customer.id.to_string())
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(customer.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save customer")?;
        Ok(())
    }

    /// Get a customer by ID.
    pub async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, phone, created_at
            FROM customers
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch customer")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_customer(&row)?)),
            None => Ok(None),
        }
    }

    /// Get a customer by email (emails are unique).
    pub async fn get_customer_by_email(&self, email: &str) -> Result<Option<Customer>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, phone, created_at
            FROM customers
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch customer by email")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_customer(&row)?)),
            None => Ok(None),
        }
    }

    /// List all customers, ordered by name.
    pub async fn list_customers(&self) -> Result<Vec<Customer>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, email, phone, created_at
            FROM customers
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list customers")?;

        rows.iter().map(Self::row_to_customer).collect()
    }

    fn row_to_customer(row: &sqlx::sqlite::SqliteRow) -> Result<Customer> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(Customer {
            id: Uuid::parse_str(&id_str).context("Invalid customer ID")?,
            name: row.get("name"),
            email: row.get("email"),
            phone: row.get("phone"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Account operations
    // ========================

    /// Save a new account to the database.
    pub async fn save_account(&self, account: &Account) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, customer_id, account_type, balance_cents, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(account.id.to_string())
        .bind(account.customer_id.to_string())
        .bind(account.account_type.as_str())
        .bind(account.balance_cents)
        .bind(account.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save account")?;
        Ok(())
    }

    /// Get an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT id, customer_id, account_type, balance_cents, created_at
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_account(&row)?)),
            None => Ok(None),
        }
    }

    /// List all accounts owned by a customer.
    pub async fn list_accounts_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Account>> {
        let rows = sqlx::query(
            r#"
            SELECT id, customer_id, account_type, balance_cents, created_at
            FROM accounts
            WHERE customer_id = ?
            ORDER BY created_at
            "#,
        )
        .bind(customer_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list accounts for customer")?;

        rows.iter().map(Self::row_to_account).collect()
    }

    /// List all accounts joined with their owning customer's name.
    pub async fn list_account_summaries(&self) -> Result<Vec<AccountSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT a.id, a.customer_id, a.account_type, a.balance_cents, a.created_at,
                   c.name AS customer_name
            FROM accounts a
            JOIN customers c ON c.id = a.customer_id
            ORDER BY c.name, a.created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list account summaries")?;

        rows.iter()
            .map(|row| {
                Ok(AccountSummary {
                    account: Self::row_to_account(row)?,
                    customer_name: row.get("customer_name"),
                })
            })
            .collect()
    }

    fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Result<Account> {
        let id_str: String = row.get("id");
        let customer_id_str: String = row.get("customer_id");
        let account_type_str: String = row.get("account_type");
        let created_at_str: String = row.get("created_at");

        Ok(Account {
            id: Uuid::parse_str(&id_str).context("Invalid account ID")?,
            customer_id: Uuid::parse_str(&customer_id_str).context("Invalid customer ID")?,
            account_type: AccountType::from_str(&account_type_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid account type: {}", account_type_str))?,
            balance_cents: row.get("balance_cents"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Transfer unit of work
    // ========================

    /// Execute a transfer as one atomic unit of work: balance check, debit,
    /// credit, transaction insert and (for large transfers) the audit-marker
    /// insert all commit together or not at all.
    pub async fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount_cents: Cents,
        transaction_date: DateTime<Utc>,
    ) -> Result<TransferOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transfer transaction")?;

        let sender = sqlx::query("SELECT balance_cents FROM accounts WHERE id = ?")
            .bind(from.to_string())
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to read sender balance")?;
        let Some(sender) = sender else {
            return Ok(TransferOutcome::MissingAccount { account_id: from });
        };
        let balance: Cents = sender.get("balance_cents");

        let receiver = sqlx::query("SELECT 1 FROM accounts WHERE id = ?")
            .bind(to.to_string())
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to read receiver account")?;
        if receiver.is_none() {
            return Ok(TransferOutcome::MissingAccount { account_id: to });
        }

        if balance < amount_cents {
            // Dropping the transaction rolls it back; nothing was written.
            return Ok(TransferOutcome::InsufficientBalance { balance });
        }

        sqlx::query("UPDATE accounts SET balance_cents = balance_cents - ? WHERE id = ?")
            .bind(amount_cents)
            .bind(from.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to debit sender")?;

        sqlx::query("UPDATE accounts SET balance_cents = balance_cents + ? WHERE id = ?")
            .bind(amount_cents)
            .bind(to.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to credit receiver")?;

        let mut transaction = Transaction::new(from, to, amount_cents, transaction_date);
        transaction.sequence = Self::next_sequence(&mut tx).await?;
        Self::insert_transaction(&mut tx, &transaction).await?;

        let audit_marker = if transaction.is_large() {
            let mut marker = Transaction::audit_marker(&transaction);
            marker.sequence = Self::next_sequence(&mut tx).await?;
            Self::insert_transaction(&mut tx, &marker).await?;
            Some(marker)
        } else {
            None
        };

        tx.commit()
            .await
            .context("Failed to commit transfer transaction")?;

        Ok(TransferOutcome::Completed {
            transaction,
            audit_marker,
        })
    }

    /// Get the next sequence number and increment the counter.
    async fn next_sequence(conn: &mut SqliteConnection) -> Result<i64> {
        let row = sqlx::query(
            r#"
            UPDATE sequence_counter
            SET value = value + 1
            WHERE name = 'transaction_sequence'
            RETURNING value
            "#,
        )
        .fetch_one(conn)
        .await
        .context("Failed to get next sequence number")?;

        Ok(row.get("value"))
    }

    async fn insert_transaction(conn: &mut SqliteConnection, txn: &Transaction) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO transactions (id, sequence, from_account_id, to_account_id, amount_cents, transaction_date)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(txn.id.to_string())
        .bind(txn.sequence)
        .bind(txn.from_account.to_string())
        .bind(txn.to_account.to_string())
        .bind(txn.amount_cents)
        .bind(txn.transaction_date.to_rfc3339())
        .execute(conn)
        .await
        .context("Failed to insert transaction")?;
        Ok(())
    }

    /// Get a transaction by ID.
    pub async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>> {
        let row = sqlx::query(
            r#"
            SELECT id, sequence, from_account_id, to_account_id, amount_cents, transaction_date
            FROM transactions
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch transaction")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_transaction(&row)?)),
            None => Ok(None),
        }
    }

    /// List all transactions in insertion order.
    pub async fn list_transactions(&self) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, sequence, from_account_id, to_account_id, amount_cents, transaction_date
            FROM transactions
            ORDER BY sequence
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list transactions")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    fn row_to_transaction(row: &sqlx::sqlite::SqliteRow) -> Result<Transaction> {
        let id_str: String = row.get("id");
        let from_str: String = row.get("from_account_id");
        let to_str: String = row.get("to_account_id");
        let date_str: String = row.get("transaction_date");

        Ok(Transaction {
            id: Uuid::parse_str(&id_str).context("Invalid transaction ID")?,
            sequence: row.get("sequence"),
            from_account: Uuid::parse_str(&from_str).context("Invalid from_account ID")?,
            to_account: Uuid::parse_str(&to_str).context("Invalid to_account ID")?,
            amount_cents: row.get("amount_cents"),
            transaction_date: DateTime::parse_from_rfc3339(&date_str)
                .context("Invalid transaction_date")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Reporting views
    // ========================

    const VIEW_SELECT: &'static str = r#"
        SELECT t.id, t.sequence, t.amount_cents, t.transaction_date,
               sc.name AS sender_name, rc.name AS receiver_name
        FROM transactions t
        JOIN accounts sa ON sa.id = t.from_account_id
        JOIN customers sc ON sc.id = sa.customer_id
        JOIN accounts ra ON ra.id = t.to_account_id
        JOIN customers rc ON rc.id = ra.customer_id
    "#;

    /// The joined transaction view, in insertion order.
    pub async fn transactions_view(&self) -> Result<Vec<TransactionViewRow>> {
        let query = format!("{} ORDER BY t.sequence", Self::VIEW_SELECT);
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .context("Failed to query transaction view")?;

        rows.iter().map(Self::row_to_view_row).collect()
    }

    /// The joined transaction view filtered to suspicious amounts.
    pub async fn suspicious_transactions(&self) -> Result<Vec<TransactionViewRow>> {
        let query = format!(
            "{} WHERE t.amount_cents > ? ORDER BY t.sequence",
            Self::VIEW_SELECT
        );
        let rows = sqlx::query(&query)
            .bind(SUSPICIOUS_AMOUNT_CENTS)
            .fetch_all(&self.pool)
            .await
            .context("Failed to query suspicious transactions")?;

        rows.iter().map(Self::row_to_view_row).collect()
    }

    /// Total spent per sender customer per calendar month. Audit markers are
    /// included but contribute 0 to the sums.
    pub async fn monthly_spending(&self) -> Result<Vec<MonthlySpendingRow>> {
        let rows = sqlx::query(
            r#"
            SELECT sc.name AS customer_name,
                   substr(t.transaction_date, 1, 7) AS month,
                   SUM(t.amount_cents) AS total_spent
            FROM transactions t
            JOIN accounts sa ON sa.id = t.from_account_id
            JOIN customers sc ON sc.id = sa.customer_id
            GROUP BY sc.name, month
            ORDER BY sc.name, month
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to query monthly spending")?;

        Ok(rows
            .iter()
            .map(|row| MonthlySpendingRow {
                customer_name: row.get("customer_name"),
                month: row.get("month"),
                total_spent_cents: row.get("total_spent"),
            })
            .collect())
    }

    /// Sender customers ordered by descending transaction count, truncated
    /// to `limit`. Audit markers count as rows; ties break arbitrarily.
    pub async fn top_customers(&self, limit: i64) -> Result<Vec<TopCustomerRow>> {
        let rows = sqlx::query(
            r#"
            SELECT sc.name AS customer_name, COUNT(*) AS transaction_count
            FROM transactions t
            JOIN accounts sa ON sa.id = t.from_account_id
            JOIN customers sc ON sc.id = sa.customer_id
            GROUP BY sc.name
            ORDER BY transaction_count DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to query top customers")?;

        Ok(rows
            .iter()
            .map(|row| TopCustomerRow {
                customer_name: row.get("customer_name"),
                transaction_count: row.get("transaction_count"),
            })
            .collect())
    }

    fn row_to_view_row(row: &sqlx::sqlite::SqliteRow) -> Result<TransactionViewRow> {
        let id_str: String = row.get("id");
        let date_str: String = row.get("transaction_date");

        Ok(TransactionViewRow {
            transaction_id: Uuid::parse_str(&id_str).context("Invalid transaction ID")?,
            sequence: row.get("sequence"),
            sender_name: row.get("sender_name"),
            receiver_name: row.get("receiver_name"),
            amount_cents: row.get("amount_cents"),
            transaction_date: DateTime::parse_from_rfc3339(&date_str)
                .context("Invalid transaction_date")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Integrity
    // ========================

    /// Get statistics for integrity checking.
    pub async fn get_integrity_stats(&self) -> Result<IntegrityStats> {
        let customer_count: i64 = sqlx::query("SELECT COUNT(*) as count FROM customers")
            .fetch_one(&self.pool)
            .await?
            .get("count");

        let account_count: i64 = sqlx::query("SELECT COUNT(*) as count FROM accounts")
            .fetch_one(&self.pool)
            .await?
            .get("count");

        let transaction_count: i64 = sqlx::query("SELECT COUNT(*) as count FROM transactions")
            .fetch_one(&self.pool)
            .await?
            .get("count");

        let total_balance_cents: Cents =
            sqlx::query("SELECT COALESCE(SUM(balance_cents), 0) as total FROM accounts")
                .fetch_one(&self.pool)
                .await?
                .get("total");

        // Transactions referencing accounts that don't exist
        let invalid_account_refs: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) as count
            FROM transactions t
            WHERE NOT EXISTS (SELECT 1 FROM accounts a WHERE a.id = t.from_account_id)
               OR NOT EXISTS (SELECT 1 FROM accounts a WHERE a.id = t.to_account_id)
            "#,
        )
        .fetch_one(&self.pool)
        .await?
        .get("count");

        let negative_balances: i64 =
            sqlx::query("SELECT COUNT(*) as count FROM accounts WHERE balance_cents < 0")
                .fetch_one(&self.pool)
                .await?
                .get("count");

        let negative_amounts: i64 =
            sqlx::query("SELECT COUNT(*) as count FROM transactions WHERE amount_cents < 0")
                .fetch_one(&self.pool)
                .await?
                .get("count");

        Ok(IntegrityStats {
            customer_count,
            account_count,
            transaction_count,
            total_balance_cents,
            invalid_account_refs,
            negative_balances,
            negative_amounts,
        })
    }
}
