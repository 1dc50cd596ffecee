use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountId, Cents};

pub type TransactionId = Uuid;

/// Transfers above this amount get a zero-amount audit marker appended in
/// the same unit of work.
pub const LARGE_TRANSFER_THRESHOLD_CENTS: Cents = 500_000;

/// Transactions above this amount show up in the suspicious-transactions
/// report.
pub const SUSPICIOUS_AMOUNT_CENTS: Cents = 1_000_000;

/// A transaction records a movement of money between two accounts.
/// Transactions are immutable once recorded (append-only ledger).
///
/// A zero-amount transaction with the same from/to pair as a real transfer
/// is an audit marker for a large transfer, not a movement of money.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// Monotonically increasing sequence number, assigned by the repository.
    /// Defines insertion order for the reporting views.
    pub sequence: i64,
    /// Source account (balance decreases)
    pub from_account: AccountId,
    /// Destination account (balance increases)
    pub to_account: AccountId,
    /// Amount in cents. Positive for real transfers, exactly 0 for audit
    /// markers.
    pub amount_cents: Cents,
    pub transaction_date: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transfer record. Sequence is assigned by the repository.
    pub fn new(
        from_account: AccountId,
        to_account: AccountId,
        amount_cents: Cents,
        transaction_date: DateTime<Utc>,
    ) -> Self {
        assert!(amount_cents > 0, "Transaction amount must be positive");
        Self {
            id: Uuid::new_v4(),
            sequence: 0, // Will be set by repository
            from_account,
            to_account,
            amount_cents,
            transaction_date,
        }
    }

    /// Create the zero-amount audit marker for a large transfer. Shares the
    /// from/to pair and date of the original. Markers carry amount 0, so
    /// they can never be large transfers themselves.
    pub fn audit_marker(original: &Transaction) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence: 0,
            from_account: original.from_account,
            to_account: original.to_account,
            amount_cents: 0,
            transaction_date: original.transaction_date,
        }
    }

    pub fn is_audit_marker(&self) -> bool {
        self.amount_cents == 0
    }

    /// Whether recording this transaction must also record an audit marker.
    pub fn is_large(&self) -> bool {
        self.amount_cents > LARGE_TRANSFER_THRESHOLD_CENTS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_account_ids() -> (AccountId, AccountId) {
        (Uuid::new_v4(), Uuid::new_v4())
    }

    #[test]
    fn test_create_transaction() {
        let (from, to) = sample_account_ids();
        let txn = Transaction::new(from, to, 200_000, Utc::now());

        assert_eq!(txn.from_account, from);
        assert_eq!(txn.to_account, to);
        assert_eq!(txn.amount_cents, 200_000);
        assert!(!txn.is_audit_marker());
        assert!(!txn.is_large());
    }

    #[test]
    fn test_large_transfer_threshold_is_exclusive() {
        let (from, to) = sample_account_ids();
        let at_threshold = Transaction::new(from, to, LARGE_TRANSFER_THRESHOLD_CENTS, Utc::now());
        assert!(!at_threshold.is_large());

        let above = Transaction::new(from, to, LARGE_TRANSFER_THRESHOLD_CENTS + 1, Utc::now());
        assert!(above.is_large());
    }

    #[test]
    fn test_audit_marker_shares_pair_and_date() {
        let (from, to) = sample_account_ids();
        let original = Transaction::new(from, to, 800_000, Utc::now());
        let marker = Transaction::audit_marker(&original);

        assert_eq!(marker.from_account, from);
        assert_eq!(marker.to_account, to);
        assert_eq!(marker.amount_cents, 0);
        assert_eq!(marker.transaction_date, original.transaction_date);
        assert!(marker.is_audit_marker());
        // Markers never qualify as large, so they never cascade.
        assert!(!marker.is_large());
    }

    #[test]
    #[should_panic(expected = "Transaction amount must be positive")]
    fn test_transaction_requires_positive_amount() {
        let (from, to) = sample_account_ids();
        Transaction::new(from, to, 0, Utc::now());
    }
}
