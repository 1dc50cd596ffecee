use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, CustomerId};

pub type AccountId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Interest-bearing deposit account
    Savings,
    /// Everyday checking account
    Current,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Savings => "savings",
            AccountType::Current => "current",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "savings" => Some(AccountType::Savings),
            "current" => Some(AccountType::Current),
            _ => None,
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An account belongs to exactly one customer. The balance is mutated only
/// by transfers, always inside the same unit of work that records them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub customer_id: CustomerId,
    pub account_type: AccountType,
    /// Non-negative by convention: transfers refuse to overdraw.
    pub balance_cents: Cents,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(customer_id: CustomerId, account_type: AccountType, balance_cents: Cents) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id,
            account_type,
            balance_cents,
            created_at: Utc::now(),
        }
    }
}
