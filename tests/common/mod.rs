// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use minibank::application::BankService;
use minibank::domain::{AccountId, AccountType};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(BankService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = BankService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Helper to parse a date string into DateTime<Utc>
pub fn parse_date(date_str: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

/// Test fixture: three customers with one account each, at the balances used
/// by the transfer scenarios (5000.00 / 10000.00 / 7000.00).
pub struct ScenarioBank {
    pub acc1: AccountId,
    pub acc2: AccountId,
    pub acc3: AccountId,
}

impl ScenarioBank {
    pub async fn setup(service: &BankService) -> Result<Self> {
        let alice = service
            .open_customer("Alice", "alice@example.com", None)
            .await?;
        let bob = service
            .open_customer("Bob", "bob@example.com", None)
            .await?;
        let carol = service
            .open_customer("Carol", "carol@example.com", None)
            .await?;

        let acc1 = service
            .open_account(alice.id, AccountType::Savings, 500_000)
            .await?;
        let acc2 = service
            .open_account(bob.id, AccountType::Current, 1_000_000)
            .await?;
        let acc3 = service
            .open_account(carol.id, AccountType::Savings, 700_000)
            .await?;

        Ok(Self {
            acc1: acc1.id,
            acc2: acc2.id,
            acc3: acc3.id,
        })
    }

    /// Sum of all three account balances as seen by the service.
    pub async fn total_balance(&self, service: &BankService) -> Result<i64> {
        let mut total = 0;
        for id in [self.acc1, self.acc2, self.acc3] {
            total += service.get_account(id).await?.balance_cents;
        }
        Ok(total)
    }
}
