use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::BankService;
use crate::domain::{Account, Customer, Transaction};

/// Database snapshot for full JSON export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub customers: Vec<Customer>,
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>,
}

/// Exporter for converting ledger data to CSV or JSON
pub struct Exporter<'a> {
    service: &'a BankService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a BankService) -> Self {
        Self { service }
    }

    /// Export the joined transaction view to CSV format
    pub async fn export_transactions_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let rows = self.service.transactions_view().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "transaction_id",
            "sequence",
            "sender",
            "receiver",
            "amount_cents",
            "transaction_date",
        ])?;

        let mut count = 0;
        for row in &rows {
            csv_writer.write_record([
                row.transaction_id.to_string(),
                row.sequence.to_string(),
                row.sender_name.clone(),
                row.receiver_name.clone(),
                row.amount_cents.to_string(),
                row.transaction_date.to_rfc3339(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export account balances to CSV format
    pub async fn export_balances_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let summaries = self.service.account_summaries().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["account_id", "customer", "type", "balance_cents"])?;

        let mut count = 0;
        for summary in &summaries {
            csv_writer.write_record([
                summary.account.id.to_string(),
                summary.customer_name.clone(),
                summary.account.account_type.as_str().to_string(),
                summary.account.balance_cents.to_string(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export the full database as a JSON snapshot
    pub async fn export_full_json<W: Write>(&self, mut writer: W) -> Result<BankSnapshot> {
        let customers = self.service.list_customers().await?;
        let mut accounts = Vec::new();
        for customer in &customers {
            accounts.extend(self.service.list_accounts_for_customer(customer.id).await?);
        }
        let transactions = self.service.list_transactions().await?;

        let snapshot = BankSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            customers,
            accounts,
            transactions,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
