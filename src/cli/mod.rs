use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::application::BankService;
use crate::domain::{AccountType, format_cents, parse_cents};

/// Minibank - a small banking ledger
#[derive(Parser)]
#[command(name = "minibank")]
#[command(about = "A small SQLite-backed banking ledger with transfers and reports")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "minibank.db")]
    pub database: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Customer management commands
    #[command(subcommand)]
    Customer(CustomerCommands),

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Transfer money between two accounts
    Transfer {
        /// Amount to transfer (e.g., "2000" or "2000.00")
        amount: String,

        /// Sender account ID
        #[arg(long)]
        from: String,

        /// Receiver account ID
        #[arg(long)]
        to: String,

        /// Date of the transfer (YYYY-MM-DD, defaults to now)
        #[arg(long)]
        date: Option<String>,
    },

    /// Show balance for one account or all accounts
    Balance {
        /// Account ID (omit for all accounts)
        account: Option<String>,
    },

    /// List the joined transaction view
    Transactions,

    /// Reporting commands
    #[command(subcommand)]
    Report(ReportCommands),

    /// Verify ledger integrity
    Check,

    /// Export data to CSV or JSON
    Export {
        /// What to export: transactions, balances, full
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum CustomerCommands {
    /// Register a new customer
    Register {
        /// Customer name
        name: String,

        /// Unique email address
        #[arg(long)]
        email: String,

        /// Phone number
        #[arg(long)]
        phone: Option<String>,
    },

    /// List all customers
    List,

    /// Show a customer and their accounts
    Show {
        /// Customer email
        email: String,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Open an account for an existing customer
    Open {
        /// Owning customer's email
        #[arg(long)]
        customer: String,

        /// Account type: savings or current
        #[arg(long, default_value = "savings")]
        account_type: String,

        /// Starting balance (e.g., "5000.00")
        #[arg(long, default_value = "0")]
        balance: String,
    },

    /// List accounts for a customer
    List {
        /// Owning customer's email
        #[arg(long)]
        customer: String,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Total spent per customer per calendar month
    Monthly,

    /// Transactions above the suspicious-amount threshold
    Suspicious,

    /// Customers with the most outgoing transactions
    Top {
        /// Maximum number of customers to show
        #[arg(short, long, default_value = "5")]
        limit: i64,
    },
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Init => {
                BankService::init(&self.database).await?;
                println!("Initialized database: {}", self.database);
            }

            Commands::Customer(cmd) => {
                let service = BankService::connect(&self.database).await?;
                run_customer_command(&service, cmd).await?;
            }

            Commands::Account(cmd) => {
                let service = BankService::connect(&self.database).await?;
                run_account_command(&service, cmd).await?;
            }

            Commands::Transfer {
                amount,
                from,
                to,
                date,
            } => {
                let service = BankService::connect(&self.database).await?;
                let amount_cents = parse_cents(amount)
                    .with_context(|| format!("Invalid amount: {}", amount))?;
                let from = parse_account_id(from)?;
                let to = parse_account_id(to)?;
                let transaction_date = match date {
                    Some(date) => parse_date(date)?,
                    None => Utc::now(),
                };

                let receipt = service.transfer(from, to, amount_cents, transaction_date).await?;
                println!(
                    "Transferred {} from {} to {} (transaction {})",
                    format_cents(receipt.transaction.amount_cents),
                    from,
                    to,
                    receipt.transaction.id
                );
                if let Some(marker) = receipt.audit_marker {
                    println!("Large transfer logged (audit marker {})", marker.id);
                }
            }

            Commands::Balance { account } => {
                let service = BankService::connect(&self.database).await?;
                match account {
                    Some(id) => {
                        let account = service.get_account(parse_account_id(id)?).await?;
                        println!(
                            "{} ({}): {}",
                            account.id,
                            account.account_type,
                            format_cents(account.balance_cents)
                        );
                    }
                    None => {
                        let summaries = service.account_summaries().await?;
                        if summaries.is_empty() {
                            println!("No accounts found.");
                        } else {
                            println!("{:<38} {:<20} {:<8} {:>14}", "ACCOUNT", "CUSTOMER", "TYPE", "BALANCE");
                            println!("{}", "-".repeat(82));
                            for summary in summaries {
                                println!(
                                    "{:<38} {:<20} {:<8} {:>14}",
                                    summary.account.id,
                                    summary.customer_name,
                                    summary.account.account_type.as_str(),
                                    format_cents(summary.account.balance_cents)
                                );
                            }
                        }
                    }
                }
            }

            Commands::Transactions => {
                let service = BankService::connect(&self.database).await?;
                let rows = service.transactions_view().await?;
                print_transaction_view(&rows);
            }

            Commands::Report(cmd) => {
                let service = BankService::connect(&self.database).await?;
                run_report_command(&service, cmd).await?;
            }

            Commands::Check => {
                let service = BankService::connect(&self.database).await?;
                let stats = service.check_integrity().await?;
                println!("Customers:            {}", stats.customer_count);
                println!("Accounts:             {}", stats.account_count);
                println!("Transactions:         {}", stats.transaction_count);
                println!("Total balance:        {}", format_cents(stats.total_balance_cents));
                println!("Invalid account refs: {}", stats.invalid_account_refs);
                println!("Negative balances:    {}", stats.negative_balances);
                println!("Negative amounts:     {}", stats.negative_amounts);

                if stats.invalid_account_refs == 0
                    && stats.negative_balances == 0
                    && stats.negative_amounts == 0
                {
                    println!("Ledger OK.");
                } else {
                    anyhow::bail!("Ledger integrity check failed");
                }
            }

            Commands::Export {
                export_type,
                output,
            } => {
                let service = BankService::connect(&self.database).await?;
                run_export_command(&service, export_type, output.as_deref()).await?;
            }
        }

        Ok(())
    }
}

async fn run_customer_command(service: &BankService, cmd: &CustomerCommands) -> Result<()> {
    match cmd {
        CustomerCommands::Register { name, email, phone } => {
            let customer = service
                .open_customer(name, email, phone.clone())
                .await?;
            println!("Registered customer: {} <{}> ({})", customer.name, customer.email, customer.id);
        }

        CustomerCommands::List => {
            let customers = service.list_customers().await?;
            if customers.is_empty() {
                println!("No customers found.");
            } else {
                println!("{:<20} {:<30} {:<15}", "NAME", "EMAIL", "PHONE");
                println!("{}", "-".repeat(65));
                for customer in customers {
                    println!(
                        "{:<20} {:<30} {:<15}",
                        customer.name,
                        customer.email,
                        customer.phone.as_deref().unwrap_or("-")
                    );
                }
            }
        }

        CustomerCommands::Show { email } => {
            let customer = service.get_customer_by_email(email).await?;
            println!("Customer: {}", customer.name);
            println!("  ID:      {}", customer.id);
            println!("  Email:   {}", customer.email);
            if let Some(phone) = &customer.phone {
                println!("  Phone:   {}", phone);
            }
            println!(
                "  Created: {}",
                customer.created_at.format("%Y-%m-%d %H:%M:%S")
            );

            let accounts = service.list_accounts_for_customer(customer.id).await?;
            println!();
            if accounts.is_empty() {
                println!("  No accounts.");
            } else {
                for account in accounts {
                    println!(
                        "  {} ({}): {}",
                        account.id,
                        account.account_type,
                        format_cents(account.balance_cents)
                    );
                }
            }
        }
    }
    Ok(())
}

async fn run_account_command(service: &BankService, cmd: &AccountCommands) -> Result<()> {
    match cmd {
        AccountCommands::Open {
            customer,
            account_type,
            balance,
        } => {
            let account_type = AccountType::from_str(account_type).ok_or_else(|| {
                anyhow::anyhow!(
                    "Invalid account type '{}'. Valid types: savings, current",
                    account_type
                )
            })?;
            let balance_cents =
                parse_cents(balance).with_context(|| format!("Invalid balance: {}", balance))?;

            let owner = service.get_customer_by_email(customer).await?;
            let account = service
                .open_account(owner.id, account_type, balance_cents)
                .await?;
            println!(
                "Opened {} account {} for {} with balance {}",
                account.account_type,
                account.id,
                owner.name,
                format_cents(account.balance_cents)
            );
        }

        AccountCommands::List { customer } => {
            let owner = service.get_customer_by_email(customer).await?;
            let accounts = service.list_accounts_for_customer(owner.id).await?;
            if accounts.is_empty() {
                println!("No accounts for {}.", owner.name);
            } else {
                println!("{:<38} {:<8} {:>14}", "ACCOUNT", "TYPE", "BALANCE");
                println!("{}", "-".repeat(62));
                for account in accounts {
                    println!(
                        "{:<38} {:<8} {:>14}",
                        account.id,
                        account.account_type.as_str(),
                        format_cents(account.balance_cents)
                    );
                }
            }
        }
    }
    Ok(())
}

async fn run_report_command(service: &BankService, cmd: &ReportCommands) -> Result<()> {
    match cmd {
        ReportCommands::Monthly => {
            let rows = service.monthly_spending().await?;
            if rows.is_empty() {
                println!("No transactions recorded.");
            } else {
                println!("{:<20} {:<8} {:>14}", "CUSTOMER", "MONTH", "TOTAL SPENT");
                println!("{}", "-".repeat(44));
                for row in rows {
                    println!(
                        "{:<20} {:<8} {:>14}",
                        row.customer_name,
                        row.month,
                        format_cents(row.total_spent_cents)
                    );
                }
            }
        }

        ReportCommands::Suspicious => {
            let rows = service.suspicious_transactions().await?;
            if rows.is_empty() {
                println!("No suspicious transactions.");
            } else {
                print_transaction_view(&rows);
            }
        }

        ReportCommands::Top { limit } => {
            let rows = service.top_customers(*limit).await?;
            if rows.is_empty() {
                println!("No transactions recorded.");
            } else {
                println!("{:<20} {:>12}", "CUSTOMER", "TRANSFERS");
                println!("{}", "-".repeat(33));
                for row in rows {
                    println!("{:<20} {:>12}", row.customer_name, row.transaction_count);
                }
            }
        }
    }
    Ok(())
}

async fn run_export_command(
    service: &BankService,
    export_type: &str,
    output: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{stdout, Write};

    let exporter = Exporter::new(service);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match export_type {
        "transactions" => {
            let count = exporter.export_transactions_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} transactions", count);
            }
        }
        "balances" => {
            let count = exporter.export_balances_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} balances", count);
            }
        }
        "full" => {
            let snapshot = exporter.export_full_json(writer).await?;
            if output.is_some() {
                eprintln!(
                    "Exported full database: {} customers, {} accounts, {} transactions",
                    snapshot.customers.len(),
                    snapshot.accounts.len(),
                    snapshot.transactions.len()
                );
            }
        }
        _ => {
            anyhow::bail!(
                "Invalid export type '{}'. Valid types: transactions, balances, full",
                export_type
            );
        }
    }

    Ok(())
}

fn print_transaction_view(rows: &[crate::storage::TransactionViewRow]) {
    if rows.is_empty() {
        println!("No transactions recorded.");
        return;
    }
    println!(
        "{:<6} {:<20} {:<20} {:>14} {:<20}",
        "SEQ", "SENDER", "RECEIVER", "AMOUNT", "DATE"
    );
    println!("{}", "-".repeat(84));
    for row in rows {
        println!(
            "{:<6} {:<20} {:<20} {:>14} {:<20}",
            row.sequence,
            row.sender_name,
            row.receiver_name,
            format_cents(row.amount_cents),
            row.transaction_date.format("%Y-%m-%d %H:%M:%S")
        );
    }
}

fn parse_account_id(input: &str) -> Result<Uuid> {
    Uuid::parse_str(input).with_context(|| format!("Invalid account ID: {}", input))
}

fn parse_date(input: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("Invalid date (expected YYYY-MM-DD): {}", input))?;
    let datetime = date
        .and_hms_opt(0, 0, 0)
        .context("Invalid time of day")?
        .and_utc();
    Ok(datetime)
}
