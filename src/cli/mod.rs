pub mod accounts;
pub mod backup;
pub mod demo;
pub mod generate;
pub mod identify;
pub mod import;
pub mod init;
pub mod patterns;
pub mod report;
pub mod status;
pub mod upcoming;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "penny",
    about = "Personal budgeting CLI that detects and projects recurring transactions."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up Penny: choose a data directory and initialize the database.
    Init {
        /// Path for Penny data (default: ~/Documents/penny)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Manage accounts.
    Accounts {
        #[command(subcommand)]
        command: AccountsCommands,
    },
    /// Import a ledger CSV (date, description, amount columns).
    Import {
        /// Path to CSV file to import
        file: String,
        /// Account name to import into
        #[arg(long)]
        account: String,
    },
    /// Scan one account's history for recurring transactions.
    Identify {
        /// Account name to scan
        #[arg(long)]
        account: String,
        /// Lookback window in months
        #[arg(long, default_value = "12")]
        months: u32,
        /// Minimum charges needed to establish a pattern
        #[arg(long = "min-occurrences", default_value = "3")]
        min_occurrences: usize,
    },
    /// Scan every account for recurring transactions (weekly cron job).
    IdentifyAll {
        /// Lookback window in months
        #[arg(long, default_value = "12")]
        months: u32,
        /// Minimum charges needed to establish a pattern
        #[arg(long = "min-occurrences", default_value = "3")]
        min_occurrences: usize,
    },
    /// Materialize due projections, then project ahead (daily cron job).
    Generate {
        /// Projection horizon in days
        #[arg(long, default_value = "30")]
        days: i64,
    },
    /// Inspect and manage detected recurrence patterns.
    Patterns {
        #[command(subcommand)]
        command: PatternsCommands,
    },
    /// Projected upcoming transactions.
    Upcoming {
        #[command(subcommand)]
        command: UpcomingCommands,
    },
    /// Generate reports.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Show current database and summary statistics.
    Status,
    /// Back up the database.
    Backup {
        /// Output path (default: <data_dir>/backups/penny-YYYYMMDD-HHMMSS.db)
        #[arg(long)]
        output: Option<String>,
    },
    /// Load sample data (account, transactions) to explore Penny.
    Demo,
}

#[derive(Subcommand)]
pub enum AccountsCommands {
    /// Add a new account.
    Add {
        /// Account name, e.g. 'Everyday Checking'
        name: String,
        /// Account type: checking, savings, credit_card
        #[arg(long = "type")]
        account_type: String,
        /// Institution name
        #[arg(long)]
        institution: Option<String>,
    },
    /// List all accounts.
    List,
}

#[derive(Subcommand)]
pub enum PatternsCommands {
    /// List detected patterns.
    List {
        /// Filter by account name
        #[arg(long)]
        account: Option<String>,
        /// Filter by status: candidate, active, dismissed
        #[arg(long)]
        status: Option<String>,
    },
    /// Confirm a pattern (candidate or dismissed → active).
    Confirm {
        /// Pattern ID (shown in `penny patterns list`)
        id: i64,
    },
    /// Dismiss a pattern; its pending projections are skipped.
    Dismiss {
        /// Pattern ID (shown in `penny patterns list`)
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum UpcomingCommands {
    /// List pending projections inside a window.
    List {
        /// Window in days
        #[arg(long, default_value = "30")]
        days: i64,
    },
    /// Skip one pending projection so it never materializes.
    Skip {
        /// Projection ID (shown in `penny upcoming list`)
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Monthly-equivalent cost of active recurring patterns.
    Recurring {
        /// Filter by account name
        #[arg(long)]
        account: Option<String>,
    },
}
