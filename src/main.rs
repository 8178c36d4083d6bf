mod cli;
mod db;
mod detector;
mod error;
mod fmt;
mod generator;
mod importer;
mod lifecycle;
mod logging;
mod models;
mod payee;
mod reports;
mod settings;

use clap::Parser;

use cli::{AccountsCommands, Cli, Commands, PatternsCommands, ReportCommands, UpcomingCommands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Accounts { command } => match command {
            AccountsCommands::Add {
                name,
                account_type,
                institution,
            } => cli::accounts::add(&name, &account_type, institution.as_deref()),
            AccountsCommands::List => cli::accounts::list(),
        },
        Commands::Import { file, account } => cli::import::run(&file, &account),
        Commands::Identify {
            account,
            months,
            min_occurrences,
        } => cli::identify::run(&account, months, min_occurrences),
        Commands::IdentifyAll {
            months,
            min_occurrences,
        } => cli::identify::run_all(months, min_occurrences),
        Commands::Generate { days } => cli::generate::run(days),
        Commands::Patterns { command } => match command {
            PatternsCommands::List { account, status } => {
                cli::patterns::list(account.as_deref(), status.as_deref())
            }
            PatternsCommands::Confirm { id } => cli::patterns::confirm(id),
            PatternsCommands::Dismiss { id } => cli::patterns::dismiss(id),
        },
        Commands::Upcoming { command } => match command {
            UpcomingCommands::List { days } => cli::upcoming::list(days),
            UpcomingCommands::Skip { id } => cli::upcoming::skip(id),
        },
        Commands::Report { command } => match command {
            ReportCommands::Recurring { account } => cli::report::recurring(account.as_deref()),
        },
        Commands::Status => cli::status::run(),
        Commands::Backup { output } => cli::backup::run(output),
        Commands::Demo => cli::demo::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
