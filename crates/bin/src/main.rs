use clap::Parser;
use tracing_subscriber::EnvFilter;

mod backend;
mod cli;
mod commands {
    pub mod accounts;
    pub mod migrate;
    pub mod resolve;
}
mod output;

use cli::{AccountsCommand, Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("relaydeck=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = cli.format;

    match &cli.command {
        Commands::Accounts(command) => match command {
            AccountsCommand::List(args) => commands::accounts::list(args, format).await,
            AccountsCommand::Add(args) => commands::accounts::add(args, format).await,
            AccountsCommand::Switch(args) => commands::accounts::switch(args, format).await,
            AccountsCommand::Remove(args) => commands::accounts::remove(args, format).await,
            AccountsCommand::Logout(args) => commands::accounts::logout(args, format).await,
        },
        Commands::Resolve(args) => commands::resolve::run(args, format).await,
        Commands::Migrate(args) => commands::migrate::run(args, format).await,
    }
}
