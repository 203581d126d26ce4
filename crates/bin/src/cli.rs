//! CLI argument definitions for the relaydeck binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

/// Inspect and resolve relaydeck account settings
#[derive(Parser, Debug)]
#[command(name = "relaydeck")]
#[command(about = "relaydeck: account-scoped settings for relay-based clients")]
#[command(version)]
pub struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value = "human", global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage the accounts stored on this device
    #[command(subcommand)]
    Accounts(AccountsCommand),
    /// Resolve the settings of the active account
    Resolve(ResolveArgs),
    /// Upgrade a stored settings record to the current schema
    Migrate(MigrateArgs),
}

/// Where the account store lives
#[derive(clap::Args, Debug)]
pub struct StoreArgs {
    /// Data directory holding accounts.json
    #[arg(short = 'D', long, env = "RELAYDECK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum AccountsCommand {
    /// List stored accounts
    List(StoreArgs),
    /// Add an account
    Add(AddAccountArgs),
    /// Make an account the active one
    Switch(AccountArgs),
    /// Remove an account
    Remove(AccountArgs),
    /// Clear the active account
    Logout(StoreArgs),
}

/// Arguments for `accounts add`
#[derive(clap::Args, Debug)]
pub struct AddAccountArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Public key, 64 hex characters
    pub pubkey: String,

    /// The device cannot sign for this account
    #[arg(long)]
    pub readonly: bool,

    /// Make the new account active
    #[arg(long)]
    pub switch: bool,
}

/// Arguments for commands acting on one account
#[derive(clap::Args, Debug)]
pub struct AccountArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Public key, 64 hex characters
    pub pubkey: String,
}

/// Arguments for the resolve command
#[derive(clap::Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// JSON file mapping relay URLs to the events they hold
    #[arg(short, long, env = "RELAYDECK_RELAYS_FILE")]
    pub relays_file: Option<PathBuf>,

    /// Read relay to query (repeatable). Defaults to the relays in the
    /// fixture file, or the built-in relays without one.
    #[arg(long = "relay")]
    pub relays: Vec<String>,

    /// How long to wait for remote settings, in milliseconds
    #[arg(short, long, default_value_t = 500)]
    pub wait_ms: u64,
}

/// Arguments for the migrate command
#[derive(clap::Args, Debug)]
pub struct MigrateArgs {
    /// File holding a settings record (JSON)
    pub file: PathBuf,
}
