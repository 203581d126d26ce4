//! Settings migration command.

use relaydeck::settings::{CURRENT_VERSION, encode_settings, parse_settings};

use crate::cli::MigrateArgs;
use crate::output::OutputFormat;

/// Run the migrate command
pub async fn run(args: &MigrateArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let content = tokio::fs::read_to_string(&args.file).await?;
    let settings = parse_settings(&content)?;
    tracing::info!(
        version = CURRENT_VERSION,
        "Migrated settings from {}",
        args.file.display()
    );

    match format {
        OutputFormat::Human => println!("{}", serde_json::to_string_pretty(&settings)?),
        OutputFormat::Json => println!("{}", encode_settings(&settings)?),
    }
    Ok(())
}
