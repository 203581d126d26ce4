//! Account management commands.

use relaydeck::{Account, PublicKey, clock::format_secs};

use crate::backend::open_accounts;
use crate::cli::{AccountArgs, AddAccountArgs, StoreArgs};
use crate::output::{OutputFormat, print_table};

/// Run the `accounts list` command
pub async fn list(args: &StoreArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let service = open_accounts(args).await?;
    let accounts = service.accounts().await;
    let active = service.active().map(|a| a.pubkey);

    match format {
        OutputFormat::Human => {
            if accounts.is_empty() {
                println!("No accounts found.");
                return Ok(());
            }

            let rows: Vec<Vec<String>> = accounts
                .iter()
                .map(|account| {
                    let marker = if active.as_ref() == Some(&account.pubkey) {
                        "*"
                    } else {
                        ""
                    };
                    vec![
                        marker.to_string(),
                        account.pubkey.to_string(),
                        yes_no(account.readonly).to_string(),
                        yes_no(account.local_settings.is_some()).to_string(),
                        format_secs(account.added_at),
                    ]
                })
                .collect();
            print_table(&["", "PUBKEY", "READONLY", "LOCAL", "ADDED"], &rows);
        }
        OutputFormat::Json => {
            let entries: Vec<_> = accounts
                .iter()
                .map(|account| {
                    serde_json::json!({
                        "pubkey": account.pubkey,
                        "active": active.as_ref() == Some(&account.pubkey),
                        "readonly": account.readonly,
                        "local_settings": account.local_settings.is_some(),
                        "added_at": account.added_at,
                        "added": format_secs(account.added_at),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string(&entries)?);
        }
    }

    Ok(())
}

/// Run the `accounts add` command
pub async fn add(args: &AddAccountArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let pubkey = PublicKey::parse(&args.pubkey)?;
    let service = open_accounts(&args.store).await?;

    let account = if args.readonly {
        Account::readonly(pubkey.clone())
    } else {
        Account::new(pubkey.clone())
    };
    service.add_account(account).await?;
    if args.switch {
        service.switch_account(&pubkey).await?;
    }

    report(format, "added", &pubkey)
}

/// Run the `accounts switch` command
pub async fn switch(args: &AccountArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let pubkey = PublicKey::parse(&args.pubkey)?;
    let service = open_accounts(&args.store).await?;
    service.switch_account(&pubkey).await?;
    report(format, "active", &pubkey)
}

/// Run the `accounts remove` command
pub async fn remove(args: &AccountArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let pubkey = PublicKey::parse(&args.pubkey)?;
    let service = open_accounts(&args.store).await?;
    service.remove_account(&pubkey).await?;
    report(format, "removed", &pubkey)
}

/// Run the `accounts logout` command
pub async fn logout(args: &StoreArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let service = open_accounts(args).await?;
    service.logout().await?;
    match format {
        OutputFormat::Human => println!("Logged out."),
        OutputFormat::Json => println!("{}", serde_json::json!({ "status": "logged_out" })),
    }
    Ok(())
}

fn report(format: OutputFormat, status: &str, pubkey: &PublicKey) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Human => println!("Account {pubkey} {status}."),
        OutputFormat::Json => {
            let value = serde_json::json!({ "status": status, "pubkey": pubkey });
            println!("{}", serde_json::to_string(&value)?);
        }
    }
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
