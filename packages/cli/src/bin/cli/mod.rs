// ABOUTME: Command handlers for the latchkey binary
// ABOUTME: Listing, reading and writing settings through the installed registry

use colored::*;
use latchkey_cli::{output, CliError};
use latchkey_settings::Settings;

pub fn list_command(settings: &Settings, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", output::settings_json(settings)?);
        return Ok(());
    }

    println!("{}", output::settings_table(settings)?);
    Ok(())
}

pub fn get_command(settings: &Settings, key: &str) -> anyhow::Result<()> {
    println!("{}", settings.display(key)?);
    Ok(())
}

pub async fn set_command(settings: &Settings, key: &str, value: &str) -> anyhow::Result<()> {
    if !settings.set_from_str(key, value).await? {
        return Err(CliError::NotPersisted(key.to_string()).into());
    }

    println!(
        "{} {} = {}",
        "✓".green().bold(),
        key.bold(),
        settings.display(key)?
    );
    Ok(())
}

pub fn keys_command() {
    for key in Settings::keys() {
        println!("{}", key);
    }
}
