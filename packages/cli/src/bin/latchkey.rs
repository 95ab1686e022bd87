use clap::{Parser, Subcommand};
use colored::*;
use std::process;

mod cli;

use latchkey_cli::bootstrap;
use latchkey_config::StoreConfig;
use latchkey_settings::registry;

#[derive(Parser)]
#[command(name = "latchkey")]
#[command(about = "Latchkey CLI - inspect and edit persisted settings")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show every setting and its current value
    List {
        #[arg(long, help = "Print a JSON snapshot instead of a table")]
        json: bool,
    },
    /// Show the current value of one setting
    Get {
        /// Setting key (see `latchkey keys`)
        key: String,
    },
    /// Change a setting and save it
    Set {
        /// Setting key (see `latchkey keys`)
        key: String,
        /// New value, e.g. `dark`, `#FF3F51B5`, `42`
        value: String,
    },
    /// List the known setting keys
    Keys,
}

#[tokio::main]
async fn main() {
    // .env is optional
    let _ = dotenvy::dotenv();
    bootstrap::init_tracing();

    let cli = Cli::parse();

    match handle_command(cli.command).await {
        Ok(_) => {}
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    }
}

async fn handle_command(command: Commands) -> anyhow::Result<()> {
    if let Commands::Keys = command {
        cli::keys_command();
        return Ok(());
    }

    let config = StoreConfig::from_env()?;
    let settings = registry::install(bootstrap::open_settings(&config).await)?;

    match command {
        Commands::List { json } => cli::list_command(settings, json)?,
        Commands::Get { key } => cli::get_command(settings, &key)?,
        Commands::Set { key, value } => cli::set_command(settings, &key, &value).await?,
        Commands::Keys => cli::keys_command(),
    }

    Ok(())
}
