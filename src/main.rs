use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use md2doc::detect::{probe, ToolKind, ToolLocator};
use md2doc::error::DiscoveryError;
use md2doc::logging::init_logging;
use md2doc::settings::SettingsStore;

/// Settings and tool-discovery front end for the md2doc exporter.
#[derive(Parser)]
#[command(name = "md2doc", version, about)]
struct Cli {
    /// Settings file location (defaults to the per-user config directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for an external tool and print where it was found
    Discover {
        /// Tool to look for (pandoc or wkhtmltopdf; default: both)
        tool: Option<ToolKind>,
        /// Abort discovery after this many seconds
        #[arg(long, default_value_t = 8)]
        timeout_secs: u64,
        /// Save the discovered path into the settings store
        #[arg(long)]
        save: bool,
    },
    /// Validate a user-chosen executable path
    Validate {
        /// Tool the path is supposed to be
        tool: ToolKind,
        /// Path to the executable (or its directory)
        path: String,
        /// Save the validated path into the settings store
        #[arg(long)]
        save: bool,
    },
    /// Read and write settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the resolved value of a key
    Get { key: String },
    /// Set a key
    Set { key: String, value: String },
    /// Remove a key
    Unset { key: String },
    /// List keys stored in the dynamic tier
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let path = cli.settings.unwrap_or_else(SettingsStore::default_path);
    let settings = SettingsStore::open(path);

    match cli.command {
        Commands::Discover {
            tool,
            timeout_secs,
            save,
        } => {
            let tools: Vec<ToolKind> = match tool {
                Some(tool) => vec![tool],
                None => ToolKind::all().to_vec(),
            };
            let mut missing = false;
            for tool in tools {
                let locator = ToolLocator::new(tool, &settings);
                let cancel = CancellationToken::new();
                let deadline = cancel.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_secs(timeout_secs)).await;
                    deadline.cancel();
                });

                match locator.discover(&cancel).await {
                    Ok(Some(found)) => {
                        println!("{tool}: {found}");
                        if save {
                            locator.persist(&found)?;
                        }
                    }
                    Ok(None) => {
                        missing = true;
                        match locator.download_hint() {
                            Some(url) => println!("{tool}: not found (download: {url})"),
                            None => println!("{tool}: not found"),
                        }
                    }
                    Err(DiscoveryError::Cancelled) => {
                        missing = true;
                        println!("{tool}: discovery timed out after {timeout_secs}s");
                    }
                }
            }
            if missing {
                std::process::exit(1);
            }
        }
        Commands::Validate { tool, path, save } => {
            let cancel = CancellationToken::new();
            match probe::validate(tool, &path, &cancel).await {
                Some(found) => {
                    println!("{found}");
                    if save {
                        ToolLocator::new(tool, &settings).persist(&found)?;
                    }
                }
                None => bail!(
                    "{path:?} did not respond to {} {}",
                    tool.display_name(),
                    tool.version_arg()
                ),
            }
        }
        Commands::Config { command } => match command {
            ConfigCommands::Get { key } => match settings.get(&key) {
                Some(value) => println!("{value}"),
                None => std::process::exit(1),
            },
            ConfigCommands::Set { key, value } => settings.set(&key, Some(&value))?,
            ConfigCommands::Unset { key } => settings.remove(&key),
            ConfigCommands::List => {
                for key in settings.list_dynamic_keys() {
                    println!("{key}");
                }
            }
        },
    }

    Ok(())
}
