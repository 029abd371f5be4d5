//! Shardflow CLI
//!
//! Command-line client for the shardflow placement and fingerprint library.
//!
//! # Commands
//! - `root` - Compute the content root of a file
//! - `select` - Choose storage nodes for an upload
//! - `check-replica` - Check whether a shard layout reaches a replica count
//! - `config` - Show or edit configuration
//!
//! # Configuration
//! Config file: ~/.shardflow/config.toml

use anyhow::Result;
use clap::{Parser, Subcommand};
use shardflow_placement::ShardConfig;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod symbols;

use commands::{check, root, select};

#[derive(Parser)]
#[command(name = "shardflow")]
#[command(about = "Shard-aware node selection and content fingerprints")]
#[command(version)]
struct Cli {
    /// Log level, or a full `tracing` filter directive (overrides config file)
    #[arg(long, global = true, env = "SHARDFLOW_LOG_LEVEL")]
    log_level: Option<String>,

    /// Disable colorful log output
    #[arg(long, global = true)]
    log_color_disabled: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the content root of a file
    Root {
        /// Path to the file
        path: PathBuf,

        /// Hash segments in parallel
        #[arg(short, long)]
        parallel: bool,

        /// Segments hashed per parallel window (overrides config file)
        #[arg(short, long)]
        batch: Option<usize>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Choose storage nodes so every segment reaches the expected replica
    Select {
        /// JSON file holding an array of candidate nodes
        nodes: PathBuf,

        /// Expected replica count (overrides config file)
        #[arg(short = 'r', long, env = "SHARDFLOW_EXPECTED_REPLICA")]
        expected_replica: Option<u32>,

        /// Number of segments of the upload; 0 checks shard coverage only
        #[arg(short, long, default_value = "0", conflicts_with = "file")]
        segments: u64,

        /// Take the segment count from this file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Shuffle candidates instead of sorting them by shard size
        #[arg(long)]
        random: bool,

        /// Shuffle seed; implies --random
        #[arg(long)]
        seed: Option<u64>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether a shard layout replicates every segment
    CheckReplica {
        /// Shards as <shardId>/<numShard>, e.g. 0/2 1/2
        #[arg(required = true)]
        shards: Vec<ShardConfig>,

        /// Expected replica count (overrides config file)
        #[arg(short = 'r', long)]
        expected_replica: Option<u32>,

        /// Number of segments; 0 checks shard coverage only
        #[arg(short, long, default_value = "0")]
        segments: u64,
    },

    /// Show or initialize configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Show config file path
    Path,

    /// Initialize config file with defaults
    Init {
        /// Overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., log.level, selection.expected_replica)
        key: String,
        /// Value to set
        value: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration from ~/.shardflow/config.toml
    let loaded = config::read_config();
    let cfg = loaded.as_ref().cloned().unwrap_or_default();

    // CLI args override config file
    let level = cli.log_level.unwrap_or_else(|| cfg.log.level.clone());
    let color = cfg.log.color && !cli.log_color_disabled;
    init_logging(&level, color);

    // reported once the subscriber is up
    if let Err(e) = loaded {
        warn!("{:#}; using default configuration", e);
    }

    match cli.command {
        Commands::Root {
            path,
            parallel,
            batch,
            json,
        } => {
            let config = root::RootConfig {
                path,
                parallel: parallel || cfg.merkle.parallel,
                batch: batch.unwrap_or(cfg.merkle.batch),
                json,
            };
            root::run(config)?;
        }

        Commands::Select {
            nodes,
            expected_replica,
            segments,
            file,
            random,
            seed,
            json,
        } => {
            let seed = seed.or(cfg.selection.seed);
            let config = select::SelectConfig {
                nodes,
                expected_replica: expected_replica.unwrap_or(cfg.selection.expected_replica),
                segments,
                file,
                random: random || cfg.selection.random || seed.is_some(),
                seed,
                json,
            };
            select::run(config)?;
        }

        Commands::CheckReplica {
            shards,
            expected_replica,
            segments,
        } => {
            let config = check::CheckConfig {
                shards,
                expected_replica: expected_replica.unwrap_or(cfg.selection.expected_replica),
                segments,
            };
            check::run(config)?;
        }

        Commands::Config { command } => {
            handle_config_command(command)?;
        }
    }

    Ok(())
}

/// Log to stderr so command output stays machine-readable. `RUST_LOG` wins
/// over the configured level.
fn init_logging(level: &str, color: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(color)
        .with_writer(std::io::stderr)
        .init();
}

/// Handle config subcommands
fn handle_config_command(command: Option<ConfigCommands>) -> Result<()> {
    use console::style;

    match command {
        None | Some(ConfigCommands::Show) => {
            let cfg = config::load_config();
            println!();
            println!("{}", style("Shardflow Configuration").bold().underlined());
            println!();
            println!("{}", style("[log]").cyan());
            println!("  level = \"{}\"", cfg.log.level);
            println!("  color = {}", cfg.log.color);
            println!();
            println!("{}", style("[selection]").cyan());
            println!("  expected_replica = {}", cfg.selection.expected_replica);
            println!("  random = {}", cfg.selection.random);
            if let Some(seed) = cfg.selection.seed {
                println!("  seed = {}", seed);
            }
            println!();
            println!("{}", style("[merkle]").cyan());
            println!("  parallel = {}", cfg.merkle.parallel);
            println!("  batch = {}", cfg.merkle.batch);
            println!();

            if let Ok(path) = config::config_file_path() {
                println!("{} {}", style("Config file:").dim(), path.display());
                if !path.exists() {
                    println!(
                        "{} Run '{}' to create it",
                        style("(not created yet)").yellow(),
                        style("shardflow config init").green()
                    );
                }
            }
        }

        Some(ConfigCommands::Path) => {
            if let Ok(path) = config::config_file_path() {
                println!("{}", path.display());
            }
        }

        Some(ConfigCommands::Init { force }) => {
            let path = config::config_file_path()?;
            if path.exists() && !force {
                println!(
                    "{} Config file already exists at {}",
                    style(symbols::WARN).yellow(),
                    path.display()
                );
                println!("Use --force to overwrite");
                return Ok(());
            }

            config::save_config(&config::ShardflowConfig::default())?;
            println!(
                "{} Config file created at {}",
                style(symbols::CHECK).green(),
                path.display()
            );
        }

        Some(ConfigCommands::Set { key, value }) => {
            let mut cfg = config::load_config();

            match key.as_str() {
                "log.level" => cfg.log.level = value.clone(),
                "log.color" => cfg.log.color = parse_value(&key, &value)?,
                "selection.expected_replica" => {
                    cfg.selection.expected_replica = parse_value(&key, &value)?
                }
                "selection.random" => cfg.selection.random = parse_value(&key, &value)?,
                "selection.seed" => cfg.selection.seed = Some(parse_value(&key, &value)?),
                "merkle.parallel" => cfg.merkle.parallel = parse_value(&key, &value)?,
                "merkle.batch" => cfg.merkle.batch = parse_value(&key, &value)?,
                _ => {
                    anyhow::bail!(
                        "Unknown config key: {}. Valid keys: log.level, log.color, selection.expected_replica, selection.random, selection.seed, merkle.parallel, merkle.batch",
                        key
                    );
                }
            }

            config::save_config(&cfg)?;
            println!(
                "{} Set {} = {}",
                style(symbols::CHECK).green(),
                style(&key).cyan(),
                style(&value).green()
            );
        }
    }

    Ok(())
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid value for {}: {:?}", key, value))
}
