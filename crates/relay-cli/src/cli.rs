use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "chain-adapter",
    about = "Relays ledger blocks to a message broker, one checkpoint at a time",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log at debug level, ignoring RUST_LOG
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the adapter until the first failure
    Run(RunArgs),
    /// Print the stored checkpoint
    Checkpoint(CheckpointArgs),
    /// Generate a key pair for a ledger account
    Keygen(KeygenArgs),
    /// Print the resolved configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct RunArgs {
    #[arg(short, long, default_value = "chain-adapter.toml")]
    pub config: PathBuf,
}

#[derive(Args)]
pub struct CheckpointArgs {
    /// Read the checkpoint location from this config file
    #[arg(short, long, conflicts_with = "path")]
    pub config: Option<PathBuf>,
    /// Read this checkpoint file directly
    #[arg(short, long)]
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct KeygenArgs {
    /// Account id, `name@domain`
    #[arg(short, long)]
    pub account: String,
    /// Directory to write `<account>.priv` and `<account>.pub` into
    #[arg(short, long, default_value = "keys")]
    pub out: PathBuf,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[arg(short, long, default_value = "chain-adapter.toml")]
    pub config: PathBuf,
}
