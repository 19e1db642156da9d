use std::path::PathBuf;

use anyhow::{bail, Context};
use colored::Colorize;

use relay_adapter::AdapterConfig;
use relay_checkpoint::{CheckpointStore, FileCheckpointStore};
use relay_crypto::{KeyPair, SigningKey};
use relay_types::{AccountId, BlockHeight};

use crate::cli::*;

/// Run a subcommand and return the process exit code.
pub fn run_command(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Command::Run(args) => cmd_run(args),
        Command::Checkpoint(args) => {
            let height = cmd_checkpoint(args)?;
            println!("{}", height.to_string().bold());
            Ok(0)
        }
        Command::Keygen(args) => cmd_keygen(args).map(|_| 0),
        Command::Config(args) => cmd_config(args).map(|_| 0),
    }
}

fn cmd_run(args: RunArgs) -> anyhow::Result<i32> {
    let config = AdapterConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting runtime")?;

    let code = runtime.block_on(async {
        let supervisor = match relay_adapter::connect(&config).await {
            Ok(supervisor) => supervisor,
            Err(e) => {
                eprintln!("{} {e}", "✗".red().bold());
                return e.exit_code();
            }
        };
        let done = supervisor.run().await;
        let checkpoint = done
            .last_checkpoint
            .map(|h| h.to_string())
            .unwrap_or_else(|| "unknown".into());
        eprintln!(
            "{} {}: {}",
            "✗".red().bold(),
            done.kind().to_string().red().bold(),
            done.error
        );
        eprintln!(
            "  relayed {} block(s), last checkpoint {}",
            done.blocks_relayed.to_string().bold(),
            checkpoint.yellow()
        );
        done.exit_code()
    });
    Ok(code)
}

fn cmd_checkpoint(args: CheckpointArgs) -> anyhow::Result<BlockHeight> {
    let path: PathBuf = match (args.path, args.config) {
        (Some(path), _) => path,
        (None, Some(config)) => {
            AdapterConfig::load(&config)
                .with_context(|| format!("loading {}", config.display()))?
                .checkpoint
                .path
        }
        (None, None) => bail!("pass --config or --path"),
    };
    let height = FileCheckpointStore::new(&path)
        .get()
        .with_context(|| format!("reading checkpoint {}", path.display()))?;
    Ok(height)
}

fn cmd_keygen(args: KeygenArgs) -> anyhow::Result<()> {
    let account: AccountId = args.account.parse()?;
    let keys = KeyPair::new(SigningKey::generate());
    keys.store(&args.out, &account)
        .with_context(|| format!("writing keys to {}", args.out.display()))?;
    println!("{} Generated key pair for {}", "✓".green().bold(), account.to_string().cyan());
    println!("  Private: {}", KeyPair::private_key_path(&args.out, &account).display());
    println!("  Public:  {}", KeyPair::public_key_path(&args.out, &account).display());
    println!("  Key:     {}", keys.verifying_key().to_hex().yellow());
    Ok(())
}

fn cmd_config(args: ConfigArgs) -> anyhow::Result<()> {
    let config = AdapterConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    print!("{}", config.to_toml()?);
    Ok(())
}
