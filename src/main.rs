//! Evidence Ledger CLI
//!
//! Maintains and audits an evidence chain stored as a JSON-lines snapshot.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use evidence_ledger::ledger::{verify_merkle_root, Evidence};
use evidence_ledger::reports::{export_case, ChainStatistics, ExportFormat};
use evidence_ledger::snapshot::{append_block, read_snapshot, write_snapshot};
use evidence_ledger::{EvidenceLedger, LedgerConfig};

#[derive(Parser)]
#[command(name = "evidence-ledger")]
#[command(about = "Tamper-evident evidence chain tool")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Ledger configuration file (.toml, .yml or .yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new chain holding only the genesis block
    Init {
        /// Snapshot file to create
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Overwrite an existing snapshot
        #[arg(long)]
        force: bool,
    },

    /// Append an evidence record to a stored chain
    Add {
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Case identifier
        #[arg(long)]
        case_id: String,

        /// Originating agency
        #[arg(short, long)]
        agency: String,

        /// JSON file holding the evidence record
        #[arg(short, long)]
        evidence: PathBuf,
    },

    /// Verify a stored chain
    Verify {
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Expected Merkle root of the block hashes
        #[arg(short, long)]
        merkle_root: Option<String>,
    },

    /// Print the evidence recorded for a case
    Case {
        #[arg(short, long)]
        snapshot: PathBuf,

        #[arg(long)]
        case_id: String,

        /// Export format (blockchain, package)
        #[arg(short, long, default_value = "package")]
        format: ExportFormat,
    },

    /// Print chain statistics
    Stats {
        #[arg(short, long)]
        snapshot: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let filter = if quiet {
        tracing_subscriber::EnvFilter::new("error")
    } else if verbose {
        tracing_subscriber::EnvFilter::new("evidence_ledger=debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "evidence_ledger=info".into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => LedgerConfig::from_file(path)?,
        None => LedgerConfig::load()?,
    };

    match cli.command {
        Commands::Init { snapshot, force } => {
            if snapshot.exists() && !force {
                return Err(anyhow!(
                    "Snapshot {:?} already exists (use --force to overwrite)",
                    snapshot
                ));
            }
            let ledger = EvidenceLedger::new(config);
            write_snapshot(&snapshot, &ledger.snapshot().blocks)?;
            info!("Created chain {} at {:?}", ledger.chain_name(), snapshot);
            if !cli.quiet {
                println!("{}", ledger.head_hash().unwrap_or_default());
            }
        }

        Commands::Add {
            snapshot,
            case_id,
            agency,
            evidence,
        } => {
            let ledger = load_ledger(config, &snapshot)?;
            let record = read_evidence_record(&evidence)?;
            let block = ledger.add_evidence(&record, &case_id, &agency)?;
            append_block(&snapshot, &block)?;
            info!("Appended {}", block.summary());
            if !cli.quiet {
                println!("{}", serde_json::to_string_pretty(&block)?);
            }
        }

        Commands::Verify {
            snapshot,
            merkle_root,
        } => {
            let blocks = read_snapshot(&snapshot)?;
            let verification = evidence_ledger::ledger::verify_chain(&blocks);
            if !cli.quiet {
                println!("{}", verification.summary());
            }
            if !verification.is_valid() {
                return Err(anyhow!("Chain verification failed: {}", verification.message));
            }

            if let Some(expected) = merkle_root {
                if !verify_merkle_root(&blocks, &expected) {
                    return Err(anyhow!("Merkle root mismatch. Expected: {}", expected));
                }
                if !cli.quiet {
                    println!("✓ Merkle root matches expected value");
                }
            }
        }

        Commands::Case {
            snapshot,
            case_id,
            format,
        } => {
            let blocks = read_snapshot(&snapshot)?;
            let export = export_case(&blocks, &case_id, format)?;
            println!("{}", serde_json::to_string_pretty(&export)?);
        }

        Commands::Stats { snapshot } => {
            let blocks = read_snapshot(&snapshot)?;
            let stats = ChainStatistics::collect(&blocks)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

fn load_ledger(config: LedgerConfig, snapshot: &Path) -> Result<EvidenceLedger> {
    let blocks = read_snapshot(snapshot)?;
    EvidenceLedger::from_blocks(config, blocks)
        .with_context(|| format!("Refusing to extend {:?}", snapshot))
}

fn read_evidence_record(path: &Path) -> Result<Evidence> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read evidence file {:?}", path))?;
    let value: serde_json::Value = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse evidence file {:?}", path))?;
    match value {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(anyhow!("Evidence file {:?} must contain a JSON object", path)),
    }
}
