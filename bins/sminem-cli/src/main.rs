//! sminem-cli: Command-line driver for a persisted Sminem ecosystem.
//!
//! Every subcommand loads the snapshot, applies one operation and, if the
//! operation mutates state, writes the snapshot back.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use sminem_core::address::Address;
use sminem_core::error::SminemError;
use sminem_node_lib::config::default_state_path;
use sminem_node_lib::storage::{load_snapshot, save_snapshot};
use sminem_node_lib::{Ecosystem, EcosystemConfig};
use tracing::debug;

/// Sminem command-line interface.
#[derive(Parser)]
#[command(name = "sminem-cli")]
#[command(version, about = "Reflection-fee token ledger with transfer-gated NFT minting")]
struct Cli {
    /// Snapshot file (default: <data_dir>/sminem/state.bin).
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Log level filter; RUST_LOG takes precedence.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format (text or json).
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new ecosystem snapshot from configuration.
    Init(InitArgs),
    /// Print a JSON status summary.
    Status,
    /// Show the token balance of an account.
    Balance(AccountArg),
    /// Transfer tokens, paying the 1% fee.
    Transfer(TransferArgs),
    /// Set a spender allowance.
    Approve(ApproveArgs),
    /// Transfer out of another account using an allowance.
    TransferFrom(TransferFromArgs),
    /// Exclude an account from fee redistribution (admin).
    Exclude(AdminAccountArgs),
    /// Return an account to fee redistribution (admin).
    Include(AdminAccountArgs),
    /// Show how many NFTs can currently be minted.
    Mints,
    /// Show the ids a mint would assign, without minting.
    PreviewMint(MintArgs),
    /// Mint one NFT per receiver.
    Mint(MintArgs),
    /// Set transfers per threshold (admin).
    SetMultiplicity(AdminValueArgs),
    /// Set units granted per threshold (admin).
    SetUnits(AdminValueArgs),
    /// Set the NFT metadata base URI (admin).
    SetBaseUri(SetBaseUriArgs),
    /// Register a settable transfer counter (admin).
    RegisterCounter(AdminSourceArgs),
    /// Overwrite a registered counter's value (admin).
    SetCounter(SetCounterArgs),
    /// Switch the transfer counter source (admin).
    SetTokenSource(AdminSourceArgs),
    /// Show the owner and URI of a token.
    OwnerOf(OwnerOfArgs),
    /// Compare cached entitlement with a full checkpoint replay.
    Audit,
}

#[derive(Args)]
struct InitArgs {
    /// TOML or JSON config file; SMINEM__* variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Replace an existing snapshot.
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct AccountArg {
    /// Account address (hex or @label).
    account: String,
}

#[derive(Args)]
struct TransferArgs {
    /// Sender address.
    #[arg(long)]
    from: String,

    /// Receiver address.
    #[arg(long)]
    to: String,

    /// Amount in tokens (e.g. 12.5).
    #[arg(long)]
    amount: String,
}

#[derive(Args)]
struct ApproveArgs {
    /// Token holder granting the allowance.
    #[arg(long)]
    from: String,

    /// Spender address.
    #[arg(long)]
    spender: String,

    /// Allowance in tokens.
    #[arg(long)]
    amount: String,
}

#[derive(Args)]
struct TransferFromArgs {
    /// Spender executing the transfer.
    #[arg(long)]
    from: String,

    /// Holder whose tokens move.
    #[arg(long)]
    owner: String,

    /// Receiver address.
    #[arg(long)]
    to: String,

    /// Amount in tokens.
    #[arg(long)]
    amount: String,
}

#[derive(Args)]
struct AdminAccountArgs {
    /// Administrator address.
    #[arg(long)]
    from: String,

    /// Target account.
    account: String,
}

#[derive(Args)]
struct AdminValueArgs {
    /// Administrator address.
    #[arg(long)]
    from: String,

    /// New value.
    value: u64,
}

#[derive(Args)]
struct SetBaseUriArgs {
    /// Administrator address.
    #[arg(long)]
    from: String,

    /// New base URI.
    uri: String,
}

#[derive(Args)]
struct AdminSourceArgs {
    /// Administrator address.
    #[arg(long)]
    from: String,

    /// Counter source address.
    source: String,
}

#[derive(Args)]
struct SetCounterArgs {
    /// Administrator address.
    #[arg(long)]
    from: String,

    /// Counter source address.
    source: String,

    /// New transfer count.
    count: u64,
}

#[derive(Args)]
struct MintArgs {
    /// Receivers, comma-separated or repeated.
    #[arg(long = "to", value_delimiter = ',', required = true)]
    receivers: Vec<String>,
}

#[derive(Args)]
struct OwnerOfArgs {
    /// Token id.
    token_id: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, &cli.log_format);

    let state = cli.state.unwrap_or_else(default_state_path);
    debug!(state = %state.display(), "using snapshot");

    match cli.command {
        Commands::Init(args) => init(&state, args),
        Commands::Status => {
            let eco = open(&state)?;
            println!("{}", serde_json::to_string_pretty(&eco.status()?)?);
            Ok(())
        }
        Commands::Balance(args) => {
            let eco = open(&state)?;
            let account = parse_address(&args.account)?;
            let decimals = eco.metadata().decimals;
            println!("{}", format_amount(eco.balance_of(&account), decimals));
            Ok(())
        }
        Commands::Transfer(args) => mutate(&state, |eco| {
            let amount = parse_amount(&args.amount, eco.metadata().decimals)?;
            let net = eco.transfer(parse_address(&args.from)?, parse_address(&args.to)?, amount)?;
            println!("received {}", format_amount(net, eco.metadata().decimals));
            Ok(())
        }),
        Commands::Approve(args) => mutate(&state, |eco| {
            let amount = parse_amount(&args.amount, eco.metadata().decimals)?;
            eco.approve(parse_address(&args.from)?, parse_address(&args.spender)?, amount)?;
            Ok(())
        }),
        Commands::TransferFrom(args) => mutate(&state, |eco| {
            let amount = parse_amount(&args.amount, eco.metadata().decimals)?;
            let net = eco.transfer_from(
                parse_address(&args.from)?,
                parse_address(&args.owner)?,
                parse_address(&args.to)?,
                amount,
            )?;
            println!("received {}", format_amount(net, eco.metadata().decimals));
            Ok(())
        }),
        Commands::Exclude(args) => mutate(&state, |eco| {
            Ok(eco.exclude_account(parse_address(&args.from)?, parse_address(&args.account)?)?)
        }),
        Commands::Include(args) => mutate(&state, |eco| {
            Ok(eco.include_account(parse_address(&args.from)?, parse_address(&args.account)?)?)
        }),
        Commands::Mints => {
            println!("{}", open(&state)?.possible_mints_amount()?);
            Ok(())
        }
        Commands::PreviewMint(args) => {
            let eco = open(&state)?;
            let ids = eco.preview_mint(&parse_addresses(&args.receivers)?)?;
            println!("{}", format_ids(&ids));
            Ok(())
        }
        Commands::Mint(args) => mutate(&state, |eco| {
            let ids = eco.mint(&parse_addresses(&args.receivers)?)?;
            println!("{}", format_ids(&ids));
            Ok(())
        }),
        Commands::SetMultiplicity(args) => mutate(&state, |eco| {
            Ok(eco.set_transfers_multiplicity(parse_address(&args.from)?, args.value)?)
        }),
        Commands::SetUnits(args) => mutate(&state, |eco| {
            Ok(eco.set_units_per_threshold(parse_address(&args.from)?, args.value)?)
        }),
        Commands::SetBaseUri(args) => mutate(&state, |eco| {
            Ok(eco.set_base_uri(parse_address(&args.from)?, &args.uri)?)
        }),
        Commands::RegisterCounter(args) => mutate(&state, |eco| {
            Ok(eco.register_counter(parse_address(&args.from)?, parse_address(&args.source)?)?)
        }),
        Commands::SetCounter(args) => mutate(&state, |eco| {
            Ok(eco.set_counter(parse_address(&args.from)?, parse_address(&args.source)?, args.count)?)
        }),
        Commands::SetTokenSource(args) => mutate(&state, |eco| {
            Ok(eco.set_token_source(parse_address(&args.from)?, parse_address(&args.source)?)?)
        }),
        Commands::OwnerOf(args) => {
            let eco = open(&state)?;
            println!("{}", eco.owner_of(args.token_id)?);
            println!("{}", eco.token_uri(args.token_id)?);
            Ok(())
        }
        Commands::Audit => {
            let (cached, replayed) = open(&state)?.audit_accrued_units()?;
            println!("cached {cached}, replayed {replayed}");
            if cached != replayed {
                bail!("checkpoint replay disagrees with cached accrual");
            }
            Ok(())
        }
    }
}

fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
            .init();
    }
}

/// Build a fresh ecosystem from configuration and persist it.
fn init(state: &Path, args: InitArgs) -> Result<()> {
    if state.exists() && !args.force {
        bail!("Snapshot already exists: {} (use --force)", state.display());
    }
    let config = EcosystemConfig::load(args.config.as_deref()).context("Failed to load config")?;
    let eco = Ecosystem::new(&config).context("Invalid configuration")?;
    save_snapshot(state, &eco.snapshot()).context("Failed to save snapshot")?;
    println!("Snapshot written to: {}", state.display());
    Ok(())
}

fn open(state: &Path) -> Result<Ecosystem> {
    let snapshot = load_snapshot(state)
        .with_context(|| format!("Failed to load snapshot (run `init` first): {}", state.display()))?;
    Ok(Ecosystem::from_state(snapshot))
}

/// Run `op` against the snapshot and save only if it succeeds.
fn mutate(state: &Path, op: impl FnOnce(&Ecosystem) -> Result<()>) -> Result<()> {
    let eco = open(state)?;
    op(&eco)?;
    save_snapshot(state, &eco.snapshot()).context("Failed to save snapshot")?;
    Ok(())
}

/// Parse `0x…` hex or `@label`.
fn parse_address(s: &str) -> Result<Address, SminemError> {
    match s.strip_prefix('@') {
        Some(label) => Ok(Address::from_label(label)),
        None => Ok(Address::decode(s)?),
    }
}

fn parse_addresses(items: &[String]) -> Result<Vec<Address>, SminemError> {
    items.iter().map(|s| parse_address(s.trim())).collect()
}

/// Parse a decimal token amount into fragments without floating point.
fn parse_amount(s: &str, decimals: u8) -> Result<u64> {
    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    if whole.is_empty() && frac.is_empty() {
        bail!("Empty amount");
    }
    if frac.len() > decimals as usize {
        bail!("Amount {s} has more than {decimals} decimal places");
    }
    let unit = 10u64
        .checked_pow(decimals as u32)
        .context("Decimals out of range")?;
    let whole: u64 = if whole.is_empty() {
        0
    } else {
        whole.parse().with_context(|| format!("Invalid amount: {s}"))?
    };
    let frac_value: u64 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<width$}", width = decimals as usize);
        padded.parse().with_context(|| format!("Invalid amount: {s}"))?
    };
    whole
        .checked_mul(unit)
        .and_then(|w| w.checked_add(frac_value))
        .with_context(|| format!("Amount overflows: {s}"))
}

/// Render fragments as a decimal token amount, trimming trailing zeros.
fn format_amount(fragments: u64, decimals: u8) -> String {
    let unit = 10u64.pow(decimals as u32);
    let whole = fragments / unit;
    let frac = fragments % unit;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:0>width$}", width = decimals as usize);
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

fn format_ids(ids: &[u64]) -> String {
    ids.iter().map(u64::to_string).collect::<Vec<_>>().join(",")
}
