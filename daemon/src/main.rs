//! Rebase daemon: entry point for the rebase node.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use rebase_node::{
    init_logging, Clock, DomainSnapshot, EventBus, LogFormat, NodeConfig, RebaseNode,
};
use rebase_nullables::{NullClock, NullConsumedStore, NullCustody};
use rebase_types::{AccountId, Amount, DomainId, Timestamp};
use rebase_utils::{annual_rate_bps, format_duration, format_elapsed, format_rate};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "rebase-daemon", about = "Interest-accruing ledger with a cross-domain bridge")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings are
    /// used as the base; CLI flags and env vars override them.
    #[arg(long, env = "REBASE_CONFIG")]
    config: Option<PathBuf>,

    /// Ledger admin account.
    #[arg(long, env = "REBASE_ADMIN")]
    admin: Option<String>,

    /// Starting global rate in 1e-18 per second.
    #[arg(long, env = "REBASE_GLOBAL_RATE")]
    global_rate: Option<u64>,

    /// Shuffle bridge message delivery.
    #[arg(long, env = "REBASE_REORDER")]
    reorder: bool,

    /// Seed for the delivery shuffle.
    #[arg(long, env = "REBASE_REORDER_SEED")]
    reorder_seed: Option<u64>,

    /// Delivery attempts per bridge message.
    #[arg(long, env = "REBASE_MAX_ATTEMPTS")]
    max_attempts: Option<u32>,

    /// Collect Prometheus metrics.
    #[arg(long, env = "REBASE_ENABLE_METRICS")]
    metrics: bool,

    /// Log format: "human" or "json".
    #[arg(long, env = "REBASE_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "REBASE_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Print the effective configuration as TOML.
    Config,
    /// Deposit, bridge and redeem across two domains on a simulated clock,
    /// then print a JSON report.
    Simulate(SimulateArgs),
}

#[derive(clap::Args)]
struct SimulateArgs {
    /// Backing value the holder deposits on the source domain.
    #[arg(long, default_value_t = 1_000_000)]
    deposit: u128,

    /// Principal bridged to the destination domain.
    #[arg(long, default_value_t = 400_000)]
    amount: u128,

    /// Simulated seconds before and after the bridge.
    #[arg(long, default_value_t = 86_400)]
    elapsed: u64,

    #[arg(long, default_value = "acct_alice")]
    holder: String,

    #[arg(long, default_value = "acct_bob")]
    recipient: String,

    /// Source domain id (defaults to the first configured domain).
    #[arg(long)]
    source: Option<u64>,

    /// Destination domain id (defaults to the second configured domain).
    #[arg(long)]
    destination: Option<u64>,
}

#[derive(Serialize)]
struct SimulationReport {
    source: u64,
    destination: u64,
    holder: String,
    recipient: String,
    deposited: u128,
    bridged: u128,
    message: String,
    elapsed_per_phase: String,
    simulated_time: String,
    source_rate: String,
    source_rate_bps: u128,
    holder_balance: u128,
    recipient_balance: u128,
    rewards_funded: u128,
    redeemed: u128,
    delivered: u64,
    rejected: u64,
    dead_lettered: usize,
    domains: Vec<DomainSnapshot>,
}

/// Build the effective config: file (or defaults) overridden by CLI flags.
fn resolve_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let path = path.to_str().context("config path is not valid UTF-8")?;
            NodeConfig::from_toml_file(path).with_context(|| format!("loading {path}"))?
        }
        None => NodeConfig::default(),
    };

    if let Some(admin) = &cli.admin {
        config.admin = admin.clone();
    }
    if let Some(rate) = cli.global_rate {
        config.initial_global_rate = rate;
    }
    if cli.reorder {
        config.relay.reorder = true;
    }
    if cli.reorder_seed.is_some() {
        config.relay.reorder_seed = cli.reorder_seed;
    }
    if let Some(attempts) = cli.max_attempts {
        config.relay.max_delivery_attempts = attempts;
    }
    config.enable_metrics |= cli.metrics;
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }

    config.validate()?;
    Ok(config)
}

fn pick_domains(config: &NodeConfig, args: &SimulateArgs) -> anyhow::Result<(DomainId, DomainId)> {
    let mut ids = config.domain_ids();
    let source = match args.source {
        Some(id) => DomainId::new(id),
        None => ids.next().context("no domains configured")?,
    };
    let destination = match args.destination {
        Some(id) => DomainId::new(id),
        None => config
            .domain_ids()
            .find(|id| *id != source)
            .context("simulation needs a second domain")?,
    };
    if source == destination {
        bail!("source and destination must differ");
    }
    Ok((source, destination))
}

async fn simulate(config: NodeConfig, args: SimulateArgs) -> anyhow::Result<SimulationReport> {
    let (source, destination) = pick_domains(&config, &args)?;
    let holder = AccountId::parse(&args.holder)?;
    let recipient = AccountId::parse(&args.recipient)?;
    let treasury = AccountId::new("acct_treasury");
    let source_rate = config.ledger_params().initial_global_rate;

    let start = Timestamp::EPOCH;
    let clock = Arc::new(NullClock::new(start.as_secs()));
    let node_clock: Arc<dyn Clock> = clock.clone();
    let node: RebaseNode<NullCustody, NullConsumedStore> =
        RebaseNode::start(config, node_clock, EventBus::new(), |_| {
            (NullCustody::new(), NullConsumedStore::new())
        })?;

    node.deposit(source, &holder, args.deposit).await?;
    clock.advance(args.elapsed);

    let id = node
        .bridge(source, &holder, args.amount, destination, &recipient)
        .await?;
    node.flush().await;
    clock.advance(args.elapsed);

    let holder_balance = node.balance_of(source, &holder).await?;
    let recipient_balance = node.balance_of(destination, &recipient).await?;

    // Accrued interest is paid out of reserves the depositor never supplied.
    let reserves = node
        .domain(source)?
        .lock()
        .await
        .snapshot(clock.now())?
        .reserves;
    let rewards_funded = holder_balance.saturating_sub(reserves);
    if rewards_funded > 0 {
        node.fund_rewards(source, &treasury, rewards_funded).await?;
    }
    let redeemed = node.redeem(source, &holder, Amount::All).await?;

    let stats = node.relay_stats();
    let domains = node.snapshot().await?;
    if let Some(text) = node.metrics_text()? {
        tracing::debug!(bytes = text.len(), "metrics gathered");
    }
    node.shutdown().await;

    Ok(SimulationReport {
        source: source.as_u64(),
        destination: destination.as_u64(),
        holder: holder.to_string(),
        recipient: recipient.to_string(),
        deposited: args.deposit,
        bridged: args.amount,
        message: id.to_string(),
        elapsed_per_phase: format_duration(args.elapsed),
        simulated_time: format_elapsed(start, clock.now()),
        source_rate: format_rate(source_rate),
        source_rate_bps: annual_rate_bps(source_rate),
        holder_balance,
        recipient_balance,
        rewards_funded,
        redeemed,
        delivered: stats.delivered,
        rejected: stats.rejected,
        dead_lettered: stats.dead_lettered,
        domains,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    match cli.command {
        Command::Config => {
            rebase_utils::init_tracing();
            print!("{}", config.to_toml_string()?);
        }
        Command::Simulate(args) => {
            init_logging(config.log_format, &config.log_level);
            tracing::info!(domains = config.domains.len(), "starting simulation");
            let report = simulate(config, args).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("rebase-daemon").chain(args.iter().copied()))
            .expect("valid arguments")
    }

    #[test]
    fn flags_override_defaults() {
        let cli = parse(&[
            "--global-rate",
            "1000",
            "--reorder",
            "--reorder-seed",
            "9",
            "--log-format",
            "json",
            "config",
        ]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.initial_global_rate, 1000);
        assert!(config.relay.reorder);
        assert_eq!(config.relay.reorder_seed, Some(9));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn bad_admin_fails_validation() {
        let cli = parse(&["--admin", "root", "config"]);
        assert!(resolve_config(&cli).is_err());
    }

    #[test]
    fn default_domains_are_picked_in_order() {
        let cli = parse(&["simulate"]);
        let Command::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        let (source, destination) = pick_domains(&NodeConfig::default(), &args).unwrap();
        assert_eq!(source, DomainId::new(1));
        assert_eq!(destination, DomainId::new(2));
    }

    #[tokio::test]
    async fn simulation_balances_add_up() {
        let cli = parse(&["--global-rate", "1000000000000000", "simulate", "--elapsed", "10"]);
        let config = resolve_config(&cli).unwrap();
        let Command::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        let report = simulate(config, args).await.unwrap();

        // 1e-3 per second: 1_000_000 grows to 1_010_000 by the send, the
        // remaining 610_000 grows to 616_100 by the redeem.
        assert_eq!(report.holder_balance, 616_100);
        assert_eq!(report.recipient_balance, 404_000);
        assert_eq!(report.redeemed, 616_100);
        assert_eq!(report.rewards_funded, 0);
        assert_eq!(report.delivered, 1);
        assert_eq!(report.simulated_time, "20s");
        assert_eq!(report.domains.len(), 2);
        assert_eq!(report.domains[0].total_principal, 0);
    }
}
