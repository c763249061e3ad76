//! Backlab CLI: assemble, check and submit strategy drafts.
//!
//! Commands:
//! - `assemble`: replay a TOML draft and print the request JSON
//! - `check`: report what blocks submission and any lints
//! - `submit`: send the request to the backtest service and print the summary
//! - `datasets`: list datasets known to the service
//! - `strategies list|save|delete`: manage saved strategies

mod export;
mod logging;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use backlab_client::{ApiClient, BacktestBackend, ClientConfig, SubmitError, Submitter};
use backlab_core::contract::{BacktestRequest, BacktestResponse, NewStrategy};
use backlab_core::{CompositeStrategyBuilder, DatasetId, StrategyDraft, Strictness};

use logging::LogFormat;

#[derive(Parser)]
#[command(
    name = "backlab",
    version,
    about = "Backlab: compose trading conditions into backtest requests"
)]
struct Cli {
    /// Client config file.
    #[arg(long, global = true, default_value = "backlab.toml")]
    config: PathBuf,

    /// Backtest service URL (overrides config and BACKLAB_API_URL).
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Debug logging.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Warnings and errors only.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a draft through the builder and print the assembled request.
    Assemble {
        #[arg(long)]
        draft: PathBuf,

        /// Single-line JSON.
        #[arg(long, default_value_t = false)]
        compact: bool,
    },
    /// Report missing selections and lints for a draft.
    Check {
        #[arg(long)]
        draft: PathBuf,

        /// Override the draft's strictness: permissive, warn or strict.
        #[arg(long)]
        strictness: Option<Strictness>,
    },
    /// Submit a draft and wait for the result.
    Submit {
        #[arg(long)]
        draft: PathBuf,

        #[arg(long)]
        strictness: Option<Strictness>,

        /// Write the trade list as CSV.
        #[arg(long)]
        trades_csv: Option<PathBuf>,

        /// Write the equity curve as CSV.
        #[arg(long)]
        equity_csv: Option<PathBuf>,

        /// Write the full response as JSON.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Save the strategy under this name after a successful run.
        #[arg(long)]
        save_as: Option<String>,

        #[arg(long, requires = "save_as")]
        comments: Option<String>,
    },
    /// List datasets, or show one.
    Datasets {
        #[arg(long)]
        id: Option<u64>,
    },
    /// Saved strategy management.
    Strategies {
        #[command(subcommand)]
        action: StrategiesAction,
    },
}

#[derive(Subcommand)]
enum StrategiesAction {
    /// List saved strategies.
    List,
    /// Save a draft together with a response previously written by `submit --output`.
    Save {
        #[arg(long)]
        draft: PathBuf,

        #[arg(long)]
        results: PathBuf,

        #[arg(long)]
        name: String,

        #[arg(long)]
        comments: Option<String>,
    },
    /// Delete a saved strategy by id.
    Delete { id: u64 },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_format, cli.verbose, cli.quiet)?;

    match cli.command {
        Commands::Assemble { draft, compact } => run_assemble(&draft, compact),
        Commands::Check { draft, strictness } => run_check(&draft, strictness),
        Commands::Submit {
            draft,
            strictness,
            trades_csv,
            equity_csv,
            output,
            save_as,
            comments,
        } => {
            let client = api_client(&cli.config, cli.api_url.as_deref())?;
            let outputs = SubmitOutputs {
                trades_csv,
                equity_csv,
                output,
            };
            run_submit(client, &draft, strictness, &outputs, save_as, comments)
        }
        Commands::Datasets { id } => {
            let client = api_client(&cli.config, cli.api_url.as_deref())?;
            run_datasets(&client, id)
        }
        Commands::Strategies { action } => {
            let client = api_client(&cli.config, cli.api_url.as_deref())?;
            match action {
                StrategiesAction::List => run_strategies_list(&client),
                StrategiesAction::Save {
                    draft,
                    results,
                    name,
                    comments,
                } => run_strategies_save(&client, &draft, &results, name, comments),
                StrategiesAction::Delete { id } => {
                    client.delete_strategy(id)?;
                    println!("Deleted strategy {id}");
                    Ok(())
                }
            }
        }
    }
}

fn api_client(config_path: &Path, api_url: Option<&str>) -> Result<ApiClient> {
    let mut config = ClientConfig::load(config_path)?.with_env();
    if let Some(url) = api_url {
        config = config.with_base_url(url);
    }
    tracing::debug!(base_url = %config.api.base_url, "api client configured");
    Ok(ApiClient::new(&config.api)?)
}

fn load_builder(path: &Path, strictness: Option<Strictness>) -> Result<CompositeStrategyBuilder> {
    let draft = StrategyDraft::from_path(path)?;
    let mut builder = draft.into_builder();
    if let Some(strictness) = strictness {
        builder.set_strictness(strictness);
    }
    Ok(builder)
}

// ─── assemble / check ───────────────────────────────────────────────

fn run_assemble(draft: &Path, compact: bool) -> Result<()> {
    let builder = load_builder(draft, None)?;
    let request = builder.request();
    let json = if compact {
        serde_json::to_string(request)?
    } else {
        serde_json::to_string_pretty(request)?
    };
    println!("{json}");

    if let BacktestRequest::Composite(composite) = request {
        tracing::info!(expression = %composite.expression(), "evaluation order");
    }
    tracing::info!(hash = %request.hash(), "request fingerprint");
    Ok(())
}

fn run_check(draft: &Path, strictness: Option<Strictness>) -> Result<()> {
    let builder = load_builder(draft, strictness)?;
    let gate = builder.gate();

    println!("Mode:        {}", builder.state().mode());
    println!("Conditions:  {}", builder.state().len());
    println!("Strictness:  {}", builder.strictness());
    println!("Fingerprint: {}", builder.request().hash().short());
    for missing in &gate.missing {
        println!("  missing: {missing}");
    }
    for warning in &gate.warnings {
        println!("  lint:    {warning}");
    }

    if !gate.can_submit() {
        bail!("strategy is not ready to submit");
    }
    println!("Ready to submit.");
    Ok(())
}

// ─── submit ─────────────────────────────────────────────────────────

struct SubmitOutputs {
    trades_csv: Option<PathBuf>,
    equity_csv: Option<PathBuf>,
    output: Option<PathBuf>,
}

fn run_submit(
    client: ApiClient,
    draft: &Path,
    strictness: Option<Strictness>,
    outputs: &SubmitOutputs,
    save_as: Option<String>,
    comments: Option<String>,
) -> Result<()> {
    let builder = load_builder(draft, strictness)?;
    let submitter = Submitter::new(client);

    let handle = match submitter.submit(&builder) {
        Ok(handle) => handle,
        Err(SubmitError::NotReady { missing, lints }) => {
            for m in &missing {
                eprintln!("missing: {m}");
            }
            for l in &lints {
                eprintln!("lint: {l}");
            }
            bail!("strategy is not ready to submit");
        }
        Err(e) => return Err(e.into()),
    };
    let record = handle.wait()?;

    print_summary(&record.response);
    println!("Fingerprint:  {}", record.hash.short());
    println!("Elapsed:      {} ms", record.elapsed_ms());

    if let Some(path) = &outputs.trades_csv {
        write_file(path, &export::trades_csv(&record.response.trades)?)?;
    }
    if let Some(path) = &outputs.equity_csv {
        write_file(path, &export::equity_csv(&record.response.equity)?)?;
    }
    if let Some(path) = &outputs.output {
        write_file(path, &serde_json::to_string_pretty(&record.response)?)?;
    }

    if let Some(name) = save_as {
        let strategy = NewStrategy::from_run(name, builder.request(), &record.response, comments);
        submitter.backend().save_strategy(&strategy)?;
        println!("Saved as '{}'", strategy.strategy_name);
    }
    Ok(())
}

fn print_summary(response: &BacktestResponse) {
    let r = &response.results;
    println!("Total return: {:.2}%", r.total_return * 100.0);
    println!("Sharpe:       {:.3}", r.sharpe);
    println!("Max drawdown: {:.2}%", r.max_drawdown * 100.0);
    println!("Trades:       {}", r.trades);
    if let Some(freq) = &response.freq {
        println!("Frequency:    {freq}");
    }
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

// ─── datasets / strategies ──────────────────────────────────────────

fn run_datasets(client: &ApiClient, id: Option<u64>) -> Result<()> {
    let datasets = match id {
        Some(id) => vec![client.get_dataset(DatasetId(id))?],
        None => client.list_datasets()?,
    };
    if datasets.is_empty() {
        println!("No datasets.");
        return Ok(());
    }
    println!("{:>6}  {:<32} {:>10}", "ID", "NAME", "ROWS");
    for ds in &datasets {
        println!("{:>6}  {:<32} {:>10}", ds.id.0, ds.name, ds.row_count);
    }
    Ok(())
}

fn run_strategies_list(client: &ApiClient) -> Result<()> {
    let strategies = client.list_strategies()?;
    if strategies.is_empty() {
        println!("No saved strategies.");
        return Ok(());
    }
    println!("{:>6}  {:<32} {:<24} {:>8}", "ID", "NAME", "TYPE", "TRADES");
    for s in &strategies {
        let trades = s
            .num_trades
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "{:>6}  {:<32} {:<24} {:>8}",
            s.id, s.strategy_name, s.strategy_type, trades
        );
    }
    Ok(())
}

fn run_strategies_save(
    client: &ApiClient,
    draft: &Path,
    results: &Path,
    name: String,
    comments: Option<String>,
) -> Result<()> {
    let builder = load_builder(draft, None)?;
    let content = std::fs::read_to_string(results)
        .with_context(|| format!("failed to read {}", results.display()))?;
    let response: BacktestResponse =
        serde_json::from_str(&content).context("results file is not a backtest response")?;
    let strategy = NewStrategy::from_run(name, builder.request(), &response, comments);
    client.save_strategy(&strategy)?;
    println!("Saved as '{}'", strategy.strategy_name);
    Ok(())
}
