//! Newslab CLI: build a labeled news/price dataset in stages.
//!
//! Commands:
//! - `universe`: list the index constituents into `universe.csv`
//! - `news`: fetch headlines per ticker (search API, then company news pages)
//! - `prices`: fetch daily bars per ticker
//! - `label`: align news to forward returns and write the labeled table
//! - `run`: all four stages in order
//!
//! Every stage reads `--config` (TOML) when given; flags override it.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use newslab_core::data::HttpSourceClient;
use newslab_runner::{
    run_label_stage, run_news_stage, run_prices_stage, run_universe_stage, LabelJob, LabelReport,
    PipelineConfig, StageSummary, TracingProgress,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "newslab",
    about = "Newslab: A-share news headlines labeled with forward price returns"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data directory. Overrides `data_dir` in the config file.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Optional TOML pipeline configuration.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug-level logging (RUST_LOG takes precedence).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List index constituents and write universe.csv.
    Universe {
        /// Index node on the listing service (e.g. hs300).
        #[arg(long)]
        node: Option<String>,
    },
    /// Fetch news headlines for every ticker in the universe.
    News(NewsArgs),
    /// Fetch daily price bars for every ticker in the universe.
    Prices(PricesArgs),
    /// Align stored news with stored prices and write labeled samples.
    Label(LabelArgs),
    /// Run universe, news, prices and label in order.
    Run {
        /// Refetch tickers even when their files exist.
        #[arg(long, default_value_t = false)]
        force: bool,

        #[command(flatten)]
        proxy: ProxyArgs,
    },
}

#[derive(Args)]
struct ProxyArgs {
    /// Proxy URL for http requests.
    #[arg(long)]
    http_proxy: Option<String>,

    /// Proxy URL for https requests.
    #[arg(long)]
    https_proxy: Option<String>,
}

#[derive(Args)]
struct NewsArgs {
    /// Page cap per query.
    #[arg(long)]
    max_pages: Option<u32>,

    /// Results per search page.
    #[arg(long)]
    page_size: Option<u32>,

    /// Seconds to pause between pages.
    #[arg(long)]
    sleep: Option<f64>,

    /// Retries per page after the first attempt.
    #[arg(long)]
    retries: Option<u32>,

    /// Refetch tickers even when their files exist.
    #[arg(long, default_value_t = false)]
    force: bool,

    #[command(flatten)]
    proxy: ProxyArgs,
}

#[derive(Args)]
struct PricesArgs {
    /// Number of daily bars to request per ticker.
    #[arg(long)]
    datalen: Option<u32>,

    /// Seconds to pause between tickers.
    #[arg(long)]
    sleep: Option<f64>,

    /// Refetch tickers even when their files exist.
    #[arg(long, default_value_t = false)]
    force: bool,

    #[command(flatten)]
    proxy: ProxyArgs,
}

#[derive(Args)]
struct LabelArgs {
    /// News table: a CSV file or a directory of per-ticker files.
    #[arg(long)]
    news: Option<PathBuf>,

    /// Price table: a CSV file or a directory of per-ticker files.
    #[arg(long)]
    prices: Option<PathBuf>,

    /// Output CSV.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Forward-return horizon in trading days.
    #[arg(long)]
    horizon: Option<usize>,

    /// Session close (HH:MM); news after it belongs to the next business day.
    #[arg(long)]
    session_close: Option<String>,

    /// Minutes between publication and the earliest tradable moment.
    #[arg(long)]
    delay_minutes: Option<i64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    match cli.command {
        Commands::Universe { node } => {
            if let Some(node) = node {
                config.universe.node = node;
            }
            config.validate()?;
            let client = http_client(&config)?;
            let universe = run_universe_stage(&client, &config)?;
            println!(
                "Universe: {} instruments{} -> {}",
                universe.len(),
                if universe.from_seed { " (seed list)" } else { "" },
                config.layout().universe().display()
            );
        }
        Commands::News(args) => {
            apply_news_args(&mut config, args);
            config.validate()?;
            let client = http_client(&config)?;
            let summary = run_news_stage(&client, &config, &TracingProgress)?;
            print_stage(&summary);
        }
        Commands::Prices(args) => {
            apply_prices_args(&mut config, args);
            config.validate()?;
            let client = http_client(&config)?;
            let summary = run_prices_stage(&client, &config, &TracingProgress)?;
            print_stage(&summary);
        }
        Commands::Label(args) => {
            let LabelArgs {
                news,
                prices,
                out,
                horizon,
                session_close,
                delay_minutes,
            } = args;
            if let Some(h) = horizon {
                config.align.horizon = h;
            }
            if let Some(close) = session_close {
                config.align.session_close = close;
            }
            if let Some(minutes) = delay_minutes {
                config.align.delay_minutes = minutes;
            }
            config.validate()?;

            let mut job = LabelJob::from_layout(&config.layout(), config.align_params()?);
            if let Some(path) = news {
                job.news = path;
            }
            if let Some(path) = prices {
                job.prices = path;
            }
            if let Some(path) = out {
                job.out = path;
            }
            let report = run_label_stage(&job)?;
            print_label(&report);
        }
        Commands::Run { force, proxy } => {
            config.fetch.force |= force;
            apply_proxy_args(&mut config, proxy);
            config.validate()?;
            let client = http_client(&config)?;

            run_universe_stage(&client, &config)?;
            print_stage(&run_news_stage(&client, &config, &TracingProgress)?);
            print_stage(&run_prices_stage(&client, &config, &TracingProgress)?);
            let job = LabelJob::from_layout(&config.layout(), config.align_params()?);
            print_label(&run_label_stage(&job)?);
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn http_client(config: &PipelineConfig) -> Result<HttpSourceClient> {
    HttpSourceClient::new(&config.transport()).context("building HTTP client")
}

fn apply_proxy_args(config: &mut PipelineConfig, args: ProxyArgs) {
    if args.http_proxy.is_some() {
        config.proxy.http = args.http_proxy;
    }
    if args.https_proxy.is_some() {
        config.proxy.https = args.https_proxy;
    }
}

fn apply_news_args(config: &mut PipelineConfig, args: NewsArgs) {
    let fetch = &mut config.fetch;
    if let Some(v) = args.max_pages {
        fetch.max_pages = v;
    }
    if let Some(v) = args.page_size {
        fetch.page_size = v;
    }
    if let Some(v) = args.sleep {
        fetch.sleep_secs = v;
    }
    if let Some(v) = args.retries {
        fetch.retries = v;
    }
    fetch.force |= args.force;
    apply_proxy_args(config, args.proxy);
}

fn apply_prices_args(config: &mut PipelineConfig, args: PricesArgs) {
    if let Some(v) = args.datalen {
        config.prices.datalen = v;
    }
    if let Some(v) = args.sleep {
        config.prices.sleep_secs = v;
    }
    config.fetch.force |= args.force;
    apply_proxy_args(config, args.proxy);
}

fn print_stage(summary: &StageSummary) {
    println!(
        "{}: {} tickers, {} fetched, {} reused, {} empty, {} failed, {} rows",
        summary.stage,
        summary.total,
        summary.fetched,
        summary.reused,
        summary.empty,
        summary.failed.len(),
        summary.rows
    );
    for (ticker, err) in &summary.failed {
        eprintln!("  {ticker}: {err}");
    }
}

fn print_label(report: &LabelReport) {
    let m = &report.manifest;
    println!("Labels: {}", report.out.display());
    println!(
        "  news {} -> {} on trading days -> {} samples ({} positive)",
        m.news_rows, m.retained, m.samples, m.positive
    );
    println!(
        "  dropped: {} without a forward bar, {} without a forward return",
        m.no_forward_bar, m.no_forward_return
    );
    println!("  hash: {}", m.content_hash);
}
