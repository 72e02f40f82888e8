//! Command-line entry point.

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use serp_analyzer::config::{RunConfig, SearchProvider};
use serp_analyzer::models::AnalysisReport;
use serp_analyzer::observability::{init_tracing, LogFormat};
use serp_analyzer::output::ReportWriter;
use serp_analyzer::pipeline::{
    CancellationToken, LoggingProgressObserver, Pipeline, ProgressObserver, ProgressUpdate,
};

const DEFAULT_COUNT: u32 = 10;
const DEFAULT_DELAY_SECONDS: f64 = 2.0;

/// Analyze the titles, meta descriptions and headings of top search results.
#[derive(Debug, Parser)]
#[command(name = "serp-analyzer", version, about)]
struct Args {
    /// Search query. Prompted for when omitted.
    query: Option<String>,

    /// Number of results to analyze (1-100). Prompted for when omitted.
    #[arg(short = 'n', long, env = "SERP_COUNT")]
    count: Option<u32>,

    /// Seconds to wait between page requests.
    #[arg(long, env = "SERP_DELAY")]
    delay: Option<f64>,

    /// Per-page fetch timeout in seconds.
    #[arg(long, env = "SERP_TIMEOUT")]
    timeout: Option<f64>,

    /// Search provider to resolve results from.
    #[arg(long, value_enum, env = "SERP_PROVIDER")]
    provider: Option<SearchProvider>,

    /// Directory for the JSON and CSV reports.
    #[arg(short, long, env = "SERP_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// JSON run configuration file; flags override its values.
    #[arg(short, long, env = "SERP_CONFIG")]
    config: Option<PathBuf>,

    /// Retries per URL for transient fetch failures.
    #[arg(long, env = "SERP_RETRIES")]
    retries: Option<usize>,

    /// Emit logs as JSON.
    #[arg(long)]
    log_json: bool,

    /// Disable the progress bar and log progress instead.
    #[arg(long)]
    no_progress: bool,
}

/// Progress bar driven by pipeline events.
struct BarObserver {
    bar: ProgressBar,
}

impl BarObserver {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        Self { bar }
    }
}

impl ProgressObserver for BarObserver {
    fn on_resolved(&self, total: usize) {
        self.bar.set_length(total as u64);
    }

    fn on_entry_started(&self, rank: u32, total: usize, url: &str) {
        self.bar
            .set_message(format!("Analyzing URL {rank}/{total}: {url}"));
    }

    fn on_entry_finished(&self, update: &ProgressUpdate) {
        if !update.success {
            self.bar
                .println(format!("  #{} {} failed: {}", update.rank, update.url, update.summary));
        }
        self.bar.inc(1);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let format = if args.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_tracing(format).context("failed to initialize logging")?;

    let config = build_config(&args)?;
    let pipeline = Pipeline::from_config(&config).context("failed to set up HTTP clients")?;

    let cancel = Arc::new(CancellationToken::new());
    {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, stopping after the current URL");
                cancel.cancel("interrupted by user");
            }
        });
    }

    info!(query = config.query(), count = config.count(), "Starting analysis");
    let result = if args.no_progress {
        pipeline
            .run_with(&config, &LoggingProgressObserver, &cancel)
            .await
    } else {
        let observer = BarObserver::new();
        let result = pipeline.run_with(&config, &observer, &cancel).await;
        observer.bar.finish_and_clear();
        result
    };
    let report =
        result.with_context(|| format!("analysis of \"{}\" failed", config.query()))?;

    let writer = ReportWriter::new(&args.output_dir);
    let written = writer
        .write(&report)
        .with_context(|| format!("failed to write reports to {}", writer.dir().display()))?;

    print_summary(&report);
    println!("JSON report: {}", written.json_path.display());
    println!("CSV report:  {}", written.csv_path.display());
    Ok(())
}

/// Merges the config file, flags and interactive prompts into a run config.
fn build_config(args: &Args) -> Result<RunConfig> {
    let base = args
        .config
        .as_ref()
        .map(|path| {
            RunConfig::from_json_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))
        })
        .transpose()?;

    let query = match (&args.query, &base) {
        (Some(query), _) => query.clone(),
        (None, Some(base)) => base.query().to_string(),
        (None, None) => prompt("Enter your search query: ")?,
    };
    let count = match (args.count, &base) {
        (Some(count), _) => count,
        (None, Some(base)) => base.count(),
        (None, None) => prompt_count()?,
    };
    let delay = args
        .delay
        .or_else(|| base.as_ref().map(|b| b.delay().as_secs_f64()))
        .unwrap_or(DEFAULT_DELAY_SECONDS);

    let mut config = RunConfig::new(query, count, delay)?;
    if let Some(base) = &base {
        config = config
            .with_fetch(base.fetch().clone())
            .with_resolver(base.resolver().clone())
            .with_retry(base.retry().clone());
    }

    let mut fetch = config.fetch().clone();
    let mut resolver = config.resolver().clone();
    let mut retry = config.retry().clone();
    if let Some(timeout) = args.timeout {
        fetch = fetch.with_timeout(timeout);
    }
    if let Some(provider) = args.provider {
        resolver = resolver.with_provider(provider);
    }
    if let Some(retries) = args.retries {
        retry = retry.with_max_retries(retries);
    }

    Ok(config
        .with_fetch(fetch)
        .with_resolver(resolver)
        .with_retry(retry)
        .validated()?)
}

fn prompt(message: &str) -> Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{message}")?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(line.trim().to_string())
}

fn prompt_count() -> Result<u32> {
    let answer = prompt(&format!(
        "Enter number of results to analyze (default {DEFAULT_COUNT}): "
    ))?;
    if answer.is_empty() {
        return Ok(DEFAULT_COUNT);
    }
    match answer.parse::<u32>() {
        Ok(count) if count > 0 => Ok(count),
        _ => bail!("'{answer}' is not a positive whole number"),
    }
}

fn print_summary(report: &AnalysisReport) {
    let summary = report.summary();
    println!();
    println!(
        "Analyzed {} results for \"{}\": {} succeeded, {} failed",
        summary.total, report.query, summary.succeeded, summary.failed
    );
    if summary.succeeded == 0 {
        warn!("No pages could be analyzed");
        return;
    }
    println!("Average H1 tags: {:.1}", summary.avg_h1);
    println!("Average H2 tags: {:.1}", summary.avg_h2);
}
