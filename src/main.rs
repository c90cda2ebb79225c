// src/main.rs
use clap::Parser;
use certinfo::banner;
use certinfo::cli::{Cli, OutputFormat};
use certinfo::config::Config;
use certinfo::coordinator::RoundCoordinator;
use certinfo::fetcher::TlsFetcher;
use certinfo::input::read_targets;
use certinfo::output::summary::SummarySelection;
use certinfo::output::{OutputHandler, OutputManager, csv, json, san_list, summary};
use certinfo::progress::ProgressIndicator;
use certinfo::scope::ScopeFilter;
use certinfo::stats::StatsCollector;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::sync::{mpsc, watch};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Validate arguments
    cli.validate()?;

    if !cli.silent {
        banner::print_banner();
    }

    // Load config file if one was given
    let config = match cli.config {
        Some(ref path) => Config::from_file(path)?,
        None => Config::default(),
    };

    // Initialize logging
    let log_level = cli.log_level().unwrap_or(config.logging.level.as_str());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    // Flag errors abort here, before any worker starts
    let run_config = cli.run_config(&config)?;
    let fetcher = Arc::new(TlsFetcher::new(run_config.timeout)?);

    let targets = match cli.input {
        Some(ref path) => {
            let file = tokio::fs::File::open(path).await?;
            read_targets(BufReader::new(file)).await
        }
        None => read_targets(BufReader::new(tokio::io::stdin())).await,
    };
    tracing::info!("Loaded {} targets", targets.len());

    let stats = StatsCollector::new();
    let progress = ProgressIndicator::new(cli.should_show_progress());

    let mut coordinator = RoundCoordinator::new(run_config, fetcher)
        .with_stats(stats.clone())
        .with_progress(progress.clone());

    // Load scope filter if specified
    if let Some(ref path) = cli.scope {
        let scope = ScopeFilter::from_file(path)?;
        tracing::info!("Loaded scope filter: {} root domains", scope.count());
        coordinator = coordinator.with_scope(scope);
    }

    let output_manager = build_output(&cli)?;

    // Ctrl-C stops dispatch; records already in flight still reach the sink
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight handshakes...");
            shutdown_tx.send(true).ok();
        }
    });
    coordinator = coordinator.with_shutdown(shutdown_rx);

    if progress.is_enabled() {
        let stats_clone = stats.clone();
        let progress_clone = progress.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            loop {
                interval.tick().await;
                progress_clone.set_message(stats_clone.format_stats());
            }
        });
    }

    let (results_tx, results_rx) = mpsc::channel(coordinator.config().concurrency);
    let sink = tokio::spawn(output_manager.consume(results_rx));

    let run_summary = coordinator.run(targets, results_tx).await;
    let written = sink.await??;

    progress.finish();

    tracing::info!(
        "Run finished: {} rounds, {} hosts dispatched, {} records written",
        run_summary.rounds,
        run_summary.dispatched,
        written
    );

    if cli.stats {
        let snapshot = stats.snapshot();
        eprintln!("\nFinal Statistics:");
        eprintln!("  Rounds: {}", snapshot.rounds);
        eprintln!("  Hosts dispatched: {}", snapshot.dispatched);
        eprintln!("  Certificates: {}", snapshot.succeeded);
        eprintln!("  Failures: {}", snapshot.failed);
        eprintln!("  Discovered via SAN: {}", snapshot.discovered);
        eprintln!("  Rate: {:.1} handshakes/min", snapshot.handshakes_per_minute);
        eprintln!(
            "  Elapsed: {}",
            StatsCollector::format_elapsed(snapshot.elapsed_secs)
        );
    }

    if run_summary.interrupted {
        tracing::warn!("Run interrupted before the frontier was exhausted");
    }

    Ok(())
}

/// Pick the single output handler the flags select
fn build_output(cli: &Cli) -> anyhow::Result<OutputManager> {
    let file = match cli.output {
        Some(ref path) => Some(create_output_file(path)?),
        None => None,
    };

    let handler: Arc<dyn OutputHandler> = match cli.output_format() {
        OutputFormat::SanList => match file {
            Some(file) => Arc::new(san_list::SanListOutput::to_file(file)),
            None => Arc::new(san_list::SanListOutput::new()),
        },
        OutputFormat::Json => match file {
            Some(file) => Arc::new(json::JsonOutput::to_file(file)),
            None => Arc::new(json::JsonOutput::new()),
        },
        OutputFormat::Csv => match file {
            Some(file) => Arc::new(csv::CsvOutput::to_file(file)),
            None => Arc::new(csv::CsvOutput::new()),
        },
        OutputFormat::Summary => {
            let selection = SummarySelection {
                san: cli.san,
                issued: cli.issued,
                expires: cli.expires,
                today: cli.today,
            };
            match file {
                Some(file) => Arc::new(summary::SummaryOutput::to_file(file, selection)),
                None => Arc::new(summary::SummaryOutput::new(selection)),
            }
        }
    };

    Ok(OutputManager::new(handler))
}

fn create_output_file(path: &Path) -> anyhow::Result<std::fs::File> {
    let file = std::fs::File::create(path)?;
    tracing::info!("Writing output to: {}", path.display());
    Ok(file)
}
