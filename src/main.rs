mod bench;
mod cli;
mod error;
mod output;
mod probe;
mod rank;
mod resolver;
mod session;
mod stats;
mod target;
mod transport;

use std::time::Duration;

use anyhow::bail;
use clap::Parser;
use log::warn;

use crate::cli::Cli;
use crate::probe::HttpProber;
use crate::session::{watch_interrupts, LastResults, ScanSession};
use crate::transport::{FailurePolicy, ScanConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	let default_filter = if cli.verbose { "info" } else { "warn" };
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
		.init();

	// Replay a saved scan without probing
	if let Some(path) = &cli.last {
		let last = LastResults::load(path)?;
		let cancelled = if last.cancelled { ", cancelled" } else { "" };
		println!(
			"Previous scan: {} ({} resolvers{})",
			last.timestamp.format("%Y-%m-%d %H:%M:%S UTC"), last.sample_size, cancelled,
		);
		output::print_results_table(&last.results, cli.top, cli.variants);
		return Ok(());
	}

	// Collect resolvers from all sources
	let mut catalog = Vec::new();

	// From CLI flags
	for r in &cli.resolvers {
		catalog.push(resolver::parse_resolver(r)?);
	}

	// From resolver file
	if let Some(path) = &cli.resolver_file {
		catalog.extend(resolver::read_resolver_file(path)?);
	}

	// Fall back to defaults if no resolvers specified
	if catalog.is_empty() {
		catalog = resolver::default_resolvers();
	}

	let catalog_size = catalog.len();
	if cli.count == Some(0) {
		bail!("--count must be at least 1");
	}
	// Without --count every resolver is scanned in catalog order
	let selected = resolver::select_sample(catalog, cli.count, cli.seed);
	let total = selected.len();

	let config = ScanConfig {
		batch_size: cli.concurrency.max(1),
		samples_per_resolver: cli.samples,
		sample_delay: Duration::from_millis(cli.spacing),
		batch_cooldown: Duration::from_millis(cli.cooldown),
		probe_timeout: Duration::from_millis(cli.timeout),
		failure_policy: if cli.strict_failures {
			FailurePolicy::Sentinel
		} else {
			FailurePolicy::CountElapsed
		},
		..ScanConfig::default()
	};

	output::print_config_summary(&selected, catalog_size, &config);

	let prober = HttpProber::new(&config)?;
	let mut session = ScanSession::new(total);

	// First Ctrl-C stops new batches and keeps finished results, a second one quits
	let token = session.cancel.clone();
	let signal_token = token.clone();
	tokio::spawn(async move {
		let quit = watch_interrupts(signal_token, || async {
			tokio::signal::ctrl_c().await.is_ok()
		}).await;
		if quit {
			warn!("interrupted again, exiting");
			std::process::exit(130);
		}
	});

	println!("Probing {} resolvers...", total);
	bench::run_batch_test(
		&selected,
		&prober,
		&config,
		|result| {
			output::print_progress(&result, session.completed() + 1, total);
			session.record(result);
		},
		|| token.is_cancelled(),
	).await;

	let mut raw = session.results.clone();
	rank::sort_results(&mut raw);
	if session.is_cancelled() {
		println!("\nScan cancelled after {} of {} resolvers", raw.len(), total);
	}
	let succeeded = raw.iter().filter(|r| r.is_success()).count();
	println!("{} of {} resolvers reachable", succeeded, raw.len());

	let display = rank::build_display_results(raw.clone());
	output::print_results_table(&display, cli.top, cli.variants);

	// Write CSV if requested
	if let Some(path) = &cli.output {
		output::write_csv(path, &raw)?;
	}

	if let Some(path) = &cli.save {
		session.snapshot(&display, cli.top).save(path)?;
		println!("Snapshot saved to: {}", path);
	}

	Ok(())
}
