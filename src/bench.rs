use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, info, warn};

use crate::probe::Prober;
use crate::stats::aggregate;
use crate::target::probe_target;
use crate::transport::{ResolverDescriptor, ResolverResult, ScanConfig};

/// Shared, monotonic cancellation flag for one scan.
///
/// Cloning shares the flag. Once cancelled it stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
	cancelled: Arc<AtomicBool>,
}

impl CancelToken {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn cancel(&self) {
		self.cancelled.store(true, Ordering::SeqCst);
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancelled.load(Ordering::SeqCst)
	}
}

/// Sample one resolver and fold the samples into a result.
///
/// Returns None only when the scan was cancelled before this resolver started.
async fn sample_resolver<P, C>(
	descriptor: &ResolverDescriptor,
	prober: &P,
	config: &ScanConfig,
	should_cancel: &C,
) -> Option<ResolverResult>
where
	P: Prober,
	C: Fn() -> bool,
{
	if should_cancel() {
		return None;
	}

	let target = match probe_target(descriptor) {
		Some(t) => t,
		None => {
			debug!("{}: no probe target for '{}'", descriptor.id, descriptor.primary);
			return Some(ResolverResult::unreachable(descriptor.clone()));
		}
	};

	let mut kept = Vec::new();
	for _ in 0..config.samples_per_resolver {
		if should_cancel() {
			break;
		}
		let sample = prober.probe(&target).await;
		let ms = sample.as_millis();
		if ms < config.discard_threshold_ms {
			kept.push(ms);
		}
		// Spacing applies after every sample, the last one included
		tokio::time::sleep(config.sample_delay).await;
	}

	// Early-cancelled rounds still divide by the configured sample count
	let stats = aggregate(&kept, config.samples_per_resolver);
	Some(ResolverResult {
		descriptor: descriptor.clone(),
		latency: stats.latency,
		jitter: stats.jitter,
		success_rate: stats.success_rate,
		status: stats.status,
		raw_pings: kept,
		variants: None,
	})
}

/// Probe every resolver in fixed-width batches, reporting each finished result.
///
/// Resolvers within a batch are sampled concurrently and `on_progress` sees
/// them in completion order. The next batch starts only after the current one
/// has settled and the cooldown has elapsed. `should_cancel` is polled before
/// each batch, before each sample and before each cooldown; cancellation stops
/// new work but never retracts results already reported.
pub async fn run_batch_test<P, F, C>(
	resolvers: &[ResolverDescriptor],
	prober: &P,
	config: &ScanConfig,
	mut on_progress: F,
	should_cancel: C,
)
where
	P: Prober,
	F: FnMut(ResolverResult),
	C: Fn() -> bool,
{
	let batch_size = config.batch_size.max(1);
	let batch_count = resolvers.len().div_ceil(batch_size);

	for (index, batch) in resolvers.chunks(batch_size).enumerate() {
		if should_cancel() {
			warn!("scan cancelled before batch {}/{}", index + 1, batch_count);
			break;
		}
		debug!("batch {}/{}: {} resolvers", index + 1, batch_count, batch.len());

		let mut pending: FuturesUnordered<_> = batch.iter()
			.map(|d| sample_resolver(d, prober, config, &should_cancel))
			.collect();

		while let Some(finished) = pending.next().await {
			if let Some(result) = finished {
				info!(
					"{} ({}): {} ms, jitter {} ms, {:.0}% kept, {}",
					result.descriptor.name, result.descriptor.primary,
					result.latency, result.jitter, result.success_rate,
					result.status.as_str(),
				);
				on_progress(result);
			}
		}

		if should_cancel() {
			warn!("scan cancelled after batch {}/{}", index + 1, batch_count);
			break;
		}
		tokio::time::sleep(config.batch_cooldown).await;
	}
}
