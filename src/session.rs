use std::future::Future;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::bench::CancelToken;
use crate::error::SnapshotError;
use crate::transport::ResolverResult;

/// Display list of a finished or cancelled scan, kept between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastResults {
	pub results: Vec<ResolverResult>,
	pub cancelled: bool,
	pub sample_size: usize,
	pub timestamp: DateTime<Utc>,
}

impl LastResults {
	pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
		let path = path.as_ref();
		let json = serde_json::to_string_pretty(self)
			.map_err(|source| SnapshotError::Format { path: path.to_path_buf(), source })?;
		std::fs::write(path, json)
			.map_err(|source| SnapshotError::Io { path: path.to_path_buf(), source })
	}

	pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path)
			.map_err(|source| SnapshotError::Io { path: path.to_path_buf(), source })?;
		serde_json::from_str(&content)
			.map_err(|source| SnapshotError::Format { path: path.to_path_buf(), source })
	}
}

/// Caller-owned state of one scan: the cancel flag and results gathered so far.
///
/// The probing engine itself holds no state between scans.
#[derive(Debug, Default)]
pub struct ScanSession {
	pub cancel: CancelToken,
	pub results: Vec<ResolverResult>,
	pub sample_size: usize,
}

impl ScanSession {
	pub fn new(sample_size: usize) -> Self {
		ScanSession {
			cancel: CancelToken::new(),
			results: Vec::with_capacity(sample_size),
			sample_size,
		}
	}

	pub fn record(&mut self, result: ResolverResult) {
		self.results.push(result);
	}

	pub fn completed(&self) -> usize {
		self.results.len()
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}

	/// Snapshot of the display list, truncated to `limit` entries.
	pub fn snapshot(&self, display: &[ResolverResult], limit: usize) -> LastResults {
		LastResults {
			results: display.iter().take(limit).cloned().collect(),
			cancelled: self.is_cancelled(),
			sample_size: self.sample_size,
			timestamp: Utc::now(),
		}
	}
}

/// Wait for interrupts: the first one sets `token`, the second returns `true`.
///
/// Returns `false` as soon as `next_signal` reports that no further interrupt
/// can arrive. The caller exits the process on `true`.
pub async fn watch_interrupts<F, Fut>(token: CancelToken, mut next_signal: F) -> bool
where
	F: FnMut() -> Fut,
	Fut: Future<Output = bool>,
{
	if !next_signal().await {
		return false;
	}
	warn!("cancel requested, waiting for in-flight requests (press Ctrl-C again to quit)");
	token.cancel();
	next_signal().await
}
