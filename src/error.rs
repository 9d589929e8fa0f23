use std::path::PathBuf;

use thiserror::Error;

/// Failures while loading a resolver catalog or list
#[derive(Error, Debug)]
pub enum CatalogError {
	#[error("failed to read resolver file '{path}': {source}")]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("invalid resolver catalog '{path}': {source}")]
	Parse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},
	#[error("empty resolver address")]
	EmptyResolver,
}

/// Failures while saving or loading the last-results snapshot
#[derive(Error, Debug)]
pub enum SnapshotError {
	#[error("failed to access snapshot '{path}': {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("corrupt snapshot '{path}': {source}")]
	Format {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},
}
