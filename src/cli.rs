use clap::Parser;

/// Resolver latency scanner
#[derive(Parser, Debug)]
#[command(name = "dns-probe")]
#[command(about = "Rank DNS, DoH and DNSCrypt resolvers by HTTPS connection latency")]
pub struct Cli {
	/// Resolver endpoint (repeatable, e.g. 1.1.1.1 or https://dns.google/dns-query)
	#[arg(short = 'r', long = "resolver")]
	pub resolvers: Vec<String>,

	/// Resolver catalog (JSON array) or plain list with one endpoint per line
	#[arg(short = 'f', long = "resolver-file")]
	pub resolver_file: Option<String>,

	/// Number of resolvers to test, picked at random from the catalog (default: all, in order)
	#[arg(short = 'n', long = "count")]
	pub count: Option<usize>,

	/// Random seed for a reproducible selection
	#[arg(short = 's', long = "seed")]
	pub seed: Option<u64>,

	/// Resolvers probed in parallel per batch
	#[arg(short = 'c', long = "concurrency", default_value = "4")]
	pub concurrency: usize,

	/// Probes per resolver
	#[arg(long = "samples", default_value = "3")]
	pub samples: u32,

	/// Per-probe timeout in milliseconds
	#[arg(short = 't', long = "timeout", default_value = "2000")]
	pub timeout: u64,

	/// Delay after each probe in milliseconds
	#[arg(long = "spacing", default_value = "50")]
	pub spacing: u64,

	/// Pause between batches in milliseconds
	#[arg(long = "cooldown", default_value = "150")]
	pub cooldown: u64,

	/// Count connection errors as timeouts instead of timed samples
	#[arg(long = "strict-failures")]
	pub strict_failures: bool,

	/// Number of grouped results shown
	#[arg(long = "top", default_value = "50")]
	pub top: usize,

	/// Variants listed per result
	#[arg(long = "variants", default_value = "5")]
	pub variants: usize,

	/// Output CSV file path (raw, ungrouped results)
	#[arg(short = 'o', long = "output")]
	pub output: Option<String>,

	/// Save the grouped results to this snapshot file
	#[arg(long = "save")]
	pub save: Option<String>,

	/// Show the results saved in this snapshot file and exit
	#[arg(long = "last")]
	pub last: Option<String>,

	/// Log every probe result
	#[arg(short = 'v', long = "verbose")]
	pub verbose: bool,
}
