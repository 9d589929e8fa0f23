use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Latency value reserved for "unreachable / timed out / no measurement".
pub const UNREACHABLE_MS: u32 = 9999;

/// Resolver transport protocol as declared by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Protocol {
	Plain,
	Doh,
	Dot,
	Dnscrypt,
	Odoh,
	Doh3,
	#[default]
	Unknown,
}

impl Protocol {
	pub fn as_str(&self) -> &'static str {
		match self {
			Protocol::Plain => "plain",
			Protocol::Doh => "doh",
			Protocol::Dot => "dot",
			Protocol::Dnscrypt => "dnscrypt",
			Protocol::Odoh => "odoh",
			Protocol::Doh3 => "doh3",
			Protocol::Unknown => "unknown",
		}
	}

	/// DNSCrypt stamps never yield a connectable host, so their latency is not measurable.
	pub fn is_measurable(&self) -> bool {
		!matches!(self, Protocol::Dnscrypt)
	}
}

impl From<&str> for Protocol {
	fn from(value: &str) -> Self {
		match value.trim().to_ascii_lowercase().as_str() {
			"plain" => Protocol::Plain,
			"doh" => Protocol::Doh,
			"dot" => Protocol::Dot,
			"dnscrypt" => Protocol::Dnscrypt,
			"odoh" => Protocol::Odoh,
			"doh3" => Protocol::Doh3,
			_ => Protocol::Unknown,
		}
	}
}

impl From<String> for Protocol {
	fn from(value: String) -> Self {
		Protocol::from(value.as_str())
	}
}

impl fmt::Display for Protocol {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Category tag attached to a resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum Tag {
	Gaming,
	#[serde(rename = "Anti-Sanction")]
	AntiSanction,
	Security,
	General,
	Privacy,
	#[serde(rename = "Anti-Filter")]
	AntiFilter,
	/// Any label this build does not know
	Other,
}

impl From<&str> for Tag {
	fn from(value: &str) -> Self {
		match value.trim() {
			"Gaming" => Tag::Gaming,
			"Anti-Sanction" => Tag::AntiSanction,
			"Security" => Tag::Security,
			"General" => Tag::General,
			"Privacy" => Tag::Privacy,
			"Anti-Filter" => Tag::AntiFilter,
			_ => Tag::Other,
		}
	}
}

impl From<String> for Tag {
	fn from(value: String) -> Self {
		Tag::from(value.as_str())
	}
}

/// Immutable description of one resolver from the catalog
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverDescriptor {
	pub id: String,
	pub name: String,
	pub provider: String,
	pub primary: String,
	#[serde(default)]
	pub secondary: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub protocol: Option<Protocol>,
	/// Host or IP probed instead of the one derived from `primary`
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub test_target: Option<String>,
	#[serde(default, rename = "primaryIPv6", skip_serializing_if = "Option::is_none")]
	pub primary_ipv6: Option<String>,
	#[serde(default, rename = "secondaryIPv6", skip_serializing_if = "Option::is_none")]
	pub secondary_ipv6: Option<String>,
	#[serde(default)]
	pub tags: Vec<Tag>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub source: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub location: Option<String>,
}

impl ResolverDescriptor {
	pub fn protocol(&self) -> Protocol {
		self.protocol.unwrap_or_default()
	}
}

/// Outcome of a single timed probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeSample {
	/// The request settled before the abort timer fired
	Elapsed(u32),
	/// The abort timer fired first
	TimedOut,
}

impl ProbeSample {
	/// Milliseconds as reported to the aggregator; timeouts map to the sentinel.
	pub fn as_millis(&self) -> u32 {
		match self {
			ProbeSample::Elapsed(ms) => *ms,
			ProbeSample::TimedOut => UNREACHABLE_MS,
		}
	}
}

/// Lifecycle state of a resolver result
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
	#[default]
	Pending,
	Testing,
	Success,
	Failed,
}

impl Status {
	pub fn as_str(&self) -> &'static str {
		match self {
			Status::Pending => "pending",
			Status::Testing => "testing",
			Status::Success => "success",
			Status::Failed => "failed",
		}
	}
}

/// A descriptor plus the statistics gathered for it during one scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverResult {
	#[serde(flatten)]
	pub descriptor: ResolverDescriptor,
	/// Average latency in ms, `UNREACHABLE_MS` when nothing was kept
	pub latency: u32,
	pub jitter: u32,
	/// Percentage of attempted samples that were kept (0-100)
	pub success_rate: f64,
	pub status: Status,
	pub raw_pings: Vec<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub variants: Option<Vec<ResolverResult>>,
}

impl ResolverResult {
	/// Failed result for a resolver that was never probed.
	pub fn unreachable(descriptor: ResolverDescriptor) -> Self {
		ResolverResult {
			descriptor,
			latency: UNREACHABLE_MS,
			jitter: 0,
			success_rate: 0.0,
			status: Status::Failed,
			raw_pings: Vec::new(),
			variants: None,
		}
	}

	pub fn is_success(&self) -> bool {
		self.status == Status::Success
	}

	pub fn provider(&self) -> &str {
		&self.descriptor.provider
	}
}

/// How the prober treats a request that fails before the timeout fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
	/// Any settle other than the timeout counts as a timed measurement
	#[default]
	CountElapsed,
	/// Transport errors are reported like timeouts
	Sentinel,
}

/// Scan policy shared by the prober and the batch scheduler
#[derive(Debug, Clone)]
pub struct ScanConfig {
	/// Resolvers probed in parallel per batch
	pub batch_size: usize,
	pub samples_per_resolver: u32,
	pub sample_delay: Duration,
	pub batch_cooldown: Duration,
	pub probe_timeout: Duration,
	/// Samples at or above this many ms are not kept
	pub discard_threshold_ms: u32,
	pub failure_policy: FailurePolicy,
}

impl Default for ScanConfig {
	fn default() -> Self {
		ScanConfig {
			batch_size: 4,
			samples_per_resolver: 3,
			sample_delay: Duration::from_millis(50),
			batch_cooldown: Duration::from_millis(150),
			probe_timeout: Duration::from_millis(2000),
			discard_threshold_ms: 3000,
			failure_policy: FailurePolicy::CountElapsed,
		}
	}
}
