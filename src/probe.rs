use std::future::Future;
use std::net::Ipv6Addr;
use std::time::{Duration, Instant};

use log::{debug, trace};
use reqwest::header::CACHE_CONTROL;
use reqwest::Client;

use crate::stats::round_ms;
use crate::transport::{FailurePolicy, ProbeSample, ScanConfig};

/// Something that can time one request against a host.
///
/// Implementations never retry and never fail: every outcome is folded into a
/// `ProbeSample`.
pub trait Prober {
	fn probe(&self, host: &str) -> impl Future<Output = ProbeSample>;
}

/// Times an HTTPS GET to `https://<host>/` as a proxy for connection latency.
///
/// The response body is never read; only the time until the request settles matters.
#[derive(Debug, Clone)]
pub struct HttpProber {
	client: Client,
	timeout: Duration,
	policy: FailurePolicy,
}

impl HttpProber {
	pub fn new(config: &ScanConfig) -> Result<Self, reqwest::Error> {
		// No idle connections: every sample pays for its own TCP+TLS setup
		let client = Client::builder()
			.pool_max_idle_per_host(0)
			.no_proxy()
			.build()?;
		Ok(HttpProber {
			client,
			timeout: config.probe_timeout,
			policy: config.failure_policy,
		})
	}
}

impl Prober for HttpProber {
	async fn probe(&self, host: &str) -> ProbeSample {
		let url = probe_url(host);
		let start = Instant::now();
		let request = self.client
			.get(&url)
			.header(CACHE_CONTROL, "no-store")
			.send();

		// Dropping the in-flight request future on timeout aborts it
		let outcome = tokio::time::timeout(self.timeout, request).await;
		let elapsed = round_ms(start.elapsed().as_secs_f64() * 1000.0);

		match outcome {
			Err(_) => {
				trace!("probe {} timed out after {} ms", host, self.timeout.as_millis());
				ProbeSample::TimedOut
			}
			Ok(Ok(response)) => {
				trace!("probe {} -> HTTP {} in {} ms", host, response.status(), elapsed);
				ProbeSample::Elapsed(elapsed)
			}
			Ok(Err(e)) => match self.policy {
				FailurePolicy::CountElapsed => {
					debug!("probe {} failed after {} ms, counted as timed: {}", host, elapsed, e);
					ProbeSample::Elapsed(elapsed)
				}
				FailurePolicy::Sentinel => {
					debug!("probe {} failed after {} ms: {}", host, elapsed, e);
					ProbeSample::TimedOut
				}
			},
		}
	}
}

/// Build the probe URL with a random cache-busting query parameter.
///
/// Bare IPv6 literals are bracketed so they form a valid authority.
pub fn probe_url(host: &str) -> String {
	let nonce: f64 = rand::random();
	if host.parse::<Ipv6Addr>().is_ok() {
		format!("https://[{}]/?_={}", host, nonce)
	} else {
		format!("https://{}/?_={}", host, nonce)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tokio::net::TcpListener;

	fn config(timeout_ms: u64, policy: FailurePolicy) -> ScanConfig {
		ScanConfig {
			probe_timeout: Duration::from_millis(timeout_ms),
			failure_policy: policy,
			..ScanConfig::default()
		}
	}

	/// Accept connections and hold them open without ever answering.
	async fn silent_listener() -> String {
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		tokio::spawn(async move {
			let mut held = Vec::new();
			while let Ok((socket, _)) = listener.accept().await {
				held.push(socket);
			}
		});
		addr.to_string()
	}

	/// An address with nothing listening on it.
	async fn closed_port() -> String {
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		drop(listener);
		addr.to_string()
	}

	#[test]
	fn test_probe_url_cache_busting() {
		let a = probe_url("dns.google");
		let b = probe_url("dns.google");
		assert!(a.starts_with("https://dns.google/?_="));
		assert_ne!(a, b);
	}

	#[test]
	fn test_probe_url_brackets_ipv6() {
		let url = probe_url("2606:4700::1111");
		assert!(url.starts_with("https://[2606:4700::1111]/?_="));
		let url = probe_url("1.1.1.1:8443");
		assert!(url.starts_with("https://1.1.1.1:8443/?_="));
	}

	#[tokio::test]
	async fn test_unanswered_probe_times_out() {
		let host = silent_listener().await;
		let prober = HttpProber::new(&config(200, FailurePolicy::CountElapsed)).unwrap();
		let start = Instant::now();
		let sample = prober.probe(&host).await;
		assert_eq!(sample, ProbeSample::TimedOut);
		assert_eq!(sample.as_millis(), 9999);
		assert!(start.elapsed() < Duration::from_secs(2));
	}

	#[tokio::test]
	async fn test_refused_connection_counts_as_elapsed() {
		let host = closed_port().await;
		let prober = HttpProber::new(&config(2000, FailurePolicy::CountElapsed)).unwrap();
		match prober.probe(&host).await {
			ProbeSample::Elapsed(ms) => assert!(ms < 2000),
			other => panic!("expected elapsed sample, got {:?}", other),
		}
	}

	#[tokio::test]
	async fn test_refused_connection_sentinel_policy() {
		let host = closed_port().await;
		let prober = HttpProber::new(&config(2000, FailurePolicy::Sentinel)).unwrap();
		assert_eq!(prober.probe(&host).await, ProbeSample::TimedOut);
	}
}
