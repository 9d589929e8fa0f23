use url::Url;

use crate::transport::ResolverDescriptor;

/// Derive the host that latency probes are sent to.
///
/// Priority:
///   1. a non-blank `test_target` override, trimmed
///   2. `https://` / `http://` URLs: the URL host, with the port when it is not the default
///   3. `tls://`, `tcp://`, `udp://`: the bare host before any path or port
///   4. `sdns://` stamps: no target
///   5. anything else: the trimmed value as a host or IP
///
/// Returns None when nothing probeable can be derived.
pub fn probe_target(descriptor: &ResolverDescriptor) -> Option<String> {
	if let Some(target) = descriptor.test_target.as_deref() {
		let trimmed = target.trim();
		if !trimmed.is_empty() {
			return Some(trimmed.to_string());
		}
	}

	let value = descriptor.primary.trim();
	if value.is_empty() {
		return None;
	}

	if value.starts_with("https://") || value.starts_with("http://") {
		return url_host(value);
	}

	for scheme in ["tls://", "tcp://", "udp://"] {
		if let Some(rest) = value.strip_prefix(scheme) {
			let host = rest.split('/').next().unwrap_or("");
			let host = host.split(':').next().unwrap_or("");
			if host.is_empty() {
				return None;
			}
			return Some(host.to_string());
		}
	}

	if value.starts_with("sdns://") {
		return None;
	}

	Some(value.to_string())
}

/// Host of a URL including a non-default port, e.g. "dns.example:8443".
pub fn url_host(value: &str) -> Option<String> {
	let url = Url::parse(value).ok()?;
	let host = url.host_str()?;
	if host.is_empty() {
		return None;
	}
	// `port()` is None when the port equals the scheme default
	match url.port() {
		Some(port) => Some(format!("{}:{}", host, port)),
		None => Some(host.to_string()),
	}
}
