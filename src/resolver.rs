use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::CatalogError;
use crate::target::url_host;
use crate::transport::{Protocol, ResolverDescriptor, Tag};

/// Clean an endpoint string scraped from a resolver list.
///
/// Keeps only the first endpoint when the source carries notes or markdown,
/// and restores the `sdns://` prefix on bare DNSCrypt stamps.
pub fn sanitize_endpoint(raw: &str) -> String {
	let mut value = raw.trim();
	if value.is_empty() {
		return String::new();
	}
	value = value.split("<br>").next().unwrap_or("").trim();
	value = value.split('|').next().unwrap_or("").trim();
	let value = value.replace(":heavy_check_mark:", "");
	let value = value.trim().trim_end_matches(',').trim();

	if is_bare_stamp(value) {
		return format!("sdns://{}", value);
	}
	value.to_string()
}

/// A DNSCrypt stamp that lost its scheme, e.g. "AQcAAAAA..."
fn is_bare_stamp(value: &str) -> bool {
	if value.contains("://") || value.len() < 24 {
		return false;
	}
	if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
		return false;
	}
	let mut chars = value.chars();
	chars.next() == Some('A') && chars.next().is_some_and(|c| c.is_ascii_alphanumeric())
}

/// Lowercase slug of an arbitrary string, e.g. "https://dns.google/q" -> "https-dns-google-q"
pub fn slug(input: &str) -> String {
	let mut out = String::with_capacity(input.len());
	for c in input.chars() {
		if c.is_ascii_alphanumeric() {
			out.push(c.to_ascii_lowercase());
		} else if !out.is_empty() && !out.ends_with('-') {
			out.push('-');
		}
	}
	while out.ends_with('-') {
		out.pop();
	}
	out
}

/// Guess the protocol of an endpoint from its scheme or shape.
pub fn infer_protocol(endpoint: &str) -> Protocol {
	let value = endpoint.trim();
	if value.starts_with("https://") || value.starts_with("http://") {
		Protocol::Doh
	} else if value.starts_with("tls://") {
		Protocol::Dot
	} else if value.starts_with("sdns://") {
		Protocol::Dnscrypt
	} else if value.starts_with("tcp://") || value.starts_with("udp://") {
		Protocol::Plain
	} else if value.parse::<IpAddr>().is_ok() || value.parse::<SocketAddr>().is_ok() {
		Protocol::Plain
	} else {
		Protocol::Unknown
	}
}

/// Apply endpoint sanitization and fill defaults on a catalog entry.
pub fn sanitize_descriptor(mut descriptor: ResolverDescriptor) -> ResolverDescriptor {
	descriptor.primary = sanitize_endpoint(&descriptor.primary);
	descriptor.secondary = sanitize_endpoint(&descriptor.secondary);
	descriptor.test_target = descriptor.test_target
		.as_deref()
		.map(sanitize_endpoint)
		.filter(|t| !t.is_empty());
	if descriptor.tags.is_empty() {
		descriptor.tags.push(Tag::General);
	}
	descriptor
}

/// Build a descriptor from a single endpoint string.
///
/// Supports formats:
///   "1.1.1.1"                         -- plain DNS, provider "Custom"
///   "https://dns.google/dns-query"    -- DoH, provider and probe target are the URL host
///   "tls://dns.quad9.net"             -- DoT
///   "sdns://AQcAAAAA..."              -- DNSCrypt stamp, not probeable
pub fn parse_resolver(input: &str) -> Result<ResolverDescriptor, CatalogError> {
	let value = sanitize_endpoint(input);
	if value.is_empty() {
		return Err(CatalogError::EmptyResolver);
	}

	let protocol = infer_protocol(&value);
	let mut id = format!("{}-{}", protocol, slug(&value));
	id.truncate(120);

	let (name, provider, test_target) = match protocol {
		Protocol::Doh => {
			let host = url_host(&value);
			let provider = host.clone().unwrap_or_else(|| "Unknown".to_string());
			("DoH Resolver", provider, host)
		}
		Protocol::Dot => ("DoT Resolver", "Unknown".to_string(), None),
		Protocol::Dnscrypt => ("DNSCrypt Resolver", "Unknown".to_string(), None),
		Protocol::Plain => ("Plain DNS", "Custom".to_string(), Some(value.clone())),
		_ => ("Resolver", value.clone(), None),
	};

	Ok(ResolverDescriptor {
		id,
		name: name.to_string(),
		provider,
		primary: value,
		protocol: Some(protocol),
		test_target,
		tags: vec![Tag::General],
		..Default::default()
	})
}

/// Read resolvers from a file.
///
/// A file whose content starts with '[' is a JSON catalog of descriptors.
/// Anything else is a plain list with one endpoint per line; blank lines and
/// lines starting with '#' or '//' are skipped and repeated endpoints are
/// dropped. Entries whose primary endpoint is empty after sanitizing are
/// dropped in both cases.
pub fn read_resolver_file(path: impl AsRef<Path>) -> Result<Vec<ResolverDescriptor>, CatalogError> {
	let path = path.as_ref();
	let content = std::fs::read_to_string(path)
		.map_err(|source| CatalogError::Read { path: path.to_path_buf(), source })?;

	if content.trim_start().starts_with('[') {
		let entries: Vec<ResolverDescriptor> = serde_json::from_str(&content)
			.map_err(|source| CatalogError::Parse { path: path.to_path_buf(), source })?;
		return Ok(entries.into_iter()
			.map(sanitize_descriptor)
			.filter(|d| !d.primary.is_empty())
			.collect());
	}

	let source = path.display().to_string();
	let mut seen = HashSet::new();
	let mut resolvers = Vec::new();
	for line in content.lines() {
		let trimmed = line.trim();
		if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//") {
			continue;
		}
		let mut descriptor = match parse_resolver(trimmed) {
			Ok(d) => d,
			Err(_) => continue,
		};
		if !seen.insert(descriptor.primary.clone()) {
			continue;
		}
		descriptor.source = Some(source.clone());
		resolvers.push(descriptor);
	}
	Ok(resolvers)
}

/// Shuffle the catalog and keep at most `count` entries.
///
/// Without a count the catalog is returned in its original order. A seed
/// makes the selection reproducible.
pub fn select_sample(
	mut resolvers: Vec<ResolverDescriptor>,
	count: Option<usize>,
	seed: Option<u64>,
) -> Vec<ResolverDescriptor> {
	let Some(count) = count else {
		return resolvers;
	};
	let mut rng = match seed {
		Some(seed) => StdRng::seed_from_u64(seed),
		None => StdRng::from_entropy(),
	};
	resolvers.shuffle(&mut rng);
	resolvers.truncate(count);
	resolvers
}

#[allow(clippy::too_many_arguments)]
fn builtin(
	id: &str,
	name: &str,
	provider: &str,
	primary: &str,
	secondary: &str,
	protocol: Protocol,
	tags: &[Tag],
	location: &str,
) -> ResolverDescriptor {
	ResolverDescriptor {
		id: id.to_string(),
		name: name.to_string(),
		provider: provider.to_string(),
		primary: primary.to_string(),
		secondary: secondary.to_string(),
		protocol: Some(protocol),
		tags: tags.to_vec(),
		location: Some(location.to_string()),
		..Default::default()
	}
}

/// Return a small catalog of well-known resolvers.
pub fn default_resolvers() -> Vec<ResolverDescriptor> {
	use Protocol::*;
	use Tag::*;

	vec![
		builtin("cloudflare", "Cloudflare", "Cloudflare", "1.1.1.1", "1.0.0.1",
			Plain, &[Privacy, AntiFilter], "Global"),
		builtin("cloudflare-doh", "Cloudflare DoH", "Cloudflare",
			"https://cloudflare-dns.com/dns-query", "", Doh, &[Privacy], "Global"),
		builtin("cloudflare-family", "Cloudflare Family", "Cloudflare", "1.1.1.3", "1.0.0.3",
			Plain, &[Security], "Global"),
		builtin("google", "Google Public DNS", "Google", "8.8.8.8", "8.8.4.4",
			Plain, &[General, AntiFilter], "Global"),
		builtin("google-doh", "Google DoH", "Google", "https://dns.google/dns-query", "",
			Doh, &[General], "Global"),
		builtin("quad9", "Quad9", "Quad9", "9.9.9.9", "149.112.112.112",
			Plain, &[Security, AntiFilter], "Global"),
		builtin("quad9-dot", "Quad9 DoT", "Quad9", "tls://dns.quad9.net", "",
			Dot, &[Security], "Global"),
		builtin("adguard", "AdGuard DNS", "AdGuard", "94.140.14.14", "94.140.15.15",
			Plain, &[Privacy, Security], "Global"),
		builtin("level3-fodey", "Level3 + Fodey", "Custom", "4.2.2.4", "5.200.200.200",
			Plain, &[AntiSanction, Gaming, AntiFilter], "Global / Iran"),
		builtin("dyn-anti-sanction", "Dyn (Anti-Sanction)", "Oracle", "216.146.35.35",
			"216.146.36.36", Plain, &[AntiSanction, AntiFilter], "Global"),
		builtin("shecan", "Shecan", "Bonyan", "178.22.122.100", "185.51.200.2",
			Plain, &[AntiSanction, General], "Iran"),
		builtin("electro", "Electro", "Electro Team", "78.157.42.100", "78.157.42.101",
			Plain, &[AntiSanction, Gaming], "Iran"),
	]
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_sanitize_strips_notes() {
		assert_eq!(sanitize_endpoint(" 1.1.1.1<br>backup 1.0.0.1 "), "1.1.1.1");
		assert_eq!(sanitize_endpoint("https://dns.example/q | fast"), "https://dns.example/q");
		assert_eq!(sanitize_endpoint(":heavy_check_mark: 9.9.9.9,,"), "9.9.9.9");
		assert_eq!(sanitize_endpoint("   "), "");
	}

	#[test]
	fn test_sanitize_restores_stamp_scheme() {
		let stamp = "AQcAAAAAAAAADjIwOC42Ny4yMjAuMjIw";
		assert_eq!(sanitize_endpoint(stamp), format!("sdns://{}", stamp));
		// too short, or not starting with 'A'
		assert_eq!(sanitize_endpoint("AQcAAAAA"), "AQcAAAAA");
		assert_eq!(sanitize_endpoint("BQcAAAAAAAAADjIwOC42Ny4yMjAuMjIw"), "BQcAAAAAAAAADjIwOC42Ny4yMjAuMjIw");
	}

	#[test]
	fn test_slug() {
		assert_eq!(slug("https://dns.google/dns-query"), "https-dns-google-dns-query");
		assert_eq!(slug("--1.1.1.1--"), "1-1-1-1");
	}

	#[test]
	fn test_infer_protocol() {
		assert_eq!(infer_protocol("1.1.1.1"), Protocol::Plain);
		assert_eq!(infer_protocol("2606:4700::1111"), Protocol::Plain);
		assert_eq!(infer_protocol("8.8.8.8:5353"), Protocol::Plain);
		assert_eq!(infer_protocol("https://dns.google/dns-query"), Protocol::Doh);
		assert_eq!(infer_protocol("tls://dns.quad9.net"), Protocol::Dot);
		assert_eq!(infer_protocol("sdns://AQcAAAAA"), Protocol::Dnscrypt);
		assert_eq!(infer_protocol("dns.example"), Protocol::Unknown);
	}

	#[test]
	fn test_parse_doh_resolver() {
		let d = parse_resolver("https://dns.google:8443/dns-query").unwrap();
		assert_eq!(d.protocol(), Protocol::Doh);
		assert_eq!(d.provider, "dns.google:8443");
		assert_eq!(d.test_target.as_deref(), Some("dns.google:8443"));
		assert_eq!(d.tags, vec![Tag::General]);
	}

	#[test]
	fn test_parse_plain_resolver() {
		let d = parse_resolver("8.8.8.8").unwrap();
		assert_eq!(d.protocol(), Protocol::Plain);
		assert_eq!(d.provider, "Custom");
		assert_eq!(d.id, "plain-8-8-8-8");
	}

	#[test]
	fn test_parse_empty_resolver() {
		assert!(matches!(parse_resolver("  "), Err(CatalogError::EmptyResolver)));
	}

	#[test]
	fn test_read_plain_list() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "# comment\n1.1.1.1\n\n// note\nhttps://dns.google/dns-query\n1.1.1.1").unwrap();
		let resolvers = read_resolver_file(file.path()).unwrap();
		assert_eq!(resolvers.len(), 2);
		assert_eq!(resolvers[0].primary, "1.1.1.1");
		assert!(resolvers[0].source.is_some());
		assert_eq!(resolvers[1].protocol(), Protocol::Doh);
	}

	#[test]
	fn test_read_json_catalog() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(file, r#"[
			{{"id": "a", "name": "A", "provider": "P", "primary": " 9.9.9.9<br>x", "tags": []}},
			{{"id": "b", "name": "B", "provider": "P", "primary": "  "}},
			{{"id": "c", "name": "C", "provider": "Q", "primary": "AQcAAAAAAAAADjIwOC42Ny4yMjAuMjIw",
			  "protocol": "dnscrypt", "tags": ["Privacy"]}}
		]"#).unwrap();
		let resolvers = read_resolver_file(file.path()).unwrap();
		assert_eq!(resolvers.len(), 2);
		assert_eq!(resolvers[0].primary, "9.9.9.9");
		assert_eq!(resolvers[0].tags, vec![Tag::General]);
		assert!(resolvers[1].primary.starts_with("sdns://"));
		assert_eq!(resolvers[1].protocol(), Protocol::Dnscrypt);
	}

	#[test]
	fn test_read_catalog_with_unknown_tag() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(file, r#"[
			{{"id": "a", "name": "A", "provider": "P", "primary": "9.9.9.9", "tags": ["Ad-Block"]}},
			{{"id": "b", "name": "B", "provider": "P", "primary": "1.1.1.1", "tags": ["Gaming"]}}
		]"#).unwrap();
		let resolvers = read_resolver_file(file.path()).unwrap();
		assert_eq!(resolvers.len(), 2);
		assert_eq!(resolvers[0].tags, vec![Tag::Other]);
		assert_eq!(resolvers[1].tags, vec![Tag::Gaming]);
	}

	#[test]
	fn test_read_invalid_catalog() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(file, "[{{\"id\": 1}}]").unwrap();
		assert!(matches!(read_resolver_file(file.path()), Err(CatalogError::Parse { .. })));
	}

	#[test]
	fn test_read_missing_file() {
		let r = read_resolver_file("/nonexistent/resolvers.txt");
		assert!(matches!(r, Err(CatalogError::Read { .. })));
	}

	#[test]
	fn test_select_sample_seeded() {
		let a = select_sample(default_resolvers(), Some(5), Some(7));
		let b = select_sample(default_resolvers(), Some(5), Some(7));
		assert_eq!(a.len(), 5);
		assert_eq!(a, b);
		let all = select_sample(default_resolvers(), Some(500), None);
		assert_eq!(all.len(), default_resolvers().len());
	}

	#[test]
	fn test_select_sample_without_count_keeps_order() {
		let ids = |list: &[ResolverDescriptor]| list.iter().map(|d| d.id.clone()).collect::<Vec<_>>();
		for seed in [None, Some(1), Some(2)] {
			let kept = select_sample(default_resolvers(), None, seed);
			assert_eq!(ids(&kept), ids(&default_resolvers()));
		}
	}

	#[test]
	fn test_defaults_are_valid() {
		let defaults = default_resolvers();
		assert!(!defaults.is_empty());
		for d in &defaults {
			assert!(!d.primary.is_empty());
			assert!(!d.tags.is_empty());
		}
		let cloudflare = defaults.iter().filter(|d| d.provider == "Cloudflare").count();
		assert!(cloudflare > 1);
	}
}
