use std::cmp::Ordering;
use std::collections::HashMap;

use crate::transport::ResolverResult;

/// Successful resolvers first, then ascending latency.
///
/// Used with a stable sort, so equal keys keep their input order.
pub fn compare_results(a: &ResolverResult, b: &ResolverResult) -> Ordering {
	match (a.is_success(), b.is_success()) {
		(true, false) => Ordering::Less,
		(false, true) => Ordering::Greater,
		_ => a.latency.cmp(&b.latency),
	}
}

/// Order a raw, ungrouped result list for display.
pub fn sort_results(results: &mut [ResolverResult]) {
	results.sort_by(compare_results);
}

/// Collapse results sharing a provider into one representative each.
///
/// Groups keep the order in which their provider first appears. Within a group
/// the lowest latency wins; the remaining members, latency-sorted, become its
/// variants.
pub fn group_by_provider(results: Vec<ResolverResult>) -> Vec<ResolverResult> {
	let mut index: HashMap<String, usize> = HashMap::new();
	let mut groups: Vec<Vec<ResolverResult>> = Vec::new();

	for result in results {
		match index.get(result.provider()) {
			Some(&i) => groups[i].push(result),
			None => {
				index.insert(result.provider().to_string(), groups.len());
				groups.push(vec![result]);
			}
		}
	}

	groups.into_iter()
		.filter_map(|mut group| {
			group.sort_by_key(|r| r.latency);
			let mut members = group.into_iter();
			let mut best = members.next()?;
			let variants: Vec<ResolverResult> = members.collect();
			best.variants = if variants.is_empty() { None } else { Some(variants) };
			Some(best)
		})
		.collect()
}

/// Group by provider and rank the representatives.
pub fn build_display_results(results: Vec<ResolverResult>) -> Vec<ResolverResult> {
	let mut display = group_by_provider(results);
	sort_results(&mut display);
	display
}
