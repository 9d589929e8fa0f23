use comfy_table::{Table, ContentArrangement, presets::UTF8_FULL};

use anyhow::Result;

use crate::transport::{ResolverDescriptor, ResolverResult, ScanConfig, Status};

/// Print a summary of the scan configuration before running.
pub fn print_config_summary(
	resolvers: &[ResolverDescriptor],
	catalog_size: usize,
	config: &ScanConfig,
) {
	println!("Resolver Latency Scan");
	println!("=====================");
	println!("Resolvers:      {} of {}", resolvers.len(), catalog_size);
	for r in resolvers {
		println!("  - {} ({})", r.name, r.primary);
	}
	println!("Batch size:     {}", config.batch_size);
	println!("Samples:        {}", config.samples_per_resolver);
	println!("Timeout:        {} ms", config.probe_timeout.as_millis());
	println!("Sample delay:   {} ms", config.sample_delay.as_millis());
	println!("Cooldown:       {} ms", config.batch_cooldown.as_millis());
	println!();
}

/// One progress line per finished resolver.
pub fn print_progress(result: &ResolverResult, completed: usize, total: usize) {
	let percent = if total > 0 { completed * 100 / total } else { 100 };
	println!(
		"  [{:>3}%] {:<32} {:>6}  {}",
		percent, result.descriptor.primary, latency_label(result), result.status.as_str(),
	);
}

/// Latency cell text: "N/A" for failed resolvers whose protocol cannot be measured.
pub fn latency_label(result: &ResolverResult) -> String {
	if result.status == Status::Failed && !result.descriptor.protocol().is_measurable() {
		"N/A".to_string()
	} else {
		format!("{} ms", result.latency)
	}
}

fn variants_label(result: &ResolverResult, shown: usize) -> String {
	let variants = match &result.variants {
		Some(v) if !v.is_empty() => v,
		_ => return String::new(),
	};
	let mut parts: Vec<String> = variants.iter()
		.take(shown)
		.map(|v| format!("{} {}", v.descriptor.name, latency_label(v)))
		.collect();
	if variants.len() > shown {
		parts.push(format!("+{} more", variants.len() - shown));
	}
	parts.join("\n")
}

/// Print the grouped display list as a formatted table.
pub fn print_results_table(results: &[ResolverResult], limit: usize, variants_shown: usize) {
	let mut table = Table::new();
	table.load_preset(UTF8_FULL);
	table.set_content_arrangement(ContentArrangement::Dynamic);
	table.set_header(vec![
		"Rank", "Resolver", "Provider", "Protocol",
		"Latency", "Jitter", "Success %", "Status",
		"Variants",
	]);

	for (i, r) in results.iter().take(limit).enumerate() {
		let d = &r.descriptor;
		table.add_row(vec![
			format!("{}", i + 1),
			format!("{}\n{}", d.name, d.primary),
			d.provider.clone(),
			d.protocol().to_string(),
			latency_label(r),
			format!("{} ms", r.jitter),
			format!("{:.1}%", r.success_rate),
			r.status.as_str().to_string(),
			variants_label(r, variants_shown),
		]);
	}

	println!("\nScan Results");
	println!("============\n");
	println!("{table}");
	if results.len() > limit {
		println!("({} more not shown)", results.len() - limit);
	}
}

/// Write the raw per-resolver results to a CSV file.
pub fn write_csv(path: &str, results: &[ResolverResult]) -> Result<()> {
	let mut writer = csv::Writer::from_path(path)?;

	writer.write_record([
		"rank", "id", "name", "provider", "protocol", "primary",
		"latency_ms", "jitter_ms", "success_rate", "status", "raw_pings",
	])?;

	for (i, r) in results.iter().enumerate() {
		let d = &r.descriptor;
		let raw: Vec<String> = r.raw_pings.iter().map(|p| p.to_string()).collect();
		writer.write_record([
			(i + 1).to_string(),
			d.id.clone(),
			d.name.clone(),
			d.provider.clone(),
			d.protocol().to_string(),
			d.primary.clone(),
			r.latency.to_string(),
			r.jitter.to_string(),
			format!("{:.1}", r.success_rate),
			r.status.as_str().to_string(),
			raw.join(";"),
		])?;
	}

	writer.flush()?;
	println!("\nResults written to: {}", path);
	Ok(())
}
