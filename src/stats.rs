use crate::transport::{Status, UNREACHABLE_MS};

/// Per-resolver statistics folded from one sampling round
#[derive(Debug, Clone, PartialEq)]
pub struct SampleStats {
	/// Rounded mean of kept samples, `UNREACHABLE_MS` when none were kept
	pub latency: u32,
	/// Rounded population standard deviation of kept samples
	pub jitter: u32,
	/// kept / attempted * 100
	pub success_rate: f64,
	pub status: Status,
}

/// Round a millisecond value to the nearest integer, halves away from zero.
pub fn round_ms(value: f64) -> u32 {
	if !value.is_finite() || value <= 0.0 {
		return 0;
	}
	value.round().min(u32::MAX as f64) as u32
}

/// Calculate the arithmetic mean of a slice of values.
pub fn mean(values: &[f64]) -> Option<f64> {
	if values.is_empty() {
		return None;
	}
	let sum: f64 = values.iter().sum();
	Some(sum / values.len() as f64)
}

/// Calculate the population standard deviation of a slice of values.
pub fn stddev(values: &[f64]) -> Option<f64> {
	let avg = mean(values)?;
	let variance = values.iter()
		.map(|v| (v - avg).powi(2))
		.sum::<f64>() / values.len() as f64;
	Some(variance.sqrt())
}

/// Jitter of kept samples; 0 with fewer than two.
pub fn jitter(kept_ms: &[u32]) -> u32 {
	if kept_ms.len() < 2 {
		return 0;
	}
	let values: Vec<f64> = kept_ms.iter().map(|&v| v as f64).collect();
	round_ms(stddev(&values).unwrap_or(0.0))
}

/// Fold kept samples into latency, jitter, success rate and status.
///
/// Args:
///   kept_ms: Samples below the discard threshold, in attempt order.
///   attempted: Number of samples attempted, kept or not.
///
/// A resolver succeeds only when its average is under 3000 ms and at least
/// one sample was kept.
pub fn aggregate(kept_ms: &[u32], attempted: u32) -> SampleStats {
	let values: Vec<f64> = kept_ms.iter().map(|&v| v as f64).collect();
	let latency = mean(&values).map(round_ms).unwrap_or(UNREACHABLE_MS);
	let success_rate = if attempted > 0 {
		(kept_ms.len() as f64 / attempted as f64) * 100.0
	} else {
		0.0
	};
	let status = if latency < 3000 && success_rate > 0.0 {
		Status::Success
	} else {
		Status::Failed
	};

	SampleStats {
		latency,
		jitter: jitter(kept_ms),
		success_rate,
		status,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_mean() {
		let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
		assert_eq!(mean(&values), Some(3.0));
		assert_eq!(mean(&[]), None);
	}

	#[test]
	fn test_stddev() {
		let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
		let sd = stddev(&values).unwrap();
		// Population stddev should be 2.0
		assert!((sd - 2.0).abs() < 0.01);
	}

	#[test]
	fn test_round_ms_halves_up() {
		assert_eq!(round_ms(49.5), 50);
		assert_eq!(round_ms(49.49), 49);
		assert_eq!(round_ms(0.4), 0);
		assert_eq!(round_ms(-3.0), 0);
		assert_eq!(round_ms(f64::NAN), 0);
	}

	#[test]
	fn test_jitter_flat() {
		assert_eq!(jitter(&[100, 100, 100]), 0);
	}

	#[test]
	fn test_jitter_population_formula() {
		// sqrt(((100-150)^2 + (200-150)^2) / 2) = 50
		assert_eq!(jitter(&[100, 200]), 50);
		// sample (N-1) variance would give 13 here
		assert_eq!(jitter(&[10, 20, 30, 40]), 11);
	}

	#[test]
	fn test_jitter_single_sample() {
		assert_eq!(jitter(&[120]), 0);
		assert_eq!(jitter(&[]), 0);
	}

	#[test]
	fn test_aggregate_nothing_kept() {
		let s = aggregate(&[], 3);
		assert_eq!(s.latency, 9999);
		assert_eq!(s.jitter, 0);
		assert_eq!(s.success_rate, 0.0);
		assert_eq!(s.status, Status::Failed);
	}

	#[test]
	fn test_aggregate_partial_success() {
		let s = aggregate(&[40, 60], 3);
		assert_eq!(s.latency, 50);
		assert_eq!(s.jitter, 10);
		assert!((s.success_rate - 200.0 / 3.0).abs() < 1e-9);
		assert_eq!(s.status, Status::Success);
	}

	#[test]
	fn test_aggregate_rounds_mean() {
		// mean 33.5 rounds up
		let s = aggregate(&[33, 34], 2);
		assert_eq!(s.latency, 34);
		assert_eq!(s.success_rate, 100.0);
	}

	#[test]
	fn test_aggregate_nothing_attempted() {
		let s = aggregate(&[], 0);
		assert_eq!(s.latency, 9999);
		assert_eq!(s.success_rate, 0.0);
		assert_eq!(s.status, Status::Failed);
	}

	#[test]
	fn test_aggregate_is_pure() {
		let kept = [12, 18, 30];
		assert_eq!(aggregate(&kept, 3), aggregate(&kept, 3));
	}
}
