// Copyright 2025 Irreducible Inc.

use std::{env, sync::OnceLock};

/// In case when number of threads is set to 1, use rayon thread pool with
/// `use_current_thread` set to true. The performance is then almost the same as
/// if rayon wasn't used at all, and profiles and backtraces are less noisy.
///
/// NOTE: rayon doesn't allow initializing the global thread pool several times, so
/// if it was initialized before, this function returns an error. The result is
/// returned by reference because `ThreadPoolBuildError` doesn't implement `Clone`.
pub fn adjust_thread_pool() -> &'static Result<(), rayon::ThreadPoolBuildError> {
	static ONCE_GUARD: OnceLock<Result<(), rayon::ThreadPoolBuildError>> = OnceLock::new();

	ONCE_GUARD.get_or_init(|| {
		// `rayon::current_num_threads` would force the global pool to initialize.
		match env::var("RAYON_NUM_THREADS") {
			Ok(v) if v == "1" => rayon::ThreadPoolBuilder::new()
				.num_threads(1)
				.use_current_thread()
				.build_global(),
			_ => Ok(()),
		}
	})
}

/// Number of hash buckets used by partitioned joins: the next power of two above
/// four buckets per worker thread.
pub fn num_partition_buckets() -> usize {
	(4 * rayon::current_num_threads()).next_power_of_two()
}

/// Splits `len` items into contiguous ranges, targeting `4 * threads` ranges of
/// at least `min_chunk` items each.
pub fn chunk_ranges(len: usize, min_chunk: usize) -> Vec<std::ops::Range<usize>> {
	if len == 0 {
		return Vec::new();
	}
	let target = 4 * rayon::current_num_threads();
	let chunk = len.div_ceil(target).max(min_chunk.max(1));
	(0..len)
		.step_by(chunk)
		.map(|start| start..(start + chunk).min(len))
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_num_partition_buckets_is_power_of_two() {
		let buckets = num_partition_buckets();
		assert!(buckets.is_power_of_two());
		assert!(buckets >= 4 * rayon::current_num_threads());
	}

	#[test]
	fn test_chunk_ranges_cover_input() {
		for len in [0, 1, 7, 100, 1000] {
			let ranges = chunk_ranges(len, 16);
			let covered: usize = ranges.iter().map(|r| r.len()).sum();
			assert_eq!(covered, len);
			for pair in ranges.windows(2) {
				assert_eq!(pair[0].end, pair[1].start);
			}
		}
	}
}
