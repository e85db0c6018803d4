// Copyright 2025 Irreducible Inc.

use std::iter;

use rayon::prelude::*;

use crate::{ExtensionField, Field};

/// Iterate the powers of a given value, beginning with 1 (the 0'th power).
pub fn powers<F: Field>(val: F) -> impl Iterator<Item = F> {
	iter::successors(Some(F::ONE), move |&power| Some(power * val))
}

/// Computes the inner product of two vectors without checking that the lengths are equal
pub fn inner_product_unchecked<F, FE>(
	a: impl IntoIterator<Item = FE>,
	b: impl IntoIterator<Item = F>,
) -> FE
where
	F: Field,
	FE: ExtensionField<F>,
{
	iter::zip(a, b).fold(FE::ZERO, |acc, (a_i, b_i)| acc + a_i * b_i)
}

/// Replaces every non-zero element by its inverse using Montgomery's trick, which
/// costs a single field inversion for the whole slice. Zero elements are left as zero.
pub fn batch_invert<F: Field>(values: &mut [F]) {
	let mut prefix = Vec::with_capacity(values.len());
	let mut acc = F::ONE;
	for value in values.iter() {
		prefix.push(acc);
		if !value.is_zero() {
			acc *= value;
		}
	}

	let mut inv = acc.invert_or_zero();
	for (value, prefix) in values.iter_mut().zip(prefix).rev() {
		if !value.is_zero() {
			let next = inv * *value;
			*value = inv * prefix;
			inv = next;
		}
	}
}

const MIN_PAR_INVERSION_CHUNK: usize = 1 << 10;

/// Parallel flavour of [`batch_invert`]: the slice is split into one chunk per
/// worker thread and each chunk pays for its own inversion.
pub fn par_batch_invert<F: Field>(values: &mut [F]) {
	let chunk_size = values
		.len()
		.div_ceil(rayon::current_num_threads())
		.max(MIN_PAR_INVERSION_CHUNK);
	values.par_chunks_mut(chunk_size).for_each(batch_invert);
}

#[cfg(test)]
mod tests {
	use rand::{rngs::StdRng, SeedableRng};

	use super::*;
	use crate::{KoalaBear, KoalaBearExt4};

	#[test]
	fn test_powers() {
		let two = KoalaBear::new(2);
		let got = powers(two).take(5).collect::<Vec<_>>();
		let expected = [1, 2, 4, 8, 16].map(KoalaBear::new);
		assert_eq!(got, expected);
	}

	#[test]
	fn test_batch_invert_skips_zeros() {
		let mut rng = StdRng::seed_from_u64(0);
		let mut values = (0..100)
			.map(|i| {
				if i % 7 == 0 {
					KoalaBearExt4::ZERO
				} else {
					KoalaBearExt4::random(&mut rng)
				}
			})
			.collect::<Vec<_>>();
		let original = values.clone();

		batch_invert(&mut values);

		for (inv, orig) in values.iter().zip(&original) {
			if orig.is_zero() {
				assert!(inv.is_zero());
			} else {
				assert_eq!(*inv * *orig, KoalaBearExt4::ONE);
			}
		}
	}

	#[test]
	fn test_par_batch_invert_matches_sequential() {
		let mut rng = StdRng::seed_from_u64(1);
		let original = (0..5000)
			.map(|_| KoalaBear::random(&mut rng))
			.collect::<Vec<_>>();

		let mut sequential = original.clone();
		batch_invert(&mut sequential);
		let mut parallel = original;
		par_batch_invert(&mut parallel);

		assert_eq!(sequential, parallel);
	}

	#[test]
	fn test_inner_product_mixed() {
		let a = [1u64, 2, 3].map(KoalaBearExt4::from_u64);
		let b = [4u32, 5, 6].map(KoalaBear::new);
		assert_eq!(inner_product_unchecked(a, b), KoalaBearExt4::from_u64(32));
	}
}
