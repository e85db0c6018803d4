// Copyright 2025 Irreducible Inc.

use digest::{Digest, FixedOutputReset, Output};
use p3_challenger::{CanObserve, CanSample};
use quill_field::Field;

use crate::types::{B, E};

/// Duplex transcript over a byte-oriented hash.
///
/// Field elements are absorbed through their canonical little-endian encoding.
/// Squeezing finalizes the hash and feeds the digest back into the fresh state,
/// so the output stream depends on every absorbed byte. A base element is
/// reduced from eight squeezed bytes, keeping the modular bias below `2^-32`.
#[derive(Debug, Clone)]
pub struct HasherChallenger<H: Digest> {
	hasher: H,
	output: Output<H>,
	/// Bytes of `output` not handed out yet, counted from its end.
	unread: usize,
}

impl<H: Digest> Default for HasherChallenger<H> {
	fn default() -> Self {
		Self {
			hasher: H::new(),
			output: Output::<H>::default(),
			unread: 0,
		}
	}
}

impl<H> HasherChallenger<H>
where
	H: Digest + FixedOutputReset,
{
	fn absorb(&mut self, bytes: &[u8]) {
		// Pending output predates the new message and must not be sampled.
		self.unread = 0;
		Digest::update(&mut self.hasher, bytes);
	}

	fn absorb_elements<F: Field>(&mut self, values: &[F]) {
		let mut bytes = Vec::with_capacity(values.len() * std::mem::size_of::<F>());
		for value in values {
			value.write_bytes(&mut bytes);
		}
		self.absorb(&bytes);
	}

	fn squeeze(&mut self) -> u8 {
		if self.unread == 0 {
			self.output = self.hasher.finalize_reset();
			Digest::update(&mut self.hasher, &self.output);
			self.unread = self.output.len();
		}
		let byte = self.output[self.output.len() - self.unread];
		self.unread -= 1;
		byte
	}
}

impl<H> CanObserve<B> for HasherChallenger<H>
where
	H: Digest + FixedOutputReset,
{
	fn observe(&mut self, value: B) {
		self.absorb_elements(&[value]);
	}

	fn observe_slice(&mut self, values: &[B]) {
		self.absorb_elements(values);
	}
}

impl<H> CanObserve<E> for HasherChallenger<H>
where
	H: Digest + FixedOutputReset,
{
	fn observe(&mut self, value: E) {
		self.absorb_elements(&[value]);
	}

	fn observe_slice(&mut self, values: &[E]) {
		self.absorb_elements(values);
	}
}

impl<H> CanSample<u8> for HasherChallenger<H>
where
	H: Digest + FixedOutputReset,
{
	fn sample(&mut self) -> u8 {
		self.squeeze()
	}
}

impl<H> CanSample<B> for HasherChallenger<H>
where
	H: Digest + FixedOutputReset,
{
	fn sample(&mut self) -> B {
		let bytes: [u8; 8] = CanSample::<u8>::sample_array(self);
		B::from_u64(u64::from_le_bytes(bytes))
	}
}

impl<H> CanSample<E> for HasherChallenger<H>
where
	H: Digest + FixedOutputReset,
{
	fn sample(&mut self) -> E {
		E::new(CanSample::<B>::sample_array(self))
	}
}

#[cfg(test)]
mod tests {
	use groestl_crypto::Groestl256;

	use super::*;

	#[test]
	fn test_squeezed_bytes_follow_the_hash_chain() {
		let mut hasher = Groestl256::default();
		let mut challenger = HasherChallenger::<Groestl256>::default();

		let first = hasher.finalize_reset();
		hasher.update(first);
		let out: [u8; 32] = CanSample::<u8>::sample_array(&mut challenger);
		assert_eq!(first[..], out);

		CanObserve::<B>::observe(&mut challenger, B::new(0x5548));
		hasher.update([0x48, 0x55, 0, 0]);
		let second = hasher.finalize_reset();
		let out: [u8; 2] = CanSample::<u8>::sample_array(&mut challenger);
		assert_eq!(second[..2], out);
	}

	#[test]
	fn test_observation_discards_pending_output() {
		let mut a = HasherChallenger::<Groestl256>::default();
		CanSample::<B>::sample(&mut a);
		let mut b = a.clone();

		a.observe(E::from_u64(7));
		b.observe(E::from_u64(8));
		assert_ne!(CanSample::<E>::sample(&mut a), CanSample::<E>::sample(&mut b));
	}
}
