// Copyright 2025 Irreducible Inc.

//! Fiat-Shamir transcript shared by the prover and the verifier runtimes.

mod hasher_challenger;

use groestl_crypto::Groestl256;
pub use hasher_challenger::HasherChallenger;
use p3_challenger::{CanObserve, CanSample};

use crate::{
	coin::CoinKind,
	column::ColumnValues,
	query::QueryParams,
	types::{B, E},
};

/// The challenger both runtimes instantiate.
pub type Transcript = HasherChallenger<Groestl256>;

pub fn sample_coin<C>(challenger: &mut C, kind: CoinKind) -> E
where
	C: CanSample<B> + CanSample<E>,
{
	match kind {
		CoinKind::Base => CanSample::<B>::sample(challenger).into(),
		CoinKind::Ext => CanSample::<E>::sample(challenger),
	}
}

/// Absorbs a column prefixed by its length.
pub fn observe_column<C>(challenger: &mut C, values: &ColumnValues)
where
	C: CanObserve<B> + CanObserve<E>,
{
	CanObserve::<B>::observe(challenger, B::from_u64(values.len() as u64));
	match values {
		ColumnValues::Base(values) => CanObserve::<B>::observe_slice(challenger, values),
		ColumnValues::Ext(values) => CanObserve::<E>::observe_slice(challenger, values),
	}
}

pub fn observe_params<C>(challenger: &mut C, params: &QueryParams)
where
	C: CanObserve<B> + CanObserve<E>,
{
	match params {
		QueryParams::LocalOpening(y) | QueryParams::LogDerivativeSum(y) => {
			CanObserve::<E>::observe(challenger, *y)
		}
		QueryParams::Horner(params) => {
			CanObserve::<E>::observe(challenger, params.final_result);
			for part in &params.parts {
				CanObserve::<B>::observe_slice(
					challenger,
					&[B::from_u64(part.n0 as u64), B::from_u64(part.n1 as u64)],
				);
			}
		}
		QueryParams::InnerProduct(ys) => CanObserve::<E>::observe_slice(challenger, ys),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::query::{HornerParams, HornerParamsPart};

	#[test]
	fn test_same_observations_give_same_coins() {
		let values = ColumnValues::from_u64s([1, 2, 3]);
		let mut a = Transcript::default();
		let mut b = Transcript::default();
		observe_column(&mut a, &values);
		observe_column(&mut b, &values);
		assert_eq!(sample_coin(&mut a, CoinKind::Ext), sample_coin(&mut b, CoinKind::Ext));

		observe_column(&mut b, &values);
		assert_ne!(sample_coin(&mut a, CoinKind::Ext), sample_coin(&mut b, CoinKind::Ext));
	}

	#[test]
	fn test_base_coins_lie_in_the_base_field() {
		let mut challenger = Transcript::default();
		for _ in 0..8 {
			let coin = sample_coin(&mut challenger, CoinKind::Base);
			assert_eq!(coin, E::from(coin.coords()[0]));
		}
	}

	#[test]
	fn test_horner_lengths_are_bound() {
		let params = |n1| {
			QueryParams::Horner(HornerParams {
				final_result: E::from_u64(5),
				parts: vec![HornerParamsPart { n0: 0, n1 }],
			})
		};
		let mut a = Transcript::default();
		let mut b = Transcript::default();
		observe_params(&mut a, &params(3));
		observe_params(&mut b, &params(4));
		assert_ne!(sample_coin(&mut a, CoinKind::Ext), sample_coin(&mut b, CoinKind::Ext));
	}
}
