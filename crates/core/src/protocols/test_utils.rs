// Copyright 2025 Irreducible Inc.

use quill_field::Field;
use rand::Rng;

use crate::{
	column::{Column, ColumnValues},
	error::{Error, VerificationError},
	iop::CompiledIop,
	prover::Proof,
	types::{B, E},
};

pub fn base_values(values: &[u64]) -> ColumnValues {
	ColumnValues::from_u64s(values.iter().copied())
}

pub fn random_values(rng: &mut impl Rng, size: usize, bound: u64) -> Vec<u64> {
	(0..size).map(|_| rng.gen_range(0..bound)).collect()
}

/// The only column whose name ends with `suffix`.
pub fn column_with_suffix(iop: &CompiledIop, suffix: &str) -> Column {
	let mut matches = iop
		.columns()
		.iter()
		.filter(|info| info.name().ends_with(suffix))
		.map(|info| info.id());
	let id = matches.next().unwrap_or_else(|| panic!("no column ends with {suffix}"));
	assert!(matches.next().is_none(), "several columns end with {suffix}");
	Column::new(id)
}

/// Adds one to a revealed cell.
pub fn tamper_column(proof: &mut Proof, column: Column, row: usize) {
	match proof.columns.get_mut(&column.id()).expect("column is revealed") {
		ColumnValues::Base(values) => values[row] += B::ONE,
		ColumnValues::Ext(values) => values[row] += E::ONE,
	}
}

/// Asserts that verification failed and that one of the failures satisfies
/// `expected`.
pub fn assert_rejected(result: Result<(), Error>, expected: impl Fn(&VerificationError) -> bool) {
	let failures = match result {
		Err(Error::VerificationFailed { failures, .. }) => failures,
		other => panic!("expected the proof to be rejected, got {other:?}"),
	};
	assert!(
		failures
			.iter()
			.any(|failure| matches!(failure, Error::Verification(err) if expected(err))),
		"unexpected failures: {failures:?}"
	);
}
