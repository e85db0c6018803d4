// Copyright 2025 Irreducible Inc.

use assert_matches::assert_matches;
use proptest::prelude::*;
use quill_field::Field;

use super::compile_projections;
use crate::{
	column::Column,
	error::{Error, VerificationError},
	iop::{compile, CompiledIop, CompilerPass},
	protocols::{
		compile_standard, dummy,
		horner::Error as HornerError,
		test_utils::{assert_rejected, base_values},
	},
	prover::{prove, Proof},
	query::{HornerParams, Projection, QueryParams},
	types::E,
	verifier::verify,
};

struct Sides {
	columns_a: Vec<Column>,
	columns_b: Vec<Column>,
	filter_a: Column,
	filter_b: Column,
}

fn projection_iop(
	width: usize,
	size_a: usize,
	size_b: usize,
	passes: &[CompilerPass<'_>],
) -> (CompiledIop, Sides) {
	let mut handles = None;
	let iop = compile(
		|iop| {
			let columns_a = (0..width)
				.map(|i| iop.insert_commit(0, format!("A{i}"), size_a))
				.collect::<Vec<_>>();
			let columns_b = (0..width)
				.map(|i| iop.insert_commit(0, format!("B{i}"), size_b))
				.collect::<Vec<_>>();
			let filter_a = iop.insert_commit(0, "FILTER_A", size_a);
			let filter_b = iop.insert_commit(0, "FILTER_B", size_b);
			iop.insert_projection(
				0,
				"A_TO_B",
				Projection::new(columns_a.clone(), columns_b.clone(), filter_a, filter_b),
			);
			handles = Some(Sides {
				columns_a,
				columns_b,
				filter_a,
				filter_b,
			});
		},
		passes,
	);
	(iop, handles.unwrap())
}

fn assign_sides(
	iop: &CompiledIop,
	sides: &Sides,
	a: &[&[u64]],
	filter_a: &[u64],
	b: &[&[u64]],
	filter_b: &[u64],
) -> Result<Proof, Error> {
	prove(iop, |run| {
		for (&column, values) in sides.columns_a.iter().zip(a) {
			run.assign_column(column, base_values(values))?;
		}
		for (&column, values) in sides.columns_b.iter().zip(b) {
			run.assign_column(column, base_values(values))?;
		}
		run.assign_column(sides.filter_a, base_values(filter_a))?;
		run.assign_column(sides.filter_b, base_values(filter_b))?;
		Ok(())
	})
}

fn prove_sides(
	iop: &CompiledIop,
	sides: &Sides,
	a: &[&[u64]],
	filter_a: &[u64],
	b: &[&[u64]],
	filter_b: &[u64],
) -> Proof {
	assign_sides(iop, sides, a, filter_a, b, filter_b).unwrap()
}

fn horner_params_mut<'a>(iop: &CompiledIop, proof: &'a mut Proof) -> &'a mut HornerParams {
	let id = iop.queries().by_name("A_TO_B_PROJECTION_HORNER").unwrap();
	match proof.params.get_mut(&id) {
		Some(QueryParams::Horner(params)) => params,
		_ => panic!("horner parameters are assigned"),
	}
}

#[test]
fn test_equal_filtered_sequences_pass() {
	let (iop, sides) = projection_iop(1, 5, 3, &[&compile_standard]);
	let proof = prove_sides(
		&iop,
		&sides,
		&[&[4, 1, 2, 9, 3]],
		&[0, 1, 1, 0, 1],
		&[&[1, 2, 3]],
		&[1, 1, 1],
	);
	verify(&iop, &proof).unwrap();
	assert!(iop.coins().by_name("A_TO_B_PROJECTION_ALPHA").is_none());
}

#[test]
fn test_reordered_sequence_is_rejected() {
	let (iop, sides) = projection_iop(1, 3, 3, &[&compile_standard]);
	let proof = prove_sides(&iop, &sides, &[&[1, 2, 3]], &[1, 1, 1], &[&[3, 2, 1]], &[1, 1, 1]);
	assert_rejected(verify(&iop, &proof), |err| {
		matches!(err, VerificationError::ProjectionMismatch { .. })
	});
}

#[test]
fn test_removed_element_is_rejected() {
	let (iop, sides) = projection_iop(1, 3, 4, &[&compile_standard]);
	let proof =
		prove_sides(&iop, &sides, &[&[1, 2, 3]], &[1, 1, 1], &[&[1, 2, 3, 0]], &[1, 1, 0, 0]);
	assert_rejected(verify(&iop, &proof), |err| {
		matches!(err, VerificationError::ProjectionMismatch { .. })
	});
}

#[test]
fn test_duplicated_element_is_rejected() {
	let (iop, sides) = projection_iop(1, 3, 4, &[&compile_standard]);
	let proof =
		prove_sides(&iop, &sides, &[&[1, 2, 3]], &[1, 1, 1], &[&[1, 2, 2, 3]], &[1, 1, 1, 1]);
	assert_rejected(verify(&iop, &proof), |err| {
		matches!(err, VerificationError::ProjectionMismatch { .. })
	});
}

#[test]
fn test_trailing_zero_is_caught_by_the_lengths() {
	let (iop, sides) = projection_iop(1, 3, 2, &[&compile_standard]);
	let proof = prove_sides(&iop, &sides, &[&[1, 2, 0]], &[1, 1, 1], &[&[1, 2]], &[1, 1]);
	assert_rejected(verify(&iop, &proof), |err| {
		matches!(
			err,
			VerificationError::ProjectionLengthMismatch {
				len_a: 3,
				len_b: 2,
				..
			}
		)
	});
}

#[test]
fn test_multi_column_sides_are_collapsed() {
	let (iop, sides) = projection_iop(2, 4, 3, &[&compile_standard]);
	assert!(iop.coins().by_name("A_TO_B_PROJECTION_ALPHA").is_some());

	let proof = prove_sides(
		&iop,
		&sides,
		&[&[1, 7, 2, 3], &[10, 70, 20, 30]],
		&[1, 0, 1, 1],
		&[&[1, 2, 3], &[10, 20, 30]],
		&[1, 1, 1],
	);
	verify(&iop, &proof).unwrap();

	// Swapping two values of the second column breaks the projection.
	let proof = prove_sides(
		&iop,
		&sides,
		&[&[1, 7, 2, 3], &[10, 70, 20, 30]],
		&[1, 0, 1, 1],
		&[&[1, 2, 3], &[20, 10, 30]],
		&[1, 1, 1],
	);
	assert_rejected(verify(&iop, &proof), |err| {
		matches!(err, VerificationError::ProjectionMismatch { .. })
	});
}

#[test]
fn test_direct_check_agrees_with_the_reduction() {
	let passes: [&[CompilerPass<'_>]; 2] =
		[&[&dummy::compile], &[&compile_projections, &compile_standard]];
	for passes in passes {
		let (iop, sides) = projection_iop(1, 3, 3, passes);
		let proof = prove_sides(&iop, &sides, &[&[1, 2, 3]], &[1, 1, 1], &[&[1, 2, 3]], &[1, 1, 1]);
		verify(&iop, &proof).unwrap();

		let proof = prove_sides(&iop, &sides, &[&[1, 2, 3]], &[1, 1, 1], &[&[2, 1, 3]], &[1, 1, 1]);
		assert_rejected(verify(&iop, &proof), |err| {
			matches!(err, VerificationError::ProjectionMismatch { .. })
		});
	}
}

#[test]
fn test_shifted_start_is_rejected() {
	// B is A without its leading zero. Starting B at N0 = 1 would make the
	// Horner identity hold.
	let (iop, sides) = projection_iop(1, 3, 2, &[&compile_standard]);
	let mut proof = prove_sides(&iop, &sides, &[&[0, 1, 2]], &[1, 1, 1], &[&[1, 2]], &[1, 1]);
	assert_rejected(verify(&iop, &proof), |err| {
		matches!(err, VerificationError::ProjectionMismatch { .. })
	});

	let params = horner_params_mut(&iop, &mut proof);
	params.parts[1].n0 = 1;
	params.parts[1].n1 = 3;
	params.final_result = E::ZERO;
	assert_rejected(verify(&iop, &proof), |err| {
		matches!(err, VerificationError::ProjectionNonZeroStart { part: 1, n0: 1, .. })
	});
}

#[test]
fn test_forged_lengths_are_rejected() {
	let (iop, sides) = projection_iop(1, 3, 3, &[&compile_standard]);
	let mut proof = prove_sides(&iop, &sides, &[&[1, 2, 3]], &[1, 1, 1], &[&[1, 2, 3]], &[1, 1, 1]);
	verify(&iop, &proof).unwrap();

	let params = horner_params_mut(&iop, &mut proof);
	params.parts[0].n1 = 4;
	params.parts[1].n1 = 4;
	assert_rejected(verify(&iop, &proof), |err| {
		matches!(err, VerificationError::HornerCountMismatch { .. })
	});
}

#[test]
fn test_forged_final_result_is_rejected() {
	let (iop, sides) = projection_iop(1, 3, 3, &[&compile_standard]);
	let mut proof = prove_sides(&iop, &sides, &[&[1, 2, 3]], &[1, 1, 1], &[&[3, 2, 1]], &[1, 1, 1]);

	horner_params_mut(&iop, &mut proof).final_result = E::ZERO;
	assert_rejected(verify(&iop, &proof), |err| {
		matches!(err, VerificationError::HornerFinalResultMismatch { .. })
	});
}

#[test]
fn test_non_binary_filter_is_rejected_by_both_paths() {
	let (iop, sides) = projection_iop(1, 3, 2, &[&dummy::compile]);
	let proof = prove_sides(&iop, &sides, &[&[1, 2, 3]], &[1, 2, 0], &[&[1, 2]], &[1, 1]);
	assert_rejected(verify(&iop, &proof), |err| {
		matches!(err, VerificationError::ProjectionFilterNotBinary { side: "A", row: 1, .. })
	});

	let (iop, sides) = projection_iop(1, 3, 2, &[&compile_standard]);
	let err = assign_sides(&iop, &sides, &[&[1, 2, 3]], &[1, 2, 0], &[&[1, 2]], &[1, 1]).unwrap_err();
	assert_matches!(err, Error::Horner(HornerError::SelectorNonBinary { row: 1, .. }));
}

/// A side interleaves `sequence` with unselected rows, B side is `other`
/// fully selected.
fn prove_against(sequence: &[u64], gaps: &[bool], other: &[u64]) -> Result<(), Error> {
	let mut a = Vec::new();
	let mut filter_a = Vec::new();
	for (&value, &gap) in sequence.iter().zip(gaps) {
		if gap {
			a.push(value + 1);
			filter_a.push(0);
		}
		a.push(value);
		filter_a.push(1);
	}
	let filter_b = vec![1; other.len()];

	let (iop, sides) = projection_iop(1, a.len(), other.len(), &[&compile_standard]);
	let proof = prove_sides(&iop, &sides, &[a.as_slice()], &filter_a, &[other], &filter_b);
	verify(&iop, &proof)
}

fn is_projection_failure(result: &Result<(), Error>) -> bool {
	match result {
		Err(Error::VerificationFailed { failures, .. }) => failures.iter().any(|failure| {
			matches!(
				failure,
				Error::Verification(
					VerificationError::ProjectionMismatch { .. }
						| VerificationError::ProjectionLengthMismatch { .. }
				)
			)
		}),
		_ => false,
	}
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(32))]

	#[test]
	fn test_equal_sequences_pass_and_edits_are_rejected(
		sequence in prop::collection::vec(1u64..1000, 2..10),
		gaps in prop::collection::vec(any::<bool>(), 10),
		edit in 0usize..3,
		index in any::<prop::sample::Index>(),
	) {
		prop_assert!(prove_against(&sequence, &gaps, &sequence).is_ok());

		let mut edited = sequence.clone();
		match edit {
			0 => {
				edited.remove(index.index(sequence.len()));
			}
			1 => {
				let i = index.index(sequence.len());
				edited.insert(i, sequence[i]);
			}
			_ => {
				let i = index.index(sequence.len() - 1);
				prop_assume!(sequence[i] != sequence[i + 1]);
				edited.swap(i, i + 1);
			}
		}
		let result = prove_against(&sequence, &gaps, &edited);
		prop_assert!(is_projection_failure(&result), "edited sequence accepted: {:?}", result);
	}
}
