// Copyright 2025 Irreducible Inc.

//! End-to-end runs over a small execution trace: every active value is range
//! checked against a constant table and the active rows are projected, in order,
//! onto a separate operations table.

use assert_matches::assert_matches;
use quill_core::{
	column::{shift, Column, ColumnValues},
	compile,
	expr::Expr,
	protocols::{compile_standard, logderivativesum},
	prove,
	query::{Inclusion, Projection},
	verify, CompiledIop, Error, Proof, VerificationError,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

const TRACE_SIZE: usize = 8;
const RANGE: u64 = 16;

struct TraceColumns {
	pc: Column,
	value: Column,
	active: Column,
	op_pc: Column,
	op_value: Column,
	op_sel: Column,
}

#[derive(Clone)]
struct Witness {
	pc: Vec<u64>,
	value: Vec<u64>,
	active: Vec<u64>,
	op_pc: Vec<u64>,
	op_value: Vec<u64>,
}

fn trace_iop(num_ops: usize) -> (CompiledIop, TraceColumns) {
	let mut handles = None;
	let iop = compile(
		|iop| {
			let range = iop.insert_constant_column("RANGE", ColumnValues::from_u64s(0..RANGE));
			let pc = iop.insert_commit(0, "PC", TRACE_SIZE);
			let value = iop.insert_commit(0, "VALUE", TRACE_SIZE);
			let active = iop.insert_commit(0, "ACTIVE", TRACE_SIZE);
			let op_pc = iop.insert_commit(0, "OP_PC", num_ops);
			let op_value = iop.insert_commit(0, "OP_VALUE", num_ops);
			let op_sel = iop.constant_one_column(num_ops);

			iop.insert_global(0, "PC_STEP", shift(pc, 1) - pc - Expr::one());
			iop.insert_global(0, "ACTIVE_IS_BINARY", active * (active - Expr::one()));
			iop.insert_inclusion(
				0,
				"VALUE_IN_RANGE",
				Inclusion::new(vec![range], vec![value]).with_included_filter(active),
			);
			iop.insert_projection(
				0,
				"TRACE_TO_OPS",
				Projection::new(vec![pc, value], vec![op_pc, op_value], active, op_sel),
			);

			handles = Some(TraceColumns {
				pc,
				value,
				active,
				op_pc,
				op_value,
				op_sel,
			});
		},
		&[&compile_standard],
	);
	(iop, handles.unwrap())
}

fn random_witness(rng: &mut impl Rng) -> Witness {
	let pc = (0..TRACE_SIZE as u64).map(|pc| pc + 100).collect::<Vec<_>>();
	let value = (0..TRACE_SIZE).map(|_| rng.gen_range(0..RANGE)).collect::<Vec<_>>();
	let active = vec![1, 1, 0, 1, 0, 1, 1, 0];
	let (op_pc, op_value) = (0..TRACE_SIZE)
		.filter(|&row| active[row] == 1)
		.map(|row| (pc[row], value[row]))
		.unzip();
	Witness {
		pc,
		value,
		active,
		op_pc,
		op_value,
	}
}

fn prove_trace(iop: &CompiledIop, columns: &TraceColumns, witness: &Witness) -> Result<Proof, Error> {
	prove(iop, |run| {
		run.assign_column(columns.pc, ColumnValues::from_u64s(witness.pc.iter().copied()))?;
		run.assign_column(columns.value, ColumnValues::from_u64s(witness.value.iter().copied()))?;
		run.assign_column(columns.active, ColumnValues::from_u64s(witness.active.iter().copied()))?;
		run.assign_column(columns.op_pc, ColumnValues::from_u64s(witness.op_pc.iter().copied()))?;
		run.assign_column(
			columns.op_value,
			ColumnValues::from_u64s(witness.op_value.iter().copied()),
		)?;
		Ok(())
	})
}

fn failures(result: Result<(), Error>) -> Vec<VerificationError> {
	match result {
		Err(Error::VerificationFailed { failures, .. }) => failures
			.into_iter()
			.map(|failure| match failure {
				Error::Verification(err) => err,
				other => panic!("unexpected failure {other}"),
			})
			.collect(),
		other => panic!("expected the proof to be rejected, got {other:?}"),
	}
}

fn setup() {
	quill_utils::tracing::init_tracing();
	// Another test thread may have started the global pool first.
	let _ = quill_utils::rayon::adjust_thread_pool();
}

#[test]
fn test_honest_trace_verifies() {
	setup();
	let mut rng = StdRng::seed_from_u64(0);
	let (iop, columns) = trace_iop(5);
	assert_eq!(iop.columns().size(columns.op_sel.id()), 5);

	for _ in 0..4 {
		let witness = random_witness(&mut rng);
		let proof = prove_trace(&iop, &columns, &witness).unwrap();
		verify(&iop, &proof).unwrap();
	}
}

#[test]
fn test_proofs_are_deterministic() {
	setup();
	let mut rng = StdRng::seed_from_u64(1);
	let (iop, columns) = trace_iop(5);
	let witness = random_witness(&mut rng);

	let first = prove_trace(&iop, &columns, &witness).unwrap();
	let second = prove_trace(&iop, &columns, &witness).unwrap();
	assert_eq!(first.columns, second.columns);
	assert_eq!(first.params, second.params);
}

#[test]
fn test_inactive_rows_may_leave_the_range() {
	setup();
	let mut rng = StdRng::seed_from_u64(2);
	let (iop, columns) = trace_iop(5);
	let mut witness = random_witness(&mut rng);
	witness.value[2] = 1000;

	let proof = prove_trace(&iop, &columns, &witness).unwrap();
	verify(&iop, &proof).unwrap();
}

#[test]
fn test_active_value_out_of_range_fails_on_prover_side() {
	setup();
	let mut rng = StdRng::seed_from_u64(3);
	let (iop, columns) = trace_iop(5);
	let mut witness = random_witness(&mut rng);
	witness.value[3] = RANGE;
	witness.op_value[2] = RANGE;

	let err = prove_trace(&iop, &columns, &witness).unwrap_err();
	assert_matches!(
		err,
		Error::LogDerivativeSum(logderivativesum::Error::ValueNotInTable { row: 3, .. })
	);
}

#[test]
fn test_reordered_operations_are_rejected() {
	setup();
	let mut rng = StdRng::seed_from_u64(4);
	let (iop, columns) = trace_iop(5);
	let mut witness = random_witness(&mut rng);
	witness.op_pc.swap(0, 1);
	witness.op_value.swap(0, 1);

	let proof = prove_trace(&iop, &columns, &witness).unwrap();
	assert!(failures(verify(&iop, &proof))
		.iter()
		.any(|err| matches!(err, VerificationError::ProjectionMismatch { query, .. } if query == "TRACE_TO_OPS")));
}

#[test]
fn test_missing_operation_is_rejected() {
	setup();
	let mut rng = StdRng::seed_from_u64(5);
	let (iop, columns) = trace_iop(4);
	let mut witness = random_witness(&mut rng);
	witness.op_pc.pop();
	witness.op_value.pop();

	let proof = prove_trace(&iop, &columns, &witness).unwrap();
	assert!(!failures(verify(&iop, &proof)).is_empty());
}

#[test]
fn test_broken_program_counter_is_rejected() {
	setup();
	let mut rng = StdRng::seed_from_u64(6);
	let (iop, columns) = trace_iop(5);
	let mut witness = random_witness(&mut rng);
	witness.pc[4] += 1;

	let proof = prove_trace(&iop, &columns, &witness).unwrap();
	assert!(failures(verify(&iop, &proof)).contains(&VerificationError::GlobalConstraintUnsatisfied {
		name: "PC_STEP".to_string(),
		row: 3,
	}));
}

#[test]
fn test_truncated_proof_is_malformed() {
	setup();
	let mut rng = StdRng::seed_from_u64(7);
	let (iop, columns) = trace_iop(5);
	let mut proof = prove_trace(&iop, &columns, &random_witness(&mut rng)).unwrap();
	proof.columns.remove(&columns.value.id());

	assert_matches!(verify(&iop, &proof), Err(Error::MalformedProof(_)));
}
