// Copyright 2025 Irreducible Inc.

//! Reduces log-derivative sums to running-sum columns.
//!
//! Every `numerator / denominator` part of size `n` gets a column `Z` with
//! `Z[i] = Σ_{j <= i} num[j] / den[j]`, enforced by
//!
//! * `Z[0] · den[0] - num[0] = 0` (local),
//! * `(Z[i] - Z[i-1]) · den[i] - num[i] = 0` for `i >= 1` (global),
//!
//! and `Z[n-1]` is exposed with a local opening. The verifier adds up the openings
//! of all parts and compares the total with the claimed sum.

use quill_field::{util::par_batch_invert, Field};
use quill_utils::{bail, ensure};
use rayon::prelude::*;
use tracing::instrument;

use super::error::Error as LogDerivativeSumError;
use crate::{
	column::{shift, Column, ColumnValues},
	error::{Error, VerificationError},
	expr::{EvalContext, Expr},
	iop::{CompiledIop, ProverAction, VerifierAction},
	prover::ProverRuntime,
	query::{LogDerivativeSumPart, Query, QueryId},
	types::E,
	verifier::VerifierRuntime,
};

/// Evaluates `numerator[row] / denominator[row]` on every row. The result stays
/// in the base field when both expressions do.
pub fn log_derivative_terms<C: EvalContext + ?Sized>(
	ctx: &C,
	size: usize,
	part: &LogDerivativeSumPart,
) -> Result<ColumnValues, Error> {
	let denominator = part.denominator.evaluate(ctx, size)?;
	let numerator = part
		.numerator
		.as_ref()
		.filter(|numerator| !numerator.is_constant_one())
		.map(|numerator| numerator.evaluate(ctx, size))
		.transpose()?;

	let terms = match denominator {
		ColumnValues::Base(mut inverses) => {
			ensure_nonzero(&inverses, size)?;
			par_batch_invert(&mut inverses);
			match numerator {
				None => ColumnValues::Base(inverses),
				Some(ColumnValues::Base(numerator)) => {
					inverses
						.par_iter_mut()
						.zip(numerator.par_iter())
						.for_each(|(inv, num)| *inv *= num);
					ColumnValues::Base(inverses)
				}
				Some(ColumnValues::Ext(numerator)) => ColumnValues::Ext(
					numerator
						.into_par_iter()
						.zip(inverses.into_par_iter())
						.map(|(num, inv)| num * inv)
						.collect(),
				),
			}
		}
		ColumnValues::Ext(mut inverses) => {
			ensure_nonzero(&inverses, size)?;
			par_batch_invert(&mut inverses);
			if let Some(numerator) = numerator {
				inverses
					.par_iter_mut()
					.enumerate()
					.for_each(|(row, inv)| *inv *= numerator.get_ext(row));
			}
			ColumnValues::Ext(inverses)
		}
	};
	Ok(terms)
}

fn ensure_nonzero<F: Field>(denominator: &[F], size: usize) -> Result<(), Error> {
	if let Some(row) = denominator.iter().position(Field::is_zero) {
		bail!(LogDerivativeSumError::ZeroDenominator { size, row });
	}
	Ok(())
}

fn prefix_sum<F: Field>(values: &mut [F]) {
	for i in 1..values.len() {
		let prev = values[i - 1];
		values[i] += prev;
	}
}

/// Turns the terms of a part into its running sum, returning the last value.
pub fn accumulate(terms: ColumnValues) -> (ColumnValues, E) {
	match terms {
		ColumnValues::Base(mut values) => {
			prefix_sum(&mut values);
			let last = values.last().copied().unwrap_or_default();
			(ColumnValues::Base(values), last.into())
		}
		ColumnValues::Ext(mut values) => {
			prefix_sum(&mut values);
			let last = values.last().copied().unwrap_or_default();
			(ColumnValues::Ext(values), last)
		}
	}
}

#[derive(Debug, Clone)]
struct AccumulatorEntry {
	size: usize,
	part: LogDerivativeSumPart,
	z: Column,
	opening: QueryId,
}

/// Assigns the `Z` columns of one log-derivative sum and their openings.
#[derive(Debug)]
struct ZAssignmentTask {
	entries: Vec<AccumulatorEntry>,
}

impl ProverAction for ZAssignmentTask {
	#[instrument(skip_all, name = "logderivativesum::assign_z", level = "debug")]
	fn run(&self, run: &mut ProverRuntime<'_>) -> Result<(), Error> {
		let shared: &ProverRuntime<'_> = run;
		let accumulators = self
			.entries
			.par_iter()
			.map(|entry| log_derivative_terms(shared, entry.size, &entry.part).map(accumulate))
			.collect::<Vec<_>>();

		for (entry, accumulator) in self.entries.iter().zip(accumulators) {
			let (z, last) = accumulator?;
			run.assign_column(entry.z, z)?;
			run.assign_local_opening(entry.opening, last)?;
		}
		Ok(())
	}
}

/// Checks that the openings of the last rows add up to the claimed sum.
#[derive(Debug)]
struct SumCheckAction {
	query: QueryId,
	name: String,
	openings: Vec<QueryId>,
}

impl VerifierAction for SumCheckAction {
	fn run(&self, run: &VerifierRuntime<'_>) -> Result<(), Error> {
		let claimed = run.get_log_deriv_sum_params(self.query)?;
		let recomputed = self
			.openings
			.iter()
			.map(|&opening| run.get_local_opening(opening))
			.sum::<Result<E, _>>()?;
		ensure!(
			claimed == recomputed,
			VerificationError::LogDerivativeSumMismatch {
				query: self.name.clone(),
				claimed,
				recomputed,
			}
		);
		Ok(())
	}
}

/// Compiles every active log-derivative sum into accumulator columns, their
/// constraints and openings, and a final sum check.
#[instrument(skip_all, name = "logderivativesum::compile_sums", level = "debug")]
pub fn compile_log_derivative_sums(iop: &mut CompiledIop) {
	let sums = iop
		.queries()
		.active()
		.filter_map(|info| match info.query() {
			Query::LogDerivativeSum(sum) => {
				Some((info.id(), info.name().clone(), info.round(), sum.clone()))
			}
			_ => None,
		})
		.collect::<Vec<_>>();

	for (id, name, round, sum) in sums {
		iop.ignore_query(id);

		let mut entries = Vec::with_capacity(sum.num_parts());
		for (&size, parts) in &sum.inputs {
			for (index, part) in parts.iter().enumerate() {
				let suffix = format!("{size}_{index}");
				let numerator = part.numerator.clone().unwrap_or_else(Expr::one);
				let denominator = part.denominator.clone();

				let z = iop.insert_commit(round, format!("{name}_Z_{suffix}"), size);
				iop.insert_local(
					round,
					format!("{name}_Z_START_{suffix}"),
					z * denominator.clone() - numerator.clone(),
				);
				iop.insert_global(
					round,
					format!("{name}_Z_RECURRENCE_{suffix}"),
					(z - shift(z, -1)) * denominator - numerator,
				);
				let opening =
					iop.insert_local_opening(round, format!("{name}_Z_END_{suffix}"), shift(z, -1));

				entries.push(AccumulatorEntry {
					size,
					part: part.clone(),
					z,
					opening,
				});
			}
		}

		tracing::debug!(query = %name, round, parts = entries.len(), "compiled log-derivative sum");

		let openings = entries.iter().map(|entry| entry.opening).collect();
		iop.register_prover_action(round, ZAssignmentTask { entries });
		iop.register_verifier_action(
			round,
			SumCheckAction {
				query: id,
				name,
				openings,
			},
		);
	}
}
