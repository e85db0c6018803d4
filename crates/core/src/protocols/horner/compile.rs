// Copyright 2025 Irreducible Inc.

use itertools::izip;
use quill_field::Field;
use quill_utils::{bail, ensure};
use rayon::prelude::*;
use tracing::instrument;

use super::error::Error as HornerError;
use crate::{
	column::{shift, Column},
	error::{Error, VerificationError},
	expr::{EvalContext, Expr},
	iop::{CompiledIop, ProverAction, VerifierAction},
	prover::ProverRuntime,
	query::{Horner, HornerPart, InnerProduct, Query, QueryId},
	types::{B, E},
	verifier::VerifierRuntime,
};

/// Evaluates the accumulators of a part. `acc[k][row]` is the Horner evaluation
/// of the sequence that starts at member `k` of `row`, so `acc[0][0]` is the
/// evaluation of the whole part.
pub fn horner_accumulators<C: EvalContext + ?Sized>(
	ctx: &C,
	part: &HornerPart,
) -> Result<Vec<Vec<E>>, Error> {
	let x = part.x.value(ctx)?;
	let coefficients = part
		.coefficients
		.iter()
		.map(|coefficient| coefficient.evaluate(ctx, part.size))
		.collect::<Result<Vec<_>, _>>()?;
	let selectors = part
		.selectors
		.iter()
		.map(|&selector| Expr::from(selector).evaluate(ctx, part.size))
		.collect::<Result<Vec<_>, _>>()?;

	let members = coefficients.len();
	let mut accumulators = vec![vec![E::ZERO; part.size]; members];
	let mut acc = E::ZERO;
	for row in (0..part.size).rev() {
		for member in (0..members).rev() {
			match selectors[member].get_base(row) {
				Some(value) if value == B::ONE => {
					acc = coefficients[member].get_ext(row) + x * acc;
				}
				Some(value) if value.is_zero() => {}
				_ => {
					bail!(HornerError::SelectorNonBinary {
						part: part.name.clone(),
						member,
						row,
						value: selectors[member].get_ext(row),
					});
				}
			}
			accumulators[member][row] = acc;
		}
	}
	Ok(accumulators)
}

#[derive(Debug, Clone)]
struct PartPlan {
	accumulators: Vec<Column>,
	opening: QueryId,
	count: QueryId,
	counted: InnerProduct,
}

/// Registers the accumulator columns and constraints of one part.
fn plan_part(
	iop: &mut CompiledIop,
	round: usize,
	query: &str,
	index: usize,
	part: &HornerPart,
) -> PartPlan {
	let members = part.coefficients.len();
	let accumulators = (0..members)
		.map(|member| iop.insert_commit(round, format!("{query}_HORNER_ACC_{index}_{member}"), part.size))
		.collect::<Vec<_>>();
	let x = part.x.to_expr();

	for (member, (coefficient, &selector)) in part.coefficients.iter().zip(&part.selectors).enumerate() {
		let next = match accumulators.get(member + 1) {
			Some(&next) => Expr::from(next),
			None => Expr::from(shift(accumulators[0], 1)),
		};
		let recurrence = Expr::from(accumulators[member])
			- (selector * (coefficient.clone() + x.clone() * next.clone())
				+ (Expr::one() - selector) * next);
		iop.insert_global(round, format!("{query}_HORNER_RECURRENCE_{index}_{member}"), recurrence);
		iop.insert_global(
			round,
			format!("{query}_HORNER_SELECTOR_{index}_{member}"),
			selector * (selector - Expr::one()),
		);
	}

	// On the last row the sequence ends after the last member.
	let last = members - 1;
	iop.insert_local(
		round,
		format!("{query}_HORNER_END_{index}"),
		(Expr::from(accumulators[last]) - part.selectors[last] * part.coefficients[last].clone())
			.shifted(-1),
	);

	let opening =
		iop.insert_local_opening(round, format!("{query}_HORNER_OPENING_{index}"), accumulators[0]);
	let ones = iop.constant_one_column(part.size);
	let count = iop.insert_inner_product(
		round,
		format!("{query}_HORNER_COUNT_{index}"),
		ones,
		part.selectors.clone(),
	);

	PartPlan {
		accumulators,
		opening,
		count,
		counted: InnerProduct {
			a: ones,
			bs: part.selectors.clone(),
			size: part.size,
		},
	}
}

/// Replaces every active Horner query by accumulator columns.
#[instrument(skip_all, name = "horner::compile", level = "debug")]
pub fn compile_horner(iop: &mut CompiledIop) {
	let queries = iop
		.queries()
		.active()
		.filter_map(|info| match info.query() {
			Query::Horner(horner) => {
				Some((info.id(), info.name().clone(), info.round(), horner.clone()))
			}
			_ => None,
		})
		.collect::<Vec<_>>();

	for (id, name, round, horner) in queries {
		iop.ignore_query(id);
		let plans = horner
			.parts
			.iter()
			.enumerate()
			.map(|(index, part)| plan_part(iop, round, &name, index, part))
			.collect::<Vec<_>>();
		tracing::debug!(query = %name, round, parts = plans.len(), "compiled horner query");

		iop.register_prover_action(
			round,
			AccumulatorTask {
				horner: horner.clone(),
				plans: plans.clone(),
			},
		);
		iop.register_verifier_action(
			round,
			ResultCheck {
				query: id,
				name,
				horner,
				plans,
			},
		);
	}
}

struct AccumulatorTask {
	horner: Horner,
	plans: Vec<PartPlan>,
}

impl ProverAction for AccumulatorTask {
	#[instrument(skip_all, name = "horner::assign_accumulators", level = "debug")]
	fn run(&self, run: &mut ProverRuntime<'_>) -> Result<(), Error> {
		let shared: &ProverRuntime<'_> = run;
		let results = self
			.horner
			.parts
			.par_iter()
			.map(|part| horner_accumulators(shared, part))
			.collect::<Vec<_>>();

		for (plan, accumulators) in self.plans.iter().zip(results) {
			let accumulators = accumulators?;
			let leading = accumulators[0][0];
			for (&column, values) in plan.accumulators.iter().zip(accumulators) {
				run.assign_column(column, values)?;
			}
			run.assign_local_opening(plan.opening, leading)?;
			let counts = plan.counted.compute(&*run)?;
			run.assign_inner_product(plan.count, counts)?;
		}
		Ok(())
	}
}

/// Checks the claimed counts and final result against the openings.
struct ResultCheck {
	query: QueryId,
	name: String,
	horner: Horner,
	plans: Vec<PartPlan>,
}

impl VerifierAction for ResultCheck {
	fn run(&self, run: &VerifierRuntime<'_>) -> Result<(), Error> {
		let params = run.get_horner_params(self.query)?;
		ensure!(
			params.parts.len() == self.plans.len(),
			Error::MalformedProof(format!(
				"horner query {} has {} parts, the parameters describe {}",
				self.name,
				self.plans.len(),
				params.parts.len()
			))
		);

		let mut final_result = E::ZERO;
		for (index, (part, plan, claimed)) in
			izip!(&self.horner.parts, &self.plans, &params.parts).enumerate()
		{
			let counted = run.get_inner_product(plan.count)?.iter().sum::<E>();
			let declared =
				E::from(B::from_u64(claimed.n1 as u64)) - E::from(B::from_u64(claimed.n0 as u64));
			ensure!(
				counted == declared,
				VerificationError::HornerCountMismatch {
					query: self.name.clone(),
					part: index,
					declared,
					counted,
				}
			);

			let leading = run.get_local_opening(plan.opening)?;
			let contribution = part.x.value(run)?.pow([claimed.n0 as u64]) * leading;
			if part.sign_negative {
				final_result -= contribution;
			} else {
				final_result += contribution;
			}
		}

		ensure!(
			final_result == params.final_result,
			VerificationError::HornerFinalResultMismatch {
				query: self.name.clone(),
				claimed: params.final_result,
				recomputed: final_result,
			}
		);
		Ok(())
	}
}
