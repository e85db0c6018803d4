// Copyright 2025 Irreducible Inc.

//! Reduces projection queries to Horner queries.
//!
//! Both sides are collapsed with a coin `α` when they span several columns and
//! evaluated as Horner sequences in a common challenge `x`, the B side being
//! subtracted. The filtered sequences are equal, in order, exactly when the
//! final result is zero, both sides select the same number of rows and both
//! sequences start at position zero.

use quill_field::Field;
use quill_utils::ensure;
use tracing::instrument;

use crate::{
	coin::CoinKind,
	column::Column,
	error::{Error, VerificationError},
	expr::{rand_lin_comb, Expr},
	iop::{CompiledIop, ProverAction, VerifierAction},
	prover::ProverRuntime,
	query::{HornerPart, Query, QueryId},
	verifier::VerifierRuntime,
};

#[cfg(test)]
mod tests;

/// Replaces every active projection query by a two-part Horner query.
#[instrument(skip_all, name = "projection::compile", level = "debug")]
pub fn compile_projections(iop: &mut CompiledIop) {
	let queries = iop
		.queries()
		.active()
		.filter_map(|info| match info.query() {
			Query::Projection(projection) => {
				Some((info.id(), info.name().clone(), info.round(), projection.clone()))
			}
			_ => None,
		})
		.collect::<Vec<_>>();

	for (id, name, round, projection) in queries {
		iop.ignore_query(id);
		let coin_round = round + 1;

		let alpha = (projection.columns_a.len() > 1).then(|| {
			Expr::coin(iop.insert_coin(coin_round, format!("{name}_PROJECTION_ALPHA"), CoinKind::Ext))
		});
		let x = iop.insert_coin(coin_round, format!("{name}_PROJECTION_X"), CoinKind::Ext);
		let collapse = |columns: &[Column]| {
			let terms = columns.iter().map(|&column| Expr::from(column)).collect::<Vec<_>>();
			match &alpha {
				Some(alpha) => rand_lin_comb(alpha, &terms),
				None => terms[0].clone(),
			}
		};

		let part_a = HornerPart::new(
			format!("{name}_A"),
			collapse(&projection.columns_a),
			projection.filter_a,
			x,
			iop.columns(),
		);
		let part_b = HornerPart::new(
			format!("{name}_B"),
			collapse(&projection.columns_b),
			projection.filter_b,
			x,
			iop.columns(),
		)
		.negated();
		let horner = iop.insert_horner(coin_round, format!("{name}_PROJECTION_HORNER"), vec![part_a, part_b]);
		tracing::debug!(query = %name, round = coin_round, "compiled projection query");

		iop.register_prover_action(coin_round, AssignHornerParams { horner });
		iop.register_verifier_action(coin_round, CheckProjection { name, horner });
	}
}

struct AssignHornerParams {
	horner: QueryId,
}

impl ProverAction for AssignHornerParams {
	fn run(&self, run: &mut ProverRuntime<'_>) -> Result<(), Error> {
		run.assign_horner_params(self.horner, &[0, 0])?;
		Ok(())
	}
}

struct CheckProjection {
	name: String,
	horner: QueryId,
}

impl VerifierAction for CheckProjection {
	fn run(&self, run: &VerifierRuntime<'_>) -> Result<(), Error> {
		let params = run.get_horner_params(self.horner)?;
		ensure!(
			params.parts.len() == 2,
			Error::MalformedProof(format!("projection {} expects two horner parts", self.name))
		);
		for (part, claimed) in params.parts.iter().enumerate() {
			ensure!(
				claimed.n0 == 0,
				VerificationError::ProjectionNonZeroStart {
					query: self.name.clone(),
					part,
					n0: claimed.n0,
				}
			);
		}
		ensure!(
			params.final_result.is_zero(),
			VerificationError::ProjectionMismatch {
				query: self.name.clone(),
				difference: params.final_result,
			}
		);
		let (len_a, len_b) = (params.parts[0].n1, params.parts[1].n1);
		ensure!(
			len_a == len_b,
			VerificationError::ProjectionLengthMismatch {
				query: self.name.clone(),
				len_a,
				len_b,
			}
		);
		Ok(())
	}
}
