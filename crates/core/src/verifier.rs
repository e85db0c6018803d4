// Copyright 2025 Irreducible Inc.

use quill_utils::{bail, ensure};
use tracing::instrument;

use crate::{
	coin::CoinId,
	column::{Column, ColumnId, ColumnKind, ColumnValues},
	error::Error,
	expr::EvalContext,
	fiat_shamir::{observe_column, observe_params, sample_coin, Transcript},
	iop::CompiledIop,
	prover::Proof,
	query::{HornerParams, QueryId, QueryParams},
	types::E,
};

/// Verifier state while replaying an IOP round by round.
pub struct VerifierRuntime<'a> {
	iop: &'a CompiledIop,
	proof: &'a Proof,
	round: usize,
	coins: Vec<Option<E>>,
	transcript: Transcript,
}

/// Verifies a proof. Every verifier action of a round runs; if any of them fails
/// the proof is rejected with all the failures of that round.
#[instrument(skip_all, name = "iop::verify", level = "debug")]
pub fn verify(iop: &CompiledIop, proof: &Proof) -> Result<(), Error> {
	check_proof_shape(iop, proof)?;

	let mut run = VerifierRuntime {
		iop,
		proof,
		round: 0,
		coins: vec![None; iop.coins().len()],
		transcript: Transcript::default(),
	};
	for round in 0..iop.num_rounds() {
		run.start_round(round);

		let failures = iop
			.verifier_actions(round)
			.iter()
			.filter_map(|action| action.run(&run).err())
			.collect::<Vec<_>>();
		if !failures.is_empty() {
			for failure in &failures {
				tracing::warn!(round, %failure, "verifier action failed");
			}
			bail!(Error::VerificationFailed { round, failures });
		}

		run.end_round()?;
	}
	Ok(())
}

fn check_proof_shape(iop: &CompiledIop, proof: &Proof) -> Result<(), Error> {
	for info in iop.columns().iter().filter(|info| info.is_committed()) {
		let Some(values) = proof.columns.get(&info.id()) else {
			bail!(Error::MalformedProof(format!("column {} is missing", info.name())));
		};
		ensure!(
			values.len() == info.size(),
			Error::MalformedProof(format!(
				"column {} has size {}, expected {}",
				info.name(),
				values.len(),
				info.size()
			))
		);
	}
	ensure!(
		proof.columns.len() == iop.columns().iter().filter(|info| info.is_committed()).count(),
		Error::MalformedProof("the proof carries unknown columns".to_string())
	);
	for (&id, params) in &proof.params {
		ensure!(
			id.index() < iop.queries().len(),
			Error::MalformedProof(format!("parameters for unknown query {}", id.index()))
		);
		let info = iop.queries().get(id);
		ensure!(
			params.fits(info.query()),
			Error::QueryParamsKindMismatch {
				name: info.name().clone(),
				kind: params.kind_name(),
			}
		);
	}
	Ok(())
}

impl<'a> VerifierRuntime<'a> {
	pub fn iop(&self) -> &'a CompiledIop {
		self.iop
	}

	pub fn round(&self) -> usize {
		self.round
	}

	fn start_round(&mut self, round: usize) {
		self.round = round;
		for coin in self.iop.coins().in_round(round) {
			self.coins[coin.id().index()] = Some(sample_coin(&mut self.transcript, coin.kind()));
		}
	}

	fn end_round(&mut self) -> Result<(), Error> {
		let iop = self.iop;
		let proof = self.proof;
		for info in iop.columns().committed_in_round(self.round) {
			observe_column(&mut self.transcript, &proof.columns[&info.id()]);
		}
		for info in iop.queries().with_params_in_round(self.round) {
			let Some(params) = proof.params.get(&info.id()) else {
				bail!(Error::MissingQueryParams {
					name: info.name().clone(),
				});
			};
			observe_params(&mut self.transcript, params);
		}
		Ok(())
	}

	/// The revealed values of a column as read through its shift.
	pub fn get_assignment(&self, column: Column) -> Result<ColumnValues, Error> {
		let values = self.column_values(column.id())?;
		Ok(values.rotated(column.shift()))
	}

	pub fn coin(&self, id: CoinId) -> Result<E, Error> {
		self.coin_value(id)
	}

	pub fn params(&self, id: QueryId) -> Result<&'a QueryParams, Error> {
		self.proof
			.params
			.get(&id)
			.ok_or_else(|| Error::MissingQueryParams {
				name: self.iop.queries().get(id).name().clone(),
			})
	}

	fn params_mismatch(&self, id: QueryId, expected: &'static str) -> Error {
		Error::QueryParamsKindMismatch {
			name: self.iop.queries().get(id).name().clone(),
			kind: expected,
		}
	}

	pub fn get_horner_params(&self, id: QueryId) -> Result<&'a HornerParams, Error> {
		match self.params(id)? {
			QueryParams::Horner(params) => Ok(params),
			_ => Err(self.params_mismatch(id, "horner")),
		}
	}

	pub fn get_log_deriv_sum_params(&self, id: QueryId) -> Result<E, Error> {
		match self.params(id)? {
			QueryParams::LogDerivativeSum(sum) => Ok(*sum),
			_ => Err(self.params_mismatch(id, "log-derivative sum")),
		}
	}

	pub fn get_local_opening(&self, id: QueryId) -> Result<E, Error> {
		match self.params(id)? {
			QueryParams::LocalOpening(y) => Ok(*y),
			_ => Err(self.params_mismatch(id, "local opening")),
		}
	}

	pub fn get_inner_product(&self, id: QueryId) -> Result<&'a [E], Error> {
		match self.params(id)? {
			QueryParams::InnerProduct(ys) => Ok(ys),
			_ => Err(self.params_mismatch(id, "inner product")),
		}
	}
}

impl EvalContext for VerifierRuntime<'_> {
	fn column_values(&self, id: ColumnId) -> Result<&ColumnValues, Error> {
		let info = self.iop.columns().get(id);
		match info.kind() {
			ColumnKind::Constant(values) => Ok(values),
			ColumnKind::Committed => {
				self.proof
					.columns
					.get(&id)
					.ok_or_else(|| Error::MissingColumn {
						name: info.name().clone(),
					})
			}
		}
	}

	fn coin_value(&self, id: CoinId) -> Result<E, Error> {
		self.coins[id.index()].ok_or_else(|| Error::CoinNotSampled {
			name: self.iop.coins().get(id).name().clone(),
		})
	}
}
