// Copyright 2025 Irreducible Inc.

use std::collections::HashMap;

use quill_utils::{bail, ensure};
use tracing::instrument;

use crate::{
	coin::CoinId,
	column::{Column, ColumnId, ColumnKind, ColumnValues},
	error::Error,
	expr::{EvalContext, Expr},
	fiat_shamir::{observe_column, observe_params, sample_coin, Transcript},
	iop::CompiledIop,
	query::{HornerParams, Query, QueryId, QueryParams},
	types::E,
};

/// Everything the prover sends: the committed columns in the clear, standing in
/// for their commitments, and the parameters of every query.
#[derive(Debug, Clone, Default)]
pub struct Proof {
	pub columns: HashMap<ColumnId, ColumnValues>,
	pub params: HashMap<QueryId, QueryParams>,
}

/// Prover state while running an IOP round by round.
pub struct ProverRuntime<'a> {
	iop: &'a CompiledIop,
	round: usize,
	columns: Vec<Option<ColumnValues>>,
	coins: Vec<Option<E>>,
	params: Vec<Option<QueryParams>>,
	transcript: Transcript,
}

/// Runs the prover. `witness` assigns the round-0 columns; later rounds are
/// driven by the registered prover actions.
#[instrument(skip_all, name = "iop::prove", level = "debug")]
pub fn prove(
	iop: &CompiledIop,
	witness: impl FnOnce(&mut ProverRuntime<'_>) -> Result<(), Error>,
) -> Result<Proof, Error> {
	let mut run = ProverRuntime::new(iop);
	let mut witness = Some(witness);
	for round in 0..iop.num_rounds() {
		run.start_round(round);
		if let Some(witness) = witness.take() {
			witness(&mut run)?;
		}
		for action in iop.prover_actions(round) {
			action.run(&mut run)?;
		}
		run.end_round()?;
	}
	Ok(run.into_proof())
}

impl<'a> ProverRuntime<'a> {
	fn new(iop: &'a CompiledIop) -> Self {
		Self {
			iop,
			round: 0,
			columns: vec![None; iop.columns().len()],
			coins: vec![None; iop.coins().len()],
			params: vec![None; iop.queries().len()],
			transcript: Transcript::default(),
		}
	}

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
		tracing::debug!(round, "prover round started");
	}

	/// Checks the round is complete and binds its messages into the transcript.
	fn end_round(&mut self) -> Result<(), Error> {
		let iop = self.iop;
		for info in iop.columns().committed_in_round(self.round) {
			let Some(values) = &self.columns[info.id().index()] else {
				bail!(Error::MissingColumn {
					name: info.name().clone(),
				});
			};
			observe_column(&mut self.transcript, values);
		}
		for info in iop.queries().with_params_in_round(self.round) {
			let Some(params) = &self.params[info.id().index()] else {
				bail!(Error::MissingQueryParams {
					name: info.name().clone(),
				});
			};
			observe_params(&mut self.transcript, params);
		}
		Ok(())
	}

	fn into_proof(self) -> Proof {
		let columns = self
			.iop
			.columns()
			.iter()
			.filter(|info| info.is_committed())
			.filter_map(|info| {
				self.columns[info.id().index()]
					.clone()
					.map(|values| (info.id(), values))
			})
			.collect();
		let params = self
			.params
			.into_iter()
			.enumerate()
			.filter_map(|(index, params)| params.map(|params| (QueryId(index), params)))
			.collect();
		Proof { columns, params }
	}

	/// Assigns a committed column of the current round.
	pub fn assign_column(
		&mut self,
		column: Column,
		values: impl Into<ColumnValues>,
	) -> Result<(), Error> {
		assert_eq!(column.shift(), 0, "shifted columns cannot be assigned");
		let values = values.into();
		let info = self.iop.columns().get(column.id());
		ensure!(
			info.is_committed(),
			Error::NotCommitted {
				name: info.name().clone(),
			}
		);
		ensure!(
			info.round() == self.round,
			Error::WrongRound {
				name: info.name().clone(),
				column_round: info.round(),
				current: self.round,
			}
		);
		ensure!(
			values.len() == info.size(),
			Error::ColumnSizeMismatch {
				name: info.name().clone(),
				expected: info.size(),
				got: values.len(),
			}
		);
		let slot = &mut self.columns[column.id().index()];
		ensure!(
			slot.is_none(),
			Error::ColumnAlreadyAssigned {
				name: info.name().clone(),
			}
		);
		*slot = Some(values);
		Ok(())
	}

	/// The assignment of a column as read through its shift.
	pub fn get_assignment(&self, column: Column) -> Result<ColumnValues, Error> {
		let values = self.column_values(column.id())?;
		Ok(if column.shift() == 0 {
			values.clone()
		} else {
			values.rotated(column.shift())
		})
	}

	pub fn coin(&self, id: CoinId) -> Result<E, Error> {
		self.coin_value(id)
	}

	pub fn coin_by_name(&self, name: &str) -> Result<E, Error> {
		let id = self
			.iop
			.coins()
			.by_name(name)
			.ok_or_else(|| Error::CoinNotSampled {
				name: name.to_string(),
			})?;
		self.coin_value(id)
	}

	/// Evaluates an expression over `size` rows.
	pub fn eval_expr(&self, expr: &Expr, size: usize) -> Result<ColumnValues, Error> {
		expr.evaluate(self, size)
	}

	pub fn params(&self, id: QueryId) -> Result<&QueryParams, Error> {
		self.params[id.index()]
			.as_ref()
			.ok_or_else(|| Error::MissingQueryParams {
				name: self.iop.queries().get(id).name().clone(),
			})
	}

	pub fn assign_params(&mut self, id: QueryId, params: QueryParams) -> Result<(), Error> {
		let info = self.iop.queries().get(id);
		ensure!(
			params.fits(info.query()),
			Error::QueryParamsKindMismatch {
				name: info.name().clone(),
				kind: params.kind_name(),
			}
		);
		ensure!(
			info.round() == self.round,
			Error::WrongRound {
				name: info.name().clone(),
				column_round: info.round(),
				current: self.round,
			}
		);
		let slot = &mut self.params[id.index()];
		ensure!(
			slot.is_none(),
			Error::QueryParamsAlreadyAssigned {
				name: info.name().clone(),
			}
		);
		*slot = Some(params);
		Ok(())
	}

	pub fn assign_local_opening(&mut self, id: QueryId, y: E) -> Result<(), Error> {
		self.assign_params(id, QueryParams::LocalOpening(y))
	}

	pub fn assign_log_deriv_sum(&mut self, id: QueryId, claimed_sum: E) -> Result<(), Error> {
		self.assign_params(id, QueryParams::LogDerivativeSum(claimed_sum))
	}

	pub fn assign_inner_product(&mut self, id: QueryId, ys: Vec<E>) -> Result<(), Error> {
		self.assign_params(id, QueryParams::InnerProduct(ys))
	}

	/// Computes `N1` and the final result of a Horner query from the per-part
	/// `N0` values and assigns them.
	pub fn assign_horner_params(
		&mut self,
		id: QueryId,
		n0s: &[usize],
	) -> Result<HornerParams, Error> {
		let info = self.iop.queries().get(id);
		let Query::Horner(horner) = info.query() else {
			bail!(Error::QueryParamsKindMismatch {
				name: info.name().clone(),
				kind: "horner",
			});
		};
		let params = horner.compute_params(self, n0s)?;
		self.assign_params(id, QueryParams::Horner(params.clone()))?;
		Ok(params)
	}

	pub fn get_horner_params(&self, id: QueryId) -> Result<&HornerParams, Error> {
		match self.params(id)? {
			QueryParams::Horner(params) => Ok(params),
			other => Err(Error::QueryParamsKindMismatch {
				name: self.iop.queries().get(id).name().clone(),
				kind: other.kind_name(),
			}),
		}
	}
}

impl EvalContext for ProverRuntime<'_> {
	fn column_values(&self, id: ColumnId) -> Result<&ColumnValues, Error> {
		let info = self.iop.columns().get(id);
		match info.kind() {
			ColumnKind::Constant(values) => Ok(values),
			ColumnKind::Committed => {
				self.columns[id.index()]
					.as_ref()
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
