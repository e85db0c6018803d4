// Copyright 2025 Irreducible Inc.

//! The description of an interactive oracle proof: its columns, coins, queries
//! and the prover/verifier actions scheduled on every round.

use std::fmt;

use getset::Getters;

use crate::{
	coin::{CoinId, CoinKind, CoinSet},
	column::{Column, ColumnSet, ColumnValues},
	error::Error,
	expr::Expr,
	prover::ProverRuntime,
	query::{
		GlobalConstraint, Horner, HornerPart, Inclusion, InnerProduct, LocalConstraint,
		LocalOpening, LogDerivativeSum, Projection, Query, QueryId, QuerySet,
	},
	verifier::VerifierRuntime,
};

/// Work the prover performs at a given round, typically assigning columns and
/// query parameters.
pub trait ProverAction: Send + Sync {
	fn run(&self, run: &mut ProverRuntime<'_>) -> Result<(), Error>;
}

/// A check the verifier performs at a given round.
pub trait VerifierAction: Send + Sync {
	fn run(&self, run: &VerifierRuntime<'_>) -> Result<(), Error>;
}

struct FnProverAction<F>(F);

impl<F> ProverAction for FnProverAction<F>
where
	F: Fn(&mut ProverRuntime<'_>) -> Result<(), Error> + Send + Sync,
{
	fn run(&self, run: &mut ProverRuntime<'_>) -> Result<(), Error> {
		(self.0)(run)
	}
}

struct FnVerifierAction<F>(F);

impl<F> VerifierAction for FnVerifierAction<F>
where
	F: Fn(&VerifierRuntime<'_>) -> Result<(), Error> + Send + Sync,
{
	fn run(&self, run: &VerifierRuntime<'_>) -> Result<(), Error> {
		(self.0)(run)
	}
}

/// A compiler pass rewriting an IOP in place.
pub type CompilerPass<'a> = &'a dyn Fn(&mut CompiledIop);

#[derive(Default, Getters)]
pub struct CompiledIop {
	#[get = "pub"]
	columns: ColumnSet,
	#[get = "pub"]
	coins: CoinSet,
	#[get = "pub"]
	queries: QuerySet,
	prover_actions: Vec<Vec<Box<dyn ProverAction>>>,
	verifier_actions: Vec<Vec<Box<dyn VerifierAction>>>,
}

impl fmt::Debug for CompiledIop {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CompiledIop")
			.field("columns", &self.columns.len())
			.field("coins", &self.coins.len())
			.field("queries", &self.queries.len())
			.field("num_rounds", &self.num_rounds())
			.finish()
	}
}

/// Builds an IOP with `define` and runs every pass over it in order.
pub fn compile(define: impl FnOnce(&mut CompiledIop), passes: &[CompilerPass<'_>]) -> CompiledIop {
	let mut iop = CompiledIop::default();
	define(&mut iop);
	for pass in passes {
		pass(&mut iop);
	}
	iop
}

impl CompiledIop {
	pub fn insert_commit(&mut self, round: usize, name: impl ToString, size: usize) -> Column {
		self.columns.insert_committed(round, name, size)
	}

	pub fn insert_constant_column(&mut self, name: impl ToString, values: ColumnValues) -> Column {
		self.columns.insert_constant(name, values)
	}

	/// The all-ones column of the given size.
	pub fn constant_one_column(&mut self, size: usize) -> Column {
		self.columns.constant_one(size)
	}

	pub fn insert_coin(&mut self, round: usize, name: impl ToString, kind: CoinKind) -> CoinId {
		self.coins.insert(round, name, kind)
	}

	pub fn insert_global(&mut self, round: usize, name: impl ToString, expr: Expr) -> QueryId {
		let query = GlobalConstraint::new(expr, &self.columns);
		self.insert_query(round, name, Query::Global(query))
	}

	pub fn insert_local(&mut self, round: usize, name: impl ToString, expr: Expr) -> QueryId {
		assert!(
			!expr.columns().is_empty(),
			"a local constraint must reference at least one column"
		);
		self.insert_query(round, name, Query::Local(LocalConstraint { expr }))
	}

	pub fn insert_local_opening(
		&mut self,
		round: usize,
		name: impl ToString,
		column: Column,
	) -> QueryId {
		self.insert_query(round, name, Query::LocalOpening(LocalOpening { column }))
	}

	pub fn insert_inner_product(
		&mut self,
		round: usize,
		name: impl ToString,
		a: Column,
		bs: Vec<Column>,
	) -> QueryId {
		let size = self.columns.size(a.id());
		for b in &bs {
			assert_eq!(self.columns.size(b.id()), size, "inner product operands differ in size");
		}
		self.insert_query(round, name, Query::InnerProduct(InnerProduct { a, bs, size }))
	}

	pub fn insert_inclusion(
		&mut self,
		round: usize,
		name: impl ToString,
		inclusion: Inclusion,
	) -> QueryId {
		inclusion.validate(&self.columns);
		self.insert_query(round, name, Query::Inclusion(inclusion))
	}

	pub fn insert_projection(
		&mut self,
		round: usize,
		name: impl ToString,
		projection: Projection,
	) -> QueryId {
		projection.validate(&self.columns);
		self.insert_query(round, name, Query::Projection(projection))
	}

	pub fn insert_horner(
		&mut self,
		round: usize,
		name: impl ToString,
		parts: Vec<HornerPart>,
	) -> QueryId {
		let horner = Horner::new(parts);
		horner.validate(&self.columns);
		self.insert_query(round, name, Query::Horner(horner))
	}

	pub fn insert_log_derivative_sum(
		&mut self,
		round: usize,
		name: impl ToString,
		sum: LogDerivativeSum,
	) -> QueryId {
		sum.validate(&self.columns);
		self.insert_query(round, name, Query::LogDerivativeSum(sum))
	}

	fn insert_query(&mut self, round: usize, name: impl ToString, query: Query) -> QueryId {
		let name = name.to_string();
		for column in query.columns() {
			let info = self.columns.get(column.id());
			assert!(
				info.round() <= round,
				"query {name} at round {round} references column {} of round {}",
				info.name(),
				info.round()
			);
		}
		for coin in query.coins() {
			let info = self.coins.get(coin);
			assert!(
				info.round() <= round,
				"query {name} at round {round} references coin {} of round {}",
				info.name(),
				info.round()
			);
		}
		self.queries.insert(round, name, query)
	}

	/// Marks a query as compiled away.
	pub fn ignore_query(&mut self, id: QueryId) {
		self.queries.ignore(id);
	}

	pub fn register_prover_action(&mut self, round: usize, action: impl ProverAction + 'static) {
		if self.prover_actions.len() <= round {
			self.prover_actions.resize_with(round + 1, Vec::new);
		}
		self.prover_actions[round].push(Box::new(action));
	}

	pub fn register_prover_fn<F>(&mut self, round: usize, action: F)
	where
		F: Fn(&mut ProverRuntime<'_>) -> Result<(), Error> + Send + Sync + 'static,
	{
		self.register_prover_action(round, FnProverAction(action));
	}

	pub fn register_verifier_action(
		&mut self,
		round: usize,
		action: impl VerifierAction + 'static,
	) {
		if self.verifier_actions.len() <= round {
			self.verifier_actions.resize_with(round + 1, Vec::new);
		}
		self.verifier_actions[round].push(Box::new(action));
	}

	pub fn register_verifier_fn<F>(&mut self, round: usize, action: F)
	where
		F: Fn(&VerifierRuntime<'_>) -> Result<(), Error> + Send + Sync + 'static,
	{
		self.register_verifier_action(round, FnVerifierAction(action));
	}

	pub(crate) fn prover_actions(&self, round: usize) -> &[Box<dyn ProverAction>] {
		self.prover_actions.get(round).map_or(&[], Vec::as_slice)
	}

	pub(crate) fn verifier_actions(&self, round: usize) -> &[Box<dyn VerifierAction>] {
		self.verifier_actions.get(round).map_or(&[], Vec::as_slice)
	}

	/// Number of rounds needed to run every registered item.
	pub fn num_rounds(&self) -> usize {
		[
			self.columns.max_round(),
			self.coins.max_round(),
			self.queries.max_round(),
			self.prover_actions.len().checked_sub(1),
			self.verifier_actions.len().checked_sub(1),
		]
		.into_iter()
		.flatten()
		.max()
		.map_or(1, |round| round + 1)
	}
}
