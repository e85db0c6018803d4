// Copyright 2025 Irreducible Inc.

//! The closed set of queries an IOP can carry.
//!
//! Compiler passes reduce high-level queries (inclusions, projections, Horner
//! evaluations, log-derivative sums) into lower level ones and mark the reduced
//! query as [`QueryStatus::Ignored`]. The queries still active after the last pass
//! are checked directly by the verifier.

mod constraint;
mod horner;
mod inclusion;
mod inner_product;
mod log_derivative_sum;
mod projection;

use std::collections::HashMap;

pub use constraint::*;
use getset::{CopyGetters, Getters};
pub use horner::*;
pub use inclusion::*;
pub use inner_product::*;
pub use log_derivative_sum::*;
pub use projection::*;

use crate::{coin::CoinId, column::Column, types::E};

/// Index of a query in the [`QuerySet`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueryId(pub(crate) usize);

impl QueryId {
	pub fn index(&self) -> usize {
		self.0
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
	Active,
	/// Compiled away into lower level queries and actions.
	Ignored,
}

#[derive(Debug, Clone)]
pub enum Query {
	Inclusion(Inclusion),
	Projection(Projection),
	Horner(Horner),
	LogDerivativeSum(LogDerivativeSum),
	Global(GlobalConstraint),
	Local(LocalConstraint),
	LocalOpening(LocalOpening),
	InnerProduct(InnerProduct),
}

impl Query {
	pub fn kind_name(&self) -> &'static str {
		match self {
			Self::Inclusion(_) => "inclusion",
			Self::Projection(_) => "projection",
			Self::Horner(_) => "horner",
			Self::LogDerivativeSum(_) => "log-derivative sum",
			Self::Global(_) => "global constraint",
			Self::Local(_) => "local constraint",
			Self::LocalOpening(_) => "local opening",
			Self::InnerProduct(_) => "inner product",
		}
	}

	/// Whether the prover must assign [`QueryParams`] for this query.
	pub fn has_params(&self) -> bool {
		matches!(
			self,
			Self::Horner(_) | Self::LogDerivativeSum(_) | Self::LocalOpening(_) | Self::InnerProduct(_)
		)
	}

	pub fn columns(&self) -> Vec<Column> {
		match self {
			Self::Inclusion(q) => q.columns(),
			Self::Projection(q) => q.columns(),
			Self::Horner(q) => q.columns(),
			Self::LogDerivativeSum(q) => q.columns(),
			Self::Global(q) => q.expr.columns(),
			Self::Local(q) => q.expr.columns(),
			Self::LocalOpening(q) => vec![q.column],
			Self::InnerProduct(q) => q.columns(),
		}
	}

	pub fn coins(&self) -> Vec<CoinId> {
		match self {
			Self::Horner(q) => q.coins(),
			Self::LogDerivativeSum(q) => q.coins(),
			Self::Global(q) => q.expr.coins(),
			Self::Local(q) => q.expr.coins(),
			Self::Inclusion(_) | Self::Projection(_) | Self::LocalOpening(_) | Self::InnerProduct(_) => {
				Vec::new()
			}
		}
	}
}

#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct QueryInfo {
	#[get_copy = "pub"]
	id: QueryId,
	#[get = "pub"]
	name: String,
	#[get_copy = "pub"]
	round: usize,
	#[get = "pub"]
	query: Query,
	#[get_copy = "pub"]
	status: QueryStatus,
}

impl QueryInfo {
	pub fn is_active(&self) -> bool {
		self.status == QueryStatus::Active
	}
}

/// Arena of the queries of an IOP.
#[derive(Debug, Default, Clone)]
pub struct QuerySet {
	queries: Vec<QueryInfo>,
	by_name: HashMap<String, QueryId>,
}

impl QuerySet {
	pub(crate) fn insert(&mut self, round: usize, name: impl ToString, query: Query) -> QueryId {
		let name = name.to_string();
		assert!(!name.is_empty(), "query names must not be empty");
		assert!(!self.by_name.contains_key(&name), "query {name} is already registered");
		let id = QueryId(self.queries.len());
		self.by_name.insert(name.clone(), id);
		self.queries.push(QueryInfo {
			id,
			name,
			round,
			query,
			status: QueryStatus::Active,
		});
		id
	}

	pub fn get(&self, id: QueryId) -> &QueryInfo {
		&self.queries[id.0]
	}

	pub fn by_name(&self, name: &str) -> Option<QueryId> {
		self.by_name.get(name).copied()
	}

	/// Marks a query as compiled away.
	pub fn ignore(&mut self, id: QueryId) {
		self.queries[id.0].status = QueryStatus::Ignored;
	}

	pub fn len(&self) -> usize {
		self.queries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.queries.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &QueryInfo> {
		self.queries.iter()
	}

	pub fn active(&self) -> impl Iterator<Item = &QueryInfo> {
		self.queries.iter().filter(|info| info.is_active())
	}

	/// Queries of the given round whose parameters are bound into the transcript.
	pub fn with_params_in_round(&self, round: usize) -> impl Iterator<Item = &QueryInfo> {
		self.queries
			.iter()
			.filter(move |info| info.round == round && info.query.has_params())
	}

	pub fn max_round(&self) -> Option<usize> {
		self.queries.iter().map(|info| info.round).max()
	}
}

/// Values the prover attaches to a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParams {
	LocalOpening(E),
	LogDerivativeSum(E),
	Horner(HornerParams),
	InnerProduct(Vec<E>),
}

impl QueryParams {
	pub fn kind_name(&self) -> &'static str {
		match self {
			Self::LocalOpening(_) => "local opening",
			Self::LogDerivativeSum(_) => "log-derivative sum",
			Self::Horner(_) => "horner",
			Self::InnerProduct(_) => "inner product",
		}
	}

	/// Whether these parameters have the shape `query` expects.
	pub fn fits(&self, query: &Query) -> bool {
		matches!(
			(self, query),
			(Self::LocalOpening(_), Query::LocalOpening(_))
				| (Self::LogDerivativeSum(_), Query::LogDerivativeSum(_))
				| (Self::Horner(_), Query::Horner(_))
				| (Self::InnerProduct(_), Query::InnerProduct(_))
		)
	}
}
