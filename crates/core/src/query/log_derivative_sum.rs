// Copyright 2025 Irreducible Inc.

use std::collections::BTreeMap;

use quill_utils::bail;
use rayon::prelude::*;

use crate::{
	coin::CoinId,
	column::{Column, ColumnSet},
	error::{Error, VerificationError},
	expr::{EvalContext, Expr},
	protocols::logderivativesum::log_derivative_terms,
	types::E,
};

/// A `numerator / denominator` term summed over all rows. A missing numerator
/// stands for the constant one.
#[derive(Debug, Clone)]
pub struct LogDerivativeSumPart {
	pub numerator: Option<Expr>,
	pub denominator: Expr,
}

impl LogDerivativeSumPart {
	pub fn new(numerator: impl Into<Expr>, denominator: impl Into<Expr>) -> Self {
		Self {
			numerator: Some(numerator.into()),
			denominator: denominator.into(),
		}
	}

	pub fn unit(denominator: impl Into<Expr>) -> Self {
		Self {
			numerator: None,
			denominator: denominator.into(),
		}
	}
}

/// Claims `Σ_parts Σ_rows numerator[row] / denominator[row] = Sum`. Parts are
/// grouped by their row count.
#[derive(Debug, Clone, Default)]
pub struct LogDerivativeSum {
	pub inputs: BTreeMap<usize, Vec<LogDerivativeSumPart>>,
}

impl LogDerivativeSum {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, size: usize, part: LogDerivativeSumPart) {
		self.inputs.entry(size).or_default().push(part);
	}

	pub fn num_parts(&self) -> usize {
		self.inputs.values().map(Vec::len).sum()
	}

	fn exprs(&self) -> impl Iterator<Item = &Expr> {
		self.inputs
			.values()
			.flatten()
			.flat_map(|part| part.numerator.iter().chain([&part.denominator]))
	}

	pub fn columns(&self) -> Vec<Column> {
		self.exprs().flat_map(Expr::columns).collect()
	}

	pub fn coins(&self) -> Vec<CoinId> {
		self.exprs().flat_map(Expr::coins).collect()
	}

	pub(crate) fn validate(&self, columns: &ColumnSet) {
		assert!(self.num_parts() > 0, "a log-derivative sum needs at least one part");
		for (&size, parts) in &self.inputs {
			for part in parts {
				for expr in part.numerator.iter().chain([&part.denominator]) {
					if let Some(expr_size) = expr.size(columns) {
						assert_eq!(expr_size, size, "log-derivative sum part filed under the wrong size");
					}
				}
			}
		}
	}

	/// Computes the sum directly from the assignments.
	pub fn compute<C: EvalContext + ?Sized>(&self, ctx: &C) -> Result<E, Error> {
		let parts = self
			.inputs
			.iter()
			.flat_map(|(&size, parts)| parts.iter().map(move |part| (size, part)))
			.collect::<Vec<_>>();
		let partial_sums = parts
			.par_iter()
			.map(|&(size, part)| log_derivative_terms(ctx, size, part).map(|terms| terms.sum()))
			.collect::<Vec<_>>();
		partial_sums.into_iter().sum()
	}

	pub fn check<C: EvalContext + ?Sized>(
		&self,
		name: &str,
		ctx: &C,
		claimed: E,
	) -> Result<(), Error> {
		let recomputed = self.compute(ctx)?;
		if recomputed != claimed {
			bail!(VerificationError::LogDerivativeSumMismatch {
				query: name.to_string(),
				claimed,
				recomputed,
			});
		}
		Ok(())
	}
}
