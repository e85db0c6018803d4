// Copyright 2025 Irreducible Inc.

use quill_field::Field;
use quill_utils::{bail, ensure};

use super::inclusion::uniform_size;
use crate::{
	coin::{Accessor, CoinId},
	column::{Column, ColumnSet},
	error::{Error, VerificationError},
	expr::{EvalContext, Expr},
	protocols::horner::Error as HornerError,
	types::{B, E},
};

/// One part of a Horner query.
///
/// A part holds one or more `(coefficient, selector)` members sharing the
/// challenge `x`. The evaluated sequence visits the rows in order and, within a
/// row, the members in order; an element is kept when its selector is set.
#[derive(Debug, Clone)]
pub struct HornerPart {
	pub name: String,
	pub coefficients: Vec<Expr>,
	pub selectors: Vec<Column>,
	pub x: Accessor,
	pub sign_negative: bool,
	pub size: usize,
}

impl HornerPart {
	pub fn new(
		name: impl ToString,
		coefficient: impl Into<Expr>,
		selector: Column,
		x: impl Into<Accessor>,
		columns: &ColumnSet,
	) -> Self {
		Self {
			name: name.to_string(),
			coefficients: vec![coefficient.into()],
			selectors: vec![selector],
			x: x.into(),
			sign_negative: false,
			size: columns.size(selector.id()),
		}
	}

	/// Appends a member evaluated right after the existing ones on every row.
	pub fn with_member(mut self, coefficient: impl Into<Expr>, selector: Column) -> Self {
		self.coefficients.push(coefficient.into());
		self.selectors.push(selector);
		self
	}

	/// Makes the part contribute with a negative sign to the final result.
	pub fn negated(mut self) -> Self {
		self.sign_negative = !self.sign_negative;
		self
	}

	pub(crate) fn validate(&self, columns: &ColumnSet) {
		assert!(!self.coefficients.is_empty(), "horner part {} has no members", self.name);
		assert_eq!(
			self.coefficients.len(),
			self.selectors.len(),
			"horner part {} needs one selector per coefficient",
			self.name
		);
		assert_eq!(uniform_size(columns, &self.selectors), self.size);
		for coefficient in &self.coefficients {
			if let Some(size) = coefficient.size(columns) {
				assert_eq!(size, self.size, "horner part {} mixes sizes", self.name);
			}
		}
	}

	/// Evaluates the part from scratch. Returns `horner(0)` and the number of
	/// selected elements.
	pub fn evaluate<C: EvalContext + ?Sized>(&self, ctx: &C) -> Result<(E, usize), Error> {
		let x = self.x.value(ctx)?;
		let coefficients = self
			.coefficients
			.iter()
			.map(|coefficient| coefficient.evaluate(ctx, self.size))
			.collect::<Result<Vec<_>, _>>()?;
		let selectors = self
			.selectors
			.iter()
			.map(|&selector| Expr::from(selector).evaluate(ctx, self.size))
			.collect::<Result<Vec<_>, _>>()?;

		let mut acc = E::ZERO;
		let mut count = 0;
		for row in (0..self.size).rev() {
			for (member, (coefficient, selector)) in
				coefficients.iter().zip(&selectors).enumerate().rev()
			{
				match selector.get_base(row) {
					Some(value) if value == B::ONE => {
						acc = coefficient.get_ext(row) + x * acc;
						count += 1;
					}
					Some(value) if value.is_zero() => {}
					_ => {
						bail!(HornerError::SelectorNonBinary {
							part: self.name.clone(),
							member,
							row,
							value: selector.get_ext(row),
						});
					}
				}
			}
		}
		Ok((acc, count))
	}
}

/// A signed sum of Horner evaluations.
#[derive(Debug, Clone)]
pub struct Horner {
	pub parts: Vec<HornerPart>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HornerParamsPart {
	/// Number of elements preceding the part in the global sequence.
	pub n0: usize,
	/// `n0` plus the number of elements selected in the part.
	pub n1: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HornerParams {
	pub final_result: E,
	pub parts: Vec<HornerParamsPart>,
}

impl Horner {
	pub fn new(parts: Vec<HornerPart>) -> Self {
		Self { parts }
	}

	pub fn columns(&self) -> Vec<Column> {
		self.parts
			.iter()
			.flat_map(|part| {
				part.coefficients
					.iter()
					.flat_map(|c| c.columns())
					.chain(part.selectors.iter().copied())
			})
			.collect()
	}

	pub fn coins(&self) -> Vec<CoinId> {
		self.parts
			.iter()
			.flat_map(|part| {
				part.coefficients
					.iter()
					.flat_map(|c| c.coins())
					.chain(part.x.coin())
			})
			.collect()
	}

	pub(crate) fn validate(&self, columns: &ColumnSet) {
		assert!(!self.parts.is_empty(), "a horner query needs at least one part");
		for part in &self.parts {
			part.validate(columns);
		}
	}

	/// Computes `N1` for every part and the signed, `x^N0`-scaled final result.
	pub fn compute_params<C: EvalContext + ?Sized>(
		&self,
		ctx: &C,
		n0s: &[usize],
	) -> Result<HornerParams, Error> {
		ensure!(
			n0s.len() == self.parts.len(),
			HornerError::PartCountMismatch {
				expected: self.parts.len(),
				got: n0s.len(),
			}
		);

		let mut final_result = E::ZERO;
		let mut parts = Vec::with_capacity(self.parts.len());
		for (part, &n0) in self.parts.iter().zip(n0s) {
			let (horner, count) = part.evaluate(ctx)?;
			let contribution = part.x.value(ctx)?.pow([n0 as u64]) * horner;
			if part.sign_negative {
				final_result -= contribution;
			} else {
				final_result += contribution;
			}
			parts.push(HornerParamsPart { n0, n1: n0 + count });
		}
		Ok(HornerParams {
			final_result,
			parts,
		})
	}

	/// Recomputes the parameters from the assignments and compares them with the
	/// claimed ones.
	pub fn check<C: EvalContext + ?Sized>(
		&self,
		name: &str,
		ctx: &C,
		claimed: &HornerParams,
	) -> Result<(), Error> {
		let n0s = claimed.parts.iter().map(|part| part.n0).collect::<Vec<_>>();
		let recomputed = match self.compute_params(ctx, &n0s) {
			Ok(params) => params,
			Err(Error::Horner(HornerError::SelectorNonBinary {
				part, member, row, ..
			})) => {
				bail!(VerificationError::HornerSelectorNotBinary {
					query: name.to_string(),
					part,
					member,
					row,
				});
			}
			Err(err) => return Err(err),
		};
		for (index, (claimed, recomputed)) in claimed.parts.iter().zip(&recomputed.parts).enumerate() {
			if claimed.n1 != recomputed.n1 {
				bail!(VerificationError::HornerCountMismatch {
					query: name.to_string(),
					part: index,
					declared: E::from(B::from_u64(claimed.n1 as u64)) - E::from(B::from_u64(claimed.n0 as u64)),
					counted: E::from(B::from_u64((recomputed.n1 - recomputed.n0) as u64)),
				});
			}
		}
		if claimed.final_result != recomputed.final_result {
			bail!(VerificationError::HornerFinalResultMismatch {
				query: name.to_string(),
				claimed: claimed.final_result,
				recomputed: recomputed.final_result,
			});
		}
		Ok(())
	}
}
