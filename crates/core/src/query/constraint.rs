// Copyright 2025 Irreducible Inc.

use quill_field::Field;
use quill_utils::bail;

use crate::{
	column::{Column, ColumnSet},
	error::{Error, VerificationError},
	expr::{EvalContext, Expr},
	types::E,
};

/// A polynomial identity that must vanish on every row.
///
/// Rows on which a shifted column would wrap around the end of its column are
/// exempt from the constraint.
#[derive(Debug, Clone)]
pub struct GlobalConstraint {
	pub expr: Expr,
	pub size: usize,
}

impl GlobalConstraint {
	pub fn new(expr: Expr, columns: &ColumnSet) -> Self {
		let size = expr
			.size(columns)
			.unwrap_or_else(|| panic!("a global constraint must reference at least one column"));
		Self { expr, size }
	}

	/// The rows on which the constraint is enforced.
	pub fn domain(&self) -> std::ops::Range<usize> {
		let (min_shift, max_shift) = self.expr.shift_range();
		let start = (-min_shift).max(0) as usize;
		let end = self.size.saturating_sub(max_shift.max(0) as usize);
		start..end.max(start)
	}

	pub fn check<C: EvalContext + ?Sized>(&self, name: &str, ctx: &C) -> Result<(), Error> {
		let values = self.expr.evaluate(ctx, self.size)?;
		if let Some(row) = self.domain().find(|&row| !values.get_ext(row).is_zero()) {
			bail!(VerificationError::GlobalConstraintUnsatisfied {
				name: name.to_string(),
				row,
			});
		}
		Ok(())
	}
}

/// A polynomial identity checked at row 0 only. Shifted columns wrap around,
/// so `shift(column, -1)` reads the last row.
#[derive(Debug, Clone)]
pub struct LocalConstraint {
	pub expr: Expr,
}

impl LocalConstraint {
	pub fn check<C: EvalContext + ?Sized>(&self, name: &str, ctx: &C) -> Result<(), Error> {
		let value = self.expr.evaluate_at(ctx, 0)?;
		if !value.is_zero() {
			bail!(VerificationError::LocalConstraintUnsatisfied {
				name: name.to_string(),
				value,
			});
		}
		Ok(())
	}
}

/// Exposes the value of a (possibly shifted) column at row 0.
#[derive(Debug, Clone)]
pub struct LocalOpening {
	pub column: Column,
}

impl LocalOpening {
	pub fn open<C: EvalContext + ?Sized>(&self, ctx: &C) -> Result<E, Error> {
		Expr::from(self.column).evaluate_at(ctx, 0)
	}

	pub fn check<C: EvalContext + ?Sized>(
		&self,
		name: &str,
		ctx: &C,
		claimed: E,
	) -> Result<(), Error> {
		let actual = self.open(ctx)?;
		if actual != claimed {
			bail!(VerificationError::LocalOpeningMismatch {
				name: name.to_string(),
				claimed,
				actual,
			});
		}
		Ok(())
	}
}
