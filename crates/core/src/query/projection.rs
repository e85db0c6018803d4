// Copyright 2025 Irreducible Inc.

use quill_field::Field;
use quill_utils::bail;

use super::inclusion::uniform_size;
use crate::{
	column::{Column, ColumnSet},
	error::{Error, VerificationError},
	expr::{EvalContext, Expr},
	types::E,
};

/// Asserts that the rows of `columns_a` selected by `filter_a` are, in order,
/// the rows of `columns_b` selected by `filter_b`.
#[derive(Debug, Clone)]
pub struct Projection {
	pub columns_a: Vec<Column>,
	pub columns_b: Vec<Column>,
	pub filter_a: Column,
	pub filter_b: Column,
}

impl Projection {
	pub fn new(
		columns_a: Vec<Column>,
		columns_b: Vec<Column>,
		filter_a: Column,
		filter_b: Column,
	) -> Self {
		Self {
			columns_a,
			columns_b,
			filter_a,
			filter_b,
		}
	}

	pub fn columns(&self) -> Vec<Column> {
		self.columns_a
			.iter()
			.chain(&self.columns_b)
			.chain([&self.filter_a, &self.filter_b])
			.copied()
			.collect()
	}

	pub fn size_a(&self, columns: &ColumnSet) -> usize {
		columns.size(self.filter_a.id())
	}

	pub fn size_b(&self, columns: &ColumnSet) -> usize {
		columns.size(self.filter_b.id())
	}

	pub(crate) fn validate(&self, columns: &ColumnSet) {
		assert!(!self.columns_a.is_empty(), "a projection needs at least one column per side");
		assert_eq!(
			self.columns_a.len(),
			self.columns_b.len(),
			"both sides of a projection must have the same number of columns"
		);
		let size_a = uniform_size(columns, &self.columns_a);
		let size_b = uniform_size(columns, &self.columns_b);
		assert_eq!(size_a, self.size_a(columns), "filter A has the wrong size");
		assert_eq!(size_b, self.size_b(columns), "filter B has the wrong size");
	}

	fn filtered_rows<C: EvalContext + ?Sized>(
		ctx: &C,
		name: &str,
		side: &'static str,
		columns: &[Column],
		filter: Column,
	) -> Result<Vec<Vec<E>>, Error> {
		let size = ctx.column_values(filter.id())?.len();
		let filter = Expr::from(filter).evaluate(ctx, size)?;
		let values = columns
			.iter()
			.map(|&column| Expr::from(column).evaluate(ctx, size))
			.collect::<Result<Vec<_>, _>>()?;

		let mut rows = Vec::new();
		for row in 0..size {
			let selected = filter.get_ext(row);
			if selected == E::ONE {
				rows.push(values.iter().map(|col| col.get_ext(row)).collect());
			} else if !selected.is_zero() {
				bail!(VerificationError::ProjectionFilterNotBinary {
					query: name.to_string(),
					side,
					row,
				});
			}
		}
		Ok(rows)
	}

	/// Compares the two filtered sequences directly.
	pub fn check<C: EvalContext + ?Sized>(&self, name: &str, ctx: &C) -> Result<(), Error> {
		let a = Self::filtered_rows(ctx, name, "A", &self.columns_a, self.filter_a)?;
		let b = Self::filtered_rows(ctx, name, "B", &self.columns_b, self.filter_b)?;
		if a.len() != b.len() {
			bail!(VerificationError::ProjectionLengthMismatch {
				query: name.to_string(),
				len_a: a.len(),
				len_b: b.len(),
			});
		}
		for (row_a, row_b) in a.iter().zip(&b) {
			if let Some((x, y)) = row_a.iter().zip(row_b).find(|(x, y)| x != y) {
				bail!(VerificationError::ProjectionMismatch {
					query: name.to_string(),
					difference: *x - *y,
				});
			}
		}
		Ok(())
	}
}
