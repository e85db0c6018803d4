// Copyright 2025 Irreducible Inc.

use std::collections::HashSet;

use quill_field::Field;
use quill_utils::bail;

use crate::{
	column::{Column, ColumnSet, ColumnValues},
	error::{Error, VerificationError},
	expr::{EvalContext, Expr},
	types::E,
};

/// Asserts that every row of `included` (where its filter is set) appears among
/// the rows of `including` (where its filter is set).
///
/// The including side may be split into several fragments, each holding the same
/// number of columns as the included side.
#[derive(Debug, Clone)]
pub struct Inclusion {
	pub including: Vec<Vec<Column>>,
	pub included: Vec<Column>,
	pub including_filter: Option<Vec<Column>>,
	pub included_filter: Option<Column>,
}

impl Inclusion {
	pub fn new(including: Vec<Column>, included: Vec<Column>) -> Self {
		Self::fragmented(vec![including], included)
	}

	pub fn fragmented(including: Vec<Vec<Column>>, included: Vec<Column>) -> Self {
		Self {
			including,
			included,
			including_filter: None,
			included_filter: None,
		}
	}

	pub fn with_included_filter(mut self, filter: Column) -> Self {
		self.included_filter = Some(filter);
		self
	}

	/// Filters a single-fragment table.
	pub fn with_including_filter(self, filter: Column) -> Self {
		self.with_including_filters(vec![filter])
	}

	/// One filter per table fragment.
	pub fn with_including_filters(mut self, filters: Vec<Column>) -> Self {
		self.including_filter = Some(filters);
		self
	}

	pub fn columns(&self) -> Vec<Column> {
		self.including
			.iter()
			.flatten()
			.chain(&self.included)
			.chain(self.including_filter.iter().flatten())
			.chain(&self.included_filter)
			.copied()
			.collect()
	}

	/// Panics on malformed shapes.
	pub(crate) fn validate(&self, columns: &ColumnSet) {
		assert!(!self.included.is_empty(), "an inclusion needs at least one included column");
		assert!(!self.including.is_empty(), "an inclusion needs at least one table fragment");

		let included_size = uniform_size(columns, &self.included);
		if let Some(filter) = self.included_filter {
			assert_eq!(columns.size(filter.id()), included_size, "included filter has the wrong size");
		}

		for (frag, fragment) in self.including.iter().enumerate() {
			assert_eq!(
				fragment.len(),
				self.included.len(),
				"table fragment {frag} has {} columns, the included side has {}",
				fragment.len(),
				self.included.len()
			);
			let size = uniform_size(columns, fragment);
			if let Some(filters) = &self.including_filter {
				assert_eq!(filters.len(), self.including.len(), "one table filter per fragment is required");
				assert_eq!(columns.size(filters[frag].id()), size, "table filter has the wrong size");
			}
		}
	}

	/// Checks the inclusion directly against the column assignments.
	pub fn check<C: EvalContext + ?Sized>(&self, name: &str, ctx: &C) -> Result<(), Error> {
		let mut table = HashSet::new();
		for (frag, fragment) in self.including.iter().enumerate() {
			let filter = self
				.including_filter
				.as_ref()
				.map(|filters| read(ctx, filters[frag]))
				.transpose()?;
			let values = fragment
				.iter()
				.map(|&column| read(ctx, column))
				.collect::<Result<Vec<_>, _>>()?;
			for row in 0..values[0].len() {
				if filter.as_ref().is_some_and(|filter| filter.get_ext(row).is_zero()) {
					continue;
				}
				table.insert(values.iter().map(|col| col.get_ext(row)).collect::<Vec<E>>());
			}
		}

		let filter = self.included_filter.map(|filter| read(ctx, filter)).transpose()?;
		let values = self
			.included
			.iter()
			.map(|&column| read(ctx, column))
			.collect::<Result<Vec<_>, _>>()?;
		for row in 0..values[0].len() {
			if filter.as_ref().is_some_and(|filter| filter.get_ext(row).is_zero()) {
				continue;
			}
			let tuple = values.iter().map(|col| col.get_ext(row)).collect::<Vec<E>>();
			if !table.contains(&tuple) {
				bail!(VerificationError::InclusionUnsatisfied {
					name: name.to_string(),
					row,
				});
			}
		}
		Ok(())
	}
}

fn read<C: EvalContext + ?Sized>(ctx: &C, column: Column) -> Result<ColumnValues, Error> {
	let values = ctx.column_values(column.id())?;
	Expr::from(column).evaluate(ctx, values.len())
}

pub(crate) fn uniform_size(columns: &ColumnSet, group: &[Column]) -> usize {
	let size = columns.size(group[0].id());
	for column in group {
		assert_eq!(
			columns.size(column.id()),
			size,
			"column {} does not have the size of its group ({size})",
			columns.name(column.id())
		);
	}
	size
}
