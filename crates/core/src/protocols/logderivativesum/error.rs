// Copyright 2025 Irreducible Inc.

use itertools::Itertools;

use crate::types::E;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	#[error(
		"value ({}) of {checked} at row {row} is not included in table {table}",
		.values.iter().join(", ")
	)]
	ValueNotInTable {
		table: String,
		checked: String,
		row: usize,
		values: Vec<E>,
	},
	#[error("the filter column {column} has a non-binary value {value} at row {row}")]
	NonBinaryFilter { column: String, row: usize, value: E },
	#[error("a denominator of size {size} vanishes at row {row}")]
	ZeroDenominator { size: usize, row: usize },
}
