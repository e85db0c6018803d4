// Copyright 2025 Irreducible Inc.

//! Column handles, column metadata and column assignments.

mod set;
mod values;

pub use set::*;
pub use values::*;

/// Index of a column in the [`ColumnSet`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnId(pub(crate) usize);

impl ColumnId {
	pub fn index(&self) -> usize {
		self.0
	}
}

/// A (possibly shifted) reference to a column.
///
/// Reading a shifted column at `row` returns the underlying value at
/// `(row + shift) mod size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Column {
	id: ColumnId,
	shift: isize,
}

impl Column {
	pub(crate) fn new(id: ColumnId) -> Self {
		Self { id, shift: 0 }
	}

	pub fn id(&self) -> ColumnId {
		self.id
	}

	pub fn shift(&self) -> isize {
		self.shift
	}

	/// Returns the same column shifted by an additional `offset` rows.
	pub fn shifted(self, offset: isize) -> Self {
		Self {
			id: self.id,
			shift: self.shift + offset,
		}
	}

	/// Position in the underlying column read by this handle at `row`.
	pub fn read_index(&self, row: usize, size: usize) -> usize {
		(row as isize + self.shift).rem_euclid(size as isize) as usize
	}
}

impl From<Column> for ColumnId {
	fn from(column: Column) -> Self {
		column.id
	}
}

/// Shifts `column` by `offset` rows.
pub fn shift(column: Column, offset: isize) -> Column {
	column.shifted(offset)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_shift_composes() {
		let column = Column::new(ColumnId(3));
		let shifted = shift(shift(column, -1), 3);
		assert_eq!(shifted.shift(), 2);
		assert_eq!(shifted.id(), column.id());
		assert_eq!(shifted.read_index(7, 8), 1);
		assert_eq!(shift(column, -1).read_index(0, 8), 7);
	}
}
