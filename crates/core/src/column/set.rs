// Copyright 2025 Irreducible Inc.

use std::collections::HashMap;

use getset::{CopyGetters, Getters};

use super::{Column, ColumnId, ColumnValues};
use crate::types::B;

#[derive(Debug, Clone)]
pub enum ColumnKind {
	/// Assigned by the prover during its round and bound into the transcript.
	Committed,
	/// Known to both parties from the IOP description.
	Constant(ColumnValues),
}

/// Metadata about a column registered in a [`ColumnSet`].
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct ColumnInfo {
	#[get_copy = "pub"]
	id: ColumnId,
	#[get = "pub"]
	name: String,
	#[get_copy = "pub"]
	size: usize,
	#[get_copy = "pub"]
	round: usize,
	#[get = "pub"]
	kind: ColumnKind,
}

impl ColumnInfo {
	pub fn is_committed(&self) -> bool {
		matches!(self.kind, ColumnKind::Committed)
	}
}

/// Arena of every column of an IOP, addressed by [`ColumnId`].
#[derive(Debug, Default, Clone)]
pub struct ColumnSet {
	columns: Vec<ColumnInfo>,
	by_name: HashMap<String, ColumnId>,
}

impl ColumnSet {
	pub fn insert_committed(&mut self, round: usize, name: impl ToString, size: usize) -> Column {
		let name = name.to_string();
		assert!(!name.is_empty(), "column names must not be empty");
		assert!(size > 0, "column {name} must have a positive size");
		self.push(name, size, round, ColumnKind::Committed)
	}

	/// Registers a column whose values are public. Inserting a constant column
	/// twice under the same name returns the existing handle.
	pub fn insert_constant(&mut self, name: impl ToString, values: ColumnValues) -> Column {
		let name = name.to_string();
		if let Some(&id) = self.by_name.get(&name) {
			let existing = &self.columns[id.0];
			assert!(
				matches!(&existing.kind, ColumnKind::Constant(v) if *v == values),
				"column {name} is already registered with different content"
			);
			return Column::new(id);
		}
		assert!(!values.is_empty(), "constant column {name} must not be empty");
		self.push(name, values.len(), 0, ColumnKind::Constant(values))
	}

	/// The all-ones constant column of the given size.
	pub fn constant_one(&mut self, size: usize) -> Column {
		self.insert_constant(format!("CONSTANT_ONE_{size}"), ColumnValues::constant(B::from(1u32), size))
	}

	fn push(&mut self, name: String, size: usize, round: usize, kind: ColumnKind) -> Column {
		assert!(!self.by_name.contains_key(&name), "column {name} is already registered");
		let id = ColumnId(self.columns.len());
		self.by_name.insert(name.clone(), id);
		self.columns.push(ColumnInfo {
			id,
			name,
			size,
			round,
			kind,
		});
		Column::new(id)
	}

	pub fn get(&self, id: ColumnId) -> &ColumnInfo {
		&self.columns[id.0]
	}

	pub fn name(&self, id: ColumnId) -> &str {
		&self.columns[id.0].name
	}

	pub fn size(&self, id: ColumnId) -> usize {
		self.columns[id.0].size
	}

	pub fn by_name(&self, name: &str) -> Option<Column> {
		self.by_name.get(name).map(|&id| Column::new(id))
	}

	pub fn len(&self) -> usize {
		self.columns.len()
	}

	pub fn is_empty(&self) -> bool {
		self.columns.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &ColumnInfo> {
		self.columns.iter()
	}

	/// Committed columns of the given round, in registration order.
	pub fn committed_in_round(&self, round: usize) -> impl Iterator<Item = &ColumnInfo> {
		self.columns
			.iter()
			.filter(move |info| info.is_committed() && info.round == round)
	}

	pub fn max_round(&self) -> Option<usize> {
		self.columns
			.iter()
			.filter(|info| info.is_committed())
			.map(|info| info.round)
			.max()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_constant_columns_are_deduplicated() {
		let mut set = ColumnSet::default();
		let a = set.constant_one(4);
		let b = set.constant_one(4);
		let c = set.constant_one(8);
		assert_eq!(a, b);
		assert_ne!(a, c);
		assert_eq!(set.size(c.id()), 8);
	}

	#[test]
	#[should_panic(expected = "already registered")]
	fn test_duplicate_committed_name_panics() {
		let mut set = ColumnSet::default();
		set.insert_committed(0, "A", 4);
		set.insert_committed(1, "A", 4);
	}

	#[test]
	fn test_committed_in_round() {
		let mut set = ColumnSet::default();
		set.insert_committed(0, "A", 4);
		set.insert_committed(1, "B", 4);
		set.constant_one(4);
		let names = set
			.committed_in_round(1)
			.map(|info| info.name().clone())
			.collect::<Vec<_>>();
		assert_eq!(names, vec!["B".to_string()]);
		assert_eq!(set.max_round(), Some(1));
	}
}
