// Copyright 2025 Irreducible Inc.

use quill_field::ExtensionField;
use rayon::prelude::*;

use crate::types::{B, E};

/// The assignment of a column: either base or extension field elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnValues {
	Base(Vec<B>),
	Ext(Vec<E>),
}

impl ColumnValues {
	/// Builds a base column from small integers.
	pub fn from_u64s(values: impl IntoIterator<Item = u64>) -> Self {
		Self::Base(values.into_iter().map(B::from_u64).collect())
	}

	pub fn constant(value: B, size: usize) -> Self {
		Self::Base(vec![value; size])
	}

	pub fn len(&self) -> usize {
		match self {
			Self::Base(values) => values.len(),
			Self::Ext(values) => values.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn is_base(&self) -> bool {
		matches!(self, Self::Base(_))
	}

	pub fn as_base(&self) -> Option<&[B]> {
		match self {
			Self::Base(values) => Some(values),
			Self::Ext(_) => None,
		}
	}

	/// Value at `index`, lifted to the extension field.
	pub fn get_ext(&self, index: usize) -> E {
		match self {
			Self::Base(values) => values[index].into(),
			Self::Ext(values) => values[index],
		}
	}

	/// Value at `index` when it lies in the base field.
	pub fn get_base(&self, index: usize) -> Option<B> {
		match self {
			Self::Base(values) => Some(values[index]),
			Self::Ext(values) => ExtensionField::<B>::try_into_base(&values[index]),
		}
	}

	pub fn to_ext_vec(&self) -> Vec<E> {
		match self {
			Self::Base(values) => values.par_iter().map(|&v| E::from(v)).collect(),
			Self::Ext(values) => values.clone(),
		}
	}

	pub fn into_ext_vec(self) -> Vec<E> {
		match self {
			Self::Base(values) => values.into_par_iter().map(E::from).collect(),
			Self::Ext(values) => values,
		}
	}

	/// Copy of the values as seen through a shift of `shift` rows.
	pub fn rotated(&self, shift: isize) -> Self {
		fn rotate<F: Copy>(values: &[F], shift: isize) -> Vec<F> {
			if values.is_empty() {
				return Vec::new();
			}
			let start = shift.rem_euclid(values.len() as isize) as usize;
			let mut out = Vec::with_capacity(values.len());
			out.extend_from_slice(&values[start..]);
			out.extend_from_slice(&values[..start]);
			out
		}

		match self {
			Self::Base(values) => Self::Base(rotate(values, shift)),
			Self::Ext(values) => Self::Ext(rotate(values, shift)),
		}
	}

	/// Sum of all the values.
	pub fn sum(&self) -> E {
		match self {
			Self::Base(values) => E::from(values.par_iter().copied().sum::<B>()),
			Self::Ext(values) => values.par_iter().copied().sum(),
		}
	}
}

impl From<Vec<B>> for ColumnValues {
	fn from(values: Vec<B>) -> Self {
		Self::Base(values)
	}
}

impl From<Vec<E>> for ColumnValues {
	fn from(values: Vec<E>) -> Self {
		Self::Ext(values)
	}
}

#[cfg(test)]
mod tests {
	use quill_field::Field;

	use super::*;

	#[test]
	fn test_rotated_matches_shifted_reads() {
		let values = ColumnValues::from_u64s([10, 11, 12, 13]);
		assert_eq!(values.rotated(1), ColumnValues::from_u64s([11, 12, 13, 10]));
		assert_eq!(values.rotated(-1), ColumnValues::from_u64s([13, 10, 11, 12]));
		assert_eq!(values.rotated(4), values);
	}

	#[test]
	fn test_get_base_on_lifted_values() {
		let values = ColumnValues::Ext(vec![E::from_u64(5), E::ONE]);
		assert_eq!(values.get_base(0), Some(B::from_u64(5)));
		assert_eq!(values.sum(), E::from_u64(6));
	}
}
