// Copyright 2025 Irreducible Inc.

//! Computes the multiplicity columns `M` of a lookup table.
//!
//! Rows of the table and of the checked tables are first collapsed to a single
//! extension field element, then partitioned into hash buckets. Each bucket is
//! joined independently: a map from value to the smallest `(fragment, row)`
//! position holding it is built from the table rows, and every checked row in the
//! bucket adds its weight at the position it resolves to. Every bucket produces its
//! own buffer of increments and the buffers are folded into `M` after the join.

use std::{collections::HashMap, ops::Range};

use quill_field::{util::powers, Field};
use quill_utils::rayon::{chunk_ranges, num_partition_buckets};
use rand::RngCore;
use rayon::prelude::*;
use tracing::instrument;

use super::error::Error;
use crate::{
	column::ColumnValues,
	types::{B, E},
};

const MIN_PARTITION_CHUNK: usize = 1 << 10;

/// Window of rows taking part in a lookup. The bounds may lie outside of the
/// physical rows, in which case the first (resp. last) row stands for the rows
/// pushed out of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
	pub start: isize,
	pub stop: isize,
}

impl Segment {
	pub fn new(start: isize, stop: isize) -> Self {
		assert!(start <= stop, "segment [{start}, {stop}) is reversed");
		Self { start, stop }
	}

	fn clamped(&self, size: usize) -> Range<usize> {
		let start = self.start.max(0) as usize;
		let stop = (self.stop.max(0) as usize).min(size);
		start.min(stop)..stop
	}
}

/// One fragment of the lookup table.
#[derive(Debug, Clone)]
pub struct TableFragment<'a> {
	pub columns: Vec<&'a ColumnValues>,
	pub segment: Option<Segment>,
}

impl<'a> TableFragment<'a> {
	pub fn new(columns: Vec<&'a ColumnValues>) -> Self {
		Self {
			columns,
			segment: None,
		}
	}

	fn size(&self) -> usize {
		self.columns[0].len()
	}

	fn rows(&self) -> Range<usize> {
		match self.segment {
			Some(segment) => segment.clamped(self.size()),
			None => 0..self.size(),
		}
	}
}

#[derive(Debug, Clone)]
pub struct CheckedFilter<'a> {
	pub name: String,
	pub values: &'a ColumnValues,
}

/// A table whose (filtered) rows must all be found in the lookup table.
#[derive(Debug, Clone)]
pub struct CheckedTable<'a> {
	pub name: String,
	pub columns: Vec<&'a ColumnValues>,
	pub filter: Option<CheckedFilter<'a>>,
	pub segment: Option<Segment>,
}

impl<'a> CheckedTable<'a> {
	pub fn new(name: impl ToString, columns: Vec<&'a ColumnValues>) -> Self {
		Self {
			name: name.to_string(),
			columns,
			filter: None,
			segment: None,
		}
	}

	pub fn with_filter(mut self, name: impl ToString, values: &'a ColumnValues) -> Self {
		self.filter = Some(CheckedFilter {
			name: name.to_string(),
			values,
		});
		self
	}

	fn size(&self) -> usize {
		self.columns[0].len()
	}

	/// Weight carried by `row`. Unfiltered boundary rows absorb the rows the
	/// segment pushes outside of the physical range.
	fn weight(&self, row: usize) -> B {
		let size = self.size();
		match (self.segment, &self.filter) {
			(Some(segment), None) if row == 0 && segment.start < 0 => {
				B::from_u64((1 - segment.start) as u64)
			}
			(Some(segment), None) if row == size - 1 && segment.stop > size as isize => {
				B::from_u64((segment.stop - size as isize + 1) as u64)
			}
			_ => B::ONE,
		}
	}

	fn rows(&self) -> Range<usize> {
		match self.segment {
			Some(segment) => segment.clamped(self.size()),
			None => 0..self.size(),
		}
	}
}

#[derive(Debug, Clone, Copy)]
struct TableEntry {
	value: E,
	frag: u32,
	row: u32,
}

#[derive(Debug, Clone, Copy)]
struct CheckedEntry {
	value: E,
	weight: B,
	table: u32,
	row: u32,
}

/// Folds the rows of several columns into one value with a random linear combination.
struct Collapser {
	coefficients: Vec<E>,
}

impl Collapser {
	fn new(width: usize, rng: &mut impl RngCore) -> Self {
		// A single column is taken as is, without drawing any randomness.
		let coefficients = if width == 1 {
			vec![E::ONE]
		} else {
			powers(E::random(rng)).take(width).collect()
		};
		Self { coefficients }
	}

	#[inline]
	fn collapse(&self, columns: &[&ColumnValues], row: usize) -> E {
		match columns {
			[column] => column.get_ext(row),
			_ => columns
				.iter()
				.zip(&self.coefficients)
				.map(|(column, &coeff)| coeff * column.get_ext(row))
				.sum(),
		}
	}
}

#[inline]
fn bucket_of(value: &E, mask: u64) -> usize {
	let coords = value.coords();
	let mut h = coords[0].val() as u64;
	for coord in &coords[1..] {
		h = h.wrapping_mul(31) ^ coord.val() as u64;
	}
	(h & mask) as usize
}

/// Merges per-chunk partitions bucket by bucket, keeping chunk order.
fn merge_partitions<T: Copy + Send + Sync>(chunks: Vec<Vec<Vec<T>>>, num_buckets: usize) -> Vec<Vec<T>> {
	(0..num_buckets)
		.into_par_iter()
		.map(|bucket| {
			let len = chunks.iter().map(|chunk| chunk[bucket].len()).sum();
			let mut merged = Vec::with_capacity(len);
			for chunk in &chunks {
				merged.extend_from_slice(&chunk[bucket]);
			}
			merged
		})
		.collect()
}

#[derive(Debug, Clone, Copy)]
pub struct MultiplicityEngine {
	num_buckets: usize,
}

impl Default for MultiplicityEngine {
	fn default() -> Self {
		Self::new(num_partition_buckets())
	}
}

impl MultiplicityEngine {
	pub fn new(num_buckets: usize) -> Self {
		assert!(num_buckets.is_power_of_two(), "the number of buckets must be a power of two");
		Self { num_buckets }
	}

	pub fn num_buckets(&self) -> usize {
		self.num_buckets
	}

	/// Returns one multiplicity column per table fragment.
	///
	/// Fails with [`Error::ValueNotInTable`] if a selected checked row does not
	/// occur in the table and with [`Error::NonBinaryFilter`] on a filter value
	/// other than 0 or 1. The randomness drawn from `rng` only affects how rows are
	/// matched, never the result.
	#[instrument(skip_all, name = "logderivativesum::multiplicities", level = "debug")]
	pub fn compute(
		&self,
		table_name: &str,
		fragments: &[TableFragment<'_>],
		checked: &[CheckedTable<'_>],
		rng: &mut impl RngCore,
	) -> Result<Vec<Vec<B>>, Error> {
		assert!(!fragments.is_empty(), "table {table_name} has no fragment");
		let width = fragments[0].columns.len();
		assert!(width > 0, "table {table_name} has no column");
		for fragment in fragments {
			assert_eq!(fragment.columns.len(), width, "fragments of {table_name} differ in width");
		}
		for table in checked {
			assert_eq!(
				table.columns.len(),
				width,
				"{} does not have the width of table {table_name}",
				table.name
			);
		}

		let collapser = Collapser::new(width, rng);
		let mask = (self.num_buckets - 1) as u64;

		let table_buckets = self.partition_table(fragments, &collapser, mask);
		let checked_buckets = self.partition_checked(checked, &collapser, mask)?;

		let increments = table_buckets
			.par_iter()
			.zip(checked_buckets.par_iter())
			.map(|(table_bucket, checked_bucket)| {
				join_bucket(table_name, table_bucket, checked_bucket, checked)
			})
			.collect::<Vec<_>>();

		let mut multiplicities = fragments
			.iter()
			.map(|fragment| vec![B::ZERO; fragment.size()])
			.collect::<Vec<_>>();
		for bucket in increments {
			for (frag, row, weight) in bucket? {
				multiplicities[frag as usize][row as usize] += weight;
			}
		}
		Ok(multiplicities)
	}

	fn partition_table(
		&self,
		fragments: &[TableFragment<'_>],
		collapser: &Collapser,
		mask: u64,
	) -> Vec<Vec<TableEntry>> {
		let work = fragments
			.iter()
			.enumerate()
			.flat_map(|(frag, fragment)| {
				let rows = fragment.rows();
				chunk_ranges(rows.len(), MIN_PARTITION_CHUNK)
					.into_iter()
					.map(move |chunk| (frag, rows.start + chunk.start..rows.start + chunk.end))
			})
			.collect::<Vec<_>>();

		let chunks = work
			.into_par_iter()
			.map(|(frag, rows)| {
				let columns = &fragments[frag].columns;
				let mut buckets = vec![Vec::new(); self.num_buckets];
				for row in rows {
					let value = collapser.collapse(columns, row);
					buckets[bucket_of(&value, mask)].push(TableEntry {
						value,
						frag: frag as u32,
						row: row as u32,
					});
				}
				buckets
			})
			.collect::<Vec<_>>();

		merge_partitions(chunks, self.num_buckets)
	}

	fn partition_checked(
		&self,
		checked: &[CheckedTable<'_>],
		collapser: &Collapser,
		mask: u64,
	) -> Result<Vec<Vec<CheckedEntry>>, Error> {
		let work = checked
			.iter()
			.enumerate()
			.flat_map(|(index, table)| {
				let rows = table.rows();
				chunk_ranges(rows.len(), MIN_PARTITION_CHUNK)
					.into_iter()
					.map(move |chunk| (index, rows.start + chunk.start..rows.start + chunk.end))
			})
			.collect::<Vec<_>>();

		let chunks = work
			.into_par_iter()
			.map(|(index, rows)| {
				let table = &checked[index];
				let mut buckets = vec![Vec::new(); self.num_buckets];
				for row in rows {
					if let Some(filter) = &table.filter {
						match filter.values.get_base(row) {
							Some(value) if value.is_zero() => continue,
							Some(value) if value == B::ONE => {}
							_ => {
								return Err(Error::NonBinaryFilter {
									column: filter.name.clone(),
									row,
									value: filter.values.get_ext(row),
								});
							}
						}
					}
					let value = collapser.collapse(&table.columns, row);
					buckets[bucket_of(&value, mask)].push(CheckedEntry {
						value,
						weight: table.weight(row),
						table: index as u32,
						row: row as u32,
					});
				}
				Ok(buckets)
			})
			.collect::<Vec<_>>();

		// The first failing chunk, in input order, decides the error.
		let chunks = chunks.into_iter().collect::<Result<Vec<_>, _>>()?;
		Ok(merge_partitions(chunks, self.num_buckets))
	}
}

fn join_bucket(
	table_name: &str,
	table_bucket: &[TableEntry],
	checked_bucket: &[CheckedEntry],
	checked: &[CheckedTable<'_>],
) -> Result<Vec<(u32, u32, B)>, Error> {
	let mut positions = HashMap::<E, (u32, u32)>::with_capacity(table_bucket.len());
	for entry in table_bucket {
		positions
			.entry(entry.value)
			.and_modify(|pos| *pos = (*pos).min((entry.frag, entry.row)))
			.or_insert((entry.frag, entry.row));
	}

	checked_bucket
		.iter()
		.map(|entry| match positions.get(&entry.value) {
			Some(&(frag, row)) => Ok((frag, row, entry.weight)),
			None => {
				let table = &checked[entry.table as usize];
				let row = entry.row as usize;
				Err(Error::ValueNotInTable {
					table: table_name.to_string(),
					checked: table.name.clone(),
					row,
					values: table.columns.iter().map(|column| column.get_ext(row)).collect(),
				})
			}
		})
		.collect()
}
