// Copyright 2025 Irreducible Inc.

//! Log-derivative (LogUp) arguments.
//!
//! Inclusion queries are compiled into one [`LogDerivativeSum`] query whose
//! claimed sum is zero, and every log-derivative sum is in turn compiled into
//! running-sum columns checked by global and local constraints.
//!
//! [`LogDerivativeSum`]: crate::query::LogDerivativeSum

mod accumulator;
mod error;
mod lookup;
mod multiplicity;

pub use accumulator::{accumulate, compile_log_derivative_sums, log_derivative_terms};
pub use error::Error;
pub use lookup::{
	compile_lookups, compile_lookups_with_options, ColumnSegmenter, LookupCompilerOptions,
	LOOKUP_SUM_NAME,
};
pub use multiplicity::{CheckedFilter, CheckedTable, MultiplicityEngine, Segment, TableFragment};
