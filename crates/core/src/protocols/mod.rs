// Copyright 2025 Irreducible Inc.

//! Compilers reducing high-level queries to constraints over committed columns.
//!
//! Every compiler is a pass over a [`CompiledIop`]: it collects the active queries
//! it handles, marks them ignored and registers the columns, coins, lower-level
//! queries and prover/verifier actions replacing them. The passes must run in
//! dependency order, which [`compile_standard`] does:
//!
//! 1. inclusions become one log-derivative sum,
//! 2. projections become Horner queries,
//! 3. Horner queries become accumulator columns and openings,
//! 4. log-derivative sums become running-sum columns and openings,
//! 5. the remaining queries are checked directly.

pub mod dummy;
pub mod horner;
pub mod logderivativesum;
pub mod projection;
#[cfg(test)]
pub(crate) mod test_utils;

use crate::iop::CompiledIop;

/// Runs every compiler with default options.
pub fn compile_standard(iop: &mut CompiledIop) {
	logderivativesum::compile_lookups(iop);
	projection::compile_projections(iop);
	horner::compile_horner(iop);
	logderivativesum::compile_log_derivative_sums(iop);
	dummy::compile(iop);
}
