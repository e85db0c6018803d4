// Copyright 2025 Irreducible Inc.

use itertools::Itertools;

use crate::{
	protocols::{horner::Error as HornerError, logderivativesum::Error as LogDerivativeSumError},
	types::E,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("column {name} is not known to the IOP")]
	UnknownColumn { name: String },
	#[error("column {name} has not been assigned")]
	MissingColumn { name: String },
	#[error("column {name} is already assigned")]
	ColumnAlreadyAssigned { name: String },
	#[error("column {name} has size {got}, expected {expected}")]
	ColumnSizeMismatch {
		name: String,
		expected: usize,
		got: usize,
	},
	#[error("column {name} belongs to round {column_round} but the runtime is at round {current}")]
	WrongRound {
		name: String,
		column_round: usize,
		current: usize,
	},
	#[error("column {name} is not a committed column and cannot be assigned")]
	NotCommitted { name: String },
	#[error("expression mixes columns of size {got} into an evaluation of size {expected}")]
	ExpressionSizeMismatch { expected: usize, got: usize },
	#[error("coin {name} has not been sampled yet")]
	CoinNotSampled { name: String },
	#[error("parameters of query {name} have not been assigned")]
	MissingQueryParams { name: String },
	#[error("parameters of query {name} are already assigned")]
	QueryParamsAlreadyAssigned { name: String },
	#[error("query {name} does not accept {kind} parameters")]
	QueryParamsKindMismatch { name: String, kind: &'static str },
	#[error("the proof is malformed: {0}")]
	MalformedProof(String),
	#[error("log-derivative sum error: {0}")]
	LogDerivativeSum(#[from] LogDerivativeSumError),
	#[error("horner error: {0}")]
	Horner(#[from] HornerError),
	#[error("field error: {0}")]
	Field(#[from] quill_field::Error),
	#[error("verification failure: {0}")]
	Verification(#[from] VerificationError),
	#[error("verification failed at round {round}: [{}]", .failures.iter().join("; "))]
	VerificationFailed { round: usize, failures: Vec<Error> },
}

/// Mismatches detected by verifier actions. Every variant carries the values the
/// verifier compared.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
	#[error("log-derivative sum {query}: claimed {claimed}, recomputed {recomputed}")]
	LogDerivativeSumMismatch {
		query: String,
		claimed: E,
		recomputed: E,
	},
	#[error("lookup log-derivative sum {query} must be zero, got {sum}")]
	LookupSumNotZero { query: String, sum: E },
	#[error("horner query {query}, part {part}: declared N1 - N0 = {declared}, selectors count {counted}")]
	HornerCountMismatch {
		query: String,
		part: usize,
		declared: E,
		counted: E,
	},
	#[error("horner query {query}: claimed final result {claimed}, recomputed {recomputed}")]
	HornerFinalResultMismatch {
		query: String,
		claimed: E,
		recomputed: E,
	},
	#[error("projection {query}: leading horner values differ by {difference}")]
	ProjectionMismatch { query: String, difference: E },
	#[error("projection {query}: filtered lengths differ ({len_a} vs {len_b})")]
	ProjectionLengthMismatch {
		query: String,
		len_a: usize,
		len_b: usize,
	},
	#[error("projection {query}: part {part} starts at N0 = {n0} instead of 0")]
	ProjectionNonZeroStart { query: String, part: usize, n0: usize },
	#[error("projection {query}: filter {side} is not binary at row {row}")]
	ProjectionFilterNotBinary {
		query: String,
		side: &'static str,
		row: usize,
	},
	#[error("global constraint {name} does not vanish at row {row}")]
	GlobalConstraintUnsatisfied { name: String, row: usize },
	#[error("local constraint {name} does not vanish, got {value}")]
	LocalConstraintUnsatisfied { name: String, value: E },
	#[error("local opening {name}: claimed {claimed}, actual {actual}")]
	LocalOpeningMismatch { name: String, claimed: E, actual: E },
	#[error("inner product {name}, entry {index}: claimed {claimed}, actual {actual}")]
	InnerProductMismatch {
		name: String,
		index: usize,
		claimed: E,
		actual: E,
	},
	#[error("inclusion {name}: row {row} of the included side is absent from the table")]
	InclusionUnsatisfied { name: String, row: usize },
	#[error("horner query {query}, part {part}: selector {member} is not binary at row {row}")]
	HornerSelectorNotBinary {
		query: String,
		part: String,
		member: usize,
		row: usize,
	},
}
