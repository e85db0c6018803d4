// Copyright 2025 Irreducible Inc.

use crate::types::E;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	#[error("selector {member} of horner part {part} has a non-binary value {value} at row {row}")]
	SelectorNonBinary {
		part: String,
		member: usize,
		row: usize,
		value: E,
	},
	#[error("expected {expected} N0 values, one per horner part, got {got}")]
	PartCountMismatch { expected: usize, got: usize },
}
