// Copyright 2025 Irreducible Inc.

/// Error thrown when a field operation fails.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
	#[error("the argument does not match the field extension degree")]
	ExtensionDegreeMismatch,
	#[error("index {index} is out of range 0..{max}")]
	IndexOutOfRange { index: usize, max: usize },
	#[error("value {0} is not a canonical field element")]
	NotInField(u64),
}
