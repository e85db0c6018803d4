// Copyright 2025 Irreducible Inc.

//! Horner evaluations of filtered sequences.
//!
//! A Horner part evaluates `Σ c_j · x^j` over the coefficients whose selector is
//! set, visited row by row. The compiler replaces every Horner query by
//! accumulator columns linked by a right-to-left recurrence, a local opening of
//! the leading accumulator and an inner product counting the selected elements.

mod compile;
mod error;

pub use compile::{compile_horner, horner_accumulators};
pub use error::Error;
