// Copyright 2025 Irreducible Inc.

//! Lookup, projection and Horner arguments over KoalaBear columns.
//!
//! An IOP is described as a [`CompiledIop`]: committed and constant columns
//! grouped in rounds, verifier coins, and queries over them. Compiler passes from
//! [`protocols`] reduce the high-level queries (inclusions, projections, Horner
//! evaluations, log-derivative sums) to constraints, local openings and inner
//! products. [`prove`] runs the registered prover actions round by round and
//! [`verify`] replays the Fiat-Shamir transcript and the verifier actions.

pub mod coin;
pub mod column;
pub mod error;
pub mod expr;
pub mod fiat_shamir;
pub mod iop;
pub mod protocols;
pub mod prover;
pub mod query;
pub mod types;
pub mod verifier;

pub use error::{Error, VerificationError};
pub use iop::{compile, CompiledIop};
pub use prover::{prove, Proof, ProverRuntime};
pub use verifier::{verify, VerifierRuntime};
