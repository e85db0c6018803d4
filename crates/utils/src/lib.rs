// Copyright 2025 Irreducible Inc.

pub mod error_utils;
pub mod rayon;
pub mod tracing;
