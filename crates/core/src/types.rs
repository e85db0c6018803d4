// Copyright 2025 Irreducible Inc.

use quill_field::{KoalaBear, KoalaBearExt4};

/// Base field of the committed columns.
pub type B = KoalaBear;

/// Extension field the coins and the log-derivative accumulators live in.
pub type E = KoalaBearExt4;
