// Copyright 2025 Irreducible Inc.

//! Prime field arithmetic over KoalaBear and its quartic extension.

pub mod arithmetic_traits;
pub mod error;
pub mod extension;
pub mod field;
pub mod koala_bear;
pub mod util;

pub use arithmetic_traits::*;
pub use error::Error;
pub use extension::*;
pub use field::Field;
pub use koala_bear::*;
