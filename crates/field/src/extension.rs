// Copyright 2025 Irreducible Inc.

use std::{
	iter,
	ops::{Add, AddAssign, Mul, MulAssign, Sub, SubAssign},
};

use super::{error::Error, Field};

/// A finite extension of the field `F`, represented over a fixed basis.
pub trait ExtensionField<F: Field>:
	Field
	+ From<F>
	+ TryInto<F>
	+ Add<F, Output = Self>
	+ Sub<F, Output = Self>
	+ Mul<F, Output = Self>
	+ AddAssign<F>
	+ SubAssign<F>
	+ MulAssign<F>
{
	type Iterator: Iterator<Item = F>;

	const DEGREE: usize;

	fn basis(i: usize) -> Result<Self, Error>;

	fn from_bases(base_elems: &[F]) -> Result<Self, Error>;

	fn iter_bases(&self) -> Self::Iterator;

	/// Returns the element as a base field element if all its higher coordinates vanish.
	fn try_into_base(&self) -> Option<F> {
		let mut bases = self.iter_bases();
		let first = bases.next().unwrap_or(F::ZERO);
		bases.all(|b| b.is_zero()).then_some(first)
	}
}

impl<F: Field> ExtensionField<F> for F {
	type Iterator = iter::Once<F>;

	const DEGREE: usize = 1;

	fn basis(i: usize) -> Result<Self, Error> {
		if i != 0 {
			return Err(Error::ExtensionDegreeMismatch);
		}
		Ok(Self::ONE)
	}

	fn from_bases(base_elems: &[F]) -> Result<Self, Error> {
		match base_elems.len() {
			0 => Ok(F::ZERO),
			1 => Ok(base_elems[0]),
			_ => Err(Error::ExtensionDegreeMismatch),
		}
	}

	fn iter_bases(&self) -> Self::Iterator {
		iter::once(*self)
	}
}
