// Copyright 2025 Irreducible Inc.

use std::{
	fmt::{Debug, Display},
	hash::Hash,
	iter::{Product, Sum},
	ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign},
};

use rand::RngCore;

use crate::arithmetic_traits::{InvertOrZero, Square};

/// This trait is based on `ff::Field` with some unused functionality removed.
pub trait Field:
	Sized
	+ Eq
	+ Copy
	+ Clone
	+ Default
	+ Send
	+ Sync
	+ Debug
	+ Display
	+ Hash
	+ 'static
	+ Neg<Output = Self>
	+ Add<Output = Self>
	+ Sub<Output = Self>
	+ Mul<Output = Self>
	+ Sum
	+ Product
	+ for<'a> Add<&'a Self, Output = Self>
	+ for<'a> Sub<&'a Self, Output = Self>
	+ for<'a> Mul<&'a Self, Output = Self>
	+ for<'a> Sum<&'a Self>
	+ for<'a> Product<&'a Self>
	+ AddAssign
	+ SubAssign
	+ MulAssign
	+ for<'a> AddAssign<&'a Self>
	+ for<'a> SubAssign<&'a Self>
	+ for<'a> MulAssign<&'a Self>
	+ Square
	+ InvertOrZero
{
	/// The zero element of the field, the additive identity.
	const ZERO: Self;

	/// The one element of the field, the multiplicative identity.
	const ONE: Self;

	/// The characteristic of the field.
	const CHARACTERISTIC: usize;

	/// Returns an element chosen uniformly at random using a user-provided RNG.
	fn random(rng: impl RngCore) -> Self;

	/// Appends the canonical little-endian encoding of the element.
	fn write_bytes(&self, out: &mut Vec<u8>);

	/// Returns true iff this element is zero.
	fn is_zero(&self) -> bool {
		*self == Self::ZERO
	}

	/// Doubles this element.
	#[must_use]
	fn double(&self) -> Self {
		*self + *self
	}

	/// Computes the multiplicative inverse of this element,
	/// failing if the element is zero.
	fn invert(&self) -> Option<Self> {
		let inv = self.invert_or_zero();
		(!inv.is_zero()).then_some(inv)
	}

	/// Exponentiates `self` by `exp`, where `exp` is a little-endian order integer
	/// exponent.
	fn pow<S: AsRef<[u64]>>(&self, exp: S) -> Self {
		let mut res = Self::ONE;
		for e in exp.as_ref().iter().rev() {
			for i in (0..64).rev() {
				res = res.square();
				if ((*e >> i) & 1) != 0 {
					res *= self;
				}
			}
		}
		res
	}
}

/// Implements the reference and iterator flavours of the arithmetic operators in
/// terms of the by-value `Add`, `Sub` and `Mul` implementations.
macro_rules! impl_arithmetic_boilerplate {
	($name:ty) => {
		impl<'a> std::ops::Add<&'a $name> for $name {
			type Output = $name;

			#[inline]
			fn add(self, rhs: &'a $name) -> $name {
				self + *rhs
			}
		}

		impl<'a> std::ops::Sub<&'a $name> for $name {
			type Output = $name;

			#[inline]
			fn sub(self, rhs: &'a $name) -> $name {
				self - *rhs
			}
		}

		impl<'a> std::ops::Mul<&'a $name> for $name {
			type Output = $name;

			#[inline]
			fn mul(self, rhs: &'a $name) -> $name {
				self * *rhs
			}
		}

		impl std::ops::AddAssign for $name {
			#[inline]
			fn add_assign(&mut self, rhs: $name) {
				*self = *self + rhs;
			}
		}

		impl std::ops::SubAssign for $name {
			#[inline]
			fn sub_assign(&mut self, rhs: $name) {
				*self = *self - rhs;
			}
		}

		impl std::ops::MulAssign for $name {
			#[inline]
			fn mul_assign(&mut self, rhs: $name) {
				*self = *self * rhs;
			}
		}

		impl<'a> std::ops::AddAssign<&'a $name> for $name {
			#[inline]
			fn add_assign(&mut self, rhs: &'a $name) {
				*self = *self + *rhs;
			}
		}

		impl<'a> std::ops::SubAssign<&'a $name> for $name {
			#[inline]
			fn sub_assign(&mut self, rhs: &'a $name) {
				*self = *self - *rhs;
			}
		}

		impl<'a> std::ops::MulAssign<&'a $name> for $name {
			#[inline]
			fn mul_assign(&mut self, rhs: &'a $name) {
				*self = *self * *rhs;
			}
		}

		impl std::iter::Sum for $name {
			fn sum<I: Iterator<Item = $name>>(iter: I) -> $name {
				iter.fold(<$name as $crate::Field>::ZERO, |acc, x| acc + x)
			}
		}

		impl<'a> std::iter::Sum<&'a $name> for $name {
			fn sum<I: Iterator<Item = &'a $name>>(iter: I) -> $name {
				iter.fold(<$name as $crate::Field>::ZERO, |acc, x| acc + *x)
			}
		}

		impl std::iter::Product for $name {
			fn product<I: Iterator<Item = $name>>(iter: I) -> $name {
				iter.fold(<$name as $crate::Field>::ONE, |acc, x| acc * x)
			}
		}

		impl<'a> std::iter::Product<&'a $name> for $name {
			fn product<I: Iterator<Item = &'a $name>>(iter: I) -> $name {
				iter.fold(<$name as $crate::Field>::ONE, |acc, x| acc * *x)
			}
		}

		impl $crate::arithmetic_traits::Square for $name {
			#[inline]
			fn square(self) -> $name {
				self * self
			}
		}
	};
}

pub(crate) use impl_arithmetic_boilerplate;
