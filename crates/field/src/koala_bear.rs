// Copyright 2025 Irreducible Inc.

//! The KoalaBear prime field `p = 2^31 - 2^24 + 1` and its quartic extension
//! `F_p[v] / (v^4 - 3)`.

use std::{
	fmt::{self, Debug, Display},
	ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign},
};

use rand::RngCore;

use crate::{
	arithmetic_traits::InvertOrZero, error::Error, extension::ExtensionField,
	field::impl_arithmetic_boilerplate, Field,
};

/// The KoalaBear modulus.
pub const MODULUS: u32 = 0x7f00_0001;

/// `v^4 = W` in the quartic extension. `W` is a quadratic non-residue modulo `p`
/// and `p = 1 mod 4`, which makes `x^4 - W` irreducible.
const W: KoalaBear = KoalaBear(3);

/// Little-endian limbs of `p^4 - 2`, the inversion exponent of the quartic extension.
const EXT4_INVERSE_EXPONENT: [u64; 2] = [8792715331010297855, 1117312727422204929];

/// An element of the KoalaBear prime field, stored in canonical form.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct KoalaBear(u32);

impl KoalaBear {
	/// Reduces an arbitrary `u32` modulo `p`.
	pub const fn new(value: u32) -> Self {
		Self(value % MODULUS)
	}

	/// Accepts only canonical representatives.
	pub const fn new_checked(value: u32) -> Result<Self, Error> {
		if value < MODULUS {
			Ok(Self(value))
		} else {
			Err(Error::NotInField(value as u64))
		}
	}

	/// Reduces an arbitrary `u64` modulo `p`.
	pub const fn from_u64(value: u64) -> Self {
		Self((value % MODULUS as u64) as u32)
	}

	/// Returns the canonical representative in `0..p`.
	pub const fn val(self) -> u32 {
		self.0
	}
}

impl From<u32> for KoalaBear {
	fn from(value: u32) -> Self {
		Self::new(value)
	}
}

impl From<u64> for KoalaBear {
	fn from(value: u64) -> Self {
		Self::from_u64(value)
	}
}

impl From<bool> for KoalaBear {
	fn from(value: bool) -> Self {
		Self(value as u32)
	}
}

impl Debug for KoalaBear {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "KoalaBear({})", self.0)
	}
}

impl Display for KoalaBear {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl Add for KoalaBear {
	type Output = Self;

	#[inline]
	fn add(self, rhs: Self) -> Self {
		// Both operands are below 2^31, so the sum fits in a u32.
		let sum = self.0 + rhs.0;
		Self(if sum >= MODULUS { sum - MODULUS } else { sum })
	}
}

impl Sub for KoalaBear {
	type Output = Self;

	#[inline]
	fn sub(self, rhs: Self) -> Self {
		Self(if self.0 >= rhs.0 {
			self.0 - rhs.0
		} else {
			self.0 + MODULUS - rhs.0
		})
	}
}

impl Mul for KoalaBear {
	type Output = Self;

	#[inline]
	fn mul(self, rhs: Self) -> Self {
		Self::from_u64(self.0 as u64 * rhs.0 as u64)
	}
}

impl Neg for KoalaBear {
	type Output = Self;

	#[inline]
	fn neg(self) -> Self {
		if self.0 == 0 {
			self
		} else {
			Self(MODULUS - self.0)
		}
	}
}

impl_arithmetic_boilerplate!(KoalaBear);

impl InvertOrZero for KoalaBear {
	fn invert_or_zero(self) -> Self {
		self.pow([(MODULUS - 2) as u64])
	}
}

impl Field for KoalaBear {
	const ZERO: Self = Self(0);
	const ONE: Self = Self(1);
	const CHARACTERISTIC: usize = MODULUS as usize;

	fn random(mut rng: impl RngCore) -> Self {
		loop {
			let candidate = rng.next_u32() & 0x7fff_ffff;
			if candidate < MODULUS {
				return Self(candidate);
			}
		}
	}

	fn write_bytes(&self, out: &mut Vec<u8>) {
		out.extend_from_slice(&self.0.to_le_bytes());
	}
}

/// An element of the quartic extension `F_p[v] / (v^4 - 3)`, stored by its
/// coordinates over the basis `1, v, v^2, v^3`.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KoalaBearExt4([KoalaBear; 4]);

impl KoalaBearExt4 {
	pub const fn new(coords: [KoalaBear; 4]) -> Self {
		Self(coords)
	}

	pub const fn coords(&self) -> &[KoalaBear; 4] {
		&self.0
	}

	/// Lifts a small integer into the extension.
	pub fn from_u64(value: u64) -> Self {
		KoalaBear::from_u64(value).into()
	}
}

impl From<KoalaBear> for KoalaBearExt4 {
	fn from(value: KoalaBear) -> Self {
		Self([value, KoalaBear::ZERO, KoalaBear::ZERO, KoalaBear::ZERO])
	}
}

impl TryFrom<KoalaBearExt4> for KoalaBear {
	type Error = ();

	fn try_from(value: KoalaBearExt4) -> Result<Self, ()> {
		ExtensionField::<KoalaBear>::try_into_base(&value).ok_or(())
	}
}

impl Debug for KoalaBearExt4 {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let [a, b, c, d] = self.0;
		write!(f, "KoalaBearExt4([{a}, {b}, {c}, {d}])")
	}
}

impl Display for KoalaBearExt4 {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match ExtensionField::<KoalaBear>::try_into_base(self) {
			Some(base) => write!(f, "{base}"),
			None => {
				let [a, b, c, d] = self.0;
				write!(f, "({a}, {b}, {c}, {d})")
			}
		}
	}
}

impl Add for KoalaBearExt4 {
	type Output = Self;

	#[inline]
	fn add(self, rhs: Self) -> Self {
		Self(std::array::from_fn(|i| self.0[i] + rhs.0[i]))
	}
}

impl Sub for KoalaBearExt4 {
	type Output = Self;

	#[inline]
	fn sub(self, rhs: Self) -> Self {
		Self(std::array::from_fn(|i| self.0[i] - rhs.0[i]))
	}
}

impl Mul for KoalaBearExt4 {
	type Output = Self;

	#[inline]
	fn mul(self, rhs: Self) -> Self {
		let [a0, a1, a2, a3] = self.0;
		let [b0, b1, b2, b3] = rhs.0;

		let c0 = a0 * b0 + W * (a1 * b3 + a2 * b2 + a3 * b1);
		let c1 = a0 * b1 + a1 * b0 + W * (a2 * b3 + a3 * b2);
		let c2 = a0 * b2 + a1 * b1 + a2 * b0 + W * (a3 * b3);
		let c3 = a0 * b3 + a1 * b2 + a2 * b1 + a3 * b0;
		Self([c0, c1, c2, c3])
	}
}

impl Neg for KoalaBearExt4 {
	type Output = Self;

	#[inline]
	fn neg(self) -> Self {
		Self(self.0.map(|c| -c))
	}
}

impl_arithmetic_boilerplate!(KoalaBearExt4);

impl Add<KoalaBear> for KoalaBearExt4 {
	type Output = Self;

	#[inline]
	fn add(mut self, rhs: KoalaBear) -> Self {
		self.0[0] += rhs;
		self
	}
}

impl Sub<KoalaBear> for KoalaBearExt4 {
	type Output = Self;

	#[inline]
	fn sub(mut self, rhs: KoalaBear) -> Self {
		self.0[0] -= rhs;
		self
	}
}

impl Mul<KoalaBear> for KoalaBearExt4 {
	type Output = Self;

	#[inline]
	fn mul(self, rhs: KoalaBear) -> Self {
		Self(self.0.map(|c| c * rhs))
	}
}

impl AddAssign<KoalaBear> for KoalaBearExt4 {
	fn add_assign(&mut self, rhs: KoalaBear) {
		*self = *self + rhs;
	}
}

impl SubAssign<KoalaBear> for KoalaBearExt4 {
	fn sub_assign(&mut self, rhs: KoalaBear) {
		*self = *self - rhs;
	}
}

impl MulAssign<KoalaBear> for KoalaBearExt4 {
	fn mul_assign(&mut self, rhs: KoalaBear) {
		*self = *self * rhs;
	}
}

impl InvertOrZero for KoalaBearExt4 {
	fn invert_or_zero(self) -> Self {
		self.pow(EXT4_INVERSE_EXPONENT)
	}
}

impl Field for KoalaBearExt4 {
	const ZERO: Self = Self([KoalaBear::ZERO; 4]);
	const ONE: Self = Self([KoalaBear::ONE, KoalaBear::ZERO, KoalaBear::ZERO, KoalaBear::ZERO]);
	const CHARACTERISTIC: usize = MODULUS as usize;

	fn random(mut rng: impl RngCore) -> Self {
		Self(std::array::from_fn(|_| KoalaBear::random(&mut rng)))
	}

	fn write_bytes(&self, out: &mut Vec<u8>) {
		for coord in &self.0 {
			coord.write_bytes(out);
		}
	}
}

impl ExtensionField<KoalaBear> for KoalaBearExt4 {
	type Iterator = std::array::IntoIter<KoalaBear, 4>;

	const DEGREE: usize = 4;

	fn basis(i: usize) -> Result<Self, Error> {
		if i >= 4 {
			return Err(Error::IndexOutOfRange { index: i, max: 4 });
		}
		let mut coords = [KoalaBear::ZERO; 4];
		coords[i] = KoalaBear::ONE;
		Ok(Self(coords))
	}

	fn from_bases(base_elems: &[KoalaBear]) -> Result<Self, Error> {
		if base_elems.len() > 4 {
			return Err(Error::ExtensionDegreeMismatch);
		}
		let mut coords = [KoalaBear::ZERO; 4];
		coords[..base_elems.len()].copy_from_slice(base_elems);
		Ok(Self(coords))
	}

	fn iter_bases(&self) -> Self::Iterator {
		self.0.into_iter()
	}
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;
	use rand::{rngs::StdRng, SeedableRng};

	use super::*;
	use crate::arithmetic_traits::Square;

	#[test]
	fn test_base_arithmetic_wraps() {
		let minus_one = -KoalaBear::ONE;
		assert_eq!(minus_one.val(), MODULUS - 1);
		assert_eq!(minus_one + KoalaBear::ONE, KoalaBear::ZERO);
		assert_eq!(KoalaBear::ZERO - KoalaBear::ONE, minus_one);
		assert_eq!(minus_one * minus_one, KoalaBear::ONE);
		assert_eq!(KoalaBear::new(MODULUS + 5), KoalaBear::new(5));
		assert_eq!(KoalaBear::new_checked(MODULUS), Err(Error::NotInField(MODULUS as u64)));
	}

	#[test]
	fn test_base_inverse() {
		let mut rng = StdRng::seed_from_u64(0);
		for _ in 0..64 {
			let a = KoalaBear::random(&mut rng);
			if a.is_zero() {
				continue;
			}
			assert_eq!(a * a.invert_or_zero(), KoalaBear::ONE);
		}
		assert_eq!(KoalaBear::ZERO.invert(), None);
	}

	#[test]
	fn test_ext_inverse() {
		let mut rng = StdRng::seed_from_u64(0);
		for _ in 0..16 {
			let a = KoalaBearExt4::random(&mut rng);
			assert_eq!(a * a.invert_or_zero(), KoalaBearExt4::ONE);
		}
		assert_eq!(KoalaBearExt4::ZERO.invert(), None);
	}

	#[test]
	fn test_ext_generator_relation() {
		let v = <KoalaBearExt4 as ExtensionField<KoalaBear>>::basis(1).unwrap();
		assert_eq!(v.square().square(), KoalaBearExt4::from(W));
	}

	#[test]
	fn test_ext_embeds_base() {
		let a = KoalaBear::new(17);
		let b = KoalaBear::new(23);
		let lifted = KoalaBearExt4::from(a) * KoalaBearExt4::from(b);
		assert_eq!(ExtensionField::<KoalaBear>::try_into_base(&lifted), Some(a * b));
		assert_eq!(KoalaBearExt4::from(a) * b, lifted);
		let v2 = <KoalaBearExt4 as ExtensionField<KoalaBear>>::basis(2).unwrap();
		assert_eq!(KoalaBear::try_from(v2), Err(()));
	}

	proptest! {
		#[test]
		fn test_ext_mul_distributes(seed in any::<u64>()) {
			let mut rng = StdRng::seed_from_u64(seed);
			let a = KoalaBearExt4::random(&mut rng);
			let b = KoalaBearExt4::random(&mut rng);
			let c = KoalaBearExt4::random(&mut rng);
			prop_assert_eq!(a * (b + c), a * b + a * c);
			prop_assert_eq!((a * b) * c, a * (b * c));
		}
	}
}
