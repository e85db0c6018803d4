// Copyright 2025 Irreducible Inc.

//! Symbolic arithmetic expressions over columns, coins and constants.

use std::ops::{Add, Mul, Neg, Sub};

use quill_field::{ExtensionField, Field};
use quill_utils::bail;
use rayon::prelude::*;

use crate::{
	coin::CoinId,
	column::{Column, ColumnId, ColumnSet, ColumnValues},
	error::Error,
	types::{B, E},
};

/// Read access to column assignments and coin values, shared by the prover and
/// the verifier runtimes.
pub trait EvalContext: Sync {
	fn column_values(&self, id: ColumnId) -> Result<&ColumnValues, Error>;

	fn coin_value(&self, id: CoinId) -> Result<E, Error>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
	Constant(E),
	Column(Column),
	Coin(CoinId),
	Add(Box<Expr>, Box<Expr>),
	Sub(Box<Expr>, Box<Expr>),
	Mul(Box<Expr>, Box<Expr>),
	Neg(Box<Expr>),
}

impl Expr {
	pub fn constant(value: impl Into<E>) -> Self {
		Self::Constant(value.into())
	}

	pub fn zero() -> Self {
		Self::Constant(E::ZERO)
	}

	pub fn one() -> Self {
		Self::Constant(E::ONE)
	}

	pub fn coin(id: CoinId) -> Self {
		Self::Coin(id)
	}

	pub fn is_constant_one(&self) -> bool {
		matches!(self, Self::Constant(c) if *c == E::ONE)
	}

	/// Shifts every column reference of the expression by `offset` rows.
	pub fn shifted(&self, offset: isize) -> Self {
		match self {
			Self::Column(column) => Self::Column(column.shifted(offset)),
			Self::Constant(_) | Self::Coin(_) => self.clone(),
			Self::Add(a, b) => Self::Add(Box::new(a.shifted(offset)), Box::new(b.shifted(offset))),
			Self::Sub(a, b) => Self::Sub(Box::new(a.shifted(offset)), Box::new(b.shifted(offset))),
			Self::Mul(a, b) => Self::Mul(Box::new(a.shifted(offset)), Box::new(b.shifted(offset))),
			Self::Neg(a) => Self::Neg(Box::new(a.shifted(offset))),
		}
	}

	fn visit(&self, f: &mut impl FnMut(&Expr)) {
		f(self);
		match self {
			Self::Add(a, b) | Self::Sub(a, b) | Self::Mul(a, b) => {
				a.visit(f);
				b.visit(f);
			}
			Self::Neg(a) => a.visit(f),
			Self::Constant(_) | Self::Column(_) | Self::Coin(_) => {}
		}
	}

	/// Column references in the order they appear.
	pub fn columns(&self) -> Vec<Column> {
		let mut columns = Vec::new();
		self.visit(&mut |expr| {
			if let Self::Column(column) = expr {
				columns.push(*column);
			}
		});
		columns
	}

	pub fn coins(&self) -> Vec<CoinId> {
		let mut coins = Vec::new();
		self.visit(&mut |expr| {
			if let Self::Coin(id) = expr {
				coins.push(*id);
			}
		});
		coins
	}

	/// Smallest and largest shift among the column references, `(0, 0)` when none.
	pub fn shift_range(&self) -> (isize, isize) {
		self.columns()
			.iter()
			.fold((0, 0), |(lo, hi), column| (lo.min(column.shift()), hi.max(column.shift())))
	}

	pub fn degree(&self) -> usize {
		match self {
			Self::Constant(_) | Self::Coin(_) => 0,
			Self::Column(_) => 1,
			Self::Add(a, b) | Self::Sub(a, b) => a.degree().max(b.degree()),
			Self::Mul(a, b) => a.degree() + b.degree(),
			Self::Neg(a) => a.degree(),
		}
	}

	/// The common size of the referenced columns. Panics if they disagree.
	pub fn size(&self, columns: &ColumnSet) -> Option<usize> {
		let mut size = None;
		for column in self.columns() {
			let column_size = columns.size(column.id());
			match size {
				None => size = Some(column_size),
				Some(size) => assert_eq!(
					size,
					column_size,
					"expression mixes columns of different sizes ({})",
					columns.name(column.id())
				),
			}
		}
		size
	}

	/// Evaluates the expression at a single row, reading shifted columns cyclically.
	pub fn evaluate_at<C: EvalContext + ?Sized>(&self, ctx: &C, row: usize) -> Result<E, Error> {
		let value = match self {
			Self::Constant(value) => *value,
			Self::Coin(id) => ctx.coin_value(*id)?,
			Self::Column(column) => {
				let values = ctx.column_values(column.id())?;
				values.get_ext(column.read_index(row, values.len()))
			}
			Self::Add(a, b) => a.evaluate_at(ctx, row)? + b.evaluate_at(ctx, row)?,
			Self::Sub(a, b) => a.evaluate_at(ctx, row)? - b.evaluate_at(ctx, row)?,
			Self::Mul(a, b) => a.evaluate_at(ctx, row)? * b.evaluate_at(ctx, row)?,
			Self::Neg(a) => -a.evaluate_at(ctx, row)?,
		};
		Ok(value)
	}

	/// Evaluates the expression on every row. The result stays in the base field
	/// unless an extension constant, a coin or an extension column is involved.
	pub fn evaluate<C: EvalContext + ?Sized>(
		&self,
		ctx: &C,
		size: usize,
	) -> Result<ColumnValues, Error> {
		let values = match evaluate_node(self, ctx, size)? {
			Evaluated::Base(Operand::Scalar(value)) => ColumnValues::Base(vec![value; size]),
			Evaluated::Base(Operand::Vector(values)) => ColumnValues::Base(values),
			Evaluated::Ext(Operand::Scalar(value)) => ColumnValues::Ext(vec![value; size]),
			Evaluated::Ext(Operand::Vector(values)) => ColumnValues::Ext(values),
		};
		Ok(values)
	}
}

/// `Σ_c coin^c · terms[c]`, built in Horner form. A single term is returned as is.
pub fn rand_lin_comb(coin: &Expr, terms: &[Expr]) -> Expr {
	let Some((last, rest)) = terms.split_last() else {
		panic!("a linear combination needs at least one term");
	};
	rest.iter()
		.rev()
		.fold(last.clone(), |acc, term| term.clone() + coin.clone() * acc)
}

enum Operand<F> {
	Scalar(F),
	Vector(Vec<F>),
}

enum Evaluated {
	Base(Operand<B>),
	Ext(Operand<E>),
}

impl Evaluated {
	fn into_ext(self) -> Operand<E> {
		match self {
			Self::Base(Operand::Scalar(value)) => Operand::Scalar(value.into()),
			Self::Base(Operand::Vector(values)) => {
				Operand::Vector(values.into_par_iter().map(E::from).collect())
			}
			Self::Ext(operand) => operand,
		}
	}
}

#[derive(Clone, Copy)]
enum BinaryOp {
	Add,
	Sub,
	Mul,
}

impl BinaryOp {
	#[inline]
	fn apply<F: Field>(self, a: F, b: F) -> F {
		match self {
			Self::Add => a + b,
			Self::Sub => a - b,
			Self::Mul => a * b,
		}
	}

	fn combine<F: Field>(self, lhs: Operand<F>, rhs: Operand<F>) -> Operand<F> {
		match (lhs, rhs) {
			(Operand::Scalar(a), Operand::Scalar(b)) => Operand::Scalar(self.apply(a, b)),
			(Operand::Vector(mut a), Operand::Scalar(b)) => {
				a.par_iter_mut().for_each(|x| *x = self.apply(*x, b));
				Operand::Vector(a)
			}
			(Operand::Scalar(a), Operand::Vector(mut b)) => {
				b.par_iter_mut().for_each(|x| *x = self.apply(a, *x));
				Operand::Vector(b)
			}
			(Operand::Vector(mut a), Operand::Vector(b)) => {
				a.par_iter_mut()
					.zip(b.par_iter())
					.for_each(|(x, y)| *x = self.apply(*x, *y));
				Operand::Vector(a)
			}
		}
	}
}

fn evaluate_node<C: EvalContext + ?Sized>(
	expr: &Expr,
	ctx: &C,
	size: usize,
) -> Result<Evaluated, Error> {
	let evaluated = match expr {
		Expr::Constant(value) => match ExtensionField::<B>::try_into_base(value) {
			Some(base) => Evaluated::Base(Operand::Scalar(base)),
			None => Evaluated::Ext(Operand::Scalar(*value)),
		},
		Expr::Coin(id) => Evaluated::Ext(Operand::Scalar(ctx.coin_value(*id)?)),
		Expr::Column(column) => {
			let values = ctx.column_values(column.id())?;
			if values.len() != size {
				bail!(Error::ExpressionSizeMismatch {
					expected: size,
					got: values.len(),
				});
			}
			match values.rotated(column.shift()) {
				ColumnValues::Base(values) => Evaluated::Base(Operand::Vector(values)),
				ColumnValues::Ext(values) => Evaluated::Ext(Operand::Vector(values)),
			}
		}
		Expr::Neg(a) => match evaluate_node(a, ctx, size)? {
			Evaluated::Base(operand) => Evaluated::Base(negate(operand)),
			Evaluated::Ext(operand) => Evaluated::Ext(negate(operand)),
		},
		Expr::Add(a, b) => binary(BinaryOp::Add, a, b, ctx, size)?,
		Expr::Sub(a, b) => binary(BinaryOp::Sub, a, b, ctx, size)?,
		Expr::Mul(a, b) => binary(BinaryOp::Mul, a, b, ctx, size)?,
	};
	Ok(evaluated)
}

fn negate<F: Field>(operand: Operand<F>) -> Operand<F> {
	match operand {
		Operand::Scalar(value) => Operand::Scalar(-value),
		Operand::Vector(mut values) => {
			values.par_iter_mut().for_each(|x| *x = -*x);
			Operand::Vector(values)
		}
	}
}

fn binary<C: EvalContext + ?Sized>(
	op: BinaryOp,
	a: &Expr,
	b: &Expr,
	ctx: &C,
	size: usize,
) -> Result<Evaluated, Error> {
	let lhs = evaluate_node(a, ctx, size)?;
	let rhs = evaluate_node(b, ctx, size)?;
	let evaluated = match (lhs, rhs) {
		(Evaluated::Base(lhs), Evaluated::Base(rhs)) => Evaluated::Base(op.combine(lhs, rhs)),
		(lhs, rhs) => Evaluated::Ext(op.combine(lhs.into_ext(), rhs.into_ext())),
	};
	Ok(evaluated)
}

impl From<Column> for Expr {
	fn from(column: Column) -> Self {
		Self::Column(column)
	}
}

impl From<CoinId> for Expr {
	fn from(id: CoinId) -> Self {
		Self::Coin(id)
	}
}

impl From<B> for Expr {
	fn from(value: B) -> Self {
		Self::Constant(value.into())
	}
}

impl From<E> for Expr {
	fn from(value: E) -> Self {
		Self::Constant(value)
	}
}

macro_rules! impl_expr_ops {
	($lhs:ty) => {
		impl<T: Into<Expr>> Add<T> for $lhs {
			type Output = Expr;

			fn add(self, rhs: T) -> Expr {
				Expr::Add(Box::new(self.into()), Box::new(rhs.into()))
			}
		}

		impl<T: Into<Expr>> Sub<T> for $lhs {
			type Output = Expr;

			fn sub(self, rhs: T) -> Expr {
				Expr::Sub(Box::new(self.into()), Box::new(rhs.into()))
			}
		}

		impl<T: Into<Expr>> Mul<T> for $lhs {
			type Output = Expr;

			fn mul(self, rhs: T) -> Expr {
				Expr::Mul(Box::new(self.into()), Box::new(rhs.into()))
			}
		}

		impl Neg for $lhs {
			type Output = Expr;

			fn neg(self) -> Expr {
				Expr::Neg(Box::new(self.into()))
			}
		}
	};
}

impl_expr_ops!(Expr);
impl_expr_ops!(Column);

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use super::*;
	use crate::column::ColumnId;

	#[derive(Default)]
	struct MapContext {
		columns: HashMap<ColumnId, ColumnValues>,
		coins: HashMap<CoinId, E>,
	}

	impl EvalContext for MapContext {
		fn column_values(&self, id: ColumnId) -> Result<&ColumnValues, Error> {
			self.columns.get(&id).ok_or_else(|| Error::MissingColumn {
				name: format!("{id:?}"),
			})
		}

		fn coin_value(&self, id: CoinId) -> Result<E, Error> {
			self.coins.get(&id).copied().ok_or_else(|| Error::CoinNotSampled {
				name: format!("{id:?}"),
			})
		}
	}

	fn context() -> (MapContext, Column, Column, CoinId) {
		let mut ctx = MapContext::default();
		let a = Column::new(ColumnId(0));
		let b = Column::new(ColumnId(1));
		let coin = CoinId(0);
		ctx.columns.insert(a.id(), ColumnValues::from_u64s([1, 2, 3, 4]));
		ctx.columns.insert(b.id(), ColumnValues::from_u64s([5, 6, 7, 8]));
		ctx.coins.insert(coin, E::from_u64(10));
		(ctx, a, b, coin)
	}

	#[test]
	fn test_base_expression_stays_in_base_field() {
		let (ctx, a, b, _) = context();
		let expr = a * b - Expr::constant(B::from(1u32));
		assert_eq!(expr.evaluate(&ctx, 4).unwrap(), ColumnValues::from_u64s([4, 11, 20, 31]));
	}

	#[test]
	fn test_coin_lifts_to_extension() {
		let (ctx, a, _, coin) = context();
		let expr = Expr::coin(coin) + a;
		let values = expr.evaluate(&ctx, 4).unwrap();
		assert!(!values.is_base());
		assert_eq!(values.get_ext(3), E::from_u64(14));
	}

	#[test]
	fn test_row_evaluation_matches_vector_evaluation() {
		let (ctx, a, b, coin) = context();
		let expr = a.shifted(1) * Expr::coin(coin) - b.shifted(-1) + Expr::one();
		let values = expr.evaluate(&ctx, 4).unwrap();
		for row in 0..4 {
			assert_eq!(expr.evaluate_at(&ctx, row).unwrap(), values.get_ext(row));
		}
		assert_eq!(expr.shift_range(), (-1, 1));
	}

	#[test]
	fn test_rand_lin_comb() {
		let (ctx, a, b, coin) = context();
		let single = rand_lin_comb(&Expr::coin(coin), &[a.into()]);
		assert_eq!(single, Expr::from(a));

		let combined = rand_lin_comb(&Expr::coin(coin), &[a.into(), b.into()]);
		assert_eq!(combined.evaluate_at(&ctx, 0).unwrap(), E::from_u64(1 + 10 * 5));
	}

	#[test]
	fn test_size_mismatch_is_reported() {
		let (ctx, a, _, _) = context();
		let expr: Expr = a.into();
		assert!(matches!(
			expr.evaluate(&ctx, 8),
			Err(Error::ExpressionSizeMismatch {
				expected: 8,
				got: 4
			})
		));
	}
}
