// Copyright 2025 Irreducible Inc.

use quill_utils::bail;
use rayon::prelude::*;

use crate::{
	column::Column,
	error::{Error, VerificationError},
	expr::{EvalContext, Expr},
	types::E,
};

/// Inner products of one column against several others of the same size.
#[derive(Debug, Clone)]
pub struct InnerProduct {
	pub a: Column,
	pub bs: Vec<Column>,
	pub size: usize,
}

impl InnerProduct {
	pub fn columns(&self) -> Vec<Column> {
		std::iter::once(self.a).chain(self.bs.iter().copied()).collect()
	}

	pub fn compute<C: EvalContext + ?Sized>(&self, ctx: &C) -> Result<Vec<E>, Error> {
		let a = Expr::from(self.a).evaluate(ctx, self.size)?.into_ext_vec();
		self.bs
			.iter()
			.map(|&b| {
				let b = Expr::from(b).evaluate(ctx, self.size)?.into_ext_vec();
				Ok(a.par_iter().zip(b.par_iter()).map(|(x, y)| *x * *y).sum())
			})
			.collect()
	}

	pub fn check<C: EvalContext + ?Sized>(
		&self,
		name: &str,
		ctx: &C,
		claimed: &[E],
	) -> Result<(), Error> {
		let actual = self.compute(ctx)?;
		if claimed.len() != actual.len() {
			bail!(Error::MalformedProof(format!(
				"inner product {name} expects {} values, got {}",
				actual.len(),
				claimed.len()
			)));
		}
		if let Some((index, (&claimed, &actual))) = claimed
			.iter()
			.zip(&actual)
			.enumerate()
			.find(|(_, (claimed, actual))| claimed != actual)
		{
			bail!(VerificationError::InnerProductMismatch {
				name: name.to_string(),
				index,
				claimed,
				actual,
			});
		}
		Ok(())
	}
}
