// Copyright 2025 Irreducible Inc.

use std::collections::HashMap;

use getset::{CopyGetters, Getters};

use crate::{
	error::Error,
	expr::{EvalContext, Expr},
	types::E,
};

/// Index of a coin in the [`CoinSet`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CoinId(pub(crate) usize);

impl CoinId {
	pub fn index(&self) -> usize {
		self.0
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoinKind {
	/// A base field element, lifted into the extension when read.
	Base,
	/// A uniformly random extension field element.
	Ext,
}

#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct CoinInfo {
	#[get_copy = "pub"]
	id: CoinId,
	#[get = "pub"]
	name: String,
	#[get_copy = "pub"]
	round: usize,
	#[get_copy = "pub"]
	kind: CoinKind,
}

/// Arena of the public coins of an IOP.
#[derive(Debug, Default, Clone)]
pub struct CoinSet {
	coins: Vec<CoinInfo>,
	by_name: HashMap<String, CoinId>,
}

impl CoinSet {
	pub fn insert(&mut self, round: usize, name: impl ToString, kind: CoinKind) -> CoinId {
		let name = name.to_string();
		assert!(!name.is_empty(), "coin names must not be empty");
		assert!(!self.by_name.contains_key(&name), "coin {name} is already registered");
		let id = CoinId(self.coins.len());
		self.by_name.insert(name.clone(), id);
		self.coins.push(CoinInfo {
			id,
			name,
			round,
			kind,
		});
		id
	}

	pub fn get(&self, id: CoinId) -> &CoinInfo {
		&self.coins[id.0]
	}

	pub fn by_name(&self, name: &str) -> Option<CoinId> {
		self.by_name.get(name).copied()
	}

	pub fn len(&self) -> usize {
		self.coins.len()
	}

	pub fn is_empty(&self) -> bool {
		self.coins.is_empty()
	}

	pub fn in_round(&self, round: usize) -> impl Iterator<Item = &CoinInfo> {
		self.coins.iter().filter(move |coin| coin.round == round)
	}

	pub fn max_round(&self) -> Option<usize> {
		self.coins.iter().map(|coin| coin.round).max()
	}
}

/// A scalar that is either read from a coin or fixed in the IOP description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessor {
	Coin(CoinId),
	Constant(E),
}

impl Accessor {
	pub fn to_expr(&self) -> Expr {
		match *self {
			Self::Coin(id) => Expr::coin(id),
			Self::Constant(value) => Expr::constant(value),
		}
	}

	pub fn value<C: EvalContext + ?Sized>(&self, ctx: &C) -> Result<E, Error> {
		match *self {
			Self::Coin(id) => ctx.coin_value(id),
			Self::Constant(value) => Ok(value),
		}
	}

	pub fn coin(&self) -> Option<CoinId> {
		match *self {
			Self::Coin(id) => Some(id),
			Self::Constant(_) => None,
		}
	}
}

impl From<CoinId> for Accessor {
	fn from(id: CoinId) -> Self {
		Self::Coin(id)
	}
}
