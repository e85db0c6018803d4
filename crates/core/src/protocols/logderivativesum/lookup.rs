// Copyright 2025 Irreducible Inc.

//! Reduces inclusion queries to a single log-derivative sum.
//!
//! Inclusions are grouped by table. For every table `T` with fragments `T_f`,
//! multiplicity columns `M_f` are committed and the catalog receives
//!
//! * `-M_f / (γ + T_f)` for every fragment,
//! * `filter / (γ + S)` for every checked table `S`,
//!
//! where multi-column sides are first collapsed with a coin `α`. The inclusions
//! hold exactly when the catalog sums to zero.

use std::{borrow::Cow, collections::BTreeMap, sync::Arc};

use quill_field::Field;
use quill_utils::ensure;
use rand::{rngs::StdRng, SeedableRng};
use rayon::prelude::*;
use tracing::instrument;

use super::multiplicity::{CheckedTable, MultiplicityEngine, Segment, TableFragment};
use crate::{
	coin::CoinKind,
	column::{Column, ColumnId, ColumnSet, ColumnValues},
	error::{Error, VerificationError},
	expr::{rand_lin_comb, EvalContext, Expr},
	iop::{CompiledIop, ProverAction, VerifierAction},
	prover::ProverRuntime,
	query::{Inclusion, LogDerivativeSum, LogDerivativeSumPart, Query, QueryId},
	types::{B, E},
	verifier::VerifierRuntime,
};

/// Name of the log-derivative sum collecting every lookup of the IOP.
pub const LOOKUP_SUM_NAME: &str = "LOOKUP_LOGDERIVATIVE_SUM";

/// Restricts the rows of a column that take part in lookups, as used when a
/// column is proven in segments.
pub trait ColumnSegmenter: Send + Sync {
	/// Active window `[start, stop)` of `column`. The bounds may exceed the
	/// physical rows; the boundary rows then stand for the rows outside.
	fn segment_boundary_of(&self, run: &ProverRuntime<'_>, column: ColumnId) -> (isize, isize);
}

#[derive(Clone, Default)]
pub struct LookupCompilerOptions {
	/// Overrides the number of hash buckets of the multiplicity engine.
	pub num_buckets: Option<usize>,
	pub segmenter: Option<Arc<dyn ColumnSegmenter>>,
}

impl LookupCompilerOptions {
	fn engine(&self) -> MultiplicityEngine {
		match self.num_buckets {
			Some(num_buckets) => MultiplicityEngine::new(num_buckets),
			None => MultiplicityEngine::default(),
		}
	}
}

#[derive(Debug, Clone)]
struct CheckedSide {
	name: String,
	columns: Vec<Column>,
	/// `None` when the inclusion is unconditional on the included side.
	filter: Option<Column>,
	/// Numerator of the side in the catalog: the filter or the all-ones column.
	numerator: Column,
}

#[derive(Debug, Clone)]
struct TableGroup {
	fragments: Vec<Vec<Column>>,
	checked: Vec<CheckedSide>,
	round: usize,
}

fn column_label(columns: &ColumnSet, column: Column) -> String {
	match column.shift() {
		0 => columns.name(column.id()).to_string(),
		shift => format!("{}@{shift}", columns.name(column.id())),
	}
}

fn labels(columns: &ColumnSet, group: &[Column]) -> String {
	group
		.iter()
		.map(|&column| column_label(columns, column))
		.collect::<Vec<_>>()
		.join(",")
}

/// Brings an inclusion to canonical form: table columns sorted by name, table
/// filters folded in as a leading column and included filters always present.
fn canonicalize(iop: &mut CompiledIop, inclusion: &Inclusion) -> (String, Vec<Vec<Column>>, CheckedSide) {
	let columns = iop.columns();
	let mut order = (0..inclusion.included.len()).collect::<Vec<_>>();
	order.sort_by_cached_key(|&i| column_label(columns, inclusion.including[0][i]));

	let mut fragments = inclusion
		.including
		.iter()
		.map(|fragment| order.iter().map(|&i| fragment[i]).collect::<Vec<_>>())
		.collect::<Vec<_>>();
	let mut included = order.iter().map(|&i| inclusion.included[i]).collect::<Vec<_>>();
	let checked_name = labels(columns, &included);
	let included_size = columns.size(included[0].id());

	if let Some(filters) = &inclusion.including_filter {
		for (fragment, &filter) in fragments.iter_mut().zip(filters) {
			fragment.insert(0, filter);
		}
		included.insert(0, iop.constant_one_column(included_size));
	}

	let numerator = match inclusion.included_filter {
		Some(filter) => filter,
		None => iop.constant_one_column(included_size),
	};

	let columns = iop.columns();
	let key = format!(
		"TABLE_{}",
		fragments
			.iter()
			.map(|fragment| labels(columns, fragment))
			.collect::<Vec<_>>()
			.join("|")
	);

	let checked = CheckedSide {
		name: checked_name,
		columns: included,
		filter: inclusion.included_filter,
		numerator,
	};
	(key, fragments, checked)
}

/// Compiles every active inclusion query with the default options.
pub fn compile_lookups(iop: &mut CompiledIop) {
	compile_lookups_with_options(iop, &LookupCompilerOptions::default());
}

#[instrument(skip_all, name = "logderivativesum::compile_lookups", level = "debug")]
pub fn compile_lookups_with_options(iop: &mut CompiledIop, options: &LookupCompilerOptions) {
	let inclusions = iop
		.queries()
		.active()
		.filter_map(|info| match info.query() {
			Query::Inclusion(inclusion) => Some((info.id(), info.round(), inclusion.clone())),
			_ => None,
		})
		.collect::<Vec<_>>();
	if inclusions.is_empty() {
		return;
	}

	let mut tables = BTreeMap::<String, TableGroup>::new();
	for (id, round, inclusion) in &inclusions {
		iop.ignore_query(*id);
		let (key, fragments, checked) = canonicalize(iop, inclusion);
		let group = tables.entry(key).or_insert_with(|| TableGroup {
			fragments,
			checked: Vec::new(),
			round: *round,
		});
		group.round = group.round.max(*round);
		group.checked.push(checked);
	}

	tracing::debug!(
		inclusions = inclusions.len(),
		tables = tables.len(),
		"grouped inclusion queries by table"
	);

	let engine = options.engine();
	let mut catalog = LogDerivativeSum::new();
	let mut tasks = BTreeMap::<usize, Vec<MAssignmentTask>>::new();
	let mut sum_round = 0;

	for (key, group) in tables {
		let round = group.round;
		let coin_round = round + 1;
		sum_round = sum_round.max(coin_round);

		let m = group
			.fragments
			.iter()
			.enumerate()
			.map(|(frag, fragment)| {
				let size = iop.columns().size(fragment[0].id());
				iop.insert_commit(round, format!("{key}_M_{frag}"), size)
			})
			.collect::<Vec<_>>();

		let gamma = Expr::coin(iop.insert_coin(coin_round, format!("{key}_GAMMA"), CoinKind::Ext));
		let alpha = (group.fragments[0].len() > 1)
			.then(|| Expr::coin(iop.insert_coin(coin_round, format!("{key}_ALPHA"), CoinKind::Ext)));
		let collapse = |columns: &[Column]| -> Expr {
			let terms = columns.iter().map(|&column| Expr::from(column)).collect::<Vec<_>>();
			match &alpha {
				Some(alpha) => rand_lin_comb(alpha, &terms),
				None => terms[0].clone(),
			}
		};

		for (fragment, &m) in group.fragments.iter().zip(&m) {
			let size = iop.columns().size(m.id());
			catalog.push(size, LogDerivativeSumPart::new(-m, gamma.clone() + collapse(fragment)));
		}
		for checked in &group.checked {
			let size = iop.columns().size(checked.numerator.id());
			catalog.push(
				size,
				LogDerivativeSumPart::new(checked.numerator, gamma.clone() + collapse(&checked.columns)),
			);
		}

		tasks.entry(round).or_default().push(MAssignmentTask {
			table: key,
			fragments: group.fragments,
			checked: group.checked,
			m,
			engine,
			segmenter: options.segmenter.clone(),
		});
	}

	for (round, tasks) in tasks {
		iop.register_prover_action(round, LookupProverTask { tasks });
	}

	let query = iop.insert_log_derivative_sum(sum_round, LOOKUP_SUM_NAME, catalog);
	iop.register_prover_action(sum_round, AssignZeroSum { query });
	iop.register_verifier_action(sum_round, CheckZeroSum { query });
}

/// Computes and assigns the `M` columns of one table.
struct MAssignmentTask {
	table: String,
	fragments: Vec<Vec<Column>>,
	checked: Vec<CheckedSide>,
	m: Vec<Column>,
	engine: MultiplicityEngine,
	segmenter: Option<Arc<dyn ColumnSegmenter>>,
}

fn read_column<'r>(run: &'r ProverRuntime<'_>, column: Column) -> Result<Cow<'r, ColumnValues>, Error> {
	let values = run.column_values(column.id())?;
	Ok(match column.shift() {
		0 => Cow::Borrowed(values),
		shift => Cow::Owned(values.rotated(shift)),
	})
}

impl MAssignmentTask {
	fn segment(&self, run: &ProverRuntime<'_>, column: Column) -> Option<Segment> {
		self.segmenter.as_ref().map(|segmenter| {
			let (start, stop) = segmenter.segment_boundary_of(run, column.id());
			Segment::new(start, stop)
		})
	}

	fn compute(&self, run: &ProverRuntime<'_>) -> Result<Vec<Vec<B>>, Error> {
		let fragment_values = self
			.fragments
			.iter()
			.map(|fragment| fragment.iter().map(|&column| read_column(run, column)).collect())
			.collect::<Result<Vec<Vec<_>>, Error>>()?;
		let checked_values = self
			.checked
			.iter()
			.map(|side| side.columns.iter().map(|&column| read_column(run, column)).collect())
			.collect::<Result<Vec<Vec<_>>, Error>>()?;
		let filter_values = self
			.checked
			.iter()
			.map(|side| side.filter.map(|filter| read_column(run, filter)).transpose())
			.collect::<Result<Vec<_>, Error>>()?;

		let fragments = self
			.fragments
			.iter()
			.zip(&fragment_values)
			.map(|(fragment, values)| TableFragment {
				columns: values.iter().map(|values| &**values).collect(),
				segment: self.segment(run, fragment[0]),
			})
			.collect::<Vec<_>>();
		let checked = self
			.checked
			.iter()
			.zip(checked_values.iter().zip(&filter_values))
			.map(|(side, (values, filter))| {
				let mut table =
					CheckedTable::new(&side.name, values.iter().map(|values| &**values).collect());
				table.segment = self.segment(run, side.columns[0]);
				if let (Some(column), Some(values)) = (side.filter, filter) {
					table = table.with_filter(run.iop().columns().name(column.id()), &**values);
				}
				table
			})
			.collect::<Vec<_>>();

		let mut rng = StdRng::from_entropy();
		Ok(self.engine.compute(&self.table, &fragments, &checked, &mut rng)?)
	}
}

/// Runs the `M` assignments of every table scheduled on a round in parallel.
struct LookupProverTask {
	tasks: Vec<MAssignmentTask>,
}

impl ProverAction for LookupProverTask {
	#[instrument(skip_all, name = "logderivativesum::assign_multiplicities", level = "debug")]
	fn run(&self, run: &mut ProverRuntime<'_>) -> Result<(), Error> {
		let shared: &ProverRuntime<'_> = run;
		let results = self
			.tasks
			.par_iter()
			.map(|task| task.compute(shared))
			.collect::<Vec<_>>();

		for (task, multiplicities) in self.tasks.iter().zip(results) {
			for (&column, values) in task.m.iter().zip(multiplicities?) {
				run.assign_column(column, values)?;
			}
		}
		Ok(())
	}
}

struct AssignZeroSum {
	query: QueryId,
}

impl ProverAction for AssignZeroSum {
	fn run(&self, run: &mut ProverRuntime<'_>) -> Result<(), Error> {
		run.assign_log_deriv_sum(self.query, E::ZERO)
	}
}

struct CheckZeroSum {
	query: QueryId,
}

impl VerifierAction for CheckZeroSum {
	fn run(&self, run: &VerifierRuntime<'_>) -> Result<(), Error> {
		let sum = run.get_log_deriv_sum_params(self.query)?;
		ensure!(
			sum.is_zero(),
			VerificationError::LookupSumNotZero {
				query: LOOKUP_SUM_NAME.to_string(),
				sum,
			}
		);
		Ok(())
	}
}
