// Copyright 2025 Irreducible Inc.

//! Closes the remaining queries by checking them directly on the revealed
//! columns.

use tracing::instrument;

use crate::{
	error::Error,
	iop::{CompiledIop, VerifierAction},
	query::{Query, QueryId},
	verifier::VerifierRuntime,
};

struct DirectCheck {
	query: QueryId,
}

impl VerifierAction for DirectCheck {
	fn run(&self, run: &VerifierRuntime<'_>) -> Result<(), Error> {
		let info = run.iop().queries().get(self.query);
		let name = info.name();
		match info.query() {
			Query::Global(constraint) => constraint.check(name, run),
			Query::Local(constraint) => constraint.check(name, run),
			Query::LocalOpening(opening) => {
				opening.check(name, run, run.get_local_opening(self.query)?)
			}
			Query::InnerProduct(inner_product) => {
				inner_product.check(name, run, run.get_inner_product(self.query)?)
			}
			Query::Inclusion(inclusion) => inclusion.check(name, run),
			Query::Projection(projection) => projection.check(name, run),
			Query::Horner(horner) => horner.check(name, run, run.get_horner_params(self.query)?),
			Query::LogDerivativeSum(sum) => {
				sum.check(name, run, run.get_log_deriv_sum_params(self.query)?)
			}
		}
	}
}

/// Registers a direct verifier check for every active query and marks the
/// queries as compiled.
#[instrument(skip_all, name = "dummy::compile", level = "debug")]
pub fn compile(iop: &mut CompiledIop) {
	let queries = iop
		.queries()
		.active()
		.map(|info| (info.id(), info.round()))
		.collect::<Vec<_>>();
	tracing::debug!(queries = queries.len(), "checking remaining queries directly");

	for (query, round) in queries {
		iop.ignore_query(query);
		iop.register_verifier_action(round, DirectCheck { query });
	}
}
