// Copyright 2025 Irreducible Inc.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a formatting subscriber filtered by `RUST_LOG` (defaults to `info`).
///
/// Calling it more than once is harmless: later calls leave the first subscriber in place.
pub fn init_tracing() {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

	let _ = tracing_subscriber::registry()
		.with(filter)
		.with(tracing_subscriber::fmt::layer())
		.try_init();
}
