// Copyright 2025 Irreducible Inc.

/// Returns early with the given error converted into the function's error type.
///
/// With the `bail_panic` feature enabled the macro panics instead, which makes the
/// detection site show up in the backtrace when debugging a failing proof.
#[cfg(feature = "bail_panic")]
#[macro_export]
macro_rules! bail {
	($err:expr) => {
		panic!("{}", $err);
	};
}

#[cfg(not(feature = "bail_panic"))]
#[macro_export]
macro_rules! bail {
	($err:expr) => {
		return Err($err.into());
	};
}

/// Bails with the given error unless the condition holds.
#[macro_export]
macro_rules! ensure {
	($cond:expr, $err:expr) => {
		if !$cond {
			$crate::bail!($err);
		}
	};
}

#[cfg(all(test, not(feature = "bail_panic")))]
mod tests {
	#[derive(Debug, PartialEq, Eq)]
	struct Failure(u32);

	fn checked(value: u32) -> Result<u32, Failure> {
		ensure!(value < 10, Failure(value));
		Ok(value)
	}

	#[test]
	fn test_ensure_returns_error() {
		assert_eq!(checked(3), Ok(3));
		assert_eq!(checked(12), Err(Failure(12)));
	}
}
