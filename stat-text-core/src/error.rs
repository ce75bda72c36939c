use thiserror::Error;

/// Errors raised by the statistics and Markov model operations.
///
/// Every error is detected and returned synchronously; nothing is retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatError {
	/// An argument is outside the domain of the operation
	/// (too-short input string, zero window, invalid smoothing constant...).
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),

	/// A normalization was attempted over zero observed n-grams.
	#[error("Numerically undefined: {0}")]
	NumericUndefined(String),

	/// A categorical draw was requested from a distribution without any key.
	#[error("Empty distribution: {0}")]
	EmptyDistribution(String),
}

impl StatError {
	pub fn invalid_argument(message: impl Into<String>) -> Self {
		StatError::InvalidArgument(message.into())
	}

	pub fn numeric_undefined(message: impl Into<String>) -> Self {
		StatError::NumericUndefined(message.into())
	}

	pub fn empty_distribution(message: impl Into<String>) -> Self {
		StatError::EmptyDistribution(message.into())
	}
}

pub type StatResult<T> = Result<T, StatError>;
