//! Character-level n-gram statistics and Markov text models.
//!
//! This crate provides:
//! - Sliding-window n-gram extraction, frequency counts and Shannon entropy
//! - Empirical and conditional probability distributions
//! - A Markov chain to score the probability of a string and generate new text
//! - Text normalization and corpus file helpers used by the binaries

/// Error type shared by every operation of the crate.
pub mod error;

/// N-gram statistics, distributions and the Markov model.
pub mod model;

/// Text normalization (case folding, removal of digits, punctuation and symbols).
pub mod text;

/// I/O utilities (corpus loading, path helpers).
pub mod io;

pub use error::{StatError, StatResult};
pub use model::distribution::{ConditionalDistribution, Counts, Distribution};
pub use model::markov_model::{DEFAULT_FAKE_ZERO, MarkovModel};
pub use model::statistics::NGramStatistics;
