//! Statistical character-level language models.
//!
//! This module provides:
//! - Empirical distributions and conditional distributions (`Distribution`, `ConditionalDistribution`)
//! - Sliding-window n-gram statistics over a corpus (`NGramStatistics`)
//! - A Markov chain fitted from those statistics, able to score and generate text (`MarkovModel`)

/// Probability containers shared by the statistics and the Markov model.
///
/// Provides normalization from counts, defaulted lookups, entropy
/// and inverse-CDF sampling.
pub mod distribution;

/// N-gram extraction, counting, entropy and model fitting over a corpus.
pub mod statistics;

/// Markov chain over characters.
///
/// Scores strings in log space and generates text by categorical sampling.
pub mod markov_model;
