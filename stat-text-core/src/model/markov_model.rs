use rand::Rng;

use serde::{Deserialize, Serialize};

use crate::error::{StatError, StatResult};
use super::distribution::{ConditionalDistribution, Distribution};

/// Probability assigned to events never observed while fitting.
pub const DEFAULT_FAKE_ZERO: f64 = 1e-6;

/// Character-level Markov chain fitted from n-gram distributions.
///
/// The model holds:
/// - `initial_distribution`: probabilities of whole n-grams, used for the first
///   window of a string
/// - `conditional_distribution`: probability of the next character given the
///   previous `n_gram_length - 1` characters
/// - `fake_zero`: smoothing probability answered for any unseen key
///
/// # Invariants
/// - `n_gram_length >= 1` and every initial key has that many characters
/// - The model is never mutated after construction; unseen keys are answered
///   on lookup, not inserted
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MarkovModel {
	n_gram_length: usize,
	fake_zero: f64,
	initial_distribution: Distribution,
	conditional_distribution: ConditionalDistribution,
}

impl MarkovModel {
	/// Builds a model from its two fitted distributions.
	///
	/// `n_gram_length` is taken from the width (in characters) of the initial keys.
	///
	/// # Errors
	/// - `EmptyDistribution` if `initial` has no key
	/// - `InvalidArgument` if the initial keys do not all share the same width
	pub fn new(initial: Distribution, conditional: ConditionalDistribution) -> StatResult<Self> {
		let Some(first) = initial.keys().next() else {
			return Err(StatError::empty_distribution(
				"a Markov model needs at least one initial n-gram",
			));
		};

		let n_gram_length = first.chars().count();
		if n_gram_length == 0 {
			return Err(StatError::invalid_argument("initial n-grams cannot be empty strings"));
		}
		if let Some(key) = initial.keys().find(|key| key.chars().count() != n_gram_length) {
			return Err(StatError::invalid_argument(format!(
				"initial n-gram '{}' has length {}, expected {}",
				key,
				key.chars().count(),
				n_gram_length
			)));
		}

		Ok(Self {
			n_gram_length,
			fake_zero: DEFAULT_FAKE_ZERO,
			initial_distribution: initial,
			conditional_distribution: conditional,
		})
	}

	/// Replaces the smoothing probability.
	///
	/// # Errors
	/// Returns `InvalidArgument` unless `0 < fake_zero <= 1`.
	pub fn with_fake_zero(mut self, fake_zero: f64) -> StatResult<Self> {
		if !(fake_zero > 0.0 && fake_zero <= 1.0) {
			return Err(StatError::invalid_argument(format!(
				"fake_zero must be in (0, 1], got {fake_zero}"
			)));
		}
		self.fake_zero = fake_zero;
		Ok(self)
	}

	pub fn n_gram_length(&self) -> usize {
		self.n_gram_length
	}

	pub fn fake_zero(&self) -> f64 {
		self.fake_zero
	}

	pub fn initial_distribution(&self) -> &Distribution {
		&self.initial_distribution
	}

	pub fn conditional_distribution(&self) -> &ConditionalDistribution {
		&self.conditional_distribution
	}

	/// Draws one key from `distribution` by inverse-CDF sampling.
	///
	/// # Errors
	/// Returns `EmptyDistribution` if `distribution` has no key.
	pub fn sample_categorical<'d, R: Rng + ?Sized>(
		distribution: &'d Distribution,
		rng: &mut R,
	) -> StatResult<&'d str> {
		distribution.sample(rng)
	}

	/// Probability of observing `input_string` under the model.
	///
	/// The first window of `n_gram_length` characters is scored with the initial
	/// distribution; every following window with `P(last char | preceding chars)`.
	/// Unseen events count as `fake_zero`. The per-window probabilities are
	/// combined as a sum of natural logs, returned as is when `log` is set and
	/// exponentiated otherwise.
	///
	/// # Errors
	/// Returns `InvalidArgument` if the string is shorter than `n_gram_length`.
	pub fn string_probability(&self, input_string: &str, log: bool) -> StatResult<f64> {
		let chars: Vec<char> = input_string.chars().collect();
		if chars.len() < self.n_gram_length {
			return Err(StatError::invalid_argument(format!(
				"Input string length is {}, which is less than this model's length of {}",
				chars.len(),
				self.n_gram_length
			)));
		}

		let head: String = chars[..self.n_gram_length].iter().collect();
		let mut log_probability = self.initial_distribution.get_or(&head, self.fake_zero).ln();

		for window in chars.windows(self.n_gram_length).skip(1) {
			let (prefix, last) = window.split_at(self.n_gram_length - 1);
			let prefix: String = prefix.iter().collect();
			let last: String = last.iter().collect();
			log_probability += self
				.conditional_distribution
				.lookup(&prefix, &last, self.fake_zero)
				.ln();
		}

		if log {
			Ok(log_probability)
		} else {
			Ok(log_probability.exp())
		}
	}

	/// Generates `size` characters using the thread-local random generator.
	///
	/// See [`Self::generate_text_with`].
	pub fn generate_text(&self, size: usize) -> StatResult<String> {
		self.generate_text_with(size, &mut rand::rng())
	}

	/// Generates `size` characters, drawing from `rng`.
	///
	/// A seed n-gram is sampled from the initial distribution, then each next
	/// character is sampled from the conditional distribution of the last
	/// `n_gram_length - 1` characters. When `size < n_gram_length`, only the
	/// seed is returned.
	///
	/// # Errors
	/// Returns `EmptyDistribution` if the rolling prefix was never followed by
	/// any character in the fitted corpus.
	pub fn generate_text_with<R: Rng + ?Sized>(&self, size: usize, rng: &mut R) -> StatResult<String> {
		let seed = Self::sample_categorical(&self.initial_distribution, rng)?;
		let mut text = seed.to_owned();

		let mut prefix: String = seed.chars().skip(1).collect();
		for _ in 0..size.saturating_sub(self.n_gram_length) {
			let distribution = self.conditional_distribution.get(&prefix).ok_or_else(|| {
				StatError::empty_distribution(format!("no continuation observed after '{prefix}'"))
			})?;
			let next = Self::sample_categorical(distribution, rng)?;
			text.push_str(next);

			prefix.push_str(next);
			prefix.remove(0);
		}

		log::debug!("generated {} characters from seed '{}'", text.chars().count(), seed);
		Ok(text)
	}
}
