use std::collections::BTreeMap;

use rand::Rng;

use serde::{Deserialize, Serialize};

use crate::error::{StatError, StatResult};

/// Frequency table: n-gram (or suffix) mapped to its number of occurrences.
pub type Counts = BTreeMap<String, usize>;

/// Empirical probability distribution over fixed-length outcomes.
///
/// Keys are kept in lexicographic order, so iterating (and therefore sampling
/// with a seeded generator) is reproducible.
///
/// # Invariants
/// - Every probability lies in `[0, 1]`
/// - When built from counts, the probabilities sum to 1 over the observed keys
/// - Unobserved outcomes are absent, never stored with a zero probability
///
/// `from_counts` and `TryFrom` (used by deserialization) enforce the range;
/// `FromIterator` stores the values as given.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct Distribution {
	probabilities: BTreeMap<String, f64>,
}

impl Distribution {
	/// Normalizes a frequency table by its total count.
	///
	/// # Errors
	/// Returns `NumericUndefined` if the table holds no occurrence at all.
	pub fn from_counts(counts: &Counts) -> StatResult<Self> {
		let total: usize = counts.values().sum();
		if total == 0 {
			return Err(StatError::numeric_undefined(
				"cannot normalize a frequency table with no observation",
			));
		}
		Ok(Self::normalized(counts, total as f64))
	}

	/// Divides every count by `normalizer`, which must be strictly positive.
	pub(crate) fn normalized(counts: &Counts, normalizer: f64) -> Self {
		let probabilities = counts
			.iter()
			.filter(|(_, count)| **count > 0)
			.map(|(key, count)| (key.clone(), *count as f64 / normalizer))
			.collect();
		Self { probabilities }
	}

	/// Probability stored for `key`, if it was observed.
	pub fn get(&self, key: &str) -> Option<f64> {
		self.probabilities.get(key).copied()
	}

	/// Probability stored for `key`, or `fallback` when it was never observed.
	///
	/// The distribution is left untouched.
	pub fn get_or(&self, key: &str, fallback: f64) -> f64 {
		self.get(key).unwrap_or(fallback)
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.probabilities.contains_key(key)
	}

	pub fn len(&self) -> usize {
		self.probabilities.len()
	}

	pub fn is_empty(&self) -> bool {
		self.probabilities.is_empty()
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.probabilities.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
		self.probabilities.iter().map(|(k, v)| (k.as_str(), *v))
	}

	/// Sum of all stored probabilities (≈ 1.0 for a distribution built from counts).
	pub fn total(&self) -> f64 {
		self.probabilities.values().sum()
	}

	/// Shannon entropy of the distribution, in bits.
	pub fn entropy(&self) -> f64 {
		entropy_bits(self.probabilities.values().copied())
	}

	/// Draws one outcome by inverse-CDF sampling.
	///
	/// Walks the keys in order, accumulating probabilities, and returns the
	/// first key whose cumulative probability reaches a uniform draw in `[0, 1)`.
	/// If rounding keeps the cumulative sum below the draw, the last key is returned.
	///
	/// # Errors
	/// Returns `EmptyDistribution` if there is no key to draw from.
	pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> StatResult<&str> {
		let Some(last) = self.probabilities.keys().next_back() else {
			return Err(StatError::empty_distribution("no outcome to sample from"));
		};

		let draw: f64 = rng.random();
		let mut cumulative = 0.0;
		for (key, probability) in &self.probabilities {
			cumulative += probability;
			if cumulative >= draw {
				return Ok(key.as_str());
			}
		}

		Ok(last.as_str())
	}
}

impl TryFrom<BTreeMap<String, f64>> for Distribution {
	type Error = StatError;

	/// Rejects any probability outside `[0, 1]` (NaN included).
	fn try_from(probabilities: BTreeMap<String, f64>) -> StatResult<Self> {
		if let Some((key, probability)) = probabilities.iter().find(|(_, p)| !(0.0..=1.0).contains(*p)) {
			return Err(StatError::invalid_argument(format!(
				"probability of '{key}' is {probability}, must be in [0, 1]"
			)));
		}
		Ok(Self { probabilities })
	}
}

impl From<Distribution> for BTreeMap<String, f64> {
	fn from(distribution: Distribution) -> Self {
		distribution.probabilities
	}
}

impl FromIterator<(String, f64)> for Distribution {
	fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
		Self { probabilities: iter.into_iter().collect() }
	}
}

/// Distributions over the next unit, indexed by a fixed-length prefix.
///
/// # Invariants
/// - Every stored prefix maps to a non-empty, normalized `Distribution`
/// - Prefixes never observed are absent; callers pick the fallback on lookup
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct ConditionalDistribution {
	distributions: BTreeMap<String, Distribution>,
}

impl ConditionalDistribution {
	/// Normalizes each prefix's suffix table into its own distribution.
	///
	/// Prefixes whose table holds no occurrence are skipped.
	pub fn from_counts(counts: &BTreeMap<String, Counts>) -> Self {
		let distributions = counts
			.iter()
			.filter_map(|(prefix, suffixes)| {
				Distribution::from_counts(suffixes)
					.ok()
					.map(|distribution| (prefix.clone(), distribution))
			})
			.collect();
		Self { distributions }
	}

	/// Distribution over the units following `prefix`, if it was observed.
	pub fn get(&self, prefix: &str) -> Option<&Distribution> {
		self.distributions.get(prefix)
	}

	/// Two-level lookup of `P(suffix | prefix)`.
	///
	/// Returns `fallback` when the prefix is unknown, or when it is known but
	/// `suffix` never followed it.
	pub fn lookup(&self, prefix: &str, suffix: &str, fallback: f64) -> f64 {
		self.get(prefix)
			.and_then(|distribution| distribution.get(suffix))
			.unwrap_or(fallback)
	}

	pub fn contains_prefix(&self, prefix: &str) -> bool {
		self.distributions.contains_key(prefix)
	}

	pub fn len(&self) -> usize {
		self.distributions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.distributions.is_empty()
	}

	pub fn prefixes(&self) -> impl Iterator<Item = &str> {
		self.distributions.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Distribution)> {
		self.distributions.iter().map(|(k, v)| (k.as_str(), v))
	}
}

impl FromIterator<(String, Distribution)> for ConditionalDistribution {
	fn from_iter<I: IntoIterator<Item = (String, Distribution)>>(iter: I) -> Self {
		Self { distributions: iter.into_iter().collect() }
	}
}

/// Shannon entropy `-Σ p·log2(p)` in bits.
///
/// Zero probabilities contribute nothing (they are skipped, not evaluated).
pub(crate) fn entropy_bits<I: IntoIterator<Item = f64>>(probabilities: I) -> f64 {
	-probabilities
		.into_iter()
		.filter(|p| *p > 0.0)
		.map(|p| p * p.log2())
		.sum::<f64>()
}
