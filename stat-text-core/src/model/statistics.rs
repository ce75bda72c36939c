use std::collections::BTreeMap;

use crate::error::{StatError, StatResult};
use crate::text;
use super::distribution::{ConditionalDistribution, Counts, Distribution};
use super::markov_model::MarkovModel;

/// Sliding-window n-gram statistics over an in-memory corpus.
///
/// The corpus is stored as a sequence of `char`s, so every window length
/// is counted in Unicode scalar values rather than bytes.
///
/// # Responsibilities
/// - Enumerate the n-grams of a given length, optionally filtered by a prefix
/// - Count them and turn the counts into (conditional) distributions
/// - Measure the Shannon entropy of those distributions
/// - Fit a `MarkovModel` from the corpus
///
/// # Notes
/// Windows start at offsets `0 .. len - window` (exclusive): the window ending
/// exactly on the last character of the corpus is never produced.
#[derive(Clone, Debug, Default)]
pub struct NGramStatistics {
	corpus: Vec<char>,
}

impl NGramStatistics {
	/// Wraps an already normalized text.
	pub fn new(text: &str) -> Self {
		Self { corpus: text.chars().collect() }
	}

	/// Normalizes `raw` with [`text::simplify`] before wrapping it.
	pub fn from_raw(raw: &str) -> Self {
		Self::new(&text::simplify(raw))
	}

	/// Number of characters in the corpus.
	pub fn len(&self) -> usize {
		self.corpus.len()
	}

	pub fn is_empty(&self) -> bool {
		self.corpus.is_empty()
	}

	/// Lazily yields the n-grams of `length` characters.
	///
	/// With a `prefix`, only windows of `prefix + length` characters starting
	/// with that prefix are kept, and each yielded item is the `length`
	/// characters following the prefix.
	///
	/// Yields nothing when the window does not fit in the corpus.
	///
	/// # Errors
	/// Returns `InvalidArgument` if `length` is zero.
	pub fn extract_ngrams(
		&self,
		length: usize,
		prefix: Option<&str>,
	) -> StatResult<impl Iterator<Item = String> + '_> {
		if length == 0 {
			return Err(StatError::invalid_argument("n-gram length must be >= 1"));
		}

		let prefix: Vec<char> = prefix.map(|p| p.chars().collect()).unwrap_or_default();
		let window = prefix.len().checked_add(length).ok_or_else(|| {
			StatError::invalid_argument(format!("n-gram length {length} overflows with a prefix"))
		})?;
		let offsets = self.corpus.len().saturating_sub(window);

		Ok((0..offsets).filter_map(move |i| {
			let ngram = &self.corpus[i..i + window];
			if ngram.starts_with(&prefix) {
				Some(ngram[prefix.len()..].iter().collect::<String>())
			} else {
				None
			}
		}))
	}

	/// Frequency table of the n-grams yielded by [`Self::extract_ngrams`].
	pub fn counts(&self, length: usize, prefix: Option<&str>) -> StatResult<Counts> {
		let mut counts = Counts::new();
		for ngram in self.extract_ngrams(length, prefix)? {
			*counts.entry(ngram).or_insert(0) += 1;
		}
		Ok(counts)
	}

	/// Shannon entropy, in bits, of the n-grams of `length` characters.
	///
	/// Without a prefix the counts are normalized by the number of windows
	/// (`corpus length - length`); with a prefix, filtering changes the
	/// denominator, so the observed total is used instead.
	///
	/// # Errors
	/// Returns `NumericUndefined` when no n-gram is observed.
	pub fn entropy(&self, length: usize, prefix: Option<&str>) -> StatResult<f64> {
		let counts = self.counts(length, prefix)?;
		let normalizer = match prefix {
			None => self.corpus.len().saturating_sub(length),
			Some(_) => counts.values().sum(),
		};

		if normalizer == 0 {
			return Err(StatError::numeric_undefined(format!(
				"entropy of {}-grams over a corpus of {} characters: no n-gram observed",
				length,
				self.corpus.len()
			)));
		}

		Ok(Distribution::normalized(&counts, normalizer as f64).entropy())
	}

	/// Empirical distribution of the n-grams of `length` characters.
	///
	/// With a prefix, the keys are the parts following the prefix.
	///
	/// # Errors
	/// Returns `NumericUndefined` when no n-gram is observed.
	pub fn distribution(&self, length: usize, prefix: Option<&str>) -> StatResult<Distribution> {
		Distribution::from_counts(&self.counts(length, prefix)?)
	}

	/// Maps each observed prefix of `prefix_length` characters to the
	/// distribution of the `length` characters that follow it.
	///
	/// Prefixes that never occur are absent.
	pub fn conditional_distribution(
		&self,
		length: usize,
		prefix_length: usize,
	) -> StatResult<ConditionalDistribution> {
		let mut table: BTreeMap<String, Counts> = BTreeMap::new();

		let window = length.checked_add(prefix_length).ok_or_else(|| {
			StatError::invalid_argument(format!(
				"n-gram length {length} plus prefix length {prefix_length} overflows"
			))
		})?;

		for ngram in self.extract_ngrams(window, None)? {
			let split = ngram
				.char_indices()
				.nth(prefix_length)
				.map_or(ngram.len(), |(index, _)| index);
			let (prefix, suffix) = ngram.split_at(split);

			*table
				.entry(prefix.to_owned())
				.or_default()
				.entry(suffix.to_owned())
				.or_insert(0) += 1;
		}

		Ok(ConditionalDistribution::from_counts(&table))
	}

	/// Fits a Markov chain of order `length - 1`.
	///
	/// The initial distribution covers whole n-grams of `length` characters;
	/// the conditional one gives the next character after `length - 1` characters.
	///
	/// # Errors
	/// - `InvalidArgument` if `length < 2`
	/// - `NumericUndefined` if the corpus is too short for a single n-gram
	pub fn markov(&self, length: usize) -> StatResult<MarkovModel> {
		if length < 2 {
			return Err(StatError::invalid_argument(format!(
				"Markov n-gram length is {length}, must be >= 2"
			)));
		}

		let initial = self.distribution(length, None)?;
		let conditional = self.conditional_distribution(1, length - 1)?;
		log::debug!(
			"fitted {}-gram model: {} initial n-grams, {} prefixes",
			length,
			initial.len(),
			conditional.len()
		);

		MarkovModel::new(initial, conditional)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const TOLERANCE: f64 = 1e-9;

	#[test]
	fn extracts_sliding_windows() {
		let stats = NGramStatistics::new("abababab");
		let ngrams: Vec<String> = stats.extract_ngrams(2, None).unwrap().collect();
		assert_eq!(ngrams, vec!["ab", "ba", "ab", "ba", "ab", "ba"]);
	}

	#[test]
	fn extraction_is_restartable() {
		let stats = NGramStatistics::new("hello world");
		let first: Vec<String> = stats.extract_ngrams(3, None).unwrap().collect();
		let second: Vec<String> = stats.extract_ngrams(3, None).unwrap().collect();
		assert_eq!(first, second);
	}

	#[test]
	fn extracts_suffixes_after_prefix() {
		let stats = NGramStatistics::new("abcabdabe");
		let ngrams: Vec<String> = stats.extract_ngrams(1, Some("ab")).unwrap().collect();
		// The window "abe" ends on the last character and is excluded.
		assert_eq!(ngrams, vec!["c", "d"]);
	}

	#[test]
	fn window_longer_than_corpus_yields_nothing() {
		let stats = NGramStatistics::new("abc");
		assert_eq!(stats.extract_ngrams(5, None).unwrap().count(), 0);
		assert_eq!(stats.extract_ngrams(3, None).unwrap().count(), 0);
		assert_eq!(stats.extract_ngrams(2, Some("ab")).unwrap().count(), 0);
	}

	#[test]
	fn zero_length_is_rejected() {
		let stats = NGramStatistics::new("abc");
		assert!(matches!(stats.extract_ngrams(0, None), Err(StatError::InvalidArgument(_))));
	}

	#[test]
	fn overflowing_window_is_rejected() {
		let stats = NGramStatistics::new("abc");
		assert!(matches!(stats.extract_ngrams(usize::MAX, Some("a")), Err(StatError::InvalidArgument(_))));
		assert!(matches!(stats.conditional_distribution(usize::MAX, 1), Err(StatError::InvalidArgument(_))));
		assert!(matches!(stats.entropy(usize::MAX, Some("a")), Err(StatError::InvalidArgument(_))));
		// Without a prefix a huge window simply does not fit.
		assert_eq!(stats.extract_ngrams(usize::MAX, None).unwrap().count(), 0);
	}

	#[test]
	fn windows_count_characters_not_bytes() {
		let stats = NGramStatistics::new("éàéàé");
		let ngrams: Vec<String> = stats.extract_ngrams(2, None).unwrap().collect();
		assert_eq!(ngrams, vec!["éà", "àé", "éà"]);
	}

	#[test]
	fn distribution_of_alternating_text() {
		let stats = NGramStatistics::new("abababab");
		let distribution = stats.distribution(2, None).unwrap();
		assert_eq!(distribution.get("ab"), Some(0.5));
		assert_eq!(distribution.get("ba"), Some(0.5));
		assert_eq!(distribution.len(), 2);
	}

	#[test]
	fn distribution_sums_to_one() {
		let stats = NGramStatistics::new("the quick brown fox jumps over the lazy dog");
		for length in 1..=4 {
			let distribution = stats.distribution(length, None).unwrap();
			assert!((distribution.total() - 1.0).abs() < TOLERANCE);
		}
	}

	#[test]
	fn distribution_with_prefix_strips_it() {
		let stats = NGramStatistics::new("abacabad");
		let distribution = stats.distribution(1, Some("a")).unwrap();
		// Windows "ab", "ac", "ab" are kept; "ad" is the excluded last window.
		assert!((distribution.get("b").unwrap() - 2.0 / 3.0).abs() < TOLERANCE);
		assert!((distribution.get("c").unwrap() - 1.0 / 3.0).abs() < TOLERANCE);
		assert!(!distribution.contains_key("ab"));
	}

	#[test]
	fn distribution_of_empty_corpus_is_undefined() {
		let stats = NGramStatistics::new("");
		assert!(matches!(stats.distribution(1, None), Err(StatError::NumericUndefined(_))));
	}

	#[test]
	fn entropy_of_alternating_text_is_one_bit() {
		let stats = NGramStatistics::new("abababab");
		assert!((stats.entropy(2, None).unwrap() - 1.0).abs() < TOLERANCE);
	}

	#[test]
	fn entropy_is_bounded_by_log2_of_outcomes() {
		let stats = NGramStatistics::new("mississippi river banks");
		for length in 1..=3 {
			let entropy = stats.entropy(length, None).unwrap();
			let outcomes = stats.distribution(length, None).unwrap().len() as f64;
			assert!(entropy >= 0.0);
			assert!(entropy <= outcomes.log2() + TOLERANCE);
		}
	}

	#[test]
	fn entropy_of_constant_text_is_zero() {
		let stats = NGramStatistics::new("zzzzzzzz");
		assert_eq!(stats.entropy(1, None).unwrap(), 0.0);
	}

	#[test]
	fn entropy_with_prefix_uses_observed_total() {
		let stats = NGramStatistics::new("abacabad");
		let expected = stats.distribution(1, Some("a")).unwrap().entropy();
		assert!((stats.entropy(1, Some("a")).unwrap() - expected).abs() < TOLERANCE);
	}

	#[test]
	fn entropy_without_observation_is_undefined() {
		let stats = NGramStatistics::new("ab");
		assert!(matches!(stats.entropy(2, None), Err(StatError::NumericUndefined(_))));
		assert!(matches!(stats.entropy(1, Some("q")), Err(StatError::NumericUndefined(_))));
	}

	#[test]
	fn conditional_distribution_groups_by_prefix() {
		let stats = NGramStatistics::new("abacabad");
		let conditional = stats.conditional_distribution(1, 1).unwrap();

		let after_a = conditional.get("a").unwrap();
		assert!((after_a.get("b").unwrap() - 2.0 / 3.0).abs() < TOLERANCE);
		assert!((after_a.get("c").unwrap() - 1.0 / 3.0).abs() < TOLERANCE);
		assert_eq!(conditional.get("b").unwrap().get("a"), Some(1.0));
		assert!(conditional.get("d").is_none());
	}

	#[test]
	fn conditional_distributions_each_sum_to_one() {
		let stats = NGramStatistics::new("she sells sea shells by the sea shore");
		for prefix_length in 1..=3 {
			let conditional = stats.conditional_distribution(1, prefix_length).unwrap();
			assert!(!conditional.is_empty());
			for (prefix, distribution) in conditional.iter() {
				assert_eq!(prefix.chars().count(), prefix_length);
				assert!((distribution.total() - 1.0).abs() < TOLERANCE);
			}
		}
	}

	#[test]
	fn conditional_supports_longer_suffixes() {
		let stats = NGramStatistics::new("abcabcabc");
		let conditional = stats.conditional_distribution(2, 1).unwrap();
		assert_eq!(conditional.get("a").unwrap().get("bc"), Some(1.0));
	}

	#[test]
	fn markov_requires_a_prefix() {
		let stats = NGramStatistics::new("abcabc");
		assert!(matches!(stats.markov(1), Err(StatError::InvalidArgument(_))));
	}

	#[test]
	fn markov_fits_both_distributions() {
		let stats = NGramStatistics::new("aaaa");
		let model = stats.markov(2).unwrap();
		assert_eq!(model.n_gram_length(), 2);
		assert_eq!(model.initial_distribution().get("aa"), Some(1.0));
		assert_eq!(model.initial_distribution().len(), 1);
		assert_eq!(model.conditional_distribution().get("a").unwrap().get("a"), Some(1.0));
	}

	#[test]
	fn from_raw_normalizes_text() {
		let stats = NGramStatistics::from_raw("Ab, 12 AB!");
		assert_eq!(stats.len(), "ab ab".len());
	}
}
