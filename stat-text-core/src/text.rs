use unicode_normalization::UnicodeNormalization;

/// Normalizes raw text before it is analyzed.
///
/// - Composes the text (NFC) so accented letters are single characters
/// - Drops digits, punctuation and symbols (anything neither alphabetic nor whitespace)
/// - Converts to lowercase
/// - Collapses whitespace runs into a single space and trims both ends
pub fn simplify(text: &str) -> String {
	let kept: String = text
		.nfc()
		.filter(|c| c.is_alphabetic() || c.is_whitespace())
		.flat_map(char::to_lowercase)
		.collect();

	kept.split_whitespace().collect::<Vec<_>>().join(" ")
}
