use rand::SeedableRng;
use rand::rngs::StdRng;

use stat_text_core::io::{get_filename, read_corpus};
use stat_text_core::model::statistics::NGramStatistics;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Corpus file path, "./data/corpus.txt" by default
    let path = std::env::args().nth(1).unwrap_or_else(|| "./data/corpus.txt".to_owned());

    // Load the raw text and normalize it (lowercase, no digits/punctuation/symbols)
    let raw = read_corpus(&path)?;
    let stats = NGramStatistics::from_raw(&raw);
    log::info!("loaded corpus '{}' ({} characters after normalization)", get_filename(&path)?, stats.len());

    // Entropy (in bits) of the n-grams of increasing length
    for length in 1..=4 {
        match stats.entropy(length, None) {
            Ok(entropy) => println!("H({}-grams) = {:.4} bits", length, entropy),
            Err(e) => println!("H({}-grams) is undefined: {}", length, e),
        }
    }

    // Entropy of the character following a given prefix
    match stats.entropy(1, Some("th")) {
        Ok(entropy) => println!("H(next | 'th') = {:.4} bits", entropy),
        Err(_) => println!("The prefix 'th' never occurs in this corpus"),
    }

    // Ten most frequent characters
    let unigram_distribution = stats.distribution(1, None)?;
    let mut unigrams: Vec<(&str, f64)> = unigram_distribution.iter().collect();
    unigrams.sort_by(|a, b| b.1.total_cmp(&a.1));
    for (character, probability) in unigrams.iter().take(10) {
        println!("P('{}') = {:.4}", character, probability);
    }

    // Order-2 Markov chain (3-grams)
    let model = stats.markov(3)?;

    // A fixed seed gives the same text on every run
    let mut rng = StdRng::seed_from_u64(42);
    for i in 0..5 {
        println!("Generated text {}: {}", i + 1, model.generate_text_with(80, &mut rng)?);
    }

    // Scoring: log-probability is safer for long strings
    let sample = "the quick brown fox";
    println!("P('{}') = {:e}", sample, model.string_probability(sample, false)?);
    println!("ln P('{}') = {:.4}", sample, model.string_probability(sample, true)?);

    // Strings shorter than the model's n-gram length cannot be scored
    match model.string_probability("a", false) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("{}", e),
    }

    Ok(())
}
