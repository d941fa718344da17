//! Name normalization and tokenization
//!
//! Every function here is total: degenerate input yields empty output.

/// Two adjacent characters taken from inside a single word
pub type Bigram = (char, char);

/// Lowercase `text` and split it into tokens on whitespace and commas.
pub fn normalize(text: &str) -> Vec<String> {
    text.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Adjacent two-token phrases: `tokens[i] + " " + tokens[i + 1]`.
pub fn word_pairs<S: AsRef<str>>(tokens: &[S]) -> Vec<String> {
    tokens
        .windows(2)
        .map(|pair| format!("{} {}", pair[0].as_ref(), pair[1].as_ref()))
        .collect()
}

/// Character bigrams of every word in `phrase`, in order.
///
/// Bigrams never span a word boundary and repeated bigrams are kept, so the
/// result is a multiset in phrase order. Words shorter than two characters
/// contribute nothing.
pub fn char_bigrams(phrase: &str) -> Vec<Bigram> {
    let mut bigrams = Vec::new();
    for word in phrase.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        bigrams.extend(chars.windows(2).map(|w| (w[0], w[1])));
    }
    bigrams
}

/// Word-pairs of a free-text name, i.e. `word_pairs(normalize(text))`.
pub fn name_pairs(text: &str) -> Vec<String> {
    word_pairs(&normalize(text))
}
