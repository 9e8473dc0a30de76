use std::collections::HashMap;

/// Common English words excluded from description vectors
///
/// Keep sorted; membership is checked by binary search.
static STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "all", "also", "am", "among", "an", "and",
    "any", "anything", "are", "around", "as", "at", "back", "be", "became", "because", "become",
    "becomes", "been", "before", "behind", "being", "below", "between", "both", "but", "by",
    "came", "can", "cannot", "come", "could", "did", "do", "does", "doing", "down", "during",
    "each", "either", "else", "ever", "every", "few", "find", "first", "for", "from", "further",
    "get", "gets", "go", "goes", "had", "has", "have", "having", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "however", "if", "in", "into", "is", "it", "its",
    "itself", "just", "last", "later", "less", "made", "make", "makes", "many", "may", "me",
    "meanwhile", "might", "more", "most", "much", "must", "my", "myself", "never", "new", "no",
    "nor", "not", "nothing", "now", "of", "off", "on", "once", "one", "only", "onto", "or",
    "other", "others", "our", "ours", "ourselves", "out", "over", "own", "same", "she", "should",
    "since", "so", "some", "something", "soon", "still", "such", "take", "takes", "than", "that",
    "the", "their", "theirs", "them", "themselves", "then", "there", "therefore", "these", "they",
    "this", "those", "through", "to", "together", "too", "toward", "under", "until", "up", "upon",
    "us", "very", "was", "we", "well", "were", "what", "when", "where", "whether", "which",
    "while", "who", "whom", "whose", "why", "will", "with", "within", "without", "would", "yet",
    "you", "your", "yours", "yourself", "yourselves",
];

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.binary_search(&token).is_ok()
}

/// Splits a description into lowercase tokens
///
/// Tokens are maximal alphanumeric runs; single characters and stop words
/// are dropped, matching the vectorizer the neighbor lists were originally
/// built with.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() > 1 && !is_stop_word(token))
        .map(str::to_string)
        .collect()
}

/// Token counts of a description, used as a sparse term vector
pub fn bag_of_words(text: &str) -> HashMap<String, f64> {
    let mut bag = HashMap::new();
    for token in tokenize(text) {
        *bag.entry(token).or_insert(0.0) += 1.0;
    }
    bag
}
