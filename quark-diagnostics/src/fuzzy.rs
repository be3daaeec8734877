//! "Did you mean?" suggestions via Levenshtein distance.

use strsim::levenshtein;

/// Quark's reserved words, excluded from suggestion candidates.
const RESERVED_WORDS: &[&str] = &[
    "var", "if", "elif", "else", "while", "for", "in", "ret", "struct", "data", "impl", "extend",
    "extern", "true", "false", "null", "this", "match", "break", "continue", "import", "int",
    "str", "bool", "float", "double", "void",
];

/// Up to `max` candidates within Levenshtein distance 3 of `target`,
/// closest first, excluding `target` itself and reserved words.
pub fn find_similar(target: &str, candidates: &[String], max: usize) -> Vec<String> {
    let mut scored: Vec<(String, usize)> = candidates
        .iter()
        .filter(|c| c.as_str() != target && !RESERVED_WORDS.contains(&c.as_str()))
        .map(|c| (c.clone(), levenshtein(target, c)))
        .filter(|(_, dist)| *dist <= 3)
        .collect();

    scored.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    scored.into_iter().take(max).map(|(name, _)| name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_close_misspelling() {
        let candidates = vec!["count".to_string(), "counter".to_string(), "total".to_string()];
        let found = find_similar("cuont", &candidates, 3);
        assert_eq!(found.first(), Some(&"count".to_string()));
    }

    #[test]
    fn excludes_reserved_words() {
        let candidates = vec!["var".to_string(), "value".to_string()];
        let found = find_similar("vars", &candidates, 3);
        assert!(!found.contains(&"var".to_string()));
    }
}
