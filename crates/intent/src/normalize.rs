use unicode_normalization::UnicodeNormalization;

/// A message composed to NFC, lowercased, stripped of punctuation and
/// whitespace-collapsed.
///
/// Diacritics are kept: "có" and "co" are different words in Vietnamese.
/// Decomposed input (a base letter followed by combining marks) is composed
/// first so the marks survive punctuation stripping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    text: String,
    tokens: Vec<String>,
}

impl NormalizedText {
    pub fn new(raw: &str) -> Self {
        let cleaned: String = raw
            .nfc()
            .flat_map(char::to_lowercase)
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect();
        let tokens: Vec<String> = cleaned.split_whitespace().map(str::to_string).collect();
        Self {
            text: tokens.join(" "),
            tokens,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Returns true if `phrase` occurs as a run of whole words.
    pub fn contains_phrase(&self, phrase: &str) -> bool {
        let needle: Vec<&str> = phrase.split_whitespace().collect();
        if needle.is_empty() || needle.len() > self.tokens.len() {
            return false;
        }
        self.tokens
            .windows(needle.len())
            .any(|window| window.iter().zip(&needle).all(|(t, n)| t == n))
    }

    /// Parses the whole message as a positive integer.
    pub fn as_ordinal(&self) -> Option<u32> {
        match self.tokens.as_slice() {
            [only] if only.chars().all(|c| c.is_ascii_digit()) => {
                only.parse().ok().filter(|n| *n > 0)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_case_punctuation_and_spacing() {
        let n = NormalizedText::new("  Đặt   HÀNG!!  ngay, nhé?? ");
        assert_eq!(n.as_str(), "đặt hàng ngay nhé");
        assert_eq!(n.tokens().len(), 4);
    }

    #[test]
    fn test_keeps_diacritics() {
        assert_eq!(NormalizedText::new("Có").as_str(), "có");
        assert_ne!(NormalizedText::new("có").as_str(), "co");
    }

    #[test]
    fn test_decomposed_input_is_composed() {
        assert_eq!(NormalizedText::new("co\u{301}").as_str(), "có");
        let decomposed: String = "Đặt hàng".nfd().collect();
        assert_ne!(decomposed, "Đặt hàng");
        assert_eq!(NormalizedText::new(&decomposed).as_str(), "đặt hàng");
    }

    #[test]
    fn test_phrase_matching_is_word_based() {
        let n = NormalizedText::new("tôi muốn mua áo");
        assert!(n.contains_phrase("mua"));
        assert!(n.contains_phrase("muốn mua"));
        assert!(!n.contains_phrase("mu"));
        assert!(!NormalizedText::new("muahaha").contains_phrase("mua"));
    }

    #[test]
    fn test_ordinal_only_for_bare_numbers() {
        assert_eq!(NormalizedText::new("2").as_ordinal(), Some(2));
        assert_eq!(NormalizedText::new(" 1. ").as_ordinal(), Some(1));
        assert_eq!(NormalizedText::new("0").as_ordinal(), None);
        assert_eq!(NormalizedText::new("số 2").as_ordinal(), None);
        assert_eq!(NormalizedText::new("2 cái").as_ordinal(), None);
    }

    #[test]
    fn test_empty_input() {
        assert!(NormalizedText::new("  ?! ").is_empty());
    }
}
