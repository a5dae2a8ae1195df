//! Script detection and per-language boundary rules
//!
//! Detection is a character-ratio heuristic: the share of Perso-Arabic
//! script characters among non-space characters. It is deliberately
//! approximate — short mixed-script strings (a Persian product name in
//! an English sentence) can tip either way, which is why the detector
//! is pluggable rather than baked into the splitter.

/// Supported languages for routing tables and boundary rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Persian,
    Arabic,
    Turkish,
}

impl Language {
    /// Characters that end a sentence in this language
    pub fn sentence_terminators(&self) -> &'static [char] {
        match self {
            Self::English | Self::Turkish => &['.', '!', '?'],
            Self::Persian | Self::Arabic => &['.', '!', '؟', '؛'],
        }
    }

    /// Common function words excluded from keyword extraction
    pub fn stopwords(&self) -> &'static [&'static str] {
        match self {
            Self::English => &[
                "a", "an", "the", "is", "are", "was", "were", "be", "been", "and", "or", "but",
                "of", "to", "in", "on", "at", "for", "with", "from", "by", "as", "it", "its",
                "this", "that", "these", "those", "you", "your", "we", "our", "they", "their",
                "i", "my", "me", "he", "she", "his", "her", "do", "does", "did", "have", "has",
                "had", "not", "no", "so", "if", "then", "than", "what", "which", "who", "how",
                "can", "will", "would", "should", "there", "here", "about",
            ],
            Self::Persian => &[
                "و", "در", "به", "از", "که", "این", "آن", "با", "را", "برای", "تا", "هم",
                "است", "بود", "شد", "می", "های", "ها", "یک", "یا", "اما", "اگر", "هر",
                "ما", "شما", "من", "او", "آنها", "خود", "بر", "هست", "نیست", "کن", "کرد",
                "بی", "چه", "هیچ", "دیگر", "روی", "باید", "شود", "کند", "دارد", "شده",
            ],
            Self::Arabic => &[
                "في", "من", "على", "إلى", "عن", "مع", "هذا", "هذه", "ذلك", "التي", "الذي",
                "و", "أو", "ثم", "لا", "ما", "لم", "لن", "إن", "أن", "كان", "كانت", "هو",
                "هي", "هم", "نحن", "أنت", "كل", "بعض", "غير", "بين", "عند", "قد", "لقد",
            ],
            Self::Turkish => &[
                "ve", "bir", "bu", "da", "de", "için", "ile", "mi", "mu", "ne", "o", "şu",
                "ama", "veya", "gibi", "kadar", "daha", "çok", "az", "her", "ben", "sen",
                "biz", "siz", "onlar", "var", "yok", "olan", "olarak", "ki", "en",
            ],
        }
    }

    /// Short language tag used in config tables
    pub fn tag(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Persian => "fa",
            Self::Arabic => "ar",
            Self::Turkish => "tr",
        }
    }
}

/// Pluggable detection strategy
pub type LanguageDetector = fn(&str) -> Language;

/// Share of Perso-Arabic script characters above which text is treated
/// as Persian for boundary rules
pub const ARABIC_SCRIPT_THRESHOLD: f32 = 0.3;

fn is_arabic_script(c: char) -> bool {
    matches!(c,
        '\u{0600}'..='\u{06FF}'
        | '\u{0750}'..='\u{077F}'
        | '\u{FB50}'..='\u{FDFF}'
        | '\u{FE70}'..='\u{FEFF}'
    )
}

/// Default detector: Perso-Arabic script ratio over non-space characters.
///
/// Known failure mode: short mixed-script strings sit near the 30%
/// threshold and can flip on a single token.
pub fn detect_language(text: &str) -> Language {
    let mut total = 0usize;
    let mut arabic = 0usize;

    for c in text.chars() {
        if c.is_whitespace() {
            continue;
        }
        total += 1;
        if is_arabic_script(c) {
            arabic += 1;
        }
    }

    if total == 0 {
        return Language::English;
    }

    if arabic as f32 / total as f32 > ARABIC_SCRIPT_THRESHOLD {
        Language::Persian
    } else {
        Language::English
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_english() {
        assert_eq!(detect_language("What is your price plan?"), Language::English);
    }

    #[test]
    fn test_detect_persian() {
        assert_eq!(
            detect_language("یک بیوگرافی از مزونتون میدی بهم کامل"),
            Language::Persian
        );
    }

    #[test]
    fn test_detect_empty_defaults_to_english() {
        assert_eq!(detect_language(""), Language::English);
        assert_eq!(detect_language("   "), Language::English);
    }

    #[test]
    fn test_detect_mixed_below_threshold() {
        // One Persian word buried in a long English sentence
        let text = "the quick brown fox jumps over the lazy dog near قیمت today";
        assert_eq!(detect_language(text), Language::English);
    }

    #[test]
    fn test_terminators_include_persian_marks() {
        assert!(Language::Persian.sentence_terminators().contains(&'؟'));
        assert!(!Language::English.sentence_terminators().contains(&'؟'));
    }

    #[test]
    fn test_stopwords_nonempty_for_all_languages() {
        for lang in [
            Language::English,
            Language::Persian,
            Language::Arabic,
            Language::Turkish,
        ] {
            assert!(!lang.stopwords().is_empty());
        }
    }
}
