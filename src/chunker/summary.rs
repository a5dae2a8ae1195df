// Extractive summarizer: first + last sentence framing with middle
// sentences filled in original order until the word budget runs out.

use crate::chunker::language::{detect_language, Language};
use crate::chunker::splitter::normalize_text;

/// Share of the word budget the first+last frame may occupy before the
/// last sentence is dropped from the frame
const FRAME_BUDGET_RATIO: f32 = 0.7;

/// Produce an extractive summary of at most `max_words` words.
///
/// Text already within budget is returned unchanged. Otherwise the
/// first sentence anchors the summary, the last sentence is kept when
/// the pair fits inside 70% of the budget, and middle sentences are
/// added in original order while they fit. A final hard word cut
/// handles pathological single-sentence inputs.
pub fn summarize(text: &str, max_words: usize) -> String {
    let normalized = normalize_text(text);
    if normalized.is_empty() || max_words == 0 {
        return String::new();
    }

    let total_words = normalized.split_whitespace().count();
    if total_words <= max_words {
        return normalized;
    }

    let language = detect_language(&normalized);
    let sentences = split_sentences(&normalized, language);

    if sentences.len() <= 1 {
        return truncate_words(&normalized, max_words);
    }

    let word_count = |s: &str| s.split_whitespace().count();
    let first = &sentences[0];
    let last = &sentences[sentences.len() - 1];

    let frame_budget = (max_words as f32 * FRAME_BUDGET_RATIO) as usize;
    let keep_last = word_count(first) + word_count(last) <= frame_budget;

    let mut used = word_count(first) + if keep_last { word_count(last) } else { 0 };
    let mut selected: Vec<&String> = vec![first];

    for sentence in &sentences[1..sentences.len() - 1] {
        let words = word_count(sentence);
        if used + words <= max_words {
            selected.push(sentence);
            used += words;
        }
    }

    if keep_last {
        selected.push(last);
    }

    let summary = selected
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    truncate_words(&summary, max_words)
}

/// Split into sentences, each keeping its own terminator so the rejoined
/// summary preserves the source language's punctuation.
fn split_sentences(text: &str, language: Language) -> Vec<String> {
    let terminators = language.sentence_terminators();
    let mut sentences = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        current.push(c);
        if terminators.contains(&c) {
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                sentences.push(trimmed.to_string());
            }
            current.clear();
        }
    }

    let trailing = current.trim();
    if !trailing.is_empty() {
        sentences.push(trailing.to_string());
    }

    sentences
}

fn truncate_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return text.to_string();
    }
    words[..max_words].join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_unchanged() {
        let text = "A short answer.";
        assert_eq!(summarize(text, 50), text);
    }

    #[test]
    fn test_zero_budget() {
        assert_eq!(summarize("some text here", 0), "");
    }

    #[test]
    fn test_keeps_first_and_last_sentence() {
        let text = "Opening statement here. Middle detail one two three four five six seven \
                    eight nine ten. Another middle with many many extra filler words inside \
                    this sentence. Closing note.";
        let summary = summarize(text, 12);

        assert!(summary.starts_with("Opening statement here."));
        assert!(summary.contains("Closing note."));
    }

    #[test]
    fn test_middle_sentences_in_original_order() {
        let text = "First one. Second two. Third three. Fourth four. Fifth five.";
        let summary = summarize(text, 8);

        let second_pos = summary.find("Second");
        let third_pos = summary.find("Third");
        if let (Some(a), Some(b)) = (second_pos, third_pos) {
            assert!(a < b);
        }
        assert!(summary.split_whitespace().count() <= 8);
    }

    #[test]
    fn test_single_long_sentence_hard_truncated() {
        let text = (0..100).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        let summary = summarize(&text, 10);
        assert_eq!(summary.split_whitespace().count(), 10);
    }

    #[test]
    fn test_never_exceeds_budget() {
        let text = "One sentence here. Two sentences here now. Three more words follow after. \
                    Four closing words finally done.";
        for budget in [3, 5, 8, 12, 20] {
            let summary = summarize(text, budget);
            assert!(
                summary.split_whitespace().count() <= budget,
                "budget {} exceeded: {}",
                budget,
                summary
            );
        }
    }

    #[test]
    fn test_persian_sentences_keep_marks() {
        let text = "سلام به شما دوست عزیز و گرامی من؟ این یک متن بلند آزمایشی است. \
                    پایان متن اینجاست.";
        let summary = summarize(text, 10);
        assert!(!summary.is_empty());
        assert!(summary.split_whitespace().count() <= 10);
    }
}
