// Prompt-window allocation across fixed components.
//
// Trimming priority when over the hard limit: secondary context first,
// then primary context, then conversation history (most recent words
// kept). The system prompt and the live user query are never touched,
// so the ceiling guarantee holds whenever those two fit on their own.

use serde::{Deserialize, Serialize};

use crate::budget::estimator::TokenEstimator;
use crate::retrieval::TRUNCATION_MARKER;

/// The textual components of one prompt, pre-assembly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptComponents {
    pub system_prompt: String,
    pub conversation: String,
    pub primary_context: String,
    pub secondary_context: String,
    pub user_query: String,
}

/// Per-component token estimates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentTokens {
    pub system_prompt: usize,
    pub conversation: usize,
    pub primary_context: usize,
    pub secondary_context: usize,
    pub user_query: usize,
}

impl ComponentTokens {
    pub fn total(&self) -> usize {
        self.system_prompt
            + self.conversation
            + self.primary_context
            + self.secondary_context
            + self.user_query
    }
}

/// Budget-compliant components plus their measured token counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocatedPrompt {
    pub components: PromptComponents,
    pub tokens: ComponentTokens,
    /// Whether any component was cut to reach compliance
    pub trimmed: bool,
}

/// Apportions a hard token ceiling across prompt components using the
/// same estimator as the retriever's budget trimming
#[derive(Debug, Clone, Default)]
pub struct BudgetAllocator {
    estimator: TokenEstimator,
}

impl BudgetAllocator {
    pub fn new() -> Self {
        Self {
            estimator: TokenEstimator::new(),
        }
    }

    /// Trim components until their combined estimate fits `hard_limit`.
    ///
    /// Already-compliant input is returned unchanged, so re-running
    /// allocate on its own output is a no-op.
    pub fn allocate(&self, components: PromptComponents, hard_limit: usize) -> AllocatedPrompt {
        let tokens = self.measure(&components);
        if tokens.total() <= hard_limit {
            return AllocatedPrompt {
                components,
                tokens,
                trimmed: false,
            };
        }

        let mut components = components;
        let mut trimmed = false;

        for slot in [Slot::SecondaryContext, Slot::PrimaryContext, Slot::Conversation] {
            let total = self.measure(&components).total();
            if total <= hard_limit {
                break;
            }
            let overage = total - hard_limit;
            let field = slot.field_mut(&mut components);
            let current = self.estimator.estimate_text(field);
            let target = current.saturating_sub(overage);
            *field = self.shrink(field, target, slot.keeps_tail());
            trimmed = true;
        }

        let tokens = self.measure(&components);
        AllocatedPrompt {
            components,
            tokens,
            trimmed,
        }
    }

    /// Estimate every component with the shared estimator
    pub fn measure(&self, components: &PromptComponents) -> ComponentTokens {
        ComponentTokens {
            system_prompt: self.estimator.estimate_text(&components.system_prompt),
            conversation: self.estimator.estimate_text(&components.conversation),
            primary_context: self.estimator.estimate_text(&components.primary_context),
            secondary_context: self.estimator.estimate_text(&components.secondary_context),
            user_query: self.estimator.estimate_text(&components.user_query),
        }
    }

    fn shrink(&self, text: &str, target_tokens: usize, keep_tail: bool) -> String {
        let words: Vec<&str> = text.split_whitespace().collect();
        let fit = self.estimator.words_fitting(target_tokens);
        if fit >= words.len() {
            return text.to_string();
        }
        if fit == 0 {
            return String::new();
        }
        if keep_tail {
            words[words.len() - fit..].join(" ")
        } else {
            format!("{}{}", words[..fit].join(" "), TRUNCATION_MARKER)
        }
    }
}

#[derive(Clone, Copy)]
enum Slot {
    SecondaryContext,
    PrimaryContext,
    Conversation,
}

impl Slot {
    fn field_mut<'a>(&self, components: &'a mut PromptComponents) -> &'a mut String {
        match self {
            Self::SecondaryContext => &mut components.secondary_context,
            Self::PrimaryContext => &mut components.primary_context,
            Self::Conversation => &mut components.conversation,
        }
    }

    /// Conversation keeps its most recent words; context keeps its head
    fn keeps_tail(&self) -> bool {
        matches!(self, Self::Conversation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(prefix: &str, n: usize) -> String {
        (0..n).map(|i| format!("{}{}", prefix, i)).collect::<Vec<_>>().join(" ")
    }

    fn sample(conv: usize, primary: usize, secondary: usize) -> PromptComponents {
        PromptComponents {
            system_prompt: words("sys", 20),
            conversation: words("conv", conv),
            primary_context: words("pri", primary),
            secondary_context: words("sec", secondary),
            user_query: words("q", 10),
        }
    }

    #[test]
    fn test_compliant_input_unchanged() {
        let allocator = BudgetAllocator::new();
        let components = sample(50, 100, 50);

        let allocated = allocator.allocate(components.clone(), 10_000);
        assert!(!allocated.trimmed);
        assert_eq!(allocated.components, components);
    }

    #[test]
    fn test_secondary_trimmed_first() {
        let allocator = BudgetAllocator::new();
        let components = sample(50, 100, 200);
        let before = allocator.measure(&components);
        // Limit just under the total: secondary absorbs the whole cut
        let limit = before.total() - 50;

        let allocated = allocator.allocate(components.clone(), limit);
        assert!(allocated.trimmed);
        assert!(allocated.tokens.secondary_context < before.secondary_context);
        assert_eq!(allocated.components.primary_context, components.primary_context);
        assert_eq!(allocated.components.conversation, components.conversation);
        assert!(allocated.tokens.total() <= limit);
    }

    #[test]
    fn test_primary_trimmed_after_secondary_exhausted() {
        let allocator = BudgetAllocator::new();
        let components = sample(50, 200, 30);
        let before = allocator.measure(&components);
        // Overage larger than all of secondary: primary absorbs the rest
        let limit = before.total() - before.secondary_context - 100;

        let allocated = allocator.allocate(components.clone(), limit);
        assert!(allocated.components.secondary_context.is_empty());
        assert!(allocated.tokens.primary_context < before.primary_context);
        assert!(allocated.tokens.total() <= limit);
    }

    #[test]
    fn test_conversation_keeps_most_recent_words() {
        let allocator = BudgetAllocator::new();
        let components = sample(200, 100, 50);
        let before = allocator.measure(&components);
        let limit =
            before.total() - before.secondary_context - before.primary_context - 100;

        let allocated = allocator.allocate(components, limit);
        assert!(allocated.components.primary_context.is_empty());
        assert!(allocated.components.secondary_context.is_empty());
        // Tail survives, head is dropped
        assert!(allocated.components.conversation.ends_with("conv199"));
        assert!(!allocated.components.conversation.starts_with("conv0"));
        assert!(allocated.tokens.total() <= limit);
    }

    #[test]
    fn test_system_prompt_and_query_never_touched() {
        let allocator = BudgetAllocator::new();
        let components = sample(100, 100, 100);
        let allocated = allocator.allocate(components.clone(), 1);

        assert_eq!(allocated.components.system_prompt, components.system_prompt);
        assert_eq!(allocated.components.user_query, components.user_query);
    }

    #[test]
    fn test_allocate_is_idempotent() {
        let allocator = BudgetAllocator::new();
        let components = sample(100, 150, 120);
        let limit = 300;

        let once = allocator.allocate(components, limit);
        let twice = allocator.allocate(once.components.clone(), limit);

        assert!(!twice.trimmed);
        assert_eq!(once.components, twice.components);
        assert_eq!(once.tokens, twice.tokens);
    }
}
