//! Built-in intent, keyword, and routing tables
//!
//! These are the safe fallback for every tenant: the router merges
//! tenant overrides on top when the override store has them, and falls
//! back here whenever that store is empty or erroring.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::chunker::Language;

/// Coarse category of what the user is asking about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    General,
    Pricing,
    Product,
    HowTo,
    Contact,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Pricing => "pricing",
            Self::Product => "product",
            Self::HowTo => "howto",
            Self::Contact => "contact",
        }
    }
}

/// Fixed evaluation order so score ties resolve deterministically
pub const INTENT_ORDER: [Intent; 5] = [
    Intent::Pricing,
    Intent::Product,
    Intent::HowTo,
    Intent::Contact,
    Intent::General,
];

/// Knowledge base categories a tenant's chunks are filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeCategory {
    Faq,
    Product,
    Manual,
    Website,
}

impl KnowledgeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Faq => "faq",
            Self::Product => "product",
            Self::Manual => "manual",
            Self::Website => "website",
        }
    }
}

/// Token budgets for the primary and secondary context slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotBudgets {
    pub primary: usize,
    pub secondary: usize,
}

/// Where an intent's answers live and how much context they get
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePlan {
    pub primary: KnowledgeCategory,
    pub secondary: Vec<KnowledgeCategory>,
    pub budgets: SlotBudgets,
}

/// Complete routing tables: keywords, route plans, keyword weights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterTables {
    /// Per-intent, per-language keyword lists
    pub keywords: HashMap<Intent, HashMap<Language, Vec<String>>>,
    /// Per-intent route plans
    pub routes: HashMap<Intent, RoutePlan>,
    /// Per-keyword score weights; unlisted keywords weigh 1.0
    pub weights: HashMap<String, f32>,
}

/// Partial tenant overrides merged onto the defaults. A present map
/// replaces the default entry for each intent it names; weights extend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouterTableOverrides {
    pub keywords: Option<HashMap<Intent, HashMap<Language, Vec<String>>>>,
    pub routes: Option<HashMap<Intent, RoutePlan>>,
    pub weights: Option<HashMap<String, f32>>,
}

fn kw(entries: &[(Language, &[&str])]) -> HashMap<Language, Vec<String>> {
    entries
        .iter()
        .map(|(lang, words)| (*lang, words.iter().map(|w| w.to_string()).collect()))
        .collect()
}

impl RouterTables {
    /// Built-in tables covering English, Persian, Arabic, and Turkish
    pub fn defaults() -> Self {
        let mut keywords = HashMap::new();

        keywords.insert(
            Intent::Pricing,
            kw(&[
                (
                    Language::English,
                    &["price", "cost", "plan", "subscription", "fee", "how much", "payment", "discount"],
                ),
                (
                    Language::Persian,
                    &["قیمت", "هزینه", "تعرفه", "اشتراک", "پرداخت", "تخفیف", "چنده"],
                ),
                (Language::Arabic, &["سعر", "تكلفة", "اشتراك", "دفع", "خصم"]),
                (Language::Turkish, &["fiyat", "ücret", "abonelik", "ödeme", "indirim"]),
            ]),
        );

        keywords.insert(
            Intent::Product,
            kw(&[
                (
                    Language::English,
                    &["product", "feature", "catalog", "stock", "available", "collection", "model"],
                ),
                (
                    Language::Persian,
                    &["محصول", "کالا", "موجودی", "کلکسیون", "مدل", "جنس"],
                ),
                (Language::Arabic, &["منتج", "ميزة", "متوفر", "موديل"]),
                (Language::Turkish, &["ürün", "özellik", "stok", "mevcut"]),
            ]),
        );

        keywords.insert(
            Intent::HowTo,
            kw(&[
                (
                    Language::English,
                    &["how to", "how do", "guide", "tutorial", "setup", "install", "steps"],
                ),
                (
                    Language::Persian,
                    &["چطور", "چگونه", "راهنما", "آموزش", "نصب", "مراحل"],
                ),
                (Language::Arabic, &["كيف", "دليل", "شرح", "خطوات"]),
                (Language::Turkish, &["nasıl", "kılavuz", "kurulum", "adımlar"]),
            ]),
        );

        keywords.insert(
            Intent::Contact,
            kw(&[
                (
                    Language::English,
                    &["contact", "email", "phone", "address", "support", "call", "reach"],
                ),
                (
                    Language::Persian,
                    &["تماس", "ایمیل", "تلفن", "آدرس", "پشتیبانی", "شماره"],
                ),
                (Language::Arabic, &["اتصال", "هاتف", "عنوان", "دعم", "بريد"]),
                (Language::Turkish, &["iletişim", "telefon", "adres", "destek"]),
            ]),
        );

        keywords.insert(
            Intent::General,
            kw(&[
                (
                    Language::English,
                    &["about", "who are you", "biography", "story", "introduce"],
                ),
                (
                    Language::Persian,
                    &["درباره", "بیوگرافی", "معرفی", "داستان", "کی هستید"],
                ),
                (Language::Arabic, &["حول", "من أنتم", "تعريف", "قصة"]),
                (Language::Turkish, &["hakkında", "kimsiniz", "tanıtım", "hikaye"]),
            ]),
        );

        let mut routes = HashMap::new();
        routes.insert(
            Intent::General,
            RoutePlan {
                primary: KnowledgeCategory::Faq,
                secondary: vec![KnowledgeCategory::Website, KnowledgeCategory::Manual],
                budgets: SlotBudgets {
                    primary: 800,
                    secondary: 300,
                },
            },
        );
        routes.insert(
            Intent::Pricing,
            RoutePlan {
                primary: KnowledgeCategory::Product,
                secondary: vec![KnowledgeCategory::Faq],
                budgets: SlotBudgets {
                    primary: 900,
                    secondary: 300,
                },
            },
        );
        routes.insert(
            Intent::Product,
            RoutePlan {
                primary: KnowledgeCategory::Product,
                secondary: vec![KnowledgeCategory::Manual],
                budgets: SlotBudgets {
                    primary: 900,
                    secondary: 300,
                },
            },
        );
        routes.insert(
            Intent::HowTo,
            RoutePlan {
                primary: KnowledgeCategory::Manual,
                secondary: vec![KnowledgeCategory::Faq],
                budgets: SlotBudgets {
                    primary: 1000,
                    secondary: 300,
                },
            },
        );
        routes.insert(
            Intent::Contact,
            RoutePlan {
                primary: KnowledgeCategory::Website,
                secondary: vec![KnowledgeCategory::Faq],
                budgets: SlotBudgets {
                    primary: 600,
                    secondary: 200,
                },
            },
        );

        Self {
            keywords,
            routes,
            weights: HashMap::new(),
        }
    }

    /// Merge tenant overrides on top of these tables
    pub fn merged(mut self, overrides: RouterTableOverrides) -> Self {
        if let Some(keywords) = overrides.keywords {
            for (intent, table) in keywords {
                self.keywords.insert(intent, table);
            }
        }
        if let Some(routes) = overrides.routes {
            for (intent, plan) in routes {
                self.routes.insert(intent, plan);
            }
        }
        if let Some(weights) = overrides.weights {
            self.weights.extend(weights);
        }
        self
    }

    /// Weight for a keyword, defaulting to 1.0
    pub fn weight_of(&self, keyword: &str) -> f32 {
        self.weights.get(keyword).copied().unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_all_intents() {
        let tables = RouterTables::defaults();
        for intent in INTENT_ORDER {
            assert!(tables.keywords.contains_key(&intent), "{:?}", intent);
            assert!(tables.routes.contains_key(&intent), "{:?}", intent);
        }
    }

    #[test]
    fn test_defaults_cover_four_languages() {
        let tables = RouterTables::defaults();
        let pricing = &tables.keywords[&Intent::Pricing];
        for lang in [
            Language::English,
            Language::Persian,
            Language::Arabic,
            Language::Turkish,
        ] {
            assert!(pricing.contains_key(&lang), "{:?}", lang);
        }
    }

    #[test]
    fn test_general_route_matches_fallback_contract() {
        let tables = RouterTables::defaults();
        let plan = &tables.routes[&Intent::General];
        assert_eq!(plan.primary, KnowledgeCategory::Faq);
        assert_eq!(plan.budgets.primary, 800);
        assert_eq!(plan.budgets.secondary, 300);
    }

    #[test]
    fn test_merge_replaces_named_intents_only() {
        let mut routes = HashMap::new();
        routes.insert(
            Intent::Pricing,
            RoutePlan {
                primary: KnowledgeCategory::Faq,
                secondary: vec![],
                budgets: SlotBudgets {
                    primary: 500,
                    secondary: 100,
                },
            },
        );
        let merged = RouterTables::defaults().merged(RouterTableOverrides {
            routes: Some(routes),
            ..Default::default()
        });

        assert_eq!(merged.routes[&Intent::Pricing].budgets.primary, 500);
        // Untouched intents keep their defaults
        assert_eq!(merged.routes[&Intent::HowTo].budgets.primary, 1000);
    }

    #[test]
    fn test_weight_defaults_to_one() {
        let tables = RouterTables::defaults();
        assert_eq!(tables.weight_of("price"), 1.0);

        let mut weights = HashMap::new();
        weights.insert("price".to_string(), 2.5);
        let merged = tables.merged(RouterTableOverrides {
            weights: Some(weights),
            ..Default::default()
        });
        assert_eq!(merged.weight_of("price"), 2.5);
        assert_eq!(merged.weight_of("cost"), 1.0);
    }
}
