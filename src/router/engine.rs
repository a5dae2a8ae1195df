// Intent classification and category routing.
//
// Scoring is substring containment of weighted keywords over the
// lowercased query, summed across all configured languages. Routing
// never raises: override-store failures degrade to the built-in tables
// and an unmatched query falls back to the general intent.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::TtlCache;
use crate::chunker::Language;
use crate::config::RouterConfig;
use crate::errors::Result;
use crate::router::tables::{
    Intent, KnowledgeCategory, RoutePlan, RouterTableOverrides, RouterTables, SlotBudgets,
    INTENT_ORDER,
};

/// Fixed language scan order keeps matched-keyword output deterministic
const LANGUAGE_ORDER: [Language; 4] = [
    Language::English,
    Language::Persian,
    Language::Arabic,
    Language::Turkish,
];

/// Outcome of intent classification for one query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRouting {
    pub intent: Intent,
    /// Winning score over the sum of all intent scores, in [0, 1]
    pub confidence: f32,
    pub primary_source: KnowledgeCategory,
    pub secondary_sources: Vec<KnowledgeCategory>,
    pub budgets: SlotBudgets,
    /// Keywords that contributed to the winning intent, in table order
    pub keywords_matched: Vec<String>,
}

/// Tenant-level routing table overrides, usually backed by the tenant
/// settings store
#[async_trait]
pub trait RoutingOverrides: Send + Sync {
    /// Fetch overrides for a tenant; `None` means "use the defaults"
    async fn overrides_for(&self, tenant: &str) -> Result<Option<RouterTableOverrides>>;
}

/// Override source for deployments with no tenant customization
pub struct NoOverrides;

#[async_trait]
impl RoutingOverrides for NoOverrides {
    async fn overrides_for(&self, _tenant: &str) -> Result<Option<RouterTableOverrides>> {
        Ok(None)
    }
}

/// Classifies query intent and resolves knowledge categories + budgets
pub struct QueryRouter {
    overrides: Arc<dyn RoutingOverrides>,
    table_cache: TtlCache<RouterTables>,
    cache_ttl: Duration,
}

impl QueryRouter {
    /// Create a router over the given override source
    pub fn new(overrides: Arc<dyn RoutingOverrides>, config: &RouterConfig) -> Self {
        Self {
            overrides,
            table_cache: TtlCache::new(config.cache_capacity),
            cache_ttl: Duration::from_secs(config.override_cache_ttl_secs),
        }
    }

    /// Classify a query and resolve its routing.
    ///
    /// Empty or whitespace queries return the fixed default routing.
    /// This function never returns an error; every failure path lands
    /// on the built-in tables.
    pub async fn route(&self, query: &str, tenant: &str) -> QueryRouting {
        let normalized = query.trim().to_lowercase();
        if normalized.is_empty() {
            return default_routing(&RouterTables::defaults());
        }

        let tables = self.tables_for(tenant).await;

        let mut total_score = 0.0f32;
        let mut best: Option<(Intent, f32, Vec<String>)> = None;

        for intent in INTENT_ORDER {
            let (score, matched) = score_intent(&tables, intent, &normalized);
            total_score += score;
            let is_better = match &best {
                Some((_, best_score, _)) => score > *best_score,
                None => score > 0.0,
            };
            if is_better {
                best = Some((intent, score, matched));
            }
        }

        match best {
            None => default_routing(&tables),
            Some((intent, score, matched)) => {
                let confidence = (score / total_score).min(1.0);
                let plan = resolve_plan(&tables, intent);
                debug!(
                    intent = intent.as_str(),
                    confidence,
                    matched = matched.len(),
                    "query routed"
                );
                QueryRouting {
                    intent,
                    confidence,
                    primary_source: plan.primary,
                    secondary_sources: plan.secondary.clone(),
                    budgets: plan.budgets,
                    keywords_matched: matched,
                }
            }
        }
    }

    /// Resolved tables for a tenant, cached for the configured TTL.
    /// Store errors degrade to defaults and are not cached, so a
    /// recovering store is picked up on the next call.
    async fn tables_for(&self, tenant: &str) -> RouterTables {
        if let Some(tables) = self.table_cache.get(tenant) {
            return tables;
        }

        match self.overrides.overrides_for(tenant).await {
            Ok(overrides) => {
                let tables = match overrides {
                    Some(o) => RouterTables::defaults().merged(o),
                    None => RouterTables::defaults(),
                };
                self.table_cache
                    .insert(tenant.to_string(), tables.clone(), self.cache_ttl);
                tables
            }
            Err(e) => {
                warn!(tenant, error = %e, "override store unavailable, using default tables");
                RouterTables::defaults()
            }
        }
    }
}

fn score_intent(tables: &RouterTables, intent: Intent, normalized: &str) -> (f32, Vec<String>) {
    let mut score = 0.0f32;
    let mut matched = Vec::new();

    let Some(per_language) = tables.keywords.get(&intent) else {
        return (score, matched);
    };

    for language in LANGUAGE_ORDER {
        let Some(keywords) = per_language.get(&language) else {
            continue;
        };
        for keyword in keywords {
            if normalized.contains(&keyword.to_lowercase()) {
                score += tables.weight_of(keyword);
                matched.push(keyword.clone());
            }
        }
    }

    (score, matched)
}

fn resolve_plan(tables: &RouterTables, intent: Intent) -> &RoutePlan {
    tables
        .routes
        .get(&intent)
        .or_else(|| tables.routes.get(&Intent::General))
        .expect("built-in tables always carry a general route")
}

/// Fixed routing for empty or unmatched queries
fn default_routing(tables: &RouterTables) -> QueryRouting {
    let plan = resolve_plan(tables, Intent::General);
    QueryRouting {
        intent: Intent::General,
        confidence: 0.5,
        primary_source: plan.primary,
        secondary_sources: plan.secondary.clone(),
        budgets: plan.budgets,
        keywords_matched: Vec::new(),
    }
}
