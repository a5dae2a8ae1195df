// Query routing: intent classification and category/budget resolution.

pub mod engine;
pub mod tables;

pub use engine::{NoOverrides, QueryRouter, QueryRouting, RoutingOverrides};
pub use tables::{
    Intent, KnowledgeCategory, RoutePlan, RouterTableOverrides, RouterTables, SlotBudgets,
};
