//! Tool System - routing table, catalog, policy, and argument normalization

mod catalog;
mod definition;
mod normalize;
mod policy;
mod router;

pub use catalog::ToolCatalog;
pub use definition::{ResolvedHint, ResponseHint, RoutedTool, ToolGroup};
pub use normalize::{ArgumentNormalizer, NestingRule, default_nesting_rules, validate_cron};
pub use policy::{GlobPattern, ToolPolicy, is_tool_allowed};
pub use router::ToolRouter;
