//! Graph analyzers.
//!
//! The analyzers never talk to the engine: they are composed from the
//! repositories and the [`TraversalEngine`](crate::traversal::TraversalEngine),
//! so every vertex they report has passed the caller's visibility filter.
//!
//! - [`DependencyAnalyzer`]: forward, reverse and circular dependencies
//! - [`ImpactAnalyzer`]: severity-graded impact of a change
//! - [`PatternDetector`]: structural patterns with confidence scores

pub mod dependency;
pub mod impact;
pub mod patterns;

pub use dependency::{
    Dependency, DependencyAnalysis, DependencyAnalyzer, DependencyDirection, DependencyOptions,
    DependencyStats, Section,
};
pub use impact::{
    ChangeType, Condition, ImpactAnalysis, ImpactAnalyzer, ImpactedVertex, RECOMMENDATION_RULES,
    RecommendationRule, Severity, SeverityCounts, recommend,
};
pub use patterns::{
    DetectedPattern, KNOWN_PATTERNS, PatternDetector, PatternOptions, PatternReport, PatternType,
    confidence,
};
