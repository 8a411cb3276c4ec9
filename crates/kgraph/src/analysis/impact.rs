//! Severity-graded blast radius of a proposed change.
//!
//! Impact is computed from the reverse dependencies of the target: every
//! vertex that (transitively) depends on it is graded by hop distance and
//! by how tightly the edge reaching it couples the two. Recommendations
//! come from [`RECOMMENDATION_RULES`], a plain table evaluated by
//! [`recommend`].

use super::dependency::{Dependency, DependencyAnalyzer, DependencyDirection, DependencyOptions};
use crate::domain::{EdgeType, Vertex, VertexId};
use crate::error::Result;
use crate::security::SecurityContext;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Kind of change being proposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    /// Behaviour or interface change.
    Modify,
    /// Removal.
    Delete,
    /// Marked for future removal.
    Deprecate,
}

impl ChangeType {
    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeType::Modify => "modify",
            ChangeType::Delete => "delete",
            ChangeType::Deprecate => "deprecate",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "modify" => Ok(Self::Modify),
            "delete" => Ok(Self::Delete),
            "deprecate" => Ok(Self::Deprecate),
            other => Err(format!(
                "invalid change type '{other}' (expected modify, delete or deprecate)"
            )),
        }
    }
}

/// Severity tier of an impacted vertex, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Distant, loosely coupled.
    Low,
    /// Indirect.
    Medium,
    /// Direct.
    High,
    /// Direct and tightly coupled.
    Critical,
}

impl Severity {
    /// Grade an impacted vertex.
    ///
    /// Distance sets the base tier (1 is high, 2 is medium, 3 and beyond
    /// low). A hard-coupling edge raises the tier by one.
    pub fn grade(level: usize, edge_type: EdgeType) -> Self {
        let base = match level {
            0 | 1 => Severity::High,
            2 => Severity::Medium,
            _ => Severity::Low,
        };
        if edge_type.is_hard_coupling() {
            base.raised()
        } else {
            base
        }
    }

    /// One tier more severe, saturating at `Critical`.
    pub fn raised(self) -> Self {
        match self {
            Severity::Low => Severity::Medium,
            Severity::Medium => Severity::High,
            Severity::High | Severity::Critical => Severity::Critical,
        }
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of impacted vertices per tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    /// Critical tier.
    pub critical: usize,
    /// High tier.
    pub high: usize,
    /// Medium tier.
    pub medium: usize,
    /// Low tier.
    pub low: usize,
}

impl SeverityCounts {
    /// Count one more vertex in `severity`.
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
    }

    /// Sum over all tiers.
    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low
    }
}

/// A vertex affected by the change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactedVertex {
    /// The dependent vertex.
    pub vertex: Vertex,
    /// Hop distance from the changed vertex.
    pub level: usize,
    /// Assigned tier.
    pub severity: Severity,
    /// Type of the edge through which the impact arrives.
    pub edge_type: EdgeType,
    /// Vertex ids from the changed vertex to this one.
    pub path: Vec<VertexId>,
}

impl From<Dependency> for ImpactedVertex {
    fn from(dependency: Dependency) -> Self {
        Self {
            severity: Severity::grade(dependency.level, dependency.edge_type),
            vertex: dependency.vertex,
            level: dependency.level,
            edge_type: dependency.edge_type,
            path: dependency.path,
        }
    }
}

/// Result of [`ImpactAnalyzer::analyze`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactAnalysis {
    /// The vertex being changed.
    pub target: Vertex,
    /// The proposed change.
    pub change_type: ChangeType,
    /// Impacted vertices, most severe first, then nearest first.
    pub impacted: Vec<ImpactedVertex>,
    /// Per-tier counts.
    pub counts: SeverityCounts,
    /// Deepest hop level actually observed.
    pub max_depth: usize,
    /// Human-readable advice.
    pub recommendations: Vec<String>,
}

/// One condition of a [`RecommendationRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// The change is of this type.
    ChangeIs(ChangeType),
    /// At least this many critical impacts.
    CriticalAtLeast(usize),
    /// At least this many high impacts.
    HighAtLeast(usize),
    /// At least this many impacts in total.
    TotalAtLeast(usize),
    /// Impact reaches deeper than this.
    MaxDepthAbove(usize),
    /// Nothing is impacted.
    NoImpact,
}

impl Condition {
    fn holds(self, change: ChangeType, counts: &SeverityCounts, max_depth: usize) -> bool {
        match self {
            Condition::ChangeIs(expected) => change == expected,
            Condition::CriticalAtLeast(n) => counts.critical >= n,
            Condition::HighAtLeast(n) => counts.high >= n,
            Condition::TotalAtLeast(n) => counts.total() >= n,
            Condition::MaxDepthAbove(n) => max_depth > n,
            Condition::NoImpact => counts.total() == 0,
        }
    }
}

/// A recommendation emitted when all of its conditions hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendationRule {
    /// Conditions, all of which must hold.
    pub conditions: &'static [Condition],
    /// Advice text.
    pub message: &'static str,
}

/// Recommendation table, evaluated in order.
pub const RECOMMENDATION_RULES: &[RecommendationRule] = &[
    RecommendationRule {
        conditions: &[Condition::NoImpact],
        message: "No dependents found; the change is safe to proceed.",
    },
    RecommendationRule {
        conditions: &[
            Condition::ChangeIs(ChangeType::Delete),
            Condition::CriticalAtLeast(1),
        ],
        message: "Do not delete directly: deprecate first and migrate critical dependents.",
    },
    RecommendationRule {
        conditions: &[
            Condition::ChangeIs(ChangeType::Delete),
            Condition::TotalAtLeast(1),
        ],
        message: "Remove or redirect every dependent before deleting.",
    },
    RecommendationRule {
        conditions: &[Condition::CriticalAtLeast(1)],
        message: "Review tightly coupled direct dependents before merging.",
    },
    RecommendationRule {
        conditions: &[
            Condition::ChangeIs(ChangeType::Modify),
            Condition::HighAtLeast(1),
        ],
        message: "Keep the interface backward compatible or update direct dependents in the same change.",
    },
    RecommendationRule {
        conditions: &[
            Condition::ChangeIs(ChangeType::Deprecate),
            Condition::TotalAtLeast(1),
        ],
        message: "Announce the deprecation and give dependents a migration path.",
    },
    RecommendationRule {
        conditions: &[Condition::MaxDepthAbove(3)],
        message: "Impact reaches more than three levels deep; consider an architectural refactor to reduce coupling.",
    },
    RecommendationRule {
        conditions: &[Condition::TotalAtLeast(10)],
        message: "Large blast radius: roll the change out incrementally.",
    },
];

/// Messages of every rule in `rules` whose conditions all hold.
pub fn recommend(
    rules: &[RecommendationRule],
    change: ChangeType,
    counts: &SeverityCounts,
    max_depth: usize,
) -> Vec<String> {
    rules
        .iter()
        .filter(|rule| {
            rule.conditions
                .iter()
                .all(|c| c.holds(change, counts, max_depth))
        })
        .map(|rule| rule.message.to_string())
        .collect()
}

/// Computes the impact of changing a vertex.
#[derive(Debug, Clone)]
pub struct ImpactAnalyzer {
    dependencies: DependencyAnalyzer,
}

impl ImpactAnalyzer {
    /// Create an analyzer on top of a dependency analyzer.
    pub fn new(dependencies: DependencyAnalyzer) -> Self {
        Self { dependencies }
    }

    /// Analyze the impact of `change` to `target`, following reverse
    /// dependencies up to `max_depth` hops along `edge_types` (the
    /// dependency types when empty).
    ///
    /// The reverse walk is the whole result, so unlike
    /// [`DependencyAnalyzer::analyze`] a failed walk is an error.
    /// Cycles are not followed: dependency paths never revisit a vertex.
    ///
    /// # Errors
    ///
    /// - `Error::NotFound` if the target is missing or invisible
    /// - `Error::Validation` for an out-of-range depth
    /// - `Error::Engine` if the walk fails
    pub async fn analyze(
        &self,
        ctx: &SecurityContext,
        target: &VertexId,
        change: ChangeType,
        max_depth: usize,
        edge_types: &[EdgeType],
    ) -> Result<ImpactAnalysis> {
        let mut options = DependencyOptions {
            direction: DependencyDirection::Reverse,
            max_depth,
            detect_cycles: false,
            ..DependencyOptions::default()
        };
        if !edge_types.is_empty() {
            options.edge_types = edge_types.to_vec();
        }

        self.dependencies.validate(&options)?;
        let target_vertex = self.dependencies.resolve(ctx, target).await?;
        let reverse = self
            .dependencies
            .reverse_dependencies(ctx, target, &options)
            .await?;

        let mut impacted: Vec<ImpactedVertex> =
            reverse.into_iter().map(ImpactedVertex::from).collect();
        impacted.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then(a.level.cmp(&b.level))
                .then_with(|| a.vertex.id.cmp(&b.vertex.id))
        });

        let mut counts = SeverityCounts::default();
        for vertex in &impacted {
            counts.record(vertex.severity);
        }
        let observed_depth = impacted.iter().map(|v| v.level).max().unwrap_or(0);
        let recommendations = recommend(RECOMMENDATION_RULES, change, &counts, observed_depth);

        debug!(
            tenant = ctx.tenant_id(),
            target = %target,
            change = %change,
            impacted = counts.total(),
            critical = counts.critical,
            "Analyzed impact"
        );

        Ok(ImpactAnalysis {
            target: target_vertex,
            change_type: change,
            impacted,
            counts,
            max_depth: observed_depth,
            recommendations,
        })
    }
}
