//! Structural pattern detection.
//!
//! Each detector looks for one structural signature over the visible
//! vertices in scope. Detected patterns are scored with [`confidence`],
//! filtered by a threshold, sorted and truncated.

use super::dependency::{DependencyAnalyzer, DependencyOptions};
use crate::domain::{EdgeType, VertexFilter, VertexId};
use crate::error::{Error, Result};
use crate::repository::{Degree, EdgeRepository};
use crate::security::SecurityContext;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, warn};

/// Structural signatures the detector knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    /// Unusually high in+out degree.
    HubFunction,
    /// Dependency cycles.
    CircularDependencies,
    /// Disproportionate fan-out.
    GodObject,
    /// No edges at all.
    IsolatedComponent,
    /// Long acyclic dependency path.
    DeepDependencyChain,
}

impl PatternType {
    /// All pattern types.
    pub const ALL: [PatternType; 5] = [
        PatternType::HubFunction,
        PatternType::CircularDependencies,
        PatternType::GodObject,
        PatternType::IsolatedComponent,
        PatternType::DeepDependencyChain,
    ];

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            PatternType::HubFunction => "Hub Function",
            PatternType::CircularDependencies => "Circular Dependencies",
            PatternType::GodObject => "God Object",
            PatternType::IsolatedComponent => "Isolated Component",
            PatternType::DeepDependencyChain => "Deep Dependency Chain",
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pattern types that earn the known-pattern bonus.
pub const KNOWN_PATTERNS: &[PatternType] = &[
    PatternType::HubFunction,
    PatternType::CircularDependencies,
    PatternType::GodObject,
];

/// Recommendation text per pattern type.
pub const RECOMMENDATION_TEMPLATES: &[(PatternType, &str)] = &[
    (
        PatternType::HubFunction,
        "Split the hub into smaller, focused functions to reduce its coupling.",
    ),
    (
        PatternType::CircularDependencies,
        "Break the cycle via an abstraction layer or dependency inversion.",
    ),
    (
        PatternType::GodObject,
        "Decompose the object along its responsibilities.",
    ),
    (
        PatternType::IsolatedComponent,
        "Connect the component to the graph or remove it if unused.",
    ),
    (
        PatternType::DeepDependencyChain,
        "Flatten the chain by introducing a facade or merging thin layers.",
    ),
];

/// Recommendation for `pattern`.
pub fn recommendation_for(pattern: PatternType) -> &'static str {
    RECOMMENDATION_TEMPLATES
        .iter()
        .find(|(p, _)| *p == pattern)
        .map_or("Review this structure.", |(_, message)| message)
}

/// Confidence score for a pattern seen `count` times.
///
/// Base 0.5, plus 0.1 / 0.2 / 0.3 when the count exceeds 2 / 5 / 10,
/// plus 0.2 for a known pattern, capped at 1.0.
pub fn confidence(pattern: PatternType, count: usize) -> f64 {
    let frequency: f64 = match count {
        c if c > 10 => 0.3,
        c if c > 5 => 0.2,
        c if c > 2 => 0.1,
        _ => 0.0,
    };
    let known = if KNOWN_PATTERNS.contains(&pattern) {
        0.2
    } else {
        0.0
    };
    (0.5 + frequency + known).min(1.0)
}

/// Thresholds and limits for [`PatternDetector::detect`].
#[derive(Debug, Clone, PartialEq)]
pub struct PatternOptions {
    /// Restrict the scan to a project and/or domain.
    pub scope: VertexFilter,
    /// Edge types considered structural; all types when empty.
    pub edge_types: Vec<EdgeType>,
    /// Minimum in+out degree for a hub.
    pub hub_degree: usize,
    /// Minimum fan-out for a god object.
    pub god_object_fan_out: usize,
    /// Minimum fan-out relative to the mean fan-out for a god object.
    pub god_object_ratio: f64,
    /// Minimum hop length for a deep chain.
    pub deep_chain_length: usize,
    /// Depth bound for cycle search.
    pub cycle_depth: usize,
    /// Cap on paths per cycle search.
    pub cycle_path_limit: usize,
    /// Patterns scoring below this are discarded.
    pub similarity_threshold: f64,
    /// Maximum number of patterns reported.
    pub limit: usize,
}

impl Default for PatternOptions {
    fn default() -> Self {
        Self {
            scope: VertexFilter::default(),
            edge_types: EdgeType::DEPENDENCY.to_vec(),
            hub_degree: 10,
            god_object_fan_out: 15,
            god_object_ratio: 3.0,
            deep_chain_length: 5,
            cycle_depth: super::dependency::DEFAULT_MAX_DEPTH,
            cycle_path_limit: super::dependency::DEFAULT_PATH_LIMIT,
            similarity_threshold: 0.5,
            limit: 10,
        }
    }
}

/// One detected pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedPattern {
    /// Which signature.
    pub pattern_type: PatternType,
    /// Display name.
    pub name: &'static str,
    /// Number of occurrences.
    pub count: usize,
    /// Score in `[0, 1]`.
    pub confidence: f64,
    /// Vertices involved, sorted by id.
    pub vertices: Vec<VertexId>,
    /// What to do about it.
    pub recommendation: &'static str,
}

impl DetectedPattern {
    fn new(pattern_type: PatternType, count: usize, vertices: Vec<VertexId>) -> Self {
        Self {
            pattern_type,
            name: pattern_type.name(),
            count,
            confidence: confidence(pattern_type, count),
            vertices,
            recommendation: recommendation_for(pattern_type),
        }
    }
}

/// Result of [`PatternDetector::detect`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternReport {
    /// Patterns above the threshold, highest confidence first.
    pub patterns: Vec<DetectedPattern>,
    /// Number of vertices scanned.
    pub scanned: usize,
    /// Detectors that failed and were skipped.
    pub skipped: Vec<PatternType>,
}

/// Detects structural patterns.
#[derive(Debug, Clone)]
pub struct PatternDetector {
    edges: EdgeRepository,
    dependencies: DependencyAnalyzer,
}

impl PatternDetector {
    /// Create a detector.
    pub fn new(edges: EdgeRepository, dependencies: DependencyAnalyzer) -> Self {
        Self {
            edges,
            dependencies,
        }
    }

    /// Scan the visible vertices in `options.scope`.
    ///
    /// The degree scan feeds every detector and is fatal if it fails.
    /// The cycle and chain detectors walk the graph and are skipped with a
    /// warning when a walk fails.
    ///
    /// # Errors
    ///
    /// `Error::Validation` for an out-of-range threshold or chain length;
    /// `Error::Engine` if the degree scan fails.
    pub async fn detect(
        &self,
        ctx: &SecurityContext,
        options: &PatternOptions,
    ) -> Result<PatternReport> {
        if !(0.0..=1.0).contains(&options.similarity_threshold) {
            return Err(Error::validation(
                "similarityThreshold",
                "must be between 0 and 1",
            ));
        }
        if options.deep_chain_length == 0 {
            return Err(Error::validation("deepChainLength", "must be at least 1"));
        }

        let degrees = self
            .edges
            .degrees(ctx, &options.scope, &options.edge_types)
            .await?;

        let mut found = vec![
            hubs(&degrees, options.hub_degree),
            god_objects(&degrees, options.god_object_fan_out, options.god_object_ratio),
            isolated(&degrees),
        ];
        let mut skipped = Vec::new();

        let (cycles, chains) = tokio::join!(
            self.cycles(ctx, &degrees, options),
            self.deep_chains(ctx, &degrees, options)
        );
        for (pattern_type, outcome) in [
            (PatternType::CircularDependencies, cycles),
            (PatternType::DeepDependencyChain, chains),
        ] {
            match outcome {
                Ok(pattern) => found.push(pattern),
                Err(e) => {
                    warn!(pattern = %pattern_type, error = %e, "Pattern detector failed, skipping it");
                    skipped.push(pattern_type);
                }
            }
        }

        let mut patterns: Vec<DetectedPattern> = found
            .into_iter()
            .flatten()
            .filter(|p| p.confidence >= options.similarity_threshold)
            .collect();
        patterns.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then(b.count.cmp(&a.count))
                .then(a.pattern_type.cmp(&b.pattern_type))
        });
        patterns.truncate(options.limit);

        debug!(
            tenant = ctx.tenant_id(),
            scanned = degrees.len(),
            patterns = patterns.len(),
            skipped = skipped.len(),
            "Detected patterns"
        );

        Ok(PatternReport {
            patterns,
            scanned: degrees.len(),
            skipped,
        })
    }

    /// Distinct cycles through vertices that have both incoming and
    /// outgoing edges.
    async fn cycles(
        &self,
        ctx: &SecurityContext,
        degrees: &[Degree],
        options: &PatternOptions,
    ) -> Result<Option<DetectedPattern>> {
        let walk = DependencyOptions {
            edge_types: options.edge_types.clone(),
            max_depth: options.cycle_depth,
            path_limit: options.cycle_path_limit,
            ..DependencyOptions::default()
        };
        let searches = degrees
            .iter()
            .filter(|d| d.in_degree > 0 && d.out_degree > 0)
            .map(|d| {
                self.dependencies
                    .detect_circular_dependencies(ctx, &d.vertex.id, &walk)
            });
        let found = try_join_all(searches).await?;

        let cycles: BTreeSet<Vec<VertexId>> = found.into_iter().flatten().collect();
        if cycles.is_empty() {
            return Ok(None);
        }
        let members: BTreeSet<VertexId> = cycles.iter().flatten().cloned().collect();
        Ok(Some(DetectedPattern::new(
            PatternType::CircularDependencies,
            cycles.len(),
            members.into_iter().collect(),
        )))
    }

    /// Chain roots (no incoming edges) with a simple outgoing path of at
    /// least `deep_chain_length` hops.
    async fn deep_chains(
        &self,
        ctx: &SecurityContext,
        degrees: &[Degree],
        options: &PatternOptions,
    ) -> Result<Option<DetectedPattern>> {
        let walk = DependencyOptions {
            edge_types: options.edge_types.clone(),
            max_depth: options.deep_chain_length,
            path_limit: options.cycle_path_limit,
            detect_cycles: false,
            ..DependencyOptions::default()
        };
        let roots: Vec<&Degree> = degrees
            .iter()
            .filter(|d| d.in_degree == 0 && d.out_degree > 0)
            .collect();
        let walks = roots.iter().map(|d| {
            self.dependencies
                .forward_dependencies(ctx, &d.vertex.id, &walk)
        });
        let reached = try_join_all(walks).await?;

        let deep: Vec<VertexId> = roots
            .iter()
            .zip(reached)
            .filter(|(_, deps)| {
                deps.iter()
                    .any(|dep| dep.level >= options.deep_chain_length)
            })
            .map(|(d, _)| d.vertex.id.clone())
            .collect();
        if deep.is_empty() {
            return Ok(None);
        }
        Ok(Some(DetectedPattern::new(
            PatternType::DeepDependencyChain,
            deep.len(),
            deep,
        )))
    }
}

fn pattern_from(pattern_type: PatternType, matching: Vec<VertexId>) -> Option<DetectedPattern> {
    if matching.is_empty() {
        None
    } else {
        Some(DetectedPattern::new(pattern_type, matching.len(), matching))
    }
}

fn hubs(degrees: &[Degree], hub_degree: usize) -> Option<DetectedPattern> {
    let matching = degrees
        .iter()
        .filter(|d| d.total() >= hub_degree.max(1))
        .map(|d| d.vertex.id.clone())
        .collect();
    pattern_from(PatternType::HubFunction, matching)
}

#[allow(clippy::cast_precision_loss)]
fn god_objects(degrees: &[Degree], fan_out: usize, ratio: f64) -> Option<DetectedPattern> {
    if degrees.is_empty() {
        return None;
    }
    let mean = degrees.iter().map(|d| d.out_degree).sum::<usize>() as f64 / degrees.len() as f64;
    let threshold = (fan_out.max(1) as f64).max(ratio * mean);
    let matching = degrees
        .iter()
        .filter(|d| d.out_degree as f64 >= threshold)
        .map(|d| d.vertex.id.clone())
        .collect();
    pattern_from(PatternType::GodObject, matching)
}

fn isolated(degrees: &[Degree]) -> Option<DetectedPattern> {
    let matching = degrees
        .iter()
        .filter(|d| d.total() == 0)
        .map(|d| d.vertex.id.clone())
        .collect();
    pattern_from(PatternType::IsolatedComponent, matching)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        AccessLevel, SCHEMA_VERSION, Vertex, VertexAttributes, VertexKind, Visibility,
    };
    use chrono::Utc;
    use rstest::rstest;
    use std::collections::BTreeMap;

    #[rstest]
    #[case(PatternType::IsolatedComponent, 1, 0.5)]
    #[case(PatternType::IsolatedComponent, 3, 0.6)]
    #[case(PatternType::IsolatedComponent, 6, 0.7)]
    #[case(PatternType::IsolatedComponent, 11, 0.8)]
    #[case(PatternType::HubFunction, 2, 0.7)]
    #[case(PatternType::GodObject, 5, 0.8)]
    #[case(PatternType::CircularDependencies, 11, 1.0)]
    fn test_confidence(#[case] pattern: PatternType, #[case] count: usize, #[case] expected: f64) {
        assert!((confidence(pattern, count) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_never_exceeds_one() {
        for pattern in PatternType::ALL {
            for count in [0, 1, 3, 6, 11, 1000] {
                let c = confidence(pattern, count);
                assert!((0.5..=1.0).contains(&c));
            }
        }
    }

    #[test]
    fn test_every_pattern_has_a_template() {
        for pattern in PatternType::ALL {
            assert!(
                RECOMMENDATION_TEMPLATES.iter().any(|(p, _)| *p == pattern),
                "missing template for {pattern}"
            );
        }
        assert!(recommendation_for(PatternType::CircularDependencies).contains("abstraction"));
    }

    fn degree(id: &str, in_degree: usize, out_degree: usize) -> Degree {
        let attrs = VertexAttributes::new(VertexKind::function(), id);
        let now = Utc::now();
        Degree {
            vertex: Vertex {
                id: VertexId::new(id),
                kind: attrs.kind,
                name: attrs.name,
                description: attrs.description,
                project: attrs.project,
                domain: attrs.domain,
                tenant_id: "acme".into(),
                user_id: "u1".into(),
                team_id: None,
                visibility: Visibility::Organization,
                access_level: AccessLevel::Write,
                shared_with: BTreeSet::new(),
                created_at: now,
                updated_at: now,
                created_by: "u1".into(),
                updated_by: "u1".into(),
                version: 1,
                schema_version: SCHEMA_VERSION,
                tags: BTreeSet::new(),
                keywords: BTreeSet::new(),
                metadata: BTreeMap::new(),
            },
            in_degree,
            out_degree,
        }
    }

    #[test]
    fn test_hubs_and_isolated() {
        let degrees = vec![degree("a", 6, 5), degree("b", 0, 0), degree("c", 1, 1)];
        let hub = hubs(&degrees, 10).unwrap();
        assert_eq!(hub.vertices, vec![VertexId::new("a")]);
        let lonely = isolated(&degrees).unwrap();
        assert_eq!(lonely.vertices, vec![VertexId::new("b")]);
        assert_eq!(lonely.count, 1);
    }

    #[test]
    fn test_god_object_needs_absolute_and_relative_fan_out() {
        let mut degrees: Vec<Degree> = (0..10).map(|i| degree(&format!("v{i}"), 1, 1)).collect();
        degrees.push(degree("big", 0, 20));
        let found = god_objects(&degrees, 15, 3.0).unwrap();
        assert_eq!(found.vertices, vec![VertexId::new("big")]);

        assert!(god_objects(&degrees, 25, 3.0).is_none());
        assert!(god_objects(&[], 15, 3.0).is_none());
    }
}
