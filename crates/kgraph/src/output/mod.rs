//! Output formatting for CLI commands.
//!
//! Every command prints either human-readable text or pretty JSON of the
//! library result. Text renderers are generic over [`Write`] so they can
//! be tested against a buffer.
//!
//! Submodules:
//! - [`color`]: Color and styling helpers
//! - [`tree`]: Dependency tree rendering with ASCII/Unicode connectors

pub mod color;
pub mod tree;

use crate::analysis::{DependencyAnalysis, ImpactAnalysis, PatternReport};
use crate::domain::{Edge, QueryResult, Vertex, VertexKind, VertexType};
use crate::traversal::TraversalPath;
use serde::Serialize;
use std::collections::BTreeMap;
use std::env;
use std::io::{self, Write};

pub use color::{error, info, success, warning};
pub use tree::DepTreeNode;

use color::{
    bold, colorize_confidence, colorize_edge_type, colorize_id, colorize_severity, colorize_tags,
    colorize_visibility, dimmed,
};

// ============================================================================
// Output Configuration
// ============================================================================

/// Widest that wrapped text is allowed to get, even on wide terminals.
const DEFAULT_MAX_CONTENT_WIDTH: usize = 100;

/// Assumed terminal width when detection fails (e.g. output is piped).
const DEFAULT_TERMINAL_WIDTH: u16 = 80;

/// Configuration for output formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    /// Maximum width for wrapped free-form text.
    pub max_width: usize,
    /// Whether to use ASCII-only connectors instead of Unicode.
    pub use_ascii: bool,
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create a new `OutputConfig` with explicit values.
    pub fn new(use_ascii: bool, use_colors: bool) -> Self {
        Self {
            max_width: DEFAULT_MAX_CONTENT_WIDTH,
            use_ascii,
            use_colors,
        }
    }

    /// Create an `OutputConfig` by reading from environment variables.
    ///
    /// Reads:
    /// - `KGRAPH_ASCII`: "1" or "true" for ASCII-only connectors (default: false)
    /// - `NO_COLOR`: Standard env var to disable colors (any value disables colors)
    /// - `KGRAPH_COLOR`: "0" or "false" to disable colors (default: true)
    pub fn from_env() -> Self {
        let use_ascii = match env::var("KGRAPH_ASCII") {
            Ok(v) if v == "1" || v.eq_ignore_ascii_case("true") => true,
            Ok(v) if v == "0" || v.eq_ignore_ascii_case("false") || v.is_empty() => false,
            Ok(v) => {
                tracing::warn!(
                    env_var = "KGRAPH_ASCII",
                    value = %v,
                    "Invalid value (expected '1', 'true', '0', or 'false'), using default"
                );
                false
            }
            Err(_) => false,
        };

        // https://no-color.org/
        let use_colors = env::var("NO_COLOR").is_err()
            && env::var("KGRAPH_COLOR")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true);

        Self {
            max_width: get_terminal_width().min(DEFAULT_MAX_CONTENT_WIDTH),
            use_ascii,
            use_colors,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_CONTENT_WIDTH,
            use_ascii: false,
            use_colors: true,
        }
    }
}

/// Get the current terminal width, falling back to default if detection fails.
fn get_terminal_width() -> usize {
    terminal_size::terminal_size()
        .map_or(DEFAULT_TERMINAL_WIDTH, |(w, _)| w.0)
        .into()
}

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

// ============================================================================
// Public Dispatch Functions
// ============================================================================

/// Write `value` as JSON, or run the text renderer, to stdout.
fn emit<T, F>(value: &T, mode: OutputMode, text: F) -> io::Result<()>
where
    T: Serialize + ?Sized,
    F: FnOnce(&mut io::StdoutLock<'static>, &OutputConfig) -> io::Result<()>,
{
    let mut handle = io::stdout().lock();
    match mode {
        OutputMode::Text => text(&mut handle, &OutputConfig::from_env()),
        OutputMode::Json => write_json(&mut handle, value),
    }
}

/// Print a single vertex
pub fn print_vertex(vertex: &Vertex, mode: OutputMode) -> io::Result<()> {
    emit(vertex, mode, |w, config| write_vertex_details(w, vertex, config))
}

/// Print a page of vertices
pub fn print_vertices(result: &QueryResult<Vertex>, mode: OutputMode) -> io::Result<()> {
    emit(result, mode, |w, config| write_vertex_page(w, result, config))
}

/// Print the edges of a vertex
pub fn print_edges(edges: &[Edge], incoming: bool, mode: OutputMode) -> io::Result<()> {
    emit(edges, mode, |w, config| write_edges(w, edges, incoming, config))
}

/// Print traversal paths
pub fn print_paths(paths: &[TraversalPath], mode: OutputMode) -> io::Result<()> {
    emit(paths, mode, |w, config| write_paths(w, paths, config))
}

/// Print a dependency analysis
pub fn print_dependencies(analysis: &DependencyAnalysis, mode: OutputMode) -> io::Result<()> {
    emit(analysis, mode, |w, config| {
        write_dependencies(w, analysis, config)
    })
}

/// Print an impact analysis
pub fn print_impact(analysis: &ImpactAnalysis, mode: OutputMode) -> io::Result<()> {
    emit(analysis, mode, |w, config| write_impact(w, analysis, config))
}

/// Print a pattern report
pub fn print_patterns(report: &PatternReport, mode: OutputMode) -> io::Result<()> {
    emit(report, mode, |w, config| write_patterns(w, report, config))
}

/// Print visible vertex counts per type
pub fn print_stats(counts: &BTreeMap<VertexType, usize>, mode: OutputMode) -> io::Result<()> {
    emit(counts, mode, |w, config| write_stats(w, counts, config))
}

/// Print a simple message
pub fn print_message(msg: &str) -> io::Result<()> {
    let mut handle = io::stdout().lock();
    writeln!(handle, "{msg}")
}

/// Print a JSON-formatted result for any serializable value
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
    write_json(&mut io::stdout().lock(), value)
}

fn write_json<W: Write, T: Serialize + ?Sized>(w: &mut W, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(w, "{json}")
}

// ============================================================================
// Text Formatting
// ============================================================================

fn vertex_line(vertex: &Vertex, config: &OutputConfig) -> String {
    format!(
        "{}  {:<8}  {}  [{}]",
        colorize_id(vertex.id.as_str(), config),
        vertex.vertex_type().as_str(),
        vertex.name,
        colorize_visibility(vertex.visibility, config)
    )
}

fn write_field<W: Write>(
    w: &mut W,
    label: &str,
    value: &str,
    config: &OutputConfig,
) -> io::Result<()> {
    if value.is_empty() {
        return Ok(());
    }
    writeln!(w, "  {} {}", dimmed(&format!("{label}:"), config), value)
}

/// Labelled block of wrapped, indented free-form text.
fn write_text_block<W: Write>(
    w: &mut W,
    label: &str,
    text: &str,
    config: &OutputConfig,
) -> io::Result<()> {
    if text.trim().is_empty() {
        return Ok(());
    }
    writeln!(w, "  {}", dimmed(&format!("{label}:"), config))?;
    for line in wrap_text(text, config.max_width.saturating_sub(4).max(1)) {
        writeln!(w, "    {line}")?;
    }
    Ok(())
}

/// Wrap text to fit within a given width, preserving existing line breaks.
/// Uses textwrap to handle edge cases like long words (URLs, file paths).
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    text.lines()
        .flat_map(|line| {
            if line.trim().is_empty() {
                vec![String::new()]
            } else {
                textwrap::wrap(line, max_width)
                    .into_iter()
                    .map(std::borrow::Cow::into_owned)
                    .collect()
            }
        })
        .collect()
}

fn write_vertex_details<W: Write>(
    w: &mut W,
    vertex: &Vertex,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(w, "{}", vertex_line(vertex, config))?;
    write_field(w, "Project", &vertex.project, config)?;
    write_field(w, "Domain", &vertex.domain, config)?;
    write_field(w, "Owner", &vertex.user_id, config)?;
    write_field(w, "Team", vertex.team_id.as_deref().unwrap_or_default(), config)?;
    write_field(w, "Access", vertex.access_level.as_str(), config)?;
    write_field(
        w,
        "Shared with",
        &vertex
            .shared_with
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        config,
    )?;
    write_field(w, "Tags", &colorize_tags(&vertex.tags, config), config)?;
    write_field(w, "Keywords", &colorize_tags(&vertex.keywords, config), config)?;

    match &vertex.kind {
        VertexKind::Function {
            file_path,
            signature,
            is_async,
            parameters,
        } => {
            write_field(w, "File", file_path.as_deref().unwrap_or_default(), config)?;
            write_field(w, "Signature", signature.as_deref().unwrap_or_default(), config)?;
            if *is_async {
                write_field(w, "Async", "yes", config)?;
            }
            let params = parameters
                .iter()
                .map(|p| match &p.type_name {
                    Some(t) => format!("{}: {t}", p.name),
                    None => p.name.clone(),
                })
                .collect::<Vec<_>>()
                .join(", ");
            write_field(w, "Parameters", &params, config)?;
        }
        VertexKind::Model { file_path, fields } => {
            write_field(w, "File", file_path.as_deref().unwrap_or_default(), config)?;
            write_field(w, "Fields", &fields.join(", "), config)?;
        }
        VertexKind::System { components } => {
            write_field(w, "Components", &components.join(", "), config)?;
        }
        VertexKind::Pattern { category } => {
            write_field(w, "Category", category.as_deref().unwrap_or_default(), config)?;
        }
        VertexKind::Concept { definition } => {
            write_text_block(w, "Definition", definition.as_deref().unwrap_or_default(), config)?;
        }
        VertexKind::Custom { type_name } => {
            write_field(w, "Custom type", type_name, config)?;
        }
    }

    for (key, value) in &vertex.metadata {
        write_field(w, key, value, config)?;
    }

    writeln!(
        w,
        "  {} v{}, created {} by {}, updated {} by {}",
        dimmed("Version:", config),
        vertex.version,
        vertex.created_at.format("%Y-%m-%d %H:%M"),
        vertex.created_by,
        vertex.updated_at.format("%Y-%m-%d %H:%M"),
        vertex.updated_by
    )?;

    write_text_block(w, "Description", &vertex.description, config)
}

fn write_vertex_page<W: Write>(
    w: &mut W,
    result: &QueryResult<Vertex>,
    config: &OutputConfig,
) -> io::Result<()> {
    if result.data.is_empty() {
        writeln!(w, "No vertices found.")?;
        return Ok(());
    }

    writeln!(
        w,
        "Showing {} of {} vertex(es):",
        result.data.len(),
        result.count
    )?;
    writeln!(w)?;
    for vertex in &result.data {
        writeln!(w, "{}", vertex_line(vertex, config))?;
    }
    if let Some(cursor) = &result.cursor {
        writeln!(w)?;
        writeln!(
            w,
            "{}",
            dimmed(&format!("More results: use --offset {cursor}"), config)
        )?;
    }
    Ok(())
}

fn write_edges<W: Write>(
    w: &mut W,
    edges: &[Edge],
    incoming: bool,
    config: &OutputConfig,
) -> io::Result<()> {
    if edges.is_empty() {
        writeln!(w, "No edges found.")?;
        return Ok(());
    }

    let arrow = if config.use_ascii { "->" } else { "→" };
    writeln!(
        w,
        "{} {} edge(s):",
        edges.len(),
        if incoming { "incoming" } else { "outgoing" }
    )?;
    writeln!(w)?;
    for edge in edges {
        writeln!(
            w,
            "{}  {} {} {}  {}  [{}]",
            colorize_id(edge.id.as_str(), config),
            colorize_id(edge.from_vertex_id.as_str(), config),
            dimmed(arrow, config),
            colorize_id(edge.to_vertex_id.as_str(), config),
            colorize_edge_type(edge.edge_type.as_str(), config),
            colorize_visibility(edge.visibility, config)
        )?;
    }
    Ok(())
}

fn write_paths<W: Write>(
    w: &mut W,
    paths: &[TraversalPath],
    config: &OutputConfig,
) -> io::Result<()> {
    if paths.is_empty() {
        writeln!(w, "No paths found.")?;
        return Ok(());
    }

    let arrow = if config.use_ascii { "--" } else { "─" };
    writeln!(w, "Found {} path(s):", paths.len())?;
    writeln!(w)?;
    for path in paths {
        let mut line = String::new();
        for (i, vertex) in path.vertices.iter().enumerate() {
            if i > 0 {
                let label = path
                    .edges
                    .get(i - 1)
                    .map(|e| e.edge_type.as_str())
                    .unwrap_or_default();
                line.push_str(&format!(
                    " {}{}{} ",
                    dimmed(arrow, config),
                    colorize_edge_type(label, config),
                    dimmed(&format!("{arrow}>"), config)
                ));
            }
            line.push_str(&format!(
                "{} {}",
                colorize_id(vertex.id.as_str(), config),
                vertex.name
            ));
        }
        writeln!(w, "{line}")?;
    }
    Ok(())
}

fn write_dependencies<W: Write>(
    w: &mut W,
    analysis: &DependencyAnalysis,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(
        w,
        "{} {} {}",
        bold("Dependencies of", config),
        colorize_id(analysis.root.id.as_str(), config),
        analysis.root.name
    )?;

    if let Some(forward) = &analysis.forward {
        writeln!(w)?;
        writeln!(w, "{}", bold(&format!("Depends on ({}):", forward.len()), config))?;
        if forward.is_empty() {
            writeln!(w, "  (none)")?;
        } else {
            tree::write_dep_tree(w, &DepTreeNode::build(&analysis.root, forward), config)?;
        }
    }

    if let Some(reverse) = &analysis.reverse {
        writeln!(w)?;
        writeln!(w, "{}", bold(&format!("Depended on by ({}):", reverse.len()), config))?;
        if reverse.is_empty() {
            writeln!(w, "  (none)")?;
        } else {
            tree::write_dep_tree(w, &DepTreeNode::build(&analysis.root, reverse), config)?;
        }
    }

    if let Some(cycles) = &analysis.cycles {
        writeln!(w)?;
        writeln!(w, "{}", bold(&format!("Cycles ({}):", cycles.len()), config))?;
        let arrow = if config.use_ascii { " -> " } else { " → " };
        for cycle in cycles {
            let mut ids: Vec<String> = cycle
                .iter()
                .map(|id| colorize_id(id.as_str(), config))
                .collect();
            if let Some(first) = cycle.first() {
                ids.push(colorize_id(first.as_str(), config));
            }
            writeln!(w, "  {}", warning(&ids.join(arrow), config))?;
        }
    }

    for section in &analysis.failed_sections {
        writeln!(w)?;
        writeln!(
            w,
            "{}",
            error(&format!("Section '{section}' could not be computed"), config)
        )?;
    }

    writeln!(w)?;
    writeln!(
        w,
        "{} {} forward, {} reverse, {} cycle(s), max depth {}",
        dimmed("Summary:", config),
        analysis.stats.forward_count,
        analysis.stats.reverse_count,
        analysis.stats.cycle_count,
        analysis.stats.max_depth
    )
}

fn write_impact<W: Write>(
    w: &mut W,
    analysis: &ImpactAnalysis,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(
        w,
        "{} {} {} {}",
        bold("Impact of", config),
        warning(analysis.change_type.as_str(), config),
        colorize_id(analysis.target.id.as_str(), config),
        analysis.target.name
    )?;
    writeln!(w)?;

    if analysis.impacted.is_empty() {
        writeln!(w, "{}", success("No visible dependents are affected.", config))?;
    } else {
        for impacted in &analysis.impacted {
            writeln!(
                w,
                "  {:<8}  L{}  {}  {}  ({})",
                colorize_severity(impacted.severity, config),
                impacted.level,
                colorize_id(impacted.vertex.id.as_str(), config),
                impacted.vertex.name,
                colorize_edge_type(impacted.edge_type.as_str(), config)
            )?;
        }
    }

    let counts = &analysis.counts;
    writeln!(w)?;
    writeln!(
        w,
        "{} {} critical, {} high, {} medium, {} low (max depth {})",
        dimmed("Summary:", config),
        counts.critical,
        counts.high,
        counts.medium,
        counts.low,
        analysis.max_depth
    )?;

    if !analysis.recommendations.is_empty() {
        writeln!(w)?;
        writeln!(w, "{}", bold("Recommendations:", config))?;
        for recommendation in &analysis.recommendations {
            writeln!(w, "  - {recommendation}")?;
        }
    }
    Ok(())
}

fn write_patterns<W: Write>(
    w: &mut W,
    report: &PatternReport,
    config: &OutputConfig,
) -> io::Result<()> {
    if report.patterns.is_empty() {
        writeln!(
            w,
            "No patterns detected across {} vertex(es).",
            report.scanned
        )?;
    } else {
        writeln!(
            w,
            "Detected {} pattern(s) across {} vertex(es):",
            report.patterns.len(),
            report.scanned
        )?;
        for pattern in &report.patterns {
            writeln!(w)?;
            writeln!(
                w,
                "{} {} ({} occurrence(s))",
                colorize_confidence(pattern.confidence, config),
                bold(pattern.name, config),
                pattern.count
            )?;
            let ids = pattern
                .vertices
                .iter()
                .map(|id| colorize_id(id.as_str(), config))
                .collect::<Vec<_>>()
                .join(", ");
            write_field(w, "Vertices", &ids, config)?;
            write_field(w, "Recommendation", pattern.recommendation, config)?;
        }
    }

    for skipped in &report.skipped {
        writeln!(
            w,
            "{}",
            warning(&format!("Skipped detector: {}", skipped.name()), config)
        )?;
    }
    Ok(())
}

fn write_stats<W: Write>(
    w: &mut W,
    counts: &BTreeMap<VertexType, usize>,
    config: &OutputConfig,
) -> io::Result<()> {
    let total: usize = counts.values().sum();
    writeln!(w, "{}", bold("Visible vertices", config))?;
    writeln!(w)?;
    for (vertex_type, count) in counts {
        writeln!(w, "  {:<10} {count}", vertex_type.as_str())?;
    }
    writeln!(w, "  {:<10} {total}", "Total")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{
        ChangeType, Dependency, DependencyStats, DetectedPattern, ImpactedVertex, PatternType,
        Section, Severity, SeverityCounts,
    };
    use crate::domain::{AccessLevel, EdgeId, EdgeType, SCHEMA_VERSION, VertexId, Visibility};
    use chrono::Utc;

    fn plain() -> OutputConfig {
        OutputConfig::new(false, false)
    }

    fn vertex(id: &str, name: &str) -> Vertex {
        let now = Utc::now();
        Vertex {
            id: VertexId::new(id),
            kind: VertexKind::function(),
            name: name.to_string(),
            description: String::new(),
            project: "billing".to_string(),
            domain: String::new(),
            tenant_id: "acme".to_string(),
            user_id: "alice".to_string(),
            team_id: None,
            visibility: Visibility::Organization,
            access_level: AccessLevel::Write,
            shared_with: Default::default(),
            created_at: now,
            updated_at: now,
            created_by: "alice".to_string(),
            updated_by: "alice".to_string(),
            version: 1,
            schema_version: SCHEMA_VERSION,
            tags: ["api".to_string()].into_iter().collect(),
            keywords: Default::default(),
            metadata: Default::default(),
        }
    }

    fn edge(from: &str, to: &str) -> Edge {
        let now = Utc::now();
        Edge {
            id: EdgeId::new(format!("e-{from}-{to}")),
            edge_type: EdgeType::Calls,
            from_vertex_id: VertexId::new(from),
            to_vertex_id: VertexId::new(to),
            tenant_id: "acme".to_string(),
            user_id: "alice".to_string(),
            visibility: Visibility::Organization,
            created_at: now,
            updated_at: now,
            metadata: Default::default(),
        }
    }

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let mut buffer = Vec::new();
        f(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_output_config_default() {
        let config = OutputConfig::default();
        assert!(!config.use_ascii);
        assert!(config.use_colors);
        assert_eq!(config.max_width, DEFAULT_MAX_CONTENT_WIDTH);
    }

    #[test]
    fn test_wrap_text() {
        let wrapped = wrap_text("Parses the configuration file into typed settings", 20);
        assert!(wrapped.len() > 1);
        assert!(wrapped.iter().all(|line| line.chars().count() <= 20));
    }

    #[test]
    fn test_wrap_text_preserves_newlines() {
        let wrapped = wrap_text("first\n\nsecond", 50);
        assert_eq!(wrapped, vec!["first", "", "second"]);
    }

    #[test]
    fn test_wrap_text_empty_input() {
        assert!(wrap_text("", 80).is_empty());
    }

    #[test]
    fn test_description_is_wrapped_block() {
        let mut v = vertex("kg-a", "parse_config");
        v.description = "Reads the file and validates every section".to_string();
        let config = OutputConfig {
            max_width: 24,
            ..plain()
        };
        let output = render(|w| write_vertex_details(w, &v, &config));

        let block: Vec<&str> = output
            .lines()
            .skip_while(|line| *line != "  Description:")
            .skip(1)
            .collect();
        assert!(block.len() > 1);
        assert!(block.iter().all(|line| line.starts_with("    ")));
        assert!(block.iter().all(|line| line.chars().count() <= 24));
    }

    #[test]
    fn test_vertex_details() {
        let v = vertex("kg-a", "parse_config");
        let output = render(|w| write_vertex_details(w, &v, &plain()));

        assert!(output.starts_with("kg-a  Function  parse_config  [organization]\n"));
        assert!(output.contains("Project: billing"));
        assert!(output.contains("Tags: api"));
        assert!(!output.contains("Domain:"), "empty fields are omitted");
    }

    #[test]
    fn test_vertex_page_with_cursor() {
        let result = QueryResult::from_page(vec![vertex("kg-a", "a")], 3, 0);
        let output = render(|w| write_vertex_page(w, &result, &plain()));

        assert!(output.contains("Showing 1 of 3 vertex(es):"));
        assert!(output.contains("use --offset 1"));
    }

    #[test]
    fn test_empty_vertex_page() {
        let output = render(|w| write_vertex_page(w, &QueryResult::empty(), &plain()));
        assert_eq!(output, "No vertices found.\n");
    }

    #[test]
    fn test_edges_ascii_arrow() {
        let edges = [edge("kg-a", "kg-b")];
        let output = render(|w| write_edges(w, &edges, false, &OutputConfig::new(true, false)));

        assert!(output.contains("1 outgoing edge(s):"));
        assert!(output.contains("kg-a -> kg-b  CALLS  [organization]"));
    }

    #[test]
    fn test_paths_alternate_vertices_and_edges() {
        let path = TraversalPath {
            vertices: vec![vertex("kg-a", "a"), vertex("kg-b", "b")],
            edges: vec![edge("kg-a", "kg-b")],
        };
        let output = render(|w| write_paths(w, &[path], &OutputConfig::new(true, false)));

        assert!(output.contains("kg-a a --CALLS--> kg-b b"));
    }

    #[test]
    fn test_dependencies_sections() {
        let root = vertex("kg-a", "a");
        let analysis = DependencyAnalysis {
            root: root.clone(),
            forward: Some(vec![Dependency {
                vertex: vertex("kg-b", "b"),
                level: 1,
                path: vec![VertexId::new("kg-a"), VertexId::new("kg-b")],
                edge_type: EdgeType::Calls,
            }]),
            reverse: None,
            cycles: Some(vec![vec![VertexId::new("kg-a"), VertexId::new("kg-b")]]),
            stats: DependencyStats {
                forward_count: 1,
                reverse_count: 0,
                cycle_count: 1,
                max_depth: 5,
            },
            failed_sections: vec![Section::Reverse],
        };

        let output = render(|w| write_dependencies(w, &analysis, &OutputConfig::new(true, false)));

        assert!(output.contains("Depends on (1):"));
        assert!(output.contains("`-- kg-b b (CALLS)"));
        assert!(output.contains("kg-a -> kg-b -> kg-a"));
        assert!(output.contains("Section 'reverse' could not be computed"));
        assert!(!output.contains("Depended on by"));
    }

    #[test]
    fn test_impact_lists_recommendations() {
        let analysis = ImpactAnalysis {
            target: vertex("kg-a", "a"),
            change_type: ChangeType::Delete,
            impacted: vec![ImpactedVertex {
                vertex: vertex("kg-b", "b"),
                level: 1,
                severity: Severity::Critical,
                edge_type: EdgeType::Calls,
                path: vec![VertexId::new("kg-a"), VertexId::new("kg-b")],
            }],
            counts: SeverityCounts {
                critical: 1,
                ..SeverityCounts::default()
            },
            max_depth: 1,
            recommendations: vec!["Deprecate first".to_string()],
        };

        let output = render(|w| write_impact(w, &analysis, &plain()));

        assert!(output.contains("Impact of delete kg-a a"));
        assert!(output.contains("critical"));
        assert!(output.contains("1 critical, 0 high, 0 medium, 0 low"));
        assert!(output.contains("  - Deprecate first"));
    }

    #[test]
    fn test_patterns_report_skipped() {
        let report = PatternReport {
            patterns: vec![DetectedPattern {
                pattern_type: PatternType::HubFunction,
                name: PatternType::HubFunction.name(),
                count: 1,
                confidence: 0.7,
                vertices: vec![VertexId::new("kg-hub")],
                recommendation: "Split it",
            }],
            scanned: 12,
            skipped: vec![PatternType::CircularDependencies],
        };

        let output = render(|w| write_patterns(w, &report, &plain()));

        assert!(output.contains("Detected 1 pattern(s) across 12 vertex(es):"));
        assert!(output.contains("70% Hub Function (1 occurrence(s))"));
        assert!(output.contains("Vertices: kg-hub"));
        assert!(output.contains("Skipped detector: Circular Dependencies"));
    }

    #[test]
    fn test_stats_total() {
        let counts: BTreeMap<VertexType, usize> =
            [(VertexType::Function, 3), (VertexType::Model, 2)].into_iter().collect();
        let output = render(|w| write_stats(w, &counts, &plain()));

        assert!(output.contains("Function   3"));
        assert!(output.contains("Total      5"));
    }

    #[test]
    fn test_write_json_is_pretty() {
        let output = render(|w| write_json(w, &serde_json::json!({"count": 1})));
        assert_eq!(output, "{\n  \"count\": 1\n}\n");
    }
}
