//! CLI argument structs for all commands.

use clap::Parser;

use super::types::{
    AccessLevelArg, ChangeTypeArg, DirectionArg, EdgeTypeArg, OrderDirectionArg, OrderFieldArg,
    VertexTypeArg, VisibilityArg,
};
use super::validators::{
    validate_id, validate_metadata, validate_name, validate_prefix, validate_principal,
};

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Id prefix (e.g., "kg" for "kg-3f8a0c1d9e2b")
    ///
    /// Must be 2-20 alphanumeric characters.
    #[arg(short, long, value_parser = validate_prefix)]
    pub prefix: Option<String>,

    /// Suppress output messages
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `create` command
#[derive(Parser, Debug, Clone)]
pub struct CreateArgs {
    /// Vertex name (maximum 200 characters)
    #[arg(value_parser = validate_name)]
    pub name: String,

    /// Vertex type
    #[arg(short = 't', long = "type", value_enum, default_value = "function")]
    pub vertex_type: VertexTypeArg,

    /// Type name for custom vertices
    #[arg(long, required_if_eq("vertex_type", "custom"))]
    pub custom_type: Option<String>,

    /// Description
    #[arg(short = 'D', long)]
    pub description: Option<String>,

    /// Project
    #[arg(long)]
    pub project: Option<String>,

    /// Domain
    #[arg(long)]
    pub domain: Option<String>,

    /// Visibility (default: private)
    #[arg(long, value_enum)]
    pub visibility: Option<VisibilityArg>,

    /// Owning team
    #[arg(long, value_parser = validate_principal)]
    pub team_id: Option<String>,

    /// Access level granted to readers (default: write)
    #[arg(long, value_enum)]
    pub access: Option<AccessLevelArg>,

    /// Tags (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Keywords (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub keywords: Vec<String>,

    /// Metadata entries (key=value, repeatable)
    #[arg(short, long, value_parser = validate_metadata)]
    pub metadata: Vec<(String, String)>,

    /// Source file (functions and models)
    #[arg(long)]
    pub file_path: Option<String>,

    /// Signature (functions)
    #[arg(long)]
    pub signature: Option<String>,

    /// Mark the function as async
    #[arg(long = "async")]
    pub is_async: bool,
}

/// Arguments for the `show` command
#[derive(Parser, Debug, Clone)]
pub struct ShowArgs {
    /// Vertex id
    #[arg(value_parser = validate_id)]
    pub id: String,
}

/// Arguments for the `list` command
#[derive(Parser, Debug, Clone)]
pub struct ListArgs {
    /// Filter by vertex type (repeatable)
    #[arg(short = 't', long = "type", value_enum)]
    pub vertex_types: Vec<VertexTypeArg>,

    /// Filter by project
    #[arg(long)]
    pub project: Option<String>,

    /// Filter by domain
    #[arg(long)]
    pub domain: Option<String>,

    /// Filter by exact name
    #[arg(long)]
    pub name: Option<String>,

    /// Filter by tag
    #[arg(long)]
    pub tag: Option<String>,

    /// Filter by owner
    #[arg(long)]
    pub owner: Option<String>,

    /// Filter by team
    #[arg(long)]
    pub team_id: Option<String>,

    /// Filter by visibility
    #[arg(long, value_enum)]
    pub visibility: Option<VisibilityArg>,

    /// Number of matches to skip
    #[arg(long, default_value = "0")]
    pub offset: usize,

    /// Maximum number of vertices to display (1-1000)
    #[arg(short = 'n', long, default_value = "50", value_parser = clap::value_parser!(u16).range(1..=1000))]
    pub limit: u16,

    /// Sort field
    #[arg(long, value_enum, default_value = "created")]
    pub sort: OrderFieldArg,

    /// Sort direction
    #[arg(long, value_enum, default_value = "desc")]
    pub order: OrderDirectionArg,
}

/// Arguments for the `update` command
#[derive(Parser, Debug, Clone)]
pub struct UpdateArgs {
    /// Vertex id
    #[arg(value_parser = validate_id)]
    pub id: String,

    /// New name
    #[arg(long, value_parser = validate_name)]
    pub name: Option<String>,

    /// New description
    #[arg(short = 'D', long)]
    pub description: Option<String>,

    /// New project
    #[arg(long)]
    pub project: Option<String>,

    /// New domain
    #[arg(long)]
    pub domain: Option<String>,

    /// New visibility
    #[arg(long, value_enum)]
    pub visibility: Option<VisibilityArg>,

    /// New access level
    #[arg(long, value_enum)]
    pub access: Option<AccessLevelArg>,

    /// New owning team
    #[arg(long, value_parser = validate_principal, conflicts_with = "clear_team")]
    pub team_id: Option<String>,

    /// Remove the owning team
    #[arg(long)]
    pub clear_team: bool,

    /// Replace tags (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub tags: Option<Vec<String>>,

    /// Replace keywords (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub keywords: Option<Vec<String>>,
}

/// Arguments for the `share` command
#[derive(Parser, Debug, Clone)]
pub struct ShareArgs {
    /// Vertex id
    #[arg(value_parser = validate_id)]
    pub id: String,

    /// Users to share with
    #[arg(required = true, value_parser = validate_principal)]
    pub users: Vec<String>,

    /// Visibility to set (default: shared)
    #[arg(long, value_enum)]
    pub visibility: Option<VisibilityArg>,
}

/// Arguments for the `delete` command
#[derive(Parser, Debug, Clone)]
pub struct DeleteArgs {
    /// Vertex id
    #[arg(value_parser = validate_id)]
    pub id: String,
}

/// Arguments for the `link` command
#[derive(Parser, Debug, Clone)]
pub struct LinkArgs {
    /// Source vertex id
    #[arg(value_parser = validate_id)]
    pub from: String,

    /// Target vertex id
    #[arg(value_parser = validate_id)]
    pub to: String,

    /// Edge type
    #[arg(short = 't', long = "type", value_enum, default_value = "calls")]
    pub edge_type: EdgeTypeArg,

    /// Edge visibility (default: the more restrictive endpoint's)
    #[arg(long, value_enum)]
    pub visibility: Option<VisibilityArg>,

    /// Metadata entries (key=value, repeatable)
    #[arg(short, long, value_parser = validate_metadata)]
    pub metadata: Vec<(String, String)>,
}

/// Arguments for the `edges` command
#[derive(Parser, Debug, Clone)]
pub struct EdgesArgs {
    /// Vertex id
    #[arg(value_parser = validate_id)]
    pub id: String,

    /// Show incoming instead of outgoing edges
    #[arg(short, long)]
    pub incoming: bool,

    /// Only edges of this type
    #[arg(short = 't', long = "type", value_enum)]
    pub edge_type: Option<EdgeTypeArg>,
}

/// Arguments for the `traverse` command
#[derive(Parser, Debug, Clone)]
pub struct TraverseArgs {
    /// Start vertex id
    #[arg(value_parser = validate_id)]
    pub id: String,

    /// Exact number of hops
    #[arg(short, long, default_value = "1")]
    pub depth: usize,

    /// Edge types to follow (repeatable; default: all)
    #[arg(short = 't', long = "type", value_enum)]
    pub edge_types: Vec<EdgeTypeArg>,
}

/// Arguments for the `deps` command
#[derive(Parser, Debug, Clone)]
pub struct DepsArgs {
    /// Root vertex id
    #[arg(value_parser = validate_id)]
    pub id: String,

    /// Walk direction
    #[arg(long, value_enum, default_value = "both")]
    pub direction: DirectionArg,

    /// Maximum hop level (default: from config)
    #[arg(short = 'd', long)]
    pub max_depth: Option<usize>,

    /// Only direct (level 1) dependencies
    #[arg(long)]
    pub direct_only: bool,

    /// Skip cycle detection
    #[arg(long)]
    pub no_cycles: bool,

    /// Edge types treated as dependencies (repeatable)
    #[arg(short = 't', long = "type", value_enum)]
    pub edge_types: Vec<EdgeTypeArg>,
}

/// Arguments for the `impact` command
#[derive(Parser, Debug, Clone)]
pub struct ImpactArgs {
    /// Vertex being changed
    #[arg(value_parser = validate_id)]
    pub id: String,

    /// Kind of change
    #[arg(short, long, value_enum, default_value = "modify")]
    pub change: ChangeTypeArg,

    /// Maximum hop level (default: from config)
    #[arg(short = 'd', long)]
    pub max_depth: Option<usize>,

    /// Edge types treated as dependencies (repeatable)
    #[arg(short = 't', long = "type", value_enum)]
    pub edge_types: Vec<EdgeTypeArg>,
}

/// Arguments for the `patterns` command
#[derive(Parser, Debug, Clone)]
pub struct PatternsArgs {
    /// Restrict to a project
    #[arg(long)]
    pub project: Option<String>,

    /// Restrict to a domain
    #[arg(long)]
    pub domain: Option<String>,

    /// Minimum confidence (0-1, default: from config)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Maximum number of patterns (default: from config)
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

/// Arguments for the `stats` command
#[derive(Parser, Debug, Clone, Default)]
pub struct StatsArgs {}
