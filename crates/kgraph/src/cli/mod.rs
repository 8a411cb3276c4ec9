//! CLI argument parsing and command dispatch.
//!
//! Every graph command runs under a [`SecurityContext`] built from the
//! global `--tenant`, `--user`, `--team` and `--admin` flags, and calls
//! exactly one library operation. Mutating commands save the snapshot
//! afterwards.
//!
//! # Commands
//!
//! - `init`: Initialize a workspace
//! - `create`, `show`, `list`, `update`, `share`, `delete`: vertices
//! - `link`, `edges`: edges
//! - `traverse`: secured multi-hop walk
//! - `deps`, `impact`, `patterns`: analysis
//! - `stats`: visible vertex counts by type
//!
//! # Example
//!
//! ```bash
//! kgraph init
//! kgraph --tenant acme --user alice create parse_config --visibility org
//! kgraph --tenant acme --user alice link kg-aaa kg-bbb --type calls
//! kgraph --tenant acme --user bob --team core deps kg-aaa --direction forward
//! kgraph --json --tenant acme --user alice impact kg-bbb --change delete
//! ```

mod args;
mod execute;
mod types;
mod validators;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub use args::{
    CreateArgs, DeleteArgs, DepsArgs, EdgesArgs, ImpactArgs, InitArgs, LinkArgs, ListArgs,
    PatternsArgs, ShareArgs, ShowArgs, StatsArgs, TraverseArgs, UpdateArgs,
};
pub use types::{
    AccessLevelArg, ChangeTypeArg, DirectionArg, EdgeTypeArg, OrderDirectionArg, OrderFieldArg,
    VertexTypeArg, VisibilityArg,
};
pub use validators::{validate_id, validate_name, validate_prefix, validate_principal};

use crate::app::App;
use crate::output::OutputMode;
use crate::security::SecurityContext;

/// kgraph - a multi-tenant knowledge graph
///
/// Stores functions, models, systems and concepts as a property graph in
/// `.kgraph/graph.jsonl`, with per-vertex visibility and dependency
/// analysis.
#[derive(Parser, Debug)]
#[command(name = "kgraph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Tenant (organization) to act in
    #[arg(long, global = true, value_parser = validate_principal)]
    pub tenant: Option<String>,

    /// User to act as
    #[arg(long, global = true, value_parser = validate_principal)]
    pub user: Option<String>,

    /// Team membership (repeatable)
    #[arg(long = "team", global = true, value_parser = validate_principal)]
    pub teams: Vec<String>,

    /// Act as a tenant administrator
    #[arg(long, global = true)]
    pub admin: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize a kgraph workspace
    ///
    /// Creates `.kgraph/` with a default configuration and an empty graph.
    Init(InitArgs),

    /// Create a vertex
    ///
    /// Tenant, owner and timestamps come from --tenant and --user.
    Create(CreateArgs),

    /// Show a vertex
    Show(ShowArgs),

    /// List visible vertices with optional filters
    List(ListArgs),

    /// Update a vertex (requires write access)
    Update(UpdateArgs),

    /// Share a vertex with other users (requires write access)
    Share(ShareArgs),

    /// Delete a vertex and its edges (requires admin access)
    Delete(DeleteArgs),

    /// Create an edge between two visible vertices
    Link(LinkArgs),

    /// List the edges of a vertex
    Edges(EdgesArgs),

    /// Walk the graph from a vertex for an exact number of hops
    Traverse(TraverseArgs),

    /// Analyze forward, reverse and circular dependencies
    Deps(DepsArgs),

    /// Analyze the impact of changing a vertex
    Impact(ImpactArgs),

    /// Detect structural patterns
    Patterns(PatternsArgs),

    /// Show visible vertex counts by type
    Stats(StatsArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Build the security context from the global flags.
    ///
    /// # Errors
    ///
    /// Fails when `--tenant` or `--user` is missing.
    pub fn security_context(&self) -> Result<SecurityContext> {
        let (Some(tenant), Some(user)) = (&self.tenant, &self.user) else {
            anyhow::bail!("--tenant and --user are required for this command");
        };
        let mut ctx = SecurityContext::new(tenant.as_str(), user.as_str())?
            .with_teams(self.teams.iter().cloned());
        if self.admin {
            ctx = ctx.as_admin();
        }
        Ok(ctx)
    }

    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };

        let Some(command) = &self.command else {
            println!("kgraph - multi-tenant knowledge graph");
            println!();
            println!("Run 'kgraph --help' for usage information.");
            return Ok(());
        };

        if let Commands::Init(args) = command {
            return execute::execute_init(args).await;
        }

        let ctx = self.security_context()?;
        let app = App::from_directory(&std::env::current_dir()?).await?;

        match command {
            Commands::Init(_) => Ok(()),
            Commands::Create(args) => execute::execute_create(&app, &ctx, args, output_mode).await,
            Commands::Show(args) => execute::execute_show(&app, &ctx, args, output_mode).await,
            Commands::List(args) => execute::execute_list(&app, &ctx, args, output_mode).await,
            Commands::Update(args) => execute::execute_update(&app, &ctx, args, output_mode).await,
            Commands::Share(args) => execute::execute_share(&app, &ctx, args, output_mode).await,
            Commands::Delete(args) => execute::execute_delete(&app, &ctx, args, output_mode).await,
            Commands::Link(args) => execute::execute_link(&app, &ctx, args, output_mode).await,
            Commands::Edges(args) => execute::execute_edges(&app, &ctx, args, output_mode).await,
            Commands::Traverse(args) => {
                execute::execute_traverse(&app, &ctx, args, output_mode).await
            }
            Commands::Deps(args) => execute::execute_deps(&app, &ctx, args, output_mode).await,
            Commands::Impact(args) => execute::execute_impact(&app, &ctx, args, output_mode).await,
            Commands::Patterns(args) => {
                execute::execute_patterns(&app, &ctx, args, output_mode).await
            }
            Commands::Stats(args) => execute::execute_stats(&app, &ctx, args, output_mode).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_identity_flags() {
        let cli = Cli::try_parse_from([
            "kgraph", "--tenant", "acme", "--user", "alice", "--team", "core", "--team", "infra",
            "show", "kg-1",
        ])
        .unwrap();

        let ctx = cli.security_context().unwrap();
        assert_eq!(ctx.tenant_id(), "acme");
        assert_eq!(ctx.user_id(), "alice");
        assert!(ctx.is_member_of("core"));
        assert!(ctx.is_member_of("infra"));
        assert!(!ctx.is_admin());
    }

    #[test]
    fn test_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["kgraph", "stats", "--tenant", "acme", "--user", "bob", "--admin"])
                .unwrap();
        assert!(cli.security_context().unwrap().is_admin());
    }

    #[test]
    fn test_missing_identity_is_rejected() {
        let cli = Cli::try_parse_from(["kgraph", "show", "kg-1"]).unwrap();
        let err = cli.security_context().unwrap_err();
        assert!(err.to_string().contains("--tenant and --user"));
    }

    #[test]
    fn test_create_custom_requires_type_name() {
        let result = Cli::try_parse_from(["kgraph", "create", "thing", "--type", "custom"]);
        assert!(result.is_err());

        let cli = Cli::try_parse_from([
            "kgraph", "create", "thing", "--type", "custom", "--custom-type", "Runbook",
        ])
        .unwrap();
        let Some(Commands::Create(args)) = cli.command else {
            panic!("expected create");
        };
        assert_eq!(args.custom_type.as_deref(), Some("Runbook"));
    }

    #[test]
    fn test_link_defaults_to_calls() {
        let cli = Cli::try_parse_from(["kgraph", "link", "kg-a", "kg-b"]).unwrap();
        let Some(Commands::Link(args)) = cli.command else {
            panic!("expected link");
        };
        assert_eq!(args.edge_type, EdgeTypeArg::Calls);
    }

    #[test]
    fn test_share_requires_users() {
        assert!(Cli::try_parse_from(["kgraph", "share", "kg-a"]).is_err());
    }

    #[test]
    fn test_list_limit_range() {
        assert!(Cli::try_parse_from(["kgraph", "list", "-n", "0"]).is_err());
        assert!(Cli::try_parse_from(["kgraph", "list", "-n", "1001"]).is_err());
        assert!(Cli::try_parse_from(["kgraph", "list", "-n", "1000"]).is_ok());
    }
}
