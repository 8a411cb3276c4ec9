//! Command execution logic.
//!
//! Each handler maps its arguments onto exactly one library operation,
//! saves the snapshot after a mutation, and prints the result.

use anyhow::Result;
use std::collections::BTreeSet;

use super::args::{
    CreateArgs, DeleteArgs, DepsArgs, EdgesArgs, ImpactArgs, InitArgs, LinkArgs, ListArgs,
    PatternsArgs, ShareArgs, ShowArgs, StatsArgs, TraverseArgs, UpdateArgs,
};
use super::types::{VertexTypeArg, edge_types};
use crate::analysis::DependencyOptions;
use crate::app::App;
use crate::domain::{
    EdgeAttributes, Ordering, Pagination, VertexAttributes, VertexFilter, VertexId, VertexKind,
    VertexPatch, VertexType,
};
use crate::output::{self, OutputMode};
use crate::security::SecurityContext;

/// Execute the init command
pub async fn execute_init(args: &InitArgs) -> Result<()> {
    use crate::commands::init;

    let current_dir = std::env::current_dir()?;

    if !args.quiet {
        println!(
            "Initializing kgraph workspace{}...",
            args.prefix
                .as_ref()
                .map(|p| format!(" with prefix '{p}'"))
                .unwrap_or_default()
        );
    }

    let result = init::init(&current_dir, args.prefix.as_deref()).await?;

    if !args.quiet {
        println!("Initialized kgraph in {}", result.kgraph_dir.display());
        println!("  Config: {}", result.config_file.display());
        println!("  Graph:  {}", result.graph_file.display());
        println!("  Id prefix: {}", result.prefix);
    }

    Ok(())
}

/// Build the type-specific part of a new vertex.
fn vertex_kind(args: &CreateArgs) -> Result<VertexKind> {
    let kind = match args.vertex_type {
        VertexTypeArg::Function => VertexKind::Function {
            file_path: args.file_path.clone(),
            signature: args.signature.clone(),
            is_async: args.is_async,
            parameters: Vec::new(),
        },
        VertexTypeArg::Model => VertexKind::Model {
            file_path: args.file_path.clone(),
            fields: Vec::new(),
        },
        VertexTypeArg::Custom => VertexKind::Custom {
            type_name: args
                .custom_type
                .clone()
                .ok_or_else(|| anyhow::anyhow!("--custom-type is required for custom vertices"))?,
        },
        other => VertexKind::empty(VertexType::from(other))
            .ok_or_else(|| anyhow::anyhow!("Unsupported vertex type {other:?}"))?,
    };
    Ok(kind)
}

/// Execute the create command
pub async fn execute_create(
    app: &App,
    ctx: &SecurityContext,
    args: &CreateArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let mut attrs = VertexAttributes::new(vertex_kind(args)?, args.name.clone());
    attrs.description = args.description.clone().unwrap_or_default();
    attrs.project = args.project.clone().unwrap_or_default();
    attrs.domain = args.domain.clone().unwrap_or_default();
    attrs.team_id = args.team_id.clone();
    attrs.visibility = args.visibility.map(Into::into);
    attrs.access_level = args.access.map(Into::into);
    attrs.tags = args.tags.iter().cloned().collect();
    attrs.keywords = args.keywords.iter().cloned().collect();
    attrs.metadata = args.metadata.iter().cloned().collect();

    let vertex = app.vertices().create_vertex(ctx, attrs).await?;
    app.save().await?;

    match output_mode {
        OutputMode::Json => output::print_json(&vertex)?,
        OutputMode::Text => println!("Created vertex: {}", vertex.id),
    }

    Ok(())
}

/// Execute the show command
pub async fn execute_show(
    app: &App,
    ctx: &SecurityContext,
    args: &ShowArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let vertex = app.vertices().get(ctx, &VertexId::new(&args.id)).await?;
    output::print_vertex(&vertex, output_mode)?;
    Ok(())
}

/// Execute the list command
pub async fn execute_list(
    app: &App,
    ctx: &SecurityContext,
    args: &ListArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let filter = VertexFilter {
        vertex_types: args.vertex_types.iter().copied().map(Into::into).collect(),
        project: args.project.clone(),
        domain: args.domain.clone(),
        name: args.name.clone(),
        tag: args.tag.clone(),
        user_id: args.owner.clone(),
        team_id: args.team_id.clone(),
        visibility: args.visibility.map(Into::into),
    };
    let pagination = Pagination::new(args.offset, usize::from(args.limit));
    let ordering = Ordering {
        field: args.sort.into(),
        direction: args.order.into(),
    };

    let result = app
        .vertices()
        .query(ctx, &filter, pagination, ordering)
        .await?;
    output::print_vertices(&result, output_mode)?;
    Ok(())
}

/// Execute the update command
pub async fn execute_update(
    app: &App,
    ctx: &SecurityContext,
    args: &UpdateArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let team_id = if args.clear_team {
        Some(None)
    } else {
        args.team_id.clone().map(Some)
    };
    let patch = VertexPatch {
        name: args.name.clone(),
        description: args.description.clone(),
        project: args.project.clone(),
        domain: args.domain.clone(),
        team_id,
        visibility: args.visibility.map(Into::into),
        access_level: args.access.map(Into::into),
        tags: args
            .tags
            .as_ref()
            .map(|t| t.iter().cloned().collect::<BTreeSet<_>>()),
        keywords: args
            .keywords
            .as_ref()
            .map(|k| k.iter().cloned().collect::<BTreeSet<_>>()),
        ..VertexPatch::default()
    };

    if patch.is_empty() {
        anyhow::bail!("No updates specified. Use --help to see available options.");
    }

    let vertex = app
        .vertices()
        .update_vertex(ctx, &VertexId::new(&args.id), patch)
        .await?;
    app.save().await?;

    match output_mode {
        OutputMode::Json => output::print_json(&vertex)?,
        OutputMode::Text => println!("Updated vertex: {} (v{})", vertex.id, vertex.version),
    }

    Ok(())
}

/// Execute the share command
pub async fn execute_share(
    app: &App,
    ctx: &SecurityContext,
    args: &ShareArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let vertex = app
        .vertices()
        .share_vertex(
            ctx,
            &VertexId::new(&args.id),
            &args.users,
            args.visibility.map(Into::into),
        )
        .await?;
    app.save().await?;

    match output_mode {
        OutputMode::Json => output::print_json(&vertex)?,
        OutputMode::Text => println!(
            "Shared vertex {} with {} ({})",
            vertex.id,
            args.users.join(", "),
            vertex.visibility
        ),
    }

    Ok(())
}

/// Execute the delete command
pub async fn execute_delete(
    app: &App,
    ctx: &SecurityContext,
    args: &DeleteArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let id = VertexId::new(&args.id);
    app.vertices().delete_vertex(ctx, &id).await?;
    app.save().await?;

    match output_mode {
        OutputMode::Json => output::print_json(&serde_json::json!({
            "id": id,
            "deleted": true,
        }))?,
        OutputMode::Text => println!("Deleted vertex: {id}"),
    }

    Ok(())
}

/// Execute the link command
pub async fn execute_link(
    app: &App,
    ctx: &SecurityContext,
    args: &LinkArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let mut attrs = EdgeAttributes::new(args.edge_type.into());
    attrs.visibility = args.visibility.map(Into::into);
    attrs.metadata = args.metadata.iter().cloned().collect();

    let edge = app
        .edges()
        .create_edge(
            ctx,
            &VertexId::new(&args.from),
            &VertexId::new(&args.to),
            attrs,
        )
        .await?;
    app.save().await?;

    match output_mode {
        OutputMode::Json => output::print_json(&edge)?,
        OutputMode::Text => println!(
            "Created edge: {} ({} {} {})",
            edge.id, edge.from_vertex_id, edge.edge_type, edge.to_vertex_id
        ),
    }

    Ok(())
}

/// Execute the edges command
pub async fn execute_edges(
    app: &App,
    ctx: &SecurityContext,
    args: &EdgesArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let id = VertexId::new(&args.id);
    let edge_type = args.edge_type.map(Into::into);
    let edges = if args.incoming {
        app.edges().find_edges_to(ctx, &id, edge_type).await?
    } else {
        app.edges().find_edges_from(ctx, &id, edge_type).await?
    };
    output::print_edges(&edges, args.incoming, output_mode)?;
    Ok(())
}

/// Execute the traverse command
pub async fn execute_traverse(
    app: &App,
    ctx: &SecurityContext,
    args: &TraverseArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let paths = app
        .traversal()
        .traverse_graph(
            ctx,
            &VertexId::new(&args.id),
            args.depth,
            &edge_types(&args.edge_types),
        )
        .await?;
    output::print_paths(&paths, output_mode)?;
    Ok(())
}

/// Execute the deps command
pub async fn execute_deps(
    app: &App,
    ctx: &SecurityContext,
    args: &DepsArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let analysis_config = &app.config().analysis;
    let mut options = DependencyOptions {
        direction: args.direction.into(),
        max_depth: args.max_depth.unwrap_or(analysis_config.default_max_depth),
        include_indirect: !args.direct_only,
        detect_cycles: !args.no_cycles,
        path_limit: analysis_config.cycle_path_limit,
        ..DependencyOptions::default()
    };
    if !args.edge_types.is_empty() {
        options.edge_types = edge_types(&args.edge_types);
    }

    let analysis = app
        .dependencies()
        .analyze(ctx, &VertexId::new(&args.id), &options)
        .await?;
    output::print_dependencies(&analysis, output_mode)?;
    Ok(())
}

/// Execute the impact command
pub async fn execute_impact(
    app: &App,
    ctx: &SecurityContext,
    args: &ImpactArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let max_depth = args
        .max_depth
        .unwrap_or(app.config().analysis.default_max_depth);

    let analysis = app
        .impact()
        .analyze(
            ctx,
            &VertexId::new(&args.id),
            args.change.into(),
            max_depth,
            &edge_types(&args.edge_types),
        )
        .await?;
    output::print_impact(&analysis, output_mode)?;
    Ok(())
}

/// Execute the patterns command
pub async fn execute_patterns(
    app: &App,
    ctx: &SecurityContext,
    args: &PatternsArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let mut options = app.config().pattern_options();
    options.scope = VertexFilter::scoped(args.project.clone(), args.domain.clone());
    if let Some(threshold) = args.threshold {
        options.similarity_threshold = threshold;
    }
    if let Some(limit) = args.limit {
        options.limit = limit;
    }

    let report = app.patterns().detect(ctx, &options).await?;
    output::print_patterns(&report, output_mode)?;
    Ok(())
}

/// Execute the stats command
pub async fn execute_stats(
    app: &App,
    ctx: &SecurityContext,
    _args: &StatsArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let counts = app.vertices().type_counts(ctx).await?;
    output::print_stats(&counts, output_mode)?;
    Ok(())
}
