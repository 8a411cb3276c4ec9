//! CLI value enums and their conversions to domain types.

use clap::ValueEnum;

use crate::analysis::{ChangeType, DependencyDirection};
use crate::domain::{AccessLevel, EdgeType, OrderDirection, OrderField, VertexType, Visibility};

/// Vertex type for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexTypeArg {
    /// Function or method
    Function,
    /// Data model, struct or class
    Model,
    /// System or service
    System,
    /// Design pattern
    Pattern,
    /// Domain concept
    Concept,
    /// Anything else (requires --custom-type)
    Custom,
}

impl From<VertexTypeArg> for VertexType {
    fn from(arg: VertexTypeArg) -> Self {
        match arg {
            VertexTypeArg::Function => VertexType::Function,
            VertexTypeArg::Model => VertexType::Model,
            VertexTypeArg::System => VertexType::System,
            VertexTypeArg::Pattern => VertexType::Pattern,
            VertexTypeArg::Concept => VertexType::Concept,
            VertexTypeArg::Custom => VertexType::Custom,
        }
    }
}

/// Visibility for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityArg {
    /// Owner only
    Private,
    /// Owning team
    Team,
    /// Whole tenant
    #[value(alias = "org")]
    Organization,
    /// Explicitly shared users
    Shared,
}

impl From<VisibilityArg> for Visibility {
    fn from(arg: VisibilityArg) -> Self {
        match arg {
            VisibilityArg::Private => Visibility::Private,
            VisibilityArg::Team => Visibility::Team,
            VisibilityArg::Organization => Visibility::Organization,
            VisibilityArg::Shared => Visibility::Shared,
        }
    }
}

/// Access level for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevelArg {
    /// Read only
    Read,
    /// Read and modify
    Write,
    /// Read, modify and delete
    Admin,
}

impl From<AccessLevelArg> for AccessLevel {
    fn from(arg: AccessLevelArg) -> Self {
        match arg {
            AccessLevelArg::Read => AccessLevel::Read,
            AccessLevelArg::Write => AccessLevel::Write,
            AccessLevelArg::Admin => AccessLevel::Admin,
        }
    }
}

/// Edge type for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeTypeArg {
    /// Caller invokes callee
    Calls,
    /// Source uses target
    Uses,
    /// Source implements target
    Implements,
    /// Generic dependency
    #[value(name = "depends-on", alias = "depends_on")]
    DependsOn,
    /// Membership
    #[value(name = "belongs-to", alias = "belongs_to")]
    BelongsTo,
    /// Inheritance
    Extends,
    /// Mention
    References,
    /// Containment
    Contains,
}

impl From<EdgeTypeArg> for EdgeType {
    fn from(arg: EdgeTypeArg) -> Self {
        match arg {
            EdgeTypeArg::Calls => EdgeType::Calls,
            EdgeTypeArg::Uses => EdgeType::Uses,
            EdgeTypeArg::Implements => EdgeType::Implements,
            EdgeTypeArg::DependsOn => EdgeType::DependsOn,
            EdgeTypeArg::BelongsTo => EdgeType::BelongsTo,
            EdgeTypeArg::Extends => EdgeType::Extends,
            EdgeTypeArg::References => EdgeType::References,
            EdgeTypeArg::Contains => EdgeType::Contains,
        }
    }
}

/// Convert a list of CLI edge types.
pub fn edge_types(args: &[EdgeTypeArg]) -> Vec<EdgeType> {
    args.iter().copied().map(EdgeType::from).collect()
}

/// Dependency walk direction for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionArg {
    /// What the vertex depends on
    Forward,
    /// What depends on the vertex
    Reverse,
    /// Both
    Both,
}

impl From<DirectionArg> for DependencyDirection {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Forward => DependencyDirection::Forward,
            DirectionArg::Reverse => DependencyDirection::Reverse,
            DirectionArg::Both => DependencyDirection::Both,
        }
    }
}

/// Proposed change for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeTypeArg {
    /// Behaviour or interface change
    Modify,
    /// Removal
    Delete,
    /// Deprecation
    Deprecate,
}

impl From<ChangeTypeArg> for ChangeType {
    fn from(arg: ChangeTypeArg) -> Self {
        match arg {
            ChangeTypeArg::Modify => ChangeType::Modify,
            ChangeTypeArg::Delete => ChangeType::Delete,
            ChangeTypeArg::Deprecate => ChangeType::Deprecate,
        }
    }
}

/// Sort field for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderFieldArg {
    /// Name
    Name,
    /// Creation time
    Created,
    /// Last update time
    Updated,
}

impl From<OrderFieldArg> for OrderField {
    fn from(arg: OrderFieldArg) -> Self {
        match arg {
            OrderFieldArg::Name => OrderField::Name,
            OrderFieldArg::Created => OrderField::CreatedAt,
            OrderFieldArg::Updated => OrderField::UpdatedAt,
        }
    }
}

/// Sort direction for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirectionArg {
    /// Ascending
    Asc,
    /// Descending
    Desc,
}

impl From<OrderDirectionArg> for OrderDirection {
    fn from(arg: OrderDirectionArg) -> Self {
        match arg {
            OrderDirectionArg::Asc => OrderDirection::Asc,
            OrderDirectionArg::Desc => OrderDirection::Desc,
        }
    }
}
