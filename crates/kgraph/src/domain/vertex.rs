//! Vertex types: the stored [`Vertex`], its type-specific [`VertexKind`],
//! and the untrusted input types used to create and patch it.

use super::{keys, AccessLevel, PropertyValue, VertexId, Visibility};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Maximum length for vertex names.
pub const MAX_NAME_LENGTH: usize = 200;

/// Maximum number of entries in a tag or keyword set.
pub const MAX_TAGS: usize = 100;

/// A function or method parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,

    /// Declared type, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}

/// Type-specific vertex attributes, discriminated by vertex type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VertexKind {
    /// A function or method.
    Function {
        /// Source file containing the function.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_path: Option<String>,
        /// Rendered signature.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        signature: Option<String>,
        /// Whether the function is async.
        #[serde(default)]
        is_async: bool,
        /// Declared parameters, in order.
        #[serde(default)]
        parameters: Vec<Parameter>,
    },
    /// A data model, struct or class.
    Model {
        /// Source file containing the model.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_path: Option<String>,
        /// Field names.
        #[serde(default)]
        fields: Vec<String>,
    },
    /// A system or service boundary.
    System {
        /// Names of the components making up the system.
        #[serde(default)]
        components: Vec<String>,
    },
    /// A design or architectural pattern.
    Pattern {
        /// Pattern category (creational, structural, ...).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<String>,
    },
    /// A domain concept.
    Concept {
        /// Definition of the concept.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        definition: Option<String>,
    },
    /// Any other kind of knowledge entity.
    Custom {
        /// Caller-defined type name.
        type_name: String,
    },
}

impl VertexKind {
    /// A function kind with no details filled in.
    pub fn function() -> Self {
        VertexKind::Function {
            file_path: None,
            signature: None,
            is_async: false,
            parameters: Vec::new(),
        }
    }

    /// The discriminant of this kind.
    pub fn vertex_type(&self) -> VertexType {
        match self {
            VertexKind::Function { .. } => VertexType::Function,
            VertexKind::Model { .. } => VertexType::Model,
            VertexKind::System { .. } => VertexType::System,
            VertexKind::Pattern { .. } => VertexType::Pattern,
            VertexKind::Concept { .. } => VertexType::Concept,
            VertexKind::Custom { .. } => VertexType::Custom,
        }
    }

    /// A default-valued kind for a discriminant.
    ///
    /// `Custom` requires a type name, so it is not constructible here.
    pub fn empty(vertex_type: VertexType) -> Option<Self> {
        Some(match vertex_type {
            VertexType::Function => Self::function(),
            VertexType::Model => VertexKind::Model {
                file_path: None,
                fields: Vec::new(),
            },
            VertexType::System => VertexKind::System {
                components: Vec::new(),
            },
            VertexType::Pattern => VertexKind::Pattern { category: None },
            VertexType::Concept => VertexKind::Concept { definition: None },
            VertexType::Custom => return None,
        })
    }

    fn validate(&self) -> Result<()> {
        if let VertexKind::Custom { type_name } = self {
            if type_name.trim().is_empty() {
                return Err(Error::validation(
                    "type",
                    "custom vertices require a non-empty type name",
                ));
            }
        }
        Ok(())
    }

    fn property(&self, key: &str) -> Option<PropertyValue> {
        match (self, key) {
            (
                VertexKind::Function { file_path, .. } | VertexKind::Model { file_path, .. },
                keys::FILE_PATH,
            ) => file_path.clone().map(PropertyValue::Text),
            (VertexKind::Function { signature, .. }, keys::SIGNATURE) => {
                signature.clone().map(PropertyValue::Text)
            }
            (VertexKind::Function { is_async, .. }, keys::IS_ASYNC) => {
                Some(PropertyValue::Bool(*is_async))
            }
            (VertexKind::Custom { type_name }, keys::CUSTOM_TYPE) => {
                Some(PropertyValue::text(type_name.clone()))
            }
            _ => None,
        }
    }
}

/// Vertex type discriminant, used as the vertex label in the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VertexType {
    /// See [`VertexKind::Function`].
    Function,
    /// See [`VertexKind::Model`].
    Model,
    /// See [`VertexKind::System`].
    System,
    /// See [`VertexKind::Pattern`].
    Pattern,
    /// See [`VertexKind::Concept`].
    Concept,
    /// See [`VertexKind::Custom`].
    Custom,
}

impl VertexType {
    /// Label string used by the engine.
    pub fn as_str(self) -> &'static str {
        match self {
            VertexType::Function => "Function",
            VertexType::Model => "Model",
            VertexType::System => "System",
            VertexType::Pattern => "Pattern",
            VertexType::Concept => "Concept",
            VertexType::Custom => "Custom",
        }
    }
}

impl fmt::Display for VertexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VertexType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "function" => Ok(VertexType::Function),
            "model" => Ok(VertexType::Model),
            "system" => Ok(VertexType::System),
            "pattern" => Ok(VertexType::Pattern),
            "concept" => Ok(VertexType::Concept),
            "custom" => Ok(VertexType::Custom),
            other => Err(format!("unknown vertex type '{other}'")),
        }
    }
}

/// A knowledge entity stored in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vertex {
    /// Unique identifier.
    pub id: VertexId,

    /// Type discriminant and type-specific attributes.
    pub kind: VertexKind,

    /// Human-readable name.
    pub name: String,

    /// Free-text description.
    #[serde(default)]
    pub description: String,

    /// Project the vertex belongs to.
    #[serde(default)]
    pub project: String,

    /// Domain the vertex belongs to.
    #[serde(default)]
    pub domain: String,

    /// Owning organization. Immutable after creation.
    pub tenant_id: String,

    /// Creator.
    pub user_id: String,

    /// Owning team, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,

    /// Visibility tier.
    pub visibility: Visibility,

    /// Access level granted to readers of this vertex.
    pub access_level: AccessLevel,

    /// Users explicitly granted access.
    #[serde(default)]
    pub shared_with: BTreeSet<String>,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,

    /// User that created the vertex.
    pub created_by: String,

    /// User that last updated the vertex.
    pub updated_by: String,

    /// Incremented on every update.
    pub version: u32,

    /// Schema version the vertex was written with.
    pub schema_version: u32,

    /// Tags.
    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// Search keywords.
    #[serde(default)]
    pub keywords: BTreeSet<String>,

    /// Free-form metadata.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Vertex {
    /// The vertex type discriminant.
    pub fn vertex_type(&self) -> VertexType {
        self.kind.vertex_type()
    }

    /// Look up a property by its engine key.
    ///
    /// Returns `None` for unset optional properties and unknown keys.
    pub fn property(&self, key: &str) -> Option<PropertyValue> {
        let value = match key {
            keys::ID => PropertyValue::text(self.id.as_str()),
            keys::LABEL => PropertyValue::from(self.vertex_type().as_str()),
            keys::NAME => PropertyValue::text(self.name.clone()),
            keys::DESCRIPTION => PropertyValue::text(self.description.clone()),
            keys::PROJECT => PropertyValue::text(self.project.clone()),
            keys::DOMAIN => PropertyValue::text(self.domain.clone()),
            keys::TENANT_ID => PropertyValue::text(self.tenant_id.clone()),
            keys::USER_ID => PropertyValue::text(self.user_id.clone()),
            keys::TEAM_ID => return self.team_id.clone().map(PropertyValue::Text),
            keys::VISIBILITY => self.visibility.into(),
            keys::ACCESS_LEVEL => self.access_level.into(),
            keys::SHARED_WITH => PropertyValue::Set(self.shared_with.clone()),
            keys::CREATED_AT => PropertyValue::Timestamp(self.created_at),
            keys::UPDATED_AT => PropertyValue::Timestamp(self.updated_at),
            keys::CREATED_BY => PropertyValue::text(self.created_by.clone()),
            keys::UPDATED_BY => PropertyValue::text(self.updated_by.clone()),
            keys::VERSION => PropertyValue::Number(i64::from(self.version)),
            keys::SCHEMA_VERSION => PropertyValue::Number(i64::from(self.schema_version)),
            keys::TAGS => PropertyValue::Set(self.tags.clone()),
            keys::KEYWORDS => PropertyValue::Set(self.keywords.clone()),
            other => {
                if let Some(meta_key) = other.strip_prefix(keys::METADATA_PREFIX) {
                    return self.metadata.get(meta_key).cloned().map(PropertyValue::Text);
                }
                return self.kind.property(other);
            }
        };
        Some(value)
    }

    /// Apply a validated patch in place.
    ///
    /// Collections are replaced wholesale, never merged. Bookkeeping fields
    /// are left to the caller.
    pub fn apply_patch(&mut self, patch: VertexPatch) {
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(project) = patch.project {
            self.project = project;
        }
        if let Some(domain) = patch.domain {
            self.domain = domain;
        }
        if let Some(team_id) = patch.team_id {
            self.team_id = team_id;
        }
        if let Some(visibility) = patch.visibility {
            self.visibility = visibility;
        }
        if let Some(access_level) = patch.access_level {
            self.access_level = access_level;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(keywords) = patch.keywords {
            self.keywords = keywords;
        }
        if let Some(metadata) = patch.metadata {
            self.metadata = metadata;
        }
    }
}

/// Untrusted caller input for creating a vertex.
///
/// Has no tenant, owner, timestamp or version fields; those are stamped
/// from the security context when the vertex is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexAttributes {
    /// Type discriminant and type-specific attributes.
    pub kind: VertexKind,

    /// Human-readable name.
    pub name: String,

    /// Free-text description.
    #[serde(default)]
    pub description: String,

    /// Project.
    #[serde(default)]
    pub project: String,

    /// Domain.
    #[serde(default)]
    pub domain: String,

    /// Owning team.
    #[serde(default)]
    pub team_id: Option<String>,

    /// Visibility; defaults to private.
    #[serde(default)]
    pub visibility: Option<Visibility>,

    /// Access level; defaults to write.
    #[serde(default)]
    pub access_level: Option<AccessLevel>,

    /// Users to share with at creation time.
    #[serde(default)]
    pub shared_with: BTreeSet<String>,

    /// Tags.
    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// Keywords.
    #[serde(default)]
    pub keywords: BTreeSet<String>,

    /// Free-form metadata.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl VertexAttributes {
    /// Minimal attributes for a vertex of the given kind.
    pub fn new(kind: VertexKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            description: String::new(),
            project: String::new(),
            domain: String::new(),
            team_id: None,
            visibility: None,
            access_level: None,
            shared_with: BTreeSet::new(),
            tags: BTreeSet::new(),
            keywords: BTreeSet::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Builder-style visibility setter.
    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// Builder-style team setter.
    #[must_use]
    pub fn with_team(mut self, team_id: impl Into<String>) -> Self {
        self.team_id = Some(team_id.into());
        self
    }

    /// Builder-style access level setter.
    #[must_use]
    pub fn with_access_level(mut self, access_level: AccessLevel) -> Self {
        self.access_level = Some(access_level);
        self
    }

    /// Builder-style project/domain setter.
    #[must_use]
    pub fn in_scope(mut self, project: impl Into<String>, domain: impl Into<String>) -> Self {
        self.project = project.into();
        self.domain = domain.into();
        self
    }

    /// Check structural validity.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for an empty or over-long name, an
    /// unnamed custom type, or oversized tag/keyword sets.
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        self.kind.validate()?;
        validate_set("tags", &self.tags)?;
        validate_set("keywords", &self.keywords)?;
        Ok(())
    }
}

/// Untrusted caller input for updating a vertex.
///
/// `None` leaves a field unchanged. Set-valued fields replace the stored
/// set wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexPatch {
    /// New kind (type-specific attributes).
    #[serde(default)]
    pub kind: Option<VertexKind>,

    /// New name.
    #[serde(default)]
    pub name: Option<String>,

    /// New description.
    #[serde(default)]
    pub description: Option<String>,

    /// New project.
    #[serde(default)]
    pub project: Option<String>,

    /// New domain.
    #[serde(default)]
    pub domain: Option<String>,

    /// New team (`Some(None)` clears it).
    #[serde(default)]
    pub team_id: Option<Option<String>>,

    /// New visibility.
    #[serde(default)]
    pub visibility: Option<Visibility>,

    /// New access level.
    #[serde(default)]
    pub access_level: Option<AccessLevel>,

    /// Replacement tag set.
    #[serde(default)]
    pub tags: Option<BTreeSet<String>>,

    /// Replacement keyword set.
    #[serde(default)]
    pub keywords: Option<BTreeSet<String>>,

    /// Replacement metadata.
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, String>>,
}

impl VertexPatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == VertexPatch::default()
    }

    /// Check structural validity of the fields being set.
    ///
    /// # Errors
    ///
    /// Same rules as [`VertexAttributes::validate`].
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(kind) = &self.kind {
            kind.validate()?;
        }
        if let Some(tags) = &self.tags {
            validate_set("tags", tags)?;
        }
        if let Some(keywords) = &self.keywords {
            validate_set("keywords", keywords)?;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("name", "must not be empty"));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(Error::validation(
            "name",
            format!("must be at most {MAX_NAME_LENGTH} characters"),
        ));
    }
    Ok(())
}

fn validate_set(field: &'static str, values: &BTreeSet<String>) -> Result<()> {
    if values.len() > MAX_TAGS {
        return Err(Error::validation(
            field,
            format!("at most {MAX_TAGS} entries allowed, got {}", values.len()),
        ));
    }
    if values.iter().any(|v| v.trim().is_empty()) {
        return Err(Error::validation(field, "entries must not be empty"));
    }
    Ok(())
}
