//! Model metadata and the resolvers the search front end depends on.
//!
//! Associations and attributes are handed out as `Arc`-backed references. Two
//! references are equal when they point at the same metadata entry, which is
//! what the visitors use for set membership.

use crate::config::{ConfigError, SchemaConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use thiserror::Error;

/// The value type of a scalar column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    Boolean,
    Date,
    Integer,
    String,
    SetInteger,
    SetString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    BelongsTo,
    HasOne,
    #[default]
    HasMany,
}

/// A named relationship from one model to another
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    /// Model the association is declared on
    pub model: String,
    pub name: String,
    /// `None` for polymorphic associations
    pub target: Option<String>,
    pub kind: AssociationKind,
}

impl Association {
    pub fn new(model: &str, name: &str, target: &str, kind: AssociationKind) -> Self {
        Self {
            model: model.to_string(),
            name: name.to_string(),
            target: Some(target.to_string()),
            kind,
        }
    }

    pub fn polymorphic(model: &str, name: &str, kind: AssociationKind) -> Self {
        Self {
            model: model.to_string(),
            name: name.to_string(),
            target: None,
            kind,
        }
    }

    /// Polymorphic associations have no single table to join against.
    pub fn is_joinable(&self) -> bool {
        self.target.is_some()
    }
}

/// A scalar column on a model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub model: String,
    pub name: String,
    pub ty: AttributeType,
}

impl Attribute {
    pub fn new(model: &str, name: &str, ty: AttributeType) -> Self {
        Self {
            model: model.to_string(),
            name: name.to_string(),
            ty,
        }
    }
}

macro_rules! identity_ref {
    ($name:ident, $inner:ty) => {
        /// Shared handle compared by identity of the metadata it points at.
        #[derive(Debug, Clone)]
        pub struct $name(Arc<$inner>);

        impl $name {
            pub fn new(inner: $inner) -> Self {
                Self(Arc::new(inner))
            }
        }

        impl From<$inner> for $name {
            fn from(inner: $inner) -> Self {
                Self::new(inner)
            }
        }

        impl std::ops::Deref for $name {
            type Target = $inner;

            fn deref(&self) -> &$inner {
                &self.0
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.0, &other.0)
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                std::ptr::hash(Arc::as_ptr(&self.0), state);
            }
        }
    };
}

identity_ref!(AssociationRef, Association);
identity_ref!(AttributeRef, Attribute);

impl fmt::Display for AssociationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Display for AttributeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("unknown model '{model}'")]
    UnknownModel { model: String },

    #[error("model '{model}' has no association '{name}'")]
    UnknownAssociation { model: String, name: String },

    #[error("association '{model}.{name}' is polymorphic and cannot be joined")]
    NotJoinable { model: String, name: String },

    #[error("model '{model}' has no search operator '{name}'")]
    UnknownOperator { model: String, name: String },
}

/// Resolves association names on a model to joinable association metadata.
pub trait AssociationResolver {
    fn resolve_association(&self, model: &str, name: &str) -> Result<AssociationRef, ResolveError>;

    fn is_joinable(&self, model: &str, name: &str) -> bool {
        self.resolve_association(model, name).is_ok()
    }
}

/// What a plain (non-dotted) operator name resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum OperatorTarget {
    Attribute(AttributeRef),
    /// An operator that matches if any of its attributes match
    Union(Vec<AttributeRef>),
}

pub trait AttributeResolver {
    fn resolve_operator(&self, model: &str, name: &str) -> Result<OperatorTarget, ResolveError>;
}

#[derive(Debug, Clone, Default)]
struct ModelMeta {
    attributes: HashMap<String, AttributeRef>,
    associations: HashMap<String, AssociationRef>,
    union_operators: HashMap<String, Vec<AttributeRef>>,
}

/// In-memory schema built from a [`SchemaConfig`].
#[derive(Debug, Clone, Default)]
pub struct Schema {
    models: HashMap<String, ModelMeta>,
}

impl Schema {
    pub fn from_config(config: &SchemaConfig) -> Result<Self, ConfigError> {
        let mut models = HashMap::new();

        for (model_name, model) in &config.models {
            let mut meta = ModelMeta::default();

            for (name, ty) in &model.attributes {
                let attribute = Attribute::new(model_name, name, *ty);
                meta.attributes.insert(name.clone(), attribute.into());
            }

            for (name, assoc) in &model.associations {
                let association = match &assoc.target {
                    _ if assoc.polymorphic => Association::polymorphic(model_name, name, assoc.kind),
                    Some(target) => {
                        if !config.models.contains_key(target) {
                            return Err(ConfigError::UnknownTarget {
                                model: model_name.clone(),
                                association: name.clone(),
                                target: target.clone(),
                            });
                        }
                        Association::new(model_name, name, target, assoc.kind)
                    }
                    None => {
                        return Err(ConfigError::MissingTarget {
                            model: model_name.clone(),
                            association: name.clone(),
                        });
                    }
                };
                meta.associations.insert(name.clone(), association.into());
            }

            for (operator, members) in &model.union_operators {
                let mut attributes = Vec::with_capacity(members.len());
                for member in members {
                    let attribute = meta.attributes.get(member).cloned().ok_or_else(|| {
                        ConfigError::UnknownUnionMember {
                            model: model_name.clone(),
                            operator: operator.clone(),
                            attribute: member.clone(),
                        }
                    })?;
                    attributes.push(attribute);
                }
                meta.union_operators.insert(operator.clone(), attributes);
            }

            models.insert(model_name.clone(), meta);
        }

        Ok(Self { models })
    }

    pub fn has_model(&self, model: &str) -> bool {
        self.models.contains_key(model)
    }

    /// Model names in sorted order
    pub fn model_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.models.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn model(&self, model: &str) -> Result<&ModelMeta, ResolveError> {
        self.models.get(model).ok_or_else(|| ResolveError::UnknownModel {
            model: model.to_string(),
        })
    }
}

impl AssociationResolver for Schema {
    fn resolve_association(&self, model: &str, name: &str) -> Result<AssociationRef, ResolveError> {
        let association = self
            .model(model)?
            .associations
            .get(name)
            .ok_or_else(|| ResolveError::UnknownAssociation {
                model: model.to_string(),
                name: name.to_string(),
            })?;

        if !association.is_joinable() {
            return Err(ResolveError::NotJoinable {
                model: model.to_string(),
                name: name.to_string(),
            });
        }

        Ok(association.clone())
    }
}

impl AttributeResolver for Schema {
    fn resolve_operator(&self, model: &str, name: &str) -> Result<OperatorTarget, ResolveError> {
        let meta = self.model(model)?;

        if let Some(attribute) = meta.attributes.get(name) {
            return Ok(OperatorTarget::Attribute(attribute.clone()));
        }
        if let Some(members) = meta.union_operators.get(name) {
            return Ok(OperatorTarget::Union(members.clone()));
        }

        Err(ResolveError::UnknownOperator {
            model: model.to_string(),
            name: name.to_string(),
        })
    }
}
