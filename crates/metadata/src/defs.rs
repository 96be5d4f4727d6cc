// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource definitions as clients submit them.

use plume_core::{NameVariant, ResourceId, ResourceKind, ValueType};
use plume_provider::{ResourceColumns, SerializedConfig};
use serde::{Deserialize, Serialize};

/// A registered user. Owner fields on other definitions reference it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDef {
    pub name: String,
}

/// A configured provider registration. The type tag is kept as the raw
/// string so external driver types can be registered without an in-tree
/// driver; it is parsed when a job actually needs the driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub provider_type: String,
    #[serde(default)]
    pub software: String,
    #[serde(default)]
    pub team: String,
    pub config: SerializedConfig,
}

/// Reference to a table in an external warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlTable {
    pub name: String,
}

/// What a source is: a registration of an existing table, or a SQL
/// transformation over other sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceDefinition {
    PrimaryData { location: SqlTable },
    SqlTransformation { query: String, sources: Vec<NameVariant> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDef {
    pub name: String,
    #[serde(default)]
    pub variant: String,
    #[serde(default)]
    pub description: String,
    pub owner: String,
    pub provider: String,
    pub definition: SourceDefinition,
    #[serde(default)]
    pub schedule: String,
}

impl SourceDef {
    pub fn id(&self) -> ResourceId {
        ResourceId::new(self.name.clone(), self.variant.clone(), ResourceKind::Source)
    }

    /// Direct dependencies: the sources a transformation reads.
    pub fn dependencies(&self) -> &[NameVariant] {
        match &self.definition {
            SourceDefinition::PrimaryData { .. } => &[],
            SourceDefinition::SqlTransformation { sources, .. } => sources,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDef {
    pub name: String,
    #[serde(default)]
    pub variant: String,
    #[serde(default)]
    pub description: String,
    pub source: NameVariant,
    pub value_type: ValueType,
    pub entity: String,
    pub owner: String,
    pub provider: String,
    pub columns: ResourceColumns,
    #[serde(default)]
    pub schedule: String,
}

impl FeatureDef {
    pub fn id(&self) -> ResourceId {
        ResourceId::new(self.name.clone(), self.variant.clone(), ResourceKind::Feature)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelDef {
    pub name: String,
    #[serde(default)]
    pub variant: String,
    #[serde(default)]
    pub description: String,
    pub source: NameVariant,
    pub value_type: ValueType,
    pub entity: String,
    pub owner: String,
    pub provider: String,
    pub columns: ResourceColumns,
}

impl LabelDef {
    pub fn id(&self) -> ResourceId {
        ResourceId::new(self.name.clone(), self.variant.clone(), ResourceKind::Label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSetDef {
    pub name: String,
    #[serde(default)]
    pub variant: String,
    #[serde(default)]
    pub description: String,
    pub owner: String,
    pub provider: String,
    pub label: NameVariant,
    pub features: Vec<NameVariant>,
    #[serde(default)]
    pub schedule: String,
}

impl TrainingSetDef {
    pub fn id(&self) -> ResourceId {
        ResourceId::new(self.name.clone(), self.variant.clone(), ResourceKind::TrainingSet)
    }
}

/// Any definition accepted by `create_all`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceDef {
    User(UserDef),
    Provider(ProviderDef),
    Source(SourceDef),
    Feature(FeatureDef),
    Label(LabelDef),
    TrainingSet(TrainingSetDef),
}

impl ResourceDef {
    /// Resource identity, for kinds tracked in the resource key space.
    pub fn id(&self) -> Option<ResourceId> {
        match self {
            ResourceDef::User(_) | ResourceDef::Provider(_) => None,
            ResourceDef::Source(d) => Some(d.id()),
            ResourceDef::Feature(d) => Some(d.id()),
            ResourceDef::Label(d) => Some(d.id()),
            ResourceDef::TrainingSet(d) => Some(d.id()),
        }
    }

    /// Whether creating this resource enqueues coordinator work.
    pub fn needs_job(&self) -> bool {
        matches!(
            self,
            ResourceDef::Source(_) | ResourceDef::Feature(_) | ResourceDef::TrainingSet(_)
        )
    }

    /// The schedule carried by the definition, if any.
    pub fn schedule(&self) -> &str {
        match self {
            ResourceDef::Source(d) => &d.schedule,
            ResourceDef::Feature(d) => &d.schedule,
            ResourceDef::TrainingSet(d) => &d.schedule,
            _ => "",
        }
    }
}
