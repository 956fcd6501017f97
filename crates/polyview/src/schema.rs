use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// A snapshot of the generator's parameter definitions as served by
/// `GET /schema`. Replaced wholesale on every fetch, never patched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Root parameter group. Each entry of its `parameters` list is either a
    /// leaf or a nested group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<ParameterSchema>,

    #[serde(rename = "subGenerators", default)]
    pub sub_generators: IndexMap<String, Schema>,

    #[serde(default)]
    pub producers: Producers,

    #[serde(default)]
    pub nodes: IndexMap<String, NodeSchema>,
}

impl Schema {
    pub fn producer_names(&self) -> Vec<&str> {
        self.producers.names()
    }

    /// The producer file a node writes, if any. Keyed producers name their
    /// node; listed ones match by node name.
    pub fn producer_name(&self, node_id: &str, node_name: &str) -> Option<&str> {
        match &self.producers {
            Producers::Named(names) => names
                .iter()
                .find(|n| *n == node_name)
                .map(String::as_str),
            Producers::Keyed(map) => map
                .iter()
                .find(|(name, p)| p.node_id == node_id || *name == node_name)
                .map(|(name, _)| name.as_str()),
        }
    }

    pub fn is_producer(&self, node_id: &str, node_name: &str) -> bool {
        self.producer_name(node_id, node_name).is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    #[serde(default)]
    pub name: String,

    /// Declared type tag, either a short tag (`float`, `group`, ...) or the
    /// generator's Go type name (`vector3.Vector[float64]`, ...).
    #[serde(rename = "type", default)]
    pub type_tag: String,

    #[serde(rename = "currentValue", default)]
    pub current_value: Value,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterSchema>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl ParameterSchema {
    pub fn kind(&self) -> Result<ParameterKind> {
        self.type_tag.parse()
    }

    pub fn is_group(&self) -> bool {
        self.type_tag.eq_ignore_ascii_case("group")
    }
}

/// Producers come either as a bare list of file names (older servers) or as
/// a map of file name to the node/port that produces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Producers {
    Named(Vec<String>),
    Keyed(IndexMap<String, ProducerSchema>),
}

impl Default for Producers {
    fn default() -> Self {
        Producers::Keyed(IndexMap::new())
    }
}

impl Producers {
    pub fn names(&self) -> Vec<&str> {
        match self {
            Producers::Named(names) => names.iter().map(String::as_str).collect(),
            Producers::Keyed(map) => map.keys().map(String::as_str).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Producers::Named(names) => names.len(),
            Producers::Keyed(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProducerSchema {
    #[serde(rename = "nodeID", default)]
    pub node_id: String,
    #[serde(default)]
    pub port: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSchema {
    #[serde(rename = "type", default)]
    pub node_type: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub version: u64,

    #[serde(default)]
    pub dependencies: Vec<NodeDependency>,

    #[serde(default)]
    pub outputs: Vec<NodeOutput>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<ParameterSchema>,
}

/// An input port of a node and the upstream node/port wired into it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDependency {
    #[serde(rename = "dependencyID")]
    pub dependency_id: String,

    #[serde(rename = "dependencyPort", default)]
    pub dependency_port: String,

    /// Name of the input port on the dependent node.
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeOutput {
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_tag: String,
}

/// The closed set of parameter kinds the viewer knows how to edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    Float,
    Int,
    Bool,
    String,
    Color,
    Group,
    Vector2,
    Vector3,
    Vector3Array,
    Image,
    File,
    Aabb,
}

impl ParameterKind {
    /// Parse a declared type tag. Both short tags and Go type names are
    /// accepted, case-insensitively.
    pub fn parse(tag: &str) -> Result<Self> {
        let lower = tag.trim().to_ascii_lowercase();
        let kind = match lower.as_str() {
            "float" | "float64" | "float32" => ParameterKind::Float,
            "int" => ParameterKind::Int,
            "bool" => ParameterKind::Bool,
            "string" => ParameterKind::String,
            "color" | "coloring.webcolor" => ParameterKind::Color,
            "group" => ParameterKind::Group,
            "vector2" | "vector2.vector[float64]" | "vector2.vector[float32]" => {
                ParameterKind::Vector2
            }
            "vector3" | "vector3.vector[float64]" | "vector3.vector[float32]" => {
                ParameterKind::Vector3
            }
            "vector3-array" | "[]vector3.vector[float64]" | "[]vector3.vector[float32]" => {
                ParameterKind::Vector3Array
            }
            "image" | "image.image" => ParameterKind::Image,
            "file" | "[]uint8" => ParameterKind::File,
            "aabb" | "geometry.aabb" => ParameterKind::Aabb,
            _ => return Err(Error::UnimplementedParameterType(tag.to_owned())),
        };

        Ok(kind)
    }

    /// Kinds the profile panel can show as a plain control.
    pub fn is_basic(&self) -> bool {
        matches!(
            self,
            ParameterKind::Float
                | ParameterKind::Int
                | ParameterKind::Bool
                | ParameterKind::String
                | ParameterKind::Color
        )
    }
}

impl FromStr for ParameterKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ParameterKind::parse(s)
    }
}
