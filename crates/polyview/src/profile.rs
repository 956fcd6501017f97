use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{Error, ParameterSchema, Result, Schema};

/// The locally held parameter values. Mirrors the schema's shape: groups are
/// nested objects inside `Parameters`, sub-generators nest whole profiles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "Parameters", default)]
    pub parameters: Map<String, Value>,

    #[serde(rename = "subGenerators", default)]
    pub sub_generators: IndexMap<String, Profile>,
}

/// Address of a single profile leaf: the chain of sub-generator keys, then
/// the chain of group names ending in the parameter name.
///
/// Written as `gen/gen:group/name`, or just `group/name` at the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProfilePath {
    pub generators: Vec<String>,
    pub parameter: Vec<String>,
}

impl ProfilePath {
    pub fn new(generators: Vec<String>, parameter: Vec<String>) -> Self {
        Self {
            generators,
            parameter,
        }
    }

    pub fn root(parameter: &[&str]) -> Self {
        Self::new(
            Vec::new(),
            parameter.iter().map(|s| (*s).to_owned()).collect(),
        )
    }

    pub fn parse(s: &str) -> Result<Self> {
        let (generators, parameter) = match s.split_once(':') {
            Some((gens, param)) => (split_segments(gens), split_segments(param)),
            None => (Vec::new(), split_segments(s)),
        };

        if parameter.is_empty() {
            return Err(Error::UnknownParameter(s.to_owned()));
        }

        Ok(Self::new(generators, parameter))
    }

    pub fn name(&self) -> &str {
        self.parameter.last().map(String::as_str).unwrap_or_default()
    }
}

fn split_segments(s: &str) -> Vec<String> {
    s.split('/')
        .filter(|seg| !seg.is_empty())
        .map(str::to_owned)
        .collect()
}

impl fmt::Display for ProfilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.generators.is_empty() {
            write!(f, "{}:", self.generators.join("/"))?;
        }
        write!(f, "{}", self.parameter.join("/"))
    }
}

impl Profile {
    /// Build a profile that takes every `currentValue` from the schema.
    pub fn from_schema(schema: &Schema) -> Self {
        let mut edits = LocalEdits::default();
        Profile::default().merge(schema, &mut edits, 0).profile
    }

    fn generator(&self, generators: &[String]) -> Option<&Profile> {
        generators
            .iter()
            .try_fold(self, |profile, key| profile.sub_generators.get(key))
    }

    fn generator_mut(&mut self, generators: &[String]) -> Option<&mut Profile> {
        generators
            .iter()
            .try_fold(self, |profile, key| profile.sub_generators.get_mut(key))
    }

    pub fn get(&self, path: &ProfilePath) -> Option<&Value> {
        let (name, groups) = path.parameter.split_last()?;
        let profile = self.generator(&path.generators)?;
        let group = groups.iter().try_fold(&profile.parameters, |map, group| {
            map.get(group).and_then(Value::as_object)
        })?;
        group.get(name)
    }

    /// Overwrite an existing leaf. Unknown paths are an error; the profile's
    /// shape only ever changes through a merge.
    pub fn set(&mut self, path: &ProfilePath, value: Value) -> Result<()> {
        let unknown = || Error::UnknownParameter(path.to_string());
        let (name, groups) = path.parameter.split_last().ok_or_else(unknown)?;
        let profile = self.generator_mut(&path.generators).ok_or_else(unknown)?;

        let mut map = &mut profile.parameters;
        for group in groups {
            map = map
                .get_mut(group)
                .and_then(Value::as_object_mut)
                .ok_or_else(unknown)?;
        }

        match map.get_mut(name) {
            Some(slot) if !slot.is_object() || value.is_object() => {
                *slot = value;
                Ok(())
            }
            _ => Err(unknown()),
        }
    }

    /// Reconcile this profile against a freshly fetched schema.
    ///
    /// The result has exactly the schema's shape. A leaf keeps its local
    /// value when the ledger says the local edit hasn't been seen by the
    /// server yet; otherwise it takes the schema's `currentValue`.
    pub fn merge(&self, schema: &Schema, edits: &mut LocalEdits, generation: u64) -> Merged {
        let mut merge = Merge {
            edits,
            generation,
            generators: Vec::new(),
            groups: Vec::new(),
            drift: Vec::new(),
        };

        let profile = merge.profile(Some(self), schema);
        Merged {
            profile,
            drift: merge.drift,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
    pub profile: Profile,
    /// Paths the schema had but the previous profile did not.
    pub drift: Vec<String>,
}

struct Merge<'a> {
    edits: &'a mut LocalEdits,
    generation: u64,
    generators: Vec<String>,
    groups: Vec<String>,
    drift: Vec<String>,
}

impl Merge<'_> {
    fn note_drift(&mut self, what: &str, name: &str) {
        let path = self
            .generators
            .iter()
            .chain(&self.groups)
            .map(String::as_str)
            .chain(std::iter::once(name))
            .collect::<Vec<_>>()
            .join("/");
        warn!("profile has no {what} for {path}, re-deriving from schema");
        self.drift.push(path);
    }

    fn profile(&mut self, old: Option<&Profile>, schema: &Schema) -> Profile {
        let mut out = Profile::default();

        if let Some(root) = &schema.parameters {
            out.parameters = self.group(old.map(|p| &p.parameters), root);
        }

        for (key, sub) in &schema.sub_generators {
            let old_sub = old.and_then(|p| p.sub_generators.get(key));
            // an empty starting profile is a first load, not drift
            if old_sub.is_none() && old.is_some_and(|p| *p != Profile::default()) {
                self.note_drift("sub-generator", key);
            }

            self.generators.push(key.clone());
            let merged = self.profile(old_sub, sub);
            self.generators.pop();

            out.sub_generators.insert(key.clone(), merged);
        }

        out
    }

    fn group(&mut self, old: Option<&Map<String, Value>>, group: &ParameterSchema) -> Map<String, Value> {
        let mut out = Map::new();

        for param in &group.parameters {
            if param.is_group() {
                let old_group = old
                    .and_then(|m| m.get(&param.name))
                    .and_then(Value::as_object);
                if old_group.is_none() && old.is_some_and(|m| !m.is_empty()) {
                    self.note_drift("group", &param.name);
                }

                self.groups.push(param.name.clone());
                let merged = self.group(old_group, param);
                self.groups.pop();

                out.insert(param.name.clone(), Value::Object(merged));
                continue;
            }

            let mut parameter = self.groups.clone();
            parameter.push(param.name.clone());
            let key = ParameterKey::Path(ProfilePath::new(self.generators.clone(), parameter));

            let local = old.and_then(|m| m.get(&param.name));
            let value = match local {
                Some(local) if !self.edits.accepts_server(&key, self.generation) => {
                    debug!("keeping local value for {key} over server value");
                    local.clone()
                }
                _ => {
                    self.edits.settle(&key, self.generation);
                    param.current_value.clone()
                }
            };

            out.insert(param.name.clone(), value);
        }

        if let Some(old) = old {
            for name in old.keys().filter(|name| !out.contains_key(*name)) {
                debug!("dropping parameter {name} no longer in schema");
            }
        }

        out
    }
}

/// What a local edit is keyed by: a profile leaf, or a graph node's
/// parameter (`/parameter/value/<node id>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParameterKey {
    Path(ProfilePath),
    Node(String),
}

impl fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterKey::Path(path) => write!(f, "{path}"),
            ParameterKey::Node(id) => write!(f, "node {id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct LocalEdit {
    seq: u64,
    /// Fetch generation current when the server acknowledged this edit.
    acked_at: Option<u64>,
    value: Option<Value>,
}

/// Ledger of local edits the server may not have seen yet.
///
/// Every schema fetch carries a generation number. A server value replaces
/// a locally edited one only if it came from a fetch issued after the
/// server acknowledged that edit.
#[derive(Debug, Default, Clone)]
pub struct LocalEdits {
    next_seq: u64,
    edits: HashMap<ParameterKey, LocalEdit>,
}

impl LocalEdits {
    /// Record a local edit, returning its sequence number.
    pub fn record(&mut self, key: ParameterKey, value: Option<Value>) -> u64 {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.edits.insert(
            key,
            LocalEdit {
                seq,
                acked_at: None,
                value,
            },
        );
        seq
    }

    /// The latest sequence number handed out.
    pub fn last_seq(&self) -> u64 {
        self.next_seq
    }

    /// The server accepted a single-key mutation with sequence `seq`.
    pub fn acknowledge_key(&mut self, key: &ParameterKey, seq: u64, generation: u64) {
        if let Some(edit) = self.edits.get_mut(key) {
            if edit.seq == seq && edit.acked_at.is_none() {
                edit.acked_at = Some(generation);
            }
        }
    }

    /// The server accepted a full profile containing every profile edit up to
    /// and including `seq`.
    pub fn acknowledge_profile(&mut self, seq: u64, generation: u64) {
        for (key, edit) in self.edits.iter_mut() {
            if matches!(key, ParameterKey::Path(_)) && edit.seq <= seq && edit.acked_at.is_none() {
                edit.acked_at = Some(generation);
            }
        }
    }

    /// The server refused edit `seq` on `key`. Whatever it reports next is
    /// authoritative.
    pub fn reject_key(&mut self, key: &ParameterKey, seq: u64) {
        if self
            .edits
            .get(key)
            .is_some_and(|edit| edit.seq == seq && edit.acked_at.is_none())
        {
            self.edits.remove(key);
        }
    }

    /// The server refused a full profile carrying every profile edit up to
    /// `seq`.
    pub fn reject_profile(&mut self, seq: u64) {
        self.edits.retain(|key, edit| {
            !(matches!(key, ParameterKey::Path(_)) && edit.seq <= seq && edit.acked_at.is_none())
        });
    }

    /// Drop edits for keys the server no longer has.
    pub fn retain_keys(&mut self, mut keep: impl FnMut(&ParameterKey) -> bool) {
        self.edits.retain(|key, _| keep(key));
    }

    pub fn accepts_server(&self, key: &ParameterKey, generation: u64) -> bool {
        match self.edits.get(key) {
            None => true,
            Some(edit) => edit.acked_at.is_some_and(|acked| generation > acked),
        }
    }

    /// Forget an edit once a server value has superseded it.
    pub fn settle(&mut self, key: &ParameterKey, generation: u64) {
        if self.edits.contains_key(key) && self.accepts_server(key, generation) {
            self.edits.remove(key);
        }
    }

    pub fn pending_value(&self, key: &ParameterKey) -> Option<&Value> {
        self.edits.get(key).and_then(|edit| edit.value.as_ref())
    }

    pub fn contains(&self, key: &ParameterKey) -> bool {
        self.edits.contains_key(key)
    }

    pub fn clear(&mut self) {
        self.edits.clear();
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}
