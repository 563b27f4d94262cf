use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// One page of a paginated listing: `{items, has_more, next_cursor}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub items: Option<Vec<Value>>,
    #[serde(default)]
    pub has_more: Option<bool>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl Page {
    /// The cursor to follow, or `None` when this is the last page. An empty
    /// cursor ends the walk even if the server claims there is more.
    pub fn continuation(&self) -> Option<&str> {
        if !self.has_more.unwrap_or(false) {
            return None;
        }
        self.next_cursor.as_deref().filter(|cursor| !cursor.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Region {
    pub id: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cluster {
    pub id: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Node {
    #[serde(default = "empty_string_value")]
    pub id: Value,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub shards: Vec<ShardAssignment>,
}

impl Node {
    /// Hostname and IP, present only when both are non-empty.
    pub fn address(&self) -> Option<(&str, &str)> {
        let hostname = self.hostname.as_deref().filter(|h| !h.is_empty())?;
        let ip = self.ip_address.as_deref().filter(|ip| !ip.is_empty())?;
        Some((hostname, ip))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShardAssignment {
    #[serde(default = "empty_string_value")]
    pub shard_id: Value,
    #[serde(default = "empty_string_value")]
    pub shard_role: Value,
    #[serde(default = "zero_value")]
    pub shard_index: Value,
}

fn empty_string_value() -> Value {
    Value::String(String::new())
}

fn zero_value() -> Value {
    Value::from(0)
}

/// Renders an opaque identifier the way it appears in a group name:
/// strings verbatim, everything else as its JSON text.
pub fn id_label(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Variables for a host discovered through the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiHostVars {
    pub ansible_host: String,
    pub node_id: Value,
    pub cluster_id: Value,
    pub region_id: Value,
    pub node_roles: Vec<String>,
    pub node_status: String,
    pub shard_assignments: Vec<ShardAssignment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HostVars {
    Api(ApiHostVars),
    /// Free-form `key=value` pairs from the static source, all strings.
    Static(BTreeMap<String, String>),
}

/// Ordered set of hostnames. Serializes as `{"hosts": [...]}`.
#[derive(Debug, Clone, Default)]
pub struct Group {
    hosts: Vec<String>,
    members: HashSet<String>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `hostname` unless it is already a member. Returns whether it was added.
    pub fn insert(&mut self, hostname: &str) -> bool {
        if !self.members.insert(hostname.to_string()) {
            return false;
        }
        self.hosts.push(hostname.to_string());
        true
    }
}

impl Serialize for Group {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("hosts", &self.hosts)?;
        map.end()
    }
}

/// Reserved top-level key holding per-host variables.
pub const META_KEY: &str = "_meta";

/// The complete inventory: groups plus `_meta.hostvars`.
#[derive(Debug, Clone, Default)]
pub struct InventoryDocument {
    pub groups: BTreeMap<String, Group>,
    pub hostvars: BTreeMap<String, HostVars>,
}

impl InventoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `hostname` to `group`, creating the group on first use.
    pub fn add_to_group(&mut self, group: &str, hostname: &str) -> bool {
        self.groups.entry(group.to_string()).or_default().insert(hostname)
    }
}

impl Serialize for InventoryDocument {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        #[derive(Serialize)]
        struct Meta<'a> {
            hostvars: &'a BTreeMap<String, HostVars>,
        }

        let mut map = serializer.serialize_map(Some(self.groups.len() + 1))?;
        map.serialize_entry(
            META_KEY,
            &Meta {
                hostvars: &self.hostvars,
            },
        )?;
        for (name, group) in &self.groups {
            map.serialize_entry(name, group)?;
        }
        map.end()
    }
}
