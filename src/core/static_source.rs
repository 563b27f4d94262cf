use crate::utils::error::Result;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Hosts declared in the static INI file, for machines the API does not manage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticInventory {
    /// Group name → hostnames in file order (duplicates kept as written).
    pub groups: BTreeMap<String, Vec<String>>,
    /// Hostname → `key=value` pairs, all strings.
    pub hostvars: HashMap<String, BTreeMap<String, String>>,
}

impl StaticInventory {
    /// Reads `path`; a missing file is an empty inventory.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No static inventory at {}", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        let mut inventory = Self::default();
        let mut current_group: Option<String> = None;

        for line in content.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                let name = line[1..line.len() - 1].to_string();
                inventory.groups.entry(name.clone()).or_default();
                current_group = Some(name);
                continue;
            }

            let Some(group) = &current_group else {
                tracing::debug!("Ignoring static line outside any group: {}", line);
                continue;
            };

            let mut parts = line.split_whitespace();
            let Some(hostname) = parts.next() else {
                continue;
            };

            inventory
                .groups
                .entry(group.clone())
                .or_default()
                .push(hostname.to_string());

            for part in parts {
                if let Some((key, value)) = part.split_once('=') {
                    inventory
                        .hostvars
                        .entry(hostname.to_string())
                        .or_default()
                        .insert(key.to_string(), value.to_string());
                }
            }
        }

        inventory
    }
}
