use crate::config::InventoryConfig;
use crate::core::roles::RoleMap;
use crate::core::static_source::StaticInventory;
use crate::domain::model::{
    id_label, ApiHostVars, Cluster, HostVars, InventoryDocument, Node, Region, META_KEY,
};
use crate::domain::ports::ResourceSource;
use crate::utils::error::Result;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::path::PathBuf;

/// Walks regions → clusters → nodes and merges the static file on top.
pub struct InventoryBuilder<S: ResourceSource> {
    source: S,
    static_path: PathBuf,
    roles: RoleMap,
}

impl<S: ResourceSource> InventoryBuilder<S> {
    pub fn new(source: S, static_path: PathBuf, roles: RoleMap) -> Self {
        Self {
            source,
            static_path,
            roles,
        }
    }

    pub fn from_config(source: S, config: &InventoryConfig) -> Self {
        Self::new(source, config.static_path.clone(), config.roles.clone())
    }

    pub async fn build(&self) -> Result<InventoryDocument> {
        let mut inventory = InventoryDocument::new();
        let mut api_hosts = HashSet::new();

        let regions: Vec<Region> = self.fetch_all("/regions").await?;
        tracing::debug!("Walking {} regions", regions.len());

        for region in &regions {
            let region_id = id_label(&region.id);
            let clusters: Vec<Cluster> = self
                .fetch_all(&format!("/regions/{}/clusters", region_id))
                .await?;

            for cluster in &clusters {
                let cluster_id = id_label(&cluster.id);
                let nodes: Vec<Node> = self
                    .fetch_all(&format!("/clusters/{}/nodes", cluster_id))
                    .await?;

                for node in nodes {
                    self.add_node(&mut inventory, &mut api_hosts, region, cluster, node);
                }
            }
        }

        let static_inventory = StaticInventory::load(&self.static_path)?;
        merge_static(&mut inventory, &api_hosts, static_inventory);

        tracing::debug!(
            "Inventory has {} groups and {} hosts with variables",
            inventory.groups.len(),
            inventory.hostvars.len()
        );
        Ok(inventory)
    }

    /// Fetches and decodes one listing. Transport failures degrade to an
    /// empty listing; items that do not decode are skipped individually.
    async fn fetch_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let items = match self.source.fetch(path).await {
            Ok(items) => items,
            Err(e) if e.is_transport() => {
                tracing::warn!("Treating {} as empty after fetch failure: {}", path, e);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        Ok(items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    tracing::warn!("Skipping malformed item from {}: {}", path, e);
                    None
                }
            })
            .collect())
    }

    fn add_node(
        &self,
        inventory: &mut InventoryDocument,
        api_hosts: &mut HashSet<String>,
        region: &Region,
        cluster: &Cluster,
        node: Node,
    ) {
        let Some((hostname, ip)) = node.address() else {
            tracing::debug!("Skipping node {} without hostname or IP", node.id);
            return;
        };
        let hostname = hostname.to_string();

        if !api_hosts.insert(hostname.clone()) {
            tracing::debug!("Host {} returned more than once, later node wins", hostname);
        }

        inventory.hostvars.insert(
            hostname.clone(),
            HostVars::Api(ApiHostVars {
                ansible_host: ip.to_string(),
                node_id: node.id.clone(),
                cluster_id: cluster.id.clone(),
                region_id: region.id.clone(),
                node_roles: node.roles.clone(),
                node_status: node.status.clone().unwrap_or_default(),
                shard_assignments: node.shards.clone(),
            }),
        );

        inventory.add_to_group(&format!("region_{}", id_label(&region.id)), &hostname);
        inventory.add_to_group(&format!("cluster_{}", id_label(&cluster.id)), &hostname);

        for role in &node.roles {
            inventory.add_to_group(self.roles.resolve(role), &hostname);
        }
    }
}

/// Adds static hosts the API did not return. API hosts keep their groups and variables.
fn merge_static(
    inventory: &mut InventoryDocument,
    api_hosts: &HashSet<String>,
    static_inventory: StaticInventory,
) {
    let StaticInventory { groups, hostvars } = static_inventory;

    for (group, hosts) in groups {
        if group == META_KEY {
            tracing::warn!("Ignoring static group named {}", META_KEY);
            continue;
        }

        for hostname in hosts {
            if api_hosts.contains(&hostname) {
                tracing::debug!("Static host {} is managed by the API, skipping", hostname);
                continue;
            }

            inventory.add_to_group(&group, &hostname);

            if let Some(vars) = hostvars.get(&hostname) {
                inventory
                    .hostvars
                    .entry(hostname.clone())
                    .or_insert_with(|| HostVars::Static(vars.clone()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::InventoryError;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    /// In-memory listings keyed by path; unknown paths are empty.
    #[derive(Default)]
    struct MemorySource {
        listings: HashMap<String, Vec<Value>>,
        malformed: HashSet<String>,
        requested: Mutex<Vec<String>>,
    }

    impl MemorySource {
        fn with(mut self, path: &str, items: Value) -> Self {
            let items = match items {
                Value::Array(items) => items,
                other => vec![other],
            };
            self.listings.insert(path.to_string(), items);
            self
        }

        fn with_malformed(mut self, path: &str) -> Self {
            self.malformed.insert(path.to_string());
            self
        }
    }

    #[async_trait]
    impl ResourceSource for MemorySource {
        async fn fetch(&self, path: &str) -> Result<Vec<Value>> {
            self.requested.lock().unwrap().push(path.to_string());
            if self.malformed.contains(path) {
                let err = serde_json::from_str::<Value>("{not json").unwrap_err();
                return Err(InventoryError::SerializationError(err));
            }
            Ok(self.listings.get(path).cloned().unwrap_or_default())
        }
    }

    fn builder(
        source: MemorySource,
        static_content: Option<&str>,
    ) -> (InventoryBuilder<MemorySource>, NamedTempFile) {
        let mut file = NamedTempFile::new().unwrap();
        let path = match static_content {
            Some(content) => {
                file.write_all(content.as_bytes()).unwrap();
                file.path().to_path_buf()
            }
            None => file.path().with_extension("missing"),
        };
        (InventoryBuilder::new(source, path, RoleMap::default()), file)
    }

    async fn build_json(source: MemorySource, static_content: Option<&str>) -> Value {
        let (builder, _file) = builder(source, static_content);
        serde_json::to_value(builder.build().await.unwrap()).unwrap()
    }

    fn single_node_source(node: Value) -> MemorySource {
        MemorySource::default()
            .with("/regions", json!([{"id": "r1"}]))
            .with("/regions/r1/clusters", json!([{"id": "c1"}]))
            .with("/clusters/c1/nodes", json!([node]))
    }

    #[tokio::test]
    async fn test_single_node_groups_and_hostvars() {
        let source = single_node_source(json!({
            "id": "n1",
            "hostname": "web1",
            "ip_address": "10.0.0.1",
            "roles": ["web"],
            "status": "active",
            "shards": []
        }));

        let doc = build_json(source, None).await;

        assert_eq!(doc["region_r1"], json!({"hosts": ["web1"]}));
        assert_eq!(doc["cluster_c1"], json!({"hosts": ["web1"]}));
        assert_eq!(doc["web"], json!({"hosts": ["web1"]}));
        assert_eq!(
            doc["_meta"]["hostvars"]["web1"],
            json!({
                "ansible_host": "10.0.0.1",
                "node_id": "n1",
                "cluster_id": "c1",
                "region_id": "r1",
                "node_roles": ["web"],
                "node_status": "active",
                "shard_assignments": []
            })
        );
    }

    #[tokio::test]
    async fn test_roles_translate_and_deduplicate() {
        let source = single_node_source(json!({
            "hostname": "db1",
            "ip_address": "10.0.0.2",
            "roles": ["database", "custom", "database"]
        }));

        let doc = build_json(source, None).await;

        assert_eq!(doc["db"], json!({"hosts": ["db1"]}));
        assert_eq!(doc["custom"], json!({"hosts": ["db1"]}));
        assert!(doc.get("database").is_none());
    }

    #[tokio::test]
    async fn test_shard_defaults() {
        let source = single_node_source(json!({
            "hostname": "db1",
            "ip_address": "10.0.0.2",
            "shards": [
                {"shard_id": "s1", "shard_role": "primary", "shard_index": 2},
                {"shard_id": "s2"}
            ]
        }));

        let doc = build_json(source, None).await;

        assert_eq!(
            doc["_meta"]["hostvars"]["db1"]["shard_assignments"],
            json!([
                {"shard_id": "s1", "shard_role": "primary", "shard_index": 2},
                {"shard_id": "s2", "shard_role": "", "shard_index": 0}
            ])
        );
        assert_eq!(doc["_meta"]["hostvars"]["db1"]["node_id"], json!(""));
        assert_eq!(doc["_meta"]["hostvars"]["db1"]["node_status"], json!(""));
    }

    #[tokio::test]
    async fn test_nodes_without_address_are_skipped() {
        let source = MemorySource::default()
            .with("/regions", json!([{"id": "r1"}]))
            .with("/regions/r1/clusters", json!([{"id": "c1"}]))
            .with(
                "/clusters/c1/nodes",
                json!([
                    {"hostname": "", "ip_address": "10.0.0.1", "roles": ["web"]},
                    {"hostname": "ghost", "roles": ["web"]},
                    {"hostname": "web2", "ip_address": "10.0.0.2", "roles": ["web"]}
                ]),
            );

        let doc = build_json(source, None).await;

        assert_eq!(doc["web"], json!({"hosts": ["web2"]}));
        assert!(doc["_meta"]["hostvars"].get("ghost").is_none());
        assert_eq!(doc["_meta"]["hostvars"].as_object().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_repeated_hostname_later_node_wins() {
        let source = MemorySource::default()
            .with("/regions", json!([{"id": "r1"}]))
            .with("/regions/r1/clusters", json!([{"id": "c1"}, {"id": "c2"}]))
            .with(
                "/clusters/c1/nodes",
                json!([{"id": "n1", "hostname": "shared", "ip_address": "10.0.1.1", "roles": ["web", "dns"]}]),
            )
            .with(
                "/clusters/c2/nodes",
                json!([{"id": "n2", "hostname": "shared", "ip_address": "10.0.2.1", "roles": ["web", "database"]}]),
            );

        let doc = build_json(source, None).await;

        let vars = &doc["_meta"]["hostvars"]["shared"];
        assert_eq!(vars["ansible_host"], json!("10.0.2.1"));
        assert_eq!(vars["cluster_id"], json!("c2"));
        assert_eq!(vars["node_id"], json!("n2"));

        assert_eq!(doc["cluster_c1"], json!({"hosts": ["shared"]}));
        assert_eq!(doc["cluster_c2"], json!({"hosts": ["shared"]}));
        assert_eq!(doc["region_r1"], json!({"hosts": ["shared"]}));
        assert_eq!(doc["web"], json!({"hosts": ["shared"]}));
        assert_eq!(doc["dns"], json!({"hosts": ["shared"]}));
        assert_eq!(doc["db"], json!({"hosts": ["shared"]}));
    }

    #[tokio::test]
    async fn test_numeric_ids_in_paths_and_groups() {
        let source = MemorySource::default()
            .with("/regions", json!([{"id": 7}]))
            .with("/regions/7/clusters", json!([{"id": 12}]))
            .with(
                "/clusters/12/nodes",
                json!([{"id": 99, "hostname": "lb1", "ip_address": "10.0.0.9", "roles": ["lb"]}]),
            );

        let doc = build_json(source, None).await;

        assert_eq!(doc["region_7"], json!({"hosts": ["lb1"]}));
        assert_eq!(doc["cluster_12"], json!({"hosts": ["lb1"]}));
        assert_eq!(doc["_meta"]["hostvars"]["lb1"]["region_id"], json!(7));
        assert_eq!(doc["_meta"]["hostvars"]["lb1"]["node_id"], json!(99));
    }

    #[tokio::test]
    async fn test_malformed_items_are_skipped() {
        let source = MemorySource::default()
            .with("/regions", json!([{"name": "no id"}, {"id": "r1"}]))
            .with("/regions/r1/clusters", json!([{"id": "c1"}]))
            .with(
                "/clusters/c1/nodes",
                json!([
                    {"hostname": "bad", "ip_address": "10.0.0.1", "roles": "web"},
                    {"hostname": "good", "ip_address": "10.0.0.2"}
                ]),
            );

        let doc = build_json(source, None).await;

        assert_eq!(doc["region_r1"], json!({"hosts": ["good"]}));
        assert!(doc["_meta"]["hostvars"].get("bad").is_none());
    }

    #[tokio::test]
    async fn test_undecodable_listing_is_fatal() {
        let source = MemorySource::default().with_malformed("/regions");
        let (builder, _file) = builder(source, None);

        let err = builder.build().await.unwrap_err();
        assert!(matches!(err, InventoryError::SerializationError(_)));
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn test_walk_order() {
        let source = MemorySource::default()
            .with("/regions", json!([{"id": "r1"}, {"id": "r2"}]))
            .with("/regions/r1/clusters", json!([{"id": "c1"}, {"id": "c2"}]));
        let (builder, _file) = builder(source, None);

        builder.build().await.unwrap();

        let requested = builder.source.requested.lock().unwrap().clone();
        assert_eq!(
            requested,
            vec![
                "/regions",
                "/regions/r1/clusters",
                "/clusters/c1/nodes",
                "/clusters/c2/nodes",
                "/regions/r2/clusters"
            ]
        );
    }

    #[tokio::test]
    async fn test_static_only_with_empty_api() {
        let doc = build_json(
            MemorySource::default(),
            Some("[controlplane]\ncp1 ansible_host=10.0.0.5 env=prod\n"),
        )
        .await;

        assert_eq!(
            doc,
            json!({
                "_meta": {"hostvars": {"cp1": {"ansible_host": "10.0.0.5", "env": "prod"}}},
                "controlplane": {"hosts": ["cp1"]}
            })
        );
    }

    #[tokio::test]
    async fn test_api_host_wins_over_static() {
        let source = single_node_source(json!({
            "hostname": "web1",
            "ip_address": "10.0.0.1",
            "roles": ["web"]
        }));
        let static_content = "[web]\nweb1 ansible_host=192.168.0.1\nweb9 ansible_host=192.168.0.9\n[legacy]\nweb1\n";

        let doc = build_json(source, Some(static_content)).await;

        assert_eq!(doc["web"], json!({"hosts": ["web1", "web9"]}));
        assert!(doc.get("legacy").is_none());
        assert_eq!(doc["_meta"]["hostvars"]["web1"]["ansible_host"], json!("10.0.0.1"));
        assert_eq!(
            doc["_meta"]["hostvars"]["web9"],
            json!({"ansible_host": "192.168.0.9"})
        );
    }

    #[tokio::test]
    async fn test_static_host_in_several_groups() {
        let static_content = "[controlplane]\ncp1 env=prod\ncp1\n[monitoring]\ncp1\nmon1\n[empty]\n";

        let doc = build_json(MemorySource::default(), Some(static_content)).await;

        assert_eq!(doc["controlplane"], json!({"hosts": ["cp1"]}));
        assert_eq!(doc["monitoring"], json!({"hosts": ["cp1", "mon1"]}));
        assert!(doc.get("empty").is_none());
        assert_eq!(doc["_meta"]["hostvars"]["cp1"], json!({"env": "prod"}));
        assert!(doc["_meta"]["hostvars"].get("mon1").is_none());
    }

    #[tokio::test]
    async fn test_static_meta_group_is_ignored() {
        let doc = build_json(MemorySource::default(), Some("[_meta]\nsneaky\n")).await;
        assert_eq!(doc, json!({"_meta": {"hostvars": {}}}));
    }
}
