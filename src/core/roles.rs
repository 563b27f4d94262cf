use std::collections::BTreeMap;

/// API role name → Ansible group name.
const BUILTIN_ROLES: &[(&str, &str)] = &[
    ("web", "web"),
    ("database", "db"),
    ("dns", "dns"),
    ("valkey", "valkey"),
    ("email", "email"),
    ("storage", "storage"),
    ("s3", "storage"),
    ("dbadmin", "dbadmin"),
    ("lb", "lb"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMap {
    groups: BTreeMap<String, String>,
}

impl Default for RoleMap {
    fn default() -> Self {
        Self {
            groups: BUILTIN_ROLES
                .iter()
                .map(|(role, group)| (role.to_string(), group.to_string()))
                .collect(),
        }
    }
}

impl RoleMap {
    /// Group for `role`; unmapped roles are their own group.
    pub fn resolve<'a>(&'a self, role: &'a str) -> &'a str {
        self.groups.get(role).map(String::as_str).unwrap_or(role)
    }

    pub fn extend<I: IntoIterator<Item = (String, String)>>(&mut self, entries: I) {
        self.groups.extend(entries);
    }
}
