//! Permission nodes guarding each command book operation.
//!
//! Every operation has its own node, so servers can allow loading your own books while
//! reserving other users' books for staff. Grants are plain strings; a grant ending in
//! `.*` covers every node below it and `*` covers everything.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The six-way permission partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    Save,
    LoadSelf,
    LoadOther,
    ListSelf,
    ListOther,
    Copy,
}

impl Permission {
    pub const ALL: [Permission; 6] = [
        Permission::Save,
        Permission::LoadSelf,
        Permission::LoadOther,
        Permission::ListSelf,
        Permission::ListOther,
        Permission::Copy,
    ];

    pub fn node(self) -> &'static str {
        match self {
            Permission::Save => "commandbook.command.save",
            Permission::LoadSelf => "commandbook.command.load.self",
            Permission::LoadOther => "commandbook.command.load.other",
            Permission::ListSelf => "commandbook.command.list.self",
            Permission::ListOther => "commandbook.command.list.other",
            Permission::Copy => "commandbook.command.copy",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.node())
    }
}

/// Whether `grant` covers `node`.
pub fn grant_matches(grant: &str, node: &str) -> bool {
    let grant = grant.trim();
    if grant == "*" || grant == node {
        return true;
    }
    match grant.strip_suffix(".*") {
        Some(prefix) => node
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('.')),
        None => false,
    }
}

/// Grants resolved from configuration: defaults for everyone plus per-user extras.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionPolicy {
    #[serde(default = "default_grants")]
    pub default: Vec<String>,
    /// user id -> additional grants
    #[serde(default)]
    pub users: HashMap<String, Vec<String>>,
}

/// Self-service nodes; cross-user access is granted per user.
pub fn default_grants() -> Vec<String> {
    [
        Permission::Save,
        Permission::LoadSelf,
        Permission::ListSelf,
        Permission::Copy,
    ]
    .iter()
    .map(|p| p.node().to_string())
    .collect()
}

impl Default for PermissionPolicy {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl PermissionPolicy {
    pub fn with_defaults() -> Self {
        Self {
            default: default_grants(),
            users: HashMap::new(),
        }
    }

    pub fn grant(&mut self, user_id: &str, grant: impl Into<String>) {
        self.users
            .entry(user_id.to_string())
            .or_default()
            .push(grant.into());
    }

    pub fn allows(&self, user_id: &str, permission: Permission) -> bool {
        let node = permission.node();
        self.default.iter().any(|g| grant_matches(g, node))
            || self
                .users
                .get(user_id)
                .is_some_and(|grants| grants.iter().any(|g| grant_matches(g, node)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nodes_are_distinct() {
        let mut nodes: Vec<_> = Permission::ALL.iter().map(|p| p.node()).collect();
        nodes.sort();
        nodes.dedup();
        assert_eq!(nodes.len(), 6);
    }

    #[test]
    fn wildcard_matching() {
        assert!(grant_matches("*", "commandbook.command.save"));
        assert!(grant_matches("commandbook.*", "commandbook.command.load.other"));
        assert!(grant_matches("commandbook.command.load.*", "commandbook.command.load.self"));
        assert!(!grant_matches("commandbook.command.load.*", "commandbook.command.list.self"));
        // prefix must end on a node boundary
        assert!(!grant_matches("commandbook.command.lo.*", "commandbook.command.load.self"));
        assert!(!grant_matches("commandbook.command.load", "commandbook.command.load.self"));
    }

    #[test]
    fn defaults_are_self_service_only() {
        let policy = PermissionPolicy::with_defaults();
        assert!(policy.allows("alice", Permission::Save));
        assert!(policy.allows("alice", Permission::LoadSelf));
        assert!(policy.allows("alice", Permission::ListSelf));
        assert!(policy.allows("alice", Permission::Copy));
        assert!(!policy.allows("alice", Permission::LoadOther));
        assert!(!policy.allows("alice", Permission::ListOther));
    }

    #[test]
    fn per_user_grants_extend_defaults() {
        let mut policy = PermissionPolicy::with_defaults();
        policy.grant("admin", "commandbook.command.*");
        assert!(policy.allows("admin", Permission::LoadOther));
        assert!(policy.allows("admin", Permission::ListOther));
        assert!(!policy.allows("alice", Permission::ListOther));
    }
}
