//! Shared resource types.
//!
//! Cookbooks and tools are the two kinds of artifact that can be
//! owned, collaborated on, and transferred. Everything that needs to
//! point at "some artifact" without caring which kind goes through
//! [`ResourceRef`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a resource (within its kind).
pub type ResourceId = u64;

/// The kind of a shareable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// A cookbook (a versioned bundle of recipes).
    Cookbook,
    /// A tool (a standalone utility).
    Tool,
}

impl ResourceKind {
    /// Parse from string.
    ///
    /// Accepts the wire spellings used by the web layer ("Cookbook",
    /// "cookbook", ...). Anything else is rejected rather than
    /// defaulted, so an unknown type never silently becomes one of
    /// the known kinds.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cookbook" | "cookbooks" => Some(ResourceKind::Cookbook),
            "tool" | "tools" => Some(ResourceKind::Tool),
            _ => None,
        }
    }

    /// The plural route segment for this kind ("cookbooks", "tools").
    pub fn route_segment(&self) -> &'static str {
        match self {
            ResourceKind::Cookbook => "cookbooks",
            ResourceKind::Tool => "tools",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Cookbook => write!(f, "cookbook"),
            ResourceKind::Tool => write!(f, "tool"),
        }
    }
}

/// A reference to a single resource: its kind plus its id.
///
/// Used as the key for ownership, collaboration grants, and
/// per-resource locking. Ids are only unique within a kind, so the
/// kind is always part of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    /// Which kind of resource.
    pub kind: ResourceKind,
    /// The resource's id within its kind.
    pub id: ResourceId,
}

impl ResourceRef {
    /// Creates a new resource reference.
    pub const fn new(kind: ResourceKind, id: ResourceId) -> Self {
        Self { kind, id }
    }

    /// Reference to a cookbook.
    pub const fn cookbook(id: ResourceId) -> Self {
        Self::new(ResourceKind::Cookbook, id)
    }

    /// Reference to a tool.
    pub const fn tool(id: ResourceId) -> Self {
        Self::new(ResourceKind::Tool, id)
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_str() {
        assert_eq!(ResourceKind::from_str("Cookbook"), Some(ResourceKind::Cookbook));
        assert_eq!(ResourceKind::from_str("cookbook"), Some(ResourceKind::Cookbook));
        assert_eq!(ResourceKind::from_str("Tool"), Some(ResourceKind::Tool));
        assert_eq!(ResourceKind::from_str("tools"), Some(ResourceKind::Tool));
        assert!(ResourceKind::from_str("Recipe").is_none());
        assert!(ResourceKind::from_str("").is_none());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ResourceKind::Cookbook.to_string(), "cookbook");
        assert_eq!(ResourceKind::Tool.to_string(), "tool");
    }

    #[test]
    fn test_kind_serde_lowercase() {
        let json = serde_json::to_string(&ResourceKind::Cookbook).unwrap();
        assert_eq!(json, "\"cookbook\"");
        let kind: ResourceKind = serde_json::from_str("\"tool\"").unwrap();
        assert_eq!(kind, ResourceKind::Tool);
    }

    #[test]
    fn test_ref_display_and_eq() {
        let a = ResourceRef::cookbook(42);
        let b = ResourceRef::new(ResourceKind::Cookbook, 42);
        let c = ResourceRef::tool(42);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string(), "cookbook:42");
        assert_eq!(c.to_string(), "tool:42");
    }
}
