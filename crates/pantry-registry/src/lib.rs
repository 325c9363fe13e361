//! User directory and artifact catalog for `pantry`.
//!
//! The registry answers "who exists" and "what exists": user accounts,
//! cookbooks, and tools, with exactly one owner per artifact. Who may
//! touch what lives in `pantry-auth`; this crate only stores and looks
//! things up.

mod error;
mod resources;
mod users;

pub use error::{RegistryError, Result};
pub use resources::{Cookbook, ResourceRecord, ResourceStore, Tool};
pub use users::UserStore;

/// Combined registry handle, cheap to clone.
#[derive(Debug, Clone)]
pub struct Registry {
    /// User directory.
    pub users: UserStore,
    /// Cookbook and tool catalog.
    pub resources: ResourceStore,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            users: UserStore::new(),
            resources: ResourceStore::new(),
        }
    }

    /// Get statistics about stored data.
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            users: self.users.count(),
            cookbooks: self.resources.count_cookbooks(),
            tools: self.resources.count_tools(),
        }
    }
}

/// Counts of stored records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    /// Number of registered users.
    pub users: usize,
    /// Number of cookbooks.
    pub cookbooks: usize,
    /// Number of tools.
    pub tools: usize,
}
