//! Cookbook and tool catalog storage.
//!
//! Every artifact has exactly one owner at any observable time. The
//! store only swaps owners via [`ResourceStore::set_owner`]; the
//! surrounding bookkeeping (demoting the outgoing owner to a
//! collaborator) is the collaboration service's job.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use pantry_types::{ResourceId, ResourceKind, ResourceRef, UserId};

use crate::error::{RegistryError, Result};

/// A cookbook: a versioned bundle of recipes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cookbook {
    /// Unique cookbook ID.
    pub id: ResourceId,
    /// Unique cookbook name.
    pub name: String,
    /// Current owner.
    pub owner_id: UserId,
    /// Short description.
    pub description: Option<String>,
    /// Unix timestamp when created.
    pub created_at: u64,
    /// Unix timestamp when last updated.
    pub updated_at: u64,
}

/// A tool: a standalone utility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Unique tool ID.
    pub id: ResourceId,
    /// Unique tool name.
    pub name: String,
    /// Current owner.
    pub owner_id: UserId,
    /// Short description.
    pub description: Option<String>,
    /// Unix timestamp when created.
    pub created_at: u64,
    /// Unix timestamp when last updated.
    pub updated_at: u64,
}

/// Either kind of catalogued artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceRecord {
    /// A cookbook.
    Cookbook(Cookbook),
    /// A tool.
    Tool(Tool),
}

impl ResourceRecord {
    /// The record's kind.
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceRecord::Cookbook(_) => ResourceKind::Cookbook,
            ResourceRecord::Tool(_) => ResourceKind::Tool,
        }
    }

    /// The record's id.
    pub fn id(&self) -> ResourceId {
        match self {
            ResourceRecord::Cookbook(c) => c.id,
            ResourceRecord::Tool(t) => t.id,
        }
    }

    /// The record's name.
    pub fn name(&self) -> &str {
        match self {
            ResourceRecord::Cookbook(c) => &c.name,
            ResourceRecord::Tool(t) => &t.name,
        }
    }

    /// The record's current owner.
    pub fn owner_id(&self) -> UserId {
        match self {
            ResourceRecord::Cookbook(c) => c.owner_id,
            ResourceRecord::Tool(t) => t.owner_id,
        }
    }

    /// The record's description.
    pub fn description(&self) -> Option<&str> {
        match self {
            ResourceRecord::Cookbook(c) => c.description.as_deref(),
            ResourceRecord::Tool(t) => t.description.as_deref(),
        }
    }

    /// Reference addressing this record.
    pub fn reference(&self) -> ResourceRef {
        ResourceRef::new(self.kind(), self.id())
    }
}

/// Validate an artifact name.
///
/// Names must be 1-100 characters, start with a letter or number, and
/// contain only lowercase letters, digits, hyphens, and underscores.
pub fn validate_resource_name(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("name cannot be empty".to_string());
    }
    if name.len() > 100 {
        return Err("name must be 100 characters or less".to_string());
    }

    let first = name.chars().next().unwrap();
    if !first.is_ascii_alphanumeric() {
        return Err("name must start with a letter or number".to_string());
    }

    for c in name.chars() {
        if !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-' && c != '_' {
            if c.is_ascii_uppercase() {
                return Err("name must be lowercase".to_string());
            }
            return Err(format!("invalid character in name: {}", c));
        }
    }

    Ok(())
}

/// Cookbook and tool catalog.
///
/// Names are unique per kind; the same name can exist once as a
/// cookbook and once as a tool.
#[derive(Debug, Clone)]
pub struct ResourceStore {
    /// Cookbooks by ID.
    cookbooks: Arc<RwLock<HashMap<ResourceId, Cookbook>>>,
    /// Cookbook name to ID index.
    cookbook_name_index: Arc<RwLock<HashMap<String, ResourceId>>>,
    /// Tools by ID.
    tools: Arc<RwLock<HashMap<ResourceId, Tool>>>,
    /// Tool name to ID index.
    tool_name_index: Arc<RwLock<HashMap<String, ResourceId>>>,
    /// Next resource ID (shared across kinds).
    next_id: Arc<AtomicU64>,
}

impl Default for ResourceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceStore {
    /// Create a new resource store.
    pub fn new() -> Self {
        Self {
            cookbooks: Arc::new(RwLock::new(HashMap::new())),
            cookbook_name_index: Arc::new(RwLock::new(HashMap::new())),
            tools: Arc::new(RwLock::new(HashMap::new())),
            tool_name_index: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Create a new cookbook.
    pub fn create_cookbook(
        &self,
        name: String,
        owner_id: UserId,
        description: Option<String>,
    ) -> Result<Cookbook> {
        validate_resource_name(&name).map_err(RegistryError::InvalidName)?;

        let mut cookbooks = self.cookbooks.write();
        let mut name_index = self.cookbook_name_index.write();

        if name_index.contains_key(&name) {
            return Err(RegistryError::NameTaken(format!("cookbook '{}'", name)));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = now_secs();
        let cookbook = Cookbook {
            id,
            name: name.clone(),
            owner_id,
            description,
            created_at: now,
            updated_at: now,
        };

        name_index.insert(name, id);
        cookbooks.insert(id, cookbook.clone());

        Ok(cookbook)
    }

    /// Create a new tool.
    pub fn create_tool(
        &self,
        name: String,
        owner_id: UserId,
        description: Option<String>,
    ) -> Result<Tool> {
        validate_resource_name(&name).map_err(RegistryError::InvalidName)?;

        let mut tools = self.tools.write();
        let mut name_index = self.tool_name_index.write();

        if name_index.contains_key(&name) {
            return Err(RegistryError::NameTaken(format!("tool '{}'", name)));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = now_secs();
        let tool = Tool {
            id,
            name: name.clone(),
            owner_id,
            description,
            created_at: now,
            updated_at: now,
        };

        name_index.insert(name, id);
        tools.insert(id, tool.clone());

        Ok(tool)
    }

    /// Get a record by reference.
    pub fn get(&self, resource: ResourceRef) -> Option<ResourceRecord> {
        match resource.kind {
            ResourceKind::Cookbook => self
                .cookbooks
                .read()
                .get(&resource.id)
                .cloned()
                .map(ResourceRecord::Cookbook),
            ResourceKind::Tool => self
                .tools
                .read()
                .get(&resource.id)
                .cloned()
                .map(ResourceRecord::Tool),
        }
    }

    /// Get a record by kind and name.
    pub fn get_by_name(&self, kind: ResourceKind, name: &str) -> Option<ResourceRecord> {
        let id = match kind {
            ResourceKind::Cookbook => *self.cookbook_name_index.read().get(name)?,
            ResourceKind::Tool => *self.tool_name_index.read().get(name)?,
        };
        self.get(ResourceRef::new(kind, id))
    }

    /// Current owner of a resource, if it exists.
    pub fn owner_of(&self, resource: ResourceRef) -> Option<UserId> {
        match resource.kind {
            ResourceKind::Cookbook => self.cookbooks.read().get(&resource.id).map(|c| c.owner_id),
            ResourceKind::Tool => self.tools.read().get(&resource.id).map(|t| t.owner_id),
        }
    }

    /// Swap a resource's owner.
    ///
    /// This is the raw primitive used by ownership transfer. It does
    /// not touch collaborator grants.
    pub fn set_owner(&self, resource: ResourceRef, owner_id: UserId) -> Result<ResourceRecord> {
        match resource.kind {
            ResourceKind::Cookbook => {
                let mut cookbooks = self.cookbooks.write();
                let cookbook = cookbooks
                    .get_mut(&resource.id)
                    .ok_or_else(|| RegistryError::ResourceNotFound(resource.to_string()))?;
                cookbook.owner_id = owner_id;
                cookbook.updated_at = now_secs();
                Ok(ResourceRecord::Cookbook(cookbook.clone()))
            }
            ResourceKind::Tool => {
                let mut tools = self.tools.write();
                let tool = tools
                    .get_mut(&resource.id)
                    .ok_or_else(|| RegistryError::ResourceNotFound(resource.to_string()))?;
                tool.owner_id = owner_id;
                tool.updated_at = now_secs();
                Ok(ResourceRecord::Tool(tool.clone()))
            }
        }
    }

    /// List all records of a kind, sorted by name.
    pub fn list(&self, kind: ResourceKind) -> Vec<ResourceRecord> {
        let mut records: Vec<ResourceRecord> = match kind {
            ResourceKind::Cookbook => self
                .cookbooks
                .read()
                .values()
                .cloned()
                .map(ResourceRecord::Cookbook)
                .collect(),
            ResourceKind::Tool => self
                .tools
                .read()
                .values()
                .cloned()
                .map(ResourceRecord::Tool)
                .collect(),
        };
        records.sort_by(|a, b| a.name().cmp(b.name()));
        records
    }

    /// All records owned by a user, cookbooks first, sorted by name.
    pub fn resources_owned_by(&self, owner_id: UserId) -> Vec<ResourceRecord> {
        let mut records: Vec<ResourceRecord> = self
            .list(ResourceKind::Cookbook)
            .into_iter()
            .chain(self.list(ResourceKind::Tool))
            .filter(|r| r.owner_id() == owner_id)
            .collect();
        records.sort_by(|a, b| (a.kind() as u8, a.name()).cmp(&(b.kind() as u8, b.name())));
        records
    }

    /// Count cookbooks.
    pub fn count_cookbooks(&self) -> usize {
        self.cookbooks.read().len()
    }

    /// Count tools.
    pub fn count_tools(&self) -> usize {
        self.tools.read().len()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
