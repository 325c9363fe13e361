//! Thread-safe in-memory storage for groups, memberships, and
//! collaborator grants.
//!
//! Two stores live here. [`MembershipStore`] holds groups and their
//! memberships; [`CollaborationStore`] holds per-user grants on
//! resources and uses the membership store to expand groups into
//! individual grants. Both are cheap-clone handles over shared state.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use pantry_types::{ResourceRef, UserId};

use crate::collaborator::{Collaborator, CollaboratorId, CollaboratorOrigin};
use crate::error::{AuthError, Result};
use crate::group::{Group, GroupId, Membership, MembershipId};

/// Storage for groups and group memberships.
#[derive(Debug, Clone)]
pub struct MembershipStore {
    /// Groups by ID.
    groups: Arc<RwLock<HashMap<GroupId, Group>>>,
    /// Group name to ID index.
    group_name_index: Arc<RwLock<HashMap<String, GroupId>>>,
    /// Memberships by ID.
    memberships: Arc<RwLock<HashMap<MembershipId, Membership>>>,
    /// (group, user) to membership ID index.
    member_index: Arc<RwLock<HashMap<(GroupId, UserId), MembershipId>>>,
    /// Membership IDs per group, in creation order.
    group_members: Arc<RwLock<HashMap<GroupId, Vec<MembershipId>>>>,
    /// Next group ID.
    next_group_id: Arc<AtomicU64>,
    /// Next membership ID.
    next_membership_id: Arc<AtomicU64>,
}

impl Default for MembershipStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MembershipStore {
    /// Create a new membership store.
    pub fn new() -> Self {
        Self {
            groups: Arc::new(RwLock::new(HashMap::new())),
            group_name_index: Arc::new(RwLock::new(HashMap::new())),
            memberships: Arc::new(RwLock::new(HashMap::new())),
            member_index: Arc::new(RwLock::new(HashMap::new())),
            group_members: Arc::new(RwLock::new(HashMap::new())),
            next_group_id: Arc::new(AtomicU64::new(1)),
            next_membership_id: Arc::new(AtomicU64::new(1)),
        }
    }

    // ==================== Groups ====================

    /// Create a new group. The creator becomes an admin member.
    pub fn create_group(&self, name: String, creator: UserId) -> Result<Group> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AuthError::InvalidInput(
                "group name cannot be empty".to_string(),
            ));
        }
        if name.len() > 100 {
            return Err(AuthError::InvalidInput(
                "group name must be 100 characters or less".to_string(),
            ));
        }

        let mut groups = self.groups.write();
        let mut name_index = self.group_name_index.write();

        if name_index.contains_key(&name) {
            return Err(AuthError::AlreadyExists(format!("group '{}'", name)));
        }

        let id = self.next_group_id.fetch_add(1, Ordering::SeqCst);
        let group = Group::new(id, name.clone(), creator);

        name_index.insert(name, id);
        groups.insert(id, group.clone());
        drop(name_index);
        drop(groups);

        self.insert_membership(id, creator, true);

        Ok(group)
    }

    /// Get a group by ID.
    pub fn get_group(&self, id: GroupId) -> Option<Group> {
        self.groups.read().get(&id).cloned()
    }

    /// Get a group by name.
    pub fn get_group_by_name(&self, name: &str) -> Option<Group> {
        let name_index = self.group_name_index.read();
        let id = name_index.get(name)?;
        self.groups.read().get(id).cloned()
    }

    /// List all groups, sorted by name.
    pub fn list_groups(&self) -> Vec<Group> {
        let mut groups: Vec<Group> = self.groups.read().values().cloned().collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        groups
    }

    /// Groups a user belongs to, sorted by name.
    pub fn groups_for_user(&self, user_id: UserId) -> Vec<Group> {
        let memberships = self.memberships.read();
        let groups = self.groups.read();
        let mut result: Vec<Group> = memberships
            .values()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| groups.get(&m.group_id).cloned())
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        result
    }

    /// Delete a group and cascade-delete its memberships.
    pub fn delete_group(&self, group_id: GroupId) -> Result<Group> {
        let mut groups = self.groups.write();
        let mut name_index = self.group_name_index.write();
        let mut memberships = self.memberships.write();
        let mut member_index = self.member_index.write();
        let mut group_members = self.group_members.write();

        let group = groups
            .remove(&group_id)
            .ok_or_else(|| AuthError::NotFound(format!("group {}", group_id)))?;
        name_index.remove(&group.name);

        if let Some(ids) = group_members.remove(&group_id) {
            for id in ids {
                if let Some(membership) = memberships.remove(&id) {
                    member_index.remove(&(membership.group_id, membership.user_id));
                }
            }
        }

        Ok(group)
    }

    // ==================== Memberships ====================

    /// Add a user to a group as a non-admin member.
    pub fn add_member(&self, group_id: GroupId, user_id: UserId) -> Result<Membership> {
        if !self.groups.read().contains_key(&group_id) {
            return Err(AuthError::NotFound(format!("group {}", group_id)));
        }
        if self.member_index.read().contains_key(&(group_id, user_id)) {
            return Err(AuthError::AlreadyMember(format!(
                "user {} is already a member of group {}",
                user_id, group_id
            )));
        }
        Ok(self.insert_membership(group_id, user_id, false))
    }

    fn insert_membership(&self, group_id: GroupId, user_id: UserId, admin: bool) -> Membership {
        let mut memberships = self.memberships.write();
        let mut member_index = self.member_index.write();
        let mut group_members = self.group_members.write();

        let id = self.next_membership_id.fetch_add(1, Ordering::SeqCst);
        let membership = Membership::new(id, group_id, user_id, admin);

        member_index.insert((group_id, user_id), id);
        group_members.entry(group_id).or_default().push(id);
        memberships.insert(id, membership.clone());

        membership
    }

    /// Get a membership by ID.
    pub fn get(&self, membership_id: MembershipId) -> Option<Membership> {
        self.memberships.read().get(&membership_id).cloned()
    }

    /// Find the membership for a (group, user) pair.
    pub fn find(&self, group_id: GroupId, user_id: UserId) -> Option<Membership> {
        let member_index = self.member_index.read();
        let id = member_index.get(&(group_id, user_id))?;
        self.memberships.read().get(id).cloned()
    }

    /// Memberships of a group, in creation order.
    pub fn members_of(&self, group_id: GroupId) -> Vec<Membership> {
        let group_members = self.group_members.read();
        let memberships = self.memberships.read();
        group_members
            .get(&group_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| memberships.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Make the member an admin. Idempotent.
    pub fn promote(&self, membership_id: MembershipId) -> Result<Membership> {
        let mut memberships = self.memberships.write();
        let membership = memberships
            .get_mut(&membership_id)
            .ok_or_else(|| AuthError::NotFound(format!("membership {}", membership_id)))?;
        membership.admin = true;
        Ok(membership.clone())
    }

    /// Strip the member's admin flag.
    pub fn demote(&self, membership_id: MembershipId) -> Result<Membership> {
        let mut memberships = self.memberships.write();
        let membership = memberships
            .get_mut(&membership_id)
            .ok_or_else(|| AuthError::NotFound(format!("membership {}", membership_id)))?;
        membership.admin = false;
        Ok(membership.clone())
    }

    /// Delete a membership.
    pub fn remove(&self, membership_id: MembershipId) -> Result<Membership> {
        let mut memberships = self.memberships.write();
        let mut member_index = self.member_index.write();
        let mut group_members = self.group_members.write();

        let membership = memberships
            .remove(&membership_id)
            .ok_or_else(|| AuthError::NotFound(format!("membership {}", membership_id)))?;
        member_index.remove(&(membership.group_id, membership.user_id));
        if let Some(ids) = group_members.get_mut(&membership.group_id) {
            ids.retain(|id| *id != membership_id);
        }

        Ok(membership)
    }

    /// Whether the user holds an admin membership in the group.
    pub fn is_admin(&self, group_id: GroupId, user_id: UserId) -> bool {
        let member_index = self.member_index.read();
        match member_index.get(&(group_id, user_id)) {
            Some(id) => self
                .memberships
                .read()
                .get(id)
                .map(|m| m.admin)
                .unwrap_or(false),
            None => false,
        }
    }
}

/// Storage for collaborator grants on resources.
#[derive(Debug, Clone)]
pub struct CollaborationStore {
    /// Membership store used to expand groups into per-user grants.
    memberships: MembershipStore,
    /// Grants by ID.
    collaborators: Arc<RwLock<HashMap<CollaboratorId, Collaborator>>>,
    /// (resource, user) to grant ID index.
    grant_index: Arc<RwLock<HashMap<(ResourceRef, UserId), CollaboratorId>>>,
    /// Grant IDs per resource, in creation order.
    resource_grants: Arc<RwLock<HashMap<ResourceRef, Vec<CollaboratorId>>>>,
    /// Groups expanded onto each resource, in expansion order.
    resource_groups: Arc<RwLock<HashMap<ResourceRef, Vec<GroupId>>>>,
    /// Next grant ID.
    next_id: Arc<AtomicU64>,
}

impl CollaborationStore {
    /// Create a new collaboration store over the given memberships.
    pub fn new(memberships: MembershipStore) -> Self {
        Self {
            memberships,
            collaborators: Arc::new(RwLock::new(HashMap::new())),
            grant_index: Arc::new(RwLock::new(HashMap::new())),
            resource_grants: Arc::new(RwLock::new(HashMap::new())),
            resource_groups: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    // ==================== Grants ====================

    /// Grant collaboration on a resource directly to a user.
    pub fn grant_to_user(
        &self,
        resource: ResourceRef,
        user_id: UserId,
        added_by: UserId,
    ) -> Result<Collaborator> {
        self.grant(resource, user_id, CollaboratorOrigin::Direct, added_by)
    }

    /// Expand a group onto a resource: one grant per current member,
    /// in membership-creation order.
    ///
    /// Members who already collaborate (any origin) are skipped, so
    /// re-expanding a group never creates duplicates and never
    /// re-tags an existing direct grant. Returns only the grants this
    /// call created.
    pub fn grant_to_group_members(
        &self,
        resource: ResourceRef,
        group_id: GroupId,
        added_by: UserId,
    ) -> Result<Vec<Collaborator>> {
        if self.memberships.get_group(group_id).is_none() {
            return Err(AuthError::NotFound(format!("group {}", group_id)));
        }

        let mut created = Vec::new();
        for membership in self.memberships.members_of(group_id) {
            match self.grant(
                resource,
                membership.user_id,
                CollaboratorOrigin::Group(group_id),
                added_by,
            ) {
                Ok(grant) => created.push(grant),
                Err(AuthError::AlreadyCollaborator(_)) => {}
                Err(e) => return Err(e),
            }
        }

        let mut resource_groups = self.resource_groups.write();
        let groups = resource_groups.entry(resource).or_default();
        if !groups.contains(&group_id) {
            groups.push(group_id);
        }

        Ok(created)
    }

    fn grant(
        &self,
        resource: ResourceRef,
        user_id: UserId,
        origin: CollaboratorOrigin,
        added_by: UserId,
    ) -> Result<Collaborator> {
        let mut collaborators = self.collaborators.write();
        let mut grant_index = self.grant_index.write();
        let mut resource_grants = self.resource_grants.write();

        if grant_index.contains_key(&(resource, user_id)) {
            return Err(AuthError::AlreadyCollaborator(format!(
                "user {} already collaborates on {}",
                user_id, resource
            )));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let collaborator = Collaborator::new(id, resource, user_id, origin, added_by);

        grant_index.insert((resource, user_id), id);
        resource_grants.entry(resource).or_default().push(id);
        collaborators.insert(id, collaborator.clone());

        Ok(collaborator)
    }

    /// Delete a grant.
    pub fn revoke(&self, id: CollaboratorId) -> Result<Collaborator> {
        let mut collaborators = self.collaborators.write();
        let mut grant_index = self.grant_index.write();
        let mut resource_grants = self.resource_grants.write();

        let collaborator = collaborators
            .remove(&id)
            .ok_or_else(|| AuthError::NotFound(format!("collaborator {}", id)))?;
        grant_index.remove(&(collaborator.resource, collaborator.user_id));
        if let Some(ids) = resource_grants.get_mut(&collaborator.resource) {
            ids.retain(|gid| *gid != id);
        }

        Ok(collaborator)
    }

    /// Delete every grant on the resource that the given group's
    /// expansion produced, and unlink the group from the resource.
    ///
    /// Direct grants are never touched, even when the user is also a
    /// member of the group.
    pub fn revoke_all_for_group(
        &self,
        resource: ResourceRef,
        group_id: GroupId,
    ) -> Vec<Collaborator> {
        let derived: Vec<CollaboratorId> = self
            .find_for_resource(resource)
            .iter()
            .filter(|c| c.origin == CollaboratorOrigin::Group(group_id))
            .map(|c| c.id)
            .collect();

        let mut removed = Vec::new();
        for id in derived {
            if let Ok(collaborator) = self.revoke(id) {
                removed.push(collaborator);
            }
        }

        let mut resource_groups = self.resource_groups.write();
        if let Some(groups) = resource_groups.get_mut(&resource) {
            groups.retain(|g| *g != group_id);
        }

        removed
    }

    /// Delete every grant the group's expansions produced on any
    /// resource. Used when the group itself is deleted.
    pub fn revoke_group_grants(&self, group_id: GroupId) -> Vec<Collaborator> {
        let derived: Vec<CollaboratorId> = self
            .collaborators
            .read()
            .values()
            .filter(|c| c.origin == CollaboratorOrigin::Group(group_id))
            .map(|c| c.id)
            .collect();

        let mut removed = Vec::new();
        for id in derived {
            if let Ok(collaborator) = self.revoke(id) {
                removed.push(collaborator);
            }
        }

        let mut resource_groups = self.resource_groups.write();
        for groups in resource_groups.values_mut() {
            groups.retain(|g| *g != group_id);
        }

        removed
    }

    // ==================== Lookups ====================

    /// Get a grant by ID.
    pub fn get(&self, id: CollaboratorId) -> Option<Collaborator> {
        self.collaborators.read().get(&id).cloned()
    }

    /// Find the grant for a (resource, user) pair.
    pub fn find(&self, resource: ResourceRef, user_id: UserId) -> Option<Collaborator> {
        let grant_index = self.grant_index.read();
        let id = grant_index.get(&(resource, user_id))?;
        self.collaborators.read().get(id).cloned()
    }

    /// All grants on a resource, in creation order.
    pub fn find_for_resource(&self, resource: ResourceRef) -> Vec<Collaborator> {
        let resource_grants = self.resource_grants.read();
        let collaborators = self.collaborators.read();
        resource_grants
            .get(&resource)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| collaborators.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Groups currently expanded onto a resource, in expansion order.
    pub fn groups_for_resource(&self, resource: ResourceRef) -> Vec<GroupId> {
        self.resource_groups
            .read()
            .get(&resource)
            .cloned()
            .unwrap_or_default()
    }

    /// Count grants.
    pub fn count(&self) -> usize {
        self.collaborators.read().len()
    }
}
