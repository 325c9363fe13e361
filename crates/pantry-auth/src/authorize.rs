//! Authorization decisions for collaboration and group management.
//!
//! Every rule that gates a mutation lives here, so the HTTP layer and
//! the service cannot drift apart. Checks are pure reads; the acting
//! user is always an explicit parameter, never ambient state.

use pantry_registry::ResourceStore;
use pantry_types::{ResourceRef, UserId};

use crate::collaborator::{Collaborator, CollaboratorOrigin};
use crate::group::GroupId;
use crate::store::{CollaborationStore, MembershipStore};

/// Decides who may do what.
#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    memberships: MembershipStore,
    collaborations: CollaborationStore,
    resources: ResourceStore,
}

impl AuthorizationGate {
    /// Create a gate over the given stores.
    pub fn new(
        memberships: MembershipStore,
        collaborations: CollaborationStore,
        resources: ResourceStore,
    ) -> Self {
        Self {
            memberships,
            collaborations,
            resources,
        }
    }

    /// Whether the actor currently owns the resource.
    pub fn is_owner(&self, actor: UserId, resource: ResourceRef) -> bool {
        self.resources.owner_of(resource) == Some(actor)
    }

    /// A grant may be removed by the resource's owner, by the
    /// collaborating user themself, or, for a group-derived grant, by
    /// an admin member of that group.
    pub fn can_remove_collaborator(&self, actor: UserId, collaborator: &Collaborator) -> bool {
        if collaborator.user_id == actor || self.is_owner(actor, collaborator.resource) {
            return true;
        }
        match collaborator.origin {
            CollaboratorOrigin::Group(group_id) => self.memberships.is_admin(group_id, actor),
            CollaboratorOrigin::Direct => false,
        }
    }

    /// Collaborators may be added by the owner or by anyone who
    /// already collaborates on the resource.
    pub fn can_add_collaborators(&self, actor: UserId, resource: ResourceRef) -> bool {
        self.is_owner(actor, resource) || self.collaborations.find(resource, actor).is_some()
    }

    /// Admin-only group actions (promote, demote, remove another
    /// member). Self-removal is not an admin action and is checked by
    /// the service.
    pub fn can_manage_group(&self, actor: UserId, group_id: GroupId) -> bool {
        self.memberships.is_admin(group_id, actor)
    }

    /// Only the current owner may transfer ownership.
    pub fn can_transfer(&self, actor: UserId, resource: ResourceRef) -> bool {
        self.is_owner(actor, resource)
    }
}
