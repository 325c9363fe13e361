//! Collaboration service: authorized, orchestrated mutations.
//!
//! Handlers talk to this type. It resolves records, consults the
//! [`AuthorizationGate`], serializes mutations per resource, and
//! translates store-level failures into per-item reports for batch
//! operations.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use pantry_registry::{ResourceRecord, ResourceStore, UserStore};
use pantry_types::{ResourceRef, User, UserId};

use crate::authorize::AuthorizationGate;
use crate::collaborator::{Collaborator, CollaboratorId};
use crate::error::{AuthError, Result};
use crate::group::{Group, GroupId, Membership, MembershipId};
use crate::store::{CollaborationStore, MembershipStore};

/// Maximum number of candidates returned by a collaborator search.
pub const SEARCH_LIMIT: usize = 20;

/// What a failed batch item refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchSubject {
    /// A user id from the request.
    User(UserId),
    /// A group id from the request.
    Group(GroupId),
}

/// One failed item from a batch add.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFailure {
    /// The id that failed.
    pub subject: BatchSubject,
    /// Why it failed.
    pub reason: String,
}

/// Result of a batch add: the grants created and the items skipped.
///
/// Items are processed independently; one bad id never aborts the
/// rest of the batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Grants created by this call.
    pub added: Vec<Collaborator>,
    /// Items that could not be granted.
    pub failures: Vec<BatchFailure>,
}

impl BatchOutcome {
    /// Whether every item succeeded.
    pub fn all_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A completed ownership transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnershipTransfer {
    /// The resource with its new owner applied.
    pub resource: ResourceRecord,
    /// The outgoing owner.
    pub prior_owner: UserId,
    /// The incoming owner.
    pub new_owner: UserId,
    /// The grant that keeps the outgoing owner on the resource.
    pub demotion: Collaborator,
}

/// Orchestrates collaborator and group-membership mutations.
#[derive(Debug, Clone)]
pub struct CollaborationService {
    users: UserStore,
    resources: ResourceStore,
    memberships: MembershipStore,
    collaborations: CollaborationStore,
    gate: AuthorizationGate,
    /// One mutex per resource, created on first use. Multi-step
    /// mutations (transfer, batch grants) hold it so no interleaving
    /// can observe a resource with zero or two owners.
    resource_locks: Arc<Mutex<HashMap<ResourceRef, Arc<Mutex<()>>>>>,
}

impl CollaborationService {
    /// Wire up a service over the given stores.
    pub fn new(
        users: UserStore,
        resources: ResourceStore,
        memberships: MembershipStore,
        collaborations: CollaborationStore,
    ) -> Self {
        let gate = AuthorizationGate::new(
            memberships.clone(),
            collaborations.clone(),
            resources.clone(),
        );
        Self {
            users,
            resources,
            memberships,
            collaborations,
            gate,
            resource_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The gate the service enforces, for read-only checks elsewhere.
    pub fn gate(&self) -> &AuthorizationGate {
        &self.gate
    }

    fn lock_for(&self, resource: ResourceRef) -> Arc<Mutex<()>> {
        let mut locks = self.resource_locks.lock();
        locks.entry(resource).or_default().clone()
    }

    // ==================== Collaborators ====================

    /// Search for collaborator candidates by username fragment.
    ///
    /// Callers pass the ids that must not appear (the owner, existing
    /// collaborators). Ranking is exact match, then prefix, then
    /// substring, alphabetical within each bucket.
    pub fn search_collaborators(&self, query: &str, exclude: &[UserId]) -> Vec<User> {
        self.users.search(query, exclude, SEARCH_LIMIT)
    }

    /// Add users and expanded groups as collaborators on a resource.
    pub fn add_collaborators(
        &self,
        actor: UserId,
        resource: ResourceRef,
        user_ids: &[UserId],
        group_ids: &[GroupId],
    ) -> Result<BatchOutcome> {
        if self.resources.get(resource).is_none() {
            return Err(AuthError::NotFound(resource.to_string()));
        }
        if !self.gate.can_add_collaborators(actor, resource) {
            return Err(AuthError::Forbidden(format!(
                "you may not add collaborators to this {}",
                resource.kind
            )));
        }

        let lock = self.lock_for(resource);
        let _guard = lock.lock();

        let mut outcome = BatchOutcome::default();

        for &user_id in user_ids {
            if self.users.get(user_id).is_none() {
                outcome.failures.push(BatchFailure {
                    subject: BatchSubject::User(user_id),
                    reason: format!("user {} not found", user_id),
                });
                continue;
            }
            if self.resources.owner_of(resource) == Some(user_id) {
                outcome.failures.push(BatchFailure {
                    subject: BatchSubject::User(user_id),
                    reason: format!("user {} already owns this {}", user_id, resource.kind),
                });
                continue;
            }
            match self.collaborations.grant_to_user(resource, user_id, actor) {
                Ok(grant) => outcome.added.push(grant),
                Err(e) => outcome.failures.push(BatchFailure {
                    subject: BatchSubject::User(user_id),
                    reason: e.to_string(),
                }),
            }
        }

        for &group_id in group_ids {
            match self
                .collaborations
                .grant_to_group_members(resource, group_id, actor)
            {
                Ok(mut created) => outcome.added.append(&mut created),
                Err(e) => outcome.failures.push(BatchFailure {
                    subject: BatchSubject::Group(group_id),
                    reason: e.to_string(),
                }),
            }
        }

        Ok(outcome)
    }

    /// Remove a single collaborator grant.
    pub fn remove_collaborator(
        &self,
        actor: UserId,
        collaborator_id: CollaboratorId,
    ) -> Result<Collaborator> {
        let collaborator = self
            .collaborations
            .get(collaborator_id)
            .ok_or_else(|| AuthError::NotFound(format!("collaborator {}", collaborator_id)))?;
        if !self.gate.can_remove_collaborator(actor, &collaborator) {
            return Err(AuthError::Forbidden(
                "you may not remove this collaborator".to_string(),
            ));
        }

        let lock = self.lock_for(collaborator.resource);
        let _guard = lock.lock();
        self.collaborations.revoke(collaborator_id)
    }

    /// Remove every grant a group's expansion produced on a resource
    /// and unlink the group.
    pub fn remove_group_collaborators(
        &self,
        actor: UserId,
        resource: ResourceRef,
        group_id: GroupId,
    ) -> Result<Vec<Collaborator>> {
        if self.resources.get(resource).is_none() {
            return Err(AuthError::NotFound(resource.to_string()));
        }
        let group = self
            .memberships
            .get_group(group_id)
            .ok_or_else(|| AuthError::NotFound(format!("group {}", group_id)))?;
        if !self.gate.is_owner(actor, resource) && !self.gate.can_manage_group(actor, group_id) {
            return Err(AuthError::Forbidden(format!(
                "you may not remove the group '{}' from this {}",
                group.name, resource.kind
            )));
        }

        let lock = self.lock_for(resource);
        let _guard = lock.lock();
        Ok(self.collaborations.revoke_all_for_group(resource, group_id))
    }

    /// Transfer ownership of the grant's resource to the grant's user.
    ///
    /// The incoming owner's grant is consumed and the outgoing owner
    /// is demoted to a direct collaborator. The three steps run under
    /// the resource lock, so the resource always has exactly one
    /// owner no matter how transfers race.
    pub fn transfer_ownership(
        &self,
        actor: UserId,
        collaborator_id: CollaboratorId,
    ) -> Result<OwnershipTransfer> {
        let collaborator = self
            .collaborations
            .get(collaborator_id)
            .ok_or_else(|| AuthError::NotFound(format!("collaborator {}", collaborator_id)))?;
        let resource = collaborator.resource;

        let lock = self.lock_for(resource);
        let _guard = lock.lock();

        // Re-read under the lock; a concurrent transfer may have
        // consumed the grant already.
        let collaborator = self
            .collaborations
            .get(collaborator_id)
            .ok_or_else(|| AuthError::NotFound(format!("collaborator {}", collaborator_id)))?;

        if !collaborator.origin.is_direct() {
            return Err(AuthError::InvalidInput(
                "ownership cannot be transferred to a group-derived collaborator".to_string(),
            ));
        }

        let prior_owner = self
            .resources
            .owner_of(resource)
            .ok_or_else(|| AuthError::NotFound(resource.to_string()))?;
        if collaborator.user_id == prior_owner {
            return Err(AuthError::InvalidInput(format!(
                "user {} already owns this {}",
                collaborator.user_id, resource.kind
            )));
        }
        if !self.gate.can_transfer(actor, resource) {
            return Err(AuthError::Forbidden(
                "only the owner may transfer ownership".to_string(),
            ));
        }

        let record = self.resources.set_owner(resource, collaborator.user_id)?;
        self.collaborations.revoke(collaborator.id)?;
        let demotion = match self.collaborations.find(resource, prior_owner) {
            Some(existing) => existing,
            None => self
                .collaborations
                .grant_to_user(resource, prior_owner, actor)?,
        };

        Ok(OwnershipTransfer {
            resource: record,
            prior_owner,
            new_owner: collaborator.user_id,
            demotion,
        })
    }

    // ==================== Groups ====================

    /// Create a group; the actor becomes its first admin member.
    pub fn create_group(&self, actor: UserId, name: String) -> Result<Group> {
        self.memberships.create_group(name, actor)
    }

    /// Add a user to a group. Any signed-in user may do this.
    pub fn add_group_member(&self, group_id: GroupId, user_id: UserId) -> Result<Membership> {
        if self.users.get(user_id).is_none() {
            return Err(AuthError::NotFound(format!("user {}", user_id)));
        }
        self.memberships.add_member(group_id, user_id)
    }

    /// Grant the admin flag to a member. Admins only.
    pub fn make_group_admin(
        &self,
        actor: UserId,
        membership_id: MembershipId,
    ) -> Result<Membership> {
        let membership = self.membership(membership_id)?;
        self.require_group_admin(actor, membership.group_id)?;
        self.memberships.promote(membership_id)
    }

    /// Strip the admin flag from a member. Admins only.
    pub fn revoke_group_admin(
        &self,
        actor: UserId,
        membership_id: MembershipId,
    ) -> Result<Membership> {
        let membership = self.membership(membership_id)?;
        self.require_group_admin(actor, membership.group_id)?;
        self.memberships.demote(membership_id)
    }

    /// Remove a member. Admins may remove anyone; everyone may remove
    /// themself (leave the group).
    pub fn remove_group_member(
        &self,
        actor: UserId,
        membership_id: MembershipId,
    ) -> Result<Membership> {
        let membership = self.membership(membership_id)?;
        if membership.user_id != actor {
            self.require_group_admin(actor, membership.group_id)?;
        }
        self.memberships.remove(membership_id)
    }

    /// Delete a group, its memberships, and every grant its
    /// expansions produced. Admins only.
    pub fn delete_group(&self, actor: UserId, group_id: GroupId) -> Result<Group> {
        if self.memberships.get_group(group_id).is_none() {
            return Err(AuthError::NotFound(format!("group {}", group_id)));
        }
        self.require_group_admin(actor, group_id)?;
        self.collaborations.revoke_group_grants(group_id);
        self.memberships.delete_group(group_id)
    }

    fn membership(&self, membership_id: MembershipId) -> Result<Membership> {
        self.memberships
            .get(membership_id)
            .ok_or_else(|| AuthError::NotFound(format!("membership {}", membership_id)))
    }

    fn require_group_admin(&self, actor: UserId, group_id: GroupId) -> Result<()> {
        if self.gate.can_manage_group(actor, group_id) {
            Ok(())
        } else {
            Err(AuthError::Forbidden(
                "you must be an admin member of the group to do that".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pantry_types::ResourceKind;
    use pretty_assertions::assert_eq;

    struct Fixture {
        service: CollaborationService,
        users: UserStore,
        resources: ResourceStore,
        memberships: MembershipStore,
        collaborations: CollaborationStore,
        owner: UserId,
        resource: ResourceRef,
    }

    fn fixture() -> Fixture {
        let users = UserStore::new();
        let resources = ResourceStore::new();
        let memberships = MembershipStore::new();
        let collaborations = CollaborationStore::new(memberships.clone());
        let service = CollaborationService::new(
            users.clone(),
            resources.clone(),
            memberships.clone(),
            collaborations.clone(),
        );

        let owner = users.create("owner".to_string()).unwrap().id;
        let cookbook = resources
            .create_cookbook("bread".to_string(), owner, None)
            .unwrap();

        Fixture {
            service,
            users,
            resources,
            memberships,
            collaborations,
            owner,
            resource: ResourceRef::cookbook(cookbook.id),
        }
    }

    fn user(f: &Fixture, name: &str) -> UserId {
        f.users.create(name.to_string()).unwrap().id
    }

    #[test]
    fn test_add_collaborators_batch() {
        let f = fixture();
        let alice = user(&f, "alice");
        let bob = user(&f, "bob");

        let outcome = f
            .service
            .add_collaborators(f.owner, f.resource, &[alice, bob], &[])
            .unwrap();
        assert!(outcome.all_ok());
        assert_eq!(outcome.added.len(), 2);
        assert_eq!(f.collaborations.find_for_resource(f.resource).len(), 2);
    }

    #[test]
    fn test_add_collaborators_collects_failures() {
        let f = fixture();
        let alice = user(&f, "alice");
        f.collaborations
            .grant_to_user(f.resource, alice, f.owner)
            .unwrap();

        let before = f.collaborations.count();
        let outcome = f
            .service
            .add_collaborators(f.owner, f.resource, &[alice, 999, f.owner], &[777])
            .unwrap();

        // Nothing new was created, and every id got its own report.
        assert_eq!(f.collaborations.count(), before);
        assert!(outcome.added.is_empty());
        assert_eq!(outcome.failures.len(), 4);
        assert!(outcome.failures[0].reason.contains("already"));
        assert_eq!(outcome.failures[0].subject, BatchSubject::User(alice));
        assert_eq!(outcome.failures[3].subject, BatchSubject::Group(777));
    }

    #[test]
    fn test_add_collaborators_gated() {
        let f = fixture();
        let alice = user(&f, "alice");
        let mallory = user(&f, "mallory");

        assert!(matches!(
            f.service
                .add_collaborators(mallory, f.resource, &[alice], &[]),
            Err(AuthError::Forbidden(_))
        ));

        // An existing collaborator may add more people.
        f.collaborations
            .grant_to_user(f.resource, mallory, f.owner)
            .unwrap();
        let outcome = f
            .service
            .add_collaborators(mallory, f.resource, &[alice], &[])
            .unwrap();
        assert_eq!(outcome.added.len(), 1);
        assert_eq!(outcome.added[0].added_by, mallory);
    }

    #[test]
    fn test_add_collaborators_unknown_resource() {
        let f = fixture();
        assert!(matches!(
            f.service
                .add_collaborators(f.owner, ResourceRef::tool(999), &[], &[]),
            Err(AuthError::NotFound(_))
        ));
    }

    #[test]
    fn test_group_admin_removes_member_grant() {
        let f = fixture();
        let u1 = user(&f, "u1-admin");
        let u2 = user(&f, "u2-member");
        let group = f.memberships.create_group("bakers".to_string(), u1).unwrap();
        f.memberships.add_member(group.id, u2).unwrap();

        let outcome = f
            .service
            .add_collaborators(f.owner, f.resource, &[], &[group.id])
            .unwrap();
        assert_eq!(outcome.added.len(), 2);
        let u1_grant = f.collaborations.find(f.resource, u1).unwrap();
        let u2_grant = f.collaborations.find(f.resource, u2).unwrap();

        // The non-admin cannot remove the admin's grant.
        assert!(matches!(
            f.service.remove_collaborator(u2, u1_grant.id),
            Err(AuthError::Forbidden(_))
        ));

        // The admin can remove the member's grant; only theirs remains.
        f.service.remove_collaborator(u1, u2_grant.id).unwrap();
        let remaining: Vec<UserId> = f
            .collaborations
            .find_for_resource(f.resource)
            .into_iter()
            .map(|c| c.user_id)
            .collect();
        assert_eq!(remaining, vec![u1]);
    }

    #[test]
    fn test_remove_collaborator_self() {
        let f = fixture();
        let alice = user(&f, "alice");
        let grant = f
            .collaborations
            .grant_to_user(f.resource, alice, f.owner)
            .unwrap();

        f.service.remove_collaborator(alice, grant.id).unwrap();
        assert!(f.collaborations.find(f.resource, alice).is_none());
    }

    #[test]
    fn test_remove_group_collaborators_gated() {
        let f = fixture();
        let u1 = user(&f, "u1");
        let outsider = user(&f, "outsider");
        let group = f.memberships.create_group("bakers".to_string(), u1).unwrap();
        f.service
            .add_collaborators(f.owner, f.resource, &[], &[group.id])
            .unwrap();

        assert!(matches!(
            f.service
                .remove_group_collaborators(outsider, f.resource, group.id),
            Err(AuthError::Forbidden(_))
        ));

        let removed = f
            .service
            .remove_group_collaborators(f.owner, f.resource, group.id)
            .unwrap();
        assert_eq!(removed.len(), 1);
        assert!(f.collaborations.find_for_resource(f.resource).is_empty());
    }

    #[test]
    fn test_transfer_swaps_owner_and_grants() {
        let f = fixture();
        let carol = user(&f, "carol");
        let grant = f
            .collaborations
            .grant_to_user(f.resource, carol, f.owner)
            .unwrap();

        let transfer = f.service.transfer_ownership(f.owner, grant.id).unwrap();

        assert_eq!(transfer.prior_owner, f.owner);
        assert_eq!(transfer.new_owner, carol);
        assert_eq!(transfer.resource.owner_id(), carol);
        assert_eq!(f.resources.owner_of(f.resource), Some(carol));

        // The new owner holds no grant; the prior owner holds one.
        assert!(f.collaborations.find(f.resource, carol).is_none());
        let demoted = f.collaborations.find(f.resource, f.owner).unwrap();
        assert!(demoted.origin.is_direct());
        assert_eq!(demoted.id, transfer.demotion.id);
        assert_eq!(f.collaborations.find_for_resource(f.resource).len(), 1);
    }

    #[test]
    fn test_transfer_denied_for_non_owner() {
        let f = fixture();
        let carol = user(&f, "carol");
        let mallory = user(&f, "mallory");
        let grant = f
            .collaborations
            .grant_to_user(f.resource, carol, f.owner)
            .unwrap();

        assert!(matches!(
            f.service.transfer_ownership(mallory, grant.id),
            Err(AuthError::Forbidden(_))
        ));
        // Even the would-be recipient cannot pull ownership.
        assert!(matches!(
            f.service.transfer_ownership(carol, grant.id),
            Err(AuthError::Forbidden(_))
        ));
        assert_eq!(f.resources.owner_of(f.resource), Some(f.owner));
    }

    #[test]
    fn test_transfer_rejects_group_grant() {
        let f = fixture();
        let u1 = user(&f, "u1");
        let group = f.memberships.create_group("bakers".to_string(), u1).unwrap();
        let created = f
            .collaborations
            .grant_to_group_members(f.resource, group.id, f.owner)
            .unwrap();

        assert!(matches!(
            f.service.transfer_ownership(f.owner, created[0].id),
            Err(AuthError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_transfer_rejects_current_owner() {
        let f = fixture();
        // Force a grant for the owner, as a group expansion could.
        let grant = f
            .collaborations
            .grant_to_user(f.resource, f.owner, f.owner)
            .unwrap();

        assert!(matches!(
            f.service.transfer_ownership(f.owner, grant.id),
            Err(AuthError::InvalidInput(_))
        ));
        assert_eq!(f.resources.owner_of(f.resource), Some(f.owner));
    }

    #[test]
    fn test_transfer_missing_grant() {
        let f = fixture();
        assert!(matches!(
            f.service.transfer_ownership(f.owner, 999),
            Err(AuthError::NotFound(_))
        ));
    }

    #[test]
    fn test_transfer_chain_keeps_single_owner() {
        let f = fixture();
        let carol = user(&f, "carol");
        let grant = f
            .collaborations
            .grant_to_user(f.resource, carol, f.owner)
            .unwrap();

        // owner -> carol, then carol -> owner again.
        f.service.transfer_ownership(f.owner, grant.id).unwrap();
        let back = f.collaborations.find(f.resource, f.owner).unwrap();
        let transfer = f.service.transfer_ownership(carol, back.id).unwrap();

        assert_eq!(transfer.new_owner, f.owner);
        assert_eq!(f.resources.owner_of(f.resource), Some(f.owner));
        let grants = f.collaborations.find_for_resource(f.resource);
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].user_id, carol);
    }

    #[test]
    fn test_search_excludes_and_ranks() {
        let f = fixture();
        user(&f, "ann");
        user(&f, "anna");
        let joanna = user(&f, "joanna");

        let found: Vec<String> = f
            .service
            .search_collaborators("ann", &[joanna])
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(found, vec!["ann", "anna"]);
    }

    #[test]
    fn test_group_member_management() {
        let f = fixture();
        let founder = user(&f, "founder");
        let member = user(&f, "member");

        let group = f.service.create_group(founder, "bakers".to_string()).unwrap();
        assert!(f.memberships.is_admin(group.id, founder));

        let membership = f.service.add_group_member(group.id, member).unwrap();
        assert!(matches!(
            f.service.add_group_member(group.id, member),
            Err(AuthError::AlreadyMember(_))
        ));
        assert!(matches!(
            f.service.add_group_member(group.id, 999),
            Err(AuthError::NotFound(_))
        ));

        // Only admins may promote.
        assert!(matches!(
            f.service.make_group_admin(member, membership.id),
            Err(AuthError::Forbidden(_))
        ));
        let promoted = f.service.make_group_admin(founder, membership.id).unwrap();
        assert!(promoted.admin);

        let demoted = f.service.revoke_group_admin(founder, membership.id).unwrap();
        assert!(!demoted.admin);

        // Members may leave on their own; admins may remove anyone.
        f.service.remove_group_member(member, membership.id).unwrap();
        assert!(f.memberships.find(group.id, member).is_none());
    }

    #[test]
    fn test_remove_group_member_gated() {
        let f = fixture();
        let founder = user(&f, "founder");
        let member = user(&f, "member");
        let other = user(&f, "other");

        let group = f.service.create_group(founder, "bakers".to_string()).unwrap();
        let membership = f.service.add_group_member(group.id, member).unwrap();
        f.service.add_group_member(group.id, other).unwrap();

        assert!(matches!(
            f.service.remove_group_member(other, membership.id),
            Err(AuthError::Forbidden(_))
        ));
        f.service.remove_group_member(founder, membership.id).unwrap();
    }

    #[test]
    fn test_delete_group_drops_derived_grants() {
        let f = fixture();
        let founder = user(&f, "founder");
        let alice = user(&f, "alice");
        let group = f.service.create_group(founder, "bakers".to_string()).unwrap();
        f.service
            .add_collaborators(f.owner, f.resource, &[alice], &[group.id])
            .unwrap();
        assert_eq!(f.collaborations.find_for_resource(f.resource).len(), 2);

        assert!(matches!(
            f.service.delete_group(alice, group.id),
            Err(AuthError::Forbidden(_))
        ));
        f.service.delete_group(founder, group.id).unwrap();

        // The direct grant survives the group.
        let remaining: Vec<UserId> = f
            .collaborations
            .find_for_resource(f.resource)
            .into_iter()
            .map(|c| c.user_id)
            .collect();
        assert_eq!(remaining, vec![alice]);
        assert!(f.memberships.get_group(group.id).is_none());
    }

    #[test]
    fn test_kind_in_messages() {
        let f = fixture();
        let mallory = user(&f, "mallory");
        let err = f
            .service
            .add_collaborators(mallory, f.resource, &[], &[])
            .unwrap_err();
        assert!(err.to_string().contains(&ResourceKind::Cookbook.to_string()));
    }
}
