//! Collaborator grant types.

use pantry_types::{ResourceRef, UserId};
use serde::{Deserialize, Serialize};

use crate::group::GroupId;

/// Unique identifier for a collaborator grant.
pub type CollaboratorId = u64;

/// Where a grant came from.
///
/// Grants created by expanding a group are tagged with that group, so
/// removing the group from a resource removes exactly the grants the
/// expansion produced and never an independently granted direct
/// collaboration. Expansion happens at grant time: users added to the
/// group later hold no grant until the group is expanded again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollaboratorOrigin {
    /// Granted directly to the user.
    Direct,
    /// Created by expanding the given group onto the resource.
    Group(GroupId),
}

impl CollaboratorOrigin {
    /// The originating group, if any.
    pub fn group_id(&self) -> Option<GroupId> {
        match self {
            CollaboratorOrigin::Direct => None,
            CollaboratorOrigin::Group(id) => Some(*id),
        }
    }

    /// Whether this is a direct grant.
    pub fn is_direct(&self) -> bool {
        matches!(self, CollaboratorOrigin::Direct)
    }
}

/// A collaborator grant on a resource.
///
/// Grants edit rights on one resource to one user. The resource's
/// owner never needs a grant; ownership implies full rights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collaborator {
    /// Unique collaborator ID.
    pub id: CollaboratorId,
    /// The resource collaborated on.
    pub resource: ResourceRef,
    /// The collaborating user.
    pub user_id: UserId,
    /// Direct grant or group expansion.
    pub origin: CollaboratorOrigin,
    /// Who added this collaborator.
    pub added_by: UserId,
    /// When the collaborator was added (Unix timestamp).
    pub created_at: u64,
}

impl Collaborator {
    /// Create a new collaborator grant.
    pub fn new(
        id: CollaboratorId,
        resource: ResourceRef,
        user_id: UserId,
        origin: CollaboratorOrigin,
        added_by: UserId,
    ) -> Self {
        Self {
            id,
            resource,
            user_id,
            origin,
            added_by,
            created_at: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_accessors() {
        assert!(CollaboratorOrigin::Direct.is_direct());
        assert_eq!(CollaboratorOrigin::Direct.group_id(), None);

        let from_group = CollaboratorOrigin::Group(9);
        assert!(!from_group.is_direct());
        assert_eq!(from_group.group_id(), Some(9));
    }

    #[test]
    fn test_collaborator_creation() {
        let grant = Collaborator::new(
            1,
            ResourceRef::cookbook(5),
            3,
            CollaboratorOrigin::Direct,
            2,
        );
        assert_eq!(grant.resource, ResourceRef::cookbook(5));
        assert_eq!(grant.user_id, 3);
        assert_eq!(grant.added_by, 2);
        assert!(grant.origin.is_direct());
    }
}
