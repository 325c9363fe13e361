//! Group and membership types.

use pantry_types::UserId;
use serde::{Deserialize, Serialize};

/// Unique identifier for a group.
pub type GroupId = u64;

/// Unique identifier for a group membership.
pub type MembershipId = u64;

/// A named collection of users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Unique group ID.
    pub id: GroupId,
    /// Group name (unique).
    pub name: String,
    /// Who created this group.
    pub created_by: UserId,
    /// When the group was created (Unix timestamp).
    pub created_at: u64,
    /// When the group was last updated (Unix timestamp).
    pub updated_at: u64,
}

impl Group {
    /// Create a new group.
    pub fn new(id: GroupId, name: String, created_by: UserId) -> Self {
        let now = now_secs();
        Self {
            id,
            name,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A user's membership in a group.
///
/// At most one membership exists per (group, user) pair. The record is
/// only ever mutated to flip the admin flag; leaving a group deletes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    /// Unique membership ID.
    pub id: MembershipId,
    /// The group.
    pub group_id: GroupId,
    /// The member.
    pub user_id: UserId,
    /// Whether the member administers the group.
    pub admin: bool,
    /// When the membership was created (Unix timestamp).
    pub created_at: u64,
}

impl Membership {
    /// Create a new membership.
    pub fn new(id: MembershipId, group_id: GroupId, user_id: UserId, admin: bool) -> Self {
        Self {
            id,
            group_id,
            user_id,
            admin,
            created_at: now_secs(),
        }
    }
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
