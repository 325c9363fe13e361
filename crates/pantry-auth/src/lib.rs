//! Authorization and collaboration for Pantry.
//!
//! This crate provides:
//! - **Groups**: Named collections of users with per-member admin flags
//! - **Memberships**: Who belongs to which group
//! - **Collaborators**: Per-user grants on cookbooks and tools, direct or group-derived
//! - **Authorization**: Owner, self, and group-admin decision rules in one gate
//! - **Collaboration service**: Batch adds, gated removals, atomic ownership transfer
//!
//! # Example
//!
//! ```
//! use pantry_auth::{CollaborationService, CollaborationStore, MembershipStore};
//! use pantry_registry::{ResourceStore, UserStore};
//! use pantry_types::ResourceRef;
//!
//! let users = UserStore::new();
//! let resources = ResourceStore::new();
//! let memberships = MembershipStore::new();
//! let collaborations = CollaborationStore::new(memberships.clone());
//! let service = CollaborationService::new(
//!     users.clone(),
//!     resources.clone(),
//!     memberships,
//!     collaborations,
//! );
//!
//! // An owner shares their cookbook with a collaborator.
//! let marie = users.create("marie".into()).unwrap();
//! let sous = users.create("sous-chef".into()).unwrap();
//! let cookbook = resources
//!     .create_cookbook("bread".into(), marie.id, None)
//!     .unwrap();
//!
//! let outcome = service
//!     .add_collaborators(marie.id, ResourceRef::cookbook(cookbook.id), &[sous.id], &[])
//!     .unwrap();
//! assert_eq!(outcome.added.len(), 1);
//!
//! // And later hands the cookbook over, keeping edit access.
//! let transfer = service
//!     .transfer_ownership(marie.id, outcome.added[0].id)
//!     .unwrap();
//! assert_eq!(transfer.new_owner, sous.id);
//! assert_eq!(transfer.demotion.user_id, marie.id);
//! ```

mod authorize;
mod collaborator;
mod error;
mod group;
mod service;
mod store;

pub use authorize::AuthorizationGate;
pub use collaborator::{Collaborator, CollaboratorId, CollaboratorOrigin};
pub use error::{AuthError, Result};
pub use group::{Group, GroupId, Membership, MembershipId};
pub use service::{
    BatchFailure, BatchOutcome, BatchSubject, CollaborationService, OwnershipTransfer,
    SEARCH_LIMIT,
};
pub use store::{CollaborationStore, MembershipStore};
