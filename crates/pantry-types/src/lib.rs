//! Common types used throughout `pantry`.
//!
//! This crate provides the core types for Pantry, a community site
//! where people publish cookbooks and tools and manage who may
//! maintain them.

mod resource;
mod user;

pub use resource::{ResourceId, ResourceKind, ResourceRef};
pub use user::{User, UserId};
