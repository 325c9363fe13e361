//! # Pantry Node
//!
//! HTTP boundary for the Pantry community site: a place to share
//! cookbooks and tools and manage who may edit them.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                       Pantry Node                          │
//! ├────────────────────────────────────────────────────────────┤
//! │                                                            │
//! │  ┌─────────────────────────────────────────────────────┐  │
//! │  │                  HTTP API Layer                      │  │
//! │  │  • Users and Groups (signup, membership, admins)     │  │
//! │  │  • Cookbooks and Tools (catalog, ownership)          │  │
//! │  │  • Collaborators (search, grant, revoke, transfer)   │  │
//! │  └─────────────────────────────────────────────────────┘  │
//! │                             │                              │
//! │  ┌─────────────────────────────────────────────────────┐  │
//! │  │               Collaboration Service                  │  │
//! │  │  • Authorization gate (owner / admin / self rules)   │  │
//! │  │  • Per-resource serialization of transfers           │  │
//! │  └─────────────────────────────────────────────────────┘  │
//! │                             │                              │
//! │  ┌─────────────────────────────────────────────────────┐  │
//! │  │                    Stores                            │  │
//! │  │  • User directory and resource catalog               │  │
//! │  │  • Group memberships                                 │  │
//! │  │  • Collaborator grants (direct / group-derived)      │  │
//! │  └─────────────────────────────────────────────────────┘  │
//! │                                                            │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`api`] - Application state, router assembly, and error mapping
//! - [`collaborators_api`] - Collaborator and ownership-transfer endpoints
//! - [`config`] - Node configuration management
//! - [`groups_api`] - Group and membership endpoints
//! - [`identity`] - Acting-user resolution from the identity header
//! - [`notice`] - Flash-style redirect responses
//! - [`observability`] - Structured logging and request tracing
//! - [`resources_api`] - Cookbook and tool endpoints
//! - [`users_api`] - User endpoints
//! - [`validation`] - Input validation for request payloads

pub mod api;
pub mod collaborators_api;
pub mod config;
pub mod groups_api;
pub mod identity;
pub mod notice;
pub mod observability;
pub mod resources_api;
pub mod users_api;
pub mod validation;
