//! HTTP API wiring for the Pantry node.
//!
//! Builds the router over the shared application state and maps domain
//! errors onto HTTP status codes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use pantry_auth::{AuthError, CollaborationService, CollaborationStore, MembershipStore};
use pantry_registry::{Registry, RegistryError};
use serde::Serialize;
use std::time::Instant;
use tower_http::trace::TraceLayer;

use crate::observability::middleware::request_id_middleware;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// User directory and cookbook/tool catalog.
    pub registry: Registry,
    /// Groups and their memberships.
    pub memberships: MembershipStore,
    /// Collaborator grants.
    pub collaborations: CollaborationStore,
    /// Collaboration operations, gated and serialized per resource.
    pub service: CollaborationService,
    /// When this state was created, for uptime reporting.
    pub started_at: Instant,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// Creates a fresh state with empty stores wired together.
    pub fn new() -> Self {
        let registry = Registry::new();
        let memberships = MembershipStore::new();
        let collaborations = CollaborationStore::new(memberships.clone());
        let service = CollaborationService::new(
            registry.users.clone(),
            registry.resources.clone(),
            memberships.clone(),
            collaborations.clone(),
        );

        Self {
            registry,
            memberships,
            collaborations,
            service,
            started_at: Instant::now(),
        }
    }
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthorized,
    #[error("{0}")]
    Auth(#[from] AuthError),
    #[error("{0}")]
    Registry(#[from] RegistryError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Auth(err) => match err {
                AuthError::NotFound(_) => StatusCode::NOT_FOUND,
                AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
                AuthError::AlreadyMember(_)
                | AuthError::AlreadyCollaborator(_)
                | AuthError::AlreadyExists(_) => StatusCode::CONFLICT,
                // An unknown resourceable_type reads as a missing route.
                AuthError::InvalidResourceType(_) => StatusCode::NOT_FOUND,
                AuthError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            },
            ApiError::Registry(err) => match err {
                RegistryError::UserNotFound(_) | RegistryError::ResourceNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                RegistryError::UsernameTaken(_) | RegistryError::NameTaken(_) => {
                    StatusCode::CONFLICT
                }
                RegistryError::InvalidUsername(_) | RegistryError::InvalidName(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
            },
        };

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// JSON body for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Creates the application router with all routes configured.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(crate::users_api::user_routes())
        .merge(crate::groups_api::group_routes())
        .merge(crate::resources_api::resource_routes())
        .merge(crate::collaborators_api::collaborator_routes())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.registry.stats();
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "stats": {
            "users": stats.users,
            "cookbooks": stats.cookbooks,
            "tools": stats.tools,
            "groups": state.memberships.list_groups().len(),
            "collaborators": state.collaborations.count(),
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (
                ApiError::Auth(AuthError::NotFound("collaborator 9".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Auth(AuthError::Forbidden("nope".into())),
                StatusCode::FORBIDDEN,
            ),
            (
                ApiError::Auth(AuthError::AlreadyCollaborator("user 3".into())),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::Auth(AuthError::InvalidResourceType("Recipe".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Auth(AuthError::InvalidInput("bad".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Registry(RegistryError::InvalidUsername("UPPER".into())),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ApiError::Registry(RegistryError::NameTaken("bread".into())),
                StatusCode::CONFLICT,
            ),
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_app_state_wires_shared_stores() {
        let state = AppState::new();
        let user = state.registry.users.create("ferran".to_string()).unwrap();

        // The service sees users created through the registry handle.
        let found = state.service.search_collaborators("ferran", &[]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, user.id);
    }
}
