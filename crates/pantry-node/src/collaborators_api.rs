//! Collaborator endpoints: search, batch add, removal, group removal,
//! and ownership transfer.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get},
    Router,
};
use pantry_auth::{
    AuthError, BatchSubject, Collaborator, CollaboratorId, CollaboratorOrigin, GroupId,
};
use pantry_types::{ResourceId, ResourceKind, ResourceRef, User, UserId};
use serde::{Deserialize, Serialize};

use crate::api::{ApiError, AppState};
use crate::identity::CurrentUser;
use crate::notice::{redirect_with_notice, resource_path};

/// Creates the collaborator routes.
pub fn collaborator_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/collaborators",
            get(search_collaborators).post(create_collaborators),
        )
        .route("/collaborators/{id}", delete(destroy_collaborator))
        .route(
            "/collaborators/{id}/transfer",
            delete(destroy_group_collaborators).put(transfer_ownership),
        )
}

// ==================== Request/Response Types ====================

/// Query parameters for collaborator search.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Username fragment to search for.
    #[serde(default)]
    pub q: String,
    /// Comma-separated user ids to leave out (the owner, existing
    /// collaborators).
    #[serde(default)]
    pub ineligible_user_ids: String,
}

impl SearchParams {
    fn ineligible(&self) -> Vec<UserId> {
        self.ineligible_user_ids
            .split(',')
            .filter_map(|part| part.trim().parse().ok())
            .collect()
    }
}

/// Candidate user for the collaborator picker.
#[derive(Debug, Serialize)]
pub struct CandidateResponse {
    pub id: UserId,
    pub username: String,
    pub display_name: Option<String>,
}

impl From<&User> for CandidateResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            display_name: user.display_name.clone(),
        }
    }
}

/// Request to add collaborators to a resource.
#[derive(Debug, Deserialize)]
pub struct CreateCollaboratorsRequest {
    pub resourceable_type: String,
    pub resourceable_id: ResourceId,
    #[serde(default)]
    pub user_ids: Vec<UserId>,
    #[serde(default)]
    pub group_ids: Vec<GroupId>,
}

/// Request naming the resource for a group removal.
#[derive(Debug, Deserialize)]
pub struct GroupRemovalRequest {
    pub resourceable_type: String,
    pub resourceable_id: ResourceId,
}

/// Response for a single collaborator grant.
#[derive(Debug, Serialize)]
pub struct CollaboratorResponse {
    pub id: CollaboratorId,
    pub user_id: UserId,
    pub username: Option<String>,
    pub origin: CollaboratorOrigin,
    pub added_by: UserId,
    pub created_at: u64,
}

impl CollaboratorResponse {
    pub(crate) fn new(state: &AppState, grant: &Collaborator) -> Self {
        Self {
            id: grant.id,
            user_id: grant.user_id,
            username: state
                .registry
                .users
                .get(grant.user_id)
                .map(|user| user.username),
            origin: grant.origin,
            added_by: grant.added_by,
            created_at: grant.created_at,
        }
    }
}

fn parse_resource(kind: &str, id: ResourceId) -> Result<ResourceRef, AuthError> {
    let kind = ResourceKind::from_str(kind)
        .ok_or_else(|| AuthError::InvalidResourceType(kind.to_string()))?;
    Ok(ResourceRef::new(kind, id))
}

// ==================== Handlers ====================

/// Searches for candidate collaborators by username.
async fn search_collaborators(
    State(state): State<AppState>,
    _actor: CurrentUser,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    let found = state
        .service
        .search_collaborators(&params.q, &params.ineligible());
    let responses: Vec<CandidateResponse> = found.iter().map(Into::into).collect();
    Json(responses)
}

/// Adds users and group members as collaborators on a resource.
///
/// Each requested user and group is processed independently; a
/// duplicate or unknown entry fails that entry alone. Answers with a
/// redirect to the resource page carrying the outcome notice.
async fn create_collaborators(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(req): Json<CreateCollaboratorsRequest>,
) -> Result<Response, ApiError> {
    let resource = parse_resource(&req.resourceable_type, req.resourceable_id)?;
    let record = state
        .registry
        .resources
        .get(resource)
        .ok_or_else(|| AuthError::NotFound(resource.to_string()))?;

    let outcome = state
        .service
        .add_collaborators(actor.id, resource, &req.user_ids, &req.group_ids)?;

    tracing::info!(
        resource = %resource,
        added = outcome.added.len(),
        failed = outcome.failures.len(),
        "Collaborator batch applied"
    );

    let notice = if outcome.all_ok() {
        "Collaborator(s) successfully added".to_string()
    } else {
        let failed: Vec<String> = outcome
            .failures
            .iter()
            .map(|failure| match failure.subject {
                BatchSubject::User(id) => format!("user {}: {}", id, failure.reason),
                BatchSubject::Group(id) => format!("group {}: {}", id, failure.reason),
            })
            .collect();
        format!(
            "{} collaborator(s) added, {} failed ({})",
            outcome.added.len(),
            outcome.failures.len(),
            failed.join("; ")
        )
    };

    Ok(redirect_with_notice(&resource_path(&record), &notice))
}

/// Removes a single collaborator grant.
///
/// Called from page scripts rather than a form submit, so success is
/// a bare `200` with an empty body rather than a redirect.
async fn destroy_collaborator(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<CollaboratorId>,
) -> Result<Response, ApiError> {
    state.service.remove_collaborator(actor.id, id)?;
    Ok(StatusCode::OK.into_response())
}

/// Removes every grant a group's expansion produced on a resource.
///
/// `{id}` here is the group's id; the body names the resource.
async fn destroy_group_collaborators(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(group_id): Path<GroupId>,
    Json(req): Json<GroupRemovalRequest>,
) -> Result<Response, ApiError> {
    let resource = parse_resource(&req.resourceable_type, req.resourceable_id)?;
    let record = state
        .registry
        .resources
        .get(resource)
        .ok_or_else(|| AuthError::NotFound(resource.to_string()))?;
    let group = state
        .memberships
        .get_group(group_id)
        .ok_or_else(|| AuthError::NotFound(format!("group {}", group_id)))?;

    state
        .service
        .remove_group_collaborators(actor.id, resource, group_id)?;

    Ok(redirect_with_notice(
        &resource_path(&record),
        &format!("Group '{}' successfully removed as a collaborator", group.name),
    ))
}

/// Transfers ownership of the resource to the collaborator, demoting
/// the owner to a collaborator.
async fn transfer_ownership(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<CollaboratorId>,
) -> Result<Response, ApiError> {
    let transfer = state.service.transfer_ownership(actor.id, id)?;

    tracing::info!(
        resource = %transfer.resource.reference(),
        prior_owner = transfer.prior_owner,
        new_owner = transfer.new_owner,
        "Ownership transferred"
    );

    let new_owner = state
        .registry
        .users
        .get(transfer.new_owner)
        .map(|user| user.username)
        .unwrap_or_else(|| format!("user {}", transfer.new_owner));

    Ok(redirect_with_notice(
        &resource_path(&transfer.resource),
        &format!("{} is now owned by {}", transfer.resource.name(), new_owner),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_params_parse_ineligible() {
        let params = SearchParams {
            q: "jim".to_string(),
            ineligible_user_ids: "1, 2,xx,3".to_string(),
        };
        assert_eq!(params.ineligible(), vec![1, 2, 3]);

        let empty = SearchParams {
            q: String::new(),
            ineligible_user_ids: String::new(),
        };
        assert!(empty.ineligible().is_empty());
    }

    #[test]
    fn test_parse_resource_rejects_unknown_type() {
        assert!(parse_resource("Cookbook", 1).is_ok());
        assert!(parse_resource("tools", 2).is_ok());
        assert!(matches!(
            parse_resource("Recipe", 3),
            Err(AuthError::InvalidResourceType(_))
        ));
    }
}
