//! Group and membership endpoints.
//!
//! Member management is browser-shaped: successes and admin denials
//! answer with a redirect to the group page carrying a flash message,
//! while lookups that fail outright stay JSON errors.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use pantry_auth::{AuthError, Group, GroupId, Membership, MembershipId};
use pantry_types::UserId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::{ApiError, AppState};
use crate::identity::CurrentUser;
use crate::notice::{group_path, redirect_with_alert, redirect_with_notice};
use crate::validation::{validate_group_name, ValidationErrorResponse};

const ADMIN_REQUIRED_ALERT: &str = "You must be an admin member of the group to do that.";

/// Creates the group and group-member routes.
pub fn group_routes() -> Router<AppState> {
    Router::new()
        .route("/groups", get(list_groups).post(create_group))
        .route("/groups/{id}", get(get_group).delete(delete_group))
        .route("/group_members", post(create_group_member))
        .route("/group_members/{id}", delete(destroy_group_member))
        .route("/group_members/{id}/make_admin", post(make_admin))
        .route("/group_members/{id}/remove_admin", post(remove_admin))
}

// ==================== Request/Response Types ====================

/// Request to create a group.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateGroupRequest {
    #[validate(custom(function = validate_group_name))]
    pub name: String,
}

/// Request to add a member to a group.
#[derive(Debug, Deserialize)]
pub struct CreateGroupMemberRequest {
    pub group_id: GroupId,
    pub user_id: UserId,
}

/// Response for a group.
#[derive(Debug, Serialize)]
pub struct GroupResponse {
    pub id: GroupId,
    pub name: String,
    pub created_by: UserId,
    pub member_count: usize,
    pub created_at: u64,
    pub updated_at: u64,
}

impl GroupResponse {
    pub(crate) fn new(group: &Group, member_count: usize) -> Self {
        Self {
            id: group.id,
            name: group.name.clone(),
            created_by: group.created_by,
            member_count,
            created_at: group.created_at,
            updated_at: group.updated_at,
        }
    }
}

/// Response for a group including its members.
#[derive(Debug, Serialize)]
pub struct GroupDetailResponse {
    pub id: GroupId,
    pub name: String,
    pub created_by: UserId,
    pub members: Vec<GroupMemberResponse>,
    pub created_at: u64,
    pub updated_at: u64,
}

/// Response for a single membership.
#[derive(Debug, Serialize)]
pub struct GroupMemberResponse {
    pub id: MembershipId,
    pub group_id: GroupId,
    pub user_id: UserId,
    pub username: Option<String>,
    pub admin: bool,
    pub created_at: u64,
}

impl GroupMemberResponse {
    fn new(state: &AppState, membership: &Membership) -> Self {
        Self {
            id: membership.id,
            group_id: membership.group_id,
            user_id: membership.user_id,
            username: state
                .registry
                .users
                .get(membership.user_id)
                .map(|user| user.username),
            admin: membership.admin,
            created_at: membership.created_at,
        }
    }
}

// ==================== Group Handlers ====================

/// Creates a new group; the creator becomes its first admin member.
async fn create_group(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(req): Json<CreateGroupRequest>,
) -> Result<Response, ApiError> {
    if let Err(errors) = req.validate() {
        return Ok(ValidationErrorResponse::from(errors).into_response());
    }

    let group = state.service.create_group(actor.id, req.name)?;

    Ok(redirect_with_notice(
        &group_path(group.id),
        "Group successfully created!",
    ))
}

/// Lists all groups.
async fn list_groups(State(state): State<AppState>) -> impl IntoResponse {
    let responses: Vec<GroupResponse> = state
        .memberships
        .list_groups()
        .iter()
        .map(|group| GroupResponse::new(group, state.memberships.members_of(group.id).len()))
        .collect();
    Json(responses)
}

/// Gets a group with its members.
async fn get_group(
    State(state): State<AppState>,
    Path(group_id): Path<GroupId>,
) -> Result<impl IntoResponse, ApiError> {
    let group = state
        .memberships
        .get_group(group_id)
        .ok_or_else(|| AuthError::NotFound(format!("group {}", group_id)))?;

    let members: Vec<GroupMemberResponse> = state
        .memberships
        .members_of(group_id)
        .iter()
        .map(|membership| GroupMemberResponse::new(&state, membership))
        .collect();

    Ok(Json(GroupDetailResponse {
        id: group.id,
        name: group.name,
        created_by: group.created_by,
        members,
        created_at: group.created_at,
        updated_at: group.updated_at,
    }))
}

/// Deletes a group, its memberships, and its derived collaborator
/// grants. Admins only.
async fn delete_group(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(group_id): Path<GroupId>,
) -> Result<impl IntoResponse, ApiError> {
    state.service.delete_group(actor.id, group_id)?;
    tracing::info!(group = group_id, "Group deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Group Member Handlers ====================

/// Adds a member to a group.
async fn create_group_member(
    State(state): State<AppState>,
    CurrentUser(_actor): CurrentUser,
    Json(req): Json<CreateGroupMemberRequest>,
) -> Result<Response, ApiError> {
    let membership = state.service.add_group_member(req.group_id, req.user_id)?;

    Ok(redirect_with_notice(
        &group_path(membership.group_id),
        "Member successfully added!",
    ))
}

/// Grants the admin flag to a member. Admins only.
async fn make_admin(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(membership_id): Path<MembershipId>,
) -> Result<Response, ApiError> {
    let membership = find_membership(&state, membership_id)?;

    match state.service.make_group_admin(actor.id, membership_id) {
        Ok(updated) => Ok(redirect_with_notice(
            &group_path(updated.group_id),
            "Member has successfully been made an admin!",
        )),
        Err(AuthError::Forbidden(_)) => Ok(redirect_with_alert(
            &group_path(membership.group_id),
            ADMIN_REQUIRED_ALERT,
        )),
        Err(err) => Err(err.into()),
    }
}

/// Strips the admin flag from a member. Admins only.
async fn remove_admin(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(membership_id): Path<MembershipId>,
) -> Result<Response, ApiError> {
    let membership = find_membership(&state, membership_id)?;

    match state.service.revoke_group_admin(actor.id, membership_id) {
        Ok(updated) => Ok(redirect_with_notice(
            &group_path(updated.group_id),
            "Member has successfully been removed as an admin!",
        )),
        Err(AuthError::Forbidden(_)) => Ok(redirect_with_alert(
            &group_path(membership.group_id),
            ADMIN_REQUIRED_ALERT,
        )),
        Err(err) => Err(err.into()),
    }
}

/// Removes a member. Admins may remove anyone; members may remove
/// themselves.
async fn destroy_group_member(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(membership_id): Path<MembershipId>,
) -> Result<Response, ApiError> {
    let membership = find_membership(&state, membership_id)?;

    match state.service.remove_group_member(actor.id, membership_id) {
        Ok(removed) => Ok(redirect_with_notice(
            &group_path(removed.group_id),
            "Member successfully removed",
        )),
        Err(AuthError::Forbidden(_)) => Ok(redirect_with_alert(
            &group_path(membership.group_id),
            ADMIN_REQUIRED_ALERT,
        )),
        Err(err) => Err(err.into()),
    }
}

fn find_membership(state: &AppState, membership_id: MembershipId) -> Result<Membership, ApiError> {
    state
        .memberships
        .get(membership_id)
        .ok_or_else(|| AuthError::NotFound(format!("membership {}", membership_id)).into())
}
