//! User endpoints: signup-shaped creation and profile lookups.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use pantry_registry::RegistryError;
use pantry_types::{User, UserId};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::{ApiError, AppState};
use crate::groups_api::GroupResponse;
use crate::validation::{validate_username, ValidationErrorResponse};

/// Creates the user routes.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/{username}", get(get_user))
        .route("/users/{username}/groups", get(get_user_groups))
}

// ==================== Request/Response Types ====================

/// Request to create a user.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(custom(function = validate_username))]
    pub username: String,
    #[validate(length(max = 100, message = "Display name is too long"))]
    pub display_name: Option<String>,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: Option<String>,
}

/// Response for a user.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

// ==================== Handlers ====================

/// Creates a new user.
async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Response, ApiError> {
    if let Err(errors) = req.validate() {
        return Ok(ValidationErrorResponse::from(errors).into_response());
    }

    let mut user = state.registry.users.create(req.username)?;

    // Optional profile fields land in a follow-up update.
    if req.display_name.is_some() || req.email.is_some() {
        user.display_name = req.display_name;
        user.email = req.email;
        user = state.registry.users.update(user)?;
    }

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))).into_response())
}

/// Lists all users, sorted by username.
async fn list_users(State(state): State<AppState>) -> impl IntoResponse {
    let users = state.registry.users.list();
    let responses: Vec<UserResponse> = users.iter().map(Into::into).collect();
    Json(responses)
}

/// Gets a user by username.
async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = lookup(&state, &username)?;
    Ok(Json(UserResponse::from(&user)))
}

/// Lists the groups a user belongs to.
async fn get_user_groups(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = lookup(&state, &username)?;

    let responses: Vec<GroupResponse> = state
        .memberships
        .groups_for_user(user.id)
        .iter()
        .map(|group| GroupResponse::new(group, state.memberships.members_of(group.id).len()))
        .collect();

    Ok(Json(responses))
}

fn lookup(state: &AppState, username: &str) -> Result<User, ApiError> {
    state
        .registry
        .users
        .get_by_username(username)
        .ok_or_else(|| RegistryError::UserNotFound(username.to_string()).into())
}
