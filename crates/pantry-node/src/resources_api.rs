//! Cookbook and tool endpoints.
//!
//! Both kinds share the same handler bodies; the routes pin the kind
//! so a cookbook name can never resolve to a tool.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use pantry_registry::{RegistryError, ResourceRecord};
use pantry_types::{ResourceId, ResourceKind, UserId};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::{ApiError, AppState};
use crate::collaborators_api::CollaboratorResponse;
use crate::identity::CurrentUser;
use crate::validation::{validate_resource_name, ValidationErrorResponse};

/// Creates the cookbook and tool routes.
pub fn resource_routes() -> Router<AppState> {
    Router::new()
        .route("/cookbooks", get(list_cookbooks).post(create_cookbook))
        .route("/cookbooks/{name}", get(get_cookbook))
        .route("/tools", get(list_tools).post(create_tool))
        .route("/tools/{name}", get(get_tool))
}

// ==================== Request/Response Types ====================

/// Request to create a cookbook or tool.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateResourceRequest {
    #[validate(custom(function = validate_resource_name))]
    pub name: String,
    #[validate(length(max = 1000, message = "Description is too long"))]
    pub description: Option<String>,
}

/// Response for a cookbook or tool.
#[derive(Debug, Serialize)]
pub struct ResourceResponse {
    pub id: ResourceId,
    pub kind: ResourceKind,
    pub name: String,
    pub owner_id: UserId,
    pub description: Option<String>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl From<&ResourceRecord> for ResourceResponse {
    fn from(record: &ResourceRecord) -> Self {
        let (created_at, updated_at) = match record {
            ResourceRecord::Cookbook(c) => (c.created_at, c.updated_at),
            ResourceRecord::Tool(t) => (t.created_at, t.updated_at),
        };
        Self {
            id: record.id(),
            kind: record.kind(),
            name: record.name().to_string(),
            owner_id: record.owner_id(),
            description: record.description().map(String::from),
            created_at,
            updated_at,
        }
    }
}

/// Owner summary for the detail view.
#[derive(Debug, Serialize)]
pub struct OwnerResponse {
    pub id: UserId,
    pub username: Option<String>,
}

/// Response for a cookbook or tool including owner and collaborators.
#[derive(Debug, Serialize)]
pub struct ResourceDetailResponse {
    #[serde(flatten)]
    pub resource: ResourceResponse,
    pub owner: OwnerResponse,
    pub collaborators: Vec<CollaboratorResponse>,
}

// ==================== Handlers ====================

async fn create_cookbook(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(req): Json<CreateResourceRequest>,
) -> Result<Response, ApiError> {
    if let Err(errors) = req.validate() {
        return Ok(ValidationErrorResponse::from(errors).into_response());
    }

    let cookbook = state
        .registry
        .resources
        .create_cookbook(req.name, actor.id, req.description)?;
    let record = ResourceRecord::Cookbook(cookbook);

    Ok((StatusCode::CREATED, Json(ResourceResponse::from(&record))).into_response())
}

async fn create_tool(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(req): Json<CreateResourceRequest>,
) -> Result<Response, ApiError> {
    if let Err(errors) = req.validate() {
        return Ok(ValidationErrorResponse::from(errors).into_response());
    }

    let tool = state
        .registry
        .resources
        .create_tool(req.name, actor.id, req.description)?;
    let record = ResourceRecord::Tool(tool);

    Ok((StatusCode::CREATED, Json(ResourceResponse::from(&record))).into_response())
}

async fn list_cookbooks(State(state): State<AppState>) -> impl IntoResponse {
    list_resources(&state, ResourceKind::Cookbook)
}

async fn list_tools(State(state): State<AppState>) -> impl IntoResponse {
    list_resources(&state, ResourceKind::Tool)
}

fn list_resources(state: &AppState, kind: ResourceKind) -> Json<Vec<ResourceResponse>> {
    let records = state.registry.resources.list(kind);
    Json(records.iter().map(Into::into).collect())
}

async fn get_cookbook(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ResourceDetailResponse>, ApiError> {
    resource_detail(&state, ResourceKind::Cookbook, &name)
}

async fn get_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ResourceDetailResponse>, ApiError> {
    resource_detail(&state, ResourceKind::Tool, &name)
}

fn resource_detail(
    state: &AppState,
    kind: ResourceKind,
    name: &str,
) -> Result<Json<ResourceDetailResponse>, ApiError> {
    let record = state
        .registry
        .resources
        .get_by_name(kind, name)
        .ok_or_else(|| RegistryError::ResourceNotFound(format!("{} '{}'", kind, name)))?;

    let owner = OwnerResponse {
        id: record.owner_id(),
        username: state
            .registry
            .users
            .get(record.owner_id())
            .map(|user| user.username),
    };

    let collaborators: Vec<CollaboratorResponse> = state
        .collaborations
        .find_for_resource(record.reference())
        .iter()
        .map(|grant| CollaboratorResponse::new(state, grant))
        .collect();

    Ok(Json(ResourceDetailResponse {
        resource: ResourceResponse::from(&record),
        owner,
        collaborators,
    }))
}
