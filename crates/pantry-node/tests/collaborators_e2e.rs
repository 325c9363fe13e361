//! End-to-end tests for collaborator flows: search, batch add, removal,
//! group removal, and ownership transfer.

use axum::{body::Body, http::Request};
use pantry_node::api::{create_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn create_test_app() -> axum::Router {
    create_router(AppState::new())
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    actor: Option<&str>,
    body: Option<Value>,
) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(username) = actor {
        builder = builder.header("x-pantry-user", username);
    }
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

fn location_of(response: &axum::response::Response) -> String {
    response
        .headers()
        .get("location")
        .expect("redirect should carry a Location header")
        .to_str()
        .unwrap()
        .to_string()
}

fn decoded(location: &str) -> String {
    urlencoding::decode(location).unwrap().into_owned()
}

/// Creates a user over the API and returns its id.
async fn create_user(app: &axum::Router, username: &str) -> u64 {
    let response = send(
        app,
        "POST",
        "/users",
        None,
        Some(json!({ "username": username })),
    )
    .await;
    assert_eq!(response.status(), 201);
    json_body(response).await["id"].as_u64().unwrap()
}

/// Creates a cookbook owned by `owner` and returns its id.
async fn create_cookbook(app: &axum::Router, owner: &str, name: &str) -> u64 {
    let response = send(
        app,
        "POST",
        "/cookbooks",
        Some(owner),
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(response.status(), 201);
    json_body(response).await["id"].as_u64().unwrap()
}

/// Reads the collaborator list from a cookbook's detail page.
async fn cookbook_collaborators(app: &axum::Router, name: &str) -> Vec<Value> {
    let response = send(app, "GET", &format!("/cookbooks/{}", name), None, None).await;
    assert_eq!(response.status(), 200);
    json_body(response).await["collaborators"]
        .as_array()
        .unwrap()
        .clone()
}

// ==================== Search Tests ====================

#[tokio::test]
async fn test_search_requires_identity() {
    let app = create_test_app();

    let response = send(&app, "GET", "/collaborators?q=jim", None, None).await;
    assert_eq!(response.status(), 401);

    let error = json_body(response).await;
    assert_eq!(error["error"], "authentication required");
}

#[tokio::test]
async fn test_search_ranks_and_excludes() {
    let app = create_test_app();
    let jim = create_user(&app, "jim").await;
    create_user(&app, "jimmy").await;
    let kim_jim = create_user(&app, "kim-jim").await;
    create_user(&app, "alice").await;

    let uri = format!("/collaborators?q=jim&ineligible_user_ids={}", kim_jim);
    let response = send(&app, "GET", &uri, Some("alice"), None).await;
    assert_eq!(response.status(), 200);

    let found = json_body(response).await;
    let usernames: Vec<&str> = found
        .as_array()
        .unwrap()
        .iter()
        .map(|user| user["username"].as_str().unwrap())
        .collect();

    // Exact match first, then prefix; the excluded id never appears.
    assert_eq!(usernames, vec!["jim", "jimmy"]);
    assert_eq!(found[0]["id"].as_u64().unwrap(), jim);
}

// ==================== Batch Add Tests ====================

#[tokio::test]
async fn test_create_rejects_unknown_resource_type() {
    let app = create_test_app();
    create_user(&app, "marie").await;

    let response = send(
        &app,
        "POST",
        "/collaborators",
        Some("marie"),
        Some(json!({
            "resourceable_type": "Recipe",
            "resourceable_id": 1,
            "user_ids": [1]
        })),
    )
    .await;

    assert_eq!(response.status(), 404);
    let error = json_body(response).await;
    assert!(error["error"].as_str().unwrap().contains("Recipe"));
}

#[tokio::test]
async fn test_create_requires_identity() {
    let app = create_test_app();

    let response = send(
        &app,
        "POST",
        "/collaborators",
        None,
        Some(json!({
            "resourceable_type": "Cookbook",
            "resourceable_id": 1,
            "user_ids": [1]
        })),
    )
    .await;

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_add_collaborators_and_list_on_detail() {
    let app = create_test_app();
    create_user(&app, "marie").await;
    let sous = create_user(&app, "sous-chef").await;
    let cookbook = create_cookbook(&app, "marie", "bread").await;

    let response = send(
        &app,
        "POST",
        "/collaborators",
        Some("marie"),
        Some(json!({
            "resourceable_type": "Cookbook",
            "resourceable_id": cookbook,
            "user_ids": [sous]
        })),
    )
    .await;

    assert_eq!(response.status(), 303);
    let location = location_of(&response);
    assert_eq!(
        location,
        "/cookbooks/bread?notice=Collaborator%28s%29%20successfully%20added"
    );

    let collaborators = cookbook_collaborators(&app, "bread").await;
    assert_eq!(collaborators.len(), 1);
    assert_eq!(collaborators[0]["username"], "sous-chef");
    assert_eq!(collaborators[0]["origin"], "direct");
}

#[tokio::test]
async fn test_add_collaborators_reports_partial_failures() {
    let app = create_test_app();
    create_user(&app, "marie").await;
    let sous = create_user(&app, "sous-chef").await;
    let plongeur = create_user(&app, "plongeur").await;
    let cookbook = create_cookbook(&app, "marie", "bread").await;

    // First add succeeds outright.
    let response = send(
        &app,
        "POST",
        "/collaborators",
        Some("marie"),
        Some(json!({
            "resourceable_type": "Cookbook",
            "resourceable_id": cookbook,
            "user_ids": [sous]
        })),
    )
    .await;
    assert_eq!(response.status(), 303);

    // Second batch: one duplicate, one unknown, one fresh.
    let response = send(
        &app,
        "POST",
        "/collaborators",
        Some("marie"),
        Some(json!({
            "resourceable_type": "Cookbook",
            "resourceable_id": cookbook,
            "user_ids": [sous, 999, plongeur]
        })),
    )
    .await;

    assert_eq!(response.status(), 303);
    let notice = decoded(&location_of(&response));
    assert!(notice.contains("1 collaborator(s) added"));
    assert!(notice.contains("2 failed"));

    // Only the fresh user gained a grant.
    let collaborators = cookbook_collaborators(&app, "bread").await;
    assert_eq!(collaborators.len(), 2);
}

#[tokio::test]
async fn test_add_collaborators_denied_for_outsider() {
    let app = create_test_app();
    create_user(&app, "marie").await;
    let sous = create_user(&app, "sous-chef").await;
    create_user(&app, "stranger").await;
    let cookbook = create_cookbook(&app, "marie", "bread").await;

    let response = send(
        &app,
        "POST",
        "/collaborators",
        Some("stranger"),
        Some(json!({
            "resourceable_type": "Cookbook",
            "resourceable_id": cookbook,
            "user_ids": [sous]
        })),
    )
    .await;

    assert_eq!(response.status(), 403);
}

// ==================== Removal Tests ====================

#[tokio::test]
async fn test_remove_collaborator_returns_empty_ok() {
    let app = create_test_app();
    create_user(&app, "marie").await;
    let sous = create_user(&app, "sous-chef").await;
    let cookbook = create_cookbook(&app, "marie", "bread").await;

    send(
        &app,
        "POST",
        "/collaborators",
        Some("marie"),
        Some(json!({
            "resourceable_type": "Cookbook",
            "resourceable_id": cookbook,
            "user_ids": [sous]
        })),
    )
    .await;

    let grant_id = cookbook_collaborators(&app, "bread").await[0]["id"]
        .as_u64()
        .unwrap();

    let response = send(
        &app,
        "DELETE",
        &format!("/collaborators/{}", grant_id),
        Some("marie"),
        None,
    )
    .await;

    assert_eq!(response.status(), 200);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(body.is_empty());

    assert!(cookbook_collaborators(&app, "bread").await.is_empty());
}

#[tokio::test]
async fn test_remove_collaborator_self_allowed_others_denied() {
    let app = create_test_app();
    create_user(&app, "marie").await;
    let sous = create_user(&app, "sous-chef").await;
    create_user(&app, "stranger").await;
    let cookbook = create_cookbook(&app, "marie", "bread").await;

    send(
        &app,
        "POST",
        "/collaborators",
        Some("marie"),
        Some(json!({
            "resourceable_type": "Cookbook",
            "resourceable_id": cookbook,
            "user_ids": [sous]
        })),
    )
    .await;

    let grant_id = cookbook_collaborators(&app, "bread").await[0]["id"]
        .as_u64()
        .unwrap();
    let uri = format!("/collaborators/{}", grant_id);

    // An unrelated user may not revoke the grant.
    let response = send(&app, "DELETE", &uri, Some("stranger"), None).await;
    assert_eq!(response.status(), 403);

    // The collaborator may walk away themself.
    let response = send(&app, "DELETE", &uri, Some("sous-chef"), None).await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_remove_unknown_collaborator_is_not_found() {
    let app = create_test_app();
    create_user(&app, "marie").await;

    let response = send(&app, "DELETE", "/collaborators/41", Some("marie"), None).await;
    assert_eq!(response.status(), 404);
}

// ==================== Group Collaborator Tests ====================

#[tokio::test]
async fn test_group_expansion_and_group_removal() {
    let app = create_test_app();
    create_user(&app, "marie").await;
    let baker_one = create_user(&app, "baker-one").await;
    let baker_two = create_user(&app, "baker-two").await;
    let cookbook = create_cookbook(&app, "marie", "bread").await;

    // baker-one founds the group and brings in baker-two.
    let response = send(
        &app,
        "POST",
        "/groups",
        Some("baker-one"),
        Some(json!({ "name": "Bakers" })),
    )
    .await;
    assert_eq!(response.status(), 303);
    let group_path = location_of(&response);
    let group_id: u64 = group_path
        .split(['/', '?'])
        .nth(2)
        .unwrap()
        .parse()
        .unwrap();

    send(
        &app,
        "POST",
        "/group_members",
        Some("baker-one"),
        Some(json!({ "group_id": group_id, "user_id": baker_two })),
    )
    .await;

    // baker-two also holds a direct grant, which must survive the
    // group's removal.
    send(
        &app,
        "POST",
        "/collaborators",
        Some("marie"),
        Some(json!({
            "resourceable_type": "Cookbook",
            "resourceable_id": cookbook,
            "user_ids": [baker_two]
        })),
    )
    .await;

    let response = send(
        &app,
        "POST",
        "/collaborators",
        Some("marie"),
        Some(json!({
            "resourceable_type": "Cookbook",
            "resourceable_id": cookbook,
            "group_ids": [group_id]
        })),
    )
    .await;
    assert_eq!(response.status(), 303);

    // baker-one came in via the group; baker-two kept the direct grant.
    let collaborators = cookbook_collaborators(&app, "bread").await;
    assert_eq!(collaborators.len(), 2);
    let group_derived: Vec<u64> = collaborators
        .iter()
        .filter(|grant| grant["origin"] != "direct")
        .map(|grant| grant["user_id"].as_u64().unwrap())
        .collect();
    assert_eq!(group_derived, vec![baker_one]);

    // Removing the group drops only its derived grants.
    let response = send(
        &app,
        "DELETE",
        &format!("/collaborators/{}/transfer", group_id),
        Some("marie"),
        Some(json!({
            "resourceable_type": "Cookbook",
            "resourceable_id": cookbook
        })),
    )
    .await;

    assert_eq!(response.status(), 303);
    let notice = decoded(&location_of(&response));
    assert!(notice.contains("Group 'Bakers' successfully removed"));

    let collaborators = cookbook_collaborators(&app, "bread").await;
    assert_eq!(collaborators.len(), 1);
    assert_eq!(collaborators[0]["user_id"].as_u64().unwrap(), baker_two);
    assert_eq!(collaborators[0]["origin"], "direct");
}

// ==================== Transfer Tests ====================

#[tokio::test]
async fn test_transfer_redirects_naming_new_owner() {
    let app = create_test_app();
    create_user(&app, "marie").await;
    let sous = create_user(&app, "sous-chef").await;
    let cookbook = create_cookbook(&app, "marie", "bread").await;

    send(
        &app,
        "POST",
        "/collaborators",
        Some("marie"),
        Some(json!({
            "resourceable_type": "Cookbook",
            "resourceable_id": cookbook,
            "user_ids": [sous]
        })),
    )
    .await;

    let grant_id = cookbook_collaborators(&app, "bread").await[0]["id"]
        .as_u64()
        .unwrap();

    let response = send(
        &app,
        "PUT",
        &format!("/collaborators/{}/transfer", grant_id),
        Some("marie"),
        None,
    )
    .await;

    assert_eq!(response.status(), 303);
    assert_eq!(
        location_of(&response),
        "/cookbooks/bread?notice=bread%20is%20now%20owned%20by%20sous-chef"
    );

    // Owner swapped; the prior owner keeps edit access.
    let response = send(&app, "GET", "/cookbooks/bread", None, None).await;
    let detail = json_body(response).await;
    assert_eq!(detail["owner"]["username"], "sous-chef");

    let remaining = detail["collaborators"].as_array().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["username"], "marie");
}

#[tokio::test]
async fn test_transfer_denied_for_non_owner() {
    let app = create_test_app();
    create_user(&app, "marie").await;
    let sous = create_user(&app, "sous-chef").await;
    let cookbook = create_cookbook(&app, "marie", "bread").await;

    send(
        &app,
        "POST",
        "/collaborators",
        Some("marie"),
        Some(json!({
            "resourceable_type": "Cookbook",
            "resourceable_id": cookbook,
            "user_ids": [sous]
        })),
    )
    .await;

    let grant_id = cookbook_collaborators(&app, "bread").await[0]["id"]
        .as_u64()
        .unwrap();

    // The collaborator cannot pull ownership toward themself.
    let response = send(
        &app,
        "PUT",
        &format!("/collaborators/{}/transfer", grant_id),
        Some("sous-chef"),
        None,
    )
    .await;

    assert_eq!(response.status(), 403);
    let error = json_body(response).await;
    assert!(error["error"]
        .as_str()
        .unwrap()
        .contains("only the owner may transfer ownership"));
}

#[tokio::test]
async fn test_transfer_rejects_group_derived_grant() {
    let app = create_test_app();
    create_user(&app, "marie").await;
    create_user(&app, "baker-one").await;
    let cookbook = create_cookbook(&app, "marie", "bread").await;

    let response = send(
        &app,
        "POST",
        "/groups",
        Some("baker-one"),
        Some(json!({ "name": "Bakers" })),
    )
    .await;
    let group_id: u64 = location_of(&response)
        .split(['/', '?'])
        .nth(2)
        .unwrap()
        .parse()
        .unwrap();

    send(
        &app,
        "POST",
        "/collaborators",
        Some("marie"),
        Some(json!({
            "resourceable_type": "Cookbook",
            "resourceable_id": cookbook,
            "group_ids": [group_id]
        })),
    )
    .await;

    let grant_id = cookbook_collaborators(&app, "bread").await[0]["id"]
        .as_u64()
        .unwrap();

    let response = send(
        &app,
        "PUT",
        &format!("/collaborators/{}/transfer", grant_id),
        Some("marie"),
        None,
    )
    .await;

    assert_eq!(response.status(), 400);
    let error = json_body(response).await;
    assert!(error["error"]
        .as_str()
        .unwrap()
        .contains("group-derived collaborator"));
}
