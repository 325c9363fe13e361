//! Flash-style redirect responses.
//!
//! The node is cookie-less, so browser-style routes carry operation
//! outcomes in the redirect itself: `303 See Other` with the message
//! percent-encoded into a `notice` (success) or `alert` (denial) query
//! parameter on the `Location` target.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use pantry_auth::GroupId;
use pantry_registry::ResourceRecord;

/// Redirect to `location` carrying a success notice.
pub fn redirect_with_notice(location: &str, notice: &str) -> Response {
    redirect(location, "notice", notice)
}

/// Redirect to `location` carrying a denial alert.
pub fn redirect_with_alert(location: &str, alert: &str) -> Response {
    redirect(location, "alert", alert)
}

fn redirect(location: &str, param: &str, message: &str) -> Response {
    let target = format!("{}?{}={}", location, param, urlencoding::encode(message));
    (StatusCode::SEE_OTHER, [(header::LOCATION, target)]).into_response()
}

/// Page path for a cookbook or tool, e.g. `/cookbooks/bread`.
pub fn resource_path(record: &ResourceRecord) -> String {
    format!("/{}/{}", record.kind().route_segment(), record.name())
}

/// Page path for a group.
pub fn group_path(group_id: GroupId) -> String {
    format!("/groups/{}", group_id)
}
