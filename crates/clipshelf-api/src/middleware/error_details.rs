use crate::error::ErrorResponse;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

/// Error details middleware
/// Re-renders error bodies without `details` and `error_type` when the
/// deployment hides them.
pub async fn error_details_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    if !state.hide_error_details {
        return response;
    }

    let Some(mut body) = response.extensions_mut().remove::<ErrorResponse>() else {
        return response;
    };
    if body.details.is_none() && body.error_type.is_none() {
        return response;
    }

    body.details = None;
    body.error_type = None;
    (response.status(), Json(body)).into_response()
}
