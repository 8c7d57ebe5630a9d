use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Json,
};
use howto_shared::{Comment, CommentDraft, CommentError, CommentListing};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PostCommentRequest {
    pub content: String,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_email: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
    })
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(article_id): Path<String>,
) -> (StatusCode, Json<CommentListing>) {
    let listing = state.comments_for(None).list_approved_or_empty(&article_id).await;
    let status = if listing.error.is_some() { StatusCode::BAD_GATEWAY } else { StatusCode::OK };
    (status, Json(listing))
}

pub async fn post_comment(
    State(state): State<AppState>,
    Path(article_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<PostCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let draft = CommentDraft {
        article_id,
        content: request.content,
        author_name: request.author_name,
        author_email: request.author_email,
        parent_id: request.parent_id,
    };
    let created = state
        .comments_for(bearer_token(&headers))
        .post(draft)
        .await
        .map_err(comment_error)?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<UpdateCommentRequest>,
) -> Result<Json<Comment>, ApiError> {
    let updated = state
        .comments_for(bearer_token(&headers))
        .update(&comment_id, &request.content)
        .await
        .map_err(comment_error)?;
    Ok(Json(updated))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    state
        .comments_for(bearer_token(&headers))
        .delete(&comment_id)
        .await
        .map_err(comment_error)?;
    Ok(StatusCode::NO_CONTENT)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim().to_string()).filter(|token| !token.is_empty())
}

fn comment_error(err: CommentError) -> ApiError {
    let status = match &err {
        CommentError::Validation(_) => StatusCode::BAD_REQUEST,
        CommentError::AuthRequired => StatusCode::UNAUTHORIZED,
        CommentError::Authorization => StatusCode::FORBIDDEN,
        CommentError::Fetch(_) | CommentError::Store(_) => StatusCode::BAD_GATEWAY,
    };
    if status.is_server_error() {
        tracing::error!("comment request failed: {:?}", err);
    }
    (
        status,
        Json(ErrorResponse {
            error: err.user_message(),
            code: status.as_u16(),
        }),
    )
}
