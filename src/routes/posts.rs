use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{middleware, Json, Router};
use serde::Deserialize;

use crate::cors;
use crate::db::models::{Post, PostMeta};
use crate::db::posts as post_store;
use crate::error::{AppError, AppResult};
use crate::meta::RequestMeta;
use crate::state::AppState;
use crate::validation::validate_post;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePostRequest {
    #[serde(default)]
    story: String,
    #[serde(default)]
    feeling: String,
    #[serde(default)]
    client_tz: String,
    #[serde(default)]
    client_lang: String,
    #[serde(default)]
    screen: String,
    #[serde(default)]
    platform: String,
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    limit: Option<String>,
}

/// POST /api/posts
/// Body: { "story": "...", "feeling": "...", "clientTz"?, "clientLang"?, "screen"?, "platform"? }
async fn create(
    State(state): State<AppState>,
    request_meta: RequestMeta,
    body: Result<Json<CreatePostRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = body.map_err(|_| AppError::BadRequest("invalid JSON body".into()))?;

    let story = input.story.trim();
    let feeling = input.feeling.trim();
    validate_post(story, feeling).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let meta = PostMeta {
        raw_ip: request_meta.raw_ip,
        ip_hash: request_meta.ip_hash,
        user_agent: request_meta.user_agent,
        accept_lang: request_meta.accept_lang,
        referer: request_meta.referer,
        client_tz: input.client_tz.trim().to_string(),
        client_lang: input.client_lang.trim().to_string(),
        screen: input.screen.trim().to_string(),
        platform: input.platform.trim().to_string(),
    };

    let created = post_store::insert(&state.db, story, feeling, &meta)?;
    tracing::debug!("post {} created", created.id);

    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/posts?limit=N
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Post>>> {
    let limit = effective_limit(query.limit.as_deref());
    let posts = post_store::list_recent(&state.db, limit)?;
    Ok(Json(posts))
}

/// OPTIONS /api/posts preflight; the CORS layer adds the headers.
async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Out-of-range and non-numeric limits silently fall back to the
/// default rather than rejecting the request.
fn effective_limit(raw: Option<&str>) -> i64 {
    raw.map(str::trim)
        .and_then(|value| value.parse::<i64>().ok())
        .filter(|n| (1..=MAX_LIMIT).contains(n))
        .unwrap_or(DEFAULT_LIMIT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/posts", post(create).get(list).options(preflight))
        .layer(middleware::from_fn(cors::apply))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_when_absent() {
        assert_eq!(effective_limit(None), DEFAULT_LIMIT);
    }

    #[test]
    fn limit_accepts_in_range_values() {
        assert_eq!(effective_limit(Some("1")), 1);
        assert_eq!(effective_limit(Some("2")), 2);
        assert_eq!(effective_limit(Some("500")), 500);
        assert_eq!(effective_limit(Some(" 25 ")), 25);
    }

    #[test]
    fn limit_falls_back_when_out_of_range() {
        assert_eq!(effective_limit(Some("0")), DEFAULT_LIMIT);
        assert_eq!(effective_limit(Some("-3")), DEFAULT_LIMIT);
        assert_eq!(effective_limit(Some("501")), DEFAULT_LIMIT);
        assert_eq!(effective_limit(Some("1000")), DEFAULT_LIMIT);
    }

    #[test]
    fn limit_falls_back_when_not_numeric() {
        assert_eq!(effective_limit(Some("abc")), DEFAULT_LIMIT);
        assert_eq!(effective_limit(Some("")), DEFAULT_LIMIT);
        assert_eq!(effective_limit(Some("2.5")), DEFAULT_LIMIT);
    }
}
