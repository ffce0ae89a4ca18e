//! Posts routes
//!
//! CRUD over the posts table. All routes require authentication;
//! update and delete additionally require ownership. The single-post read
//! goes through the response cache (cache-aside, 600 second TTL); the
//! cache is advisory, so writes do not invalidate it and a read may serve
//! a stale payload for up to the TTL.

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

use crate::auth::Claims;
use crate::cache::{cache_key, ResponseCache};
use crate::error::{AppError, AuthError, DatabaseError};
use crate::validators::is_valid_post_name;

const SINGLE_POST_TTL: Duration = Duration::from_secs(600);

#[derive(Deserialize)]
pub struct CreatePostRequest {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
pub struct UpdatePostRequest {
    pub name: String,
}

#[derive(Serialize, Debug)]
pub struct PostResponse {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub tags: Vec<String>,
    pub created_at: String,
}

type PostRow = (Uuid, Uuid, String, Vec<String>, chrono::DateTime<Utc>);

fn post_response(row: PostRow) -> PostResponse {
    PostResponse {
        id: row.0.to_string(),
        user_id: row.1.to_string(),
        name: row.2,
        tags: row.3,
        created_at: row.4.to_rfc3339(),
    }
}

async fn fetch_post(pool: &PgPool, post_id: Uuid) -> Result<Option<PostRow>, AppError> {
    let row = sqlx::query_as::<_, PostRow>(
        "SELECT id, user_id, name, tags, created_at FROM posts WHERE id = $1",
    )
    .bind(post_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

async fn user_owns_post(pool: &PgPool, post_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
    let owner = sqlx::query_as::<_, (Uuid,)>("SELECT user_id FROM posts WHERE id = $1")
        .bind(post_id)
        .fetch_optional(pool)
        .await?;

    match owner {
        None => Err(DatabaseError::NotFound("Post not found".to_string()).into()),
        Some((owner_id,)) => Ok(owner_id == user_id),
    }
}

/// POST /api/posts
pub async fn create_post(
    form: web::Json<CreatePostRequest>,
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id()?;
    let name = is_valid_post_name(&form.name)?;

    let post_id = Uuid::new_v4();
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO posts (id, user_id, name, tags, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(post_id)
    .bind(user_id)
    .bind(&name)
    .bind(&form.tags)
    .bind(now)
    .bind(now)
    .execute(pool.get_ref())
    .await?;

    tracing::info!(post_id = %post_id, user_id = %user_id, "Post created");

    Ok(HttpResponse::Created().json(PostResponse {
        id: post_id.to_string(),
        user_id: user_id.to_string(),
        name,
        tags: form.tags.clone(),
        created_at: now.to_rfc3339(),
    }))
}

/// GET /api/posts
pub async fn get_all_posts(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let rows = sqlx::query_as::<_, PostRow>(
        "SELECT id, user_id, name, tags, created_at FROM posts ORDER BY created_at DESC",
    )
    .fetch_all(pool.get_ref())
    .await?;

    let posts: Vec<PostResponse> = rows.into_iter().map(post_response).collect();
    Ok(HttpResponse::Ok().json(posts))
}

/// GET /api/posts/{post_id}
///
/// Cache-aside read: serve the cached payload when present, otherwise hit
/// the database and populate the cache.
pub async fn get_post(
    req: HttpRequest,
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    cache: web::Data<ResponseCache>,
) -> Result<HttpResponse, AppError> {
    let post_id = path.into_inner();
    let key = cache_key(req.path(), req.query_string());

    if let Some(cached) = cache.get(&key).await {
        return Ok(HttpResponse::Ok()
            .content_type("application/json")
            .body(cached));
    }

    let row = fetch_post(pool.get_ref(), post_id)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Post not found".to_string()))?;

    let response = post_response(row);
    cache.put(&key, &response, SINGLE_POST_TTL).await;

    Ok(HttpResponse::Ok().json(response))
}

/// PUT /api/posts/{post_id}
pub async fn update_post(
    path: web::Path<Uuid>,
    form: web::Json<UpdatePostRequest>,
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let post_id = path.into_inner();
    let user_id = claims.user_id()?;
    let name = is_valid_post_name(&form.name)?;

    if !user_owns_post(pool.get_ref(), post_id, user_id).await? {
        return Err(AuthError::NotResourceOwner.into());
    }

    sqlx::query("UPDATE posts SET name = $1, updated_at = $2 WHERE id = $3")
        .bind(&name)
        .bind(Utc::now())
        .bind(post_id)
        .execute(pool.get_ref())
        .await?;

    let row = fetch_post(pool.get_ref(), post_id)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Post not found".to_string()))?;

    Ok(HttpResponse::Ok().json(post_response(row)))
}

/// DELETE /api/posts/{post_id}
pub async fn delete_post(
    path: web::Path<Uuid>,
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let post_id = path.into_inner();
    let user_id = claims.user_id()?;

    if !user_owns_post(pool.get_ref(), post_id, user_id).await? {
        return Err(AuthError::NotResourceOwner.into());
    }

    sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(post_id)
        .execute(pool.get_ref())
        .await?;

    tracing::info!(post_id = %post_id, user_id = %user_id, "Post deleted");

    Ok(HttpResponse::NoContent().finish())
}
