// Blog HTTP Interface - thin JSON layer over BlogService and TopicService

use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, Query, State},
    middleware,
    response::{IntoResponse, Json, Redirect, Response},
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    app_state::AppState,
    blog::ImageUpload,
    error::{AppError, AppResult},
    infrastructure::middleware::{viewer_context_middleware, Vc},
    models::{CommentId, Post, PostDetail, PostId, PostPage, ReactionState, Topic, TopicId, User},
    services::PostForm,
};

pub const API_PREFIX: &str = "/api/v1";

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TagFilterQuery {
    pub multiple_tags: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TitleFilterQuery {
    pub title_to_find: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub body: String,
    pub replied_to: Option<CommentId>,
}

#[derive(Debug, Deserialize)]
pub struct TopicRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
}

/// Full application: API routes, identity middleware and image serving
pub fn create_app(state: AppState) -> Router {
    let images_path = format!("/{}", state.config.blog.images_prefix.trim_matches('/'));
    let images_dir = ServeDir::new(&state.config.blog.images_folder);

    Router::new()
        .nest(API_PREFIX, create_blog_router(state))
        .nest_service(&images_path, images_dir)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub fn create_blog_router(state: AppState) -> Router {
    Router::new()
        .route("/posts", get(index).post(create_post))
        .route("/posts/filter_tag", get(filter_tag))
        .route("/posts/filter_title", get(filter_title))
        .route("/posts/{id}", get(get_post).put(update_post).delete(delete_post))
        .route("/posts/{id}/detail", get(post_detail))
        .route("/posts/{id}/like", post(like))
        .route("/posts/{id}/dislike", post(dislike))
        .route("/posts/{id}/comments", post(comment))
        .route("/comments/{id}", delete(uncomment))
        .route("/tags", get(tags))
        .route("/topics", get(list_topics).post(create_topic))
        .route("/topics/names", get(topic_names))
        .route("/topics/{id}", get(get_topic).put(update_topic).delete(delete_topic))
        .route("/users", post(register_user))
        .layer(middleware::from_fn(viewer_context_middleware))
        .with_state(state)
}

fn listing_path() -> String {
    format!("{}/posts", API_PREFIX)
}

// === Posts ===

async fn index(State(state): State<AppState>, Query(query): Query<PageQuery>) -> AppResult<Json<PostPage>> {
    Ok(Json(state.blog.index(query.page.as_deref()).await?))
}

async fn filter_tag(
    State(state): State<AppState>,
    Query(query): Query<TagFilterQuery>,
) -> AppResult<Response> {
    match state.blog.filter_by_tags(query.multiple_tags.as_deref()).await? {
        Some(posts) => Ok(Json(json!({
            "posts": posts,
            "multiple_tags": query.multiple_tags,
            "tags": state.blog.tags().await?,
        }))
        .into_response()),
        None => Ok(Redirect::to(&listing_path()).into_response()),
    }
}

async fn filter_title(
    State(state): State<AppState>,
    Query(query): Query<TitleFilterQuery>,
) -> AppResult<Response> {
    match state.blog.filter_by_title(query.title_to_find.as_deref()).await? {
        Some(posts) => Ok(Json(json!({
            "posts": posts,
            "title_to_find": query.title_to_find,
            "tags": state.blog.tags().await?,
        }))
        .into_response()),
        None => Ok(Redirect::to(&listing_path()).into_response()),
    }
}

async fn create_post(
    State(state): State<AppState>,
    vc: Vc,
    multipart: Multipart,
) -> AppResult<Json<Value>> {
    let (form, image) = read_post_form(multipart).await?;
    let id = state.blog.create_post(&vc, form, image).await?;
    Ok(Json(json!({"id": id, "created": true})))
}

async fn get_post(State(state): State<AppState>, vc: Vc, Path(id): Path<PostId>) -> AppResult<Json<Post>> {
    Ok(Json(state.blog.get_post(&vc, id, false).await?))
}

async fn post_detail(
    State(state): State<AppState>,
    vc: Vc,
    Path(id): Path<PostId>,
) -> AppResult<Json<PostDetail>> {
    Ok(Json(state.blog.get_post_detail(&vc, id).await?))
}

async fn update_post(
    State(state): State<AppState>,
    vc: Vc,
    Path(id): Path<PostId>,
    multipart: Multipart,
) -> AppResult<Json<Value>> {
    let (form, image) = read_post_form(multipart).await?;
    state.blog.update_post(&vc, id, form, image).await?;
    Ok(Json(json!({"id": id, "updated": true})))
}

async fn delete_post(State(state): State<AppState>, vc: Vc, Path(id): Path<PostId>) -> AppResult<Json<Value>> {
    state.blog.delete_post(&vc, id).await?;
    Ok(Json(json!({"id": id, "deleted": true})))
}

async fn like(State(state): State<AppState>, vc: Vc, Path(id): Path<PostId>) -> AppResult<Json<Value>> {
    let reaction: ReactionState = state.blog.like(&vc, id).await?;
    Ok(Json(json!({"post_id": id, "like": reaction})))
}

async fn dislike(State(state): State<AppState>, vc: Vc, Path(id): Path<PostId>) -> AppResult<Json<Value>> {
    let reaction: ReactionState = state.blog.dislike(&vc, id).await?;
    Ok(Json(json!({"post_id": id, "dislike": reaction})))
}

async fn tags(State(state): State<AppState>) -> AppResult<Json<Vec<String>>> {
    Ok(Json(state.blog.tags().await?))
}

// === Comments ===

async fn comment(
    State(state): State<AppState>,
    vc: Vc,
    Path(id): Path<PostId>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let Json(request) = payload?;
    let comment_id = state
        .blog
        .add_comment(&vc, id, &request.body, request.replied_to)
        .await?;
    Ok(Json(json!({"id": comment_id, "post_id": id})))
}

async fn uncomment(
    State(state): State<AppState>,
    vc: Vc,
    Path(id): Path<CommentId>,
) -> AppResult<Json<Value>> {
    let post_id = state.blog.delete_comment(&vc, id).await?;
    Ok(Json(json!({"id": id, "post_id": post_id, "deleted": true})))
}

// === Topics ===

async fn list_topics(State(state): State<AppState>) -> AppResult<Json<Vec<Topic>>> {
    Ok(Json(state.topics.list_topics().await?))
}

async fn topic_names(State(state): State<AppState>) -> AppResult<Json<Vec<String>>> {
    Ok(Json(state.topics.topic_names().await?))
}

async fn create_topic(
    State(state): State<AppState>,
    vc: Vc,
    payload: Result<Json<TopicRequest>, JsonRejection>,
) -> AppResult<Json<Topic>> {
    let Json(request) = payload?;
    Ok(Json(state.topics.create_topic(&vc, &request.name).await?))
}

async fn get_topic(State(state): State<AppState>, vc: Vc, Path(id): Path<TopicId>) -> AppResult<Json<Topic>> {
    Ok(Json(state.topics.get_topic(&vc, id, false).await?))
}

async fn update_topic(
    State(state): State<AppState>,
    vc: Vc,
    Path(id): Path<TopicId>,
    payload: Result<Json<TopicRequest>, JsonRejection>,
) -> AppResult<Json<Topic>> {
    let Json(request) = payload?;
    Ok(Json(state.topics.update_topic(&vc, id, &request.name).await?))
}

async fn delete_topic(State(state): State<AppState>, vc: Vc, Path(id): Path<TopicId>) -> AppResult<Json<Value>> {
    state.topics.delete_topic(&vc, id).await?;
    Ok(Json(json!({"id": id, "deleted": true})))
}

// === Users ===

async fn register_user(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<Json<User>> {
    let Json(request) = payload?;
    Ok(Json(state.blog.register_user(&request.username).await?))
}

/// Read `title`, `body`, `tags` and an optional `file` part
async fn read_post_form(mut multipart: Multipart) -> AppResult<(PostForm, Option<ImageUpload>)> {
    let mut form = PostForm::default();
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart data: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read file: {}", e)))?;
                image = Some(ImageUpload {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            "title" | "body" | "tags" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read {}: {}", name, e)))?;
                match name.as_str() {
                    "title" => form.title = value,
                    "body" => form.body = value,
                    _ => form.tags = value,
                }
            }
            _ => {}
        }
    }

    Ok((form, image))
}
