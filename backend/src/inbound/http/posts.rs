//! Posts API handlers.
//!
//! ```text
//! POST /posts/create {"author_id":1,"content":"hello","caption":null}
//! POST /posts/update {"id":1,"content":"edited"}
//! POST /posts/delete {"id":1}
//! GET  /posts/{id}
//! GET  /posts/author/{author_id}
//! GET  /posts/?limit=100&offset=0
//! ```

use actix_web::{HttpResponse, web};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::ports::PostRepository;
use crate::domain::{
    CreatePost, DeletePost, DomainError, Post, PostId, PostService, UpdatePost, UserId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::envelope;
use crate::inbound::http::validation::{
    AUTHOR_ID, CAPTION, CAPTION_MAX_CHARS, CONTENT, ID, parse_page, parse_post_id,
    parse_user_id, require_at_least, require_length,
};
use crate::middleware::RequestUnitOfWork;

/// Request body for `POST /posts/create`.
#[derive(Debug, Deserialize, Serialize)]
pub struct CreatePostRequest {
    /// Author's user id; must be positive.
    pub author_id: i64,
    /// Post body; at least one character.
    pub content: String,
    /// Optional caption of at most 255 characters.
    #[serde(default)]
    pub caption: Option<String>,
}

fn validate_caption(caption: Option<&str>) -> Result<(), DomainError> {
    caption.map_or(Ok(()), |caption| {
        require_length(CAPTION, caption, 0, Some(CAPTION_MAX_CHARS))
    })
}

impl TryFrom<CreatePostRequest> for CreatePost {
    type Error = DomainError;

    fn try_from(value: CreatePostRequest) -> Result<Self, Self::Error> {
        let author_id = require_at_least(AUTHOR_ID, value.author_id, 1)?;
        require_length(CONTENT, &value.content, 1, None)?;
        validate_caption(value.caption.as_deref())?;
        Ok(Self {
            author_id: UserId::new(author_id),
            content: value.content,
            caption: value.caption,
        })
    }
}

/// Request body for `POST /posts/update`.
#[derive(Debug, Deserialize, Serialize)]
pub struct UpdatePostRequest {
    /// Post to edit.
    pub id: i64,
    /// Replacement body, if changing it.
    #[serde(default)]
    pub content: Option<String>,
    /// Replacement caption, if changing it.
    #[serde(default)]
    pub caption: Option<String>,
}

impl TryFrom<UpdatePostRequest> for UpdatePost {
    type Error = DomainError;

    fn try_from(value: UpdatePostRequest) -> Result<Self, Self::Error> {
        let id = require_at_least(ID, value.id, 1)?;
        if let Some(content) = value.content.as_deref() {
            require_length(CONTENT, content, 1, None)?;
        }
        validate_caption(value.caption.as_deref())?;
        Ok(Self {
            id: PostId::new(id),
            content: value.content,
            caption: value.caption,
        })
    }
}

/// Request body for `POST /posts/delete`.
#[derive(Debug, Deserialize, Serialize)]
pub struct DeletePostRequest {
    /// Post to soft delete.
    pub id: i64,
}

impl TryFrom<DeletePostRequest> for DeletePost {
    type Error = DomainError;

    fn try_from(value: DeletePostRequest) -> Result<Self, Self::Error> {
        let id = require_at_least(ID, value.id, 1)?;
        Ok(Self {
            id: PostId::new(id),
        })
    }
}

/// Query string for `GET /posts/`.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// Page size, 1 to 500; defaults to 100.
    pub limit: Option<String>,
    /// Rows to skip; defaults to 0.
    pub offset: Option<String>,
}

/// Post representation returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostView {
    /// Post identifier.
    pub id: PostId,
    /// Author's user id.
    pub author_id: UserId,
    /// Post body.
    pub content: String,
    /// Caption, when set.
    pub caption: Option<String>,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

impl From<Post> for PostView {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            author_id: post.author_id,
            content: post.content,
            caption: post.caption,
            created_at: post.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }
}

fn post_response(post: Post) -> HttpResponse {
    HttpResponse::Ok().json(envelope::success(PostView::from(post)))
}

fn views(posts: Vec<Post>) -> Vec<PostView> {
    posts.into_iter().map(PostView::from).collect()
}

/// Register the post routes on a scope mounted at `/posts`.
pub fn routes<P: PostRepository>(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(list_posts::<P>))
        .route("/create", web::post().to(create_post::<P>))
        .route("/update", web::post().to(update_post::<P>))
        .route("/delete", web::post().to(delete_post::<P>))
        .route("/author/{author_id}", web::get().to(get_posts_by_author::<P>))
        .route("/{id}", web::get().to(get_post::<P>));
}

/// Publish a post.
pub async fn create_post<P: PostRepository>(
    service: web::Data<PostService<P>>,
    uow: RequestUnitOfWork<P::Tx>,
    payload: web::Json<CreatePostRequest>,
) -> ApiResult<HttpResponse> {
    let command = CreatePost::try_from(payload.into_inner())?;
    let mut uow = uow.lock().await;
    let mut session = uow.session()?;
    let post = service.create_post(&mut session, command).await?;
    Ok(post_response(post))
}

/// Edit a live post's content and/or caption.
pub async fn update_post<P: PostRepository>(
    service: web::Data<PostService<P>>,
    uow: RequestUnitOfWork<P::Tx>,
    payload: web::Json<UpdatePostRequest>,
) -> ApiResult<HttpResponse> {
    let command = UpdatePost::try_from(payload.into_inner())?;
    let mut uow = uow.lock().await;
    let mut session = uow.session()?;
    let post = service.update_post(&mut session, command).await?;
    Ok(post_response(post))
}

/// Soft delete a post.
pub async fn delete_post<P: PostRepository>(
    service: web::Data<PostService<P>>,
    uow: RequestUnitOfWork<P::Tx>,
    payload: web::Json<DeletePostRequest>,
) -> ApiResult<HttpResponse> {
    let command = DeletePost::try_from(payload.into_inner())?;
    let mut uow = uow.lock().await;
    let mut session = uow.session()?;
    service.delete_post(&mut session, command).await?;
    Ok(HttpResponse::Ok().json(envelope::success(
        json!({"message": "Post deleted successfully"}),
    )))
}

/// Fetch a live post by path identifier.
pub async fn get_post<P: PostRepository>(
    service: web::Data<PostService<P>>,
    uow: RequestUnitOfWork<P::Tx>,
    id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_post_id(&id, ID)?;
    let mut uow = uow.lock().await;
    let mut session = uow.session()?;
    let post = service.get_post_by_id(&mut session, id).await?;
    Ok(post_response(post))
}

/// Live posts by one author. An unknown author yields an empty list.
pub async fn get_posts_by_author<P: PostRepository>(
    service: web::Data<PostService<P>>,
    uow: RequestUnitOfWork<P::Tx>,
    author_id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let author_id = parse_user_id(&author_id, AUTHOR_ID)?;
    let mut uow = uow.lock().await;
    let mut session = uow.session()?;
    let posts = service.get_posts_by_author(&mut session, author_id).await?;
    Ok(HttpResponse::Ok().json(envelope::success(json!({"posts": views(posts)}))))
}

/// Page through live posts, echoing the applied `limit` and `offset`.
pub async fn list_posts<P: PostRepository>(
    service: web::Data<PostService<P>>,
    uow: RequestUnitOfWork<P::Tx>,
    query: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let PageQuery { limit, offset } = query.into_inner();
    let page = parse_page(limit.as_deref(), offset.as_deref())?;
    let mut uow = uow.lock().await;
    let mut session = uow.session()?;
    let posts = service.get_all_posts(&mut session, page).await?;
    Ok(HttpResponse::Ok().json(envelope::success(json!({
        "posts": views(posts),
        "limit": page.limit,
        "offset": page.offset,
    }))))
}

#[cfg(test)]
#[path = "posts_tests.rs"]
mod tests;
