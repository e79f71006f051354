//! Users API handlers.
//!
//! ```text
//! POST /users/create {"email":"ada@example.com","name":"Ada","age":36}
//! POST /users/delete/{id}
//! GET  /users/?id=1
//! GET  /users/{id}
//! ```

use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::ports::UserRepository;
use crate::domain::{CreateUser, DomainError, User, UserId, UserService};
use crate::inbound::http::ApiResult;
use crate::inbound::http::envelope;
use crate::inbound::http::validation::{
    AGE, ID, NAME, NAME_MAX_CHARS, missing_field_error, parse_user_id, require_at_least,
    require_length, validate_email,
};
use crate::middleware::RequestUnitOfWork;

/// Request body for `POST /users/create`.
#[derive(Debug, Deserialize, Serialize)]
pub struct CreateUserRequest {
    /// Contact address; must be unique.
    pub email: String,
    /// Display name, 1 to 80 characters.
    pub name: String,
    /// Age in years; non-negative when given.
    #[serde(default)]
    pub age: Option<i32>,
}

impl TryFrom<CreateUserRequest> for CreateUser {
    type Error = DomainError;

    fn try_from(value: CreateUserRequest) -> Result<Self, Self::Error> {
        validate_email(&value.email)?;
        require_length(NAME, &value.name, 1, Some(NAME_MAX_CHARS))?;
        if let Some(age) = value.age {
            require_at_least(AGE, i64::from(age), 0)?;
        }
        Ok(Self {
            email: value.email,
            name: value.name,
            age: value.age,
        })
    }
}

/// Query string for `GET /users/`.
#[derive(Debug, Deserialize)]
pub struct UserLookup {
    /// Raw identifier; required.
    pub id: Option<String>,
}

/// User representation returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    /// User identifier.
    pub id: UserId,
    /// Contact address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Age in years, when known.
    pub age: Option<i32>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            age: user.age,
        }
    }
}

fn user_response(user: User) -> HttpResponse {
    HttpResponse::Ok().json(envelope::success(UserView::from(user)))
}

/// Register the user routes on a scope mounted at `/users`.
pub fn routes<U: UserRepository>(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(get_user_by_query::<U>))
        .route("/create", web::post().to(create_user::<U>))
        .route("/delete/{id}", web::post().to(delete_user::<U>))
        .route("/{id}", web::get().to(get_user::<U>));
}

/// Create a user.
pub async fn create_user<U: UserRepository>(
    service: web::Data<UserService<U>>,
    uow: RequestUnitOfWork<U::Tx>,
    payload: web::Json<CreateUserRequest>,
) -> ApiResult<HttpResponse> {
    let command = CreateUser::try_from(payload.into_inner())?;
    let mut uow = uow.lock().await;
    let mut session = uow.session()?;
    let user = service.create_user(&mut session, command).await?;
    Ok(user_response(user))
}

/// Hard delete a user and, by cascade, their posts.
pub async fn delete_user<U: UserRepository>(
    service: web::Data<UserService<U>>,
    uow: RequestUnitOfWork<U::Tx>,
    id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_user_id(&id, ID)?;
    let mut uow = uow.lock().await;
    let mut session = uow.session()?;
    service.delete_user(&mut session, id).await?;
    Ok(HttpResponse::Ok().json(envelope::success(
        json!({"message": "User deleted successfully"}),
    )))
}

/// Fetch a user by path identifier.
pub async fn get_user<U: UserRepository>(
    service: web::Data<UserService<U>>,
    uow: RequestUnitOfWork<U::Tx>,
    id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_user_id(&id, ID)?;
    let mut uow = uow.lock().await;
    let mut session = uow.session()?;
    let user = service.get_user_by_id(&mut session, id).await?;
    Ok(user_response(user))
}

/// Fetch a user by the `id` query parameter.
pub async fn get_user_by_query<U: UserRepository>(
    service: web::Data<UserService<U>>,
    uow: RequestUnitOfWork<U::Tx>,
    query: web::Query<UserLookup>,
) -> ApiResult<HttpResponse> {
    let raw = query
        .into_inner()
        .id
        .ok_or_else(|| missing_field_error(ID))?;
    let id = parse_user_id(&raw, ID)?;
    let mut uow = uow.lock().await;
    let mut session = uow.session()?;
    let user = service.get_user_by_id(&mut session, id).await?;
    Ok(user_response(user))
}

#[cfg(test)]
#[path = "users_tests.rs"]
mod tests;
