//! Behavioural tests for the users and posts endpoints over in-memory
//! storage, driven through the same wiring the binary uses.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test};
use backend::Trace;
use backend::domain::{PostService, UserService};
use backend::inbound::http::{HttpState, configure_api};
use backend::middleware::{Authenticate, JwtConfig};
use backend::outbound::memory::{MemoryPostRepository, MemoryStorage, MemoryUserRepository};
use mockable::DefaultClock;
use rstest::rstest;
use serde_json::{Value, json};

macro_rules! app {
    ($storage:expr) => {
        test::init_service(
            App::new()
                .configure(configure_api(HttpState::new(
                    Arc::new($storage.clone()),
                    UserService::new(Arc::new(MemoryUserRepository)),
                    PostService::new(Arc::new(MemoryPostRepository), Arc::new(DefaultClock)),
                )))
                .wrap(Authenticate::new(JwtConfig {
                    secret: "integration".to_owned(),
                    algorithm: "HS256".to_owned(),
                    expire_minutes: 5,
                }))
                .wrap(Trace),
        )
        .await
    };
}

macro_rules! call {
    ($app:expr, $req:expr) => {{
        let res = test::call_service(&$app, $req.to_request()).await;
        let status = res.status();
        let body: Value = serde_json::from_slice(&test::read_body(res).await).expect("JSON body");
        (status, body)
    }};
}

fn post(uri: &str, body: Value) -> test::TestRequest {
    test::TestRequest::post().uri(uri).set_json(body)
}

fn get(uri: &str) -> test::TestRequest {
    test::TestRequest::get().uri(uri)
}

#[rstest]
#[actix_rt::test]
async fn soft_deleted_posts_disappear_from_every_read() {
    let storage = MemoryStorage::new();
    let app = app!(storage);
    let (_, user) = call!(
        app,
        post("/users/create", json!({"email": "grace@example.com", "name": "Grace", "age": 45}))
    );
    let author = user["data"]["id"].clone();
    let mut ids = Vec::new();
    for content in ["first", "second"] {
        let (status, created) = call!(
            app,
            post("/posts/create", json!({"author_id": author, "content": content}))
        );
        assert_eq!(status, StatusCode::OK);
        ids.push(created["data"]["id"].clone());
    }

    let (status, deleted) = call!(app, post("/posts/delete", json!({"id": ids[0]})));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted, json!({"success": true, "data": {"message": "Post deleted successfully"}, "meta": {}}));

    let (status, _) = call!(app, get(&format!("/posts/{}", ids[0])));
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, listed) = call!(app, get("/posts/"));
    assert_eq!(listed["data"]["posts"].as_array().map(Vec::len), Some(1));
    let (_, by_author) = call!(app, get(&format!("/posts/author/{author}")));
    assert_eq!(by_author["data"]["posts"][0]["id"], ids[1]);

    let (status, again) = call!(app, post("/posts/delete", json!({"id": ids[0]})));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(again["error"]["details"], json!({"id": ids[0]}));
    assert_eq!(storage.post_count(), 2);
}

#[rstest]
#[actix_rt::test]
async fn deleting_a_user_takes_their_posts() {
    let storage = MemoryStorage::new();
    let app = app!(storage);
    let (_, user) = call!(app, post("/users/create", json!({"email": "a@b.io", "name": "A"})));
    let author = user["data"]["id"].clone();
    call!(app, post("/posts/create", json!({"author_id": author, "content": "x"})));

    let (status, body) = call!(
        app,
        test::TestRequest::post().uri(&format!("/users/delete/{author}"))
    );

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], json!("User deleted successfully"));
    assert_eq!((storage.user_count(), storage.post_count()), (0, 0));
}

#[rstest]
#[case(post("/posts/create", json!({"author_id": 404, "content": "orphan"})), StatusCode::NOT_FOUND, "not_found")]
#[case(post("/posts/update", json!({"id": 999, "caption": "c"})), StatusCode::NOT_FOUND, "not_found")]
#[case(post("/posts/create", json!({"author_id": 1, "content": "  "})), StatusCode::UNPROCESSABLE_ENTITY, "validation_error")]
#[case(post("/users/create", json!({"email": "x", "name": "X"})), StatusCode::UNPROCESSABLE_ENTITY, "validation_error")]
#[case(get("/users/99"), StatusCode::NOT_FOUND, "not_found")]
#[case(
    test::TestRequest::post()
        .uri("/posts/delete")
        .insert_header(("content-type", "application/json"))
        .set_payload("{"),
    StatusCode::BAD_REQUEST,
    "bad_request"
)]
#[actix_rt::test]
async fn failures_use_the_error_envelope(
    #[case] req: test::TestRequest,
    #[case] status: StatusCode,
    #[case] code: &str,
) {
    let storage = MemoryStorage::new();
    let app = app!(storage);

    let (observed, body) = call!(app, req);

    assert_eq!(observed, status);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["code"], json!(code));
    assert!(body["error"]["message"].is_string());
    assert_eq!(storage.stats().commits, 0);
}
