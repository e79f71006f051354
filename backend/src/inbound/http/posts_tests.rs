//! Tests for the posts handlers.

use actix_web::http::StatusCode;
use actix_web::test;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use crate::inbound::http::test_utils::{api_app, json_body};
use crate::outbound::memory::MemoryStorage;

#[fixture]
fn storage() -> MemoryStorage {
    MemoryStorage::new()
}

fn post(uri: &str, body: Value) -> test::TestRequest {
    test::TestRequest::post().uri(uri).set_json(body)
}

fn get(uri: &str) -> test::TestRequest {
    test::TestRequest::get().uri(uri)
}

#[rstest]
#[actix_web::test]
async fn post_lifecycle_through_http(storage: MemoryStorage) {
    let app = test::init_service(api_app(&storage)).await;
    let author = json_body(
        test::call_service(
            &app,
            post("/users/create", json!({"email": "ada@example.com", "name": "Ada"})).to_request(),
        )
        .await,
    )
    .await["data"]["id"]
        .clone();

    let created = test::call_service(
        &app,
        post(
            "/posts/create",
            json!({"author_id": author, "content": "hello", "caption": "first"}),
        )
        .to_request(),
    )
    .await;
    assert_eq!(created.status(), StatusCode::OK);
    let created = json_body(created).await["data"].clone();
    assert_eq!(created["author_id"], author);
    assert_eq!(created["content"], json!("hello"));
    assert_eq!(created["caption"], json!("first"));
    assert!(created["created_at"].as_str().is_some_and(|ts| ts.ends_with('Z')));
    let id = created["id"].clone();

    let updated = test::call_service(
        &app,
        post("/posts/update", json!({"id": id, "content": "edited"})).to_request(),
    )
    .await;
    assert_eq!(updated.status(), StatusCode::OK);
    let updated = json_body(updated).await["data"].clone();
    assert_eq!(
        (&updated["content"], &updated["caption"]),
        (&json!("edited"), &json!("first"))
    );

    let by_author = json_body(
        test::call_service(&app, get(&format!("/posts/author/{author}")).to_request()).await,
    )
    .await;
    assert_eq!(by_author["data"]["posts"].as_array().map(Vec::len), Some(1));

    let deleted =
        test::call_service(&app, post("/posts/delete", json!({"id": id})).to_request()).await;
    assert_eq!(deleted.status(), StatusCode::OK);
    assert_eq!(
        json_body(deleted).await["data"],
        json!({"message": "Post deleted successfully"})
    );

    let gone = test::call_service(&app, get(&format!("/posts/{id}")).to_request()).await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    assert_eq!(storage.post_count(), 1);
}

#[rstest]
#[actix_web::test]
async fn updating_a_missing_post_is_not_found(storage: MemoryStorage) {
    let app = test::init_service(api_app(&storage)).await;

    let res = test::call_service(
        &app,
        post("/posts/update", json!({"id": 999, "content": "x"})).to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        json_body(res).await["error"],
        json!({"code": "not_found", "message": "Post not found.", "details": {"id": 999}})
    );
}

#[rstest]
#[case(json!({"author_id": 1, "content": ""}), "content")]
#[case(json!({"author_id": 0, "content": "hi"}), "author_id")]
#[case(json!({"author_id": 1, "content": "hi", "caption": "c".repeat(256)}), "caption")]
#[case(json!({"author_id": "one", "content": "hi"}), "body")]
#[actix_web::test]
async fn invalid_create_payloads_are_validation_errors(
    storage: MemoryStorage,
    #[case] body: Value,
    #[case] field: &str,
) {
    let app = test::init_service(api_app(&storage)).await;

    let res = test::call_service(&app, post("/posts/create", body).to_request()).await;

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(res).await["error"]["details"]["field"], json!(field));
    assert_eq!(storage.stats().inserts, 0);
}

#[rstest]
#[actix_web::test]
async fn whitespace_content_is_rejected_by_the_service(storage: MemoryStorage) {
    let app = test::init_service(api_app(&storage)).await;

    let res = test::call_service(
        &app,
        post("/posts/create", json!({"author_id": 1, "content": "   "})).to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        json_body(res).await["error"]["message"],
        json!("Post content cannot be empty.")
    );
    assert_eq!(storage.post_count(), 0);
}

#[rstest]
#[case("/posts/", json!({"posts": [], "limit": 100, "offset": 0}))]
#[case("/posts/?limit=5&offset=10", json!({"posts": [], "limit": 5, "offset": 10}))]
#[actix_web::test]
async fn listing_echoes_the_page(storage: MemoryStorage, #[case] uri: &str, #[case] data: Value) {
    let app = test::init_service(api_app(&storage)).await;

    let res = test::call_service(&app, get(uri).to_request()).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["data"], data);
}

#[rstest]
#[case("/posts/?limit=0")]
#[case("/posts/?limit=501")]
#[case("/posts/?offset=-1")]
#[case("/posts/?limit=many")]
#[case("/posts/author/zero")]
#[actix_web::test]
async fn out_of_range_parameters_are_validation_errors(storage: MemoryStorage, #[case] uri: &str) {
    let app = test::init_service(api_app(&storage)).await;

    let res = test::call_service(&app, get(uri).to_request()).await;

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        json_body(res).await["error"]["code"],
        json!("validation_error")
    );
}
