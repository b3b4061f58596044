mod test_utils;

use actix_web::{
    http::StatusCode,
    middleware::NormalizePath,
    test, web, App,
};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use stage_store::{
    auth::jwt::JWT_ALGORITHM,
    entities::token::Claims,
    middlewares::auth::AuthMiddleware,
    routes::configure_routes,
};
use test_utils::*;

macro_rules! spawn_app {
    ($store:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($store.app_state()))
                .wrap(NormalizePath::trim())
                .wrap(AuthMiddleware)
                .configure(configure_routes),
        )
        .await
    };
}

fn bearer(sub: &str, admin: bool) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", mint_token(sub, admin)))
}

fn snapshot_body(manual: bool) -> Value {
    json!({
        "text_drafts": [{ "id": "t1", "content": "hello" }],
        "image_drafts": [],
        "chat_id": "c1",
        "is_manual_save": manual
    })
}

#[actix_rt::test]
async fn home_is_public_and_api_requires_a_token() {
    let store = TestStore::new();
    let app = spawn_app!(store);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/snapshots").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/snapshots")
            .insert_header(("Authorization", "Bearer not-a-token"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn image_lifecycle_is_scoped_to_the_caller() {
    let store = TestStore::new();
    let app = spawn_app!(store);

    let req = test::TestRequest::post()
        .uri("/api/v1/images")
        .insert_header(bearer("u1", false))
        .set_json(json!({
            "data": data_uri(&png_bytes(300)),
            "title": "Cover",
            "model_id": "image-gen-2",
            "width": 512,
            "height": 512,
            "chat_id": "c1",
            "user_id": "someone-else"
        }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["owner_id"], "u1");
    assert_eq!(created["url"], format!("/generated-images/{}.png", id));

    let req = test::TestRequest::get()
        .uri("/api/v1/images?chat_id=c1")
        .insert_header(bearer("u1", false))
        .to_request();
    let listed: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed.len(), 1);

    let req = test::TestRequest::get()
        .uri("/api/v1/images")
        .insert_header(bearer("u2", false))
        .to_request();
    let listed: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert!(listed.is_empty());

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/images/{}", id))
        .insert_header(bearer("u2", false))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/images/{}", id))
        .insert_header(bearer("u1", false))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/images/{}", id))
        .insert_header(bearer("u1", false))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn snapshots_cannot_be_taken_over_or_deleted_by_other_owners() {
    let store = TestStore::new();
    let app = spawn_app!(store);

    let req = test::TestRequest::put()
        .uri("/api/v1/snapshots/s1")
        .insert_header(bearer("u1", false))
        .set_json(snapshot_body(false))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::put()
        .uri("/api/v1/snapshots/s1")
        .insert_header(bearer("u2", false))
        .set_json(snapshot_body(true))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri("/api/v1/snapshots/s1")
        .insert_header(bearer("u2", false))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri("/api/v1/snapshots?id=s1")
        .insert_header(bearer("u1", false))
        .to_request();
    let listed: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["conversation_id"], "c1");
    assert_eq!(listed[0]["payload"]["text_drafts"][0]["content"], "hello");

    let req = test::TestRequest::get()
        .uri("/api/v1/snapshots")
        .insert_header(bearer("u2", false))
        .to_request();
    let listed: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert!(listed.is_empty());
}

#[actix_rt::test]
async fn clearing_everything_is_admin_only() {
    let store = TestStore::new();
    let app = spawn_app!(store);

    for (id, owner) in [("a", "u1"), ("b", "u2")] {
        let req = test::TestRequest::put()
            .uri(&format!("/api/v1/snapshots/{}", id))
            .insert_header(bearer(owner, false))
            .set_json(snapshot_body(true))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    let req = test::TestRequest::delete()
        .uri("/admin/snapshots")
        .insert_header(bearer("u1", false))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri("/api/v1/snapshots")
        .insert_header(bearer("u1", false))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["removed"], 1);

    let req = test::TestRequest::delete()
        .uri("/admin/snapshots")
        .insert_header(bearer("root", true))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["removed"], 1);
}

#[actix_rt::test]
async fn admin_cleanup_and_health_report_storage() {
    let store = TestStore::new();
    let app = spawn_app!(store);

    for _ in 0..3 {
        store.assets
            .save_image(stage_store::entities::asset::ImageData::Bytes(png_bytes(1000)), metadata(None, None))
            .await
            .unwrap();
        tick().await;
    }

    let req = test::TestRequest::post()
        .uri("/admin/images/cleanup")
        .insert_header(bearer("root", true))
        .set_json(json!({ "max_size_mb": mb(2000) }))
        .to_request();
    let report: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(report["bytes_before"], 3000);
    assert_eq!(report["deleted"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::get()
        .uri("/admin/health")
        .insert_header(bearer("root", true))
        .to_request();
    let health: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(health["backend"], "filesystem");
    assert_eq!(health["database"], "Not configured");
    assert_eq!(health["asset_files"], 1);
}

#[actix_rt::test]
async fn rejected_tokens_get_auth_error_bodies() {
    let store = TestStore::new();
    let app = spawn_app!(store);

    let issued = Utc::now().timestamp() as usize - 7200;
    let expired = encode(
        &Header::new(JWT_ALGORITHM),
        &Claims { sub: "u1".to_string(), admin: false, exp: issued + 60, iat: issued },
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap();

    let req = test::TestRequest::get()
        .uri("/api/v1/images")
        .insert_header(("Authorization", format!("Bearer {}", expired)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Token has expired");

    let req = test::TestRequest::get()
        .uri("/api/v1/images")
        .insert_header(("Authorization", format!("Token {}", mint_token("u1", false))))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/admin/health")
        .insert_header(bearer("u1", false))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Forbidden: Admin access required");
}
