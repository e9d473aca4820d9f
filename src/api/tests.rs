// Router-level tests: real handlers, in-memory database, no network

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use super::{create_router, ForumState};
use crate::config::ForumConfig;
use crate::engine::Database;

async fn test_app() -> (Router, ForumState) {
    let config = ForumConfig::for_testing();
    let db = Database::in_memory().await.unwrap();
    db.seed_default_categories(&config.forum.default_categories)
        .await
        .unwrap();
    let state = ForumState::with_builtin_renderer(db, config);
    (create_router(state.clone()), state)
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn body_string(response: Response) -> String {
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

fn set_cookie(response: &Response) -> &str {
    response.headers()[header::SET_COOKIE].to_str().unwrap()
}

/// Register `username` and log in; returns the `name=value` cookie pair
async fn login_as(app: &Router, username: &str) -> String {
    let body = format!(
        "username={u}&email={u}%40example.com&password=hunter22",
        u = username
    );
    let response = send(app, post_form("/register", &body, None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let body = format!("username={}&password=hunter22", username);
    let response = send(app, post_form("/login", &body, None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    set_cookie(&response)
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

async fn create_post(app: &Router, cookie: &str, body: &str) -> i64 {
    let response = send(app, post_form("/create-post", body, Some(cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    location(&response)
        .trim_start_matches("/post/")
        .parse()
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = test_app().await;
    let response = send(&app, get("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["database"], "ok");
}

#[tokio::test]
async fn test_unknown_route_and_wrong_method() {
    let (app, _) = test_app().await;

    let response = send(&app, get("/nope", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, get("/comment", None)).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_registration_flow() {
    let (app, _) = test_app().await;

    let response = send(&app, get("/register", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app,
        post_form(
            "/register",
            "username=alice&email=alice%40example.com&password=hunter22",
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?registered=true");

    let response = send(&app, get("/login?registered=true", None)).await;
    assert!(body_string(response)
        .await
        .contains("Registration successful. Please log in."));

    let response = send(
        &app,
        post_form(
            "/register",
            "username=alice&email=other%40example.com&password=hunter22",
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(body_string(response)
        .await
        .contains("Username or email already exists"));

    let response = send(&app, post_form("/register", "username=bob", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(response).await.contains("All fields are required"));
}

#[tokio::test]
async fn test_login_and_logout() {
    let (app, state) = test_app().await;
    let cookie = login_as(&app, "alice").await;
    assert!(cookie.starts_with("session_token="));

    let response = send(
        &app,
        post_form("/login", "username=alice&password=wrong", None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_string(response)
        .await
        .contains("Invalid username or password"));

    let response = send(&app, post_form("/login", "username=&password=", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(response)
        .await
        .contains("Username and password are required"));

    let response = send(&app, get("/", Some(&cookie))).await;
    assert!(body_string(response).await.contains("Signed in as alice"));

    let response = send(&app, post_form("/logout", "", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert!(set_cookie(&response).contains("Max-Age=0"));

    assert_eq!(state.db.stats().await.unwrap().active_sessions, 0);
    let response = send(&app, get("/", Some(&cookie))).await;
    assert!(!body_string(response).await.contains("Signed in as"));
}

#[tokio::test]
async fn test_session_cookie_attributes() {
    let (app, _) = test_app().await;
    send(
        &app,
        post_form(
            "/register",
            "username=alice&email=alice%40example.com&password=hunter22",
            None,
        ),
    )
    .await;

    let response = send(
        &app,
        post_form("/login", "username=alice&password=hunter22", None),
    )
    .await;
    let cookie = set_cookie(&response);
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=86400"));
}

#[tokio::test]
async fn test_create_post_requires_login() {
    let (app, _) = test_app().await;

    let response = send(&app, get("/create-post", None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let response = send(
        &app,
        post_form("/create-post", "title=a&content=b", None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, get("/create-post", Some("session_token=bogus"))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_create_and_view_post() {
    let (app, _) = test_app().await;
    let cookie = login_as(&app, "alice").await;

    let response = send(&app, get("/create-post", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("Technology"));

    let post_id = create_post(
        &app,
        &cookie,
        "title=Hello+%3Cworld%3E&content=First&categories=1&categories=2",
    )
    .await;

    let response = send(&app, get(&format!("/post/{}", post_id), Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("Hello &lt;world&gt;"));
    assert!(html.contains("General"));
    assert!(html.contains("Technology"));
    assert!(html.contains(&format!("/edit-post/{}", post_id)));

    let response = send(&app, get(&format!("/post/{}", post_id), None)).await;
    assert!(!body_string(response)
        .await
        .contains(&format!("/delete-post/{}", post_id)));
}

#[tokio::test]
async fn test_create_post_validation() {
    let (app, state) = test_app().await;
    let cookie = login_as(&app, "alice").await;

    let response = send(
        &app,
        post_form("/create-post", "title=&content=body", Some(&cookie)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(response)
        .await
        .contains("Title and content are required"));

    let response = send(
        &app,
        post_form(
            "/create-post",
            "title=t&content=c&categories=99",
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(response).await.contains("Invalid category ID"));

    assert_eq!(state.db.stats().await.unwrap().posts, 0);
}

#[tokio::test]
async fn test_view_post_bad_and_missing_ids() {
    let (app, _) = test_app().await;

    let response = send(&app, get("/post/abc", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, get("/post/42", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_edit_and_delete_are_author_only() {
    let (app, _) = test_app().await;
    let alice = login_as(&app, "alice").await;
    let bob = login_as(&app, "bob").await;
    let post_id = create_post(&app, &alice, "title=Mine&content=Body&categories=1").await;

    let response = send(&app, get(&format!("/edit-post/{}", post_id), Some(&bob))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        &app,
        post_form(&format!("/edit-post/{}", post_id), "title=x&content=y", Some(&bob)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app, post_form(&format!("/delete-post/{}", post_id), "", Some(&bob))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app, post_form(&format!("/delete-post/{}", post_id), "", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, get(&format!("/edit-post/{}", post_id), Some(&alice))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("checked"));

    let response = send(
        &app,
        post_form(
            &format!("/edit-post/{}", post_id),
            "title=Edited&content=Body&categories=3",
            Some(&alice),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = send(&app, get(&format!("/post/{}", post_id), None)).await;
    let html = body_string(response).await;
    assert!(html.contains("Edited"));
    assert!(html.contains("Sports"));
    assert!(!html.contains(r#"<span class="category">General</span>"#));

    let response = send(&app, post_form(&format!("/delete-post/{}", post_id), "", Some(&alice))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let response = send(&app, get(&format!("/post/{}", post_id), None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, post_form(&format!("/delete-post/{}", post_id), "", Some(&alice))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_comments() {
    let (app, _) = test_app().await;
    let alice = login_as(&app, "alice").await;
    let post_id = create_post(&app, &alice, "title=T&content=C").await;

    let body = format!("post_id={}&content=Nice+post", post_id);
    let response = send(&app, post_form("/comment", &body, None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, post_form("/comment", &body, Some(&alice))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/post/{}", post_id));

    let response = send(&app, get(&format!("/post/{}", post_id), None)).await;
    assert!(body_string(response).await.contains("Nice post"));

    let response = send(
        &app,
        post_form("/comment", "post_id=abc&content=x", Some(&alice)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        post_form("/comment", "post_id=999&content=x", Some(&alice)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let empty = format!("post_id={}&content=+++", post_id);
    let response = send(&app, post_form("/comment", &empty, Some(&alice))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_like_endpoints() {
    let (app, state) = test_app().await;
    let alice = login_as(&app, "alice").await;
    let post_id = create_post(&app, &alice, "title=T&content=C").await;

    let like = format!("post_id={}&is_like=true", post_id);
    let dislike = format!("post_id={}&is_like=0", post_id);

    let response = send(&app, post_form("/like-post", &like, None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, post_form("/like-post", &like, Some(&alice))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json, serde_json::json!({ "likes": 1, "dislikes": 0 }));

    let response = send(&app, post_form("/like-post", &dislike, Some(&alice))).await;
    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json, serde_json::json!({ "likes": 0, "dislikes": 1 }));

    let response = send(&app, post_form("/like-post", &dislike, Some(&alice))).await;
    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json, serde_json::json!({ "likes": 0, "dislikes": 0 }));

    let bad = format!("post_id={}&is_like=maybe", post_id);
    let response = send(&app, post_form("/like-post", &bad, Some(&alice))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        post_form("/like-post", "post_id=999&is_like=true", Some(&alice)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let comment_id = state
        .db
        .comments()
        .add_comment(1, post_id, "hello")
        .await
        .unwrap();
    let body = format!("comment_id={}&is_like=1", comment_id);
    let response = send(&app, post_form("/like-comment", &body, Some(&alice))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["likes"], 1);

    let response = send(
        &app,
        post_form("/like-comment", "comment_id=999&is_like=1", Some(&alice)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_home_category_filter() {
    let (app, _) = test_app().await;
    let alice = login_as(&app, "alice").await;
    create_post(&app, &alice, "title=About+football&content=C&categories=3").await;
    create_post(&app, &alice, "title=About+compilers&content=C&categories=2").await;

    let html = body_string(send(&app, get("/", None)).await).await;
    assert!(html.contains("About football"));
    assert!(html.contains("About compilers"));

    let html = body_string(send(&app, get("/?category=3", None)).await).await;
    assert!(html.contains("About football"));
    assert!(!html.contains("About compilers"));
    assert!(html.contains("Posts in Sports"));

    let response = send(&app, get("/?category=999", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, get("/?category=abc", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_view_post_marks_viewer_reaction() {
    let (app, _) = test_app().await;
    let alice = login_as(&app, "alice").await;
    let bob = login_as(&app, "bob").await;
    let post_id = create_post(&app, &alice, "title=Hello&content=World").await;

    let body = format!("post_id={}&is_like=false", post_id);
    let response = send(&app, post_form("/like-post", &body, Some(&bob))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let uri = format!("/post/{}", post_id);
    let html = body_string(send(&app, get(&uri, Some(&bob))).await).await;
    assert!(html.contains(r#"class="dislike active""#));
    assert!(!html.contains(r#"class="like active""#));

    let html = body_string(send(&app, get(&uri, Some(&alice))).await).await;
    assert!(!html.contains("active\""));

    let html = body_string(send(&app, get(&uri, None)).await).await;
    assert!(html.contains(r#"<span class="dislikes">1</span>"#));
    assert!(!html.contains("active\""));
}
