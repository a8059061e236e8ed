//! Unit tests for the RPC handler: methods dispatched by `handle_method`
//! through the same code path as the `smartmark-rpc` binary.

use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;

use smartmark::app::App;
use smartmark::backend::local::LocalBackend;
use smartmark::rpc_handler::handle_method;
use smartmark::types::settings::AppSettings;

/// Create a fresh App backed by a temp directory DB.
fn setup() -> (App, TempDir) {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let backend = LocalBackend::open(tmp.path().join("test.db")).expect("Failed to open store");
    (App::new(Arc::new(backend), AppSettings::default()), tmp)
}

async fn call(app: &App, method: &str, params: Value) -> Value {
    handle_method(app, method, &params)
        .await
        .unwrap_or_else(|e| panic!("{} failed: {}", method, e))
}

async fn signed_in() -> (App, TempDir) {
    let (app, tmp) = setup();
    call(&app, "session.sign_in", json!({"provider": "github"})).await;
    call(
        &app,
        "session.callback",
        json!({"identity": {"id": "u1", "email": "u1@example.com"}}),
    )
    .await;
    (app, tmp)
}

// ─── Ping ───

#[tokio::test]
async fn test_ping() {
    let (app, _tmp) = setup();
    assert_eq!(call(&app, "ping", json!({})).await, json!({"pong": true}));
}

#[tokio::test]
async fn test_unknown_method_returns_error() {
    let (app, _tmp) = setup();
    let res = handle_method(&app, "nonexistent.method", &json!({})).await;
    assert!(res.unwrap_err().contains("unknown method"));
}

// ─── Session ───

#[tokio::test]
async fn test_session_get_when_signed_out() {
    let (app, _tmp) = setup();
    let res = call(&app, "session.get", json!({})).await;
    assert_eq!(res["session"], Value::Null);
    assert_eq!(res["theme"], "light");
}

#[tokio::test]
async fn test_sign_in_and_callback() {
    let (app, _tmp) = setup();
    let flow = call(&app, "session.sign_in", json!({})).await;
    assert_eq!(flow["provider"], "google");

    let session = call(
        &app,
        "session.callback",
        json!({"identity": {"id": "u1", "email": null, "display_name": "Ada"}}),
    )
    .await;
    assert_eq!(session["identity"]["id"], "u1");
    assert_eq!(session["identity"]["display_name"], "Ada");

    let res = call(&app, "session.get", json!({})).await;
    assert_eq!(res["session"]["identity"]["id"], "u1");
}

#[tokio::test]
async fn test_callback_requires_payload() {
    let (app, _tmp) = setup();
    let res = handle_method(&app, "session.callback", &json!({})).await;
    assert!(res.unwrap_err().contains("missing"));
}

#[tokio::test]
async fn test_token_callback_is_rejected_by_local_store() {
    let (app, _tmp) = setup();
    call(&app, "session.sign_in", json!({})).await;
    let res = handle_method(&app, "session.callback", &json!({"access_token": "tok"})).await;
    assert!(res.unwrap_err().contains("Unsupported sign-in callback"));
}

#[tokio::test]
async fn test_sign_out() {
    let (app, _tmp) = signed_in().await;
    assert_eq!(call(&app, "session.sign_out", json!({})).await, json!({"ok": true}));
    let res = call(&app, "session.resolve", json!({})).await;
    assert_eq!(res, Value::Null);
}

// ─── Bookmarks ───

#[tokio::test]
async fn test_bookmark_add_and_list() {
    let (app, _tmp) = signed_in().await;

    let res = call(
        &app,
        "bookmark.add",
        json!({"title": "Example", "url": "https://example.com"}),
    )
    .await;
    assert_eq!(res["status"], "added");
    assert_eq!(res["bookmark"]["url"], "https://example.com");
    assert_eq!(res["bookmark"]["user_id"], "u1");

    let list = call(&app, "bookmark.list", json!({})).await;
    let arr = list["bookmarks"].as_array().unwrap();
    assert_eq!(arr.len(), 1);
    assert_eq!(arr[0]["title"], "Example");
}

#[tokio::test]
async fn test_bookmark_add_missing_param() {
    let (app, _tmp) = signed_in().await;
    let res = handle_method(&app, "bookmark.add", &json!({"title": "x"})).await;
    assert_eq!(res.unwrap_err(), "missing url");
}

#[tokio::test]
async fn test_bookmark_add_empty_is_skipped() {
    let (app, _tmp) = signed_in().await;
    let res = call(&app, "bookmark.add", json!({"title": "", "url": "https://x.dev"})).await;
    assert_eq!(res, json!({"status": "skipped"}));
}

#[tokio::test]
async fn test_bookmark_add_without_session_errors() {
    let (app, _tmp) = setup();
    let res = handle_method(&app, "bookmark.add", &json!({"title": "a", "url": "b"})).await;
    assert_eq!(res.unwrap_err(), "No active session");
}

#[tokio::test]
async fn test_draft_and_submit() {
    let (app, _tmp) = signed_in().await;
    let draft = call(&app, "bookmark.draft", json!({"title": "Docs"})).await;
    assert_eq!(draft, json!({"title": "Docs", "url": ""}));
    call(&app, "bookmark.draft", json!({"url": "https://docs.rs"})).await;

    let res = call(&app, "bookmark.submit", json!({})).await;
    assert_eq!(res["status"], "added");
    assert_eq!(
        call(&app, "bookmark.draft", json!({})).await,
        json!({"title": "", "url": ""})
    );
}

#[tokio::test]
async fn test_bookmark_search() {
    let (app, _tmp) = signed_in().await;
    call(&app, "bookmark.add", json!({"title": "Docs", "url": "https://a"})).await;
    call(&app, "bookmark.add", json!({"title": "Blog", "url": "https://b"})).await;

    let res = call(&app, "bookmark.search", json!({"query": "BL"})).await;
    assert_eq!(res["query"], "BL");
    let arr = res["bookmarks"].as_array().unwrap();
    assert_eq!(arr.len(), 1);
    assert_eq!(arr[0]["title"], "Blog");
}

#[tokio::test]
async fn test_bookmark_delete_and_refresh() {
    let (app, _tmp) = signed_in().await;
    let added = call(&app, "bookmark.add", json!({"title": "Docs", "url": "https://a"})).await;
    let id = added["bookmark"]["id"].as_str().unwrap().to_string();

    let res = call(&app, "bookmark.delete", json!({"id": id})).await;
    assert_eq!(res, json!("deleted"));

    let refreshed = call(&app, "bookmark.refresh", json!({})).await;
    assert_eq!(refreshed, json!({"status": "applied", "count": 0}));
}

#[tokio::test]
async fn test_bookmark_refresh_without_session() {
    let (app, _tmp) = setup();
    let res = call(&app, "bookmark.refresh", json!({})).await;
    assert_eq!(res, json!({"status": "no_session"}));
}

// ─── Notices & theme ───

#[tokio::test]
async fn test_failed_delete_raises_dismissable_notice() {
    let (app, _tmp) = signed_in().await;
    assert!(handle_method(&app, "bookmark.delete", &json!({"id": "missing"}))
        .await
        .is_err());

    let notices = call(&app, "notice.list", json!({})).await;
    let arr = notices.as_array().unwrap();
    assert_eq!(arr.len(), 1);
    assert_eq!(arr[0]["level"], "error");

    let id = arr[0]["id"].clone();
    let res = call(&app, "notice.dismiss", json!({"id": id})).await;
    assert_eq!(res, json!({"dismissed": true}));
    assert_eq!(call(&app, "notice.list", json!({})).await, json!([]));
}

#[tokio::test]
async fn test_theme_toggle() {
    let (app, _tmp) = setup();
    assert_eq!(call(&app, "theme.toggle", json!({})).await, json!({"theme": "dark"}));
    assert_eq!(call(&app, "theme.toggle", json!({})).await, json!({"theme": "light"}));
}
