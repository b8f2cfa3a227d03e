//! Task CRUD, ownership and cache invalidation

mod common;

use axum::http::StatusCode;
use common::TestContext;
use serde_json::json;
use tasktrack_shared::store::Store;
use uuid::Uuid;

#[tokio::test]
async fn test_create_and_get_task() {
    let ctx = TestContext::new();
    let user = ctx.create_user("al", "a@x.com").await;

    let created = ctx
        .post(
            "/api/v1/tasks",
            Some(&user.token),
            json!({ "title": "  Write report ", "description": "  Q3  ", "due_date": "2024-10-01" }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["title"], "Write report");
    assert_eq!(created.body["description"], "Q3");
    assert_eq!(created.body["completed"], false);
    assert_eq!(created.body["due_date"], "2024-10-01T00:00:00Z");
    assert_eq!(created.body["user_id"], user.id.to_string());

    let id = created.body["id"].as_str().unwrap();
    let fetched = ctx.get(&format!("/api/v1/tasks/{}", id), Some(&user.token)).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body, created.body);

    let updated = ctx
        .put(
            &format!("/api/v1/tasks/{}", id),
            Some(&user.token),
            json!({ "description": "\tQ4 summary \n" }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["description"], "Q4 summary");
    assert_eq!(updated.body["title"], "Write report");
}

#[tokio::test]
async fn test_create_task_validation() {
    let ctx = TestContext::new();
    let user = ctx.create_user("al", "a@x.com").await;

    let blank = ctx
        .post("/api/v1/tasks", Some(&user.token), json!({ "title": "   " }))
        .await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);
    assert_eq!(blank.body["errors"][0]["field"], "title");

    let bad_date = ctx
        .post(
            "/api/v1/tasks",
            Some(&user.token),
            json!({ "title": "ok", "due_date": "next tuesday" }),
        )
        .await;
    assert_eq!(bad_date.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_date.body["errors"][0]["field"], "due_date");

    assert_eq!(ctx.store.task_count().await, 0);
}

#[tokio::test]
async fn test_list_only_returns_own_tasks_newest_first() {
    let ctx = TestContext::new();
    let alice = ctx.create_user("alice", "alice@x.com").await;
    let bob = ctx.create_user("bob", "bob@x.com").await;

    ctx.create_task(&alice.token, "first").await;
    ctx.create_task(&alice.token, "second").await;
    ctx.create_task(&bob.token, "bob's").await;

    let list = ctx.get("/api/v1/tasks", Some(&alice.token)).await;
    let titles: Vec<&str> = list
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["second", "first"]);
}

#[tokio::test]
async fn test_other_users_task_is_forbidden_but_admin_allowed() {
    let ctx = TestContext::new();
    let owner = ctx.create_user("owner", "owner@x.com").await;
    let other = ctx.create_user("other", "other@x.com").await;
    let admin = ctx.create_admin("admin", "admin@x.com").await;

    let id = ctx.create_task(&owner.token, "private").await;
    let uri = format!("/api/v1/tasks/{}", id);

    let forbidden = ctx.get(&uri, Some(&other.token)).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
    assert_eq!(forbidden.body, json!({ "error": "Not authorized" }));

    let update = ctx.put(&uri, Some(&other.token), json!({ "completed": true })).await;
    assert_eq!(update.status, StatusCode::FORBIDDEN);

    let delete = ctx.delete(&uri, Some(&other.token)).await;
    assert_eq!(delete.status, StatusCode::FORBIDDEN);
    assert_eq!(ctx.store.task_count().await, 1);

    let as_admin = ctx.get(&uri, Some(&admin.token)).await;
    assert_eq!(as_admin.status, StatusCode::OK);
    assert_eq!(as_admin.body["title"], "private");
}

#[tokio::test]
async fn test_missing_and_malformed_ids_are_404() {
    let ctx = TestContext::new();
    let user = ctx.create_user("al", "a@x.com").await;

    let missing = ctx
        .get(&format!("/api/v1/tasks/{}", Uuid::new_v4()), Some(&user.token))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body, json!({ "error": "Task not found" }));

    let malformed = ctx.delete("/api/v1/tasks/42", Some(&user.token)).await;
    assert_eq!(malformed.status, StatusCode::NOT_FOUND);
    assert_eq!(malformed.body["error"], "Task not found");
}

#[tokio::test]
async fn test_update_check_order() {
    let ctx = TestContext::new();
    let owner = ctx.create_user("owner", "owner@x.com").await;
    let other = ctx.create_user("other", "other@x.com").await;
    let id = ctx.create_task(&owner.token, "keep me").await;
    let uri = format!("/api/v1/tasks/{}", id);

    // Validation before existence
    let invalid = ctx
        .put(
            &format!("/api/v1/tasks/{}", Uuid::new_v4()),
            Some(&owner.token),
            json!({ "title": "" }),
        )
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert!(invalid.body["errors"].is_array());

    // Existence before ownership
    let missing = ctx
        .put(
            &format!("/api/v1/tasks/{}", Uuid::new_v4()),
            Some(&other.token),
            json!({}),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    // Ownership before the empty check
    let forbidden = ctx.put(&uri, Some(&other.token), json!({})).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let empty = ctx.put(&uri, Some(&owner.token), json!({})).await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    assert_eq!(empty.body, json!({ "error": "No fields to update" }));

    let task = ctx
        .store
        .find_task(id.parse().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(task.title, "keep me");
    assert!(!task.completed);
}

#[tokio::test]
async fn test_partial_update_writes_only_present_fields() {
    let ctx = TestContext::new();
    let user = ctx.create_user("al", "a@x.com").await;

    let created = ctx
        .post(
            "/api/v1/tasks",
            Some(&user.token),
            json!({ "title": "draft", "description": "keep" }),
        )
        .await;
    let uri = format!("/api/v1/tasks/{}", created.body["id"].as_str().unwrap());

    let updated = ctx
        .put(
            &uri,
            Some(&user.token),
            json!({ "completed": true, "due_date": "2025-01-31T12:00:00Z" }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["title"], "draft");
    assert_eq!(updated.body["description"], "keep");
    assert_eq!(updated.body["completed"], true);
    assert_eq!(updated.body["due_date"], "2025-01-31T12:00:00Z");
}

#[tokio::test]
async fn test_delete_invalidates_cached_list() {
    let ctx = TestContext::new();
    let user = ctx.create_user("al", "a@x.com").await;
    let id = ctx.create_task(&user.token, "short-lived").await;

    let first = ctx.get("/api/v1/tasks", Some(&user.token)).await;
    assert_eq!(first.header("x-cache"), Some("MISS"));
    assert_eq!(first.body.as_array().unwrap().len(), 1);

    let second = ctx.get("/api/v1/tasks", Some(&user.token)).await;
    assert_eq!(second.header("x-cache"), Some("HIT"));
    assert_eq!(second.body, first.body);

    let deleted = ctx
        .delete(&format!("/api/v1/tasks/{}", id), Some(&user.token))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body, json!({ "message": "Task deleted" }));

    let after = ctx.get("/api/v1/tasks", Some(&user.token)).await;
    assert_eq!(after.header("x-cache"), Some("MISS"));
    assert_eq!(after.body, json!([]));
}

#[tokio::test]
async fn test_create_and_admin_update_invalidate_lists() {
    let ctx = TestContext::new();
    let owner = ctx.create_user("owner", "owner@x.com").await;
    let admin = ctx.create_admin("admin", "admin@x.com").await;

    ctx.get("/api/v1/tasks", Some(&owner.token)).await;
    let id = ctx.create_task(&owner.token, "todo").await;

    let listed = ctx.get("/api/v1/tasks", Some(&owner.token)).await;
    assert_eq!(listed.header("x-cache"), Some("MISS"));
    assert_eq!(listed.body.as_array().unwrap().len(), 1);

    let item_uri = format!("/api/v1/tasks/{}", id);
    ctx.get(&item_uri, Some(&owner.token)).await;

    let updated = ctx
        .put(&item_uri, Some(&admin.token), json!({ "completed": true }))
        .await;
    assert_eq!(updated.status, StatusCode::OK);

    let item = ctx.get(&item_uri, Some(&owner.token)).await;
    assert_eq!(item.header("x-cache"), Some("MISS"));
    assert_eq!(item.body["completed"], true);

    let listed = ctx.get("/api/v1/tasks", Some(&owner.token)).await;
    assert_eq!(listed.header("x-cache"), Some("MISS"));
    assert_eq!(listed.body[0]["completed"], true);
}

#[tokio::test]
async fn test_cache_is_per_user() {
    let ctx = TestContext::new();
    let alice = ctx.create_user("alice", "alice@x.com").await;
    let bob = ctx.create_user("bob", "bob@x.com").await;
    ctx.create_task(&alice.token, "alice only").await;

    let alice_view = ctx.get("/api/v1/tasks", Some(&alice.token)).await;
    assert_eq!(alice_view.body.as_array().unwrap().len(), 1);

    let bob_view = ctx.get("/api/v1/tasks", Some(&bob.token)).await;
    assert_eq!(bob_view.header("x-cache"), Some("MISS"));
    assert_eq!(bob_view.body, json!([]));
}
