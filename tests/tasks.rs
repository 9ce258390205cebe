mod common;

use actix_web::{http::StatusCode, test};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use common::{create_project, create_task, send, sign_up, test_data};
use project_tracker::build_app;

#[actix_rt::test]
async fn test_task_crud_flow() {
    let app = test::init_service(build_app(test_data().await)).await;
    let token = sign_up(&app, "alice").await;

    let task = create_task(
        &app,
        &token,
        json!({
            "title": "Write report",
            "description": "Quarterly numbers",
            "priority": "high",
            "category": "work"
        }),
    )
    .await;
    assert_eq!(task["title"], "Write report");
    assert_eq!(task["priority"], "high");
    assert_eq!(task["status"], "pending");
    assert_eq!(task["completed"], false);
    assert_eq!(task["completed_at"], Value::Null);
    assert_eq!(task["progress"], 0);
    let id = task["id"].as_i64().unwrap();

    let resp = send(&app, test::TestRequest::get().uri(&format!("/tasks/{}", id)), &token, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Value = test::read_body_json(resp).await;
    assert_eq!(fetched, task);

    let resp = send(
        &app,
        test::TestRequest::put().uri(&format!("/tasks/{}", id)),
        &token,
        Some(json!({ "title": "Write final report", "progress": 40 })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = test::read_body_json(resp).await;
    assert_eq!(updated["title"], "Write final report");
    assert_eq!(updated["progress"], 40);
    assert_eq!(updated["description"], "Quarterly numbers");
    assert_eq!(updated["priority"], "high");

    let resp = send(
        &app,
        test::TestRequest::put().uri(&format!("/tasks/{}", id)),
        &token,
        Some(json!({ "description": null })),
    )
    .await;
    let cleared: Value = test::read_body_json(resp).await;
    assert_eq!(cleared["description"], Value::Null);
    assert_eq!(cleared["title"], "Write final report");

    let resp = send(&app, test::TestRequest::delete().uri(&format!("/tasks/{}", id)), &token, None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = send(&app, test::TestRequest::get().uri(&format!("/tasks/{}", id)), &token, None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_tasks_are_owner_scoped() {
    let app = test::init_service(build_app(test_data().await)).await;
    let alice = sign_up(&app, "alice").await;
    let bob = sign_up(&app, "bob").await;

    let bobs_task = create_task(&app, &bob, json!({ "title": "Bob's secret" })).await;
    let uri = format!("/tasks/{}", bobs_task["id"]);

    let resp = send(&app, test::TestRequest::get().uri(&uri), &alice, None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let missing = send(&app, test::TestRequest::get().uri("/tasks/9999"), &alice, None).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let foreign: Value = test::read_body_json(resp).await;
    let missing: Value = test::read_body_json(missing).await;
    assert_eq!(foreign, missing);

    let resp = send(
        &app,
        test::TestRequest::put().uri(&uri),
        &alice,
        Some(json!({ "title": "hijacked" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = send(&app, test::TestRequest::delete().uri(&uri), &alice, None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = send(&app, test::TestRequest::get().uri("/tasks"), &alice, None).await;
    let listed: Vec<Value> = test::read_body_json(resp).await;
    assert!(listed.is_empty());

    let resp = send(&app, test::TestRequest::get().uri(&uri), &bob, None).await;
    let unchanged: Value = test::read_body_json(resp).await;
    assert_eq!(unchanged["title"], "Bob's secret");
}

#[actix_rt::test]
async fn test_owner_field_in_payload_is_ignored() {
    let app = test::init_service(build_app(test_data().await)).await;
    let alice = sign_up(&app, "alice").await;
    let bob = sign_up(&app, "bob").await;

    let bobs_task = create_task(&app, &bob, json!({ "title": "mine" })).await;
    let task = create_task(
        &app,
        &alice,
        json!({ "title": "sneaky", "owner_id": bobs_task["owner_id"] }),
    )
    .await;
    assert!(task["owner_id"] != bobs_task["owner_id"]);

    let resp = send(&app, test::TestRequest::get().uri("/tasks"), &bob, None).await;
    let listed: Vec<Value> = test::read_body_json(resp).await;
    assert_eq!(listed.len(), 1);
}

#[actix_rt::test]
async fn test_completion_transitions() {
    let app = test::init_service(build_app(test_data().await)).await;
    let token = sign_up(&app, "alice").await;

    let task = create_task(&app, &token, json!({ "title": "t" })).await;
    let uri = format!("/tasks/{}", task["id"]);

    let resp = send(&app, test::TestRequest::put().uri(&uri), &token, Some(json!({ "completed": true }))).await;
    let done: Value = test::read_body_json(resp).await;
    assert_eq!(done["completed"], true);
    assert_eq!(done["status"], "completed");
    assert!(done["completed_at"].is_string());

    let resp = send(&app, test::TestRequest::put().uri(&uri), &token, Some(json!({ "completed": true }))).await;
    let again: Value = test::read_body_json(resp).await;
    assert_eq!(again["completed_at"], done["completed_at"]);

    let resp = send(&app, test::TestRequest::put().uri(&uri), &token, Some(json!({ "completed": false }))).await;
    let reopened: Value = test::read_body_json(resp).await;
    assert_eq!(reopened["completed"], false);
    assert_eq!(reopened["status"], "pending");
    assert_eq!(reopened["completed_at"], Value::Null);

    let resp = send(&app, test::TestRequest::put().uri(&uri), &token, Some(json!({ "status": "completed" }))).await;
    let by_status: Value = test::read_body_json(resp).await;
    assert_eq!(by_status["completed"], true);
    assert!(by_status["completed_at"].is_string());

    let created_done = create_task(&app, &token, json!({ "title": "already", "completed": true })).await;
    assert_eq!(created_done["status"], "completed");
    assert!(created_done["completed_at"].is_string());
}

#[actix_rt::test]
async fn test_completed_listing() {
    let app = test::init_service(build_app(test_data().await)).await;
    let token = sign_up(&app, "alice").await;

    create_task(&app, &token, json!({ "title": "open" })).await;
    let done = create_task(&app, &token, json!({ "title": "done", "completed": true })).await;

    let resp = send(&app, test::TestRequest::get().uri("/tasks/completed"), &token, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let completed: Vec<Value> = test::read_body_json(resp).await;
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0]["id"], done["id"]);
    assert_eq!(completed[0]["completed"], json!(true));

    let resp = send(&app, test::TestRequest::get().uri("/tasks"), &token, None).await;
    let all: Vec<Value> = test::read_body_json(resp).await;
    assert_eq!(all.len(), 2);
    assert_eq!(all[0]["title"], "done");
}

#[actix_rt::test]
async fn test_mark_all_completed_is_idempotent() {
    let app = test::init_service(build_app(test_data().await)).await;
    let alice = sign_up(&app, "alice").await;
    let bob = sign_up(&app, "bob").await;

    for title in ["a", "b", "c"] {
        create_task(&app, &alice, json!({ "title": title })).await;
    }
    create_task(&app, &bob, json!({ "title": "bob's" })).await;

    let resp = send(&app, test::TestRequest::post().uri("/tasks/mark_all_completed"), &alice, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "detail": "3 tasks marked completed" }));

    let resp = send(&app, test::TestRequest::get().uri("/tasks"), &alice, None).await;
    let first: Vec<Value> = test::read_body_json(resp).await;
    assert!(first.iter().all(|t| t["completed"] == true && t["status"] == "completed"));
    assert!(first.iter().all(|t| t["completed_at"].is_string()));

    let resp = send(&app, test::TestRequest::post().uri("/tasks/mark_all_completed"), &alice, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = send(&app, test::TestRequest::get().uri("/tasks"), &alice, None).await;
    let second: Vec<Value> = test::read_body_json(resp).await;
    assert_eq!(first, second);

    let resp = send(&app, test::TestRequest::get().uri("/tasks/completed"), &bob, None).await;
    let bobs_completed: Vec<Value> = test::read_body_json(resp).await;
    assert!(bobs_completed.is_empty());
}

#[actix_rt::test]
async fn test_task_validation() {
    let app = test::init_service(build_app(test_data().await)).await;
    let token = sign_up(&app, "alice").await;

    let resp = send(&app, test::TestRequest::post().uri("/tasks"), &token, Some(json!({ "title": "" }))).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = send(
        &app,
        test::TestRequest::post().uri("/tasks"),
        &token,
        Some(json!({ "title": "t", "progress": 150 })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = send(
        &app,
        test::TestRequest::post().uri("/tasks"),
        &token,
        Some(json!({ "title": "t", "priority": "urgent" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_task_project_must_be_owned() {
    let app = test::init_service(build_app(test_data().await)).await;
    let alice = sign_up(&app, "alice").await;
    let bob = sign_up(&app, "bob").await;

    let bobs_project = create_project(&app, &bob, "Bob's").await;
    let resp = send(
        &app,
        test::TestRequest::post().uri("/tasks"),
        &alice,
        Some(json!({ "title": "t", "project_id": bobs_project["id"] })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let own_project = create_project(&app, &alice, "Mine").await;
    let task = create_task(
        &app,
        &alice,
        json!({ "title": "t", "project_id": own_project["id"] }),
    )
    .await;
    assert_eq!(task["project_id"], own_project["id"]);

    let resp = send(
        &app,
        test::TestRequest::put().uri(&format!("/tasks/{}", task["id"])),
        &alice,
        Some(json!({ "project_id": bobs_project["id"] })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
