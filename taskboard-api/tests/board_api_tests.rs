/// Integration tests for the board operations
///
/// Each test drives the full router (session layer, handlers, error
/// mapping) against a fresh in-memory store.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::TestContext;
use serde_json::{json, Value};
use taskboard_shared::store::Collection;
use taskboard_shared::sync::ScopeKey;

const ALICE: &str = "idp|alice";
const BOB: &str = "idp|bob";
const CAROL: &str = "idp|carol";

async fn create_project(ctx: &TestContext, owner: &str, name: &str) -> Value {
    ctx.post(
        "/v1/projects/create",
        Some(owner),
        json!({ "owner_id": owner, "name": name, "description": "board" }),
    )
    .await
    .expect(StatusCode::OK)
}

async fn create_task(ctx: &TestContext, owner: &str, project_id: &str, name: &str) -> Value {
    ctx.post(
        "/v1/tasks/create",
        Some(owner),
        json!({
            "owner_id": owner,
            "project_id": project_id,
            "name": name,
            "short_description": "",
            "priority_range": "5"
        }),
    )
    .await
    .expect(StatusCode::OK)
}

async fn join(ctx: &TestContext, user: &str, code: &str) -> common::TestResponse {
    ctx.post(
        "/v1/projects/join",
        Some(user),
        json!({ "enrollment_id": code, "user_id": user }),
    )
    .await
}

fn is_enrollment_code(code: &str) -> bool {
    let bytes = code.as_bytes();
    bytes.len() == 9
        && bytes.iter().enumerate().all(|(i, b)| {
            if i == 4 {
                *b == b'-'
            } else {
                b.is_ascii_uppercase() || b.is_ascii_digit()
            }
        })
}

fn scopes(header: &Option<String>) -> Vec<ScopeKey> {
    ScopeKey::parse_list(header.as_deref().expect("missing x-stale-scopes")).unwrap()
}

#[tokio::test]
async fn test_create_project_issues_code_and_scopes() {
    let ctx = TestContext::new();

    let response = ctx
        .post(
            "/v1/projects/create",
            Some(ALICE),
            json!({ "owner_id": ALICE, "name": "Launch", "description": "" }),
        )
        .await;
    let stale = scopes(&response.stale_scopes);
    let project = response.expect(StatusCode::OK);

    assert_eq!(project["name"], "Launch");
    assert_eq!(project["owner_id"], ALICE);
    assert!(is_enrollment_code(project["enrollment_id"].as_str().unwrap()));
    assert!(stale.contains(&ScopeKey::OwnedProjects(ALICE.to_string())));

    let listed = ctx
        .post("/v1/projects/list", Some(ALICE), json!({ "owner_id": ALICE }))
        .await
        .expect(StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], project["id"]);
}

#[tokio::test]
async fn test_projects_get_distinct_codes() {
    let ctx = TestContext::new();

    let first = create_project(&ctx, ALICE, "One").await;
    let second = create_project(&ctx, ALICE, "Two").await;

    assert_ne!(first["enrollment_id"], second["enrollment_id"]);
}

#[tokio::test]
async fn test_join_flow() {
    let ctx = TestContext::new();
    let project = create_project(&ctx, ALICE, "Launch").await;
    let code = project["enrollment_id"].as_str().unwrap();

    let response = join(&ctx, BOB, code).await;
    assert!(scopes(&response.stale_scopes).contains(&ScopeKey::JoinedProjects(BOB.to_string())));
    let membership = response.expect(StatusCode::OK);
    assert_eq!(membership["user_id"], BOB);
    assert_eq!(membership["owner_id"], ALICE);
    assert_eq!(membership["project_id"], project["id"]);

    // Second join is rejected and leaves one membership
    let body = join(&ctx, BOB, code).await.expect(StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
    assert_eq!(ctx.store.len(Collection::Memberships), 1);

    let joined = ctx
        .post("/v1/projects/joined", Some(BOB), json!({ "user_id": BOB }))
        .await
        .expect(StatusCode::OK);
    assert_eq!(joined.as_array().unwrap().len(), 1);
    assert_eq!(joined[0]["project"]["name"], "Launch");
    assert_eq!(joined[0]["membership"]["id"], membership["id"]);
}

#[tokio::test]
async fn test_join_accepts_lowercase_code() {
    let ctx = TestContext::new();
    let project = create_project(&ctx, ALICE, "Launch").await;
    let code = project["enrollment_id"].as_str().unwrap().to_lowercase();

    join(&ctx, BOB, &format!(" {} ", code)).await.expect(StatusCode::OK);
}

#[tokio::test]
async fn test_join_unknown_code_creates_nothing() {
    let ctx = TestContext::new();
    create_project(&ctx, ALICE, "Launch").await;

    let body = join(&ctx, BOB, "ZZZZ-0000").await.expect(StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
    assert_eq!(ctx.store.len(Collection::Memberships), 0);

    join(&ctx, BOB, "not a code").await.expect(StatusCode::NOT_FOUND);
    assert_eq!(ctx.store.len(Collection::Memberships), 0);
}

#[tokio::test]
async fn test_leave_project() {
    let ctx = TestContext::new();
    let project = create_project(&ctx, ALICE, "Launch").await;
    let membership = join(&ctx, BOB, project["enrollment_id"].as_str().unwrap())
        .await
        .expect(StatusCode::OK);

    // Only the member can leave
    ctx.post("/v1/projects/leave", Some(CAROL), json!({ "id": membership["id"] }))
        .await
        .expect(StatusCode::FORBIDDEN);

    let left = ctx
        .post("/v1/projects/leave", Some(BOB), json!({ "id": membership["id"] }))
        .await
        .expect(StatusCode::OK);
    assert_eq!(left["id"], membership["id"]);
    assert_eq!(ctx.store.len(Collection::Memberships), 0);
    assert_eq!(ctx.store.len(Collection::Projects), 1);
}

#[tokio::test]
async fn test_leaving_revokes_board_access() {
    let ctx = TestContext::new();
    let project = create_project(&ctx, ALICE, "Launch").await;
    let project_id = project["id"].as_str().unwrap();
    let task = create_task(&ctx, ALICE, project_id, "secret").await;
    let membership = join(&ctx, BOB, project["enrollment_id"].as_str().unwrap())
        .await
        .expect(StatusCode::OK);

    // While a member, Bob reads the board and joins the discussion
    ctx.post("/v1/tasks/list", Some(BOB), json!({ "project_id": project_id }))
        .await
        .expect(StatusCode::OK);
    ctx.post(
        "/v1/comments/create",
        Some(BOB),
        json!({ "user_id": BOB, "task_id": task["id"], "content": "on it" }),
    )
    .await
    .expect(StatusCode::OK);

    ctx.post("/v1/projects/leave", Some(BOB), json!({ "id": membership["id"] }))
        .await
        .expect(StatusCode::OK);

    ctx.post("/v1/tasks/list", Some(BOB), json!({ "project_id": project_id }))
        .await
        .expect(StatusCode::FORBIDDEN);
    ctx.post("/v1/projects/get", Some(BOB), json!({ "target_id": project_id }))
        .await
        .expect(StatusCode::FORBIDDEN);
    ctx.post("/v1/comments/list", Some(BOB), json!({ "task_id": task["id"] }))
        .await
        .expect(StatusCode::FORBIDDEN);
    ctx.post(
        "/v1/comments/create",
        Some(BOB),
        json!({ "user_id": BOB, "task_id": task["id"], "content": "still here?" }),
    )
    .await
    .expect(StatusCode::FORBIDDEN);

    assert_eq!(ctx.store.len(Collection::Comments), 1);
}

#[tokio::test]
async fn test_board_closed_to_users_who_never_joined() {
    let ctx = TestContext::new();
    let project = create_project(&ctx, ALICE, "Launch").await;
    let project_id = project["id"].as_str().unwrap();
    let task = create_task(&ctx, ALICE, project_id, "secret").await;

    ctx.post("/v1/tasks/list", Some(CAROL), json!({ "project_id": project_id }))
        .await
        .expect(StatusCode::FORBIDDEN);
    ctx.post("/v1/projects/get", Some(CAROL), json!({ "target_id": project_id }))
        .await
        .expect(StatusCode::FORBIDDEN);
    ctx.post("/v1/comments/list", Some(CAROL), json!({ "task_id": task["id"] }))
        .await
        .expect(StatusCode::FORBIDDEN);
    ctx.post(
        "/v1/comments/create",
        Some(CAROL),
        json!({ "user_id": CAROL, "task_id": task["id"], "content": "hi" }),
    )
    .await
    .expect(StatusCode::FORBIDDEN);

    // Other users' listings would reveal enrollment codes
    ctx.post("/v1/projects/list", Some(CAROL), json!({ "owner_id": ALICE }))
        .await
        .expect(StatusCode::FORBIDDEN);
    ctx.post("/v1/projects/joined", Some(CAROL), json!({ "user_id": ALICE }))
        .await
        .expect(StatusCode::FORBIDDEN);
    ctx.post("/v1/events/list", Some(CAROL), json!({ "owner_id": ALICE }))
        .await
        .expect(StatusCode::FORBIDDEN);

    assert_eq!(ctx.store.len(Collection::Comments), 0);
}

#[tokio::test]
async fn test_remove_project_does_not_cascade() {
    let ctx = TestContext::new();
    let project = create_project(&ctx, ALICE, "Launch").await;
    let project_id = project["id"].as_str().unwrap();
    join(&ctx, BOB, project["enrollment_id"].as_str().unwrap())
        .await
        .expect(StatusCode::OK);
    create_task(&ctx, BOB, project_id, "Write docs").await;

    // A member cannot remove the project
    ctx.post("/v1/projects/remove", Some(BOB), json!({ "project_id": project_id }))
        .await
        .expect(StatusCode::FORBIDDEN);

    let response = ctx
        .post("/v1/projects/remove", Some(ALICE), json!({ "project_id": project_id }))
        .await;
    let stale = scopes(&response.stale_scopes);
    response.expect(StatusCode::OK);
    assert!(stale.contains(&ScopeKey::JoinedProjects(BOB.to_string())));

    assert_eq!(ctx.store.len(Collection::Projects), 0);
    assert_eq!(ctx.store.len(Collection::Memberships), 1);
    assert_eq!(ctx.store.len(Collection::Tasks), 1);

    let joined = ctx
        .post("/v1/projects/joined", Some(BOB), json!({ "user_id": BOB }))
        .await
        .expect(StatusCode::OK);
    assert_eq!(joined[0]["project"], Value::Null);

    ctx.post("/v1/projects/get", Some(ALICE), json!({ "target_id": project_id }))
        .await
        .expect(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_task_created_pending() {
    let ctx = TestContext::new();
    let project = create_project(&ctx, ALICE, "Launch").await;
    let project_id = project["id"].as_str().unwrap();

    let response = ctx
        .post(
            "/v1/tasks/create",
            Some(ALICE),
            json!({
                "owner_id": ALICE,
                "project_id": project_id,
                "name": "Ship it",
                "short_description": "before friday",
                "priority_range": "10"
            }),
        )
        .await;
    assert_eq!(response.stale_scopes.as_deref(), Some(format!("tasks:{}", project_id).as_str()));
    let task = response.expect(StatusCode::OK);

    assert_eq!(task["status"], "pending");
    assert_eq!(task["priority_range"], "10");
    assert_eq!(task["event_id"], Value::Null);
}

#[tokio::test]
async fn test_task_create_requires_collaborator() {
    let ctx = TestContext::new();
    let project = create_project(&ctx, ALICE, "Launch").await;

    let body = ctx
        .post(
            "/v1/tasks/create",
            Some(CAROL),
            json!({
                "owner_id": CAROL,
                "project_id": project["id"],
                "name": "Sneaky",
                "priority_range": "1"
            }),
        )
        .await
        .expect(StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
    assert_eq!(ctx.store.len(Collection::Tasks), 0);
}

#[tokio::test]
async fn test_task_create_unknown_project() {
    let ctx = TestContext::new();

    ctx.post(
        "/v1/tasks/create",
        Some(ALICE),
        json!({
            "owner_id": ALICE,
            "project_id": uuid::Uuid::new_v4(),
            "name": "Orphan",
            "priority_range": "1"
        }),
    )
    .await
    .expect(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_task_create_rejects_bad_priority() {
    let ctx = TestContext::new();
    let project = create_project(&ctx, ALICE, "Launch").await;

    ctx.post(
        "/v1/tasks/create",
        Some(ALICE),
        json!({
            "owner_id": ALICE,
            "project_id": project["id"],
            "name": "Odd",
            "priority_range": "3"
        }),
    )
    .await
    .expect(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_drag_to_done_shows_in_list() {
    let ctx = TestContext::new();
    let project = create_project(&ctx, ALICE, "Launch").await;
    let project_id = project["id"].as_str().unwrap();
    let task = create_task(&ctx, ALICE, project_id, "Ship it").await;
    join(&ctx, BOB, project["enrollment_id"].as_str().unwrap())
        .await
        .expect(StatusCode::OK);

    let response = ctx
        .post(
            "/v1/tasks/drop",
            Some(ALICE),
            json!({ "target_id": task["id"], "column": "Done" }),
        )
        .await;
    assert_eq!(
        scopes(&response.stale_scopes),
        vec![ScopeKey::ProjectTasks(project_id.parse().unwrap())]
    );
    let moved = response.expect(StatusCode::OK);
    assert_eq!(moved["status"], "done");

    let tasks = ctx
        .post("/v1/tasks/list", Some(BOB), json!({ "project_id": project_id }))
        .await
        .expect(StatusCode::OK);
    assert_eq!(tasks[0]["status"], "done");
}

#[tokio::test]
async fn test_drop_unknown_column() {
    let ctx = TestContext::new();
    let project = create_project(&ctx, ALICE, "Launch").await;
    let task = create_task(&ctx, ALICE, project["id"].as_str().unwrap(), "Ship it").await;

    let body = ctx
        .post(
            "/v1/tasks/drop",
            Some(ALICE),
            json!({ "target_id": task["id"], "column": "Archive" }),
        )
        .await
        .expect(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_status_update_is_exact_and_idempotent() {
    let ctx = TestContext::new();
    let project = create_project(&ctx, ALICE, "Launch").await;
    let task = create_task(&ctx, ALICE, project["id"].as_str().unwrap(), "Ship it").await;

    let update = json!({ "target_id": task["id"], "content": { "status": "cancelled" } });
    let first = ctx
        .post("/v1/tasks/update", Some(ALICE), update.clone())
        .await
        .expect(StatusCode::OK);
    let second = ctx
        .post("/v1/tasks/update", Some(ALICE), update)
        .await
        .expect(StatusCode::OK);

    assert_eq!(first["status"], "cancelled");
    assert_eq!(first, second);
    assert_eq!(first["name"], "Ship it");
}

#[tokio::test]
async fn test_partial_update_ignores_blank_fields() {
    let ctx = TestContext::new();
    let project = create_project(&ctx, ALICE, "Launch").await;
    let task = create_task(&ctx, ALICE, project["id"].as_str().unwrap(), "Ship it").await;

    let updated = ctx
        .post(
            "/v1/tasks/update",
            Some(ALICE),
            json!({
                "target_id": task["id"],
                "content": { "name": "", "short_description": "now with notes", "priority_range": "" }
            }),
        )
        .await
        .expect(StatusCode::OK);

    assert_eq!(updated["name"], "Ship it");
    assert_eq!(updated["short_description"], "now with notes");
    assert_eq!(updated["priority_range"], "5");
}

#[tokio::test]
async fn test_blank_update_is_rejected_without_write() {
    let ctx = TestContext::new();
    let project = create_project(&ctx, ALICE, "Launch").await;
    let task = create_task(&ctx, ALICE, project["id"].as_str().unwrap(), "Ship it").await;

    let response = ctx
        .post(
            "/v1/tasks/update",
            Some(ALICE),
            json!({ "target_id": task["id"], "content": { "name": "   ", "short_description": "" } }),
        )
        .await;
    assert!(response.stale_scopes.is_none());
    let body = response.expect(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");

    let tasks = ctx
        .post("/v1/tasks/list", Some(ALICE), json!({ "project_id": project["id"] }))
        .await
        .expect(StatusCode::OK);
    assert_eq!(tasks[0], task);
}

#[tokio::test]
async fn test_remove_task() {
    let ctx = TestContext::new();
    let project = create_project(&ctx, ALICE, "Launch").await;
    let task = create_task(&ctx, ALICE, project["id"].as_str().unwrap(), "Ship it").await;

    // Not a collaborator
    ctx.post("/v1/tasks/remove", Some(CAROL), json!({ "target_id": task["id"] }))
        .await
        .expect(StatusCode::FORBIDDEN);

    let response = ctx
        .post("/v1/tasks/remove", Some(ALICE), json!({ "target_id": task["id"] }))
        .await;
    let stale = scopes(&response.stale_scopes);
    assert_eq!(response.expect(StatusCode::OK)["id"], task["id"]);
    assert!(stale.contains(&ScopeKey::TaskComments(task["id"].as_str().unwrap().parse().unwrap())));

    ctx.post("/v1/tasks/remove", Some(ALICE), json!({ "target_id": task["id"] }))
        .await
        .expect(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_events_and_assignment() {
    let ctx = TestContext::new();
    let project = create_project(&ctx, ALICE, "Launch").await;
    let task = create_task(&ctx, ALICE, project["id"].as_str().unwrap(), "Ship it").await;

    let backwards = ctx
        .post(
            "/v1/events/create",
            Some(ALICE),
            json!({
                "owner_id": ALICE,
                "name": "Sprint",
                "priority_range": "5",
                "starting_date": "2026-03-10T00:00:00Z",
                "ending_date": "2026-03-01T00:00:00Z"
            }),
        )
        .await;
    assert_eq!(backwards.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(ctx.store.len(Collection::Events), 0);

    let event = ctx
        .post(
            "/v1/events/create",
            Some(ALICE),
            json!({
                "owner_id": ALICE,
                "name": "Sprint",
                "short_description": "two weeks",
                "priority_range": "5",
                "starting_date": "2026-03-01T00:00:00Z",
                "ending_date": "2026-03-14T00:00:00Z"
            }),
        )
        .await
        .expect(StatusCode::OK);

    let fetched = ctx
        .post("/v1/events/get", Some(ALICE), json!({ "target_id": event["id"] }))
        .await
        .expect(StatusCode::OK);
    assert_eq!(fetched, event);

    let owned = ctx
        .post("/v1/events/list", Some(ALICE), json!({ "owner_id": ALICE }))
        .await
        .expect(StatusCode::OK);
    assert_eq!(owned.as_array().unwrap().len(), 1);

    let assigned = ctx
        .post(
            "/v1/tasks/assign_event",
            Some(ALICE),
            json!({ "target_id": task["id"], "event_id": event["id"] }),
        )
        .await
        .expect(StatusCode::OK);
    assert_eq!(assigned["event_id"], event["id"]);
    assert_eq!(assigned["status"], "pending");

    ctx.post(
        "/v1/tasks/assign_event",
        Some(ALICE),
        json!({ "target_id": task["id"], "event_id": uuid::Uuid::new_v4() }),
    )
    .await
    .expect(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_comment_thread() {
    let ctx = TestContext::new();
    let project = create_project(&ctx, ALICE, "Launch").await;
    let task = create_task(&ctx, ALICE, project["id"].as_str().unwrap(), "Ship it").await;
    join(&ctx, BOB, project["enrollment_id"].as_str().unwrap())
        .await
        .expect(StatusCode::OK);

    for (author, text) in [(ALICE, "first"), (BOB, "second"), (ALICE, "third")] {
        let response = ctx
            .post(
                "/v1/comments/create",
                Some(author),
                json!({ "user_id": author, "task_id": task["id"], "content": text }),
            )
            .await;
        assert_eq!(
            response.stale_scopes,
            Some(format!("comments:{}", task["id"].as_str().unwrap()))
        );
        response.expect(StatusCode::OK);
    }

    let thread = ctx
        .post("/v1/comments/list", Some(BOB), json!({ "task_id": task["id"] }))
        .await
        .expect(StatusCode::OK);
    let contents: Vec<&str> = thread
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["first", "second", "third"]);

    ctx.post(
        "/v1/comments/create",
        Some(ALICE),
        json!({ "user_id": ALICE, "task_id": uuid::Uuid::new_v4(), "content": "lost" }),
    )
    .await
    .expect(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_registration() {
    let ctx = TestContext::new();
    let user = json!({
        "user_id": ALICE,
        "email": "alice@example.com",
        "phone": "+15550100",
        "first_name": "Alice",
        "last_name": "Liddell",
        "birthday": "1990-05-04T00:00:00Z"
    });

    let created = ctx
        .post("/v1/users/create", Some(ALICE), user.clone())
        .await
        .expect(StatusCode::OK);
    assert_eq!(created["email"], "alice@example.com");

    let fetched = ctx
        .post("/v1/users/get", Some(BOB), json!({ "user_id": ALICE }))
        .await
        .expect(StatusCode::OK);
    assert_eq!(fetched, created);

    ctx.post("/v1/users/create", Some(ALICE), user)
        .await
        .expect(StatusCode::CONFLICT);

    ctx.post("/v1/users/get", Some(ALICE), json!({ "user_id": "idp|nobody" }))
        .await
        .expect(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_validation_details() {
    let ctx = TestContext::new();

    let body = ctx
        .post(
            "/v1/users/create",
            Some(ALICE),
            json!({
                "user_id": ALICE,
                "email": "not-an-email",
                "phone": "",
                "first_name": "Alice",
                "birthday": "1990-05-04T00:00:00Z"
            }),
        )
        .await
        .expect(StatusCode::UNPROCESSABLE_ENTITY);

    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "phone"]);
    assert_eq!(ctx.store.len(Collection::Users), 0);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let ctx = TestContext::new();

    let response = ctx
        .send(
            Request::builder()
                .method("POST")
                .uri("/v1/projects/create")
                .header("content-type", "application/json")
                .header("authorization", common::bearer(ALICE))
                .body(Body::from("{ not json"))
                .unwrap(),
        )
        .await;
    let body = response.expect(StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_wrong_method_is_json_405() {
    let ctx = TestContext::new();

    let response = ctx
        .send(
            Request::builder()
                .method("GET")
                .uri("/v1/tasks/list")
                .header("authorization", common::bearer(ALICE))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    let body = response.expect(StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({ "error": "method_not_allowed", "message": "Method not allowed" }));
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let ctx = TestContext::new();

    let body = ctx
        .post("/v1/tasks/archive", Some(ALICE), json!({}))
        .await
        .expect(StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new();

    let response = ctx
        .send(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await;
    let body = response.expect(StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "connected");
}
