//! Admin mutations: primary write, then exactly one log entry.

mod common;

use std::sync::atomic::Ordering;

use axum::http::StatusCode;
use common::{FakeStore, TestApp};
use serde_json::json;
use ym_core::models::audit::AdminAction;

#[tokio::test]
async fn set_points_is_idempotent_and_add_accumulates() {
    let app = TestApp::new(FakeStore::with_users(&[1]));
    let cookie = app.admin();
    let set = json!({ "id": 1, "points": 40, "operation": "set" });

    for _ in 0..2 {
        let reply = app
            .mutate("appUsers.updatePoints", set.clone(), Some(&cookie))
            .await;
        assert_eq!(reply.data()["success"], true);
        assert_eq!(app.store.points(1), 40);
    }

    let add = json!({ "id": 1, "points": 40, "operation": "add" });
    app.mutate("appUsers.updatePoints", add.clone(), Some(&cookie))
        .await;
    app.mutate("appUsers.updatePoints", add, Some(&cookie)).await;
    assert_eq!(app.store.points(1), 120);

    let audit = app.store.audit();
    assert_eq!(audit.len(), 4);
    assert!(audit.iter().all(|e| e.action == AdminAction::UpdatePoints));
    assert_eq!(audit[0].target_type, Some("user"));
    assert_eq!(audit[0].target_id, Some(1));
}

#[tokio::test]
async fn operation_defaults_to_set() {
    let app = TestApp::new(FakeStore::with_users(&[1]));
    let cookie = app.admin();
    app.mutate(
        "appUsers.updatePoints",
        json!({ "id": 1, "points": 9 }),
        Some(&cookie),
    )
    .await;
    assert_eq!(app.store.writes(), vec!["points:1:set:9".to_string()]);
}

#[tokio::test]
async fn delete_all_requires_the_confirmation_phrase() {
    let app = TestApp::new(FakeStore::with_users(&[1, 2]));
    let cookie = app.admin();

    for phrase in ["excluir todos", "EXCLUIR  TODOS", ""] {
        let reply = app
            .mutate(
                "appUsers.deleteAll",
                json!({ "confirmText": phrase }),
                Some(&cookie),
            )
            .await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.json["error"]["message"], "Incorrect confirmation text");
    }
    assert!(app.store.writes().is_empty());
    assert!(app.store.audit().is_empty());

    let reply = app
        .mutate(
            "appUsers.deleteAll",
            json!({ "confirmText": "EXCLUIR TODOS" }),
            Some(&cookie),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.data()["success"], true);
    assert_eq!(reply.data()["deletedCount"], 2);
    let audit = app.store.audit();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action, AdminAction::DeleteAllUsers);
}

#[tokio::test]
async fn withdrawal_approval_is_logged_against_the_caller() {
    let app = TestApp::new(FakeStore::default());
    let cookie = app.admin();
    let admin = app.identities.get("admin-open-id").expect("seeded admin");

    let reply = app
        .mutate(
            "withdrawals.updateStatus",
            json!({ "id": 9, "status": "approved", "receiptUrl": "https://receipts.example.com/9" }),
            Some(&cookie),
        )
        .await;
    assert_eq!(reply.data()["success"], true);
    assert_eq!(
        app.store.writes(),
        vec!["withdrawal:9:approved:https://receipts.example.com/9".to_string()]
    );

    let audit = app.store.audit();
    assert_eq!(audit.len(), 1);
    let entry = &audit[0];
    assert_eq!(entry.action, AdminAction::UpdateWithdrawal);
    assert_eq!(entry.actor_id, Some(admin.id));
    assert_eq!(entry.target_type, Some("withdrawal"));
    assert_eq!(entry.target_id, Some(9));
    assert_eq!(entry.ip_address.as_deref(), Some("203.0.113.9"));
    assert!(entry.details.contains("approved"));
}

#[tokio::test]
async fn unknown_withdrawal_status_is_rejected() {
    let app = TestApp::new(FakeStore::default());
    let cookie = app.admin();
    let reply = app
        .mutate(
            "withdrawals.updateStatus",
            json!({ "id": 9, "status": "paid" }),
            Some(&cookie),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(app.store.writes().is_empty());
}

#[tokio::test]
async fn failed_write_reports_failure_and_skips_the_log() {
    let store = FakeStore::with_users(&[1]);
    store.fail_writes.store(true, Ordering::SeqCst);
    let app = TestApp::new(store);
    let cookie = app.admin();

    let reply = app
        .mutate(
            "appUsers.updateBalance",
            json!({ "id": 1, "balance": 10.5 }),
            Some(&cookie),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.data()["success"], false);
    assert!(app.store.audit().is_empty());

    let reply = app.query("dashboard.stats", None, Some(&cookie)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.data()["totalUsers"], 0);
}

#[tokio::test]
async fn log_failure_does_not_fail_the_mutation() {
    let store = FakeStore::with_users(&[1]);
    store.fail_audit.store(true, Ordering::SeqCst);
    let app = TestApp::new(store);
    let cookie = app.admin();

    let reply = app
        .mutate(
            "appUsers.ban",
            json!({ "id": 1, "reason": "fraud" }),
            Some(&cookie),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.data()["success"], true);
    assert_eq!(app.store.writes(), vec!["ban:1:fraud".to_string()]);
}

#[tokio::test]
async fn banning_a_user_without_a_device_succeeds_and_is_logged() {
    let store = FakeStore::with_users(&[1]);
    store
        .users
        .lock()
        .expect("users lock")
        .get_mut(&1)
        .expect("user 1")["deviceId"] = serde_json::Value::Null;
    let app = TestApp::new(store);
    let cookie = app.admin();

    let reply = app
        .mutate(
            "appUsers.ban",
            json!({ "id": 1, "reason": "fraud" }),
            Some(&cookie),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.data()["success"], true);
    assert!(app.store.writes().is_empty());
    let audit = app.store.audit();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action, AdminAction::BanUser);
}

#[tokio::test]
async fn broadcast_continues_past_failed_recipients() {
    let store = FakeStore::with_users(&[1, 2, 3]);
    store
        .failing_recipients
        .lock()
        .expect("recipients lock")
        .insert(2);
    let app = TestApp::new(store);
    let cookie = app.admin();

    let reply = app
        .mutate(
            "notifications.broadcast",
            json!({ "title": "Bonus", "message": "Free points", "points": 10 }),
            Some(&cookie),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.data()["delivered"], 2);
    assert_eq!(reply.data()["failed"], 1);
    assert_eq!(reply.data()["total"], 3);

    let delivered: Vec<i32> = app
        .store
        .notifications
        .lock()
        .expect("notifications lock")
        .iter()
        .map(|n| n.user_id)
        .collect();
    assert_eq!(delivered, vec![1, 3]);

    let audit = app.store.audit();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action, AdminAction::BroadcastNotification);
    assert!(audit[0].details.contains("2/3"));
}

#[tokio::test]
async fn notification_defaults_to_info_without_credit() {
    let app = TestApp::new(FakeStore::with_users(&[4]));
    let cookie = app.admin();
    let reply = app
        .mutate(
            "notifications.create",
            json!({ "userId": 4, "title": "Hi", "message": "Welcome" }),
            Some(&cookie),
        )
        .await;
    assert_eq!(reply.data()["success"], true);
    let sent = app.store.notifications.lock().expect("notifications lock")[0].clone();
    assert_eq!(sent.kind, "info");
    assert_eq!(sent.points, 0);
    assert_eq!(app.store.audit()[0].action, AdminAction::CreateNotification);
}

#[tokio::test]
async fn task_update_without_fields_writes_nothing() {
    let app = TestApp::new(FakeStore::default());
    let cookie = app.admin();

    let reply = app
        .mutate("tasks.update", json!({ "id": 3 }), Some(&cookie))
        .await;
    assert_eq!(reply.data()["success"], true);
    assert!(app.store.writes().is_empty());
    assert!(app.store.audit().is_empty());

    app.mutate(
        "tasks.update",
        json!({ "id": 3, "isActive": false }),
        Some(&cookie),
    )
    .await;
    assert_eq!(app.store.writes(), vec!["task:3".to_string()]);
    assert_eq!(app.store.audit()[0].action, AdminAction::UpdateTask);
}

#[tokio::test]
async fn missing_user_is_not_found() {
    let app = TestApp::new(FakeStore::with_users(&[1]));
    let cookie = app.admin();
    let reply = app
        .query("appUsers.getById", Some(json!({ "id": 99 })), Some(&cookie))
        .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.json["error"]["message"], "User not found");

    let reply = app
        .query("appUsers.getById", Some(json!({ "id": 1 })), Some(&cookie))
        .await;
    assert_eq!(reply.data()["id"], 1);
}

#[tokio::test]
async fn console_only_forwards_select_statements_verbatim() {
    let app = TestApp::new(FakeStore::default());
    let cookie = app.admin();

    let reply = app
        .mutate(
            "database.query",
            json!({ "sql": "delete from users" }),
            Some(&cookie),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json["error"]["message"], "Only SELECT queries are allowed");
    assert!(app.console.calls().is_empty());

    let sql = "  SELECT * FROM users WHERE id = $1";
    let reply = app
        .mutate(
            "database.query",
            json!({ "sql": sql, "params": [7] }),
            Some(&cookie),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.data()["rowCount"], 1);
    assert_eq!(app.console.calls(), vec![(sql.to_string(), vec![json!(7)])]);
    assert!(app.store.audit().is_empty());
}

#[tokio::test]
async fn console_execute_logs_the_statement_head() {
    let app = TestApp::new(FakeStore::default());
    let cookie = app.admin();
    let sql = format!("UPDATE users SET points = 0 WHERE name = '{}'", "x".repeat(200));

    let reply = app
        .mutate("database.execute", json!({ "sql": sql }), Some(&cookie))
        .await;
    assert_eq!(reply.data()["rowsAffected"], 3);

    let audit = app.store.audit();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action, AdminAction::ExecuteSql);
    let head: String = sql.chars().take(100).collect();
    assert!(audit[0].details.ends_with(&head));
}

#[tokio::test]
async fn logout_clears_the_session_cookie() {
    let app = TestApp::new(FakeStore::default());
    let reply = app.mutate("auth.logout", json!({}), None).await;
    assert_eq!(reply.data()["success"], true);
    let cookie = reply
        .headers
        .get(axum::http::header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("set-cookie");
    assert!(cookie.starts_with("app_session_id=;"));
    assert!(cookie.contains("Max-Age=0"));
}
