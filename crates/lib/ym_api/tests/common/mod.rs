//! In-memory stand-ins for the datastore, identity store, identity provider
//! and SQL console, plus request helpers for driving the router.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use chrono::Utc;
use serde_json::{Value, json};
use tower::ServiceExt;
use ym_api::AppState;
use ym_api::config::AdminConfig;
use ym_api::services::oauth::{IdentityProvider, OAuthError, ProviderUser, TokenResponse};
use ym_core::identity::{AuthError, IdentityStore};
use ym_core::models::audit::NewAdminLogEntry;
use ym_core::models::business::{
    DashboardStats, NewNotification, NewWithdrawal, PointsOperation, PrizeUpdate, TaskUpdate,
    WithdrawalStats, WithdrawalStatus,
};
use ym_core::models::identity::{IdentityRecord, IdentityUpsert, Role};
use ym_core::session::ONE_YEAR_SECS;
use ym_core::session::jwt::sign_session;
use ym_core::store::{
    AuditStore, Catalog, ExplorerStore, Feed, FeedStore, NotificationStore, SecurityStore,
    SettingsStore, SqlConsole, StoreError, UserStore, WithdrawalStore,
};

pub const SECRET: &str = "integration-secret";
pub const APP_ID: &str = "ym-admin-test";
pub const OWNER: &str = "owner-open-id";

fn injected() -> StoreError {
    StoreError::Shape("injected failure".into())
}

// ---------------------------------------------------------------------------
// Business store
// ---------------------------------------------------------------------------

/// Business tables held in memory. Every successful write is appended to
/// `writes`.
#[derive(Default)]
pub struct FakeStore {
    pub users: Mutex<BTreeMap<i32, Value>>,
    pub writes: Mutex<Vec<String>>,
    pub audit: Mutex<Vec<NewAdminLogEntry>>,
    pub notifications: Mutex<Vec<NewNotification>>,
    /// Recipients whose notification insert fails.
    pub failing_recipients: Mutex<BTreeSet<i32>>,
    pub fail_writes: AtomicBool,
    pub fail_audit: AtomicBool,
}

impl FakeStore {
    pub fn with_users(ids: &[i32]) -> Self {
        let store = Self::default();
        {
            let mut users = store.users.lock().expect("users lock");
            for &id in ids {
                users.insert(
                    id,
                    json!({
                        "id": id,
                        "name": format!("user {id}"),
                        "email": format!("u{id}@example.com"),
                        "points": 0,
                        "balance": 0.0,
                        "deviceId": format!("device-{id}"),
                    }),
                );
            }
        }
        store
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().expect("writes lock").clone()
    }

    pub fn audit(&self) -> Vec<NewAdminLogEntry> {
        self.audit.lock().expect("audit lock").clone()
    }

    pub fn points(&self, id: i32) -> i64 {
        self.users.lock().expect("users lock")[&id]["points"]
            .as_i64()
            .expect("points")
    }

    fn write(&self, what: String) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.writes.lock().expect("writes lock").push(what);
        Ok(())
    }
}

#[async_trait]
impl UserStore for FakeStore {
    async fn list_users(
        &self,
        limit: i64,
        offset: i64,
        search: Option<&str>,
    ) -> Result<Vec<Value>, StoreError> {
        let users = self.users.lock().expect("users lock");
        Ok(users
            .values()
            .filter(|u| search.is_none_or(|s| u["name"].as_str().unwrap_or("").contains(s)))
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count_users(&self, search: Option<&str>) -> Result<i64, StoreError> {
        let users = self.users.lock().expect("users lock");
        Ok(users
            .values()
            .filter(|u| search.is_none_or(|s| u["name"].as_str().unwrap_or("").contains(s)))
            .count() as i64)
    }

    async fn get_user(&self, id: i32) -> Result<Option<Value>, StoreError> {
        Ok(self.users.lock().expect("users lock").get(&id).cloned())
    }

    async fn update_points(
        &self,
        id: i32,
        operation: PointsOperation,
        points: i64,
    ) -> Result<(), StoreError> {
        self.write(format!("points:{id}:{operation}:{points}"))?;
        let mut users = self.users.lock().expect("users lock");
        if let Some(user) = users.get_mut(&id) {
            let current = user["points"].as_i64().unwrap_or(0);
            user["points"] = json!(match operation {
                PointsOperation::Add => current + points,
                PointsOperation::Subtract => current - points,
                PointsOperation::Set => points,
            });
        }
        Ok(())
    }

    async fn update_balance(&self, id: i32, balance: f64) -> Result<(), StoreError> {
        self.write(format!("balance:{id}:{balance}"))
    }

    async fn ban_user(&self, id: i32, reason: &str) -> Result<bool, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(injected());
        }
        let has_device = self
            .users
            .lock()
            .expect("users lock")
            .get(&id)
            .and_then(|user| user["deviceId"].as_str())
            .is_some_and(|device| !device.is_empty());
        if !has_device {
            return Ok(false);
        }
        self.write(format!("ban:{id}:{reason}"))?;
        Ok(true)
    }

    async fn delete_all_users(&self) -> Result<u64, StoreError> {
        self.write("delete_all".into())?;
        let mut users = self.users.lock().expect("users lock");
        let count = users.len() as u64;
        users.clear();
        Ok(count)
    }

    async fn list_user_ids(&self) -> Result<Vec<i32>, StoreError> {
        Ok(self.users.lock().expect("users lock").keys().copied().collect())
    }

    async fn point_transactions(
        &self,
        user_id: Option<i32>,
        limit: i64,
    ) -> Result<Vec<Value>, StoreError> {
        Ok(vec![json!({ "userId": user_id, "limit": limit })])
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(injected());
        }
        Ok(DashboardStats {
            total_users: self.users.lock().expect("users lock").len() as i64,
            ..Default::default()
        })
    }
}

#[async_trait]
impl WithdrawalStore for FakeStore {
    async fn list_withdrawals(
        &self,
        status: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Value>, StoreError> {
        Ok(vec![json!({ "status": status, "limit": limit })])
    }

    async fn update_withdrawal_status(
        &self,
        id: i32,
        status: WithdrawalStatus,
        receipt_url: Option<&str>,
    ) -> Result<(), StoreError> {
        self.write(format!(
            "withdrawal:{id}:{status}:{}",
            receipt_url.unwrap_or("-")
        ))
    }

    async fn withdrawal_stats(&self) -> Result<WithdrawalStats, StoreError> {
        Ok(WithdrawalStats::default())
    }

    async fn create_withdrawal(&self, withdrawal: &NewWithdrawal) -> Result<(), StoreError> {
        self.write(format!(
            "create_withdrawal:{}:{}:{}",
            withdrawal.user_id, withdrawal.amount, withdrawal.status
        ))
    }
}

#[async_trait]
impl SettingsStore for FakeStore {
    async fn update_system_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.write(format!("setting:{key}={value}"))
    }

    async fn update_roulette_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.write(format!("roulette:{key}={value}"))
    }

    async fn update_roulette_prize(&self, prize: &PrizeUpdate) -> Result<(), StoreError> {
        self.write(format!("prize:{}", prize.id))
    }

    async fn update_daily_task(&self, task: &TaskUpdate) -> Result<bool, StoreError> {
        if task.is_empty() {
            return Ok(false);
        }
        self.write(format!("task:{}", task.id))?;
        Ok(true)
    }
}

#[async_trait]
impl NotificationStore for FakeStore {
    async fn create_notification(
        &self,
        notification: &NewNotification,
    ) -> Result<(), StoreError> {
        if self
            .failing_recipients
            .lock()
            .expect("recipients lock")
            .contains(&notification.user_id)
        {
            return Err(injected());
        }
        self.write(format!("notification:{}", notification.user_id))?;
        self.notifications
            .lock()
            .expect("notifications lock")
            .push(notification.clone());
        Ok(())
    }
}

#[async_trait]
impl SecurityStore for FakeStore {
    async fn add_to_blacklist(&self, device_id: &str, reason: &str) -> Result<(), StoreError> {
        self.write(format!("blacklist:{device_id}:{reason}"))
    }

    async fn remove_from_blacklist(&self, id: i32) -> Result<(), StoreError> {
        self.write(format!("unblacklist:{id}"))
    }

    async fn terminate_session(&self, id: i32) -> Result<(), StoreError> {
        self.write(format!("terminate:{id}"))
    }
}

#[async_trait]
impl FeedStore for FakeStore {
    async fn feed(&self, feed: Feed, limit: i64) -> Result<Vec<Value>, StoreError> {
        Ok(vec![json!({ "feed": format!("{feed:?}"), "limit": limit })])
    }

    async fn catalog(&self, catalog: Catalog) -> Result<Vec<Value>, StoreError> {
        Ok(vec![json!({ "catalog": format!("{catalog:?}") })])
    }
}

#[async_trait]
impl AuditStore for FakeStore {
    async fn insert_admin_log(&self, entry: &NewAdminLogEntry) -> Result<(), StoreError> {
        if self.fail_audit.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.audit.lock().expect("audit lock").push(entry.clone());
        Ok(())
    }
}

#[async_trait]
impl ExplorerStore for FakeStore {
    async fn list_tables(&self) -> Result<Vec<Value>, StoreError> {
        Ok(vec![json!({ "tableName": "users" })])
    }

    async fn describe_table(&self, table: &str) -> Result<Vec<Value>, StoreError> {
        Ok(vec![json!({ "table": table, "columnName": "id" })])
    }
}

// ---------------------------------------------------------------------------
// Identities
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeIdentities {
    pub records: Mutex<BTreeMap<String, IdentityRecord>>,
}

impl FakeIdentities {
    pub fn seed(&self, open_id: &str, role: Role) -> IdentityRecord {
        let mut records = self.records.lock().expect("records lock");
        let now = Utc::now();
        let record = IdentityRecord {
            id: records.len() as i32 + 1,
            open_id: open_id.into(),
            name: Some(format!("{open_id} name")),
            email: None,
            login_method: Some("email".into()),
            role,
            created_at: now,
            updated_at: now,
            last_signed_in: now,
        };
        records.insert(open_id.into(), record.clone());
        record
    }

    pub fn get(&self, open_id: &str) -> Option<IdentityRecord> {
        self.records.lock().expect("records lock").get(open_id).cloned()
    }
}

#[async_trait]
impl IdentityStore for FakeIdentities {
    async fn find_by_open_id(&self, open_id: &str) -> Result<Option<IdentityRecord>, AuthError> {
        Ok(self.get(open_id))
    }

    async fn upsert(&self, upsert: &IdentityUpsert) -> Result<(), AuthError> {
        let mut records = self.records.lock().expect("records lock");
        let now = Utc::now();
        let next_id = records.len() as i32 + 1;
        let record = records
            .entry(upsert.open_id.clone())
            .or_insert_with(|| IdentityRecord {
                id: next_id,
                open_id: upsert.open_id.clone(),
                name: None,
                email: None,
                login_method: None,
                role: Role::User,
                created_at: now,
                updated_at: now,
                last_signed_in: now,
            });
        if let Some(name) = &upsert.name {
            record.name = name.clone();
        }
        if let Some(email) = &upsert.email {
            record.email = email.clone();
        }
        if let Some(method) = &upsert.login_method {
            record.login_method = method.clone();
        }
        if let Some(role) = upsert.role {
            record.role = role;
        }
        if let Some(at) = upsert.last_signed_in {
            record.last_signed_in = at;
        }
        record.updated_at = now;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Identity provider
// ---------------------------------------------------------------------------

/// Provider that answers every code with one fixed profile.
pub struct FakeProvider {
    pub user: ProviderUser,
    /// Fail profile lookups made with a session token.
    pub fail_sync: bool,
}

impl FakeProvider {
    pub fn new(open_id: &str) -> Self {
        Self {
            user: ProviderUser {
                open_id: open_id.into(),
                name: Some("Signed In".into()),
                email: Some("signed@example.com".into()),
                login_method: Some("google".into()),
                ..Default::default()
            },
            fail_sync: false,
        }
    }

    pub fn failing_sync(open_id: &str) -> Self {
        Self {
            fail_sync: true,
            ..Self::new(open_id)
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    async fn exchange_code(&self, code: &str, _state: &str) -> Result<TokenResponse, OAuthError> {
        if code == "bad" {
            return Err(OAuthError::Status {
                status: 400,
                body: "invalid code".into(),
            });
        }
        Ok(TokenResponse {
            access_token: format!("access-{code}"),
            token_type: None,
            expires_in: None,
            refresh_token: None,
            scope: None,
            id_token: None,
        })
    }

    async fn user_info(&self, _access_token: &str) -> Result<ProviderUser, OAuthError> {
        Ok(self.user.clone())
    }

    async fn user_info_with_jwt(&self, _jwt: &str) -> Result<ProviderUser, OAuthError> {
        if self.fail_sync {
            return Err(OAuthError::Status {
                status: 503,
                body: "unavailable".into(),
            });
        }
        Ok(self.user.clone())
    }
}

// ---------------------------------------------------------------------------
// SQL console
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeConsole {
    pub calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl FakeConsole {
    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl SqlConsole for FakeConsole {
    async fn select(&self, sql: &str, params: &[Value]) -> Result<Vec<Value>, StoreError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((sql.to_string(), params.to_vec()));
        Ok(vec![json!({ "n": 1 })])
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, StoreError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((sql.to_string(), params.to_vec()));
        Ok(3)
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub fn test_config() -> AdminConfig {
    AdminConfig {
        database_url: "postgres://unused".into(),
        session_secret: SECRET.into(),
        app_id: APP_ID.into(),
        oauth_server_url: String::new(),
        owner_open_id: OWNER.into(),
        forge_api_url: String::new(),
        forge_api_key: String::new(),
        require_admin_auth: true,
        sql_console_enabled: true,
        static_dir: "does-not-exist".into(),
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<FakeStore>,
    pub identities: Arc<FakeIdentities>,
    pub console: Arc<FakeConsole>,
}

/// Sends handler logs to the test harness output.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

impl TestApp {
    pub fn new(store: FakeStore) -> Self {
        Self::build(store, test_config(), FakeProvider::new("provider-user"))
    }

    pub fn build(store: FakeStore, config: AdminConfig, provider: FakeProvider) -> Self {
        init_tracing();
        let store = Arc::new(store);
        let identities = Arc::new(FakeIdentities::default());
        let console = Arc::new(FakeConsole::default());
        let enabled = config.sql_console_enabled;
        let state = AppState::new(
            config,
            store.clone(),
            identities.clone(),
            Arc::new(provider),
            enabled.then(|| console.clone() as Arc<dyn SqlConsole>),
        );
        Self {
            router: ym_api::router(state),
            store,
            identities,
            console,
        }
    }

    /// Seed an identity and return a cookie header value for it.
    pub fn login(&self, open_id: &str, role: Role) -> String {
        self.identities.seed(open_id, role);
        session_cookie_for(open_id)
    }

    pub fn admin(&self) -> String {
        self.login("admin-open-id", Role::Admin)
    }

    pub async fn send(&self, request: Request<Body>) -> Reply {
        let resp = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("request");
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("read body");
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).expect("parse JSON")
        };
        Reply {
            status,
            headers,
            json,
        }
    }

    pub async fn query(&self, path: &str, input: Option<Value>, cookie: Option<&str>) -> Reply {
        self.send(query_request(path, input, cookie)).await
    }

    pub async fn mutate(&self, path: &str, input: Value, cookie: Option<&str>) -> Reply {
        self.send(mutation_request(path, input, cookie)).await
    }
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub json: Value,
}

impl Reply {
    pub fn data(&self) -> &Value {
        &self.json["result"]["data"]
    }

    pub fn error_code(&self) -> &str {
        self.json["error"]["data"]["code"].as_str().unwrap_or("")
    }
}

pub fn session_cookie_for(open_id: &str) -> String {
    let token = sign_session(open_id, APP_ID, "", ONE_YEAR_SECS, SECRET.as_bytes())
        .expect("sign session");
    format!("app_session_id={token}")
}

pub fn query_request(path: &str, input: Option<Value>, cookie: Option<&str>) -> Request<Body> {
    let mut uri = format!("/api/trpc/{path}");
    if let Some(input) = input {
        let encoded: String =
            url::form_urlencoded::byte_serialize(input.to_string().as_bytes()).collect();
        uri.push_str(&format!("?input={encoded}"));
    }
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request")
}

pub fn mutation_request(path: &str, input: Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(format!("/api/trpc/{path}"))
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "203.0.113.9, 10.0.0.1");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder
        .body(Body::from(input.to_string()))
        .expect("request")
}
