//! # ym_api
//!
//! HTTP API library for the Young Money admin backend: the tRPC-compatible
//! procedure tree, the session middleware, the OAuth callback and static
//! serving of the dashboard bundle.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod procedures;
pub mod rpc;
pub mod services;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use ym_core::identity::{IdentityStore, PgIdentityStore};
use ym_core::store::{AdminStore, PgConsole, PgStore, SqlConsole};

use crate::config::AdminConfig;
use crate::handlers::{oauth, trpc};
use crate::rpc::ProcedureRouter;
use crate::services::notify::OwnerNotifier;
use crate::services::oauth::{IdentityProvider, OAuthClient, OAuthError};

/// Shared application state passed to all handlers and procedures.
#[derive(Clone)]
pub struct AppState {
    /// Admin configuration.
    pub config: AdminConfig,
    /// Business-schema datastore.
    pub store: Arc<dyn AdminStore>,
    /// Identity records of staff.
    pub identities: Arc<dyn IdentityStore>,
    /// External OAuth identity provider.
    pub provider: Arc<dyn IdentityProvider>,
    /// Free-text SQL console; `None` unless the capability is enabled.
    pub console: Option<Arc<dyn SqlConsole>>,
    /// Outbound owner notifications.
    pub notifier: OwnerNotifier,
    /// Every registered procedure.
    pub procedures: Arc<ProcedureRouter>,
}

impl AppState {
    pub fn new(
        config: AdminConfig,
        store: Arc<dyn AdminStore>,
        identities: Arc<dyn IdentityStore>,
        provider: Arc<dyn IdentityProvider>,
        console: Option<Arc<dyn SqlConsole>>,
    ) -> Self {
        let notifier = OwnerNotifier::new(&config.forge_api_url, &config.forge_api_key);
        Self {
            config,
            store,
            identities,
            provider,
            console,
            notifier,
            procedures: Arc::new(ProcedureRouter::new(procedures::all())),
        }
    }

    /// State backed by Postgres and the configured OAuth provider.
    pub fn postgres(pool: PgPool, config: AdminConfig) -> Result<Self, OAuthError> {
        let provider = OAuthClient::new(&config.oauth_server_url, config.app_id.clone())?;
        let console = config
            .sql_console_enabled
            .then(|| Arc::new(PgConsole::new(pool.clone())) as Arc<dyn SqlConsole>);
        Ok(Self::new(
            config,
            Arc::new(PgStore::new(pool.clone())),
            Arc::new(PgIdentityStore::new(pool)),
            Arc::new(provider),
            console,
        ))
    }
}

/// Run embedded database migrations.
///
/// Delegates to `ym_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    ym_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let rpc = Router::new()
        .route(
            "/api/trpc/{path}",
            get(trpc::trpc_handler).post(trpc::trpc_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::resolve_identity,
        ));

    // Dashboard bundle with SPA fallback.
    let static_dir = PathBuf::from(&state.config.static_dir);
    let assets =
        ServeDir::new(&static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .merge(rpc)
        .route("/api/oauth/callback", get(oauth::oauth_callback_handler))
        .fallback_service(assets)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
