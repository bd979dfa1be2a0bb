//! Admin server configuration.

use tracing::warn;
use ym_core::session::jwt::resolve_session_secret;

/// Configuration for the admin API, read once at startup.
#[derive(Clone, Debug)]
pub struct AdminConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Session signing secret.
    pub session_secret: String,
    /// Application id sent to the OAuth provider and embedded in sessions.
    pub app_id: String,
    /// Base URL of the OAuth provider.
    pub oauth_server_url: String,
    /// Subject id that is promoted to `admin` on first sign-in.
    pub owner_open_id: String,
    /// Base URL of the outbound notification service.
    pub forge_api_url: String,
    /// Bearer key for the outbound notification service.
    pub forge_api_key: String,
    /// When `false`, admin-tier procedures are reachable without a session.
    pub require_admin_auth: bool,
    /// Exposes `database.query` / `database.execute`.
    pub sql_console_enabled: bool,
    /// Directory holding the compiled dashboard bundle.
    pub static_dir: String,
}

impl AdminConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                 | Default                                     |
    /// |--------------------------|---------------------------------------------|
    /// | `DATABASE_URL`           | `postgres://localhost:5432/youngmoney`      |
    /// | `JWT_SECRET` / `AUTH_SECRET` | generated & persisted to file           |
    /// | `VITE_APP_ID`            | empty                                       |
    /// | `OAUTH_SERVER_URL`       | empty                                       |
    /// | `OWNER_OPEN_ID`          | empty                                       |
    /// | `BUILT_IN_FORGE_API_URL` | empty                                       |
    /// | `BUILT_IN_FORGE_API_KEY` | empty                                       |
    /// | `REQUIRE_ADMIN_AUTH`     | `true`                                      |
    /// | `SQL_CONSOLE_ENABLED`    | `false`                                     |
    /// | `STATIC_DIR`             | `dist/public`                               |
    pub fn from_env() -> Self {
        let config = Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/youngmoney".into()),
            session_secret: resolve_session_secret(),
            app_id: env_or_empty("VITE_APP_ID"),
            oauth_server_url: env_or_empty("OAUTH_SERVER_URL"),
            owner_open_id: env_or_empty("OWNER_OPEN_ID"),
            forge_api_url: env_or_empty("BUILT_IN_FORGE_API_URL"),
            forge_api_key: env_or_empty("BUILT_IN_FORGE_API_KEY"),
            require_admin_auth: env_flag("REQUIRE_ADMIN_AUTH", true),
            sql_console_enabled: env_flag("SQL_CONSOLE_ENABLED", false),
            static_dir: std::env::var("STATIC_DIR").unwrap_or_else(|_| "dist/public".into()),
        };
        if config.oauth_server_url.is_empty() {
            warn!("OAUTH_SERVER_URL is not configured; sign-in will fail");
        }
        if !config.require_admin_auth {
            warn!("REQUIRE_ADMIN_AUTH is off; admin procedures are publicly reachable");
        }
        config
    }
}

fn env_or_empty(key: &str) -> String {
    std::env::var(key).unwrap_or_default()
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .and_then(|v| parse_flag(&v))
        .unwrap_or(default)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
