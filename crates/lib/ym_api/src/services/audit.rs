//! Best-effort admin action log.
//!
//! Entries are written after the primary write succeeded; a failed log
//! write is logged and never fails the surrounding procedure.

use tracing::warn;
use ym_core::models::audit::{AdminAction, NewAdminLogEntry};
use ym_core::models::business::{PointsOperation, WithdrawalStatus};
use ym_core::store::AuditStore;

use crate::AppState;
use crate::rpc::Context;

/// What an audit entry is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub kind: &'static str,
    pub id: i32,
}

impl Target {
    pub fn user(id: i32) -> Self {
        Self { kind: "user", id }
    }

    pub fn withdrawal(id: i32) -> Self {
        Self {
            kind: "withdrawal",
            id,
        }
    }

    pub fn prize(id: i32) -> Self {
        Self { kind: "prize", id }
    }

    pub fn task(id: i32) -> Self {
        Self { kind: "task", id }
    }

    pub fn blacklist(id: i32) -> Self {
        Self {
            kind: "blacklist",
            id,
        }
    }

    pub fn session(id: i32) -> Self {
        Self { kind: "session", id }
    }
}

/// Append one entry for `action`, attributed to the caller.
pub async fn record(
    state: &AppState,
    ctx: &Context,
    action: AdminAction,
    target: Option<Target>,
    details: String,
) {
    let entry = NewAdminLogEntry {
        actor_id: ctx.caller_id(),
        action,
        target_type: target.map(|t| t.kind),
        target_id: target.map(|t| t.id),
        details,
        ip_address: ctx.client_ip.clone(),
    };
    if let Err(e) = state.store.insert_admin_log(&entry).await {
        warn!(action = %action, "failed to write admin log: {e}");
    }
}

pub fn points_updated(id: i32, operation: PointsOperation, points: i64) -> String {
    format!("User {id} points updated: {operation} {points}")
}

pub fn balance_updated(id: i32, balance: f64) -> String {
    format!("User {id} balance set to {balance}")
}

pub fn user_banned(id: i32, reason: &str) -> String {
    format!("User {id} banned. Reason: {reason}")
}

pub fn users_deleted(count: u64) -> String {
    format!("All users deleted. Total: {count}")
}

pub fn withdrawal_updated(id: i32, status: WithdrawalStatus, with_receipt: bool) -> String {
    let receipt = if with_receipt { " with receipt" } else { "" };
    format!("Withdrawal {id} updated to {status}{receipt}")
}

pub fn withdrawal_created(user_id: i32, amount: f64) -> String {
    format!("Withdrawal created for user {user_id}: R$ {amount}")
}

pub fn setting_updated(key: &str, value: &str) -> String {
    format!("Setting {key} updated to {value}")
}

pub fn roulette_setting_updated(key: &str, value: &str) -> String {
    format!("Roulette setting {key} updated to {value}")
}

pub fn notification_sent(user_id: i32, points: i64) -> String {
    if points > 0 {
        format!("Notification sent to user {user_id} (+{points} points)")
    } else {
        format!("Notification sent to user {user_id}")
    }
}

pub fn broadcast_sent(title: &str, points: i64, delivered: usize, total: usize) -> String {
    let credit = if points > 0 {
        format!(" (+{points} points for everyone)")
    } else {
        String::new()
    };
    format!("Broadcast notification sent: {title}{credit}. Delivered {delivered}/{total}")
}

/// Statement text, cut to its first 100 characters.
pub fn sql_executed(sql: &str) -> String {
    let head: String = sql.chars().take(100).collect();
    format!("SQL executed: {head}")
}
