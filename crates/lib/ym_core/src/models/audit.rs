//! Admin action log entries.

use std::fmt;

use serde::Serialize;

/// Action tags written to `admin_logs.action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminAction {
    UpdatePoints,
    UpdateBalance,
    BanUser,
    DeleteAllUsers,
    UpdateWithdrawal,
    CreateWithdrawal,
    UpdateSetting,
    UpdateRoulette,
    UpdatePrize,
    UpdateTask,
    CreateNotification,
    BroadcastNotification,
    AddBlacklist,
    RemoveBlacklist,
    TerminateSession,
    ExecuteSql,
}

impl AdminAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminAction::UpdatePoints => "UPDATE_POINTS",
            AdminAction::UpdateBalance => "UPDATE_BALANCE",
            AdminAction::BanUser => "BAN_USER",
            AdminAction::DeleteAllUsers => "DELETE_ALL_USERS",
            AdminAction::UpdateWithdrawal => "UPDATE_WITHDRAWAL",
            AdminAction::CreateWithdrawal => "CREATE_WITHDRAWAL",
            AdminAction::UpdateSetting => "UPDATE_SETTING",
            AdminAction::UpdateRoulette => "UPDATE_ROULETTE",
            AdminAction::UpdatePrize => "UPDATE_PRIZE",
            AdminAction::UpdateTask => "UPDATE_TASK",
            AdminAction::CreateNotification => "CREATE_NOTIFICATION",
            AdminAction::BroadcastNotification => "BROADCAST_NOTIFICATION",
            AdminAction::AddBlacklist => "ADD_BLACKLIST",
            AdminAction::RemoveBlacklist => "REMOVE_BLACKLIST",
            AdminAction::TerminateSession => "TERMINATE_SESSION",
            AdminAction::ExecuteSql => "EXECUTE_SQL",
        }
    }
}

impl fmt::Display for AdminAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row to append to the admin action log.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAdminLogEntry {
    pub actor_id: Option<i32>,
    pub action: AdminAction,
    pub target_type: Option<&'static str>,
    pub target_id: Option<i32>,
    pub details: String,
    pub ip_address: Option<String>,
}
