//! Typed inputs and aggregates for business-table operations.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How `updatePoints` applies its amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PointsOperation {
    Add,
    Subtract,
    #[default]
    Set,
}

impl PointsOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointsOperation::Add => "add",
            PointsOperation::Subtract => "subtract",
            PointsOperation::Set => "set",
        }
    }
}

impl fmt::Display for PointsOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Withdrawal review states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
}

impl WithdrawalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::Approved => "approved",
            WithdrawalStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A withdrawal created by staff on behalf of a user.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWithdrawal {
    pub user_id: i32,
    pub amount: f64,
    pub pix_type: String,
    pub pix_key: String,
    pub status: String,
}

/// Full replacement of a roulette prize's editable fields.
#[derive(Debug, Clone, PartialEq)]
pub struct PrizeUpdate {
    pub id: i32,
    pub prize_name: String,
    pub prize_value: f64,
    pub probability: f64,
    pub is_active: bool,
}

/// Partial update of a daily task; `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskUpdate {
    pub id: i32,
    pub task_name: Option<String>,
    pub points_reward: Option<i64>,
    pub is_active: Option<bool>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.task_name.is_none() && self.points_reward.is_none() && self.is_active.is_none()
    }
}

/// A notification for one app user, optionally crediting points.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: i32,
    pub title: String,
    pub message: String,
    pub kind: String,
    pub points: i64,
}

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_points: i64,
    pub total_balance: f64,
    pub pending_withdrawals: i64,
    pub pending_withdrawals_amount: f64,
    pub total_withdrawn: f64,
    pub active_users_today: i64,
}

/// Count and summed amount of withdrawals in one status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusTotals {
    pub count: i64,
    pub total: f64,
}

/// Withdrawal totals per review state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalStats {
    pub pending: StatusTotals,
    pub approved: StatusTotals,
    pub rejected: StatusTotals,
}
