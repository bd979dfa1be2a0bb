//! Read-only listings: bounded activity feeds and full configuration tables.

use async_trait::async_trait;
use serde_json::Value;

use super::{PgStore, StoreError, fetch_limited, into_rows, json_rows_sql};

/// A newest-first listing bounded by `LIMIT $1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    Withdrawals,
    WithdrawalRequests,
    PointTransactions,
    Referrals,
    Ranking,
    Spins,
    Checkins,
    Notifications,
    Blacklist,
    SecurityViolations,
    ActiveSessions,
    MonetagEvents,
    MonetagPostbacks,
    PixPayments,
    TrackingEvents,
    AdminLogs,
}

impl Feed {
    pub const ALL: [Feed; 16] = [
        Feed::Withdrawals,
        Feed::WithdrawalRequests,
        Feed::PointTransactions,
        Feed::Referrals,
        Feed::Ranking,
        Feed::Spins,
        Feed::Checkins,
        Feed::Notifications,
        Feed::Blacklist,
        Feed::SecurityViolations,
        Feed::ActiveSessions,
        Feed::MonetagEvents,
        Feed::MonetagPostbacks,
        Feed::PixPayments,
        Feed::TrackingEvents,
        Feed::AdminLogs,
    ];

    pub fn sql(&self) -> &'static str {
        match self {
            Feed::Withdrawals => {
                "SELECT w.*, u.name AS user_name, u.email AS user_email \
                 FROM withdrawals w LEFT JOIN users u ON w.user_id = u.id \
                 ORDER BY w.id DESC LIMIT $1"
            }
            Feed::WithdrawalRequests => {
                "SELECT wr.*, u.name AS user_name, u.email AS user_email \
                 FROM withdrawal_requests wr LEFT JOIN users u ON wr.user_id = u.id \
                 ORDER BY wr.id DESC LIMIT $1"
            }
            Feed::PointTransactions => {
                "SELECT pt.*, u.name AS user_name, u.email AS user_email \
                 FROM point_transactions pt LEFT JOIN users u ON pt.user_id = u.id \
                 ORDER BY pt.id DESC LIMIT $1"
            }
            Feed::Referrals => {
                "SELECT r.*, \
                        u1.name AS referrer_name, u1.email AS referrer_email, \
                        u2.name AS referred_name, u2.email AS referred_email \
                 FROM referrals r \
                 LEFT JOIN users u1 ON r.referrer_id = u1.id \
                 LEFT JOIN users u2 ON r.referred_id = u2.id \
                 ORDER BY r.id DESC LIMIT $1"
            }
            Feed::Ranking => {
                "SELECT id, name, email, points, balance, photo_url, profile_picture \
                 FROM users ORDER BY points DESC LIMIT $1"
            }
            Feed::Spins => {
                "SELECT s.*, u.name AS user_name, u.email AS user_email \
                 FROM spins s LEFT JOIN users u ON s.user_id = u.id \
                 ORDER BY s.id DESC LIMIT $1"
            }
            Feed::Checkins => {
                "SELECT dc.*, u.name AS user_name, u.email AS user_email \
                 FROM daily_checkin dc LEFT JOIN users u ON dc.user_id = u.id \
                 ORDER BY dc.id DESC LIMIT $1"
            }
            Feed::Notifications => {
                "SELECT n.*, u.name AS user_name, u.email AS user_email \
                 FROM notifications n LEFT JOIN users u ON n.user_id = u.id \
                 ORDER BY n.created_at DESC LIMIT $1"
            }
            Feed::Blacklist => "SELECT * FROM device_blacklist ORDER BY created_at DESC LIMIT $1",
            Feed::SecurityViolations => {
                "SELECT sv.*, u.name AS user_name, u.email AS user_email \
                 FROM security_violations sv LEFT JOIN users u ON sv.user_id = u.id \
                 ORDER BY sv.created_at DESC LIMIT $1"
            }
            Feed::ActiveSessions => {
                "SELECT s.*, u.name AS user_name, u.email AS user_email \
                 FROM active_sessions s LEFT JOIN users u ON s.user_id = u.id \
                 ORDER BY s.id DESC LIMIT $1"
            }
            Feed::MonetagEvents => {
                "SELECT me.*, u.name AS user_name, u.email AS user_email \
                 FROM monetag_events me LEFT JOIN users u ON me.user_id = u.id \
                 ORDER BY me.id DESC LIMIT $1"
            }
            Feed::MonetagPostbacks => "SELECT * FROM monetag_postbacks ORDER BY id DESC LIMIT $1",
            Feed::PixPayments => {
                "SELECT pp.*, u.name AS user_name, u.email AS user_email \
                 FROM pix_payments pp LEFT JOIN users u ON pp.user_id = u.id \
                 ORDER BY pp.id DESC LIMIT $1"
            }
            Feed::TrackingEvents => {
                "SELECT te.*, u.name AS user_name, u.email AS user_email \
                 FROM tracking_events te LEFT JOIN users u ON te.user_id = u.id \
                 ORDER BY te.id DESC LIMIT $1"
            }
            Feed::AdminLogs => "SELECT * FROM admin_logs ORDER BY id DESC LIMIT $1",
        }
    }
}

/// A small configuration table returned whole, ordered by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Catalog {
    SystemSettings,
    RouletteSettings,
    RoulettePrizes,
    DailyTasks,
}

impl Catalog {
    pub fn sql(&self) -> &'static str {
        match self {
            Catalog::SystemSettings => "SELECT * FROM system_settings ORDER BY id",
            Catalog::RouletteSettings => "SELECT * FROM roulette_settings ORDER BY id",
            Catalog::RoulettePrizes => "SELECT * FROM roulette_prizes ORDER BY id",
            Catalog::DailyTasks => "SELECT * FROM daily_tasks ORDER BY id",
        }
    }
}

#[async_trait]
pub trait FeedStore: Send + Sync {
    async fn feed(&self, feed: Feed, limit: i64) -> Result<Vec<Value>, StoreError>;

    async fn catalog(&self, catalog: Catalog) -> Result<Vec<Value>, StoreError>;
}

#[async_trait]
impl FeedStore for PgStore {
    async fn feed(&self, feed: Feed, limit: i64) -> Result<Vec<Value>, StoreError> {
        fetch_limited(&self.pool, feed.sql(), limit).await
    }

    async fn catalog(&self, catalog: Catalog) -> Result<Vec<Value>, StoreError> {
        let wrapped = json_rows_sql(catalog.sql());
        let value = sqlx::query_scalar::<_, Value>(&wrapped)
            .fetch_one(&self.pool)
            .await?;
        into_rows(value)
    }
}
