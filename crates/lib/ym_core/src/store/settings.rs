//! Key/value settings, roulette prizes and daily tasks.

use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use super::{PgStore, StoreError};
use crate::models::business::{PrizeUpdate, TaskUpdate};

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn update_system_setting(&self, key: &str, value: &str) -> Result<(), StoreError>;

    async fn update_roulette_setting(&self, key: &str, value: &str) -> Result<(), StoreError>;

    async fn update_roulette_prize(&self, prize: &PrizeUpdate) -> Result<(), StoreError>;

    /// Apply the supplied task fields. Returns `false` without touching the
    /// database when no field was supplied.
    async fn update_daily_task(&self, task: &TaskUpdate) -> Result<bool, StoreError>;
}

/// Build the partial `UPDATE daily_tasks` statement, or `None` when empty.
pub(crate) fn task_update_query(task: &TaskUpdate) -> Option<QueryBuilder<'_, Postgres>> {
    if task.is_empty() {
        return None;
    }
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE daily_tasks SET ");
    {
        let mut set = qb.separated(", ");
        if let Some(name) = &task.task_name {
            set.push("task_name = ");
            set.push_bind_unseparated(name);
        }
        if let Some(points) = task.points_reward {
            set.push("points_reward = ");
            set.push_bind_unseparated(points);
        }
        if let Some(active) = task.is_active {
            set.push("is_active = ");
            set.push_bind_unseparated(active);
        }
    }
    qb.push(" WHERE id = ");
    qb.push_bind(task.id);
    Some(qb)
}

#[async_trait]
impl SettingsStore for PgStore {
    async fn update_system_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE system_settings SET setting_value = $1, updated_at = NOW() WHERE setting_key = $2",
        )
        .bind(value)
        .bind(key)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_roulette_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE roulette_settings SET setting_value = $1, updated_at = NOW() WHERE setting_key = $2",
        )
        .bind(value)
        .bind(key)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_roulette_prize(&self, prize: &PrizeUpdate) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE roulette_prizes SET prize_name = $1, prize_value = $2, probability = $3, is_active = $4 \
             WHERE id = $5",
        )
        .bind(&prize.prize_name)
        .bind(prize.prize_value)
        .bind(prize.probability)
        .bind(prize.is_active)
        .bind(prize.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_daily_task(&self, task: &TaskUpdate) -> Result<bool, StoreError> {
        let Some(mut qb) = task_update_query(task) else {
            return Ok(false);
        };
        qb.build().execute(&self.pool).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_task_update_builds_nothing() {
        let task = TaskUpdate {
            id: 1,
            ..Default::default()
        };
        assert!(task_update_query(&task).is_none());
    }

    #[test]
    fn only_supplied_task_fields_are_set() {
        let task = TaskUpdate {
            id: 7,
            points_reward: Some(50),
            is_active: Some(true),
            ..Default::default()
        };
        let qb = task_update_query(&task).unwrap();
        assert_eq!(
            qb.sql(),
            "UPDATE daily_tasks SET points_reward = $1, is_active = $2 WHERE id = $3"
        );
    }
}
