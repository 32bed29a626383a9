use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;

/// Per user x lesson progress record. Created on the first attempt at a
/// lesson, updated on every later one, never deleted.
#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct LessonProgress {
    id: Uuid,
    user_id: Uuid,
    lesson_id: Uuid,
    is_completed: bool,
    score: i32,
    best_score: i32,
    attempts_count: i32,
    total_xp_earned: i32,
    last_attempt_at: Option<DateTime<Utc>>,
}

impl ResourceTyped for LessonProgress {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::LessonProgress
    }
}

impl LessonProgress {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn lesson_id(&self) -> Uuid {
        self.lesson_id
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn best_score(&self) -> i32 {
        self.best_score
    }

    pub fn attempts_count(&self) -> i32 {
        self.attempts_count
    }

    pub fn total_xp_earned(&self) -> i32 {
        self.total_xp_earned
    }

    pub fn last_attempt_at(&self) -> Option<DateTime<Utc>> {
        self.last_attempt_at
    }
}

pub struct ProgressUpsert {
    pub user_id: Uuid,
    pub lesson_id: Uuid,
    pub score: i32,
    pub is_completed: bool,
    pub xp_earned: i32,
}

impl LessonProgress {
    /// One attempt folded into the record: `score` is the latest attempt,
    /// `best_score` the historical maximum, `is_completed` is one-way (an
    /// imperfect retry never clears it).
    pub async fn upsert_attempt(
        conn: &mut PgConnection,
        data: &ProgressUpsert,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO lesson_progress
                (id, user_id, lesson_id, is_completed, score, best_score, attempts_count, total_xp_earned, last_attempt_at)
            VALUES ($1,$2,$3,$4,$5,$5,1,$6,$7)
            ON CONFLICT (user_id, lesson_id) DO UPDATE SET
                is_completed = lesson_progress.is_completed OR EXCLUDED.is_completed,
                score = EXCLUDED.score,
                best_score = GREATEST(lesson_progress.best_score, EXCLUDED.best_score),
                attempts_count = lesson_progress.attempts_count + 1,
                total_xp_earned = lesson_progress.total_xp_earned + EXCLUDED.total_xp_earned,
                last_attempt_at = EXCLUDED.last_attempt_at
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.user_id)
        .bind(data.lesson_id)
        .bind(data.is_completed)
        .bind(data.score)
        .bind(data.xp_earned)
        .bind(now)
        .fetch_one(conn)
        .await?;

        Ok(row)
    }

    pub async fn find_for_lesson(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        lesson_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result =
            sqlx::query_as("SELECT * FROM lesson_progress WHERE user_id = $1 AND lesson_id = $2")
                .bind(actor.user_id())
                .bind(lesson_id)
                .fetch_optional(mm.executor())
                .await?;
        Ok(result)
    }

    pub async fn count_completed(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM lesson_progress WHERE user_id = $1 AND is_completed = TRUE",
        )
        .bind(actor.user_id())
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }
}
