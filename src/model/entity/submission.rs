use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;

/// One immutable attempt record. Never updated or deleted once written;
/// `(user_id, lesson_id, attempt_id)` is unique at the store level.
#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Submission {
    id: Uuid,
    user_id: Uuid,
    lesson_id: Uuid,
    attempt_id: Uuid,
    answers: String,
    is_correct: bool,
    xp_earned: i32,
    score: i32,
    time_spent_seconds: i32,
    created_at: DateTime<Utc>,
}

impl ResourceTyped for Submission {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Submission
    }
}

/// Per-answer grading detail persisted with the submission. Difficulty is
/// captured at grading time so the pattern analyzer never re-reads the
/// catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAnswer {
    pub problem_id: Uuid,
    pub answer: String,
    pub is_correct: bool,
    pub xp: i32,
    pub difficulty: String,
}

impl Submission {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn lesson_id(&self) -> Uuid {
        self.lesson_id
    }

    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    pub fn xp_earned(&self) -> i32 {
        self.xp_earned
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn time_spent_seconds(&self) -> i32 {
        self.time_spent_seconds
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn stored_answers(&self) -> DatabaseResult<Vec<StoredAnswer>> {
        let answers = serde_json::from_str(&self.answers)?;
        Ok(answers)
    }
}

pub struct SubmissionCreate {
    pub user_id: Uuid,
    pub lesson_id: Uuid,
    pub attempt_id: Uuid,
    pub answers: Vec<StoredAnswer>,
    pub is_correct: bool,
    pub xp_earned: i32,
    pub score: i32,
    pub time_spent_seconds: i32,
}

impl Submission {
    /// Inserts the attempt unless the same `(user, lesson, attempt_id)` tuple
    /// already exists. Returns false on conflict, which is the idempotent
    /// replay signal — the caller must then skip every other mutation.
    pub async fn insert_if_absent(
        conn: &mut PgConnection,
        data: &SubmissionCreate,
        created_at: DateTime<Utc>,
    ) -> DatabaseResult<bool> {
        let answers = serde_json::to_string(&data.answers)?;
        let result = sqlx::query(
            r#"
            INSERT INTO submissions
                (id, user_id, lesson_id, attempt_id, answers, is_correct, xp_earned, score, time_spent_seconds, created_at)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
            ON CONFLICT (user_id, lesson_id, attempt_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.user_id)
        .bind(data.lesson_id)
        .bind(data.attempt_id)
        .bind(&answers)
        .bind(data.is_correct)
        .bind(data.xp_earned)
        .bind(data.score)
        .bind(data.time_spent_seconds)
        .bind(created_at)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn find_for_attempt(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        lesson_id: Uuid,
        attempt_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM submissions WHERE user_id = $1 AND lesson_id = $2 AND attempt_id = $3",
        )
        .bind(user_id)
        .bind(lesson_id)
        .bind(attempt_id)
        .fetch_optional(mm.executor())
        .await?;
        Ok(result)
    }

    /// Full chronological history for one user, oldest first.
    pub async fn history_for_user(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Vec<Self>> {
        let result =
            sqlx::query_as("SELECT * FROM submissions WHERE user_id = $1 ORDER BY created_at ASC")
                .bind(actor.user_id())
                .fetch_all(mm.executor())
                .await?;
        Ok(result)
    }

    pub async fn count(mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM submissions WHERE user_id = $1")
            .bind(actor.user_id())
            .fetch_one(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn count_correct(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM submissions WHERE user_id = $1 AND is_correct = TRUE",
        )
        .bind(actor.user_id())
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }
}
