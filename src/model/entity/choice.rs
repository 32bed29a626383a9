use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use sqlx::prelude::Row;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct ProblemChoice {
    id: Uuid,
    problem_id: Uuid,
    choice_text: String,
    is_correct: bool,
}

impl ResourceTyped for ProblemChoice {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Choice
    }
}

impl ProblemChoice {
    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn problem_id(&self) -> uuid::Uuid {
        self.problem_id
    }

    pub fn choice_text(&self) -> &str {
        &self.choice_text
    }

    pub fn is_correct(&self) -> bool {
        self.is_correct
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ProblemChoiceCreate {
    pub problem_id: Uuid,
    pub choice_text: String,
    pub is_correct: Option<bool>,
}

#[async_trait]
impl CrudRepository<ProblemChoice, ProblemChoiceCreate, uuid::Uuid> for ProblemChoice {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ProblemChoiceCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query("INSERT INTO problem_choices (id, problem_id, choice_text, is_correct) VALUES ($1,$2,$3,$4) RETURNING id")
            .bind(Uuid::new_v4())
            .bind(data.problem_id)
            .bind(&data.choice_text)
            .bind(data.is_correct.unwrap_or(false))
            .fetch_one(mm.executor())
            .await?;

        let id = result.try_get("id")?;
        Ok(ProblemChoice {
            id,
            problem_id: data.problem_id,
            choice_text: data.choice_text,
            is_correct: data.is_correct.unwrap_or(false),
        })
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ProblemChoiceCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query(
            "UPDATE problem_choices SET problem_id = $1, choice_text = $2, is_correct = $3 WHERE id = $4",
        )
        .bind(data.problem_id)
        .bind(&data.choice_text)
        .bind(data.is_correct.unwrap_or(false))
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.problem_id = data.problem_id;
        self.choice_text = data.choice_text;
        self.is_correct = data.is_correct.unwrap_or(false);
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM problem_choices WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: uuid::Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM problem_choices WHERE id = $1")
            .bind(id)
            .fetch_one(mm.executor())
            .await;
        if let Err(sqlx::Error::RowNotFound) = result {
            return Ok(None);
        }

        Ok(Some(result?))
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM problem_choices LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM problem_choices")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl ProblemChoice {
    pub async fn all_by_problem(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        problem_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM problem_choices WHERE problem_id = $1")
            .bind(problem_id)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn all_by_lesson(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        lesson_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT c.id, c.problem_id, c.choice_text, c.is_correct
            FROM problem_choices c
            JOIN problems p ON p.id = c.problem_id
            WHERE p.lesson_id = $1
            "#,
        )
        .bind(lesson_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }
}
