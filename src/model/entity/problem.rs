use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use sqlx::prelude::Row;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Problem {
    id: Uuid,
    lesson_id: Uuid,
    problem_type: String,
    question: String,
    correct_answer: Option<String>,
    explanation: String,
    difficulty: String,
    order_index: i32,
}

impl ResourceTyped for Problem {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Problem
    }
}

impl Problem {
    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn lesson_id(&self) -> uuid::Uuid {
        self.lesson_id
    }

    pub fn problem_type(&self) -> &str {
        &self.problem_type
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn correct_answer(&self) -> Option<&str> {
        self.correct_answer.as_deref()
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    pub fn difficulty(&self) -> &str {
        &self.difficulty
    }

    pub fn order_index(&self) -> i32 {
        self.order_index
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ProblemCreate {
    pub lesson_id: Uuid,
    pub problem_type: String,
    pub question: String,
    pub correct_answer: Option<String>,
    pub explanation: String,
    pub difficulty: String,
    pub order_index: Option<i32>,
}

#[async_trait]
impl CrudRepository<Problem, ProblemCreate, uuid::Uuid> for Problem {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ProblemCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query(
            "INSERT INTO problems (id, lesson_id, problem_type, question, correct_answer, explanation, difficulty, order_index) VALUES ($1,$2,$3,$4,$5,$6,$7,$8) RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(data.lesson_id)
        .bind(&data.problem_type)
        .bind(&data.question)
        .bind(&data.correct_answer)
        .bind(&data.explanation)
        .bind(&data.difficulty)
        .bind(data.order_index.unwrap_or(0))
        .fetch_one(mm.executor())
        .await?;

        let id = result.try_get("id")?;
        Ok(Problem {
            id,
            lesson_id: data.lesson_id,
            problem_type: data.problem_type,
            question: data.question,
            correct_answer: data.correct_answer,
            explanation: data.explanation,
            difficulty: data.difficulty,
            order_index: data.order_index.unwrap_or(0),
        })
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ProblemCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query(
            "UPDATE problems SET lesson_id = $1, problem_type = $2, question = $3, correct_answer = $4, explanation = $5, difficulty = $6, order_index = $7 WHERE id = $8",
        )
        .bind(data.lesson_id)
        .bind(&data.problem_type)
        .bind(&data.question)
        .bind(&data.correct_answer)
        .bind(&data.explanation)
        .bind(&data.difficulty)
        .bind(data.order_index.unwrap_or(0))
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.lesson_id = data.lesson_id;
        self.problem_type = data.problem_type;
        self.question = data.question;
        self.correct_answer = data.correct_answer;
        self.explanation = data.explanation;
        self.difficulty = data.difficulty;
        self.order_index = data.order_index.unwrap_or(0);
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM problems WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM problems WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM problems LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM problems")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl Problem {
    pub async fn all_by_lesson(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        lesson_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result =
            sqlx::query_as("SELECT * FROM problems WHERE lesson_id = $1 ORDER BY order_index ASC")
                .bind(lesson_id)
                .fetch_all(mm.executor())
                .await?;
        Ok(result)
    }
}
