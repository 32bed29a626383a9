use serde::Deserialize;
use uuid::Uuid;

use crate::engine::AttemptAnswer;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SubmitRequest {
    pub lesson_id: Uuid,
    /// Client-generated idempotency key for this attempt.
    pub attempt_id: Uuid,
    pub answers: Vec<AttemptAnswer>,
    pub time_spent_seconds: Option<i32>,
}
