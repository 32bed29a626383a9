use serde::Serialize;
use uuid::Uuid;

use crate::model::entity::{Lesson, LessonWithProgressRow, Problem, ProblemChoice};

/// One catalog entry in the lesson listing, annotated with the caller's
/// progress and sequential unlock state.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct LessonSummaryResponse {
    id: Uuid,
    title: String,
    description: String,
    difficulty: String,
    order_index: i32,
    is_completed: bool,
    is_unlocked: bool,
    score: Option<i32>,
    best_score: Option<i32>,
    attempts_count: i32,
}

impl LessonSummaryResponse {
    /// Annotates rows (already ordered by `order_index`) with strict
    /// sequential gating: the first lesson is open, every later one needs
    /// the immediately preceding lesson completed.
    pub fn annotate(rows: Vec<LessonWithProgressRow>) -> Vec<Self> {
        rows.iter()
            .map(|row| {
                let is_unlocked = if row.order_index <= 1 {
                    true
                } else {
                    rows.iter()
                        .find(|r| r.order_index == row.order_index - 1)
                        .is_some_and(|prev| prev.is_completed.unwrap_or(false))
                };

                Self {
                    id: row.id,
                    title: row.title.clone(),
                    description: row.description.clone(),
                    difficulty: row.difficulty.clone(),
                    order_index: row.order_index,
                    is_completed: row.is_completed.unwrap_or(false),
                    is_unlocked,
                    score: row.score,
                    best_score: row.best_score,
                    attempts_count: row.attempts_count.unwrap_or(0),
                }
            })
            .collect()
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LessonDetailResponse {
    id: Uuid,
    title: String,
    description: String,
    difficulty: String,
    order_index: i32,
    problems: Vec<ProblemResponse>,
}

/// Problem as shown to a learner: the answer key (correct flags, canonical
/// answers, explanations) is withheld until grading.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProblemResponse {
    id: Uuid,
    problem_type: String,
    question: String,
    difficulty: String,
    order_index: i32,
    choices: Vec<ChoiceResponse>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ChoiceResponse {
    id: Uuid,
    choice_text: String,
}

impl LessonDetailResponse {
    pub fn from_entities(
        lesson: Lesson,
        problems: Vec<Problem>,
        choices: Vec<ProblemChoice>,
    ) -> Self {
        let problems = problems
            .into_iter()
            .map(|p| ProblemResponse {
                id: p.id(),
                problem_type: p.problem_type().to_string(),
                question: p.question().to_string(),
                difficulty: p.difficulty().to_string(),
                order_index: p.order_index(),
                choices: choices
                    .iter()
                    .filter(|c| c.problem_id() == p.id())
                    .map(|c| ChoiceResponse {
                        id: c.id(),
                        choice_text: c.choice_text().to_string(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            id: lesson.id(),
            title: lesson.title().to_string(),
            description: lesson.description().to_string(),
            difficulty: lesson.difficulty().to_string(),
            order_index: lesson.order_index(),
            problems,
        }
    }
}
