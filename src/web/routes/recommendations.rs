use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Router, middleware, response::IntoResponse};
use chrono::Utc;
use serde::Deserialize;

use crate::engine::{
    AdaptiveLearningPath, AnswerSample, CandidateLesson, CandidateProgress, Difficulty,
    SubmissionSample, analyze_history, build_learning_path,
};
use crate::model::entity::{LessonWithProgressRow, Submission, UserEntity};
use crate::model::{CrudRepository, ResourceTyped};
use crate::web::error::ErrorResponse;
use crate::web::{AppState, RequestContext, WebError, WebResult, middlewares};

const DEFAULT_LIMIT: usize = 5;

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(recommendations_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RecommendationQuery {
    pub limit: Option<usize>,
}

#[utoipa::path(
    get,
    path = "/api/v1/recommendations/",
    description = "Build an adaptive learning path from the caller's full submission history",
    params(
        ("limit" = Option<usize>, Query, description = "Maximum number of recommendations, defaults to 5")
    ),
    responses(
        (status = 200, description = "Learning path generated", body = AdaptiveLearningPath),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "recommendations"
)]
pub async fn recommendations_handler(
    State(state): State<AppState>,
    Query(query): Query<RecommendationQuery>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let account = UserEntity::find_by_id(state.pool(), user, user.user_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(UserEntity::get_resource_type()))?;

    let history = Submission::history_for_user(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Submission::get_resource_type(), e))?;

    let mut samples = Vec::with_capacity(history.len());
    for submission in &history {
        let answers = submission
            .stored_answers()
            .map_err(|e| WebError::resource_fetch_error(Submission::get_resource_type(), e))?
            .into_iter()
            .map(|a| AnswerSample {
                difficulty: Difficulty::from(a.difficulty.as_str()),
                is_correct: a.is_correct,
            })
            .collect();

        samples.push(SubmissionSample {
            answers,
            time_spent_seconds: submission.time_spent_seconds(),
            submitted_on: submission.created_at().date_naive(),
        });
    }

    let now = Utc::now();
    let pattern = analyze_history(&samples, account.current_streak(), now.date_naive());

    let catalog: Vec<CandidateLesson> = LessonWithProgressRow::list_for_user(state.pool(), user)
        .await
        .map_err(|e| {
            WebError::resource_fetch_error(crate::model::entity::Lesson::get_resource_type(), e)
        })?
        .into_iter()
        .map(candidate_from_row)
        .collect();

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    let path = build_learning_path(user.user_id(), pattern, &catalog, limit, now);

    Ok((StatusCode::OK, Json(path)))
}

fn candidate_from_row(row: LessonWithProgressRow) -> CandidateLesson {
    let progress = row.attempts_count.map(|attempts| CandidateProgress {
        is_completed: row.is_completed.unwrap_or(false),
        score: row.score.unwrap_or(0),
        best_score: row.best_score.unwrap_or(0),
        attempts_count: attempts,
    });

    CandidateLesson {
        id: row.id,
        title: row.title,
        difficulty: Difficulty::from(row.difficulty.as_str()),
        order_index: row.order_index,
        progress,
    }
}
