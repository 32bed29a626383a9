use axum::Json;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Router, extract::State, middleware, response::IntoResponse};

use crate::model::entity::{Lesson, LessonProgress, Submission, UserEntity};
use crate::model::{CrudRepository, ResourceTyped};
use crate::web::dto::progress::ProgressOverviewResponse;
use crate::web::error::ErrorResponse;
use crate::web::{AppState, RequestContext, WebError, WebResult, middlewares};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(progress_overview_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/progress/",
    description = "Aggregate XP, streak and completion counters for the caller",
    responses(
        (status = 200, description = "Overview computed", body = ProgressOverviewResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "progress"
)]
pub async fn progress_overview_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let account = UserEntity::find_by_id(state.pool(), user, user.user_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(UserEntity::get_resource_type()))?;

    let (total_lessons, completed_lessons, total_submissions, correct_submissions) =
        tokio::try_join!(
            Lesson::count(state.pool(), user),
            LessonProgress::count_completed(state.pool(), user),
            Submission::count(state.pool(), user),
            Submission::count_correct(state.pool(), user),
        )
        .map_err(|e| WebError::resource_fetch_error(LessonProgress::get_resource_type(), e))?;

    Ok((
        StatusCode::OK,
        Json(ProgressOverviewResponse::new(
            account.total_xp(),
            account.current_streak(),
            account.best_streak(),
            total_lessons,
            completed_lessons,
            total_submissions,
            correct_submissions,
        )),
    ))
}
