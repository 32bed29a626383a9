use axum::Json;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Router, extract::State, middleware, response::IntoResponse};

use crate::engine::{SubmitOutcome, submit_attempt};
use crate::web::dto::submissions::SubmitRequest;
use crate::web::error::ErrorResponse;
use crate::web::{AppState, RequestContext, WebResult, middlewares};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(submissions_create_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/v1/submissions/",
    description = "Grade a lesson attempt and apply XP, streak and progress updates. \
                   Replaying an attempt_id returns the recorded result without side effects.",
    request_body = SubmitRequest,
    responses(
        (status = 200, description = "Attempt graded", body = SubmitOutcome),
        (status = 400, description = "Answer set does not match the lesson's problems", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "submissions"
)]
pub async fn submissions_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<SubmitRequest>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let outcome = submit_attempt(
        state.pool(),
        user,
        payload.lesson_id,
        payload.attempt_id,
        &payload.answers,
        payload.time_spent_seconds.unwrap_or(0),
    )
    .await?;

    Ok((StatusCode::OK, Json(outcome)))
}
