use axum::Json;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Router, extract::State, middleware, response::IntoResponse};
use uuid::Uuid;

use crate::model::entity::{Lesson, LessonCreate, LessonWithProgressRow, Problem, ProblemChoice};
use crate::model::{CrudRepository, ResourceTyped};
use crate::web::dto::lessons::{LessonDetailResponse, LessonSummaryResponse};
use crate::web::error::ErrorResponse;
use crate::web::{AppState, RequestContext, UserRole, WebError, WebResult, middlewares};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(lessons_list_handler).post(lessons_create_handler))
        .route(
            "/{id}",
            get(lessons_get_handler)
                .put(lessons_update_handler)
                .delete(lessons_delete_handler),
        )
        .route("/{id}/problems", post(lessons_add_problem_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/lessons/",
    description = "List the lesson catalog annotated with the caller's progress and unlock state",
    responses(
        (status = 200, description = "Catalog listed", body = Vec<LessonSummaryResponse>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "lessons"
)]
pub async fn lessons_list_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let rows = LessonWithProgressRow::list_for_user(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(LessonSummaryResponse::annotate(rows))))
}

#[utoipa::path(
    get,
    path = "/api/v1/lessons/{lesson_id}",
    description = "Fetch one lesson with its problems; the answer key is withheld",
    params(
        ("lesson_id" = Uuid, Path, description = "ID of the lesson to get")
    ),
    responses(
        (status = 200, description = "Lesson found", body = LessonDetailResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "lessons"
)]
pub async fn lessons_get_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let lesson = Lesson::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    let Some(lesson) = lesson else {
        return Err(WebError::resource_not_found(Lesson::get_resource_type()));
    };

    let problems = Problem::all_by_lesson(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Problem::get_resource_type(), e))?;
    let choices = ProblemChoice::all_by_lesson(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(ProblemChoice::get_resource_type(), e))?;

    Ok((
        StatusCode::OK,
        Json(LessonDetailResponse::from_entities(lesson, problems, choices)),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/lessons/",
    description = "Create a lesson (admin only)",
    request_body = LessonCreate,
    responses(
        (status = 200, description = "Lesson created", body = Lesson),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not allowed to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "lessons"
)]
pub async fn lessons_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<LessonCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if user.user_role() != UserRole::Admin {
        return Err(WebError::resource_forbidden(Lesson::get_resource_type()));
    }

    let created = Lesson::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(created)))
}

pub async fn lessons_update_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Json(payload): Json<LessonCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if user.user_role() != UserRole::Admin {
        return Err(WebError::resource_forbidden(Lesson::get_resource_type()));
    }

    let found = Lesson::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    let Some(found) = found else {
        return Err(WebError::resource_not_found(Lesson::get_resource_type()));
    };

    let updated = found
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

pub async fn lessons_delete_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if user.user_role() != UserRole::Admin {
        return Err(WebError::resource_forbidden(Lesson::get_resource_type()));
    }

    let found = Lesson::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    let Some(found) = found else {
        return Err(WebError::resource_not_found(Lesson::get_resource_type()));
    };

    found
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct ProblemBody {
    pub problem_type: String,
    pub question: String,
    pub correct_answer: Option<String>,
    pub explanation: String,
    pub difficulty: String,
    pub order_index: Option<i32>,
}

#[utoipa::path(
    post,
    path = "/api/v1/lessons/{lesson_id}/problems",
    description = "Add a problem to a lesson (admin only)",
    params(
        ("lesson_id" = Uuid, Path, description = "ID of the lesson to extend")
    ),
    request_body = ProblemBody,
    responses(
        (status = 200, description = "Problem created", body = Problem),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 403, description = "You're not allowed to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "lessons"
)]
pub async fn lessons_add_problem_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Json(payload): Json<ProblemBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if user.user_role() != UserRole::Admin {
        return Err(WebError::resource_forbidden(Problem::get_resource_type()));
    }

    let exists = Lesson::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?
        .is_some();

    if !exists {
        return Err(WebError::resource_not_found(Lesson::get_resource_type()));
    }

    let created = Problem::create(
        state.pool(),
        user,
        crate::model::entity::ProblemCreate {
            lesson_id: id,
            problem_type: payload.problem_type,
            question: payload.question,
            correct_answer: payload.correct_answer,
            explanation: payload.explanation,
            difficulty: payload.difficulty,
            order_index: payload.order_index,
        },
    )
    .await
    .map_err(|e| WebError::resource_fetch_error(Problem::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(created)))
}
