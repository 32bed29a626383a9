use axum::Json;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Router, extract::State, middleware, response::IntoResponse};
use uuid::Uuid;

use crate::model::entity::{Problem, ProblemChoice, ProblemChoiceCreate};
use crate::model::{CrudRepository, ResourceTyped};
use crate::web::error::ErrorResponse;
use crate::web::{AppState, RequestContext, UserRole, WebError, WebResult, middlewares};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route(
            "/{id}/choices",
            get(choices_list_handler).post(choices_create_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct ChoiceBody {
    pub choice_text: String,
    pub is_correct: Option<bool>,
}

#[utoipa::path(
    post,
    path = "/api/v1/problems/{problem_id}/choices",
    description = "Attach an answer choice to a multiple-choice problem (admin only)",
    params(
        ("problem_id" = Uuid, Path, description = "ID of the problem to extend")
    ),
    request_body = ChoiceBody,
    responses(
        (status = 200, description = "Choice created", body = ProblemChoice),
        (status = 404, description = "Problem not found", body = ErrorResponse),
        (status = 403, description = "You're not allowed to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "problems"
)]
pub async fn choices_create_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Json(payload): Json<ChoiceBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if user.user_role() != UserRole::Admin {
        return Err(WebError::resource_forbidden(
            ProblemChoice::get_resource_type(),
        ));
    }

    let exists = Problem::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Problem::get_resource_type(), e))?
        .is_some();

    if !exists {
        return Err(WebError::resource_not_found(Problem::get_resource_type()));
    }

    let created = ProblemChoice::create(
        state.pool(),
        user,
        ProblemChoiceCreate {
            problem_id: id,
            choice_text: payload.choice_text,
            is_correct: payload.is_correct,
        },
    )
    .await
    .map_err(|e| WebError::resource_fetch_error(ProblemChoice::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(created)))
}

pub async fn choices_list_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if user.user_role() != UserRole::Admin {
        return Err(WebError::resource_forbidden(
            ProblemChoice::get_resource_type(),
        ));
    }

    let choices = ProblemChoice::all_by_problem(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(ProblemChoice::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(choices)))
}
