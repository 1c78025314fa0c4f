use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::auth::AdminUser;
use crate::error::{AppError, Result};
use crate::models::{validate_blocks, NewProblem, Problem, ProblemPatch};
use crate::state::AppState;

use super::interactions::SuccessResponse;

#[derive(Debug, Serialize)]
pub struct ProblemResponse {
    pub problem: Problem,
}

#[derive(Debug, Serialize)]
pub struct ProblemListResponse {
    pub problems: Vec<Problem>,
}

pub async fn list(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<ProblemListResponse>> {
    let problems = state.repository.list_problems().await?;
    Ok(Json(ProblemListResponse { problems }))
}

pub async fn create(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(body): Json<NewProblem>,
) -> Result<Json<ProblemResponse>> {
    validate_new_problem(&body)?;

    let id = state
        .repository
        .insert_problem(body, Some(admin.id))
        .await?;
    let problem = state
        .repository
        .get_problem(id)
        .await?
        .ok_or(AppError::NotFound("Problem"))?;

    tracing::info!("Problem {} created", problem.id);
    Ok(Json(ProblemResponse { problem }))
}

pub async fn get(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<ProblemResponse>> {
    let problem = state
        .repository
        .get_problem(id)
        .await?
        .ok_or(AppError::NotFound("Problem"))?;
    Ok(Json(ProblemResponse { problem }))
}

pub async fn update(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<i64>,
    Json(body): Json<NewProblem>,
) -> Result<Json<ProblemResponse>> {
    validate_new_problem(&body)?;

    let problem = state
        .repository
        .update_problem(id, body)
        .await?
        .ok_or(AppError::NotFound("Problem"))?;
    Ok(Json(ProblemResponse { problem }))
}

pub async fn patch(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<i64>,
    Json(body): Json<ProblemPatch>,
) -> Result<Json<ProblemResponse>> {
    if let Some(title) = &body.title {
        if title.trim().is_empty() {
            return Err(AppError::Validation("Title must not be empty".to_string()));
        }
    }
    if let Some(blocks) = &body.question_blocks {
        validate_blocks(blocks)?;
    }
    if let Some(blocks) = &body.answer_blocks {
        validate_blocks(blocks)?;
    }

    let problem = state
        .repository
        .patch_problem(id, body)
        .await?
        .ok_or(AppError::NotFound("Problem"))?;
    Ok(Json(ProblemResponse { problem }))
}

pub async fn remove(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>> {
    let deleted = state.repository.delete_problem(id).await?;
    if !deleted {
        return Err(AppError::NotFound("Problem"));
    }

    tracing::info!("Problem {} deleted", id);
    Ok(Json(SuccessResponse { success: true }))
}

fn validate_new_problem(problem: &NewProblem) -> Result<()> {
    if problem.title.trim().is_empty() {
        return Err(AppError::Validation("Missing required fields".to_string()));
    }
    validate_blocks(&problem.question_blocks)?;
    validate_blocks(&problem.answer_blocks)?;
    Ok(())
}
