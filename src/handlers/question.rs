// src/handlers/question.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    composite,
    error::AppError,
    models::question::QuestionPayload,
    store::postgres::PgStore,
};

/// Creates a question together with its nested child collections.
///
/// * Validates payload bounds, then runs the composite save.
/// * All writes happen inside one transaction; a failure in any step rolls
///   back the whole operation (the uncommitted transaction is dropped).
pub async fn create_question(
    State(pool): State<PgPool>,
    Json(mut payload): Json<QuestionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    payload.id = None;

    let mut tx = pool.begin().await?;
    let id = {
        let mut store = PgStore::new(&mut tx);
        composite::save_composite(&mut store, &payload, None).await?
    };
    tx.commit().await.map_err(|e| {
        tracing::error!("Failed to commit composite save: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Updates a question and reconciles its child collections against the
/// submitted state. The path id wins over any id in the body.
pub async fn update_question(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<QuestionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    payload.id = Some(id);

    let mut tx = pool.begin().await?;
    {
        let mut store = PgStore::new(&mut tx);
        composite::save_composite(&mut store, &payload, None).await?;
    }
    tx.commit().await.map_err(|e| {
        tracing::error!("Failed to commit composite save: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(serde_json::json!({ "id": id })))
}

/// Reads a question back with its full child graph.
pub async fn get_question(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = pool.begin().await?;
    let graph = {
        let mut store = PgStore::new(&mut tx);
        composite::load_composite(&mut store, id).await?
    };

    let graph = graph.ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;
    Ok(Json(graph))
}

/// Archives a question. Questions are soft-deleted so existing sessions and
/// provenance links stay intact.
pub async fn archive_question(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query(
        "UPDATE questions SET is_archived = TRUE, modified_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to archive question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
