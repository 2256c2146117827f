// src/handlers/question_set.rs

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
    models::question_set::{CreateQuestionSetRequest, QuestionSetRow, ReorderRequest, SetPrivacy},
    store::postgres::PgStore,
};

/// Creates a question set.
pub async fn create_set(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateQuestionSetRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let id = Uuid::new_v4();
    let privacy = payload.privacy.unwrap_or(SetPrivacy::Private);

    sqlx::query(
        r#"
        INSERT INTO question_sets (id, title, description, privacy, author, license, is_archived)
        VALUES ($1, $2, $3, $4, $5, $6, FALSE)
        "#,
    )
    .bind(id)
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(privacy.as_str())
    .bind(payload.author)
    .bind(&payload.license)
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question set: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Reads a question set and the ids of its questions in their persisted order.
pub async fn get_set(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let set = sqlx::query_as::<_, QuestionSetRow>(
        r#"
        SELECT id, title, description, privacy, author, license, is_archived,
               solo_session_id, created_at
        FROM question_sets
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Question set not found".to_string()))?;

    let questions: Vec<Uuid> = sqlx::query_scalar(
        "SELECT id FROM questions WHERE question_set = $1 AND is_archived = FALSE
         ORDER BY position ASC",
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(serde_json::json!({
        "set": set,
        "questions": questions,
    })))
}

/// Persists a new ordering of the set's questions.
///
/// Membership checking, the position writes, and the solo session
/// invalidation all run inside one transaction.
pub async fn reorder_set(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReorderRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = pool.begin().await?;
    {
        let mut store = PgStore::new(&mut tx);
        composite::reorder_set(&mut store, id, &payload.questions).await?;
    }
    tx.commit().await.map_err(|e| {
        tracing::error!("Failed to commit reorder: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(serde_json::json!({
        "reordered": payload.questions.len()
    })))
}
