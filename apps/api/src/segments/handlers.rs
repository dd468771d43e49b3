//! Axum route handlers for the Segments API.

use axum::{extract::State, http::StatusCode, Json};

use crate::auth::AuthContext;
use crate::errors::AppError;
use crate::models::segment::SegmentRow;
use crate::routes::extract::JsonBody;
use crate::segments::generator::{generate_segment, GenerateSegmentRequest, GeneratedSegment};
use crate::segments::service::{
    create_segment, delete_segment, update_segment, CreateSegmentRequest, DeleteSegmentRequest,
    DeleteSegmentResponse, UpdateSegmentRequest,
};
use crate::state::AppState;

/// POST /api/v1/segments-ai
///
/// Proposes a segment name and filters from a free-text description.
pub async fn handle_segments_ai(
    State(state): State<AppState>,
    auth: AuthContext,
    JsonBody(request): JsonBody<GenerateSegmentRequest>,
) -> Result<Json<GeneratedSegment>, AppError> {
    let scope = auth.tenant()?;
    let generated = generate_segment(
        state.store.as_ref(),
        state.llm.as_ref(),
        &scope,
        &request,
    )
    .await?;
    Ok(Json(generated))
}

/// POST /api/v1/segments-create
pub async fn handle_segments_create(
    State(state): State<AppState>,
    auth: AuthContext,
    JsonBody(request): JsonBody<CreateSegmentRequest>,
) -> Result<(StatusCode, Json<SegmentRow>), AppError> {
    let scope = auth.tenant()?;
    let segment = create_segment(&state.store, &state.processor, &scope, request).await?;
    Ok((StatusCode::CREATED, Json(segment)))
}

/// POST /api/v1/segments-update
pub async fn handle_segments_update(
    State(state): State<AppState>,
    auth: AuthContext,
    JsonBody(request): JsonBody<UpdateSegmentRequest>,
) -> Result<Json<SegmentRow>, AppError> {
    let scope = auth.tenant()?;
    let segment = update_segment(&state.store, &state.processor, &scope, request).await?;
    Ok(Json(segment))
}

/// POST /api/v1/segments-delete
pub async fn handle_segments_delete(
    State(state): State<AppState>,
    auth: AuthContext,
    JsonBody(request): JsonBody<DeleteSegmentRequest>,
) -> Result<Json<DeleteSegmentResponse>, AppError> {
    let scope = auth.tenant()?;
    let response = delete_segment(state.store.as_ref(), &scope, request).await?;
    Ok(Json(response))
}
