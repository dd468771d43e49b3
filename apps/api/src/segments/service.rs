//! Segment create / update / soft delete.
//!
//! Name uniqueness is checked case-insensitively among the tenant's live
//! segments before writing; a unique-index violation on the write itself is
//! reported the same way. Notifications and processing triggers are detached
//! and never fail the request.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::auth::TenantScope;
use crate::errors::AppError;
use crate::models::notification::{NewNotification, NotificationKind};
use crate::models::segment::SegmentRow;
use crate::notifications;
use crate::segments::filters::SegmentFilters;
use crate::segments::processing::{spawn_processing, ProcessTrigger};
use crate::store::{is_unique_violation, NewSegment, SegmentChanges, Store};
use crate::validation::{bounded_text, parse_uuid};

pub const MIN_NAME_LEN: usize = 3;
pub const MAX_NAME_LEN: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSegmentRequest {
    pub name: String,
    pub filters: SegmentFilters,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSegmentRequest {
    pub segment_id: String,
    pub name: String,
    pub filters: SegmentFilters,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteSegmentRequest {
    pub segment_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteSegmentResponse {
    pub deleted: bool,
    pub segment_id: Uuid,
}

fn duplicate_name(name: &str) -> AppError {
    AppError::Conflict(format!("A segment named \"{name}\" already exists"))
}

fn segment_not_found(segment_id: Uuid) -> AppError {
    AppError::NotFound(format!("Segment {segment_id} not found"))
}

fn map_write_error(err: sqlx::Error, name: &str) -> AppError {
    if is_unique_violation(&err) {
        duplicate_name(name)
    } else {
        AppError::Database(err)
    }
}

#[derive(Debug, Clone, Copy)]
enum SegmentEvent {
    Created,
    Updated,
}

impl SegmentEvent {
    fn kind(self) -> NotificationKind {
        match self {
            SegmentEvent::Created => NotificationKind::SegmentCreated,
            SegmentEvent::Updated => NotificationKind::SegmentUpdated,
        }
    }

    fn title(self) -> &'static str {
        match self {
            SegmentEvent::Created => "Segment created",
            SegmentEvent::Updated => "Segment updated",
        }
    }

    fn verb(self) -> &'static str {
        match self {
            SegmentEvent::Created => "was created",
            SegmentEvent::Updated => "was updated",
        }
    }
}

fn notify(store: &Arc<dyn Store>, scope: &TenantScope, event: SegmentEvent, segment: &SegmentRow) {
    notifications::dispatch(
        store.clone(),
        NewNotification {
            customer_id: scope.customer_id,
            user_id: Some(scope.user_id),
            kind: event.kind(),
            title: event.title().to_string(),
            message: format!("Segment \"{}\" {}", segment.name, event.verb()),
            data: json!({ "segment_id": segment.id, "status": segment.status }),
        },
    );
}

pub async fn create_segment(
    store: &Arc<dyn Store>,
    processor: &Arc<dyn ProcessTrigger>,
    scope: &TenantScope,
    request: CreateSegmentRequest,
) -> Result<SegmentRow, AppError> {
    let name = bounded_text("name", &request.name, MIN_NAME_LEN, MAX_NAME_LEN)?;
    request.filters.validate()?;

    if store.segment_name_taken(scope, &name, None).await? {
        return Err(duplicate_name(&name));
    }

    let segment = store
        .insert_segment(
            scope,
            NewSegment {
                name: name.clone(),
                filters: request.filters.to_value(),
            },
        )
        .await
        .map_err(|e| map_write_error(e, &name))?;

    info!(
        "Created segment {} for customer {}",
        segment.id, scope.customer_id
    );

    notify(store, scope, SegmentEvent::Created, &segment);
    spawn_processing(processor.clone(), segment.id, scope.customer_id);

    Ok(segment)
}

pub async fn update_segment(
    store: &Arc<dyn Store>,
    processor: &Arc<dyn ProcessTrigger>,
    scope: &TenantScope,
    request: UpdateSegmentRequest,
) -> Result<SegmentRow, AppError> {
    let segment_id = parse_uuid("segment_id", &request.segment_id)?;
    let name = bounded_text("name", &request.name, MIN_NAME_LEN, MAX_NAME_LEN)?;
    request.filters.validate()?;

    let existing = store
        .find_segment(scope, segment_id)
        .await?
        .ok_or_else(|| segment_not_found(segment_id))?;

    if store
        .segment_name_taken(scope, &name, Some(segment_id))
        .await?
    {
        return Err(duplicate_name(&name));
    }

    let filters = request.filters.to_value();
    let filters_changed = filters != existing.filters;

    // Members go first: if the purge fails the row still holds the old
    // filters, so a retry sees the change again.
    if filters_changed {
        let removed = store.delete_segment_members(segment_id).await?;
        info!("Filters changed for segment {segment_id}; removed {removed} member rows");
    }

    let segment = store
        .update_segment(
            scope,
            segment_id,
            SegmentChanges {
                name: name.clone(),
                filters,
                reset_status: filters_changed,
            },
        )
        .await
        .map_err(|e| map_write_error(e, &name))?
        .ok_or_else(|| segment_not_found(segment_id))?;

    notify(store, scope, SegmentEvent::Updated, &segment);
    if filters_changed {
        spawn_processing(processor.clone(), segment_id, scope.customer_id);
    }

    Ok(segment)
}

pub async fn delete_segment(
    store: &dyn Store,
    scope: &TenantScope,
    request: DeleteSegmentRequest,
) -> Result<DeleteSegmentResponse, AppError> {
    let segment_id = parse_uuid("segment_id", &request.segment_id)?;
    if !store.soft_delete_segment(scope, segment_id).await? {
        return Err(segment_not_found(segment_id));
    }
    info!(
        "Soft-deleted segment {segment_id} for customer {}",
        scope.customer_id
    );
    Ok(DeleteSegmentResponse {
        deleted: true,
        segment_id,
    })
}
