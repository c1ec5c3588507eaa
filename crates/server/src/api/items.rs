//! Item API handlers.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use cliprelay_core::{
    item::{ItemFilter, ItemState, WorkItem},
    pipeline::{PipelineError, SubmitRequest},
};

use crate::state::AppState;

/// Maximum allowed limit for item queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for item queries
const DEFAULT_LIMIT: i64 = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing items
#[derive(Debug, Deserialize)]
pub struct ListItemsParams {
    /// Filter by state
    pub state: Option<String>,
    /// Filter by owner
    pub owner: Option<String>,
    /// Maximum number of items to return
    pub limit: Option<i64>,
    /// Pagination offset
    pub offset: Option<i64>,
}

/// Response for item operations
#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: String,
    pub original_name: String,
    pub title: String,
    pub description: String,
    pub state: ItemState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staging_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub owner: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<WorkItem> for ItemResponse {
    fn from(item: WorkItem) -> Self {
        Self {
            id: item.id,
            original_name: item.original_name,
            title: item.title,
            description: item.description,
            state: item.state,
            staging_ref: item.staging_ref,
            published_url: item.published_url,
            error: item.error,
            owner: item.owner,
            created_at: item.created_at.to_rfc3339(),
            updated_at: item.updated_at.to_rfc3339(),
        }
    }
}

/// Response for an accepted submission
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub item: ItemResponse,
    /// Edit queue depth including this item.
    pub pending_edits: usize,
}

/// Response for listing items
#[derive(Debug, Serialize)]
pub struct ListItemsResponse {
    pub items: Vec<ItemResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ItemErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ItemErrorResponse>) {
    (
        status,
        Json(ItemErrorResponse {
            error: message.into(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Submit a new item (multipart upload)
pub async fn submit_item(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitResponse>), (StatusCode, Json<ItemErrorResponse>)> {
    let mut file: Option<(String, bytes::Bytes)> = None;
    let mut owner = "anonymous".to_string();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error_response(StatusCode::BAD_REQUEST, format!("Invalid multipart body: {}", e))
    })? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                let name = field
                    .file_name()
                    .unwrap_or("clip.mp4")
                    .to_string();
                let data = field.bytes().await.map_err(|e| {
                    error_response(
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read file field: {}", e),
                    )
                })?;
                file = Some((name, data));
            }
            Some("owner") => {
                let value = field.text().await.map_err(|e| {
                    error_response(
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read owner field: {}", e),
                    )
                })?;
                if !value.trim().is_empty() {
                    owner = value;
                }
            }
            _ => {}
        }
    }

    let Some((original_name, data)) = file else {
        return Err(error_response(StatusCode::BAD_REQUEST, "No file supplied"));
    };

    match state
        .orchestrator()
        .submit(SubmitRequest {
            original_name,
            owner,
            data,
        })
        .await
    {
        Ok(outcome) => Ok((
            StatusCode::ACCEPTED,
            Json(SubmitResponse {
                item: ItemResponse::from(outcome.item),
                pending_edits: outcome.pending_edits,
            }),
        )),
        Err(PipelineError::InvalidSubmission(msg)) => {
            Err(error_response(StatusCode::BAD_REQUEST, msg))
        }
        Err(e) => Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            e.to_string(),
        )),
    }
}

/// Get an item by ID
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ItemResponse>, impl IntoResponse> {
    match state.store().get(&id) {
        Ok(Some(item)) => Ok(Json(ItemResponse::from(item))),
        Ok(None) => Err(error_response(
            StatusCode::NOT_FOUND,
            format!("Item not found: {}", id),
        )),
        Err(e) => Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            e.to_string(),
        )),
    }
}

/// List items, ordered by creation time ascending
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListItemsParams>,
) -> Result<Json<ListItemsResponse>, impl IntoResponse> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut filter = ItemFilter::new().with_limit(limit).with_offset(offset);

    if let Some(ref state_filter) = params.state {
        match ItemState::parse(state_filter) {
            Some(item_state) => filter = filter.with_state(item_state),
            None => {
                return Err(error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Unknown state: {}", state_filter),
                ));
            }
        }
    }

    if let Some(ref owner) = params.owner {
        filter = filter.with_owner(owner.clone());
    }

    let items = match state.store().list(&filter) {
        Ok(items) => items,
        Err(e) => {
            return Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                e.to_string(),
            ));
        }
    };

    // Total count (without pagination)
    let count_filter = ItemFilter {
        limit: i64::MAX,
        offset: 0,
        ..filter
    };

    let total = match state.store().count(&count_filter) {
        Ok(count) => count,
        Err(e) => {
            return Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                e.to_string(),
            ));
        }
    };

    Ok(Json(ListItemsResponse {
        items: items.into_iter().map(ItemResponse::from).collect(),
        total,
        limit,
        offset,
    }))
}
