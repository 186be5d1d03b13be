//! Listing and listing-photo API routes.
//!
//! Every mutating endpoint acts on behalf of the agent named in the
//! `x-agent-id` header. Ownership is enforced by the catalog; a request
//! from the wrong agent fails like any other persistence error.

use std::path::Path as FsPath;

use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use rentpv_common::paths::image_content_type;
use rentpv_common::{AgentId, ListingId, PhotoId};
use rentpv_db::models::{Listing, Photo};
use rentpv_db::queries::listings;
use serde::{Deserialize, Serialize};

use super::{AppContext, AGENT_HEADER};
use crate::photos::{PhotoError, PhotoManager, UploadMetadata};

/// Create listing and photo routes.
pub fn photo_routes() -> Router<AppContext> {
    Router::new()
        .route("/listings/:listing_id", get(get_listing))
        .route(
            "/listings/:listing_id/photos",
            get(list_photos).post(upload_photo),
        )
        .route("/listings/:listing_id/photos/reorder", post(reorder_photos))
        .route(
            "/listings/:listing_id/photos/:photo_id/cover",
            post(make_cover),
        )
        .route("/photos/:photo_id", delete(delete_photo))
}

// ============================================================================
// Request / response types
// ============================================================================

/// Body of the reorder endpoint: put `moved_id` right before `target_id`.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub moved_id: String,
    pub target_id: String,
}

/// A photo as rendered to clients.
#[derive(Debug, Serialize)]
pub struct PhotoView {
    pub id: PhotoId,
    pub listing_id: ListingId,
    pub display_order: i32,
    pub is_cover: bool,
    /// Empty when the photo cannot be resolved; render a placeholder.
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl PhotoView {
    fn new(manager: &PhotoManager, photo: &Photo) -> Self {
        Self {
            id: photo.id,
            listing_id: photo.listing_id,
            display_order: photo.display_order,
            is_cover: photo.is_cover(),
            url: manager.resolve_url(photo),
            created_at: photo.created_at,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Get a listing, including its cover URL.
async fn get_listing(State(ctx): State<AppContext>, Path(listing_id): Path<String>) -> Response {
    let id = match parse_listing_id(&listing_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match load_listing(&ctx, id) {
        Ok(listing) => Json(listing).into_response(),
        Err(resp) => resp,
    }
}

/// List a listing's photos, cover first.
async fn list_photos(State(ctx): State<AppContext>, Path(listing_id): Path<String>) -> Response {
    let id = match parse_listing_id(&listing_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let listing = match load_listing(&ctx, id) {
        Ok(listing) => listing,
        Err(resp) => return resp,
    };

    // Reads are not restricted; act as the owner.
    let manager = ctx.photo_manager(listing.agent_id);
    match manager.photos(id).await {
        Ok(list) => {
            let views: Vec<PhotoView> = list.iter().map(|p| PhotoView::new(&manager, p)).collect();
            Json(views).into_response()
        }
        Err(e) => photo_error_response(&e),
    }
}

/// Upload a photo from the multipart field `file`.
async fn upload_photo(
    State(ctx): State<AppContext>,
    Path(listing_id): Path<String>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let agent_id = match acting_agent(&headers) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let id = match parse_listing_id(&listing_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Err(resp) = load_listing(&ctx, id) {
        return resp;
    }

    let (data, meta) = loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return error_response(StatusCode::BAD_REQUEST, "Missing 'file' field"),
            Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.body_text()),
        };
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field
            .content_type()
            .map(str::to_string)
            .or_else(|| image_content_type(FsPath::new(&file_name)).map(str::to_string))
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let data: Bytes = match field.bytes().await {
            Ok(data) => data,
            Err(e) => return error_response(e.status(), &e.body_text()),
        };

        let meta = UploadMetadata {
            file_name,
            content_type,
            size: data.len() as u64,
        };
        break (data, meta);
    };

    let manager = ctx.photo_manager(agent_id);
    match manager.add(id, data, meta).await {
        Ok(photo) => (StatusCode::CREATED, Json(PhotoView::new(&manager, &photo))).into_response(),
        Err(e) => photo_error_response(&e),
    }
}

/// Delete a photo and close the gap in its listing's order.
async fn delete_photo(
    State(ctx): State<AppContext>,
    Path(photo_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let agent_id = match acting_agent(&headers) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let id = match photo_id.parse::<PhotoId>() {
        Ok(id) => id,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "Invalid photo ID"),
    };

    let manager = ctx.photo_manager(agent_id);
    let photo = match manager.photo(id).await {
        Ok(Some(photo)) => photo,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "Photo not found"),
        Err(e) => return photo_error_response(&e),
    };

    match manager.remove(&photo).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => photo_error_response(&e),
    }
}

/// Move one photo immediately before another.
async fn reorder_photos(
    State(ctx): State<AppContext>,
    Path(listing_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<ReorderRequest>,
) -> Response {
    let agent_id = match acting_agent(&headers) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let id = match parse_listing_id(&listing_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let (Ok(moved), Ok(target)) = (
        request.moved_id.parse::<PhotoId>(),
        request.target_id.parse::<PhotoId>(),
    ) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid photo ID");
    };
    if let Err(resp) = load_listing(&ctx, id) {
        return resp;
    }

    match ctx.photo_manager(agent_id).reorder(id, moved, target).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => photo_error_response(&e),
    }
}

/// Make a photo the listing's cover.
async fn make_cover(
    State(ctx): State<AppContext>,
    Path((listing_id, photo_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let agent_id = match acting_agent(&headers) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let id = match parse_listing_id(&listing_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let photo_id = match photo_id.parse::<PhotoId>() {
        Ok(id) => id,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "Invalid photo ID"),
    };
    if let Err(resp) = load_listing(&ctx, id) {
        return resp;
    }

    match ctx.photo_manager(agent_id).make_cover(id, photo_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => photo_error_response(&e),
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({"error": message}))).into_response()
}

fn photo_error_response(err: &PhotoError) -> Response {
    let status = match err {
        PhotoError::Validation(_) => StatusCode::BAD_REQUEST,
        PhotoError::StorageWrite(_) | PhotoError::StorageDelete(_) => StatusCode::BAD_GATEWAY,
        PhotoError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        PhotoError::PartialReorder { .. } => StatusCode::CONFLICT,
    };
    if status.is_server_error() {
        tracing::warn!(error = %err, "Photo request failed");
    }
    error_response(status, &err.to_string())
}

fn acting_agent(headers: &HeaderMap) -> Result<AgentId, Response> {
    let Some(value) = headers.get(AGENT_HEADER) else {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Missing x-agent-id header",
        ));
    };
    value
        .to_str()
        .ok()
        .and_then(|s| s.trim().parse::<AgentId>().ok())
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "Invalid x-agent-id header"))
}

fn parse_listing_id(raw: &str) -> Result<ListingId, Response> {
    raw.parse::<ListingId>()
        .map_err(|_| error_response(StatusCode::BAD_REQUEST, "Invalid listing ID"))
}

fn load_listing(ctx: &AppContext, id: ListingId) -> Result<Listing, Response> {
    let conn = ctx
        .db_pool
        .get()
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()))?;
    match listings::get_listing(&conn, id) {
        Ok(Some(listing)) => Ok(listing),
        Ok(None) => Err(error_response(StatusCode::NOT_FOUND, "Listing not found")),
        Err(e) => Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &e.to_string(),
        )),
    }
}
