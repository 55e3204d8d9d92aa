//! Media serving — the local object store's fetch surface.
//!
//! Signed URLs minted by the store point here. The signature covers the full
//! object key and the expiry timestamp; a bad or expired signature is
//! rejected before touching the filesystem, so unsigned enumeration of
//! another owner's namespace is not possible.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use uuid::Uuid;

use crate::services::media::{MediaError, ObjectStore as _, content_type_for, object_key};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SignedQuery {
    pub expires: i64,
    pub sig: String,
}

/// `GET /media/{owner}/{filename}` — verify the signature and serve bytes.
pub async fn serve_media(
    State(state): State<AppState>,
    Path((owner, filename)): Path<(Uuid, String)>,
    Query(query): Query<SignedQuery>,
) -> Result<Response, StatusCode> {
    let key = object_key(owner, &filename).map_err(|_| StatusCode::BAD_REQUEST)?;

    if !state.media.verify(&key, query.expires, &query.sig) {
        return Err(StatusCode::FORBIDDEN);
    }

    let bytes = state.media.get(&key).await.map_err(|e| match e {
        MediaError::NotFound(_) => StatusCode::NOT_FOUND,
        MediaError::InvalidFilename(_) | MediaError::InvalidKey(_) => StatusCode::BAD_REQUEST,
        MediaError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    })?;

    Ok(([(CONTENT_TYPE, content_type_for(&filename))], bytes).into_response())
}

#[cfg(test)]
#[path = "media_test.rs"]
mod tests;
