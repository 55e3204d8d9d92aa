//! Item routes — REST wiring of the dashboard operations.
//!
//! Creation takes the dashboard form as multipart (`title`, `description`,
//! optional `image` file). Empty title/description are rejected here at the
//! form boundary; the dashboard service does not re-validate.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use uuid::Uuid;

use crate::routes::auth::AuthUser;
use crate::services::dashboard::{self, DashboardError, ItemView, Upload};
use crate::services::item::ItemError;
use crate::services::media::MediaError;
use crate::state::AppState;

pub(crate) fn dashboard_error_to_status(err: &DashboardError) -> StatusCode {
    match err {
        DashboardError::Items(ItemError::NotFound(_)) => StatusCode::NOT_FOUND,
        DashboardError::Media(MediaError::InvalidFilename(_) | MediaError::InvalidKey(_)) => StatusCode::BAD_REQUEST,
        DashboardError::Items(ItemError::Database(_)) | DashboardError::Media(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// `GET /api/items` — re-list and return the owner's resolved items.
pub async fn list_items(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Vec<ItemView>>, StatusCode> {
    let items = dashboard::refresh(&state, auth.user.id).await.map_err(|e| {
        tracing::error!(error = %e, owner = %auth.user.id, "item list failed");
        dashboard_error_to_status(&e)
    })?;
    Ok(Json(items))
}

/// Parsed creation form.
#[derive(Debug, Default)]
pub(crate) struct CreateForm {
    pub title: String,
    pub description: String,
    pub upload: Option<Upload>,
}

pub(crate) async fn read_create_form(mut multipart: Multipart) -> Result<CreateForm, StatusCode> {
    let mut form = CreateForm::default();
    while let Some(field) = multipart.next_field().await.map_err(|_| StatusCode::BAD_REQUEST)? {
        let name = field.name().map(ToOwned::to_owned);
        match name.as_deref() {
            Some("title") => form.title = field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?,
            Some("description") => form.description = field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?,
            Some("image") => {
                let filename = field.file_name().map(ToOwned::to_owned).unwrap_or_default();
                let bytes = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
                // An empty file input still submits a part with no filename.
                if !filename.is_empty() {
                    form.upload = Some(Upload { filename, bytes: bytes.to_vec() });
                }
            }
            _ => {}
        }
    }

    if form.title.trim().is_empty() || form.description.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(form)
}

/// `POST /api/items` — create an item (multipart form), upload the attached
/// file if any, and return the refreshed list.
pub async fn create_item(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<ItemView>>), StatusCode> {
    let form = read_create_form(multipart).await?;

    let items = dashboard::create(&state, auth.user.id, form.title, form.description, form.upload)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, owner = %auth.user.id, "item create failed");
            dashboard_error_to_status(&e)
        })?;

    Ok((StatusCode::CREATED, Json(items)))
}

/// `DELETE /api/items/{id}` — delete an owned item and return the refreshed
/// list. Foreign ids are rejected by the store with 404.
pub async fn delete_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ItemView>>, StatusCode> {
    let items = dashboard::remove(&state, auth.user.id, id)
        .await
        .map_err(|e| dashboard_error_to_status(&e))?;
    Ok(Json(items))
}

#[cfg(test)]
#[path = "items_test.rs"]
mod tests;
