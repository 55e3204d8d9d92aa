//! Dashboard service — owner-scoped item view over the record and object
//! collaborators.
//!
//! DESIGN
//! ======
//! Each owner has an in-memory [`DashboardState`](crate::state::DashboardState)
//! holding the last published, image-resolved item list. Every mutation is
//! followed by a full re-list; there is no optimistic local update and no
//! caching between loads.
//!
//! Image resolution for one load is issued concurrently and joined
//! all-or-nothing: if any signed-URL mint fails, the whole load fails and
//! nothing is published. Loads carry a per-owner monotonic sequence number,
//! and a load result older than the last published one is discarded, so a
//! slow response can never clobber a newer list.
//!
//! ERROR HANDLING
//! ==============
//! Two inconsistencies are accepted rather than repaired: an upload failing
//! after its record was created leaves the record with a dangling image
//! reference, and deleting a record leaves its stored object behind. Every
//! collaborator call is attempted exactly once; errors propagate with no
//! retry.

use futures::future::try_join_all;
use tracing::debug;
use uuid::Uuid;

use crate::services::item::{ItemError, ItemStore as _, NewItem};
use crate::services::media::{MediaError, ObjectStore as _, object_key};
use crate::state::AppState;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error(transparent)]
    Items(#[from] ItemError),
    #[error(transparent)]
    Media(#[from] MediaError),
}

/// An item as published to the view: image reference already resolved to a
/// fetchable signed URL.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ItemView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
}

/// A file attached to item creation.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// Re-list the owner's items, resolving image references concurrently, and
/// publish the result unless a newer load already published.
///
/// Returns the currently published view, which on a discarded stale load is
/// the newer list rather than this load's result.
///
/// # Errors
///
/// Fails wholesale if the list fetch or any single image resolution fails;
/// a partial list is never published.
pub async fn refresh(state: &AppState, owner: Uuid) -> Result<Vec<ItemView>, DashboardError> {
    let seq = {
        let mut dashboards = state.dashboards.write().await;
        let dash = dashboards.entry(owner).or_default();
        dash.next_seq += 1;
        dash.next_seq
    };

    let items = state.items.list(owner).await?;

    let media = &state.media;
    let resolved = try_join_all(items.into_iter().map(|item| async move {
        let image_url = match &item.image {
            Some(filename) => {
                let key = object_key(item.owner_id, filename)?;
                Some(media.signed_url(&key).await?)
            }
            None => None,
        };
        Ok::<_, DashboardError>(ItemView {
            id: item.id,
            title: item.title,
            description: item.description,
            image_url,
        })
    }))
    .await?;

    let mut dashboards = state.dashboards.write().await;
    let dash = dashboards.entry(owner).or_default();
    if seq > dash.published_seq {
        dash.published_seq = seq;
        dash.items = resolved;
        debug!(%owner, seq, count = dash.items.len(), "published item list");
    } else {
        debug!(%owner, seq, published = dash.published_seq, "discarded stale item load");
    }
    Ok(dash.items.clone())
}

/// Create an item, upload its attachment (if any) strictly afterwards, then
/// re-list.
///
/// The stored record's returned `image` field decides whether bytes are
/// uploaded at all. There is no rollback: if the upload fails the record
/// persists with a dangling image reference and the error propagates.
///
/// # Errors
///
/// Propagates record-store, object-store and re-list failures.
pub async fn create(
    state: &AppState,
    owner: Uuid,
    title: String,
    description: String,
    upload: Option<Upload>,
) -> Result<Vec<ItemView>, DashboardError> {
    let image = upload.as_ref().map(|u| u.filename.clone());
    let created = state.items.create(owner, NewItem { title, description, image }).await?;
    debug!(%owner, item = %created.id, has_image = created.image.is_some(), "created item");

    if let (Some(filename), Some(upload)) = (created.image.as_deref(), upload) {
        let key = object_key(owner, filename)?;
        state.media.put(&key, upload.bytes).await?;
    }

    refresh(state, owner).await
}

/// Delete an item by id, then re-list. The associated stored object is
/// deliberately left behind.
///
/// # Errors
///
/// Returns [`ItemError::NotFound`] (wrapped) for ids outside the owner's
/// scope; the owner's item set is left unchanged in that case.
pub async fn remove(state: &AppState, owner: Uuid, id: Uuid) -> Result<Vec<ItemView>, DashboardError> {
    state.items.delete(owner, id).await?;
    debug!(%owner, item = %id, "deleted item");
    refresh(state, owner).await
}

/// Drop the owner's in-memory dashboard state (logout / unmount).
pub async fn reset(state: &AppState, owner: Uuid) {
    state.dashboards.write().await.remove(&owner);
}

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod tests;
