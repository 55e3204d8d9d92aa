//! Item store — the data collaborator behind the dashboard.
//!
//! DESIGN
//! ======
//! [`ItemStore`] is the injectable seam over the record store: list, create
//! and delete, all scoped to an owner. Ids are assigned by the store, items
//! are never updated in place, and a delete for an id outside the caller's
//! scope is rejected here rather than by dashboard logic.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    #[error("item not found: {0}")]
    NotFound(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A persisted bucket-list item. `image`, when present, is the original
/// filename of the attached object under the owner's media namespace.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
}

/// Fields for item creation. The id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub title: String,
    pub description: String,
    pub image: Option<String>,
}

// =============================================================================
// STORE SEAM
// =============================================================================

/// Owner-scoped record store for items.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// List all items belonging to `owner` in the store's default order.
    async fn list(&self, owner: Uuid) -> Result<Vec<Item>, ItemError>;

    /// Create an item for `owner`, returning the stored row with its id.
    async fn create(&self, owner: Uuid, new: NewItem) -> Result<Item, ItemError>;

    /// Delete `id` if it belongs to `owner`; foreign ids are rejected with
    /// [`ItemError::NotFound`].
    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<(), ItemError>;
}

// =============================================================================
// POSTGRES IMPLEMENTATION
// =============================================================================

/// Postgres-backed [`ItemStore`]. Default order is insertion order.
#[derive(Clone)]
pub struct PgItemStore {
    pool: PgPool,
}

impl PgItemStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemStore for PgItemStore {
    async fn list(&self, owner: Uuid) -> Result<Vec<Item>, ItemError> {
        let rows = sqlx::query_as::<_, (Uuid, Uuid, String, String, Option<String>)>(
            "SELECT id, owner_id, title, description, image
             FROM items
             WHERE owner_id = $1
             ORDER BY created_at ASC, id ASC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, owner_id, title, description, image)| Item { id, owner_id, title, description, image })
            .collect())
    }

    async fn create(&self, owner: Uuid, new: NewItem) -> Result<Item, ItemError> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO items (id, owner_id, title, description, image) VALUES ($1, $2, $3, $4, $5)")
            .bind(id)
            .bind(owner)
            .bind(&new.title)
            .bind(&new.description)
            .bind(&new.image)
            .execute(&self.pool)
            .await?;

        Ok(Item { id, owner_id: owner, title: new.title, description: new.description, image: new.image })
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<(), ItemError> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ItemError::NotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "item_test.rs"]
mod tests;
