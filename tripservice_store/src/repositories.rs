pub use in_memory_store::InMemoryStore;
pub use postgres_store::{PostgresStore, PostgresStoreConfig};

use crate::api::{Destination, ItemId, Review, UserDetails, UserId};

mod in_memory_store;
mod postgres_store;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Failed to deserialize record: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Database failure {0}")]
    DatabaseFailure(#[from] tokio_postgres::Error),

    #[error("Other error {0}")]
    Other(String),
}

#[async_trait::async_trait]
pub trait UsersRepository: Send + Sync {
    /// Retrieves user details for the given id, None if no such user exists
    async fn get_user(&self, user_id: UserId) -> Result<Option<UserDetails>, StoreError>;
}

#[async_trait::async_trait]
pub trait InteractionsRepository: Send + Sync {
    /// Lists all reviews written by the user, duplicates preserved as stored
    async fn reviews_for_user(&self, user_id: UserId) -> Result<Vec<Review>, StoreError>;
    /// Lists item ids bookmarked by the user
    async fn bookmarks_for_user(&self, user_id: UserId) -> Result<Vec<ItemId>, StoreError>;
    /// Lists item ids liked by the user
    async fn likes_for_user(&self, user_id: UserId) -> Result<Vec<ItemId>, StoreError>;
}

/// Read side of the destinations catalog.
///
/// Result order is storage-determined, callers must not rely on any
/// particular ranking.
#[async_trait::async_trait]
pub trait DestinationsRepository: Send + Sync {
    /// Destinations whose place name is in the given list.
    /// An empty input list yields an empty result, never a full scan.
    /// Names with no matching destination are silently dropped.
    async fn find_by_place_names(
        &self,
        place_names: &[String],
    ) -> Result<Vec<Destination>, StoreError>;

    /// Destinations whose item id is in the given list.
    /// Same empty-input and unknown-key behavior as [`Self::find_by_place_names`].
    async fn find_by_item_ids(&self, item_ids: &[ItemId]) -> Result<Vec<Destination>, StoreError>;
}
