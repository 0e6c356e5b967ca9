use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI32, Ordering};

use crate::api::{Destination, ItemId, NewDestination, Review, UserDetails, UserId};
use crate::repositories::{
    DestinationsRepository, InteractionsRepository, StoreError, UsersRepository,
};

/// In-memory store backing all three repository traits.
/// Destinations live in a BTreeMap so results come back in item id order.
#[derive(Default)]
pub struct InMemoryStore {
    user_sequence_generator: AtomicI32,
    destination_sequence_generator: AtomicI32,
    users: parking_lot::RwLock<HashMap<UserId, UserDetails>>,
    reviews: parking_lot::RwLock<Vec<(UserId, Review)>>,
    bookmarks: parking_lot::RwLock<Vec<(UserId, ItemId)>>,
    likes: parking_lot::RwLock<Vec<(UserId, ItemId)>>,
    destinations: parking_lot::RwLock<BTreeMap<ItemId, Destination>>,
}

impl InMemoryStore {
    pub fn add_user(&self, details: UserDetails) -> UserId {
        let id = self.user_sequence_generator.fetch_add(1, Ordering::Relaxed);
        self.users.write().insert(id, details);
        id
    }

    pub fn add_destination(&self, details: NewDestination) -> ItemId {
        let id = self
            .destination_sequence_generator
            .fetch_add(1, Ordering::Relaxed);
        self.destinations.write().insert(id, details.with_id(id));
        id
    }

    pub fn add_review(&self, user_id: UserId, item_id: ItemId, rating: i32) {
        self.reviews.write().push((user_id, Review { item_id, rating }));
    }

    pub fn add_bookmark(&self, user_id: UserId, item_id: ItemId) {
        self.bookmarks.write().push((user_id, item_id));
    }

    pub fn add_like(&self, user_id: UserId, item_id: ItemId) {
        self.likes.write().push((user_id, item_id));
    }
}

#[async_trait::async_trait]
impl UsersRepository for InMemoryStore {
    async fn get_user(&self, user_id: UserId) -> Result<Option<UserDetails>, StoreError> {
        Ok(self.users.read().get(&user_id).cloned())
    }
}

#[async_trait::async_trait]
impl InteractionsRepository for InMemoryStore {
    async fn reviews_for_user(&self, user_id: UserId) -> Result<Vec<Review>, StoreError> {
        Ok(self
            .reviews
            .read()
            .iter()
            .filter(|(uid, _)| *uid == user_id)
            .map(|(_, review)| review.clone())
            .collect())
    }

    async fn bookmarks_for_user(&self, user_id: UserId) -> Result<Vec<ItemId>, StoreError> {
        Ok(self
            .bookmarks
            .read()
            .iter()
            .filter(|(uid, _)| *uid == user_id)
            .map(|(_, item_id)| *item_id)
            .collect())
    }

    async fn likes_for_user(&self, user_id: UserId) -> Result<Vec<ItemId>, StoreError> {
        Ok(self
            .likes
            .read()
            .iter()
            .filter(|(uid, _)| *uid == user_id)
            .map(|(_, item_id)| *item_id)
            .collect())
    }
}

#[async_trait::async_trait]
impl DestinationsRepository for InMemoryStore {
    async fn find_by_place_names(
        &self,
        place_names: &[String],
    ) -> Result<Vec<Destination>, StoreError> {
        if place_names.is_empty() {
            return Ok(vec![]);
        }
        Ok(self
            .destinations
            .read()
            .values()
            .filter(|destination| place_names.contains(&destination.place_name))
            .cloned()
            .collect())
    }

    async fn find_by_item_ids(&self, item_ids: &[ItemId]) -> Result<Vec<Destination>, StoreError> {
        if item_ids.is_empty() {
            return Ok(vec![]);
        }
        Ok(self
            .destinations
            .read()
            .values()
            .filter(|destination| item_ids.contains(&destination.item_id))
            .cloned()
            .collect())
    }
}
