use paperclip::actix::Apiv2Schema;
use serde::{Deserialize, Serialize};

pub type UserId = i32;
pub type ItemId = i32;

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct UserDetails {
    pub username: String,
    /// None when the user never picked a preferred category
    pub preferred_category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct Review {
    pub item_id: ItemId,
    pub rating: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Apiv2Schema)]
pub struct Destination {
    pub item_id: ItemId,
    pub place_name: String,
    pub category: String,
    pub city: String,
    pub rating_avg: f64,
    pub description: String,
}

/// Insert payload for destinations, the store assigns the item id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Apiv2Schema)]
pub struct NewDestination {
    pub place_name: String,
    pub category: String,
    pub city: String,
    pub rating_avg: f64,
    pub description: String,
}

impl NewDestination {
    pub fn with_id(self, item_id: ItemId) -> Destination {
        Destination {
            item_id,
            place_name: self.place_name,
            category: self.category,
            city: self.city,
            rating_avg: self.rating_avg,
            description: self.description,
        }
    }
}
