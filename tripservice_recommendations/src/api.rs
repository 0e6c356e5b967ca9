use paperclip::actix::Apiv2Schema;
use serde::{Deserialize, Serialize};

use tripservice_store::api::Destination;

/// Body of the nearby recommendations request.
/// Both coordinates are optional at the wire level so that missing values can
/// be rejected with the service's own error envelope instead of a bare 400.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Apiv2Schema)]
pub struct NearbyQueryBody {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Apiv2Schema)]
/// Destinations matching the place names recommended for the user's
/// preferred category.
/// Envelope fields are snake_case across all variants (this API has no
/// camelCase consumers to stay compatible with).
pub struct ContentRecommendations {
    pub recommendations: Vec<Destination>,
    pub preferred_category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Apiv2Schema)]
pub struct ContentRecommendationsResponse {
    pub status: String,
    pub message: String,
    pub data: ContentRecommendations,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Apiv2Schema)]
/// Destinations matching the place names recommended around the given
/// coordinates
pub struct NearbyRecommendations {
    pub results: Vec<Destination>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Apiv2Schema)]
pub struct NearbyRecommendationsResponse {
    pub status: String,
    pub message: String,
    pub data: NearbyRecommendations,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Apiv2Schema)]
/// Destinations matching the item ids recommended from the user's reviews,
/// bookmarks and likes
pub struct HybridRecommendations {
    pub recommendations: Vec<Destination>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Apiv2Schema)]
pub struct HybridRecommendationsResponse {
    pub status: String,
    pub message: String,
    pub data: HybridRecommendations,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
/// Envelope returned for every failed request.
/// `message` names the failure kind, `error` carries the raw upstream message.
pub struct ErrorEnvelope {
    pub status: String,
    pub message: String,
    pub error: String,
}
