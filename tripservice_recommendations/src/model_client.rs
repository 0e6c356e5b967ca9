use std::time::Duration;

use anyhow::Context;
use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use serde::{Deserialize, Serialize};

use tripservice_store::api::{ItemId, UserId};

#[derive(thiserror::Error, Debug)]
pub enum ModelServiceError {
    #[error("Model service request failed: {0}")]
    Transport(#[from] reqwest_middleware::Error),

    #[error("Model service returned {status}: {message}")]
    BadStatus { status: StatusCode, message: String },

    #[error("Failed to decode model service response: {0}")]
    BadBody(#[from] reqwest::Error),
}

/// Request payload for the collaborative endpoint, assembled from the user's
/// stored interactions. Empty vectors are a valid payload.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct CollaborativeQuery {
    pub user_id: UserId,
    pub review_data: Vec<ReviewData>,
    pub bookmarks: Vec<ItemId>,
    pub likes: Vec<ItemId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct ReviewData {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub rating: i32,
}

/// One entry of the nearby response, extra fields from the model are ignored
#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
pub struct NearbyPlace {
    pub place_name: String,
}

#[derive(Serialize)]
struct CategoryQuery<'a> {
    category: Option<&'a str>,
}

#[derive(Serialize)]
struct NearbyQuery {
    user_lat: f64,
    user_long: f64,
}

// Wire field names are fixed by the external model service contract.
#[derive(Deserialize)]
struct CategoryRecommendations {
    #[serde(rename = "reccomContent")]
    place_names: Vec<String>,
}

#[derive(Deserialize)]
struct NearbyRecommendations {
    nearby_places: Vec<NearbyPlace>,
}

#[derive(Deserialize)]
struct CollaborativeRecommendations {
    collaborative_recommendations: Vec<ItemId>,
}

/// Outbound interface to the recommendation model service.
/// A trait so that orchestrators can be exercised against stubs.
#[async_trait::async_trait]
pub trait ModelService: Send + Sync {
    /// Place names recommended for a category, None means no preference set
    async fn recommend_by_category(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<String>, ModelServiceError>;

    /// Places recommended around the given coordinates
    async fn recommend_by_location(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<NearbyPlace>, ModelServiceError>;

    /// Item ids recommended from the user's interaction history
    async fn recommend_collaborative(
        &self,
        query: &CollaborativeQuery,
    ) -> Result<Vec<ItemId>, ModelServiceError>;
}

pub struct ModelServiceClient {
    url: String,
    client: ClientWithMiddleware,
}

impl ModelServiceClient {
    /// Single attempt per call, the timeout applies to the whole round-trip
    pub fn new(url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let reqwest_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build reqwest client")?;
        let client = ClientBuilder::new(reqwest_client)
            // Insert the tracing middleware
            .with(TracingMiddleware::default())
            .build();

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ModelServiceError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        let status = response.status();
        let message = response.text().await.unwrap_or_default();
        Err(ModelServiceError::BadStatus { status, message })
    }
}

#[async_trait::async_trait]
impl ModelService for ModelServiceClient {
    /// Calls POST {url}/recommendations/category
    async fn recommend_by_category(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<String>, ModelServiceError> {
        let response = self
            .client
            .post(format!("{}/recommendations/category", self.url))
            .json(&CategoryQuery { category })
            .send()
            .await?;

        let response = ensure_success(response).await?;
        let body: CategoryRecommendations = response.json().await?;
        Ok(body.place_names)
    }

    /// Calls POST {url}/recommendations/nearby
    async fn recommend_by_location(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<NearbyPlace>, ModelServiceError> {
        let response = self
            .client
            .post(format!("{}/recommendations/nearby", self.url))
            .json(&NearbyQuery {
                user_lat: latitude,
                user_long: longitude,
            })
            .send()
            .await?;

        let response = ensure_success(response).await?;
        let body: NearbyRecommendations = response.json().await?;
        Ok(body.nearby_places)
    }

    /// Calls POST {url}/recommendations/collaborative
    async fn recommend_collaborative(
        &self,
        query: &CollaborativeQuery,
    ) -> Result<Vec<ItemId>, ModelServiceError> {
        let response = self
            .client
            .post(format!("{}/recommendations/collaborative", self.url))
            .json(query)
            .send()
            .await?;

        let response = ensure_success(response).await?;
        let body: CollaborativeRecommendations = response.json().await?;
        Ok(body.collaborative_recommendations)
    }
}
