use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::web::Data;
use actix_web::{Error, HttpResponse};
use itertools::Itertools;
use paperclip::actix::{api_v2_operation, web::Json};

use tripservice_store::api::{Destination, UserId};
use tripservice_store::repositories::{
    DestinationsRepository, InteractionsRepository, StoreError, UsersRepository,
};

use crate::api::{
    ContentRecommendations, ContentRecommendationsResponse, ErrorEnvelope, HybridRecommendations,
    HybridRecommendationsResponse, NearbyQueryBody, NearbyRecommendations,
    NearbyRecommendationsResponse,
};
use crate::auth::AuthenticatedUser;
use crate::model_client::{CollaborativeQuery, ModelService, ModelServiceError, ReviewData};

#[derive(thiserror::Error, Debug)]
pub enum RecommendationError {
    #[error("No user record for id {0}")]
    NotAuthenticated(UserId),

    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error(transparent)]
    Recommender(#[from] ModelServiceError),
}

impl RecommendationError {
    fn status_code(&self) -> StatusCode {
        match self {
            RecommendationError::NotAuthenticated(_) => StatusCode::NOT_FOUND,
            RecommendationError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RecommendationError::Storage(_) | RecommendationError::Recommender(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn message(&self) -> &'static str {
        match self {
            RecommendationError::NotAuthenticated(_) => "You are not logged in",
            RecommendationError::InvalidInput(_) => "Invalid request parameters",
            RecommendationError::Storage(_) => "A server error occurred",
            RecommendationError::Recommender(_) => "Recommendation service is unavailable",
        }
    }

    fn to_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorEnvelope {
            status: "error".to_string(),
            message: self.message().to_string(),
            error: self.to_string(),
        })
    }
}

#[api_v2_operation]
pub async fn health() -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().finish())
}

async fn content_recommendations(
    user_id: UserId,
    users_repository: &Arc<dyn UsersRepository>,
    destinations_repository: &Arc<dyn DestinationsRepository>,
    model_service: &Arc<dyn ModelService>,
) -> Result<ContentRecommendations, RecommendationError> {
    let user = users_repository
        .get_user(user_id)
        .await?
        .ok_or(RecommendationError::NotAuthenticated(user_id))?;

    let place_names = model_service
        .recommend_by_category(user.preferred_category.as_deref())
        .await?;
    tracing::info!("Recommended places for user {}: {:?}", user_id, place_names);

    let recommendations = destinations_repository
        .find_by_place_names(&place_names)
        .await?;

    Ok(ContentRecommendations {
        recommendations,
        preferred_category: user.preferred_category,
    })
}

async fn nearby_recommendations(
    body: &NearbyQueryBody,
    destinations_repository: &Arc<dyn DestinationsRepository>,
    model_service: &Arc<dyn ModelService>,
) -> Result<Vec<Destination>, RecommendationError> {
    let (latitude, longitude) = match (body.latitude, body.longitude) {
        (Some(latitude), Some(longitude)) if latitude.is_finite() && longitude.is_finite() => {
            (latitude, longitude)
        }
        _ => {
            return Err(RecommendationError::InvalidInput(
                "latitude and longitude are required".to_string(),
            ))
        }
    };

    let places = model_service
        .recommend_by_location(latitude, longitude)
        .await?;
    let place_names: Vec<String> = places
        .into_iter()
        .map(|place| place.place_name)
        .unique()
        .collect();

    Ok(destinations_repository
        .find_by_place_names(&place_names)
        .await?)
}

async fn hybrid_recommendations(
    user_id: UserId,
    interactions_repository: &Arc<dyn InteractionsRepository>,
    destinations_repository: &Arc<dyn DestinationsRepository>,
    model_service: &Arc<dyn ModelService>,
) -> Result<Vec<Destination>, RecommendationError> {
    // Independent reads, order between them is not observable
    let (reviews, bookmarks, likes) = futures_util::try_join!(
        interactions_repository.reviews_for_user(user_id),
        interactions_repository.bookmarks_for_user(user_id),
        interactions_repository.likes_for_user(user_id),
    )?;

    // Empty arrays are a valid payload for users with no activity yet
    let query = CollaborativeQuery {
        user_id,
        review_data: reviews
            .into_iter()
            .map(|review| ReviewData {
                user_id,
                item_id: review.item_id,
                rating: review.rating,
            })
            .collect(),
        bookmarks,
        likes,
    };

    let item_ids = model_service.recommend_collaborative(&query).await?;
    tracing::info!("Recommended items for user {}: {:?}", user_id, item_ids);

    Ok(destinations_repository.find_by_item_ids(&item_ids).await?)
}

#[api_v2_operation]
pub async fn recommend_by_content(
    user: AuthenticatedUser,
    users_repository: Data<Arc<dyn UsersRepository>>,
    destinations_repository: Data<Arc<dyn DestinationsRepository>>,
    model_service: Data<Arc<dyn ModelService>>,
) -> Result<HttpResponse, Error> {
    Ok(
        match content_recommendations(
            user.user_id,
            users_repository.get_ref(),
            destinations_repository.get_ref(),
            model_service.get_ref(),
        )
        .await
        {
            Ok(data) => HttpResponse::Ok().json(ContentRecommendationsResponse {
                status: "success".to_string(),
                message: "Recommendations fetched successfully".to_string(),
                data,
            }),
            Err(err) => {
                tracing::error!("Content recommendations failed {}", err);
                err.to_response()
            }
        },
    )
}

#[api_v2_operation]
pub async fn recommend_by_nearby(
    body: Json<NearbyQueryBody>,
    destinations_repository: Data<Arc<dyn DestinationsRepository>>,
    model_service: Data<Arc<dyn ModelService>>,
) -> Result<HttpResponse, Error> {
    Ok(
        match nearby_recommendations(
            &body,
            destinations_repository.get_ref(),
            model_service.get_ref(),
        )
        .await
        {
            Ok(results) => HttpResponse::Ok().json(NearbyRecommendationsResponse {
                status: "success".to_string(),
                message: "Recommendations for you based on your location".to_string(),
                data: NearbyRecommendations { results },
            }),
            Err(err) => {
                tracing::error!("Nearby recommendations failed {}", err);
                err.to_response()
            }
        },
    )
}

#[api_v2_operation]
pub async fn recommend_by_hybrid(
    user: AuthenticatedUser,
    interactions_repository: Data<Arc<dyn InteractionsRepository>>,
    destinations_repository: Data<Arc<dyn DestinationsRepository>>,
    model_service: Data<Arc<dyn ModelService>>,
) -> Result<HttpResponse, Error> {
    Ok(
        match hybrid_recommendations(
            user.user_id,
            interactions_repository.get_ref(),
            destinations_repository.get_ref(),
            model_service.get_ref(),
        )
        .await
        {
            Ok(recommendations) => HttpResponse::Ok().json(HybridRecommendationsResponse {
                status: "success".to_string(),
                message: "Recommendations for you based on your activity".to_string(),
                data: HybridRecommendations { recommendations },
            }),
            Err(err) => {
                tracing::error!("Hybrid recommendations failed {}", err);
                err.to_response()
            }
        },
    )
}

#[cfg(test)]
mod handler_tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::web::Data;
    use actix_web::{test, App};
    use paperclip::actix::OpenApiExt;

    use tripservice_store::api::{ItemId, NewDestination, UserDetails};
    use tripservice_store::repositories::{
        DestinationsRepository, InMemoryStore, InteractionsRepository, UsersRepository,
    };

    use crate::api::{
        ContentRecommendationsResponse, ErrorEnvelope, HybridRecommendationsResponse,
        NearbyQueryBody, NearbyRecommendationsResponse,
    };
    use crate::app_config::config_app;
    use crate::model_client::{
        CollaborativeQuery, ModelService, ModelServiceError, NearbyPlace,
    };

    #[derive(Default)]
    struct StubModelService {
        place_names: Vec<String>,
        nearby_places: Vec<NearbyPlace>,
        item_ids: Vec<ItemId>,
        fail: bool,
        category_calls: parking_lot::Mutex<Vec<Option<String>>>,
        location_calls: parking_lot::Mutex<Vec<(f64, f64)>>,
        collaborative_calls: parking_lot::Mutex<Vec<CollaborativeQuery>>,
    }

    fn stub_failure() -> ModelServiceError {
        ModelServiceError::BadStatus {
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            message: "model exploded".to_string(),
        }
    }

    #[async_trait::async_trait]
    impl ModelService for StubModelService {
        async fn recommend_by_category(
            &self,
            category: Option<&str>,
        ) -> Result<Vec<String>, ModelServiceError> {
            self.category_calls
                .lock()
                .push(category.map(str::to_string));
            if self.fail {
                return Err(stub_failure());
            }
            Ok(self.place_names.clone())
        }

        async fn recommend_by_location(
            &self,
            latitude: f64,
            longitude: f64,
        ) -> Result<Vec<NearbyPlace>, ModelServiceError> {
            self.location_calls.lock().push((latitude, longitude));
            if self.fail {
                return Err(stub_failure());
            }
            Ok(self.nearby_places.clone())
        }

        async fn recommend_collaborative(
            &self,
            query: &CollaborativeQuery,
        ) -> Result<Vec<ItemId>, ModelServiceError> {
            self.collaborative_calls.lock().push(query.clone());
            if self.fail {
                return Err(stub_failure());
            }
            Ok(self.item_ids.clone())
        }
    }

    fn new_destination(place_name: &str, category: &str) -> NewDestination {
        NewDestination {
            place_name: place_name.to_string(),
            category: category.to_string(),
            city: "Denpasar".to_string(),
            rating_avg: 4.5,
            description: "".to_string(),
        }
    }

    macro_rules! init_app {
        ($store:expr, $model:expr) => {
            test::init_service(
                App::new()
                    .wrap_api()
                    .app_data(Data::new($store.clone() as Arc<dyn UsersRepository>))
                    .app_data(Data::new($store.clone() as Arc<dyn InteractionsRepository>))
                    .app_data(Data::new($store.clone() as Arc<dyn DestinationsRepository>))
                    .app_data(Data::new($model.clone() as Arc<dyn ModelService>))
                    .configure(config_app)
                    .build(),
            )
            .await
        };
    }

    #[actix_web::test]
    /// Content variant passes the stored preferred category to the model and
    /// only returns destinations whose place name the model mentioned
    async fn test_content_uses_preferred_category_and_filters_by_name() {
        let store = Arc::new(InMemoryStore::default());
        let user_id = store.add_user(UserDetails {
            username: "traveller".to_string(),
            preferred_category: Some("beach".to_string()),
        });
        let id_a = store.add_destination(new_destination("Kuta Beach", "beach"));
        let _id_b = store.add_destination(new_destination("Mount Batur", "mountain"));
        let id_c = store.add_destination(new_destination("Tanah Lot", "temple"));

        let model = Arc::new(StubModelService {
            place_names: vec!["Kuta Beach".to_string(), "Tanah Lot".to_string()],
            ..Default::default()
        });

        let app = init_app!(store, model);
        let request = test::TestRequest::get()
            .uri("/api/recommendations/content")
            .insert_header(("x-user-id", user_id.to_string()))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: ContentRecommendationsResponse = test::read_body_json(response).await;
        assert_eq!(body.status, "success");
        assert_eq!(body.data.preferred_category, Some("beach".to_string()));
        let returned_ids: Vec<_> = body
            .data
            .recommendations
            .iter()
            .map(|d| d.item_id)
            .collect();
        assert_eq!(returned_ids, vec![id_a, id_c]);

        assert_eq!(
            *model.category_calls.lock(),
            vec![Some("beach".to_string())]
        );
    }

    #[actix_web::test]
    /// A missing user record maps to 404, the model is never called
    async fn test_content_fails_with_404_when_user_record_is_gone() {
        let store = Arc::new(InMemoryStore::default());
        let model = Arc::new(StubModelService::default());

        let app = init_app!(store, model);
        let request = test::TestRequest::get()
            .uri("/api/recommendations/content")
            .insert_header(("x-user-id", "42"))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body: ErrorEnvelope = test::read_body_json(response).await;
        assert_eq!(body.status, "error");
        assert_eq!(body.message, "You are not logged in");

        assert!(model.category_calls.lock().is_empty());
    }

    #[actix_web::test]
    /// An empty model response resolves to an empty list, never the full catalog
    async fn test_content_empty_model_response_yields_empty_recommendations() {
        let store = Arc::new(InMemoryStore::default());
        let user_id = store.add_user(UserDetails {
            username: "traveller".to_string(),
            preferred_category: None,
        });
        store.add_destination(new_destination("Kuta Beach", "beach"));
        store.add_destination(new_destination("Mount Batur", "mountain"));

        let model = Arc::new(StubModelService::default());

        let app = init_app!(store, model);
        let request = test::TestRequest::get()
            .uri("/api/recommendations/content")
            .insert_header(("x-user-id", user_id.to_string()))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: ContentRecommendationsResponse = test::read_body_json(response).await;
        assert!(body.data.recommendations.is_empty());
        assert_eq!(body.data.preferred_category, None);
        // unset preference is forwarded as None
        assert_eq!(*model.category_calls.lock(), vec![None]);
    }

    #[actix_web::test]
    /// Missing coordinates fail with 400 before any outbound call is made
    async fn test_nearby_rejects_missing_coordinates() {
        let store = Arc::new(InMemoryStore::default());
        let model = Arc::new(StubModelService::default());

        let app = init_app!(store, model);
        let request = test::TestRequest::post()
            .uri("/api/recommendations/nearby")
            .set_json(NearbyQueryBody {
                latitude: Some(-8.65),
                longitude: None,
            })
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: ErrorEnvelope = test::read_body_json(response).await;
        assert_eq!(body.status, "error");
        assert_eq!(body.error, "latitude and longitude are required");

        assert!(model.location_calls.lock().is_empty());
    }

    #[actix_web::test]
    /// Non-numeric coordinates are rejected with the service's own error
    /// envelope before any outbound call is made
    async fn test_nearby_rejects_non_numeric_coordinates() {
        let store = Arc::new(InMemoryStore::default());
        let model = Arc::new(StubModelService::default());

        let app = init_app!(store, model);
        let request = test::TestRequest::post()
            .uri("/api/recommendations/nearby")
            .insert_header(("content-type", "application/json"))
            .set_payload(r#"{"latitude": "abc", "longitude": 115.21}"#)
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: ErrorEnvelope = test::read_body_json(response).await;
        assert_eq!(body.status, "error");
        assert_eq!(body.message, "Invalid request parameters");

        assert!(model.location_calls.lock().is_empty());
    }

    #[actix_web::test]
    /// Nearby variant forwards the coordinates and resolves returned names
    async fn test_nearby_resolves_place_names() {
        let store = Arc::new(InMemoryStore::default());
        let id_a = store.add_destination(new_destination("Kuta Beach", "beach"));
        let _id_b = store.add_destination(new_destination("Mount Batur", "mountain"));

        let model = Arc::new(StubModelService {
            nearby_places: vec![
                NearbyPlace {
                    place_name: "Kuta Beach".to_string(),
                },
                NearbyPlace {
                    place_name: "Atlantis".to_string(),
                },
            ],
            ..Default::default()
        });

        let app = init_app!(store, model);
        let request = test::TestRequest::post()
            .uri("/api/recommendations/nearby")
            .set_json(NearbyQueryBody {
                latitude: Some(-8.65),
                longitude: Some(115.21),
            })
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: NearbyRecommendationsResponse = test::read_body_json(response).await;
        let returned_ids: Vec<_> = body.data.results.iter().map(|d| d.item_id).collect();
        assert_eq!(returned_ids, vec![id_a]);

        assert_eq!(*model.location_calls.lock(), vec![(-8.65, 115.21)]);
    }

    #[actix_web::test]
    /// A user with no activity still yields a collaborative request with
    /// empty arrays, not an error
    async fn test_hybrid_sends_empty_arrays_for_inactive_user() {
        let store = Arc::new(InMemoryStore::default());
        let user_id = store.add_user(UserDetails {
            username: "fresh".to_string(),
            preferred_category: None,
        });
        let model = Arc::new(StubModelService::default());

        let app = init_app!(store, model);
        let request = test::TestRequest::get()
            .uri("/api/recommendations/hybrid")
            .insert_header(("x-user-id", user_id.to_string()))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: HybridRecommendationsResponse = test::read_body_json(response).await;
        assert!(body.data.recommendations.is_empty());

        assert_eq!(
            *model.collaborative_calls.lock(),
            vec![CollaborativeQuery {
                user_id,
                review_data: vec![],
                bookmarks: vec![],
                likes: vec![],
            }]
        );
    }

    #[actix_web::test]
    /// Item ids the model returned but the catalog does not know are dropped
    async fn test_hybrid_drops_unknown_item_ids() {
        let store = Arc::new(InMemoryStore::default());
        let user_id = store.add_user(UserDetails {
            username: "traveller".to_string(),
            preferred_category: None,
        });
        let id_a = store.add_destination(new_destination("Kuta Beach", "beach"));
        let _id_b = store.add_destination(new_destination("Mount Batur", "mountain"));
        let id_c = store.add_destination(new_destination("Tanah Lot", "temple"));
        store.add_review(user_id, id_a, 5);
        store.add_bookmark(user_id, id_c);

        let model = Arc::new(StubModelService {
            item_ids: vec![id_a, id_c, 9999],
            ..Default::default()
        });

        let app = init_app!(store, model);
        let request = test::TestRequest::get()
            .uri("/api/recommendations/hybrid")
            .insert_header(("x-user-id", user_id.to_string()))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: HybridRecommendationsResponse = test::read_body_json(response).await;
        let returned_ids: Vec<_> = body
            .data
            .recommendations
            .iter()
            .map(|d| d.item_id)
            .collect();
        assert_eq!(returned_ids, vec![id_a, id_c]);

        let calls = model.collaborative_calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].review_data.len(), 1);
        assert_eq!(calls[0].bookmarks, vec![id_c]);
    }

    #[actix_web::test]
    /// A model service failure maps to 500 with the upstream message attached
    async fn test_model_failure_maps_to_500() {
        let store = Arc::new(InMemoryStore::default());
        let user_id = store.add_user(UserDetails {
            username: "traveller".to_string(),
            preferred_category: Some("beach".to_string()),
        });
        let model = Arc::new(StubModelService {
            fail: true,
            ..Default::default()
        });

        let app = init_app!(store, model);
        let request = test::TestRequest::get()
            .uri("/api/recommendations/content")
            .insert_header(("x-user-id", user_id.to_string()))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: ErrorEnvelope = test::read_body_json(response).await;
        assert_eq!(body.status, "error");
        assert_eq!(body.message, "Recommendation service is unavailable");
        assert!(body.error.contains("model exploded"));
    }

    #[actix_web::test]
    /// Requests without the gateway header never reach the pipelines
    async fn test_missing_user_id_header_is_unauthorized() {
        let store = Arc::new(InMemoryStore::default());
        let model = Arc::new(StubModelService::default());

        let app = init_app!(store, model);
        let request = test::TestRequest::get()
            .uri("/api/recommendations/hybrid")
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        assert!(model.collaborative_calls.lock().is_empty());
    }
}
