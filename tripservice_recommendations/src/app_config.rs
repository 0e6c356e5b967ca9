use actix_web::error::InternalError;
use actix_web::HttpResponse;
use paperclip::actix::web;

use crate::api::ErrorEnvelope;
use crate::handlers;

/// Malformed request bodies get the same error envelope as every other
/// failure instead of the framework's plain-text 400
fn json_config() -> actix_web::web::JsonConfig {
    actix_web::web::JsonConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(ErrorEnvelope {
            status: "error".to_string(),
            message: "Invalid request parameters".to_string(),
            error: err.to_string(),
        });
        InternalError::from_response(err, response).into()
    })
}

pub fn config_app(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(web::resource("/health").route(web::get().to(handlers::health)))
        .service(
            web::scope("/api").service(
                web::scope("/recommendations")
                    .service(
                        web::resource("/content")
                            .route(web::get().to(handlers::recommend_by_content)),
                    )
                    .service(
                        web::resource("/nearby")
                            .route(web::post().to(handlers::recommend_by_nearby)),
                    )
                    .service(
                        web::resource("/hybrid")
                            .route(web::get().to(handlers::recommend_by_hybrid)),
                    ),
            ),
        );
}
