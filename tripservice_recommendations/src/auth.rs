use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use paperclip::actix::Apiv2Security;

use tripservice_store::api::UserId;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated context for a request.
/// The upstream gateway authenticates the session and injects the user id as
/// a header, this extractor only makes that id explicit for the handlers.
#[derive(Debug, Clone, Copy, Apiv2Security)]
#[openapi(
    apiKey,
    in = "header",
    name = "X-User-Id",
    description = "User id injected by the authentication gateway"
)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user_id = req
            .headers()
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<UserId>().ok());

        ready(match user_id {
            Some(user_id) => Ok(AuthenticatedUser { user_id }),
            None => Err(actix_web::error::ErrorUnauthorized(
                "Missing or invalid user id header",
            )),
        })
    }
}
