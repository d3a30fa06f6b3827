use actix_web::{
    FromRequest, HttpMessage, HttpRequest,
    body::MessageBody,
    dev::{Payload, ServiceRequest, ServiceResponse},
    middleware::Next,
    web,
};
use futures_util::{FutureExt, future::LocalBoxFuture};
use std::rc::Rc;
use uuid::Uuid;

use crate::{api::error, modules::user::service::UserService, utils::Claims};

/// Attaches identity-provider claims to the request when a valid bearer token
/// is present. Requests without one pass through untouched.
pub fn identify<B>(
    secret: &[u8],
) -> impl Fn(
    ServiceRequest,
    Next<B>,
) -> LocalBoxFuture<'static, Result<ServiceResponse<B>, actix_web::Error>>
where
    B: MessageBody + 'static,
{
    let secret: Rc<[u8]> = Rc::from(secret);
    move |req: ServiceRequest, next: Next<B>| {
        let secret = secret.clone();
        async move {
            let token = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "));

            if let Some(token) = token {
                match Claims::decode(token, &secret) {
                    Ok(claims) => {
                        req.extensions_mut().insert(claims);
                    }
                    Err(e) => log::debug!("Ignoring invalid bearer token: {e}"),
                }
            }

            next.call(req).await
        }
        .boxed_local()
    }
}

pub fn get_claims(req: &HttpRequest) -> Option<Claims> {
    req.extensions().get::<Claims>().cloned()
}

/// The caller's internal user id, or `None` when the request carries no
/// identity or the identity has never been synced.
pub struct Actor(pub Option<Uuid>);

impl FromRequest for Actor {
    type Error = error::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = get_claims(req);
        let user_service = req.app_data::<web::Data<UserService>>().cloned();

        Box::pin(async move {
            let Some(claims) = claims else {
                return Ok(Actor(None));
            };
            let user_service = user_service.ok_or_else(|| {
                log::error!("UserService is not registered as app data");
                error::Error::internal_server_error()
            })?;
            let id = user_service.resolve_actor(&claims).await?;
            Ok(Actor(id))
        })
    }
}
