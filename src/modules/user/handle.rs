use actix_web::{HttpRequest, get, post, web};
use uuid::Uuid;

use crate::api::{error, success};
use crate::middlewares::{Actor, get_claims};
use crate::modules::user::{model, service::UserService};

#[post("/sync")]
pub async fn sync_user(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<model::UserResponse>, error::Error> {
    let Some(claims) = get_claims(&req) else {
        return Ok(success::Success::anonymous());
    };
    let user = user_service.sync_user(&claims).await?;
    Ok(success::Success::ok(Some(user)).message("User synced successfully"))
}

#[get("/me")]
pub async fn get_profile(
    user_service: web::Data<UserService>,
    actor: Actor,
) -> Result<success::Success<model::UserResponse>, error::Error> {
    let Some(id) = actor.0 else {
        return Ok(success::Success::anonymous());
    };
    let user = user_service.get_by_id(id).await?;
    Ok(success::Success::ok(Some(user)).message("Profile retrieved successfully"))
}

#[get("/{id:[0-9a-fA-F-]{36}}")]
pub async fn get_user(
    user_service: web::Data<UserService>,
    user_id: web::Path<Uuid>,
) -> Result<success::Success<model::UserResponse>, error::Error> {
    let user = user_service.get_by_id(user_id.into_inner()).await?;
    Ok(success::Success::ok(Some(user)).message("User retrieved successfully"))
}
