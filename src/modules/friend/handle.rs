use actix_web::{delete, get, post, web};
use uuid::Uuid;

use crate::{
    api::{error, success},
    middlewares::Actor,
    modules::friend::{
        model::{
            FriendRequestBody, FriendResponse, FriendshipStatus, FriendshipStatusResponse,
            IncomingFriendRequest, OutgoingFriendRequest, RespondBody, ToggleResponse,
        },
        schema::FriendRequestEntity,
        service::FriendService,
    },
    utils::{OptionalValidatedJson, ValidatedJson},
};

#[post("/requests")]
pub async fn send_friend_request(
    friend_service: web::Data<FriendService>,
    body: ValidatedJson<FriendRequestBody>,
    actor: Actor,
) -> Result<success::Success<FriendRequestEntity>, error::Error> {
    let Some(sender_id) = actor.0 else {
        return Ok(success::Success::anonymous());
    };
    let body = body.0;
    let request =
        friend_service.send_friend_request(sender_id, body.receiver_id, body.message).await?;

    Ok(success::Success::created(Some(request)).message("Friend request sent"))
}

#[post("/requests/toggle")]
pub async fn toggle_friend_request(
    friend_service: web::Data<FriendService>,
    body: ValidatedJson<FriendRequestBody>,
    actor: Actor,
) -> Result<success::Success<ToggleResponse>, error::Error> {
    let Some(sender_id) = actor.0 else {
        return Ok(success::Success::anonymous());
    };
    let body = body.0;
    let response =
        friend_service.toggle_friend_request(sender_id, body.receiver_id, body.message).await?;
    let message = response.message();

    Ok(success::Success::ok(Some(response)).message(message))
}

#[delete("/requests/{receiver_id}")]
pub async fn cancel_friend_request(
    friend_service: web::Data<FriendService>,
    receiver_id: web::Path<Uuid>,
    actor: Actor,
) -> Result<success::Success<FriendRequestEntity>, error::Error> {
    let Some(sender_id) = actor.0 else {
        return Ok(success::Success::anonymous());
    };
    let request = friend_service.cancel_friend_request(sender_id, *receiver_id).await?;

    Ok(success::Success::ok(Some(request)).message("Friend request removed"))
}

#[post("/requests/from/{sender_id}/accept")]
pub async fn accept_friend_request(
    friend_service: web::Data<FriendService>,
    sender_id: web::Path<Uuid>,
    body: OptionalValidatedJson<RespondBody>,
    actor: Actor,
) -> Result<success::Success<FriendRequestEntity>, error::Error> {
    let Some(receiver_id) = actor.0 else {
        return Ok(success::Success::anonymous());
    };
    let request =
        friend_service.accept_friend_request(receiver_id, *sender_id, body.0.message).await?;

    Ok(success::Success::ok(Some(request)).message("Friend request accepted"))
}

#[post("/requests/{request_id}/accept")]
pub async fn accept_friend_request_by_id(
    friend_service: web::Data<FriendService>,
    request_id: web::Path<Uuid>,
    body: OptionalValidatedJson<RespondBody>,
    actor: Actor,
) -> Result<success::Success<FriendRequestEntity>, error::Error> {
    let Some(receiver_id) = actor.0 else {
        return Ok(success::Success::anonymous());
    };
    let request = friend_service
        .accept_friend_request_by_id(receiver_id, *request_id, body.0.message)
        .await?;

    Ok(success::Success::ok(Some(request)).message("Friend request accepted"))
}

#[post("/requests/{request_id}/reject")]
pub async fn reject_friend_request(
    friend_service: web::Data<FriendService>,
    request_id: web::Path<Uuid>,
    body: OptionalValidatedJson<RespondBody>,
    actor: Actor,
) -> Result<success::Success<FriendRequestEntity>, error::Error> {
    let Some(receiver_id) = actor.0 else {
        return Ok(success::Success::anonymous());
    };
    let request =
        friend_service.reject_friend_request(receiver_id, *request_id, body.0.message).await?;

    Ok(success::Success::ok(Some(request)).message("Friend request rejected"))
}

#[get("/requests/incoming")]
pub async fn list_incoming_requests(
    friend_service: web::Data<FriendService>,
    actor: Actor,
) -> Result<success::Success<Vec<IncomingFriendRequest>>, error::Error> {
    let requests = match actor.0 {
        Some(user_id) => friend_service.get_incoming_friend_requests(user_id).await?,
        None => Vec::new(),
    };

    Ok(success::Success::ok(Some(requests)).message("Friend requests retrieved successfully"))
}

#[get("/requests/outgoing")]
pub async fn list_outgoing_requests(
    friend_service: web::Data<FriendService>,
    actor: Actor,
) -> Result<success::Success<Vec<OutgoingFriendRequest>>, error::Error> {
    let requests = match actor.0 {
        Some(user_id) => friend_service.get_outgoing_friend_requests(user_id).await?,
        None => Vec::new(),
    };

    Ok(success::Success::ok(Some(requests)).message("Friend requests retrieved successfully"))
}

#[get("/status/{user_id}")]
pub async fn friendship_status(
    friend_service: web::Data<FriendService>,
    other_id: web::Path<Uuid>,
    actor: Actor,
) -> Result<success::Success<FriendshipStatusResponse>, error::Error> {
    let status = match actor.0 {
        Some(user_id) => friend_service.check_friendship_status(user_id, *other_id).await?,
        None => FriendshipStatus::None,
    };

    Ok(success::Success::ok(Some(FriendshipStatusResponse::from(status))))
}

#[get("")]
pub async fn list_friends(
    friend_service: web::Data<FriendService>,
    actor: Actor,
) -> Result<success::Success<Vec<FriendResponse>>, error::Error> {
    let friends = match actor.0 {
        Some(user_id) => friend_service.get_friends(user_id).await?,
        None => Vec::new(),
    };

    Ok(success::Success::ok(Some(friends)).message("Friends retrieved successfully"))
}
