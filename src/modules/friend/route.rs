use crate::modules::friend::handle::*;
use actix_web::web::{ServiceConfig, scope};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/friends")
            .service(list_friends)
            .service(friendship_status)
            .service(list_incoming_requests)
            .service(list_outgoing_requests)
            .service(toggle_friend_request)
            .service(send_friend_request)
            .service(cancel_friend_request)
            .service(accept_friend_request)
            .service(accept_friend_request_by_id)
            .service(reject_friend_request),
    );
}
