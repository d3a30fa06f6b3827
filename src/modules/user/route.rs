use crate::modules::user::handle::*;
use actix_web::web::{ServiceConfig, scope};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(scope("/users").service(sync_user).service(get_profile).service(get_user));
}
