use actix_cors::Cors;
use actix_web::{
    self, App, HttpServer,
    middleware::{Logger, from_fn},
    web,
};
use std::sync::{Arc, LazyLock};

use crate::{
    configs::{connect_database, run_migrations},
    middlewares::identify,
    modules::{
        friend::{repository_pg::FriendRepositoryPg, service::FriendService},
        notification::repository_pg::NotificationPgRepository,
        user::{repository_pg::UserRepositoryPg, service::UserService},
    },
};

mod api;
mod configs;
mod constants;
mod middlewares;
mod modules;
#[cfg(test)]
mod test;
mod utils;

pub static ENV: LazyLock<constants::Env> = LazyLock::new(|| {
    dotenvy::dotenv().ok();
    env_logger::init();
    log::info!("Environment variables loaded from .env file");
    constants::Env::default()
});

#[actix_web::get("/")]
async fn health_check(db_pool: web::Data<sqlx::PgPool>) -> &'static str {
    match sqlx::query("SELECT 1").execute(db_pool.get_ref()).await {
        Ok(_) => "Server is running",
        Err(e) => {
            log::error!("Health check failed: {e}");
            "Database unavailable"
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let db_pool =
        connect_database().await.map_err(|_| std::io::Error::other("Database connection error"))?;

    run_migrations(&db_pool).await.map_err(|_| std::io::Error::other("Migration error"))?;

    let user_repo = UserRepositoryPg::new(db_pool.clone());
    let friend_repo = FriendRepositoryPg::new(db_pool.clone(), NotificationPgRepository::new());

    let user_service = UserService::with_dependencies(Arc::new(user_repo.clone()));
    let friend_service =
        FriendService::with_dependencies(Arc::new(friend_repo), Arc::new(user_repo));

    log::info!("Starting server at http://{}:{}", ENV.ip.as_str(), ENV.port);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(ENV.frontend_url.as_str())
            .allow_any_method()
            .allow_any_header()
            .supports_credentials();

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(friend_service.clone()))
            .app_data(web::Data::new(db_pool.clone()))
            .service(health_check)
            .service(
                web::scope("/api")
                    .wrap(from_fn(identify(ENV.jwt_secret.as_bytes())))
                    .configure(modules::user::route::configure)
                    .configure(modules::friend::route::configure),
            )
    })
    .bind((ENV.ip.as_str(), ENV.port))?
    .workers(2)
    .run()
    .await
}
