use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use sqlx::PgPool;
use std::net::TcpListener;

use crate::cache::ResponseCache;
use crate::configuration::JwtSettings;
use crate::middleware::{JwtMiddleware, RequestLogging};
use crate::routes::{
    create_post, delete_post, get_all_posts, get_current_user, get_post, health_check, login,
    logout, refresh, register, update_post,
};

pub fn run(
    listener: TcpListener,
    connection: PgPool,
    cache: ResponseCache,
    jwt_config: JwtSettings,
) -> Result<Server, std::io::Error> {
    let connection = web::Data::new(connection);
    let cache = web::Data::new(cache);
    let jwt_config_data = web::Data::new(jwt_config.clone());

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestLogging)
            // Shared state
            .app_data(connection.clone())
            .app_data(cache.clone())
            .app_data(jwt_config_data.clone())
            // Public routes (no authentication required)
            .route("/health_check", web::get().to(health_check))
            .route("/auth/register", web::post().to(register))
            .route("/auth/login", web::post().to(login))
            .route("/auth/refresh", web::post().to(refresh))
            // Protected routes (require JWT authentication)
            .service(
                web::scope("/auth")
                    .wrap(JwtMiddleware::new(jwt_config.clone()))
                    .route("/me", web::get().to(get_current_user))
                    .route("/logout", web::post().to(logout)),
            )
            .service(
                web::scope("/api")
                    .wrap(JwtMiddleware::new(jwt_config.clone()))
                    .route("/posts", web::post().to(create_post))
                    .route("/posts", web::get().to(get_all_posts))
                    .route("/posts/{post_id}", web::get().to(get_post))
                    .route("/posts/{post_id}", web::put().to(update_post))
                    .route("/posts/{post_id}", web::delete().to(delete_post)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
