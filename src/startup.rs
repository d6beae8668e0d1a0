use actix_web::dev::Server;
use actix_web::{guard, middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::configuration::JwtSettings;
use crate::error::{json_error_handler, path_error_handler};
use crate::logger::LoggerMiddleware;
use crate::middleware::JwtMiddleware;
use crate::routes::{
    create_hero, delete_hero, get_current_account, get_hero, health_check, list_heroes, login,
    logout, refresh, register, update_hero,
};
use crate::store::{AccountStore, HeroStore};

pub fn run(
    listener: TcpListener,
    accounts: Arc<dyn AccountStore>,
    heroes: Arc<dyn HeroStore>,
    jwt_config: JwtSettings,
) -> Result<Server, std::io::Error> {
    let accounts: web::Data<dyn AccountStore> = web::Data::from(accounts);
    let heroes: web::Data<dyn HeroStore> = web::Data::from(heroes);
    let jwt_config_data = web::Data::new(jwt_config.clone());

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)

            // Shared state
            .app_data(accounts.clone())
            .app_data(heroes.clone())
            .app_data(jwt_config_data.clone())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::PathConfig::default().error_handler(path_error_handler))

            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/auth/register", web::post().to(register))
            .route("/auth/login", web::post().to(login))
            .route("/auth/refresh", web::post().to(refresh))
            .service(
                web::resource("/api/heroes")
                    .guard(guard::Get())
                    .route(web::get().to(list_heroes)),
            )
            .service(
                web::resource("/api/heroes/{id}")
                    .guard(guard::Get())
                    .route(web::get().to(get_hero)),
            )

            // Protected routes (require JWT authentication)
            .service(
                web::resource("/auth/me")
                    .wrap(JwtMiddleware::new(jwt_config.clone()))
                    .route(web::get().to(get_current_account)),
            )
            .service(
                web::resource("/auth/logout")
                    .wrap(JwtMiddleware::new(jwt_config.clone()))
                    .route(web::post().to(logout)),
            )
            .service(
                web::scope("/api/heroes")
                    .wrap(JwtMiddleware::new(jwt_config.clone()))
                    .route("", web::post().to(create_hero))
                    .route("/{id}", web::put().to(update_hero))
                    .route("/{id}", web::delete().to(delete_hero)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
