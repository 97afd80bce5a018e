use std::time::Duration;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{App, HttpServer, cookie::Key, middleware, web};
use sqlx::postgres::PgPoolOptions;

use src_portal::auth::{self, middleware::IdleTimeout, rate_limit::LoginRateLimiter};
use src_portal::config::AppConfig;
use src_portal::models::user;
use src_portal::notify::{Mailer, SmsSender};
use src_portal::oauth::OAuthClient;
use src_portal::routes;

fn io_error(msg: String) -> std::io::Error {
    std::io::Error::other(msg)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = AppConfig::load().map_err(io_error)?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
        .map_err(|e| io_error(format!("Failed to connect to database: {e}")))?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| io_error(format!("Failed to run migrations: {e}")))?;
    log::info!("Database migrations applied");

    // Seed a super admin if the users table is empty
    let admin_hash = auth::password::hash_password(&config.admin_password).map_err(io_error)?;
    user::seed_super_admin(&pool, &admin_hash)
        .await
        .map_err(|e| io_error(e.to_string()))?;

    // Session key from SESSION_KEY; a generated key does not survive restarts
    let secret_key = match &config.session_key {
        Some(val) if val.len() >= 64 => {
            log::info!("Using SESSION_KEY from environment");
            Key::from(val.as_bytes())
        }
        Some(val) => {
            log::warn!("SESSION_KEY too short ({} bytes, need 64+), generating random key", val.len());
            Key::generate()
        }
        None => {
            log::warn!("No SESSION_KEY set, generating random key (sessions lost on restart)");
            Key::generate()
        }
    };

    if config.oauth.dev_mode {
        log::warn!("OAUTH_DEV_MODE is on: providers with placeholder credentials are simulated");
    }

    let oauth_client = web::Data::new(
        OAuthClient::new(config.oauth.clone(), &config.base_url).map_err(|e| io_error(e.to_string()))?,
    );
    let mailer = web::Data::new(Mailer::new(&config.mail).map_err(io_error)?);
    let sms = web::Data::new(SmsSender::new(&config.sms).map_err(io_error)?);
    let limiter = web::Data::new(LoginRateLimiter::default());
    let idle = web::Data::new(IdleTimeout(config.session_idle_minutes));
    let pool_data = web::Data::new(pool);
    let cookie_secure = config.cookie_secure;

    log::info!("Starting server at http://{}", config.bind_addr);

    HttpServer::new(move || {
        let session_mw = SessionMiddleware::builder(
            CookieSessionStore::default(),
            secret_key.clone(),
        )
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .build();

        App::new()
            .wrap(session_mw)
            .wrap(middleware::Logger::default())
            .app_data(pool_data.clone())
            .app_data(oauth_client.clone())
            .app_data(mailer.clone())
            .app_data(sms.clone())
            .app_data(limiter.clone())
            .app_data(idle.clone())
            // Static files
            .service(actix_files::Files::new("/static", "./static"))
            .configure(routes::configure)
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}
