use actix_web::{HttpResponse, middleware, web};

use crate::auth;
use crate::errors::AppError;
use crate::handlers::{
    auth_handlers, dashboard, event_handlers, feedback_handlers, news_handlers,
    notification_handlers, oauth_handlers, profile_handlers, user_handlers,
};

/// Register every route. Public routes first, then the authenticated scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // Public routes
        .route("/login", web::get().to(auth_handlers::login_page))
        .route("/login", web::post().to(auth_handlers::login_submit))
        .route("/register", web::get().to(auth_handlers::register_page))
        .route("/register", web::post().to(auth_handlers::register_submit))
        .route("/auth/{provider}/login", web::get().to(oauth_handlers::login))
        .route("/auth/{provider}/callback", web::get().to(oauth_handlers::callback))
        .service(
            web::resource("/feedback/submit")
                .wrap(middleware::from_fn(auth::middleware::refresh_account))
                .route(web::get().to(feedback_handlers::submit_page))
                .route(web::post().to(feedback_handlers::submit)),
        )
        // Root redirect
        .route("/", web::get().to(|| async {
            HttpResponse::SeeOther()
                .insert_header(("Location", "/dashboard"))
                .finish()
        }))
        // Protected routes
        .service(
            web::scope("")
                .wrap(middleware::from_fn(auth::middleware::require_auth))
                .route("/dashboard", web::get().to(dashboard::index))
                .route("/logout", web::post().to(auth_handlers::logout))
                // Feedback
                .route("/feedback", web::get().to(feedback_handlers::mine))
                .route("/admin/feedback", web::get().to(feedback_handlers::dashboard))
                .route("/admin/feedback/{id}", web::post().to(feedback_handlers::update))
                .route("/admin/feedback/{id}/delete", web::post().to(feedback_handlers::delete))
                // News: /news/new before /news/{id}
                .route("/news", web::get().to(news_handlers::list))
                .route("/news/new", web::get().to(news_handlers::new_form))
                .route("/news", web::post().to(news_handlers::create))
                .route("/news/{id}", web::get().to(news_handlers::detail))
                .route("/news/{id}/edit", web::get().to(news_handlers::edit_form))
                .route("/news/{id}", web::post().to(news_handlers::update))
                .route("/news/{id}/delete", web::post().to(news_handlers::delete))
                // Events: /events/new before /events/{id}
                .route("/events", web::get().to(event_handlers::list))
                .route("/events/new", web::get().to(event_handlers::new_form))
                .route("/events", web::post().to(event_handlers::create))
                .route("/events/{id}", web::get().to(event_handlers::detail))
                .route("/events/{id}/edit", web::get().to(event_handlers::edit_form))
                .route("/events/{id}", web::post().to(event_handlers::update))
                .route("/events/{id}/delete", web::post().to(event_handlers::delete))
                // Notifications
                .route("/notifications", web::get().to(notification_handlers::list))
                .route("/notifications/read-all", web::post().to(notification_handlers::mark_all_read))
                .route("/notifications/{id}/read", web::post().to(notification_handlers::mark_read))
                // Users
                .route("/admin/users", web::get().to(user_handlers::list))
                .route("/admin/users/{id}/edit", web::get().to(user_handlers::edit_form))
                .route("/admin/users/{id}/edit", web::post().to(user_handlers::update))
                // Profile
                .route("/profile", web::get().to(profile_handlers::page))
                .route("/profile", web::post().to(profile_handlers::update))
                .route("/profile/password", web::post().to(profile_handlers::change_password))
                .route("/preferences", web::post().to(profile_handlers::preferences))
                .default_service(web::to(not_found)),
        );
}

async fn not_found() -> Result<HttpResponse, AppError> {
    Err(AppError::NotFound)
}
