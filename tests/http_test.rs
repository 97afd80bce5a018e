//! End-to-end request tests against the real route table and session stack.

mod common;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServiceResponse;
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use regex::Regex;
use sqlx::PgPool;

use src_portal::auth::middleware::IdleTimeout;
use src_portal::auth::rate_limit::LoginRateLimiter;
use src_portal::auth::roles::Role;
use src_portal::config::{MailConfig, OAuthConfig};
use src_portal::models::{feedback, user};
use src_portal::notify::{Mailer, SmsSender};
use src_portal::oauth::OAuthClient;
use src_portal::routes;
use common::*;

fn mail_config() -> MailConfig {
    MailConfig {
        smtp_host: None,
        smtp_port: 587,
        smtp_username: String::new(),
        smtp_password: String::new(),
        from_email: "noreply@src.local".to_string(),
        from_name: "SRC Portal".to_string(),
        mail_dir: std::env::temp_dir()
            .join("src-portal-http-test-mail")
            .to_string_lossy()
            .into_owned(),
    }
}

fn oauth_config(dev_mode: bool) -> OAuthConfig {
    OAuthConfig {
        google: Default::default(),
        facebook: Default::default(),
        dev_mode,
    }
}

macro_rules! test_app {
    ($pool:expr, $oauth:expr) => {
        test::init_service(
            App::new()
                .wrap(
                    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
                        .cookie_secure(false)
                        .build(),
                )
                .app_data(web::Data::new($pool.clone()))
                .app_data(web::Data::new(
                    OAuthClient::new($oauth, "http://localhost:8080").expect("oauth client"),
                ))
                .app_data(web::Data::new(Mailer::new(&mail_config()).expect("mailer")))
                .app_data(web::Data::new(SmsSender::disabled()))
                .app_data(web::Data::new(LoginRateLimiter::default()))
                .app_data(web::Data::new(IdleTimeout(30)))
                .configure(routes::configure),
        )
        .await
    };
}

fn session_cookie<B>(resp: &ServiceResponse<B>) -> Cookie<'static> {
    resp.response()
        .cookies()
        .find(|c| c.name() == "id")
        .map(|c| c.into_owned())
        .expect("session cookie set")
}

fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn csrf_token(html: &str) -> String {
    let re = Regex::new(r#"name="csrf_token" value="([0-9a-f]+)""#).unwrap();
    re.captures(html).expect("csrf field rendered")[1].to_string()
}

/// The session cookie from `resp` if it set one, else `current`.
fn refreshed<B>(resp: &ServiceResponse<B>, current: Cookie<'static>) -> Cookie<'static> {
    resp.response()
        .cookies()
        .find(|c| c.name() == "id")
        .map(|c| c.into_owned())
        .unwrap_or(current)
}

async fn body_text<B: MessageBody>(resp: ServiceResponse<B>) -> String {
    String::from_utf8(test::read_body(resp).await.to_vec()).unwrap()
}

/// Log `$username` in with the shared test password and return the session cookie.
macro_rules! login {
    ($app:expr, $username:expr) => {{
        let page = test::call_service(&$app, test::TestRequest::get().uri("/login").to_request()).await;
        let cookie = session_cookie(&page);
        let token = csrf_token(&body_text(page).await);
        let req = test::TestRequest::post()
            .uri("/login")
            .cookie(cookie)
            .set_form([("login", $username), ("password", TEST_PASS), ("csrf_token", token.as_str())])
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(location(&resp), "/dashboard", "login as {}", $username);
        session_cookie(&resp)
    }};
}

macro_rules! get {
    ($app:expr, $uri:expr, $cookie:expr) => {
        test::call_service(
            &$app,
            test::TestRequest::get().uri($uri).cookie($cookie.clone()).to_request(),
        )
        .await
    };
}

#[sqlx::test(migrations = "./migrations")]
async fn test_protected_pages_redirect_to_login(pool: PgPool) {
    let app = test_app!(pool, oauth_config(false));

    for path in ["/dashboard", "/admin/feedback", "/notifications", "/profile"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(path).to_request()).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&resp), "/login", "{path}");
    }

    let root = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(location(&root), "/dashboard");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_flow_reaches_dashboard(pool: PgPool) {
    insert_named_user(&pool, "kmensah", Role::User, "Kofi", "Mensah").await;
    let app = test_app!(pool, oauth_config(false));

    let page = test::call_service(&app, test::TestRequest::get().uri("/login").to_request()).await;
    assert_eq!(page.status(), StatusCode::OK);
    let cookie = session_cookie(&page);
    let token = csrf_token(&String::from_utf8(test::read_body(page).await.to_vec()).unwrap());

    let login = test::TestRequest::post()
        .uri("/login")
        .cookie(cookie)
        .set_form([("login", "kmensah"), ("password", TEST_PASS), ("csrf_token", token.as_str())])
        .to_request();
    let resp = test::call_service(&app, login).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/dashboard");
    let cookie = session_cookie(&resp);

    let dash = test::call_service(
        &app,
        test::TestRequest::get().uri("/dashboard").cookie(cookie).to_request(),
    )
    .await;
    assert_eq!(dash.status(), StatusCode::OK);
    let body = String::from_utf8(test::read_body(dash).await.to_vec()).unwrap();
    assert!(body.contains("kmensah"));
    assert!(body.contains("/feedback/submit"));
    assert!(!body.contains("href=\"/admin/feedback\""));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_without_csrf_token_is_forbidden(pool: PgPool) {
    insert_user(&pool, "kmensah", Role::User).await;
    let app = test_app!(pool, oauth_config(false));

    let req = test::TestRequest::post()
        .uri("/login")
        .set_form([("login", "kmensah"), ("password", TEST_PASS), ("csrf_token", "forged")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_oauth_state_mismatch_is_rejected(pool: PgPool) {
    let app = test_app!(pool, oauth_config(false));

    let start = test::call_service(&app, test::TestRequest::get().uri("/auth/google/login").to_request()).await;
    assert_eq!(start.status(), StatusCode::SEE_OTHER);
    assert!(location(&start).starts_with("https://accounts.google.com/"));
    let cookie = session_cookie(&start);

    let query = serde_urlencoded::to_string([("code", "abc"), ("state", "not-the-state")]).unwrap();
    let callback = test::TestRequest::get()
        .uri(&format!("/auth/google/callback?{query}"))
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, callback).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(user::count(&pool).await.unwrap(), 0);

    // No login in progress at all
    let stray = test::call_service(
        &app,
        test::TestRequest::get().uri("/auth/facebook/callback?code=abc&state=x").to_request(),
    )
    .await;
    assert_eq!(stray.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_unknown_provider_is_not_found(pool: PgPool) {
    let app = test_app!(pool, oauth_config(false));
    let resp = test::call_service(&app, test::TestRequest::get().uri("/auth/twitter/login").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_dev_mode_login_creates_account(pool: PgPool) {
    let app = test_app!(pool, oauth_config(true));

    let start = test::call_service(&app, test::TestRequest::get().uri("/auth/facebook/login").to_request()).await;
    let next = location(&start);
    assert!(next.starts_with("/auth/facebook/callback?code=dev&state="));
    let cookie = session_cookie(&start);

    let resp = test::call_service(&app, test::TestRequest::get().uri(&next).cookie(cookie).to_request()).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/dashboard");

    let created = user::find_by_oauth(&pool, "facebook", "dev-facebook-0001")
        .await
        .unwrap()
        .expect("dev user created");
    assert_eq!(created.role(), Role::User);
    assert_eq!(user::count(&pool).await.unwrap(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_visitor_can_submit_feedback(pool: PgPool) {
    let admin = insert_user(&pool, "admin1", Role::Admin).await;
    let app = test_app!(pool, oauth_config(false));

    let page = test::call_service(&app, test::TestRequest::get().uri("/feedback/submit").to_request()).await;
    assert_eq!(page.status(), StatusCode::OK);
    let cookie = session_cookie(&page);
    let token = csrf_token(&String::from_utf8(test::read_body(page).await.to_vec()).unwrap());

    let req = test::TestRequest::post()
        .uri("/feedback/submit")
        .cookie(cookie)
        .set_form([
            ("subject", "welfare"),
            ("message", "The water in Hall 3 has been off since Monday."),
            ("submitter_name", "Jane"),
            ("submitter_email", "jane@example.com"),
            ("csrf_token", token.as_str()),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("Thank you"));

    let rows = feedback::find_filtered(&pool, &feedback::FeedbackFilter::default()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].display_name(), "Jane (Direct Submission)");
    assert_eq!(src_portal::models::notification::count_unread(&pool, admin).await, 1);

    let cookie = login!(app, "admin1");
    let dashboard = get!(app, "/admin/feedback", cookie);
    assert_eq!(dashboard.status(), StatusCode::OK);
    let html = body_text(dashboard).await;
    assert!(html.contains("Jane (Direct Submission)"));
    assert!(html.contains("jane@example.com"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_visitor_submission_requires_contact_details(pool: PgPool) {
    let app = test_app!(pool, oauth_config(false));

    let page = test::call_service(&app, test::TestRequest::get().uri("/feedback/submit").to_request()).await;
    let cookie = session_cookie(&page);
    let token = csrf_token(&String::from_utf8(test::read_body(page).await.to_vec()).unwrap());

    let req = test::TestRequest::post()
        .uri("/feedback/submit")
        .cookie(cookie)
        .set_form([
            ("subject", "welfare"),
            ("message", "The water in Hall 3 has been off since Monday."),
            ("csrf_token", token.as_str()),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("class=\"error\""));

    let rows = feedback::find_filtered(&pool, &feedback::FeedbackFilter::default()).await.unwrap();
    assert!(rows.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_deactivated_account_loses_session(pool: PgPool) {
    let uid = insert_user(&pool, "student1", Role::User).await;
    let app = test_app!(pool, oauth_config(false));
    let cookie = login!(app, "student1");

    let before = get!(app, "/dashboard", cookie);
    assert_eq!(before.status(), StatusCode::OK);
    let cookie = refreshed(&before, cookie);

    deactivate(&pool, uid).await;

    let after = get!(app, "/dashboard", cookie);
    assert_eq!(after.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&after), "/login");

    // The old cookie no longer identifies anyone on public pages either
    let submit = get!(app, "/feedback/submit", cookie);
    assert_eq!(submit.status(), StatusCode::OK);
    let html = body_text(submit).await;
    assert!(html.contains("name=\"submitter_email\""));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_demoted_admin_loses_admin_pages(pool: PgPool) {
    let uid = insert_user(&pool, "admin1", Role::Admin).await;
    let app = test_app!(pool, oauth_config(false));
    let cookie = login!(app, "admin1");

    let before = get!(app, "/admin/feedback", cookie);
    assert_eq!(before.status(), StatusCode::OK);
    let cookie = refreshed(&before, cookie);

    assert!(user::update_role_status(&pool, uid, Role::User, user::STATUS_ACTIVE).await.unwrap());

    let after = get!(app, "/admin/feedback", cookie);
    assert_eq!(after.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_author_can_open_own_draft(pool: PgPool) {
    insert_user(&pool, "member1", Role::Member).await;
    insert_user(&pool, "member2", Role::Member).await;
    let app = test_app!(pool, oauth_config(false));
    let cookie = login!(app, "member1");

    let form = get!(app, "/news/new", cookie);
    assert_eq!(form.status(), StatusCode::OK);
    let cookie = refreshed(&form, cookie);
    let token = csrf_token(&body_text(form).await);

    let req = test::TestRequest::post()
        .uri("/news")
        .cookie(cookie.clone())
        .set_form([
            ("title", "Budget draft"),
            ("content", "Figures still being checked."),
            ("status", "draft"),
            ("csrf_token", token.as_str()),
        ])
        .to_request();
    let created = test::call_service(&app, req).await;
    assert_eq!(created.status(), StatusCode::SEE_OTHER);
    let item_path = location(&created);
    assert!(item_path.starts_with("/news/"));
    let cookie = refreshed(&created, cookie);

    let detail = get!(app, &item_path, cookie);
    assert_eq!(detail.status(), StatusCode::OK);
    let cookie = refreshed(&detail, cookie);
    assert!(body_text(detail).await.contains("Budget draft"));

    let list = get!(app, "/news", cookie);
    assert!(body_text(list).await.contains("Budget draft"));

    let other = login!(app, "member2");
    let hidden = get!(app, &item_path, other);
    assert_eq!(hidden.status(), StatusCode::NOT_FOUND);
    let other_list = get!(app, "/news", other);
    assert!(!body_text(other_list).await.contains("Budget draft"));
}
