use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use askama::Template;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Db(sqlx::Error),
    Template(askama::Error),
    Http(reqwest::Error),
    Hash(String),
    Session(String),
    PermissionDenied(String),
    Csrf,
    OAuth(String),
    BadRequest(String),
    NotFound,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Db(e) => write!(f, "Database error: {e}"),
            AppError::Template(e) => write!(f, "Template error: {e}"),
            AppError::Http(e) => write!(f, "HTTP client error: {e}"),
            AppError::Hash(e) => write!(f, "Hash error: {e}"),
            AppError::Session(e) => write!(f, "Session error: {e}"),
            AppError::PermissionDenied(code) => write!(f, "Permission denied: {code}"),
            AppError::Csrf => write!(f, "Invalid or missing CSRF token"),
            AppError::OAuth(e) => write!(f, "OAuth error: {e}"),
            AppError::BadRequest(e) => write!(f, "Bad request: {e}"),
            AppError::NotFound => write!(f, "Not found"),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::PermissionDenied(_) | AppError::Csrf => StatusCode::FORBIDDEN,
            AppError::Session(_) => StatusCode::SEE_OTHER,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::OAuth(_) | AppError::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::NotFound => error_page(StatusCode::NOT_FOUND, "Page not found"),
            AppError::PermissionDenied(code) => {
                log::warn!("Permission denied: {code}");
                error_page(StatusCode::FORBIDDEN, "You do not have permission to do that")
            }
            AppError::Csrf => error_page(StatusCode::FORBIDDEN, "Invalid or missing CSRF token"),
            AppError::Session(e) => {
                log::debug!("Session rejected: {e}");
                HttpResponse::SeeOther()
                    .insert_header(("Location", "/login"))
                    .finish()
            }
            AppError::BadRequest(msg) => error_page(StatusCode::BAD_REQUEST, msg),
            AppError::OAuth(_) | AppError::Http(_) => {
                log::error!("{self}");
                error_page(StatusCode::BAD_GATEWAY, "Sign-in with the provider failed. Please try again.")
            }
            _ => {
                log::error!("{self}");
                error_page(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }
}

#[derive(Template)]
#[template(path = "errors/error.html")]
struct ErrorTemplate<'a> {
    status: u16,
    message: &'a str,
}

fn error_page(status: StatusCode, message: &str) -> HttpResponse {
    let body = ErrorTemplate { status: status.as_u16(), message }
        .render()
        .unwrap_or_else(|_| message.to_string());
    HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(body)
}

/// Render an askama template into a 200 HTML response.
pub fn render<T: Template>(tmpl: T) -> Result<HttpResponse, AppError> {
    let html = tmpl.render()?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html))
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound,
            other => AppError::Db(other),
        }
    }
}

impl From<askama::Error> for AppError {
    fn from(e: askama::Error) -> Self {
        AppError::Template(e)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Http(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_error_redirects_to_login() {
        let resp = AppError::Session("expired".into()).error_response();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get("Location").unwrap(), "/login");
    }

    #[test]
    fn oauth_error_hides_details() {
        let err = AppError::OAuth("token endpoint said: secret mismatch".into());
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.error_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::NotFound));
    }
}
