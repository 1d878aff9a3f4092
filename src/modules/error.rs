use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::auth::{flash_cookie, Notice};

#[derive(Error, Debug)]
pub enum BlogError {
    #[error("email is already registered")]
    DuplicateEmail,

    #[error("no account with that email")]
    UnknownEmail,

    #[error("incorrect password")]
    InvalidPassword,

    #[error("login required")]
    AuthenticationRequired,

    #[error("You are not allowed to do that.")]
    Forbidden,

    #[error("Post {0} does not exist.")]
    PostNotFound(i64),

    #[error("A post titled \"{0}\" already exists.")]
    DuplicateTitle(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BlogError {
    /// 需要提示用户并跳转到登录页的错误
    pub fn notice(&self) -> Option<Notice> {
        match self {
            BlogError::DuplicateEmail => Some(Notice::DuplicateEmail),
            BlogError::UnknownEmail => Some(Notice::UnknownEmail),
            BlogError::InvalidPassword => Some(Notice::InvalidPassword),
            BlogError::AuthenticationRequired => Some(Notice::LoginToComment),
            _ => None,
        }
    }
}

impl ResponseError for BlogError {
    fn status_code(&self) -> StatusCode {
        match self {
            BlogError::DuplicateEmail
            | BlogError::UnknownEmail
            | BlogError::InvalidPassword
            | BlogError::AuthenticationRequired => StatusCode::SEE_OTHER,
            BlogError::Forbidden => StatusCode::FORBIDDEN,
            BlogError::PostNotFound(_) => StatusCode::NOT_FOUND,
            BlogError::DuplicateTitle(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let Some(notice) = self.notice() {
            log::debug!("Redirecting to login: {}", self);
            return HttpResponse::SeeOther()
                .append_header((header::LOCATION, "/login"))
                .cookie(flash_cookie(notice))
                .finish();
        }

        let status = self.status_code();
        let message = if status.is_server_error() {
            log::error!("Request failed: {}", self);
            "Something went wrong on our side.".to_string()
        } else {
            log::debug!("Request rejected ({}): {}", status, self);
            tera::escape_html(&self.to_string())
        };

        HttpResponse::build(status)
            .content_type("text/html; charset=utf-8")
            .body(format!(
                r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>{code}</title></head>
<body>
    <h1>{code}</h1>
    <p>{message}</p>
    <p><a href="/">Back to the blog</a></p>
</body>
</html>"#,
                code = status,
                message = message
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(BlogError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(BlogError::PostNotFound(7).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            BlogError::DuplicateTitle("Hello".to_string()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            BlogError::Internal("boom".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_notice_errors_redirect_to_login() {
        let response = BlogError::InvalidPassword.error_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/login"
        );
        assert!(response.cookies().any(|c| c.name() == crate::auth::FLASH_COOKIE));
    }
}
