//! 会话与管理员权限
//!
//! 会话主体是保存在签名 cookie 中的用户 ID。提示消息是保存短代码的一次性
//! cookie，由下一个页面显示并清除。

use actix_web::cookie::time::Duration;
use actix_web::cookie::{Cookie, CookieJar, Key, SameSite};
use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use std::future::{ready, Ready};

use crate::error::BlogError;
use crate::state::AppState;
use crate::users::User;

pub const SESSION_COOKIE: &str = "blog_session";
pub const FLASH_COOKIE: &str = "blog_flash";

/// 第一个注册的账号即管理员
pub const ADMIN_USER_ID: i64 = 1;

/// 一次性提示消息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    DuplicateEmail,
    UnknownEmail,
    InvalidPassword,
    LoginToComment,
}

impl Notice {
    pub fn code(&self) -> &'static str {
        match self {
            Notice::DuplicateEmail => "duplicate_email",
            Notice::UnknownEmail => "unknown_email",
            Notice::InvalidPassword => "invalid_password",
            Notice::LoginToComment => "login_to_comment",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "duplicate_email" => Some(Notice::DuplicateEmail),
            "unknown_email" => Some(Notice::UnknownEmail),
            "invalid_password" => Some(Notice::InvalidPassword),
            "login_to_comment" => Some(Notice::LoginToComment),
            _ => None,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Notice::DuplicateEmail => "You've already signed up with that email, log in instead!",
            Notice::UnknownEmail => "That email does not exist, please try again.",
            Notice::InvalidPassword => "Password incorrect, please try again.",
            Notice::LoginToComment => "You need to login or register to comment.",
        }
    }
}

pub fn flash_cookie(notice: Notice) -> Cookie<'static> {
    Cookie::build(FLASH_COOKIE, notice.code())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish()
}

pub fn clear_flash_cookie() -> Cookie<'static> {
    Cookie::build(FLASH_COOKIE, "")
        .path("/")
        .max_age(Duration::seconds(0))
        .finish()
}

/// 读取待显示的提示，调用方用 [`clear_flash_cookie`] 清除
pub fn pending_notice(req: &HttpRequest) -> Option<Notice> {
    req.cookie(FLASH_COOKIE)
        .and_then(|c| Notice::from_code(c.value()))
}

/// 为 `user_id` 生成签名会话 cookie
pub fn session_cookie(key: &Key, user_id: i64) -> Option<Cookie<'static>> {
    let mut jar = CookieJar::new();
    jar.signed_mut(key).add(
        Cookie::build(SESSION_COOKIE, user_id.to_string())
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .finish(),
    );
    jar.get(SESSION_COOKIE).cloned()
}

pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .max_age(Duration::seconds(0))
        .finish()
}

/// 从签名有效的会话 cookie 中取用户 ID
pub fn session_user_id(req: &HttpRequest, key: &Key) -> Option<i64> {
    let cookie = req.cookie(SESSION_COOKIE)?;
    let mut jar = CookieJar::new();
    jar.add_original(cookie);
    let verified = jar.signed(key).get(SESSION_COOKIE)?;
    verified.value().parse().ok()
}

pub fn is_admin(user: &User) -> bool {
    user.id == ADMIN_USER_ID
}

/// 管理员守卫：除管理员外（包括匿名访客）一律禁止
pub fn require_admin(user: Option<User>) -> Result<User, BlogError> {
    match user {
        Some(user) if is_admin(&user) => Ok(user),
        Some(user) => {
            log::warn!("User {} tried to reach an admin page", user.id);
            Err(BlogError::Forbidden)
        }
        None => Err(BlogError::Forbidden),
    }
}

fn app_state(req: &HttpRequest) -> Result<&web::Data<AppState>, BlogError> {
    req.app_data::<web::Data<AppState>>()
        .ok_or_else(|| BlogError::Internal("application state is not configured".to_string()))
}

/// 解析会话主体；用户已不存在时视为匿名
fn resolve_current_user(req: &HttpRequest) -> Result<Option<User>, BlogError> {
    let state = app_state(req)?;
    let user_id = match session_user_id(req, &state.cookie_key) {
        Some(id) => id,
        None => return Ok(None),
    };
    let user = state.db()?.get_user(user_id)?;
    if user.is_none() {
        log::debug!("Session refers to missing user {}", user_id);
    }
    Ok(user)
}

/// 当前会话用户，匿名访客为 `None`
pub struct CurrentUser(pub Option<User>);

impl FromRequest for CurrentUser {
    type Error = BlogError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(resolve_current_user(req).map(CurrentUser))
    }
}

/// 仅管理员可提取成功，管理处理函数不会为其他人执行
pub struct AdminUser(pub User);

impl FromRequest for AdminUser {
    type Error = BlogError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(resolve_current_user(req).and_then(require_admin).map(AdminUser))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn user(id: i64) -> User {
        User {
            id,
            email: format!("user{}@example.com", id),
            name: format!("User {}", id),
        }
    }

    #[test]
    fn test_require_admin() {
        assert!(require_admin(Some(user(1))).is_ok());
        assert!(matches!(require_admin(Some(user(2))), Err(BlogError::Forbidden)));
        assert!(matches!(require_admin(None), Err(BlogError::Forbidden)));
    }

    #[test]
    fn test_signed_session_round_trip() {
        let key = Key::generate();
        let cookie = session_cookie(&key, 42).unwrap();
        assert_ne!(cookie.value(), "42");

        let req = TestRequest::default().cookie(cookie).to_http_request();
        assert_eq!(session_user_id(&req, &key), Some(42));
    }

    #[test]
    fn test_forged_session_is_ignored() {
        let key = Key::generate();
        let req = TestRequest::default()
            .cookie(Cookie::new(SESSION_COOKIE, "1"))
            .to_http_request();
        assert_eq!(session_user_id(&req, &key), None);

        let other_key = Key::generate();
        let cookie = session_cookie(&other_key, 1).unwrap();
        let req = TestRequest::default().cookie(cookie).to_http_request();
        assert_eq!(session_user_id(&req, &key), None);
    }

    #[test]
    fn test_notice_codes() {
        for notice in [
            Notice::DuplicateEmail,
            Notice::UnknownEmail,
            Notice::InvalidPassword,
            Notice::LoginToComment,
        ] {
            assert_eq!(Notice::from_code(notice.code()), Some(notice));
        }
        assert_eq!(Notice::from_code("bogus"), None);
    }

    #[test]
    fn test_pending_notice() {
        let req = TestRequest::default()
            .cookie(flash_cookie(Notice::UnknownEmail))
            .to_http_request();
        assert_eq!(pending_notice(&req), Some(Notice::UnknownEmail));
    }
}
