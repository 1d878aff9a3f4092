use actix_web::cookie::Key;
use sha2::{Digest, Sha512};
use std::sync::{Mutex, MutexGuard};

use crate::config::Config;
use crate::credentials::{hash_password, verify_password};
use crate::error::BlogError;
use crate::storage::BlogDB;
use crate::templates::TemplateRenderer;
use crate::users::User;

/// 应用共享状态，通过 `web::Data` 在各 worker 间共享
pub struct AppState {
    pub config: Config,
    pub renderer: TemplateRenderer,
    pub cookie_key: Key,
    db: Mutex<BlogDB>,
}

impl AppState {
    pub fn new(config: Config, db: BlogDB) -> Result<Self, BlogError> {
        let renderer = TemplateRenderer::new(&config)?;
        let cookie_key = derive_cookie_key(&config.server.secret_key);

        Ok(Self {
            config,
            renderer,
            cookie_key,
            db: Mutex::new(db),
        })
    }

    /// 打开配置的数据库，首次启动时建表
    pub fn open(config: Config) -> Result<Self, BlogError> {
        let db = BlogDB::new(&config.database_path())?;
        Self::new(config, db)
    }

    pub fn db(&self) -> Result<MutexGuard<'_, BlogDB>, BlogError> {
        self.db
            .lock()
            .map_err(|_| BlogError::Internal("database lock poisoned".to_string()))
    }

    /// 注册新用户；Argon2 哈希在数据库锁之外计算
    pub fn register_user(&self, email: &str, password: &str, name: &str) -> Result<User, BlogError> {
        if self.db()?.find_user_by_email(email)?.is_some() {
            return Err(BlogError::DuplicateEmail);
        }
        let password_hash = hash_password(password)?;
        self.db()?.insert_user(email, &password_hash, name)
    }

    /// 校验登录凭据；密码比对同样不持有数据库锁
    pub fn verify_login(&self, email: &str, password: &str) -> Result<User, BlogError> {
        let (user, stored_hash) = self.db()?.find_credentials(email)?;
        if verify_password(password, &stored_hash)? {
            Ok(user)
        } else {
            Err(BlogError::InvalidPassword)
        }
    }
}

/// SHA-512 恰好产生签名 `Key` 所需的 64 字节，与密钥长度无关
fn derive_cookie_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_state() -> AppState {
        let mut config = Config::default();
        config.paths.templates_dir = PathBuf::from("/nonexistent/daily_blog/templates");
        AppState::new(config, BlogDB::in_memory().unwrap()).unwrap()
    }

    #[test]
    fn test_register_and_login() {
        let state = test_state();
        let user = state.register_user("ada@example.com", "secret", "Ada").unwrap();
        assert_eq!(user.id, 1);

        let logged_in = state.verify_login("ada@example.com", "secret").unwrap();
        assert_eq!(logged_in, user);
    }

    #[test]
    fn test_register_duplicate_email() {
        let state = test_state();
        state.register_user("ada@example.com", "secret", "Ada").unwrap();

        let second = state.register_user("ada@example.com", "other", "Impostor");
        assert!(matches!(second, Err(BlogError::DuplicateEmail)));
        assert_eq!(state.db().unwrap().get_all_users().unwrap().len(), 1);
    }

    #[test]
    fn test_login_failures_are_distinct() {
        let state = test_state();
        state.register_user("ada@example.com", "secret", "Ada").unwrap();

        assert!(matches!(
            state.verify_login("nobody@example.com", "secret"),
            Err(BlogError::UnknownEmail)
        ));
        assert!(matches!(
            state.verify_login("ada@example.com", "wrong"),
            Err(BlogError::InvalidPassword)
        ));
    }

    #[test]
    fn test_lock_is_free_after_login_check() {
        let state = test_state();
        state.register_user("ada@example.com", "secret", "Ada").unwrap();
        let _ = state.verify_login("ada@example.com", "wrong");
        assert!(state.db.try_lock().is_ok());
    }

    #[test]
    fn test_cookie_key_is_deterministic() {
        let a = derive_cookie_key("short");
        let b = derive_cookie_key("short");
        let c = derive_cookie_key("different");
        assert_eq!(a.master(), b.master());
        assert_ne!(a.master(), c.master());
    }
}
