use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

use crate::error::BlogError;
use crate::storage::{is_unique_violation, BlogDB};

/// 用户数据结构（不含密码）
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
}

impl User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
        })
    }
}

impl BlogDB {
    /// 写入新用户（密码须已哈希），邮箱已存在时返回 DuplicateEmail
    pub fn insert_user(&self, email: &str, password_hash: &str, name: &str) -> Result<User, BlogError> {
        if self.find_user_by_email(email)?.is_some() {
            return Err(BlogError::DuplicateEmail);
        }

        let inserted = self.conn.execute(
            "INSERT INTO users (email, password, name) VALUES (?, ?, ?)",
            params![email, password_hash, name],
        );

        match inserted {
            Ok(_) => {}
            // 并发注册同一邮箱时由唯一约束兜底
            Err(e) if is_unique_violation(&e) => return Err(BlogError::DuplicateEmail),
            Err(e) => return Err(e.into()),
        }

        Ok(User {
            id: self.conn.last_insert_rowid(),
            email: email.to_string(),
            name: name.to_string(),
        })
    }

    /// 按邮箱取用户及其密码哈希，邮箱不存在时返回 UnknownEmail
    pub fn find_credentials(&self, email: &str) -> Result<(User, String), BlogError> {
        let record = self
            .conn
            .query_row(
                "SELECT id, email, name, password FROM users WHERE email = ?",
                params![email],
                |row| Ok((User::from_row(row)?, row.get::<_, String>(3)?)),
            )
            .optional()?;

        record.ok_or(BlogError::UnknownEmail)
    }

    /// 测试用：以密码 "secret" 注册用户
    #[cfg(test)]
    pub(crate) fn seed_user(&self, email: &str, name: &str) -> User {
        let hash = crate::credentials::hash_password("secret").unwrap();
        self.insert_user(email, &hash, name).unwrap()
    }

    /// 按 ID 获取用户
    pub fn get_user(&self, id: i64) -> Result<Option<User>, BlogError> {
        let user = self
            .conn
            .query_row(
                "SELECT id, email, name FROM users WHERE id = ?",
                params![id],
                User::from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// 按邮箱获取用户
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>, BlogError> {
        let user = self
            .conn
            .query_row(
                "SELECT id, email, name FROM users WHERE email = ?",
                params![email],
                User::from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// 获取所有用户
    pub fn get_all_users(&self) -> Result<Vec<User>, BlogError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, email, name FROM users ORDER BY id")?;
        let users = stmt
            .query_map([], User::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{hash_password, verify_password};

    #[test]
    fn test_insert_and_find_credentials() {
        let db = BlogDB::in_memory().unwrap();
        let user = db.seed_user("ada@example.com", "Ada");
        assert_eq!(user.id, 1);
        assert_eq!(user.name, "Ada");

        let (found, stored_hash) = db.find_credentials("ada@example.com").unwrap();
        assert_eq!(found, user);
        assert!(verify_password("secret", &stored_hash).unwrap());
    }

    #[test]
    fn test_duplicate_email_keeps_single_row() {
        let db = BlogDB::in_memory().unwrap();
        db.seed_user("ada@example.com", "Ada");

        let hash = hash_password("other").unwrap();
        let second = db.insert_user("ada@example.com", &hash, "Impostor");
        assert!(matches!(second, Err(BlogError::DuplicateEmail)));
        assert_eq!(db.get_all_users().unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_email_has_no_credentials() {
        let db = BlogDB::in_memory().unwrap();
        db.seed_user("ada@example.com", "Ada");

        assert!(matches!(
            db.find_credentials("nobody@example.com"),
            Err(BlogError::UnknownEmail)
        ));
    }

    #[test]
    fn test_password_is_not_stored_in_plain_text() {
        let db = BlogDB::in_memory().unwrap();
        db.seed_user("ada@example.com", "Ada");
        let stored: String = db
            .conn
            .query_row("SELECT password FROM users WHERE id = 1", [], |row| row.get(0))
            .unwrap();
        assert_ne!(stored, "secret");
    }

    #[test]
    fn test_get_user() {
        let db = BlogDB::in_memory().unwrap();
        let user = db.seed_user("ada@example.com", "Ada");
        assert_eq!(db.get_user(user.id).unwrap(), Some(user));
        assert_eq!(db.get_user(99).unwrap(), None);
    }
}
