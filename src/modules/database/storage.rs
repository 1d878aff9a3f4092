use rusqlite::{Connection, ErrorCode};

use crate::error::BlogError;

/// 博客数据库：用户、文章、评论三张表共用一个连接
pub struct BlogDB {
    pub(crate) conn: Connection,
}

impl BlogDB {
    /// 打开（或创建）博客数据库
    pub fn new(db_path: &str) -> Result<Self, BlogError> {
        let conn = Connection::open(db_path)?;
        Self::from_connection(conn)
    }

    /// 内存数据库，用于测试
    pub fn in_memory() -> Result<Self, BlogError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, BlogError> {
        // SQLite 默认不检查外键，每个连接都要打开
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        // 用户表
        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                name TEXT NOT NULL
            )",
            [],
        )?;

        // 文章表
        conn.execute(
            "CREATE TABLE IF NOT EXISTS blog_posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                author_id INTEGER NOT NULL REFERENCES users(id),
                title TEXT NOT NULL UNIQUE,
                subtitle TEXT NOT NULL,
                date TEXT NOT NULL,
                body TEXT NOT NULL,
                img_url TEXT NOT NULL
            )",
            [],
        )?;

        // 评论表，随文章级联删除
        conn.execute(
            "CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id INTEGER NOT NULL REFERENCES blog_posts(id) ON DELETE CASCADE,
                author_id INTEGER NOT NULL REFERENCES users(id),
                text TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id)",
            [],
        )?;

        Ok(Self { conn })
    }
}

/// 是否为唯一约束冲突
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        }
        _ => false,
    }
}
