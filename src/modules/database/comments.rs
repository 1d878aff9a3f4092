use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::error::BlogError;
use crate::storage::BlogDB;

/// 评论数据结构
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub text: String,
}

/// 评论表单
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct CommentForm {
    pub comment_text: String,
}

impl CommentForm {
    pub fn is_valid(&self) -> bool {
        !self.comment_text.trim().is_empty()
    }
}

impl Comment {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Comment {
            id: row.get(0)?,
            post_id: row.get(1)?,
            author_id: row.get(2)?,
            author_name: row.get(3)?,
            text: row.get(4)?,
        })
    }
}

impl BlogDB {
    /// 添加新评论
    pub fn add_comment(&self, post_id: i64, author_id: i64, text: &str) -> Result<Comment, BlogError> {
        self.conn.execute(
            "INSERT INTO comments (post_id, author_id, text) VALUES (?, ?, ?)",
            params![post_id, author_id, text],
        )?;

        let id = self.conn.last_insert_rowid();
        let author_name: String = self.conn.query_row(
            "SELECT name FROM users WHERE id = ?",
            params![author_id],
            |row| row.get(0),
        )?;

        Ok(Comment {
            id,
            post_id,
            author_id,
            author_name,
            text: text.to_string(),
        })
    }

    /// 获取某篇文章的所有评论（按发表顺序）
    pub fn get_comments_by_post(&self, post_id: i64) -> Result<Vec<Comment>, BlogError> {
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.post_id, c.author_id, u.name, c.text
             FROM comments c JOIN users u ON u.id = c.author_id
             WHERE c.post_id = ? ORDER BY c.id",
        )?;

        let comments = stmt
            .query_map(params![post_id], Comment::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(comments)
    }

    /// 评论总数
    pub fn count_comments(&self) -> Result<i64, BlogError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM comments", [], |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posts::PostFields;

    fn setup() -> (BlogDB, i64, i64) {
        let db = BlogDB::in_memory().unwrap();
        let admin = db.seed_user("admin@example.com", "Admin");
        let reader = db.seed_user("reader@example.com", "Reader");
        let post = db
            .create_post(
                &PostFields {
                    title: "Post".to_string(),
                    subtitle: "Sub".to_string(),
                    img_url: "https://example.com/a.png".to_string(),
                    body: "Body".to_string(),
                },
                admin.id,
            )
            .unwrap();
        (db, post.id, reader.id)
    }

    #[test]
    fn test_add_and_list_comments() {
        let (db, post_id, reader_id) = setup();
        db.add_comment(post_id, reader_id, "First!").unwrap();
        db.add_comment(post_id, reader_id, "Second").unwrap();

        let comments = db.get_comments_by_post(post_id).unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].text, "First!");
        assert_eq!(comments[0].author_name, "Reader");
        assert_eq!(comments[1].text, "Second");
    }

    #[test]
    fn test_comment_on_missing_post_fails() {
        let (db, _, reader_id) = setup();
        assert!(db.add_comment(404, reader_id, "Hello?").is_err());
        assert_eq!(db.count_comments().unwrap(), 0);
    }

    #[test]
    fn test_delete_post_cascades_to_comments() {
        let (db, post_id, reader_id) = setup();
        db.add_comment(post_id, reader_id, "One").unwrap();
        db.add_comment(post_id, reader_id, "Two").unwrap();
        assert_eq!(db.count_comments().unwrap(), 2);

        db.delete_post(post_id).unwrap();
        assert_eq!(db.count_comments().unwrap(), 0);
        assert!(db.get_comments_by_post(post_id).unwrap().is_empty());
    }

    #[test]
    fn test_comment_form_validation() {
        assert!(!CommentForm::default().is_valid());
        assert!(CommentForm { comment_text: "hi".to_string() }.is_valid());
    }
}
