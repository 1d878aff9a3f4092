use chrono::Local;
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::BlogError;
use crate::storage::{is_unique_violation, BlogDB};

/// 文章显示日期格式，例如 "October 18, 2026"
pub const POST_DATE_FORMAT: &str = "%B %d, %Y";

/// 文章数据结构
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub title: String,
    pub subtitle: String,
    pub date: String,
    pub body: String,
    pub img_url: String,
}

/// 文章可编辑字段（新建和编辑表单共用）
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct PostFields {
    pub title: String,
    pub subtitle: String,
    pub img_url: String,
    pub body: String,
}

impl PostFields {
    /// 所有字段必填
    pub fn is_valid(&self) -> bool {
        [&self.title, &self.subtitle, &self.img_url, &self.body]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

impl From<&Post> for PostFields {
    fn from(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            img_url: post.img_url.clone(),
            body: post.body.clone(),
        }
    }
}

const SELECT_POST: &str = "SELECT p.id, p.author_id, u.name, p.title, p.subtitle, p.date, p.body, p.img_url
     FROM blog_posts p JOIN users u ON u.id = p.author_id";

impl Post {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Post {
            id: row.get(0)?,
            author_id: row.get(1)?,
            author_name: row.get(2)?,
            title: row.get(3)?,
            subtitle: row.get(4)?,
            date: row.get(5)?,
            body: row.get(6)?,
            img_url: row.get(7)?,
        })
    }
}

fn map_title_conflict(err: rusqlite::Error, title: &str) -> BlogError {
    if is_unique_violation(&err) {
        BlogError::DuplicateTitle(title.to_string())
    } else {
        err.into()
    }
}

impl BlogDB {
    /// 新建文章，日期为当天
    pub fn create_post(&self, fields: &PostFields, author_id: i64) -> Result<Post, BlogError> {
        let date = Local::now().format(POST_DATE_FORMAT).to_string();

        self.conn
            .execute(
                "INSERT INTO blog_posts (author_id, title, subtitle, date, body, img_url)
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    author_id,
                    fields.title,
                    fields.subtitle,
                    date,
                    fields.body,
                    fields.img_url
                ],
            )
            .map_err(|e| map_title_conflict(e, &fields.title))?;

        let id = self.conn.last_insert_rowid();
        self.get_post(id)?
            .ok_or_else(|| BlogError::Internal(format!("post {} vanished after insert", id)))
    }

    /// 获取文章
    pub fn get_post(&self, id: i64) -> Result<Option<Post>, BlogError> {
        let post = self
            .conn
            .query_row(
                &format!("{} WHERE p.id = ?", SELECT_POST),
                params![id],
                Post::from_row,
            )
            .optional()?;
        Ok(post)
    }

    /// 获取所有文章（按存储顺序）
    pub fn get_all_posts(&self) -> Result<Vec<Post>, BlogError> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY p.id", SELECT_POST))?;
        let posts = stmt
            .query_map([], Post::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    /// 覆盖更新文章字段，作者和日期保持不变
    pub fn update_post(&self, id: i64, fields: &PostFields) -> Result<bool, BlogError> {
        let rows = self
            .conn
            .execute(
                "UPDATE blog_posts SET title = ?, subtitle = ?, body = ?, img_url = ? WHERE id = ?",
                params![fields.title, fields.subtitle, fields.body, fields.img_url, id],
            )
            .map_err(|e| map_title_conflict(e, &fields.title))?;
        Ok(rows > 0)
    }

    /// 删除文章，评论由外键级联删除
    pub fn delete_post(&self, id: i64) -> Result<bool, BlogError> {
        let rows = self
            .conn
            .execute("DELETE FROM blog_posts WHERE id = ?", params![id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fields(title: &str) -> PostFields {
        PostFields {
            title: title.to_string(),
            subtitle: "A subtitle".to_string(),
            img_url: "https://images.example.com/cover.jpg".to_string(),
            body: "<p>Hello world</p>".to_string(),
        }
    }

    fn db_with_author() -> (BlogDB, i64) {
        let db = BlogDB::in_memory().unwrap();
        let user = db.seed_user("admin@example.com", "Admin");
        (db, user.id)
    }

    #[test]
    fn test_create_and_read_back() {
        let (db, author_id) = db_with_author();
        let created = db.create_post(&sample_fields("First"), author_id).unwrap();

        let post = db.get_post(created.id).unwrap().unwrap();
        assert_eq!(post.title, "First");
        assert_eq!(post.subtitle, "A subtitle");
        assert_eq!(post.body, "<p>Hello world</p>");
        assert_eq!(post.img_url, "https://images.example.com/cover.jpg");
        assert_eq!(post.author_id, author_id);
        assert_eq!(post.author_name, "Admin");
    }

    #[test]
    fn test_date_is_stamped_with_today() {
        let (db, author_id) = db_with_author();
        let post = db.create_post(&sample_fields("Dated"), author_id).unwrap();
        assert_eq!(post.date, Local::now().format(POST_DATE_FORMAT).to_string());
    }

    #[test]
    fn test_duplicate_title() {
        let (db, author_id) = db_with_author();
        db.create_post(&sample_fields("Same"), author_id).unwrap();
        let second = db.create_post(&sample_fields("Same"), author_id);
        assert!(matches!(second, Err(BlogError::DuplicateTitle(t)) if t == "Same"));
        assert_eq!(db.get_all_posts().unwrap().len(), 1);
    }

    #[test]
    fn test_post_requires_existing_author() {
        let db = BlogDB::in_memory().unwrap();
        assert!(db.create_post(&sample_fields("Orphan"), 7).is_err());
    }

    #[test]
    fn test_list_in_storage_order() {
        let (db, author_id) = db_with_author();
        for title in ["b", "a", "c"] {
            db.create_post(&sample_fields(title), author_id).unwrap();
        }
        let titles: Vec<String> = db.get_all_posts().unwrap().into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_update_overwrites_fields() {
        let (db, author_id) = db_with_author();
        let post = db.create_post(&sample_fields("Old"), author_id).unwrap();

        let mut fields = sample_fields("New");
        fields.body = "Updated body".to_string();
        assert!(db.update_post(post.id, &fields).unwrap());

        let updated = db.get_post(post.id).unwrap().unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(updated.body, "Updated body");
        assert_eq!(updated.date, post.date);
        assert_eq!(updated.author_id, author_id);

        assert!(!db.update_post(999, &fields).unwrap());
    }

    #[test]
    fn test_delete_post() {
        let (db, author_id) = db_with_author();
        let post = db.create_post(&sample_fields("Doomed"), author_id).unwrap();
        assert!(db.delete_post(post.id).unwrap());
        assert!(db.get_post(post.id).unwrap().is_none());
        assert!(!db.delete_post(post.id).unwrap());
    }

    #[test]
    fn test_fields_validation() {
        assert!(sample_fields("Ok").is_valid());
        let mut fields = sample_fields("Ok");
        fields.img_url = "   ".to_string();
        assert!(!fields.is_valid());
    }
}
