use async_trait::async_trait;
use sqlx::{
    sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow},
    QueryBuilder, Row,
};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::blog::{PageWindow, PostFilter};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::BlogDatabase;
use crate::models::{
    current_time_millis, Comment, CommentId, NewComment, Post, PostId, PostRecord, PostSummary,
    ReactionKind, ReactionState, Topic, TopicId, User, UserId,
};

const POST_LISTING_SELECT: &str = r#"
    SELECT p.id, p.title, p.tags, p.created, p.author_id, u.username, p.image,
        (SELECT COUNT(1) FROM likes WHERE post_id = p.id) AS likes,
        (SELECT COUNT(1) FROM dislikes WHERE post_id = p.id) AS dislikes
    FROM post p
    JOIN user u ON p.author_id = u.id"#;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS user (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT UNIQUE NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS post (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        author_id INTEGER NOT NULL REFERENCES user (id),
        created INTEGER NOT NULL,
        title TEXT NOT NULL,
        body TEXT NOT NULL,
        tags TEXT NOT NULL DEFAULT '',
        image TEXT,
        icon BLOB
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS comments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        author_id INTEGER NOT NULL REFERENCES user (id),
        post_id INTEGER NOT NULL REFERENCES post (id) ON DELETE CASCADE,
        body TEXT NOT NULL,
        created INTEGER NOT NULL,
        replied_to INTEGER REFERENCES comments (id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS likes (
        author_id INTEGER NOT NULL REFERENCES user (id),
        post_id INTEGER NOT NULL REFERENCES post (id) ON DELETE CASCADE,
        PRIMARY KEY (author_id, post_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS dislikes (
        author_id INTEGER NOT NULL REFERENCES user (id),
        post_id INTEGER NOT NULL REFERENCES post (id) ON DELETE CASCADE,
        PRIMARY KEY (author_id, post_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS topics (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        author_id INTEGER NOT NULL REFERENCES user (id),
        name TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_post_created ON post(created DESC)",
    "CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id, created)",
];

/// SQLite implementation of the blog store
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Connect to a database URL such as `sqlite:data/blog.db`, creating the
    /// file and the schema when missing.
    pub async fn connect(database_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| {
                AppError::ConfigurationError(format!("Invalid database URL {}: {}", database_url, e))
            })?
            .create_if_missing(true)
            .foreign_keys(true);

        if let Some(parent) = database_file(database_url).and_then(Path::parent) {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to connect to {}: {}", database_url, e))
            })?;

        let db = Self { pool };
        db.initialize().await?;
        Ok(db)
    }

    /// Single-connection in-memory database, used by tests and demos
    pub async fn new_in_memory() -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to connect to in-memory SQLite: {}", e))
            })?;

        let db = Self { pool };
        db.initialize().await?;
        Ok(db)
    }

    /// Create blog tables and indexes
    pub async fn initialize(&self) -> AppResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to create schema: {}", e)))?;
        }
        Ok(())
    }
}

/// File path of an on-disk SQLite URL, `None` for in-memory databases
fn database_file(database_url: &str) -> Option<&Path> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(":memory:") {
        None
    } else {
        Some(Path::new(path))
    }
}

fn post_summary_from_row(row: &SqliteRow) -> PostSummary {
    PostSummary {
        id: row.get("id"),
        title: row.get("title"),
        tags: row.get("tags"),
        created: row.get("created"),
        author_id: row.get("author_id"),
        username: row.get("username"),
        image: row.get("image"),
        likes: row.get("likes"),
        dislikes: row.get("dislikes"),
    }
}

fn comment_from_row(row: &SqliteRow) -> Comment {
    Comment {
        id: row.get("id"),
        post_id: row.get("post_id"),
        author_id: row.get("author_id"),
        username: row.get("username"),
        body: row.get("body"),
        created: row.get("created"),
        replied_to: row.get("replied_to"),
    }
}

fn topic_from_row(row: &SqliteRow) -> Topic {
    Topic {
        id: row.get("id"),
        name: row.get("name"),
        author_id: row.get("author_id"),
    }
}

#[async_trait]
impl BlogDatabase for SqliteDatabase {
    async fn create_user(&self, username: &str) -> AppResult<UserId> {
        let result = sqlx::query("INSERT INTO user (username) VALUES (?)")
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to create user {}: {}", username, e)))?;
        Ok(result.last_insert_rowid())
    }

    async fn find_user_by_name(&self, username: &str) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT id, username FROM user WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to find user {}: {}", username, e)))?;
        Ok(row.map(|row| User {
            id: row.get("id"),
            username: row.get("username"),
        }))
    }

    async fn count_posts(&self) -> AppResult<i64> {
        let row = sqlx::query("SELECT COUNT(1) AS amount FROM post")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to count posts: {}", e)))?;
        Ok(row.get("amount"))
    }

    async fn list_posts(
        &self,
        filter: &PostFilter,
        window: Option<PageWindow>,
    ) -> AppResult<Vec<PostSummary>> {
        let mut qb = QueryBuilder::<Sqlite>::new(POST_LISTING_SELECT);
        filter.push_predicate(&mut qb);
        qb.push(" ORDER BY p.created DESC, p.id DESC");

        if let Some(window) = window {
            qb.push(" LIMIT ");
            qb.push_bind(window.limit);
            qb.push(" OFFSET ");
            qb.push_bind(window.offset);
        }

        debug!("Listing posts with {:?} {:?}", filter, window);
        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list posts: {}", e)))?;

        Ok(rows.iter().map(post_summary_from_row).collect())
    }

    async fn get_post(&self, id: PostId) -> AppResult<Option<Post>> {
        let row = sqlx::query(
            r#"
            SELECT p.id, p.title, p.body, p.tags, p.created, p.author_id, u.username, p.image, p.icon
            FROM post p
            JOIN user u ON p.author_id = u.id
            WHERE p.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to get post {}: {}", id, e)))?;

        Ok(row.map(|row| Post {
            id: row.get("id"),
            title: row.get("title"),
            body: row.get("body"),
            tags: row.get("tags"),
            created: row.get("created"),
            author_id: row.get("author_id"),
            username: row.get("username"),
            image: row.get("image"),
            icon: row.get("icon"),
        }))
    }

    async fn post_tag_fields(&self) -> AppResult<Vec<String>> {
        let rows = sqlx::query("SELECT tags FROM post")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to read post tags: {}", e)))?;
        Ok(rows.iter().map(|row| row.get("tags")).collect())
    }

    async fn create_post(&self, author_id: UserId, record: &PostRecord) -> AppResult<PostId> {
        let result = sqlx::query(
            "INSERT INTO post (title, body, author_id, tags, created, image, icon) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.title)
        .bind(&record.body)
        .bind(author_id)
        .bind(&record.tags)
        .bind(current_time_millis())
        .bind(&record.image)
        .bind(&record.icon)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create post: {}", e)))?;
        Ok(result.last_insert_rowid())
    }

    async fn update_post(&self, id: PostId, record: &PostRecord) -> AppResult<()> {
        let result = if record.image.is_some() {
            sqlx::query(
                "UPDATE post SET title = ?, body = ?, tags = ?, image = ?, icon = ? WHERE id = ?",
            )
            .bind(&record.title)
            .bind(&record.body)
            .bind(&record.tags)
            .bind(&record.image)
            .bind(&record.icon)
            .bind(id)
            .execute(&self.pool)
            .await
        } else {
            sqlx::query("UPDATE post SET title = ?, body = ?, tags = ? WHERE id = ?")
                .bind(&record.title)
                .bind(&record.body)
                .bind(&record.tags)
                .bind(id)
                .execute(&self.pool)
                .await
        }
        .map_err(|e| AppError::DatabaseError(format!("Failed to update post {}: {}", id, e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Post id {} doesn't exist.", id)));
        }
        Ok(())
    }

    async fn delete_post(&self, id: PostId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM post WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete post {}: {}", id, e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn reaction_counts(&self, post_id: PostId) -> AppResult<(i64, i64)> {
        let row = sqlx::query(
            r#"
            SELECT (SELECT COUNT(1) FROM likes WHERE post_id = ?) AS likes,
                   (SELECT COUNT(1) FROM dislikes WHERE post_id = ?) AS dislikes
            "#,
        )
        .bind(post_id)
        .bind(post_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to count reactions of post {}: {}", post_id, e))
        })?;
        Ok((row.get("likes"), row.get("dislikes")))
    }

    async fn reaction_state(
        &self,
        kind: ReactionKind,
        user_id: UserId,
        post_id: PostId,
    ) -> AppResult<ReactionState> {
        let sql = format!("SELECT 1 FROM {} WHERE author_id = ? AND post_id = ?", kind.table());
        let row = sqlx::query(&sql)
            .bind(user_id)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to read {}: {}", kind.as_str(), e)))?;
        Ok(if row.is_some() {
            ReactionState::Present
        } else {
            ReactionState::Absent
        })
    }

    async fn toggle_reaction(
        &self,
        kind: ReactionKind,
        user_id: UserId,
        post_id: PostId,
    ) -> AppResult<ReactionState> {
        // The DELETE takes the write lock, so the insert below cannot race
        // another toggle of the same row.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to begin transaction: {}", e)))?;

        let delete_sql = format!("DELETE FROM {} WHERE author_id = ? AND post_id = ?", kind.table());
        let deleted = sqlx::query(&delete_sql)
            .bind(user_id)
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to remove {}: {}", kind.as_str(), e)))?;

        let previous = if deleted.rows_affected() > 0 {
            ReactionState::Present
        } else {
            ReactionState::Absent
        };
        let state = previous.toggled();
        if state == ReactionState::Present {
            let insert_sql = format!("INSERT INTO {} (author_id, post_id) VALUES (?, ?)", kind.table());
            sqlx::query(&insert_sql)
                .bind(user_id)
                .bind(post_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to add {}: {}", kind.as_str(), e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to commit transaction: {}", e)))?;
        Ok(state)
    }

    async fn list_comments(&self, post_id: PostId) -> AppResult<Vec<Comment>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.post_id, c.author_id, u.username, c.body, c.created, c.replied_to
            FROM comments c
            JOIN user u ON c.author_id = u.id
            WHERE c.post_id = ?
            ORDER BY c.created ASC, c.id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to list comments of post {}: {}", post_id, e))
        })?;
        Ok(rows.iter().map(comment_from_row).collect())
    }

    async fn get_comment(&self, id: CommentId) -> AppResult<Option<Comment>> {
        let row = sqlx::query(
            r#"
            SELECT c.id, c.post_id, c.author_id, u.username, c.body, c.created, c.replied_to
            FROM comments c
            JOIN user u ON c.author_id = u.id
            WHERE c.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to get comment {}: {}", id, e)))?;
        Ok(row.as_ref().map(comment_from_row))
    }

    async fn create_comment(&self, comment: &NewComment) -> AppResult<CommentId> {
        let result = sqlx::query(
            "INSERT INTO comments (author_id, post_id, body, created, replied_to) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(comment.author_id)
        .bind(comment.post_id)
        .bind(&comment.body)
        .bind(current_time_millis())
        .bind(comment.replied_to)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create comment: {}", e)))?;
        Ok(result.last_insert_rowid())
    }

    async fn delete_comment(&self, id: CommentId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete comment {}: {}", id, e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_topics(&self) -> AppResult<Vec<Topic>> {
        let rows = sqlx::query("SELECT id, name, author_id FROM topics ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list topics: {}", e)))?;
        Ok(rows.iter().map(topic_from_row).collect())
    }

    async fn get_topic(&self, id: TopicId) -> AppResult<Option<Topic>> {
        let row = sqlx::query("SELECT id, name, author_id FROM topics WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get topic {}: {}", id, e)))?;
        Ok(row.as_ref().map(topic_from_row))
    }

    async fn create_topic(&self, author_id: UserId, name: &str) -> AppResult<TopicId> {
        let result = sqlx::query("INSERT INTO topics (author_id, name) VALUES (?, ?)")
            .bind(author_id)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to create topic: {}", e)))?;
        Ok(result.last_insert_rowid())
    }

    async fn update_topic(&self, id: TopicId, name: &str) -> AppResult<()> {
        let result = sqlx::query("UPDATE topics SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to update topic {}: {}", id, e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Topic id {} doesn't exist.", id)));
        }
        Ok(())
    }

    async fn delete_topic(&self, id: TopicId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM topics WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete topic {}: {}", id, e)))?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    async fn seeded() -> (SqliteDatabase, UserId) {
        let db = SqliteDatabase::new_in_memory().await.unwrap();
        let user = db.create_user("ana").await.unwrap();
        (db, user)
    }

    fn record(title: &str, tags: &str) -> PostRecord {
        PostRecord {
            title: title.to_string(),
            body: "body".to_string(),
            tags: tags.to_string(),
            ..PostRecord::default()
        }
    }

    #[test]
    fn test_database_file() {
        assert_eq!(database_file("sqlite:data/blog.db"), Some(Path::new("data/blog.db")));
        assert_eq!(database_file("sqlite://blog.db?mode=rwc"), Some(Path::new("blog.db")));
        assert_eq!(database_file("sqlite::memory:"), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_toggles_follow_parity() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("toggle.db").display());
        let db = Arc::new(SqliteDatabase::connect(&url).await.unwrap());
        let user = db.create_user("ana").await.unwrap();
        let post = db.create_post(user, &record("Post", "")).await.unwrap();

        for toggles in [40usize, 41] {
            let handles: Vec<_> = (0..toggles)
                .map(|_| {
                    let db = db.clone();
                    tokio::spawn(async move { db.toggle_reaction(ReactionKind::Like, user, post).await })
                })
                .collect();
            for handle in handles {
                handle.await.unwrap().unwrap();
            }

            let expected = if toggles % 2 == 0 { ReactionState::Absent } else { ReactionState::Present };
            assert_eq!(db.reaction_state(ReactionKind::Like, user, post).await.unwrap(), expected);
            let likes = if expected == ReactionState::Present { 1 } else { 0 };
            assert_eq!(db.reaction_counts(post).await.unwrap(), (likes, 0));
        }
    }

    #[tokio::test]
    async fn test_tag_filter_matches_any_tag() {
        let (db, user) = seeded().await;
        let first = db.create_post(user, &record("First", "#go #rust")).await.unwrap();
        let second = db.create_post(user, &record("Second", "#go")).await.unwrap();

        let go = PostFilter::from_tag_query(Some("#go")).unwrap();
        let ids: Vec<_> = db.list_posts(&go, None).await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![second, first]);

        let rust = PostFilter::from_tag_query(Some("#rust")).unwrap();
        let ids: Vec<_> = db.list_posts(&rust, None).await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![first]);
    }

    #[tokio::test]
    async fn test_title_filter_is_case_insensitive() {
        let (db, user) = seeded().await;
        db.create_post(user, &record("Introduction to X", "")).await.unwrap();
        db.create_post(user, &record("Other", "")).await.unwrap();

        let filter = PostFilter::from_title_query(Some("intro")).unwrap();
        let posts = db.list_posts(&filter, None).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Introduction to X");
        assert_eq!(posts[0].username, "ana");
    }

    #[tokio::test]
    async fn test_hostile_filter_input_is_bound() {
        let (db, user) = seeded().await;
        db.create_post(user, &record("Safe", "#go")).await.unwrap();

        let filter = PostFilter::from_title_query(Some("\" OR 1=1 --")).unwrap();
        assert!(db.list_posts(&filter, None).await.unwrap().is_empty());

        let filter = PostFilter::from_tag_query(Some("#x') OR 1=1 --")).unwrap();
        assert!(db.list_posts(&filter, None).await.unwrap().is_empty());
        assert_eq!(db.count_posts().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_toggle_reaction_flips() {
        let (db, user) = seeded().await;
        let post = db.create_post(user, &record("Post", "")).await.unwrap();

        let state = db.toggle_reaction(ReactionKind::Like, user, post).await.unwrap();
        assert_eq!(state, ReactionState::Present);
        assert_eq!(db.reaction_counts(post).await.unwrap(), (1, 0));

        let state = db.toggle_reaction(ReactionKind::Like, user, post).await.unwrap();
        assert_eq!(state, ReactionState::Absent);
        assert_eq!(
            db.reaction_state(ReactionKind::Like, user, post).await.unwrap(),
            ReactionState::Absent
        );

        db.toggle_reaction(ReactionKind::Dislike, user, post).await.unwrap();
        assert_eq!(db.reaction_counts(post).await.unwrap(), (0, 1));
    }

    #[tokio::test]
    async fn test_delete_post_cascades() {
        let (db, user) = seeded().await;
        let post = db.create_post(user, &record("Post", "")).await.unwrap();
        db.toggle_reaction(ReactionKind::Like, user, post).await.unwrap();
        let parent = db
            .create_comment(&NewComment { post_id: post, author_id: user, body: "hi".into(), replied_to: None })
            .await
            .unwrap();
        db.create_comment(&NewComment { post_id: post, author_id: user, body: "re".into(), replied_to: Some(parent) })
            .await
            .unwrap();

        assert!(db.delete_post(post).await.unwrap());
        assert!(db.list_comments(post).await.unwrap().is_empty());
        assert_eq!(db.reaction_counts(post).await.unwrap(), (0, 0));
        assert!(!db.delete_post(post).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_comment_removes_replies() {
        let (db, user) = seeded().await;
        let post = db.create_post(user, &record("Post", "")).await.unwrap();
        let parent = db
            .create_comment(&NewComment { post_id: post, author_id: user, body: "hi".into(), replied_to: None })
            .await
            .unwrap();
        db.create_comment(&NewComment { post_id: post, author_id: user, body: "re".into(), replied_to: Some(parent) })
            .await
            .unwrap();

        assert!(db.delete_comment(parent).await.unwrap());
        assert!(db.list_comments(post).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_post_keeps_image_unless_replaced() {
        let (db, user) = seeded().await;
        let post = db
            .create_post(user, &PostRecord { image: Some("a_1.png".into()), icon: Some(vec![1]), ..record("Post", "") })
            .await
            .unwrap();

        db.update_post(post, &record("Renamed", "#new")).await.unwrap();
        let stored = db.get_post(post).await.unwrap().unwrap();
        assert_eq!(stored.title, "Renamed");
        assert_eq!(stored.image.as_deref(), Some("a_1.png"));
        assert_eq!(stored.icon, Some(vec![1]));

        let missing = db.update_post(999, &record("x", "")).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_topics_crud() {
        let (db, user) = seeded().await;
        let id = db.create_topic(user, "Rust").await.unwrap();
        db.update_topic(id, "Rust lang").await.unwrap();
        assert_eq!(db.get_topic(id).await.unwrap().unwrap().name, "Rust lang");
        assert_eq!(db.list_topics().await.unwrap().len(), 1);
        assert!(db.delete_topic(id).await.unwrap());
        assert!(db.get_topic(id).await.unwrap().is_none());
    }
}
