// BlogService - post listing, detail aggregation, reactions and comments
// Every operation takes the request's ViewerContext explicitly

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    blog::{
        assemble_threads, extract_tags, validate_tags, ImageStore, ImageUpload, PageRequest,
        PageWindow, PostFilter,
    },
    error::{AppError, AppResult},
    infrastructure::{database::BlogDatabase, viewer::ViewerContext},
    models::{
        CommentId, NewComment, Post, PostDetail, PostId, PostPage, PostRecord, PostSummary,
        ReactionKind, ReactionState, User,
    },
};

/// Fields submitted when creating or editing a post
#[derive(Debug, Clone, Default)]
pub struct PostForm {
    pub title: String,
    pub body: String,
    pub tags: String,
}

impl PostForm {
    fn validate(&self) -> AppResult<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("Title is required.".to_string()));
        }
        if self.body.trim().is_empty() {
            return Err(AppError::Validation("Body is required.".to_string()));
        }
        validate_tags(&self.tags)
    }
}

#[derive(Clone)]
pub struct BlogService {
    db: Arc<dyn BlogDatabase>,
    images: ImageStore,
    posts_per_page: i64,
}

impl BlogService {
    pub fn new(db: Arc<dyn BlogDatabase>, images: ImageStore, posts_per_page: i64) -> Self {
        Self {
            db,
            images,
            posts_per_page,
        }
    }

    pub fn database(&self) -> Arc<dyn BlogDatabase> {
        self.db.clone()
    }

    // === Users ===

    pub async fn register_user(&self, username: &str) -> AppResult<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::Validation("Username is required.".to_string()));
        }
        if self.db.find_user_by_name(username).await?.is_some() {
            return Err(AppError::Validation(format!(
                "User {} is already registered.",
                username
            )));
        }
        let id = self.db.create_user(username).await?;
        info!("Registered user {} ({})", username, id);
        Ok(User {
            id,
            username: username.to_string(),
        })
    }

    // === Listing ===

    /// One page of the listing for a raw `?page=` value
    pub async fn index(&self, raw_page: Option<&str>) -> AppResult<PostPage> {
        let request = PageRequest::parse(raw_page, self.posts_per_page);
        let total = self.db.count_posts().await?;
        let posts = self.list_posts(request.offset, request.per_page).await?;
        Ok(PostPage {
            page: request.page,
            per_page: request.per_page,
            total,
            posts,
            tags: self.tags().await?,
        })
    }

    /// Newest first; `limit` is cut down so the last page holds exactly the
    /// remaining posts.
    pub async fn list_posts(&self, offset: i64, limit: i64) -> AppResult<Vec<PostSummary>> {
        let total = self.db.count_posts().await?;
        let window = PageWindow { offset, limit }.clamp_to(total);
        if window.limit == 0 {
            return Ok(Vec::new());
        }
        self.db.list_posts(&PostFilter::All, Some(window)).await
    }

    /// `None` when the tag query doesn't qualify as a filter
    pub async fn filter_by_tags(&self, multiple_tags: Option<&str>) -> AppResult<Option<Vec<PostSummary>>> {
        match PostFilter::from_tag_query(multiple_tags) {
            Some(filter) => {
                debug!("Filtering posts by {:?}", filter);
                Ok(Some(self.db.list_posts(&filter, None).await?))
            }
            None => Ok(None),
        }
    }

    /// `None` for an empty title search
    pub async fn filter_by_title(&self, title_to_find: Option<&str>) -> AppResult<Option<Vec<PostSummary>>> {
        match PostFilter::from_title_query(title_to_find) {
            Some(filter) => {
                debug!("Filtering posts by {:?}", filter);
                Ok(Some(self.db.list_posts(&filter, None).await?))
            }
            None => Ok(None),
        }
    }

    pub async fn tags(&self) -> AppResult<Vec<String>> {
        let fields = self.db.post_tag_fields().await?;
        Ok(extract_tags(fields))
    }

    // === Single post ===

    pub async fn get_post(&self, vc: &ViewerContext, id: PostId, check_author: bool) -> AppResult<Post> {
        debug!("Getting post {} for {}", id, vc.request_id);
        let post = self
            .db
            .get_post(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post id {} doesn't exist.", id)))?;

        if check_author && !vc.owns(post.author_id) {
            return Err(AppError::Forbidden(format!(
                "Post id {} belongs to another author.",
                id
            )));
        }
        Ok(post)
    }

    pub async fn get_post_detail(&self, vc: &ViewerContext, id: PostId) -> AppResult<PostDetail> {
        let post = self.get_post(vc, id, false).await?;
        let (likes, dislikes) = self.db.reaction_counts(id).await?;
        let comments = assemble_threads(self.db.list_comments(id).await?);
        let image_url = post.image.as_deref().map(|name| self.images.url_for(name));

        Ok(PostDetail {
            post,
            image_url,
            likes,
            dislikes,
            comments,
        })
    }

    // === Post lifecycle ===

    pub async fn create_post(
        &self,
        vc: &ViewerContext,
        form: PostForm,
        image: Option<ImageUpload>,
    ) -> AppResult<PostId> {
        let author_id = vc.require_user()?;
        form.validate()?;

        let mut record = PostRecord {
            title: form.title,
            body: form.body,
            tags: form.tags,
            ..PostRecord::default()
        };
        self.attach_image(&mut record, image).await?;

        let id = self.db.create_post(author_id, &record).await?;
        info!("User {} created post {}", author_id, id);
        Ok(id)
    }

    pub async fn update_post(
        &self,
        vc: &ViewerContext,
        id: PostId,
        form: PostForm,
        image: Option<ImageUpload>,
    ) -> AppResult<()> {
        vc.require_user()?;
        let existing = self.get_post(vc, id, true).await?;
        form.validate()?;

        let mut record = PostRecord {
            title: form.title,
            body: form.body,
            tags: form.tags,
            ..PostRecord::default()
        };
        self.attach_image(&mut record, image).await?;

        self.db.update_post(id, &record).await?;
        info!("Post {} updated by {}", id, vc.request_id);

        if let (Some(old), Some(new)) = (existing.image.as_deref(), record.image.as_deref()) {
            if old != new {
                self.discard_image(old).await;
            }
        }
        Ok(())
    }

    pub async fn delete_post(&self, vc: &ViewerContext, id: PostId) -> AppResult<()> {
        vc.require_user()?;
        let existing = self.get_post(vc, id, true).await?;
        self.db.delete_post(id).await?;
        info!("Post {} deleted by {}", id, vc.request_id);

        if let Some(old) = existing.image.as_deref() {
            self.discard_image(old).await;
        }
        Ok(())
    }

    /// The row change is already committed, so a failed unlink is only logged
    async fn discard_image(&self, file_name: &str) {
        if let Err(err) = self.images.remove(file_name).await {
            warn!("Could not remove image {}: {}", file_name, err);
        }
    }

    /// `ImageStore::save` validates before writing, so a rejected upload
    /// leaves nothing behind
    async fn attach_image(&self, record: &mut PostRecord, image: Option<ImageUpload>) -> AppResult<()> {
        if let Some(upload) = image {
            let stored = self.images.save(&upload).await?;
            record.image = Some(stored.file_name);
            record.icon = stored.inline;
        }
        Ok(())
    }

    // === Reactions ===

    pub async fn toggle_reaction(
        &self,
        vc: &ViewerContext,
        post_id: PostId,
        kind: ReactionKind,
    ) -> AppResult<ReactionState> {
        let user_id = vc.require_user()?;
        self.get_post(vc, post_id, false).await?;
        let state = self.db.toggle_reaction(kind, user_id, post_id).await?;
        info!("User {} {} on post {} is now {:?}", user_id, kind.as_str(), post_id, state);
        Ok(state)
    }

    pub async fn like(&self, vc: &ViewerContext, post_id: PostId) -> AppResult<ReactionState> {
        self.toggle_reaction(vc, post_id, ReactionKind::Like).await
    }

    pub async fn dislike(&self, vc: &ViewerContext, post_id: PostId) -> AppResult<ReactionState> {
        self.toggle_reaction(vc, post_id, ReactionKind::Dislike).await
    }

    // === Comments ===

    /// A `replied_to` of `None` or `Some(0)` creates a top-level comment
    pub async fn add_comment(
        &self,
        vc: &ViewerContext,
        post_id: PostId,
        body: &str,
        replied_to: Option<CommentId>,
    ) -> AppResult<CommentId> {
        let author_id = vc.require_user()?;
        if body.trim().is_empty() {
            return Err(AppError::Validation("Comment body is required.".to_string()));
        }
        self.get_post(vc, post_id, false).await?;

        let replied_to = replied_to.filter(|id| *id != 0);
        if let Some(parent_id) = replied_to {
            let parent = self.db.get_comment(parent_id).await?;
            match parent {
                Some(parent) if parent.post_id == post_id && parent.is_top_level() => {}
                _ => {
                    return Err(AppError::Validation(format!(
                        "Comment {} is not a top-level comment of post {}.",
                        parent_id, post_id
                    )))
                }
            }
        }

        let id = self
            .db
            .create_comment(&NewComment {
                post_id,
                author_id,
                body: body.to_string(),
                replied_to,
            })
            .await?;
        info!("User {} commented {} on post {}", author_id, id, post_id);
        Ok(id)
    }

    /// Only the comment's author may remove it. Returns the post id.
    pub async fn delete_comment(&self, vc: &ViewerContext, comment_id: CommentId) -> AppResult<PostId> {
        vc.require_user()?;
        let comment = self
            .db
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment id {} doesn't exist.", comment_id)))?;

        if !vc.owns(comment.author_id) {
            return Err(AppError::Forbidden(format!(
                "Comment id {} belongs to another user.",
                comment_id
            )));
        }

        self.db.delete_comment(comment_id).await?;
        info!("Comment {} on post {} deleted by {}", comment_id, comment.post_id, vc.request_id);
        Ok(comment.post_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sqlite_database::SqliteDatabase;
    use tempfile::tempdir;

    async fn service() -> (BlogService, ViewerContext, ViewerContext) {
        let db = Arc::new(SqliteDatabase::new_in_memory().await.unwrap());
        let images = ImageStore::new(
            std::env::temp_dir().join("blog_engine_unused"),
            "static/post_images",
            vec!["png".to_string()],
            false,
        );
        let service = BlogService::new(db, images, 3);
        let ana = service.register_user("ana").await.unwrap();
        let bob = service.register_user("bob").await.unwrap();
        (
            service,
            ViewerContext::authenticated_user(ana.id, ana.username, "req-ana".into()),
            ViewerContext::authenticated_user(bob.id, bob.username, "req-bob".into()),
        )
    }

    fn form(title: &str, tags: &str) -> PostForm {
        PostForm {
            title: title.to_string(),
            body: "Lorem ipsum".to_string(),
            tags: tags.to_string(),
        }
    }

    #[tokio::test]
    async fn test_last_page_returns_remainder() {
        let (service, ana, _) = service().await;
        for i in 0..7 {
            service.create_post(&ana, form(&format!("Post {}", i), ""), None).await.unwrap();
        }

        assert_eq!(service.list_posts(0, 3).await.unwrap().len(), 3);
        assert_eq!(service.list_posts(6, 3).await.unwrap().len(), 1);
        assert!(service.list_posts(9, 3).await.unwrap().is_empty());

        let page = service.index(Some("3")).await.unwrap();
        assert_eq!(page.page, 3);
        assert_eq!(page.total, 7);
        assert_eq!(page.posts.len(), 1);
        assert_eq!(page.posts[0].title, "Post 0");

        let first = service.index(Some("-2")).await.unwrap();
        assert_eq!(first.page, 1);
        assert_eq!(first.posts[0].title, "Post 6");
    }

    #[tokio::test]
    async fn test_get_post_not_found_and_forbidden() {
        let (service, ana, bob) = service().await;
        let id = service.create_post(&ana, form("Mine", ""), None).await.unwrap();

        assert!(matches!(service.get_post(&ana, 999, false).await, Err(AppError::NotFound(_))));
        assert!(matches!(service.get_post(&bob, id, true).await, Err(AppError::Forbidden(_))));
        assert_eq!(service.get_post(&bob, id, false).await.unwrap().username, "ana");
        assert!(service.get_post(&ana, id, true).await.is_ok());

        assert!(matches!(service.delete_post(&bob, id).await, Err(AppError::Forbidden(_))));
        assert!(matches!(
            service.update_post(&bob, id, form("Stolen", ""), None).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_validation_aborts_without_writes() {
        let (service, ana, _) = service().await;

        let missing_title = service.create_post(&ana, form("  ", ""), None).await;
        assert!(matches!(missing_title, Err(AppError::Validation(_))));

        let bad_tags = service.create_post(&ana, form("Title", "rust"), None).await;
        assert!(matches!(bad_tags, Err(AppError::Validation(_))));

        let bad_file = ImageUpload { file_name: "virus.exe".into(), bytes: vec![0] };
        let rejected = service.create_post(&ana, form("Title", ""), Some(bad_file)).await;
        assert!(matches!(rejected, Err(AppError::Validation(_))));

        assert_eq!(service.database().count_posts().await.unwrap(), 0);

        let anonymous = ViewerContext::anonymous("req".into());
        let unauthorized = service.create_post(&anonymous, form("Title", ""), None).await;
        assert!(matches!(unauthorized, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_create_post_with_image() {
        let dir = tempdir().unwrap();
        let db = Arc::new(SqliteDatabase::new_in_memory().await.unwrap());
        let images = ImageStore::new(dir.path(), "static/post_images", vec!["png".to_string()], true);
        let service = BlogService::new(db, images, 10);
        let ana = service.register_user("ana").await.unwrap();
        let vc = ViewerContext::authenticated_user(ana.id, ana.username, "req".into());

        let upload = ImageUpload { file_name: "cat pic.png".into(), bytes: vec![9, 9] };
        let id = service.create_post(&vc, form("Cat", "#cats"), Some(upload)).await.unwrap();

        let detail = service.get_post_detail(&vc, id).await.unwrap();
        let name = detail.post.image.clone().unwrap();
        assert!(name.starts_with("cat_pic_"));
        assert_eq!(detail.post.icon, Some(vec![9, 9]));
        assert_eq!(detail.image_url, Some(format!("/static/post_images/{}", name)));
        assert!(dir.path().join(&name).exists());
    }

    #[tokio::test]
    async fn test_replacing_image_removes_old_file() {
        let dir = tempdir().unwrap();
        let db = Arc::new(SqliteDatabase::new_in_memory().await.unwrap());
        let images = ImageStore::new(dir.path(), "static/post_images", vec!["png".to_string()], false);
        let service = BlogService::new(db, images, 10);
        let ana = service.register_user("ana").await.unwrap();
        let vc = ViewerContext::authenticated_user(ana.id, ana.username, "req".into());

        let first = ImageUpload { file_name: "before.png".into(), bytes: vec![1] };
        let id = service.create_post(&vc, form("Cat", ""), Some(first)).await.unwrap();
        let old_name = service.get_post(&vc, id, false).await.unwrap().image.unwrap();

        // an edit without a new file keeps the current image
        service.update_post(&vc, id, form("Cat v2", ""), None).await.unwrap();
        assert!(dir.path().join(&old_name).exists());

        let second = ImageUpload { file_name: "after.png".into(), bytes: vec![2] };
        service.update_post(&vc, id, form("Cat v3", ""), Some(second)).await.unwrap();
        let new_name = service.get_post(&vc, id, false).await.unwrap().image.unwrap();

        assert!(!dir.path().join(&old_name).exists());
        assert!(dir.path().join(&new_name).exists());

        service.delete_post(&vc, id).await.unwrap();
        assert!(!dir.path().join(&new_name).exists());
    }

    #[tokio::test]
    async fn test_reaction_toggle_pairs() {
        let (service, ana, bob) = service().await;
        let id = service.create_post(&ana, form("Post", ""), None).await.unwrap();

        assert_eq!(service.like(&bob, id).await.unwrap(), ReactionState::Present);
        assert_eq!(service.like(&ana, id).await.unwrap(), ReactionState::Present);
        assert_eq!(service.dislike(&bob, id).await.unwrap(), ReactionState::Present);
        let detail = service.get_post_detail(&bob, id).await.unwrap();
        assert_eq!((detail.likes, detail.dislikes), (2, 1));

        assert_eq!(service.like(&bob, id).await.unwrap(), ReactionState::Absent);
        let listed = service.list_posts(0, 10).await.unwrap();
        assert_eq!((listed[0].likes, listed[0].dislikes), (1, 1));

        assert!(matches!(service.like(&bob, 404).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_comment_thread() {
        let (service, ana, bob) = service().await;
        let post = service.create_post(&ana, form("Post", ""), None).await.unwrap();

        let first = service.add_comment(&bob, post, "first", None).await.unwrap();
        let second = service.add_comment(&ana, post, "second", Some(0)).await.unwrap();
        let reply_a = service.add_comment(&ana, post, "reply a", Some(first)).await.unwrap();
        let reply_b = service.add_comment(&bob, post, "reply b", Some(first)).await.unwrap();

        let nested = service.add_comment(&bob, post, "deeper", Some(reply_a)).await;
        assert!(matches!(nested, Err(AppError::Validation(_))));
        let empty = service.add_comment(&bob, post, "  ", None).await;
        assert!(matches!(empty, Err(AppError::Validation(_))));

        let detail = service.get_post_detail(&bob, post).await.unwrap();
        let top: Vec<_> = detail.comments.iter().map(|t| t.comment.id).collect();
        assert_eq!(top, vec![second, first]);
        let replies: Vec<_> = detail.comments[1].replies.iter().map(|r| r.id).collect();
        assert_eq!(replies, vec![reply_a, reply_b]);
        assert_eq!(detail.comments[1].replies[0].username, "ana");
    }

    #[tokio::test]
    async fn test_uncomment_requires_ownership() {
        let (service, ana, bob) = service().await;
        let post = service.create_post(&ana, form("Post", ""), None).await.unwrap();
        let comment = service.add_comment(&bob, post, "mine", None).await.unwrap();

        assert!(matches!(service.delete_comment(&ana, comment).await, Err(AppError::Forbidden(_))));
        assert_eq!(service.delete_comment(&bob, comment).await.unwrap(), post);
        assert!(matches!(service.delete_comment(&bob, comment).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_filters_and_tags() {
        let (service, ana, _) = service().await;
        service.create_post(&ana, form("Introduction to X", "#go #rust"), None).await.unwrap();
        service.create_post(&ana, form("Second", "#go"), None).await.unwrap();

        assert_eq!(service.tags().await.unwrap(), vec!["#go", "#rust"]);
        assert_eq!(service.filter_by_tags(Some("#go")).await.unwrap().unwrap().len(), 2);
        assert_eq!(service.filter_by_tags(Some("#rust")).await.unwrap().unwrap().len(), 1);
        assert!(service.filter_by_tags(Some("rust")).await.unwrap().is_none());
        assert_eq!(service.filter_by_title(Some("Intro")).await.unwrap().unwrap().len(), 1);
        assert!(service.filter_by_title(Some("")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_register_user_rejects_duplicates() {
        let (service, _, _) = service().await;
        assert!(matches!(service.register_user("ana").await, Err(AppError::Validation(_))));
        assert!(matches!(service.register_user(" ").await, Err(AppError::Validation(_))));
    }
}
