// Database Interface - Low-level data access for the blog
// Implementations translate each call into parameterized SQL

use async_trait::async_trait;

use crate::blog::{PageWindow, PostFilter};
use crate::error::AppResult;
use crate::models::{
    Comment, CommentId, NewComment, Post, PostId, PostRecord, PostSummary, ReactionKind,
    ReactionState, Topic, TopicId, User, UserId,
};

/// Store interface used by the blog services.
/// Every write commits before the call returns.
#[async_trait]
pub trait BlogDatabase: Send + Sync {
    // Users
    async fn create_user(&self, username: &str) -> AppResult<UserId>;
    async fn find_user_by_name(&self, username: &str) -> AppResult<Option<User>>;

    // Posts
    async fn count_posts(&self) -> AppResult<i64>;
    /// Listing ordered newest first, with like/dislike counts per post
    async fn list_posts(
        &self,
        filter: &PostFilter,
        window: Option<PageWindow>,
    ) -> AppResult<Vec<PostSummary>>;
    async fn get_post(&self, id: PostId) -> AppResult<Option<Post>>;
    async fn post_tag_fields(&self) -> AppResult<Vec<String>>;
    async fn create_post(&self, author_id: UserId, record: &PostRecord) -> AppResult<PostId>;
    /// Keeps the current image when `record.image` is `None`
    async fn update_post(&self, id: PostId, record: &PostRecord) -> AppResult<()>;
    /// Removes the post together with its comments and reactions
    async fn delete_post(&self, id: PostId) -> AppResult<bool>;

    // Reactions
    async fn reaction_counts(&self, post_id: PostId) -> AppResult<(i64, i64)>;
    async fn reaction_state(
        &self,
        kind: ReactionKind,
        user_id: UserId,
        post_id: PostId,
    ) -> AppResult<ReactionState>;
    /// Atomically flip the (user, post) row and return the new state
    async fn toggle_reaction(
        &self,
        kind: ReactionKind,
        user_id: UserId,
        post_id: PostId,
    ) -> AppResult<ReactionState>;

    // Comments
    /// All comments of a post, oldest first
    async fn list_comments(&self, post_id: PostId) -> AppResult<Vec<Comment>>;
    async fn get_comment(&self, id: CommentId) -> AppResult<Option<Comment>>;
    async fn create_comment(&self, comment: &NewComment) -> AppResult<CommentId>;
    /// Removes the comment and any replies to it
    async fn delete_comment(&self, id: CommentId) -> AppResult<bool>;

    // Topics
    async fn list_topics(&self) -> AppResult<Vec<Topic>>;
    async fn get_topic(&self, id: TopicId) -> AppResult<Option<Topic>>;
    async fn create_topic(&self, author_id: UserId, name: &str) -> AppResult<TopicId>;
    async fn update_topic(&self, id: TopicId, name: &str) -> AppResult<()>;
    async fn delete_topic(&self, id: TopicId) -> AppResult<bool>;
}
