use base64::Engine;
use serde::{Deserialize, Serialize, Serializer};

pub type UserId = i64;
pub type PostId = i64;
pub type CommentId = i64;
pub type TopicId = i64;

/// Milliseconds since the unix epoch
pub type Timestamp = i64;

pub fn current_time_millis() -> Timestamp {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

/// One row of the post listing, with correlated reaction counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: PostId,
    pub title: String,
    pub tags: String,
    pub created: Timestamp,
    pub author_id: UserId,
    pub username: String,
    pub image: Option<String>,
    pub likes: i64,
    pub dislikes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub body: String,
    pub tags: String,
    pub created: Timestamp,
    pub author_id: UserId,
    pub username: String,
    pub image: Option<String>,
    #[serde(serialize_with = "serialize_icon", skip_deserializing)]
    pub icon: Option<Vec<u8>>,
}

fn serialize_icon<S: Serializer>(icon: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
    match icon {
        Some(bytes) => serializer
            .serialize_some(&base64::engine::general_purpose::STANDARD.encode(bytes)),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub username: String,
    pub body: String,
    pub created: Timestamp,
    pub replied_to: Option<CommentId>,
}

impl Comment {
    pub fn is_top_level(&self) -> bool {
        self.replied_to.is_none()
    }
}

/// A top-level comment with its replies, oldest reply first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostDetail {
    pub post: Post,
    pub image_url: Option<String>,
    pub likes: i64,
    pub dislikes: i64,
    pub comments: Vec<CommentThread>,
}

/// One page of the post listing plus the tag cloud.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostPage {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub posts: Vec<PostSummary>,
    pub tags: Vec<String>,
}

/// Fields written on post create and update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostRecord {
    pub title: String,
    pub body: String,
    pub tags: String,
    pub image: Option<String>,
    pub icon: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewComment {
    pub post_id: PostId,
    pub author_id: UserId,
    pub body: String,
    pub replied_to: Option<CommentId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    pub name: String,
    pub author_id: UserId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Dislike,
}

impl ReactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Dislike => "dislike",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            ReactionKind::Like => "likes",
            ReactionKind::Dislike => "dislikes",
        }
    }
}

/// Whether a (user, post) reaction row exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionState {
    Absent,
    Present,
}

impl ReactionState {
    pub fn toggled(self) -> Self {
        match self {
            ReactionState::Absent => ReactionState::Present,
            ReactionState::Present => ReactionState::Absent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reaction_state_flips() {
        assert_eq!(ReactionState::Absent.toggled(), ReactionState::Present);
        assert_eq!(ReactionState::Absent.toggled().toggled(), ReactionState::Absent);
    }

    #[test]
    fn test_icon_serializes_as_base64() {
        let post = Post {
            id: 1,
            title: "t".into(),
            body: "b".into(),
            tags: String::new(),
            created: 0,
            author_id: 1,
            username: "ana".into(),
            image: Some("cat_1.png".into()),
            icon: Some(vec![1, 2, 3]),
        };
        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(value["icon"], "AQID");
        assert_eq!(value["image"], "cat_1.png");
    }
}
