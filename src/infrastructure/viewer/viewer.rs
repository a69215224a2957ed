use crate::error::{AppError, AppResult};
use crate::models::UserId;

/// Request-scoped identity handed to every blog operation.
/// Values come from the identity collaborator and are trusted as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerContext {
    pub user_id: Option<UserId>,
    pub username: Option<String>,
    pub request_id: String,
}

impl ViewerContext {
    pub fn authenticated_user(user_id: UserId, username: String, request_id: String) -> Self {
        ViewerContext {
            user_id: Some(user_id),
            username: Some(username),
            request_id,
        }
    }

    pub fn anonymous(request_id: String) -> Self {
        ViewerContext {
            user_id: None,
            username: None,
            request_id,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// The viewer's id, or `Unauthorized` for anonymous requests
    pub fn require_user(&self) -> AppResult<UserId> {
        self.user_id
            .ok_or_else(|| AppError::Unauthorized("You must be logged in.".to_string()))
    }

    pub fn owns(&self, author_id: UserId) -> bool {
        self.user_id == Some(author_id)
    }
}
