use std::collections::HashMap;

use crate::models::{Comment, CommentId, CommentThread};

/// Assemble the two-level thread for a post from its comments in creation
/// order (oldest first). Top-level comments come back newest first, each
/// with its replies oldest first. Replies whose target is not a top-level
/// comment of the same post are dropped.
pub fn assemble_threads(comments: Vec<Comment>) -> Vec<CommentThread> {
    let mut top_level = Vec::new();
    let mut replies: HashMap<CommentId, Vec<Comment>> = HashMap::new();

    for comment in comments {
        match comment.replied_to {
            None => top_level.push(comment),
            Some(parent) => replies.entry(parent).or_default().push(comment),
        }
    }

    top_level
        .into_iter()
        .rev()
        .map(|comment| {
            let replies = replies
                .remove(&comment.id)
                .unwrap_or_default()
                .into_iter()
                .filter(|reply| reply.post_id == comment.post_id)
                .collect();
            CommentThread { comment, replies }
        })
        .collect()
}
