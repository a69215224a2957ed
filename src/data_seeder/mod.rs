use tracing::info;

use crate::{
    app_state::AppState,
    error::AppResult,
    infrastructure::{database::BlogDatabase, viewer::ViewerContext},
    models::User,
    services::PostForm,
};

const SAMPLE_POSTS: &[(&str, &str, &str)] = &[
    ("Introduction to Rust", "Ownership, borrowing and lifetimes in one page.", "#rust #beginners"),
    ("Async web services", "Serving JSON with axum and sqlx.", "#rust #web"),
    ("Why I still write Go", "Goroutines and a small standard library.", "#go"),
];

/// Seed demo users, posts, comments and reactions into an empty store.
/// Returns the number of posts created.
pub async fn seed_sample_data(state: &AppState) -> AppResult<usize> {
    if state.blog.database().count_posts().await? > 0 {
        info!("Store already holds posts, skipping sample data");
        return Ok(0);
    }

    let author = ensure_user(state, "ana").await?;
    let reader = ensure_user(state, "bob").await?;
    let author_vc = viewer_for(&author);
    let reader_vc = viewer_for(&reader);

    for (title, body, tags) in SAMPLE_POSTS {
        let form = PostForm {
            title: title.to_string(),
            body: body.to_string(),
            tags: tags.to_string(),
        };
        let post_id = state.blog.create_post(&author_vc, form, None).await?;

        let comment = state
            .blog
            .add_comment(&reader_vc, post_id, "Great read, thanks!", None)
            .await?;
        state
            .blog
            .add_comment(&author_vc, post_id, "Glad it helped.", Some(comment))
            .await?;
        state.blog.like(&reader_vc, post_id).await?;
    }

    state.topics.create_topic(&author_vc, "Programming").await?;

    info!("Seeded {} sample posts", SAMPLE_POSTS.len());
    Ok(SAMPLE_POSTS.len())
}

async fn ensure_user(state: &AppState, username: &str) -> AppResult<User> {
    match state.blog.database().find_user_by_name(username).await? {
        Some(user) => Ok(user),
        None => state.blog.register_user(username).await,
    }
}

fn viewer_for(user: &User) -> ViewerContext {
    ViewerContext::authenticated_user(user.id, user.username.clone(), format!("seed-{}", user.id))
}
