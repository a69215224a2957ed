// Blog Engine Server

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use blog_engine::{
    app_state::AppState,
    blog_interface::{create_app, API_PREFIX},
    config::Config,
    data_seeder::seed_sample_data,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("blog_engine=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize application state
    let app_state = AppState::new(config.clone()).await?;
    info!("Database ready at {}", config.database.url);

    if config.blog.seed_sample_data {
        seed_sample_data(&app_state).await?;
    }

    let app = create_app(app_state);

    let addr: SocketAddr = config.server_address().parse()?;
    info!("Blog server listening on http://{}", addr);
    info!("  GET    {}/posts?page=N                      - List posts", API_PREFIX);
    info!("  GET    {}/posts/filter_tag?multiple_tags=   - Filter by tags", API_PREFIX);
    info!("  GET    {}/posts/filter_title?title_to_find= - Filter by title", API_PREFIX);
    info!("  GET    {}/posts/{{id}}/detail                 - Post with comments", API_PREFIX);
    info!("  POST   {}/posts/{{id}}/like                   - Toggle like", API_PREFIX);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
