use std::sync::Arc;

use crate::{
    blog::ImageStore,
    config::Config,
    error::AppResult,
    infrastructure::{database::BlogDatabase, sqlite_database::SqliteDatabase},
    services::{BlogService, TopicService},
};

#[derive(Clone)]
pub struct AppState {
    pub blog: BlogService,
    pub topics: TopicService,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let database = SqliteDatabase::connect(&config.database.url).await?;
        Ok(Self::with_database(Arc::new(database), config))
    }

    /// Build the services over an already initialized store
    pub fn with_database(database: Arc<dyn BlogDatabase>, config: Config) -> Self {
        let images = ImageStore::from_config(&config.blog);
        let blog = BlogService::new(database.clone(), images, config.blog.posts_per_page);
        let topics = TopicService::new(database);

        Self {
            blog,
            topics,
            config,
        }
    }
}
