use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    error::{AppError, AppResult},
    infrastructure::{database::BlogDatabase, viewer::ViewerContext},
    models::{Topic, TopicId},
};

/// Author-owned topic labels
#[derive(Clone)]
pub struct TopicService {
    db: Arc<dyn BlogDatabase>,
}

impl TopicService {
    pub fn new(db: Arc<dyn BlogDatabase>) -> Self {
        Self { db }
    }

    pub async fn list_topics(&self) -> AppResult<Vec<Topic>> {
        self.db.list_topics().await
    }

    pub async fn topic_names(&self) -> AppResult<Vec<String>> {
        Ok(self
            .db
            .list_topics()
            .await?
            .into_iter()
            .map(|topic| topic.name)
            .collect())
    }

    pub async fn get_topic(&self, vc: &ViewerContext, id: TopicId, check_author: bool) -> AppResult<Topic> {
        debug!("Getting information of topic id: {}", id);
        let topic = self
            .db
            .get_topic(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Topic id {} doesn't exist.", id)))?;

        if check_author && !vc.owns(topic.author_id) {
            return Err(AppError::Forbidden(format!(
                "Topic id {} belongs to another author.",
                id
            )));
        }
        Ok(topic)
    }

    pub async fn create_topic(&self, vc: &ViewerContext, name: &str) -> AppResult<Topic> {
        let author_id = vc.require_user()?;
        let name = validate_name(name)?;
        let id = self.db.create_topic(author_id, name).await?;
        info!("User {} created topic {}", author_id, id);
        Ok(Topic {
            id,
            name: name.to_string(),
            author_id,
        })
    }

    pub async fn update_topic(&self, vc: &ViewerContext, id: TopicId, name: &str) -> AppResult<Topic> {
        vc.require_user()?;
        let mut topic = self.get_topic(vc, id, true).await?;
        let name = validate_name(name)?;
        self.db.update_topic(id, name).await?;
        topic.name = name.to_string();
        Ok(topic)
    }

    pub async fn delete_topic(&self, vc: &ViewerContext, id: TopicId) -> AppResult<()> {
        vc.require_user()?;
        info!("Deleting the topic id {}", id);
        self.get_topic(vc, id, true).await?;
        self.db.delete_topic(id).await?;
        Ok(())
    }
}

fn validate_name(name: &str) -> AppResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Name is required.".to_string()));
    }
    Ok(name)
}
