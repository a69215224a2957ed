pub mod blog_service;
pub mod topic_service;

pub use blog_service::{BlogService, PostForm};
pub use topic_service::TopicService;
