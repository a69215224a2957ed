// Blog Engine - posts, threaded comments, reactions and topics over SQLite

// Pure blog logic - pagination, tags, filters, threads, image naming
pub mod blog;

// Records exchanged with the store
pub mod models;

// Store interface, SQLite implementation, viewer context and middleware
pub mod infrastructure;

// Post/comment aggregation and topic management
pub mod services;

// HTTP surface and wiring
pub mod app_state;
pub mod blog_interface;
pub mod config;

// Common utilities
pub mod data_seeder;
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};
