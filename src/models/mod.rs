// Blog records as read from and written to the store

pub mod blog_models;

pub use blog_models::*;
