// Pure blog logic - pagination, tags, filters, threads and image naming

pub mod images;
pub mod pagination;
pub mod query_composer;
pub mod tags;
pub mod threads;

pub use images::{ImageStore, ImageUpload, StoredImage};
pub use pagination::{PageRequest, PageWindow};
pub use query_composer::PostFilter;
pub use tags::{extract_tags, split_tags, validate_tags};
pub use threads::assemble_threads;
