// Infrastructure - store access and request identity
pub mod database;         // Store interface
pub mod middleware;       // ViewerContext middleware and extractor
pub mod sqlite_database;  // SQLite implementation
pub mod viewer;           // Viewer context

pub use database::BlogDatabase;
pub use sqlite_database::SqliteDatabase;
pub use viewer::ViewerContext;
