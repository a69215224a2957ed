// ViewerContext middleware and extractor
// Separates identity plumbing from blog logic

pub mod viewer_context_extractor;
pub mod viewer_context_middleware;

pub use viewer_context_extractor::Vc;
pub use viewer_context_middleware::*;
