pub mod payload;
pub mod recommendation;
pub mod title_resolver;

// Re-export public types
pub use payload::ModelPayload;
pub use recommendation::RecommendationService;
pub use title_resolver::{FuzzyStrategy, ResolutionStrategy, SubstringStrategy, TitleResolver};
