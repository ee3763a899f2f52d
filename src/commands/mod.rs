pub mod answers;
pub mod listings;
pub mod relevance;
