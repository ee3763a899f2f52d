pub mod answers;
pub mod applicator;
pub mod cancel;
pub mod config;
pub mod embeddings;
pub mod form;
pub mod llm;
pub mod retry;
pub mod storage;

// Re-export commonly used types
pub use answers::{AnswerCandidate, AnswerResolver, HistoricalAnswer, Provenance};
pub use applicator::{ApplicationSession, ApplyEngine, Collaborators, SessionStatus};
pub use cancel::CancelToken;
pub use config::Config;
pub use storage::{SqliteStorage, Storage};
