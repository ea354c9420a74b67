pub mod answer_cache;
pub mod context_retrieval;
pub mod query_canonicalizer;
pub mod question_ledger;
pub mod resource_tracker;
pub mod session_directory;

pub use answer_cache::AnswerCache;
pub use context_retrieval::ContextRetrieval;
pub use query_canonicalizer::canonicalize;
pub use question_ledger::QuestionLedger;
pub use resource_tracker::ResourceTracker;
pub use session_directory::{validate_draft, SessionDirectory};
