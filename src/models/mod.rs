pub mod answer;
pub mod chunk;
pub mod question;
pub mod resource;
pub mod session;
pub mod timestamp;
pub mod upload;

pub use answer::{Answer, BatchExplanation, SourceRef};
pub use chunk::ChunkHit;
pub use question::{PendingQuestion, PersistedQuestion, Question, QuestionId, PENDING_ID_PREFIX};
pub use resource::{ChunkingSummary, Resource, ResourceStatus};
pub use session::{Session, SessionDraft, MAX_TITLE_LEN};
pub use upload::UploadFile;
