pub mod ingest_pipeline;
pub mod session_ctx;

pub use ingest_pipeline::{IngestPipeline, IngestReport, IngestStage, IngestWarning};
pub use session_ctx::SessionCtx;
