//! 协作方接口
//!
//! 会话/问题/课件的持久化、文本提取与切片、检索排序和讲解生成都在服务端，
//! 本地核心只通过这个 trait 调用它们。

use async_trait::async_trait;

use crate::error::ApiResult;
use crate::models::{
    Answer, BatchExplanation, ChunkHit, ChunkingSummary, PersistedQuestion, Resource, Session,
    SessionDraft, UploadFile,
};

#[async_trait]
pub trait CompanionApi: Send + Sync {
    /// 列出所有会话
    async fn list_sessions(&self) -> ApiResult<Vec<Session>>;

    /// 创建会话
    async fn create_session(&self, draft: &SessionDraft) -> ApiResult<Session>;

    /// 按 `order_index` 升序列出会话中的问题
    async fn list_questions(&self, session_id: &str) -> ApiResult<Vec<PersistedQuestion>>;

    /// 保存一个问题
    async fn create_question(&self, session_id: &str, text: &str) -> ApiResult<PersistedQuestion>;

    /// 列出会话中的课件（最新的在前）
    async fn list_resources(&self, session_id: &str) -> ApiResult<Vec<Resource>>;

    /// 上传课件，返回新建的课件记录
    async fn upload_resources(
        &self,
        session_id: &str,
        files: &[UploadFile],
    ) -> ApiResult<Vec<Resource>>;

    /// 对已提取的课件触发切片
    async fn trigger_chunking(&self, session_id: &str) -> ApiResult<ChunkingSummary>;

    /// 检索课件片段
    async fn search_chunks(
        &self,
        session_id: &str,
        query: &str,
        limit: usize,
    ) -> ApiResult<Vec<ChunkHit>>;

    /// 讲解单个问题，`force` 为真时忽略服务端已保存的讲解重新生成
    async fn explain(&self, question_id: &str, force: bool) -> ApiResult<Answer>;

    /// 列出会话中已保存的讲解
    async fn list_answers(&self, session_id: &str) -> ApiResult<Vec<Answer>>;

    /// 批量讲解：`force` 为假时只处理还没有讲解的问题
    async fn explain_all(&self, session_id: &str, force: bool) -> ApiResult<BatchExplanation>;
}
