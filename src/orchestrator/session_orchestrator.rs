//! 会话编排器 - 编排层
//!
//! ## 职责
//!
//! 驱动一个会话的全部交互，是唯一调用台账/课件/讲解缓存写操作的地方。
//!
//! ## 状态机
//!
//! `Idle → Loading → Ready`，手动刷新时重新进入 `Loading`。
//! 上传、检索、讲解等子操作不受顶层状态影响，各自带有按 key 隔离的加载状态。
//!
//! ## 并发约定
//!
//! - 进入会话时三路加载并发发出，全部结算后才进入 `Ready`
//! - 讲解缓存加载失败静默降级为空缓存；问题/课件加载失败作为 `PartialLoadError` 返回
//! - 同一问题上的检索/讲解以最后发出的为准，过期结果直接丢弃

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clients::CompanionApi;
use crate::config::Config;
use crate::error::{AppResult, PartialLoadError, SessionComponent, ValidationError};
use crate::infrastructure::{RequestGenerations, Settlement};
use crate::models::{
    Answer, BatchExplanation, ChunkHit, PersistedQuestion, Question, QuestionId, Resource,
    UploadFile,
};
use crate::utils::logging::{log_load_report, truncate_text};
use crate::workflow::{IngestPipeline, IngestReport, SessionCtx};

/// 会话顶层状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Loading,
    Ready,
}

/// 进入会话（或刷新）的结果
#[derive(Debug, Default)]
pub struct SessionLoadReport {
    /// 需要提示用户的加载失败
    pub failures: Vec<PartialLoadError>,
    /// 讲解缓存没能加载，沿用加载前的本地缓存（首次进入时为空）
    pub answers_degraded: bool,
}

impl SessionLoadReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && !self.answers_degraded
    }

    pub fn failed(&self, component: SessionComponent) -> bool {
        self.failures.iter().any(|f| f.component == component)
    }
}

#[derive(Debug)]
struct PhaseState {
    phase: SessionPhase,
    refreshes: RequestGenerations<()>,
}

/// 会话编排器
pub struct SessionOrchestrator {
    api: Arc<dyn CompanionApi>,
    ctx: SessionCtx,
    search_limit: usize,
    phase: Mutex<PhaseState>,
}

impl SessionOrchestrator {
    /// 为一个会话创建编排器（尚未加载任何数据）
    pub fn new(api: Arc<dyn CompanionApi>, session_id: impl Into<String>, config: &Config) -> Self {
        Self {
            api,
            ctx: SessionCtx::new(session_id),
            search_limit: config.search_limit,
            phase: Mutex::new(PhaseState {
                phase: SessionPhase::Idle,
                refreshes: RequestGenerations::new(),
            }),
        }
    }

    /// 会话上下文
    pub fn ctx(&self) -> &SessionCtx {
        &self.ctx
    }

    pub fn session_id(&self) -> &str {
        &self.ctx.session_id
    }

    pub async fn phase(&self) -> SessionPhase {
        self.phase.lock().await.phase
    }

    // ========== 进入会话 / 刷新 ==========

    /// 进入会话：并发加载问题、课件和讲解
    ///
    /// 任意一路失败都不会阻塞其它两路。
    pub async fn enter_session(&self) -> SessionLoadReport {
        let refresh = {
            let mut state = self.phase.lock().await;
            state.phase = SessionPhase::Loading;
            state.refreshes.issue(&())
        };
        info!("{} 🔄 正在加载会话...", self.ctx);

        let api = self.api.as_ref();
        let session_id = self.ctx.session_id.as_str();
        let (questions, resources, answers) = tokio::join!(
            self.ctx.ledger.load(api, session_id),
            self.ctx.tracker.load(api, session_id),
            self.ctx.answers.load(api, session_id),
        );

        let mut report = SessionLoadReport::default();
        if let Err(source) = questions {
            report.failures.push(PartialLoadError {
                component: SessionComponent::Questions,
                source,
            });
        }
        if let Err(source) = resources {
            report.failures.push(PartialLoadError {
                component: SessionComponent::Resources,
                source,
            });
        }
        if let Err(e) = answers {
            debug!("{} 讲解缓存加载失败，使用空缓存: {}", self.ctx, e);
            report.answers_degraded = true;
        }

        {
            let mut state = self.phase.lock().await;
            if state.refreshes.is_current(&(), refresh) {
                state.phase = SessionPhase::Ready;
            }
        }

        log_load_report(&self.ctx.session_id, &report);
        report
    }

    /// 手动刷新，与进入会话相同
    pub async fn refresh(&self) -> SessionLoadReport {
        self.enter_session().await
    }

    // ========== 问题 ==========

    /// 提交一个问题（乐观插入）
    pub async fn submit_question(&self, text: &str) -> AppResult<PersistedQuestion> {
        self.ctx
            .ledger
            .submit(self.api.as_ref(), &self.ctx.session_id, text)
            .await
    }

    // ========== 课件 ==========

    /// 上传课件并触发切片
    pub async fn upload_and_ingest(&self, files: Vec<UploadFile>) -> AppResult<IngestReport> {
        IngestPipeline::new(self.api.as_ref(), &self.ctx)
            .run(files)
            .await
    }

    // ========== 检索 ==========

    /// 用用户输入的检索词为某个问题检索上下文
    ///
    /// 未保存的问题没有稳定的 id，直接返回校验错误，不发请求。
    pub async fn search(
        &self,
        question_id: &QuestionId,
        query: &str,
    ) -> AppResult<Settlement<Vec<ChunkHit>>> {
        if question_id.is_pending() {
            return Err(ValidationError::PendingQuestion {
                id: question_id.to_string(),
            }
            .into());
        }
        self.ctx
            .retrieval
            .search(
                self.api.as_ref(),
                &self.ctx.session_id,
                &question_id.to_string(),
                query,
                self.search_limit,
            )
            .await
    }

    /// 用问题本身的内容检索上下文
    pub async fn search_for_question(
        &self,
        question_id: &QuestionId,
    ) -> AppResult<Settlement<Vec<ChunkHit>>> {
        let question = self
            .ctx
            .ledger
            .find(question_id)
            .await
            .ok_or_else(|| ValidationError::UnknownQuestion {
                id: question_id.to_string(),
            })?;
        self.search(question_id, question.text()).await
    }

    // ========== 讲解 ==========

    /// 讲解单个问题，`force` 为真时重新生成
    ///
    /// 未保存的问题直接返回校验错误，不发请求。
    pub async fn explain(
        &self,
        question_id: &QuestionId,
        force: bool,
    ) -> AppResult<Settlement<Answer>> {
        let question = self.resolve_persisted(question_id).await?;
        self.explain_persisted(&question, force).await
    }

    /// 讲解一个已保存的问题
    pub async fn explain_persisted(
        &self,
        question: &PersistedQuestion,
        force: bool,
    ) -> AppResult<Settlement<Answer>> {
        info!(
            "{} 🤖 {}问题 #{}: {}",
            self.ctx,
            if force { "重新生成" } else { "讲解" },
            question.order_index,
            truncate_text(&question.text, 80)
        );
        self.ctx
            .answers
            .explain(self.api.as_ref(), question, force)
            .await
    }

    /// 重新生成单个问题的讲解
    pub async fn regenerate(&self, question_id: &QuestionId) -> AppResult<Settlement<Answer>> {
        self.explain(question_id, true).await
    }

    /// 批量讲解是否可用
    pub async fn can_explain_all(&self) -> bool {
        self.check_explain_all_gate().await.is_ok()
    }

    /// 批量讲解
    ///
    /// 前置条件：至少一份课件已提取、至少一个问题已保存。
    /// 不满足时返回校验错误，不发请求。
    pub async fn explain_all(&self, force: bool) -> AppResult<Settlement<BatchExplanation>> {
        if let Err(e) = self.check_explain_all_gate().await {
            warn!("{} ⚠️ 无法批量讲解: {}", self.ctx, e);
            return Err(e.into());
        }
        self.ctx
            .answers
            .explain_all(self.api.as_ref(), &self.ctx.session_id, force)
            .await
    }

    /// 全部重新生成
    pub async fn regenerate_all(&self) -> AppResult<Settlement<BatchExplanation>> {
        self.explain_all(true).await
    }

    async fn check_explain_all_gate(&self) -> Result<(), ValidationError> {
        if !self.ctx.tracker.has_extracted_material().await {
            return Err(ValidationError::NoExtractedMaterial);
        }
        if self.ctx.ledger.persisted_count().await == 0 {
            return Err(ValidationError::NoPersistedQuestions);
        }
        Ok(())
    }

    async fn resolve_persisted(&self, question_id: &QuestionId) -> AppResult<PersistedQuestion> {
        if question_id.is_pending() {
            return Err(ValidationError::PendingQuestion {
                id: question_id.to_string(),
            }
            .into());
        }
        match self.ctx.ledger.find(question_id).await {
            Some(Question::Persisted(question)) => Ok(question),
            Some(Question::Pending(_)) | None => Err(ValidationError::UnknownQuestion {
                id: question_id.to_string(),
            }
            .into()),
        }
    }

    // ========== 只读视图 ==========

    pub async fn questions(&self) -> Vec<Question> {
        self.ctx.ledger.snapshot().await
    }

    pub async fn resources(&self) -> Vec<Resource> {
        self.ctx.tracker.snapshot().await
    }

    pub async fn answers(&self) -> HashMap<String, Answer> {
        self.ctx.answers.snapshot().await
    }

    pub async fn answer(&self, question_id: &QuestionId) -> Option<Answer> {
        self.ctx.answers.get(&question_id.to_string()).await
    }

    pub async fn hits(&self, question_id: &QuestionId) -> Vec<ChunkHit> {
        self.ctx.retrieval.hits(&question_id.to_string()).await
    }

    pub async fn is_searching(&self, question_id: &QuestionId) -> bool {
        self.ctx.retrieval.is_loading(&question_id.to_string()).await
    }

    pub async fn is_explaining(&self, question_id: &QuestionId) -> bool {
        self.ctx.answers.is_explaining(&question_id.to_string()).await
    }

    pub async fn is_batch_running(&self) -> bool {
        self.ctx.answers.is_batch_running().await
    }

    pub async fn is_uploading(&self) -> bool {
        self.ctx.tracker.is_uploading().await
    }

    pub async fn has_extracted_material(&self) -> bool {
        self.ctx.tracker.has_extracted_material().await
    }
}
