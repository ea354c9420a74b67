//! 问题台账 - 业务能力层
//!
//! 按 `order_index` 升序持有会话中的问题，提交时先乐观插入 `Pending`，
//! 请求结算后原位替换为 `Persisted` 或整条移除。

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clients::CompanionApi;
use crate::error::{ApiResult, AppResult, ValidationError};
use crate::infrastructure::{RequestGenerations, Settlement};
use crate::models::{PendingQuestion, PersistedQuestion, Question, QuestionId};
use crate::utils::logging::truncate_text;

#[derive(Debug, Default)]
struct LedgerState {
    questions: Vec<Question>,
    next_local_id: u64,
    loads: RequestGenerations<()>,
}

impl LedgerState {
    fn next_order_index(&self) -> u32 {
        self.questions
            .iter()
            .map(Question::order_index)
            .max()
            .map_or(1, |max| max + 1)
    }

    fn insert_pending(&mut self, session_id: &str, text: &str) -> PendingQuestion {
        self.next_local_id += 1;
        let pending = PendingQuestion {
            local_id: self.next_local_id,
            session_id: session_id.to_string(),
            text: text.to_string(),
            asked_at: Utc::now(),
            order_index: self.next_order_index(),
        };
        self.questions.push(Question::Pending(pending.clone()));
        pending
    }

    fn position_of_pending(&self, local_id: u64) -> Option<usize> {
        self.questions
            .iter()
            .position(|q| matches!(q, Question::Pending(p) if p.local_id == local_id))
    }

    fn contains_persisted(&self, id: &str) -> bool {
        self.questions
            .iter()
            .any(|q| matches!(q, Question::Persisted(p) if p.id == id))
    }

    /// 用服务端返回的记录替换对应的 `Pending`
    ///
    /// 如果刷新已经带回了同 id 的记录，只移除 `Pending`，不重复插入。
    fn confirm(&mut self, local_id: u64, persisted: PersistedQuestion) {
        let already_loaded = self.contains_persisted(&persisted.id);
        match (self.position_of_pending(local_id), already_loaded) {
            (Some(pos), false) => self.questions[pos] = Question::Persisted(persisted),
            (Some(pos), true) => {
                self.questions.remove(pos);
            }
            (None, false) => {
                let pos = self
                    .questions
                    .iter()
                    .position(|q| q.order_index() > persisted.order_index)
                    .unwrap_or(self.questions.len());
                self.questions.insert(pos, Question::Persisted(persisted));
            }
            (None, true) => {}
        }
    }

    fn discard(&mut self, local_id: u64) -> bool {
        match self.position_of_pending(local_id) {
            Some(pos) => {
                self.questions.remove(pos);
                true
            }
            None => false,
        }
    }

    /// 整体替换已保存的问题，仍在途的 `Pending` 接在后面
    fn replace_persisted(&mut self, loaded: Vec<PersistedQuestion>) {
        let pending: Vec<Question> = self
            .questions
            .drain(..)
            .filter(Question::is_pending)
            .collect();
        self.questions = loaded.into_iter().map(Question::Persisted).collect();
        self.questions.extend(pending);
    }
}

/// 问题台账
#[derive(Debug, Default)]
pub struct QuestionLedger {
    state: Mutex<LedgerState>,
}

impl QuestionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 提交一个问题
    ///
    /// # 参数
    /// - `api`: 协作方接口
    /// - `session_id`: 会话ID
    /// - `text`: 问题内容（首尾空白会被去掉）
    ///
    /// # 返回
    /// 成功时返回服务端保存的问题；失败时 `Pending` 已被移除
    pub(crate) async fn submit(
        &self,
        api: &dyn CompanionApi,
        session_id: &str,
        text: &str,
    ) -> AppResult<PersistedQuestion> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyQuestion.into());
        }

        let pending = self.state.lock().await.insert_pending(session_id, text);
        debug!(
            "乐观插入问题 #{} ({}): {}",
            pending.order_index,
            QuestionId::Pending(pending.local_id),
            truncate_text(text, 80)
        );

        let result = api.create_question(session_id, text).await;

        let mut state = self.state.lock().await;
        match result {
            Ok(persisted) => {
                info!("✓ 问题已保存 #{} ({})", persisted.order_index, persisted.id);
                state.confirm(pending.local_id, persisted.clone());
                Ok(persisted)
            }
            Err(e) => {
                warn!("问题保存失败，撤回乐观插入: {}", e);
                state.discard(pending.local_id);
                Err(e.into())
            }
        }
    }

    /// 从服务端整体刷新问题列表
    pub async fn load(
        &self,
        api: &dyn CompanionApi,
        session_id: &str,
    ) -> ApiResult<Settlement<Vec<PersistedQuestion>>> {
        let generation = self.state.lock().await.loads.issue(&());

        let result = api.list_questions(session_id).await;

        let mut state = self.state.lock().await;
        if !state.loads.is_current(&(), generation) {
            debug!("问题列表刷新结果已过期，丢弃 (代数 {})", generation);
            return Ok(Settlement::Superseded);
        }

        let loaded = result?;
        state.replace_persisted(loaded.clone());
        Ok(Settlement::Applied(loaded))
    }

    /// 当前问题列表的快照
    pub async fn snapshot(&self) -> Vec<Question> {
        self.state.lock().await.questions.clone()
    }

    /// 按 id 查找问题
    pub async fn find(&self, id: &QuestionId) -> Option<Question> {
        self.state
            .lock()
            .await
            .questions
            .iter()
            .find(|q| &q.id() == id)
            .cloned()
    }

    /// 已保存的问题数
    pub async fn persisted_count(&self) -> usize {
        self.state
            .lock()
            .await
            .questions
            .iter()
            .filter(|q| !q.is_pending())
            .count()
    }
}
