//! 讲解缓存 - 业务能力层
//!
//! 每个问题最多保存一条当前讲解。单题讲解/重新生成总是交给服务端决定是否复用，
//! 本地只负责按请求代数写回结果。

use std::collections::{HashMap, HashSet};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clients::CompanionApi;
use crate::error::{ApiResult, AppResult};
use crate::infrastructure::{RequestGenerations, Settlement};
use crate::models::{Answer, BatchExplanation, PersistedQuestion};

#[derive(Debug, Default)]
struct CacheState {
    answers: HashMap<String, Answer>,
    explaining: HashSet<String>,
    generations: RequestGenerations<String>,
    /// 每写入一次讲解加一，整体加载据此保留加载期间写入的结果
    writes: RequestGenerations<String>,
    batches: RequestGenerations<()>,
    batch_running: bool,
    loads: RequestGenerations<()>,
}

impl CacheState {
    /// 给发起时刻之后没有新单题请求的问题写入讲解
    fn merge_untouched(
        &mut self,
        answers: Vec<Answer>,
        issued_before: &RequestGenerations<String>,
    ) -> usize {
        let mut merged = 0;
        for answer in answers {
            let key = answer.question_id.clone();
            if self.generations.current(&key) != issued_before.current(&key) {
                debug!("问题 {} 有更新的单题讲解，跳过批量结果", key);
                continue;
            }
            self.writes.issue(&key);
            self.answers.insert(key, answer);
            merged += 1;
        }
        merged
    }
}

/// 同一问题有多条讲解时保留最新的
fn newest_per_question(answers: Vec<Answer>) -> HashMap<String, Answer> {
    let mut by_question: HashMap<String, Answer> = HashMap::new();
    for answer in answers {
        match by_question.get(&answer.question_id) {
            Some(existing) if existing.created_at >= answer.created_at => {}
            _ => {
                by_question.insert(answer.question_id.clone(), answer);
            }
        }
    }
    by_question
}

/// 讲解缓存
#[derive(Debug, Default)]
pub struct AnswerCache {
    state: Mutex<CacheState>,
}

impl AnswerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 讲解单个问题
    ///
    /// 参数类型保证了只有已保存的问题才能请求讲解。
    /// 失败时原有缓存保持不变。
    pub(crate) async fn explain(
        &self,
        api: &dyn CompanionApi,
        question: &PersistedQuestion,
        force: bool,
    ) -> AppResult<Settlement<Answer>> {
        let key = question.id.clone();
        let generation = {
            let mut state = self.state.lock().await;
            state.explaining.insert(key.clone());
            state.generations.issue(&key)
        };
        debug!("讲解问题 {} (force={}, 代数 {})", key, force, generation);

        let result = api.explain(&key, force).await;

        let mut state = self.state.lock().await;
        if !state.generations.is_current(&key, generation) {
            debug!("问题 {} 的讲解结果已过期，丢弃 (代数 {})", key, generation);
            return Ok(Settlement::Superseded);
        }
        state.explaining.remove(&key);

        match result {
            Ok(answer) => {
                info!("✓ 问题 #{} 讲解完成", question.order_index);
                state.writes.issue(&key);
                state.answers.insert(key, answer.clone());
                Ok(Settlement::Applied(answer))
            }
            Err(e) => {
                warn!("问题 #{} 讲解失败: {}", question.order_index, e);
                Err(e.into())
            }
        }
    }

    /// 批量讲解
    ///
    /// 返回的讲解按问题 id 合并进缓存，批次之外的讲解保持不变。
    /// `count = 0` 表示没有需要处理的问题，不是错误。
    pub(crate) async fn explain_all(
        &self,
        api: &dyn CompanionApi,
        session_id: &str,
        force: bool,
    ) -> AppResult<Settlement<BatchExplanation>> {
        let (batch_generation, issued_before) = {
            let mut state = self.state.lock().await;
            state.batch_running = true;
            (state.batches.issue(&()), state.generations.clone())
        };
        info!("🤖 批量讲解开始 (force={})", force);

        let result = api.explain_all(session_id, force).await;

        let mut state = self.state.lock().await;
        if !state.batches.is_current(&(), batch_generation) {
            debug!("批量讲解结果已过期，丢弃 (代数 {})", batch_generation);
            return Ok(Settlement::Superseded);
        }
        state.batch_running = false;

        let batch = result?;
        let merged = state.merge_untouched(batch.answers.clone(), &issued_before);
        info!("✓ 批量讲解完成: 生成 {} 条，写入缓存 {} 条", batch.count, merged);
        Ok(Settlement::Applied(batch))
    }

    /// 从服务端整体加载已保存的讲解
    pub async fn load(
        &self,
        api: &dyn CompanionApi,
        session_id: &str,
    ) -> ApiResult<Settlement<usize>> {
        let (generation, written_before) = {
            let mut state = self.state.lock().await;
            (state.loads.issue(&()), state.writes.clone())
        };

        let result = api.list_answers(session_id).await;

        let mut state = self.state.lock().await;
        if !state.loads.is_current(&(), generation) {
            return Ok(Settlement::Superseded);
        }

        let mut loaded = newest_per_question(result?);
        // 加载期间单题讲解或批量讲解写入的结果比列表更新
        for (key, answer) in state.answers.iter() {
            if state.writes.current(key) != written_before.current(key) {
                loaded.insert(key.clone(), answer.clone());
            }
        }
        let count = loaded.len();
        state.answers = loaded;
        Ok(Settlement::Applied(count))
    }

    /// 某个问题当前的讲解
    pub async fn get(&self, question_id: &str) -> Option<Answer> {
        self.state.lock().await.answers.get(question_id).cloned()
    }

    /// 全部讲解的快照
    pub async fn snapshot(&self) -> HashMap<String, Answer> {
        self.state.lock().await.answers.clone()
    }

    /// 某个问题是否有讲解在途
    pub async fn is_explaining(&self, question_id: &str) -> bool {
        self.state.lock().await.explaining.contains(question_id)
    }

    /// 是否有批量讲解在途
    pub async fn is_batch_running(&self) -> bool {
        self.state.lock().await.batch_running
    }
}
