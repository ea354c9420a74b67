//! 上下文检索 - 业务能力层
//!
//! 用规范化后的检索词查询课件片段，按问题分别保存最近一次的命中结果。

use std::collections::{HashMap, HashSet};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clients::CompanionApi;
use crate::error::AppResult;
use crate::infrastructure::{RequestGenerations, Settlement};
use crate::models::ChunkHit;
use crate::services::query_canonicalizer::canonicalize;

#[derive(Debug, Default)]
struct RetrievalState {
    hits: HashMap<String, Vec<ChunkHit>>,
    loading: HashSet<String>,
    generations: RequestGenerations<String>,
}

/// 上下文检索客户端
#[derive(Debug, Default)]
pub struct ContextRetrieval {
    state: Mutex<RetrievalState>,
}

impl ContextRetrieval {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为某个问题检索课件片段
    ///
    /// # 参数
    /// - `api`: 协作方接口
    /// - `session_id`: 会话ID
    /// - `question_key`: 问题 id，结果和加载状态都按它隔离
    /// - `query`: 原始检索文本，发出前会先规范化
    /// - `limit`: 最多返回的片段数
    ///
    /// # 返回
    /// - `Skipped`：检索词为空，没有发请求，之前的结果保持不变
    /// - `Superseded`：同一问题上已有更新的检索，本次结果被丢弃
    /// - `Applied`：结果已整体替换该问题之前的命中
    ///
    /// 失败时该问题的命中被清空（而不是保留旧结果），加载状态被清除。
    pub(crate) async fn search(
        &self,
        api: &dyn CompanionApi,
        session_id: &str,
        question_key: &str,
        query: &str,
        limit: usize,
    ) -> AppResult<Settlement<Vec<ChunkHit>>> {
        let canonical = canonicalize(query);
        if canonical.trim().is_empty() {
            debug!("检索词为空，跳过问题 {} 的检索", question_key);
            return Ok(Settlement::Skipped);
        }

        let key = question_key.to_string();
        let generation = {
            let mut state = self.state.lock().await;
            state.loading.insert(key.clone());
            state.generations.issue(&key)
        };
        debug!("检索 [{}] 代数 {}: {}", key, generation, canonical);

        let result = api.search_chunks(session_id, &canonical, limit).await;

        let mut state = self.state.lock().await;
        if !state.generations.is_current(&key, generation) {
            debug!("问题 {} 的检索结果已过期，丢弃 (代数 {})", key, generation);
            return Ok(Settlement::Superseded);
        }
        state.loading.remove(&key);

        match result {
            Ok(hits) => {
                info!("🔍 问题 {} 检索到 {} 个片段", key, hits.len());
                state.hits.insert(key, hits.clone());
                Ok(Settlement::Applied(hits))
            }
            Err(e) => {
                warn!("问题 {} 检索失败: {}", key, e);
                state.hits.insert(key, Vec::new());
                Err(e.into())
            }
        }
    }

    /// 某个问题最近一次的命中结果
    pub async fn hits(&self, question_key: &str) -> Vec<ChunkHit> {
        self.state
            .lock()
            .await
            .hits
            .get(question_key)
            .cloned()
            .unwrap_or_default()
    }

    /// 某个问题是否有检索在途
    pub async fn is_loading(&self, question_key: &str) -> bool {
        self.state.lock().await.loading.contains(question_key)
    }
}
