//! 会话上下文
//!
//! 一个会话在内存中的全部状态。每个会话一份，会话之间不共享任何可变状态。

use std::fmt::Display;

use crate::services::{AnswerCache, ContextRetrieval, QuestionLedger, ResourceTracker};

/// 会话上下文
#[derive(Debug)]
pub struct SessionCtx {
    /// 会话ID
    pub session_id: String,
    /// 问题台账
    pub ledger: QuestionLedger,
    /// 课件状态
    pub tracker: ResourceTracker,
    /// 检索结果
    pub retrieval: ContextRetrieval,
    /// 讲解缓存
    pub answers: AnswerCache,
}

impl SessionCtx {
    /// 创建空的会话上下文
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            ledger: QuestionLedger::new(),
            tracker: ResourceTracker::new(),
            retrieval: ContextRetrieval::new(),
            answers: AnswerCache::new(),
        }
    }
}

impl Display for SessionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[会话 {}]", self.session_id)
    }
}
