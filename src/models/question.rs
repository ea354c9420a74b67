//! 问题模型
//!
//! 问题有两种生命周期状态：
//! - `Pending`：本地乐观插入，尚未被服务端确认，id 由本地生成
//! - `Persisted`：服务端已保存，id 由服务端分配
//!
//! 两者是不同的类型，讲解/重新生成只接受 `PersistedQuestion`。

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;

/// 本地 id 的保留前缀
pub const PENDING_ID_PREFIX: &str = "pending-";

/// 问题标识
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QuestionId {
    /// 本地生成的序号
    Pending(u64),
    /// 服务端分配的 id
    Persisted(String),
}

impl QuestionId {
    /// 从字符串解析，带保留前缀的视为本地 id
    pub fn parse(raw: &str) -> Self {
        match raw
            .strip_prefix(PENDING_ID_PREFIX)
            .and_then(|n| n.parse::<u64>().ok())
        {
            Some(local_id) => QuestionId::Pending(local_id),
            None => QuestionId::Persisted(raw.to_string()),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, QuestionId::Pending(_))
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionId::Pending(local_id) => write!(f, "{}{}", PENDING_ID_PREFIX, local_id),
            QuestionId::Persisted(id) => write!(f, "{}", id),
        }
    }
}

/// 服务端已保存的问题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedQuestion {
    pub id: String,
    pub session_id: String,
    pub text: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub asked_at: DateTime<Utc>,
    pub order_index: u32,
}

/// 本地乐观插入、等待确认的问题
#[derive(Debug, Clone, PartialEq)]
pub struct PendingQuestion {
    pub local_id: u64,
    pub session_id: String,
    pub text: String,
    pub asked_at: DateTime<Utc>,
    pub order_index: u32,
}

/// 问题
#[derive(Debug, Clone, PartialEq)]
pub enum Question {
    Pending(PendingQuestion),
    Persisted(PersistedQuestion),
}

impl Question {
    pub fn id(&self) -> QuestionId {
        match self {
            Question::Pending(q) => QuestionId::Pending(q.local_id),
            Question::Persisted(q) => QuestionId::Persisted(q.id.clone()),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Question::Pending(q) => &q.text,
            Question::Persisted(q) => &q.text,
        }
    }

    pub fn order_index(&self) -> u32 {
        match self {
            Question::Pending(q) => q.order_index,
            Question::Persisted(q) => q.order_index,
        }
    }

    pub fn asked_at(&self) -> DateTime<Utc> {
        match self {
            Question::Pending(q) => q.asked_at,
            Question::Persisted(q) => q.asked_at,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Question::Pending(_))
    }

    pub fn as_persisted(&self) -> Option<&PersistedQuestion> {
        match self {
            Question::Persisted(q) => Some(q),
            Question::Pending(_) => None,
        }
    }
}
