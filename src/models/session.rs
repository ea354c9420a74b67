use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;

/// 会话标题上限（字符数）
pub const MAX_TITLE_LEN: usize = 200;

/// 一次课堂会话
///
/// 创建后不可变；`question_count` 由服务端统计，本地从不修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub topics: Option<String>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub question_count: u32,
}

/// 创建会话的请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionDraft {
    pub title: String,
    pub topics: Option<String>,
}
