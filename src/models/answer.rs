use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;

/// 一个问题当前的讲解
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: String,
    pub session_id: String,
    pub question_id: String,
    pub answer_md: String,
    /// 序列化后的来源列表，核心逻辑不解释其内容
    #[serde(default)]
    pub sources_json: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
}

/// 讲解引用的来源片段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub chunk_id: String,
    pub filename: String,
    #[serde(default)]
    pub page_ref: Option<String>,
    pub rank: f64,
}

impl Answer {
    /// 解析来源列表，解析失败返回空列表
    pub fn sources(&self) -> Vec<SourceRef> {
        serde_json::from_str(&self.sources_json).unwrap_or_default()
    }
}

/// 批量讲解的返回结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchExplanation {
    pub count: usize,
    #[serde(default)]
    pub answers: Vec<Answer>,
}
