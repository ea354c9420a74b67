use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;

/// 课件提取状态，`Extracted` 和 `Failed` 是终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResourceStatus {
    Uploaded,
    Extracted,
    Failed,
}

impl ResourceStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ResourceStatus::Extracted | ResourceStatus::Failed)
    }
}

/// 已上传的课件
///
/// 状态只由服务端的提取流程推进，本地只通过刷新观察。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub session_id: String,
    pub filename: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    pub status: ResourceStatus,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "timestamp::option::deserialize")]
    pub extracted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error: Option<String>,
}

/// 触发切片后的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingSummary {
    #[serde(rename = "processed_resources")]
    pub processed_count: u32,
    #[serde(rename = "skipped_resources")]
    pub skipped_count: u32,
    #[serde(rename = "chunks_created")]
    pub created_chunk_count: u32,
}
