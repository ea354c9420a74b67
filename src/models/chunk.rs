use serde::{Deserialize, Serialize};

/// 一条检索命中的课件片段
///
/// 每次检索整体重算，不与之前的结果合并。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkHit {
    pub chunk_id: String,
    pub resource_id: String,
    pub filename: String,
    #[serde(default)]
    pub page_ref: Option<String>,
    pub text: String,
    pub rank: f64,
}
