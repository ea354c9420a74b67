//! 课件状态跟踪 - 业务能力层
//!
//! 持有当前会话的课件列表。状态只由服务端推进，这里只负责刷新和乐观插入。

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::clients::CompanionApi;
use crate::error::ApiResult;
use crate::infrastructure::{RequestGenerations, Settlement};
use crate::models::{Resource, ResourceStatus};

#[derive(Debug, Default)]
struct TrackerState {
    resources: Vec<Resource>,
    loads: RequestGenerations<()>,
    uploading: bool,
}

impl TrackerState {
    /// 新上传的课件插到最前面，已存在的同 id 记录被替换
    fn prepend(&mut self, new_ones: Vec<Resource>) {
        self.resources
            .retain(|r| !new_ones.iter().any(|n| n.id == r.id));
        let mut merged = new_ones;
        merged.append(&mut self.resources);
        self.resources = merged;
    }

    fn has_extracted_material(&self) -> bool {
        self.resources
            .iter()
            .any(|r| r.status == ResourceStatus::Extracted)
    }
}

/// 课件状态跟踪器
#[derive(Debug, Default)]
pub struct ResourceTracker {
    state: Mutex<TrackerState>,
}

impl ResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从服务端整体刷新课件列表
    ///
    /// 失败时保留原有列表，只把错误交给调用方。
    pub async fn load(
        &self,
        api: &dyn CompanionApi,
        session_id: &str,
    ) -> ApiResult<Settlement<Vec<Resource>>> {
        let generation = self.state.lock().await.loads.issue(&());

        let result = api.list_resources(session_id).await;

        let mut state = self.state.lock().await;
        if !state.loads.is_current(&(), generation) {
            debug!("课件列表刷新结果已过期，丢弃 (代数 {})", generation);
            return Ok(Settlement::Superseded);
        }

        match result {
            Ok(resources) => {
                state.resources = resources.clone();
                Ok(Settlement::Applied(resources))
            }
            Err(e) => {
                warn!("课件列表刷新失败，保留原有 {} 条: {}", state.resources.len(), e);
                Err(e)
            }
        }
    }

    /// 上传成功后乐观插入新课件
    pub(crate) async fn record_uploaded(&self, new_ones: Vec<Resource>) {
        self.state.lock().await.prepend(new_ones);
    }

    pub(crate) async fn set_uploading(&self, uploading: bool) {
        self.state.lock().await.uploading = uploading;
    }

    /// 是否正在上传
    pub async fn is_uploading(&self) -> bool {
        self.state.lock().await.uploading
    }

    /// 是否至少有一份课件已完成文本提取
    pub async fn has_extracted_material(&self) -> bool {
        self.state.lock().await.has_extracted_material()
    }

    /// 当前课件列表的快照
    pub async fn snapshot(&self) -> Vec<Resource> {
        self.state.lock().await.resources.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn resource(id: &str, status: ResourceStatus) -> Resource {
        Resource {
            id: id.to_string(),
            session_id: "s1".to_string(),
            filename: format!("{}.pdf", id),
            mime_type: Some("application/pdf".to_string()),
            status,
            created_at: Utc::now(),
            extracted_at: None,
            error: None,
        }
    }

    #[test]
    fn test_prepend_keeps_new_ones_first() {
        let mut state = TrackerState::default();
        state.resources = vec![resource("old", ResourceStatus::Extracted)];

        state.prepend(vec![
            resource("new1", ResourceStatus::Uploaded),
            resource("new2", ResourceStatus::Uploaded),
        ]);

        let ids: Vec<_> = state.resources.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["new1", "new2", "old"]);
    }

    #[test]
    fn test_prepend_replaces_same_id() {
        let mut state = TrackerState::default();
        state.resources = vec![resource("r1", ResourceStatus::Uploaded)];

        state.prepend(vec![resource("r1", ResourceStatus::Extracted)]);

        assert_eq!(state.resources.len(), 1);
        assert_eq!(state.resources[0].status, ResourceStatus::Extracted);
    }

    #[test]
    fn test_extracted_material_requires_extracted_status() {
        let mut state = TrackerState::default();
        assert!(!state.has_extracted_material());

        state.prepend(vec![
            resource("r1", ResourceStatus::Uploaded),
            resource("r2", ResourceStatus::Failed),
        ]);
        assert!(!state.has_extracted_material());

        state.prepend(vec![resource("r3", ResourceStatus::Extracted)]);
        assert!(state.has_extracted_material());
    }
}
