//! 会话目录 - 业务能力层

use tokio::sync::Mutex;
use tracing::info;

use crate::clients::CompanionApi;
use crate::error::{AppResult, ValidationError};
use crate::models::{Session, SessionDraft, MAX_TITLE_LEN};

/// 校验并整理创建会话的输入
///
/// 标题去掉首尾空白后不能为空且不超过 200 个字符；空白的主题视为没有主题。
pub fn validate_draft(title: &str, topics: Option<&str>) -> Result<SessionDraft, ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    let len = title.chars().count();
    if len > MAX_TITLE_LEN {
        return Err(ValidationError::TitleTooLong {
            len,
            max: MAX_TITLE_LEN,
        });
    }

    let topics = topics
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    Ok(SessionDraft {
        title: title.to_string(),
        topics,
    })
}

/// 会话目录
#[derive(Debug, Default)]
pub struct SessionDirectory {
    sessions: Mutex<Vec<Session>>,
}

impl SessionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 刷新会话列表，失败时保留原有列表
    pub async fn refresh(&self, api: &dyn CompanionApi) -> AppResult<Vec<Session>> {
        let sessions = api.list_sessions().await?;
        *self.sessions.lock().await = sessions.clone();
        Ok(sessions)
    }

    /// 创建会话，成功后插到列表最前面
    pub async fn create(
        &self,
        api: &dyn CompanionApi,
        title: &str,
        topics: Option<&str>,
    ) -> AppResult<Session> {
        let draft = validate_draft(title, topics)?;
        let created = api.create_session(&draft).await?;
        info!("✓ 会话已创建: {} ({})", created.title, created.id);
        self.sessions.lock().await.insert(0, created.clone());
        Ok(created)
    }

    /// 当前会话列表的快照
    pub async fn snapshot(&self) -> Vec<Session> {
        self.sessions.lock().await.clone()
    }
}
