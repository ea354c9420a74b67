use std::fmt;

use thiserror::Error;

/// 应用程序错误类型
///
/// 所有错误都在引发它的操作边界上可恢复，没有任何一种会让进程退出。
#[derive(Debug, Error)]
pub enum AppError {
    /// 本地校验错误（永远不会到达传输层）
    #[error("校验错误: {0}")]
    Validation(#[from] ValidationError),
    /// 协作方接口调用错误
    #[error("API错误: {0}")]
    Transport(#[from] TransportError),
    /// 并发加载中某一路失败
    #[error("加载错误: {0}")]
    PartialLoad(#[from] PartialLoadError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
}

/// 本地校验错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 问题内容为空
    #[error("问题内容不能为空")]
    EmptyQuestion,
    /// 检索词为空
    #[error("检索词不能为空")]
    EmptyQuery,
    /// 会话标题为空
    #[error("会话标题不能为空")]
    EmptyTitle,
    /// 会话标题过长
    #[error("会话标题过长: {len} 个字符 (上限 {max})")]
    TitleTooLong { len: usize, max: usize },
    /// 没有选择任何文件
    #[error("没有选择要上传的文件")]
    NoFiles,
    /// 问题尚未被服务端确认
    #[error("问题 {id} 尚未保存，不能检索或生成讲解")]
    PendingQuestion { id: String },
    /// 问题不存在
    #[error("找不到问题 {id}")]
    UnknownQuestion { id: String },
    /// 没有已完成文本提取的资料
    #[error("请先上传并完成提取至少一份课件")]
    NoExtractedMaterial,
    /// 没有已保存的问题
    #[error("当前会话还没有已保存的问题")]
    NoPersistedQuestions,
}

/// 协作方接口调用错误
///
/// 超时与连接失败一视同仁，都落在 `Request` 上。
#[derive(Debug, Error)]
pub enum TransportError {
    /// 非成功状态码
    #[error("HTTP {status} ({endpoint}): {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    Request {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 响应解析失败
    #[error("响应解析失败 ({endpoint}): {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

impl TransportError {
    /// HTTP 状态码（仅非成功响应才有）
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// 会话中可独立加载的组件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionComponent {
    Questions,
    Resources,
    Answers,
}

impl fmt::Display for SessionComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionComponent::Questions => write!(f, "问题列表"),
            SessionComponent::Resources => write!(f, "课件列表"),
            SessionComponent::Answers => write!(f, "讲解缓存"),
        }
    }
}

/// 并发加载中某一路失败，不影响其它几路
#[derive(Debug, Error)]
#[error("{component}加载失败: {source}")]
pub struct PartialLoadError {
    pub component: SessionComponent,
    #[source]
    pub source: TransportError,
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 是否为本地校验错误
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }

    /// 是否为传输层错误
    pub fn is_transport(&self) -> bool {
        matches!(self, AppError::Transport(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

/// 协作方接口结果类型
pub type ApiResult<T> = Result<T, TransportError>;
