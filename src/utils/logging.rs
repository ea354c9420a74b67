/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::SessionComponent;
use crate::orchestrator::SessionLoadReport;

/// 初始化日志
///
/// `RUST_LOG` 优先；否则按 `verbose` 选择 debug 或 info。重复调用无副作用。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 Lecture Companion 启动");
    info!("🌐 API: {}", config.api_base_url);
    info!(
        "🔍 检索方式: {:?}，每次 {} 条",
        config.search_mode, config.search_limit
    );
    info!("{}", "=".repeat(60));
}

/// 记录会话加载结果
///
/// # 参数
/// - `session_id`: 会话ID
/// - `report`: 加载结果
pub fn log_load_report(session_id: &str, report: &SessionLoadReport) {
    if report.is_complete() {
        info!("[会话 {}] ✓ 加载完成", session_id);
        return;
    }
    for failure in &report.failures {
        warn!("[会话 {}] ⚠️ {}", session_id, failure);
    }
    if report.answers_degraded {
        info!(
            "[会话 {}] {}暂不可用，继续使用本地已有的讲解",
            session_id,
            SessionComponent::Answers
        );
    }
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
