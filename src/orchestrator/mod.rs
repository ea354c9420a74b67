//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `session_orchestrator` - 会话编排器
//! - 进入/刷新会话（三路并发加载）
//! - 提交问题、上传课件、检索、讲解、批量讲解
//! - 批量讲解的前置条件检查
//!
//! ### `app` - 命令行入口
//! - 把命令翻译成编排器上的操作
//!
//! ## 层次关系
//!
//! ```text
//! app (命令行)
//!     ↓
//! session_orchestrator (一个会话)
//!     ↓
//! workflow (SessionCtx / 上传流程)
//!     ↓
//! services (能力层：台账 / 课件 / 检索 / 讲解)
//!     ↓
//! clients (协作方接口)
//! ```

pub mod app;
pub mod session_orchestrator;

pub use app::App;
pub use session_orchestrator::{SessionLoadReport, SessionOrchestrator, SessionPhase};
