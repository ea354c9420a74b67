//! # Lecture Companion
//!
//! 课堂伴学助手的会话交互核心：实时记录提问、上传课件、检索相关片段、生成并缓存讲解
//!
//! ## 架构设计
//!
//! ### ① 接口层（Clients）
//! - `clients/` - 协作方接口，持久化 / 提取切片 / 检索 / 讲解生成都在服务端
//! - `CompanionApi` - 协作方 trait
//! - `HttpCompanionClient` - 基于 reqwest 的实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 每个组件只管自己的那份状态，组件之间互不调用
//! - `canonicalize` - 检索词规范化
//! - `ResourceTracker` - 课件提取状态
//! - `QuestionLedger` - 问题台账（乐观插入）
//! - `ContextRetrieval` - 按问题隔离的检索结果
//! - `AnswerCache` - 讲解缓存（生成 / 强制重新生成）
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 会话上下文与上传流程
//! - `SessionCtx` - 一个会话的全部内存状态
//! - `IngestPipeline` - 上传 → 对账 → 切片 → 对账
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/session_orchestrator` - 唯一调用各组件写操作的地方
//! - `orchestrator/app` - 命令行入口
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{CompanionApi, HttpCompanionClient};
pub use config::{Config, SearchMode};
pub use error::{AppError, AppResult};
pub use infrastructure::Settlement;
pub use models::{Question, QuestionId};
pub use orchestrator::{App, SessionLoadReport, SessionOrchestrator, SessionPhase};
pub use workflow::{IngestReport, SessionCtx};
