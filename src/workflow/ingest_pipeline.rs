//! 上传 → 切片 流程
//!
//! 两个阶段：
//! 1. 上传文件 → 乐观插入 → 刷新对账（上传失败即整体失败）
//! 2. 触发切片 → 再次刷新对账（尽力而为，失败只作为警告附在结果上）
//!
//! 第二阶段失败不会回滚已经成功的上传。

use std::fmt;

use tracing::{info, warn};

use crate::clients::CompanionApi;
use crate::error::{AppError, AppResult, ValidationError};
use crate::models::{ChunkingSummary, Resource, UploadFile};
use crate::workflow::session_ctx::SessionCtx;

/// 产生警告的步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    /// 上传后的刷新对账
    ReconcileAfterUpload,
    /// 触发切片
    Chunking,
    /// 切片后的刷新对账
    ReconcileAfterChunking,
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestStage::ReconcileAfterUpload => write!(f, "上传后刷新"),
            IngestStage::Chunking => write!(f, "触发切片"),
            IngestStage::ReconcileAfterChunking => write!(f, "切片后刷新"),
        }
    }
}

/// 非致命的步骤失败
#[derive(Debug)]
pub struct IngestWarning {
    pub stage: IngestStage,
    pub error: AppError,
}

/// 上传流程的结果
#[derive(Debug, Default)]
pub struct IngestReport {
    /// 服务端新建的课件
    pub uploaded: Vec<Resource>,
    /// 切片统计（切片失败时为空）
    pub chunking: Option<ChunkingSummary>,
    /// 尽力而为步骤的失败
    pub warnings: Vec<IngestWarning>,
}

impl IngestReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// 上传流程
pub struct IngestPipeline<'a> {
    api: &'a dyn CompanionApi,
    ctx: &'a SessionCtx,
}

impl<'a> IngestPipeline<'a> {
    pub fn new(api: &'a dyn CompanionApi, ctx: &'a SessionCtx) -> Self {
        Self { api, ctx }
    }

    /// 执行完整流程
    pub async fn run(&self, files: Vec<UploadFile>) -> AppResult<IngestReport> {
        if files.is_empty() {
            return Err(ValidationError::NoFiles.into());
        }

        self.ctx.tracker.set_uploading(true).await;
        let uploaded = self.upload(&files).await;
        self.ctx.tracker.set_uploading(false).await;

        let mut report = IngestReport {
            uploaded: uploaded?,
            ..Default::default()
        };

        self.reconcile(IngestStage::ReconcileAfterUpload, &mut report)
            .await;
        self.chunk(&mut report).await;

        Ok(report)
    }

    /// 第一阶段：上传并乐观插入
    async fn upload(&self, files: &[UploadFile]) -> AppResult<Vec<Resource>> {
        info!("{} 📤 正在上传 {} 个文件...", self.ctx, files.len());

        let created = self
            .api
            .upload_resources(&self.ctx.session_id, files)
            .await?;

        info!("{} ✓ 上传完成，新建 {} 份课件", self.ctx, created.len());
        self.ctx.tracker.record_uploaded(created.clone()).await;
        Ok(created)
    }

    /// 第二阶段：触发切片并再次对账
    async fn chunk(&self, report: &mut IngestReport) {
        match self.api.trigger_chunking(&self.ctx.session_id).await {
            Ok(summary) => {
                info!(
                    "{} ✓ 切片完成: 处理 {} 份，跳过 {} 份，新建 {} 个片段",
                    self.ctx,
                    summary.processed_count,
                    summary.skipped_count,
                    summary.created_chunk_count
                );
                report.chunking = Some(summary);
            }
            Err(e) => {
                warn!("{} ⚠️ 自动切片失败（不影响已上传的课件）: {}", self.ctx, e);
                report.warnings.push(IngestWarning {
                    stage: IngestStage::Chunking,
                    error: e.into(),
                });
            }
        }

        self.reconcile(IngestStage::ReconcileAfterChunking, report)
            .await;
    }

    async fn reconcile(&self, stage: IngestStage, report: &mut IngestReport) {
        if let Err(e) = self.ctx.tracker.load(self.api, &self.ctx.session_id).await {
            warn!("{} ⚠️ {}失败: {}", self.ctx, stage, e);
            report.warnings.push(IngestWarning {
                stage,
                error: e.into(),
            });
        }
    }
}
