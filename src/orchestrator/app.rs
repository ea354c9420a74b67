//! 命令行入口 - 编排层
//!
//! 把命令行参数翻译成会话编排器上的操作，并打印结果。

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::clients::{CompanionApi, HttpCompanionClient};
use crate::config::Config;
use crate::error::ValidationError;
use crate::infrastructure::Settlement;
use crate::models::{ChunkHit, QuestionId, UploadFile};
use crate::orchestrator::session_orchestrator::SessionOrchestrator;
use crate::services::SessionDirectory;
use crate::utils::logging::{log_startup, truncate_text};

const USAGE: &str = "用法:
  lecture_companion sessions
  lecture_companion new <title> [topics]
  lecture_companion show <session_id>
  lecture_companion ask <session_id> <text>
  lecture_companion upload <session_id> <file>...
  lecture_companion search <session_id> <question_id> [query]
  lecture_companion explain <session_id> <question_id> [--force]
  lecture_companion explain-all <session_id> [--force]";

/// 应用主结构
pub struct App {
    config: Config,
    api: Arc<dyn CompanionApi>,
    directory: SessionDirectory,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);
        let api: Arc<dyn CompanionApi> = Arc::new(HttpCompanionClient::new(&config)?);
        Ok(Self::with_api(config, api))
    }

    /// 使用指定的协作方接口初始化
    pub fn with_api(config: Config, api: Arc<dyn CompanionApi>) -> Self {
        Self {
            config,
            api,
            directory: SessionDirectory::new(),
        }
    }

    /// 运行一条命令
    pub async fn run(&self, args: Vec<String>) -> Result<()> {
        let force = args.iter().any(|a| a == "--force");
        let args: Vec<&str> = args
            .iter()
            .map(String::as_str)
            .filter(|a| *a != "--force")
            .collect();

        match args.as_slice() {
            ["sessions"] => self.list_sessions().await,
            ["new", title] => self.create_session(title, None).await,
            ["new", title, topics] => self.create_session(title, Some(*topics)).await,
            ["show", session_id] => self.show(session_id).await,
            ["ask", session_id, text @ ..] if !text.is_empty() => {
                self.ask(session_id, &text.join(" ")).await
            }
            ["upload", session_id, files @ ..] if !files.is_empty() => {
                self.upload(session_id, files).await
            }
            ["search", session_id, question_id, query @ ..] => {
                self.search(session_id, question_id, &query.join(" ")).await
            }
            ["explain", session_id, question_id] => {
                self.explain(session_id, question_id, force).await
            }
            ["explain-all", session_id] => self.explain_all(session_id, force).await,
            _ => {
                println!("{}", USAGE);
                Ok(())
            }
        }
    }

    /// 创建编排器并进入会话
    async fn open(&self, session_id: &str) -> SessionOrchestrator {
        let orchestrator =
            SessionOrchestrator::new(self.api.clone(), session_id, &self.config);
        let report = orchestrator.enter_session().await;
        for failure in &report.failures {
            warn!("⚠️ {}", failure);
        }
        orchestrator
    }

    async fn list_sessions(&self) -> Result<()> {
        let sessions = self.directory.refresh(self.api.as_ref()).await?;
        if sessions.is_empty() {
            println!("还没有会话");
        }
        for s in sessions {
            println!(
                "{}  {}  ({} 个问题)  {}",
                s.id,
                s.title,
                s.question_count,
                s.topics.unwrap_or_default()
            );
        }
        Ok(())
    }

    async fn create_session(&self, title: &str, topics: Option<&str>) -> Result<()> {
        let session = self
            .directory
            .create(self.api.as_ref(), title, topics)
            .await?;
        println!("{}", session.id);
        Ok(())
    }

    async fn show(&self, session_id: &str) -> Result<()> {
        let orchestrator = self.open(session_id).await;
        let answers = orchestrator.answers().await;

        let resources = orchestrator.resources().await;
        println!("== 课件");
        for r in &resources {
            println!(
                "  [{:?}] {}  {}",
                r.status,
                r.filename,
                r.error.as_deref().unwrap_or_default()
            );
        }
        let extracting = resources.iter().filter(|r| !r.status.is_terminal()).count();
        if extracting > 0 {
            println!("  ({} 份课件仍在提取中，稍后用 show 刷新)", extracting);
        }

        println!("== 问题");
        for q in orchestrator.questions().await {
            let answered = match q.as_persisted() {
                Some(p) if answers.contains_key(&p.id) => "✓",
                _ => " ",
            };
            println!(
                "  {} #{} {}  {}",
                answered,
                q.order_index(),
                q.id(),
                truncate_text(q.text(), 80)
            );
        }
        Ok(())
    }

    async fn ask(&self, session_id: &str, text: &str) -> Result<()> {
        let orchestrator = self.open(session_id).await;
        let question = orchestrator.submit_question(text).await?;
        println!("#{} {}", question.order_index, question.id);
        Ok(())
    }

    async fn upload(&self, session_id: &str, paths: &[&str]) -> Result<()> {
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            files.push(UploadFile::from_path(Path::new(path)).await?);
        }

        let orchestrator = self.open(session_id).await;
        let report = orchestrator.upload_and_ingest(files).await?;

        for r in &report.uploaded {
            println!("  [{:?}] {}", r.status, r.filename);
        }
        if let Some(summary) = report.chunking {
            println!(
                "切片: 处理 {} / 跳过 {} / 新建片段 {}",
                summary.processed_count, summary.skipped_count, summary.created_chunk_count
            );
        }
        for w in &report.warnings {
            println!("⚠️ {}: {}", w.stage, w.error);
        }
        Ok(())
    }

    async fn search(&self, session_id: &str, question_id: &str, query: &str) -> Result<()> {
        let orchestrator = self.open(session_id).await;
        let question_id = QuestionId::parse(question_id);

        let settlement = if query.trim().is_empty() {
            orchestrator.search_for_question(&question_id).await?
        } else {
            orchestrator.search(&question_id, query).await?
        };

        match settlement {
            Settlement::Applied(hits) => print_hits(&hits),
            Settlement::Skipped => return Err(ValidationError::EmptyQuery.into()),
            Settlement::Superseded => {}
        }
        Ok(())
    }

    async fn explain(&self, session_id: &str, question_id: &str, force: bool) -> Result<()> {
        let orchestrator = self.open(session_id).await;
        let question_id = QuestionId::parse(question_id);

        let answer = orchestrator
            .explain(&question_id, force)
            .await?
            .applied()
            .context("讲解结果被更新的请求覆盖")?;

        println!("{}", answer.answer_md);
        let sources = answer.sources();
        if !sources.is_empty() {
            println!("\n来源:");
            for (i, s) in sources.iter().enumerate() {
                println!(
                    "  [{}] {}{}",
                    i + 1,
                    s.filename,
                    s.page_ref
                        .as_deref()
                        .map(|p| format!(" • {}", p))
                        .unwrap_or_default()
                );
            }
        }
        Ok(())
    }

    async fn explain_all(&self, session_id: &str, force: bool) -> Result<()> {
        let orchestrator = self.open(session_id).await;
        if !orchestrator.can_explain_all().await {
            bail!("批量讲解需要至少一份已提取的课件和一个已保存的问题");
        }

        match orchestrator.explain_all(force).await? {
            Settlement::Applied(batch) if batch.count == 0 => {
                info!("没有需要讲解的问题");
                println!("全部问题都已有讲解");
            }
            Settlement::Applied(batch) => println!("已生成 {} 条讲解", batch.count),
            Settlement::Superseded | Settlement::Skipped => {}
        }
        Ok(())
    }
}

fn print_hits(hits: &[ChunkHit]) {
    if hits.is_empty() {
        println!("没有找到相关片段");
    }
    for (i, h) in hits.iter().enumerate() {
        println!(
            "[{}] {}{}  (rank {:.3})\n    {}",
            i + 1,
            h.filename,
            h.page_ref
                .as_deref()
                .map(|p| format!(" • {}", p))
                .unwrap_or_default(),
            h.rank,
            truncate_text(&h.text, 160)
        );
    }
}
