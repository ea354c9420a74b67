//! 测试用的内存协作方
//!
//! - `hold(name)` 让下一次同名调用在返回前挂起，直到 `release(name)`
//! - `fail(name)` 让同名调用（操作名或闸门名）持续返回 HTTP 503，`recover(name)` 恢复
//! - `calls()` 记录所有调用，用来断言有没有发出网络请求

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;

use lecture_companion::clients::CompanionApi;
use lecture_companion::error::{ApiResult, TransportError};
use lecture_companion::models::{
    Answer, BatchExplanation, ChunkHit, ChunkingSummary, PersistedQuestion, Resource,
    ResourceStatus, Session, SessionDraft, UploadFile,
};
use lecture_companion::{Config, SessionOrchestrator};

pub const SESSION_ID: &str = "s1";

#[derive(Default)]
struct FakeState {
    sessions: Vec<Session>,
    questions: Vec<PersistedQuestion>,
    resources: Vec<Resource>,
    answers: Vec<Answer>,
    next_id: u64,
}

impl FakeState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }

    /// 生成并保存（覆盖）一个问题的讲解
    fn generate_answer(&mut self, question_id: &str) -> Answer {
        let answer = Answer {
            id: self.next_id("a"),
            session_id: SESSION_ID.to_string(),
            question_id: question_id.to_string(),
            answer_md: format!("## TL;DR\nanswer for {}", question_id),
            sources_json: r#"[{"chunk_id":"c1","filename":"week1.pdf","page_ref":"p. 2","rank":0.5}]"#
                .to_string(),
            created_at: Utc::now(),
        };
        self.answers.retain(|a| a.question_id != question_id);
        self.answers.push(answer.clone());
        answer
    }
}

#[derive(Default)]
pub struct FakeCompanionApi {
    state: Mutex<FakeState>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    armed: Mutex<HashSet<String>>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
    generated: Mutex<Vec<String>>,
}

impl FakeCompanionApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    // ========== 数据准备 ==========

    pub fn seed_question(&self, text: &str) -> PersistedQuestion {
        let mut state = self.state.lock().unwrap();
        let order_index = state.questions.iter().map(|q| q.order_index).max().unwrap_or(0) + 1;
        let question = PersistedQuestion {
            id: state.next_id("q"),
            session_id: SESSION_ID.to_string(),
            text: text.to_string(),
            asked_at: Utc::now(),
            order_index,
        };
        state.questions.push(question.clone());
        question
    }

    pub fn seed_resource(&self, filename: &str, status: ResourceStatus) -> Resource {
        let mut state = self.state.lock().unwrap();
        let resource = Resource {
            id: state.next_id("r"),
            session_id: SESSION_ID.to_string(),
            filename: filename.to_string(),
            mime_type: Some("application/pdf".to_string()),
            status,
            created_at: Utc::now(),
            extracted_at: None,
            error: None,
        };
        state.resources.insert(0, resource.clone());
        resource
    }

    pub fn seed_answer(&self, question_id: &str) -> Answer {
        self.state.lock().unwrap().generate_answer(question_id)
    }

    /// 模拟服务端后台提取完成
    pub fn mark_all_extracted(&self) {
        let mut state = self.state.lock().unwrap();
        for r in state.resources.iter_mut() {
            r.status = ResourceStatus::Extracted;
            r.extracted_at = Some(Utc::now());
        }
    }

    // ========== 控制 ==========

    pub fn hold(&self, name: &str) {
        self.gates
            .lock()
            .unwrap()
            .insert(name.to_string(), Arc::new(Notify::new()));
        self.armed.lock().unwrap().insert(name.to_string());
    }

    pub fn release(&self, name: &str) {
        if let Some(gate) = self.gates.lock().unwrap().get(name) {
            gate.notify_one();
        }
    }

    pub fn fail(&self, name: &str) {
        self.failing.lock().unwrap().insert(name.to_string());
    }

    pub fn recover(&self, name: &str) {
        self.failing.lock().unwrap().remove(name);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// 服务端实际生成过讲解的问题（按生成顺序）
    pub fn generated(&self) -> Vec<String> {
        self.generated.lock().unwrap().clone()
    }

    pub fn clear_generated(&self) {
        self.generated.lock().unwrap().clear();
    }

    // ========== 内部 ==========

    /// 记录调用并检查是否需要失败
    ///
    /// 按操作名或闸门名都可以设置失败；失败的调用同样会先等待闸门。
    async fn enter(&self, name: &str, gate: &str, detail: String) -> ApiResult<()> {
        self.calls.lock().unwrap().push(detail);
        let failing = {
            let failing = self.failing.lock().unwrap();
            failing.contains(name) || failing.contains(gate)
        };
        if failing {
            self.respond(gate, ()).await;
            return Err(TransportError::Status {
                endpoint: format!("/fake/{}", name),
                status: 503,
                message: "Service Unavailable".to_string(),
            });
        }
        Ok(())
    }

    /// 返回前等待闸门（闸门只拦截一次）
    async fn respond<T>(&self, gate: &str, value: T) -> T {
        let taken = self.armed.lock().unwrap().remove(gate);
        let notify = if taken {
            self.gates.lock().unwrap().get(gate).cloned()
        } else {
            None
        };
        if let Some(notify) = notify {
            notify.notified().await;
        }
        value
    }

    fn record_generated(&self, question_id: &str) {
        self.generated.lock().unwrap().push(question_id.to_string());
    }
}

#[async_trait]
impl CompanionApi for FakeCompanionApi {
    async fn list_sessions(&self) -> ApiResult<Vec<Session>> {
        self.enter("list_sessions", "list_sessions", "list_sessions".to_string()).await?;
        let sessions = self.state.lock().unwrap().sessions.clone();
        Ok(self.respond("list_sessions", sessions).await)
    }

    async fn create_session(&self, draft: &SessionDraft) -> ApiResult<Session> {
        self.enter(
            "create_session",
            "create_session",
            format!("create_session:{}", draft.title),
        )
        .await?;
        let session = {
            let mut state = self.state.lock().unwrap();
            let session = Session {
                id: state.next_id("s"),
                title: draft.title.clone(),
                topics: draft.topics.clone(),
                created_at: Utc::now(),
                question_count: 0,
            };
            state.sessions.insert(0, session.clone());
            session
        };
        Ok(self.respond("create_session", session).await)
    }

    async fn list_questions(&self, _session_id: &str) -> ApiResult<Vec<PersistedQuestion>> {
        self.enter("list_questions", "list_questions", "list_questions".to_string()).await?;
        let questions = self.state.lock().unwrap().questions.clone();
        Ok(self.respond("list_questions", questions).await)
    }

    async fn create_question(&self, _session_id: &str, text: &str) -> ApiResult<PersistedQuestion> {
        self.enter(
            "create_question",
            "create_question",
            format!("create_question:{}", text),
        )
        .await?;
        let question = self.seed_question(text);
        Ok(self.respond("create_question", question).await)
    }

    async fn list_resources(&self, _session_id: &str) -> ApiResult<Vec<Resource>> {
        self.enter("list_resources", "list_resources", "list_resources".to_string()).await?;
        let resources = self.state.lock().unwrap().resources.clone();
        Ok(self.respond("list_resources", resources).await)
    }

    async fn upload_resources(
        &self,
        _session_id: &str,
        files: &[UploadFile],
    ) -> ApiResult<Vec<Resource>> {
        self.enter(
            "upload_resources",
            "upload_resources",
            format!("upload_resources:{}", files.len()),
        )
        .await?;
        let created: Vec<Resource> = files
            .iter()
            .map(|f| self.seed_resource(&f.filename, ResourceStatus::Uploaded))
            .collect();
        Ok(self.respond("upload_resources", created).await)
    }

    async fn trigger_chunking(&self, _session_id: &str) -> ApiResult<ChunkingSummary> {
        self.enter("trigger_chunking", "trigger_chunking", "trigger_chunking".to_string()).await?;
        let summary = {
            let state = self.state.lock().unwrap();
            let processed = state
                .resources
                .iter()
                .filter(|r| r.status == ResourceStatus::Extracted)
                .count() as u32;
            ChunkingSummary {
                processed_count: processed,
                skipped_count: state.resources.len() as u32 - processed,
                created_chunk_count: processed * 4,
            }
        };
        Ok(self.respond("trigger_chunking", summary).await)
    }

    async fn search_chunks(
        &self,
        _session_id: &str,
        query: &str,
        limit: usize,
    ) -> ApiResult<Vec<ChunkHit>> {
        self.enter(
            "search_chunks",
            &format!("search:{}", query),
            format!("search_chunks:{}:{}", query, limit),
        )
        .await?;
        let hits = vec![ChunkHit {
            chunk_id: format!("c-{}", query.replace(' ', "-")),
            resource_id: "r1".to_string(),
            filename: "week1.pdf".to_string(),
            page_ref: Some("p. 3".to_string()),
            text: query.to_string(),
            rank: 0.42,
        }];
        Ok(self.respond(&format!("search:{}", query), hits).await)
    }

    async fn explain(&self, question_id: &str, force: bool) -> ApiResult<Answer> {
        self.enter(
            "explain",
            &format!("explain:{}", question_id),
            format!("explain:{}:{}", question_id, force),
        )
        .await?;
        let answer = {
            let mut state = self.state.lock().unwrap();
            let existing = state
                .answers
                .iter()
                .find(|a| a.question_id == question_id)
                .cloned();
            match existing {
                Some(answer) if !force => answer,
                _ => {
                    self.record_generated(question_id);
                    state.generate_answer(question_id)
                }
            }
        };
        Ok(self.respond(&format!("explain:{}", question_id), answer).await)
    }

    async fn list_answers(&self, _session_id: &str) -> ApiResult<Vec<Answer>> {
        self.enter("list_answers", "list_answers", "list_answers".to_string()).await?;
        let answers = self.state.lock().unwrap().answers.clone();
        Ok(self.respond("list_answers", answers).await)
    }

    async fn explain_all(&self, _session_id: &str, force: bool) -> ApiResult<BatchExplanation> {
        self.enter("explain_all", "explain_all", format!("explain_all:{}", force)).await?;
        let answers = {
            let mut state = self.state.lock().unwrap();
            let targets: Vec<String> = state
                .questions
                .iter()
                .filter(|q| force || !state.answers.iter().any(|a| a.question_id == q.id))
                .map(|q| q.id.clone())
                .collect();
            targets
                .iter()
                .map(|id| {
                    self.record_generated(id);
                    state.generate_answer(id)
                })
                .collect::<Vec<_>>()
        };
        let batch = BatchExplanation {
            count: answers.len(),
            answers,
        };
        Ok(self.respond("explain_all", batch).await)
    }
}

pub fn test_config() -> Config {
    Config::default()
}

pub fn orchestrator(api: &Arc<FakeCompanionApi>) -> SessionOrchestrator {
    SessionOrchestrator::new(api.clone(), SESSION_ID, &test_config())
}

/// 已加载完毕的编排器
pub async fn entered(api: &Arc<FakeCompanionApi>) -> SessionOrchestrator {
    let orch = orchestrator(api);
    let report = orch.enter_session().await;
    assert!(report.failures.is_empty(), "unexpected load failures");
    orch
}
