/// 协作方 HTTP 客户端
///
/// 封装所有与服务端 `/api` 的调用逻辑
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::clients::CompanionApi;
use crate::config::{Config, SearchMode};
use crate::error::{ApiResult, TransportError};
use crate::models::{
    Answer, BatchExplanation, ChunkHit, ChunkingSummary, PersistedQuestion, Resource, Session,
    SessionDraft, UploadFile,
};

/// 协作方 HTTP 客户端
pub struct HttpCompanionClient {
    client: Client,
    base_url: String,
    search_mode: SearchMode,
}

impl HttpCompanionClient {
    /// 创建新的客户端
    pub fn new(config: &Config) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| TransportError::Request {
                endpoint: config.api_base_url.clone(),
                source: Box::new(e),
            })?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            search_mode: config.search_mode,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// 发送请求并解析 JSON 响应
    ///
    /// 非成功状态码统一转成 `TransportError::Status`，响应体作为消息
    async fn send_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> ApiResult<T> {
        debug!("请求 {}", endpoint);

        let response = request.send().await.map_err(|e| {
            warn!("API 请求失败 ({}): {}", endpoint, e);
            TransportError::Request {
                endpoint: endpoint.to_string(),
                source: Box::new(e),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("API 返回错误 ({}): HTTP {}", endpoint, status);
            return Err(TransportError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                message: format!(
                    "{} {}",
                    status.canonical_reason().unwrap_or_default(),
                    body
                )
                .trim()
                .to_string(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| TransportError::Request {
            endpoint: endpoint.to_string(),
            source: Box::new(e),
        })?;

        serde_json::from_slice(&bytes).map_err(|source| TransportError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    fn upload_form(endpoint: &str, files: &[UploadFile]) -> ApiResult<Form> {
        let mut form = Form::new();
        for file in files {
            let mut part = Part::bytes(file.bytes.clone()).file_name(file.filename.clone());
            if let Some(mime) = &file.mime_type {
                part = part.mime_str(mime).map_err(|e| TransportError::Request {
                    endpoint: endpoint.to_string(),
                    source: Box::new(e),
                })?;
            }
            form = form.part("files", part);
        }
        Ok(form)
    }
}

fn force_suffix(force: bool) -> &'static str {
    if force {
        "?force=1"
    } else {
        ""
    }
}

#[async_trait]
impl CompanionApi for HttpCompanionClient {
    async fn list_sessions(&self) -> ApiResult<Vec<Session>> {
        let endpoint = "/api/sessions";
        self.send_json(endpoint, self.client.get(self.url(endpoint)))
            .await
    }

    async fn create_session(&self, draft: &SessionDraft) -> ApiResult<Session> {
        let endpoint = "/api/sessions";
        self.send_json(endpoint, self.client.post(self.url(endpoint)).json(draft))
            .await
    }

    async fn list_questions(&self, session_id: &str) -> ApiResult<Vec<PersistedQuestion>> {
        let endpoint = format!("/api/sessions/{}/questions", session_id);
        self.send_json(&endpoint, self.client.get(self.url(&endpoint)))
            .await
    }

    async fn create_question(&self, session_id: &str, text: &str) -> ApiResult<PersistedQuestion> {
        let endpoint = format!("/api/sessions/{}/questions", session_id);
        let body = serde_json::json!({ "text": text });
        self.send_json(&endpoint, self.client.post(self.url(&endpoint)).json(&body))
            .await
    }

    async fn list_resources(&self, session_id: &str) -> ApiResult<Vec<Resource>> {
        let endpoint = format!("/api/sessions/{}/resources", session_id);
        self.send_json(&endpoint, self.client.get(self.url(&endpoint)))
            .await
    }

    async fn upload_resources(
        &self,
        session_id: &str,
        files: &[UploadFile],
    ) -> ApiResult<Vec<Resource>> {
        let endpoint = format!("/api/sessions/{}/resources", session_id);
        let form = Self::upload_form(&endpoint, files)?;
        self.send_json(
            &endpoint,
            self.client.post(self.url(&endpoint)).multipart(form),
        )
        .await
    }

    async fn trigger_chunking(&self, session_id: &str) -> ApiResult<ChunkingSummary> {
        let endpoint = format!("/api/sessions/{}/chunk-all", session_id);
        self.send_json(&endpoint, self.client.post(self.url(&endpoint)))
            .await
    }

    async fn search_chunks(
        &self,
        session_id: &str,
        query: &str,
        limit: usize,
    ) -> ApiResult<Vec<ChunkHit>> {
        let endpoint = match self.search_mode {
            SearchMode::Keyword => format!("/api/sessions/{}/chunks/search", session_id),
            SearchMode::Semantic => format!("/api/sessions/{}/chunks/semantic-search", session_id),
        };
        let limit = limit.to_string();
        let request = self
            .client
            .get(self.url(&endpoint))
            .query(&[("q", query), ("limit", limit.as_str())]);
        self.send_json(&endpoint, request).await
    }

    async fn explain(&self, question_id: &str, force: bool) -> ApiResult<Answer> {
        let endpoint = format!("/api/questions/{}/explain{}", question_id, force_suffix(force));
        self.send_json(&endpoint, self.client.post(self.url(&endpoint)))
            .await
    }

    async fn list_answers(&self, session_id: &str) -> ApiResult<Vec<Answer>> {
        let endpoint = format!("/api/sessions/{}/answers", session_id);
        self.send_json(&endpoint, self.client.get(self.url(&endpoint)))
            .await
    }

    async fn explain_all(&self, session_id: &str, force: bool) -> ApiResult<BatchExplanation> {
        let endpoint = format!(
            "/api/sessions/{}/explain-all{}",
            session_id,
            force_suffix(force)
        );
        self.send_json(&endpoint, self.client.post(self.url(&endpoint)))
            .await
    }
}
