use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tier5_schema::{
    ChatReply, ChatRequest, CorrectedRecord, DataStore, IntentCatalog, LabelRequest,
    LabelResponse, PendingPage, StatsSummary, StoreEntities,
};

use crate::{ApiError, ApiResult, ReviewApi};

pub const REVIEWER_HEADER: &str = "X-Reviewer-ID";

/// `reqwest` client against the review service. Cookies persist across
/// requests so a browser-issued session keeps working.
#[derive(Debug)]
pub struct HttpReviewApi {
    client: reqwest::Client,
    api_base: String,
    reviewer: RwLock<Option<String>>,
}

impl HttpReviewApi {
    pub fn new(api_base: impl Into<String>, reviewer_id: Option<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .cookie_store(true)
                .build()
                .unwrap_or_default(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            reviewer: RwLock::new(reviewer_id.filter(|id| !id.trim().is_empty())),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }

    fn with_reviewer(&self, request: RequestBuilder) -> RequestBuilder {
        match self.reviewer() {
            Some(reviewer) => request.header(REVIEWER_HEADER, reviewer),
            None => request,
        }
    }

    async fn send_raw(&self, request: RequestBuilder) -> ApiResult<String> {
        let resp = self.with_reviewer(request).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            let err = ApiError::from_response(status, &text);
            tracing::warn!(status = status.as_u16(), detail = %err.detail, "review api request failed");
            return Err(err);
        }
        Ok(text)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let text = self.send_raw(request).await?;
        let body = if text.trim().is_empty() { "null" } else { text.as_str() };
        Ok(serde_json::from_str(body)?)
    }
}

/// The corrected log arrives either as a bare list or wrapped in `items`.
fn corrected_records(body: Value) -> ApiResult<Vec<CorrectedRecord>> {
    let list = match body {
        Value::Object(mut map) => map
            .remove("items")
            .or_else(|| map.remove("records"))
            .unwrap_or(Value::Array(Vec::new())),
        Value::Null => Value::Array(Vec::new()),
        other => other,
    };
    Ok(serde_json::from_value(list)?)
}

#[async_trait]
impl ReviewApi for HttpReviewApi {
    async fn pending(&self, page: u32, limit: u32) -> ApiResult<PendingPage> {
        let url = self.url(&format!("/api/logs/pending?limit={limit}&page={page}"));
        self.send_json(self.client.get(url)).await
    }

    async fn intents(&self) -> ApiResult<IntentCatalog> {
        self.send_json(self.client.get(self.url("/api/intents"))).await
    }

    async fn stats(&self) -> ApiResult<StatsSummary> {
        self.send_json(self.client.get(self.url("/api/stats"))).await
    }

    async fn corrected(&self, limit: u32) -> ApiResult<Vec<CorrectedRecord>> {
        let url = self.url(&format!("/api/logs/corrected?limit={limit}"));
        let body: Value = self.send_json(self.client.get(url)).await?;
        corrected_records(body)
    }

    async fn classifier(&self) -> ApiResult<Value> {
        self.send_json(self.client.get(self.url("/api/logs/classifier"))).await
    }

    async fn data_store(&self, store: DataStore) -> ApiResult<StoreEntities> {
        let url = self.url(&format!("/api/data/{}", store.as_str()));
        let body: Value = self.send_json(self.client.get(url)).await?;
        Ok(StoreEntities::from_response(store, body)?)
    }

    async fn label(&self, request: &LabelRequest) -> ApiResult<LabelResponse> {
        tracing::debug!(prompt_id = %request.prompt_id, tool = %request.tool, "posting correction");
        let builder = self.client.post(self.url("/api/logs/label")).json(request);
        self.send_json(builder).await
    }

    async fn delete_pending(&self, prompt_id: &str) -> ApiResult<()> {
        let url = self.url(&format!("/api/logs/pending/{}", urlencoding::encode(prompt_id)));
        self.send_raw(self.client.delete(url)).await.map(|_| ())
    }

    async fn delete_corrected(&self, record_id: &str) -> ApiResult<()> {
        let url = self.url(&format!("/api/logs/corrected/{}", urlencoding::encode(record_id)));
        self.send_raw(self.client.delete(url)).await.map(|_| ())
    }

    async fn chat(&self, request: &ChatRequest) -> ApiResult<ChatReply> {
        let builder = self.client.post(self.url("/api/chat")).json(request);
        self.send_json(builder).await
    }

    fn set_reviewer(&self, reviewer_id: Option<String>) {
        if let Ok(mut guard) = self.reviewer.write() {
            *guard = reviewer_id;
        }
    }

    fn reviewer(&self) -> Option<String> {
        self.reviewer.read().ok().and_then(|guard| guard.clone())
    }
}
