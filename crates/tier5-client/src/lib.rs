pub mod error;
pub mod http;

use async_trait::async_trait;
use serde_json::Value;
use tier5_schema::{
    ChatReply, ChatRequest, CorrectedRecord, DataStore, IntentCatalog, LabelRequest,
    LabelResponse, PendingPage, StatsSummary, StoreEntities,
};

pub use error::{ApiError, ApiErrorKind};
pub use http::HttpReviewApi;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Every HTTP peer the console talks to.
#[async_trait]
pub trait ReviewApi: Send + Sync {
    async fn pending(&self, page: u32, limit: u32) -> ApiResult<PendingPage>;
    async fn intents(&self) -> ApiResult<IntentCatalog>;
    async fn stats(&self) -> ApiResult<StatsSummary>;
    async fn corrected(&self, limit: u32) -> ApiResult<Vec<CorrectedRecord>>;
    async fn classifier(&self) -> ApiResult<Value>;
    async fn data_store(&self, store: DataStore) -> ApiResult<StoreEntities>;
    async fn label(&self, request: &LabelRequest) -> ApiResult<LabelResponse>;
    async fn delete_pending(&self, prompt_id: &str) -> ApiResult<()>;
    async fn delete_corrected(&self, record_id: &str) -> ApiResult<()>;
    async fn chat(&self, request: &ChatRequest) -> ApiResult<ChatReply>;

    /// Replaces the `X-Reviewer-ID` sent with later requests.
    fn set_reviewer(&self, reviewer_id: Option<String>);
    fn reviewer(&self) -> Option<String>;
}
