use std::time::Duration;

use chat_logging::{chat_debug, chat_trace};
use reqwest::header::CONTENT_TYPE;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    ChunkRequest, ChunkResponse, FailureKind, IndexedItemsResponse, QueryError, QueryRequest,
    QueryResponse,
};

pub const QUERY_PATH: &str = "/query";
pub const CHUNK_PATH: &str = "/database/retrieve_chunk";
pub const INDEX_PATH: &str = "/database/list_indexed_items";

#[derive(Debug, Clone)]
pub struct QuerySettings {
    pub base_url: String,
    pub connect_timeout: Option<Duration>,
    /// `None` waits for the server however long it takes.
    pub request_timeout: Option<Duration>,
    /// Treat non-2xx responses as failures instead of parsing their body.
    pub check_status: bool,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            connect_timeout: None,
            request_timeout: None,
            check_status: false,
        }
    }
}

#[async_trait::async_trait]
pub trait QueryClient: Send + Sync {
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, QueryError>;

    async fn retrieve_chunk(&self, request: &ChunkRequest) -> Result<ChunkResponse, QueryError>;

    async fn list_indexed_items(&self) -> Result<IndexedItemsResponse, QueryError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestQueryClient {
    settings: QuerySettings,
    client: reqwest::Client,
}

impl ReqwestQueryClient {
    pub fn new(settings: QuerySettings) -> Result<Self, QueryError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| QueryError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &QuerySettings {
        &self.settings
    }

    fn endpoint(&self, path: &str) -> Result<reqwest::Url, QueryError> {
        let base = self.settings.base_url.trim_end_matches('/');
        reqwest::Url::parse(&format!("{base}{path}"))
            .map_err(|err| QueryError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    async fn post_json<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, QueryError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let payload = serde_json::to_vec(body)
            .map_err(|err| QueryError::new(FailureKind::ProcessingError, err.to_string()))?;

        chat_trace!("POST {} ({} bytes)", url, payload.len());
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload);
        self.send_json(path, request).await
    }

    async fn get_json<Resp>(&self, path: &str) -> Result<Resp, QueryError>
    where
        Resp: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        chat_trace!("GET {}", url);
        self.send_json(path, self.client.get(url)).await
    }

    async fn send_json<Resp>(
        &self,
        path: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<Resp, QueryError>
    where
        Resp: DeserializeOwned,
    {
        let response = request.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            if self.settings.check_status {
                return Err(QueryError::new(
                    FailureKind::HttpStatus(status.as_u16()),
                    status.to_string(),
                ));
            }
            chat_debug!("{} returned {}; parsing body anyway", path, status);
        }

        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&bytes)
            .map_err(|err| QueryError::new(FailureKind::MalformedResponse, err.to_string()))
    }
}

#[async_trait::async_trait]
impl QueryClient for ReqwestQueryClient {
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, QueryError> {
        self.post_json(QUERY_PATH, request).await
    }

    async fn retrieve_chunk(&self, request: &ChunkRequest) -> Result<ChunkResponse, QueryError> {
        self.post_json(CHUNK_PATH, request).await
    }

    async fn list_indexed_items(&self) -> Result<IndexedItemsResponse, QueryError> {
        self.get_json(INDEX_PATH).await
    }
}

fn map_reqwest_error(err: reqwest::Error) -> QueryError {
    if err.is_timeout() {
        return QueryError::new(FailureKind::Timeout, err.to_string());
    }
    QueryError::new(FailureKind::Network, err.to_string())
}
