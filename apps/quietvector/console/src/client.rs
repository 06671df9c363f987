//! Typed client for the QuietVector HTTP API.

use domain_auth::{LoginRequest, TokenResponse};
use domain_security::{
    OpsApplyRequest, OpsApplyResponse, Operation, PrepareKeyRequest, PrepareKeyResponse,
};
use domain_vector::models::{
    CollectionSummary, CollectionsResponse, CreateCollectionRequest, CreateCollectionResponse,
    InsertVectorsRequest, InsertVectorsResponse, RestoreResponse, SearchRequest, SearchResponse,
    SnapshotDescription, StatsResponse,
};
use futures::StreamExt;
use reqwest::{Client, Method, RequestBuilder, Response, header, multipart};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use crate::error::{ConsoleError, ConsoleResult};
use crate::session::Session;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8090";

const CSRF_HEADER: &str = "x-csrf-token";
const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    session: Option<Session>,
}

impl ApiClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> ConsoleResult<Self> {
        // Snapshot transfers can be large; only connecting is bounded.
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            session: None,
        })
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    /// Authenticated request. POSTs carry the CSRF header and cookie pair.
    fn request(&self, method: Method, path: &str) -> ConsoleResult<RequestBuilder> {
        let session = self.session.as_ref().ok_or(ConsoleError::NotLoggedIn)?;

        let mut builder = self
            .http
            .request(method.clone(), self.url(path))
            .bearer_auth(&session.access_token);
        if method == Method::POST {
            builder = builder
                .header(CSRF_HEADER, &session.csrf_token)
                .header(header::COOKIE, format!("csrf_token={}", session.csrf_token));
        }
        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        Ok(builder)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ConsoleResult<T> {
        let response = self.request(Method::GET, path)?.send().await?;
        Ok(checked(response).await?.json().await?)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> ConsoleResult<T> {
        let mut builder = self.request(Method::POST, path)?;
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = builder.send().await?;
        Ok(checked(response).await?.json().await?)
    }

    // ===== Auth =====

    /// Exchange credentials for a session. Needs no prior session.
    pub async fn login(&self, username: &str, password: &str) -> ConsoleResult<Session> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let mut builder = self.http.post(self.url("/auth/login")).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }

        let token: TokenResponse = checked(builder.send().await?).await?.json().await?;
        Ok(Session {
            username: username.to_string(),
            access_token: token.access_token,
            csrf_token: token.csrf_token,
        })
    }

    // ===== Collections =====

    pub async fn list_collections(&self) -> ConsoleResult<Vec<CollectionSummary>> {
        let response: CollectionsResponse = self.get_json("/collections").await?;
        Ok(response.collections)
    }

    pub async fn create_collection(
        &self,
        request: &CreateCollectionRequest,
    ) -> ConsoleResult<CreateCollectionResponse> {
        self.post_json("/collections", Some(request)).await
    }

    // ===== Points =====

    pub async fn search(&self, request: &SearchRequest) -> ConsoleResult<SearchResponse> {
        self.post_json("/vectors/search", Some(request)).await
    }

    pub async fn insert(&self, request: &InsertVectorsRequest) -> ConsoleResult<InsertVectorsResponse> {
        self.post_json("/vectors/insert", Some(request)).await
    }

    // ===== Snapshots =====

    /// Accepts either a `result` or a `snapshots` array.
    pub async fn list_snapshots(&self, collection: &str) -> ConsoleResult<Vec<SnapshotDescription>> {
        let body: Value = self.get_json(&snapshots_path(collection, None)).await?;
        let list = body
            .get("result")
            .or_else(|| body.get("snapshots"))
            .cloned()
            .unwrap_or(Value::Array(Vec::new()));
        Ok(serde_json::from_value(list)?)
    }

    pub async fn create_snapshot(&self, collection: &str) -> ConsoleResult<Value> {
        self.post_json::<(), _>(&snapshots_path(collection, None), None)
            .await
    }

    pub async fn restore_snapshot(&self, collection: &str, file: &Path) -> ConsoleResult<RestoreResponse> {
        let handle = tokio::fs::File::open(file).await?;
        let length = handle.metadata().await?.len();
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.snapshot".to_string());

        let part = multipart::Part::stream_with_length(reqwest::Body::from(handle), length)
            .file_name(file_name)
            .mime_str("application/octet-stream")?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .request(Method::POST, &snapshots_path(collection, Some("restore")))?
            .multipart(form)
            .send()
            .await?;
        Ok(checked(response).await?.json().await?)
    }

    /// Stream a snapshot to `out`. Returns the number of bytes written.
    pub async fn download_snapshot(&self, collection: &str, name: &str, out: &Path) -> ConsoleResult<u64> {
        let response = self
            .request(Method::GET, &snapshots_path(collection, Some(name)))?
            .send()
            .await?;
        let response = checked(response).await?;

        let mut file = tokio::fs::File::create(out).await?;
        let mut written = 0u64;
        let mut chunks = response.bytes_stream();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }

    // ===== Stats =====

    pub async fn stats(&self) -> ConsoleResult<StatsResponse> {
        self.get_json("/stats").await
    }

    // ===== Security =====

    pub async fn prepare_key(&self, request: &PrepareKeyRequest) -> ConsoleResult<PrepareKeyResponse> {
        self.post_json("/security/qdrant_key/prepare", Some(request))
            .await
    }

    pub async fn ops_apply(&self, request: &OpsApplyRequest) -> ConsoleResult<OpsApplyResponse> {
        self.post_json("/security/ops_apply", Some(request)).await
    }

    pub async fn get_op(&self, op_id: &str) -> ConsoleResult<Operation> {
        self.get_json(&format!("/security/ops/{}", encode(op_id)))
            .await
    }
}

fn encode(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

fn snapshots_path(collection: &str, suffix: Option<&str>) -> String {
    match suffix {
        Some(suffix) => format!("/snapshots/{}/{}", encode(collection), encode(suffix)),
        None => format!("/snapshots/{}", encode(collection)),
    }
}

/// Pass 2xx responses through; turn anything else into [`ConsoleError::Api`].
async fn checked(response: Response) -> ConsoleResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    Err(ConsoleError::Api {
        status: status.as_u16(),
        message: error_message(&text),
    })
}

/// The `message` field of a structured error body, else the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
