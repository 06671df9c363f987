//! Qdrant REST client.
//!
//! Every request carries the `api-key` header when a key is configured. The
//! key can be rotated at runtime: after [`KeyReloader::mark_pending`], the
//! first 401/403 from Qdrant triggers one re-read of the key file and a retry.

use async_trait::async_trait;
use domain_security::KeyReloader;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Map, Value, json};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::config::QdrantConfig;
use crate::error::{VectorError, VectorResult};
use crate::models::{CollectionInfo, CreateCollectionRequest, Point, PointId, ScoredPoint};
use crate::repository::VectorRepository;

const API_KEY_HEADER: &str = "api-key";

#[derive(Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Deserialize)]
struct CollectionList {
    collections: Vec<CollectionName>,
}

#[derive(Deserialize)]
struct CollectionName {
    name: String,
}

#[derive(Deserialize)]
struct RawCollectionInfo {
    #[serde(default)]
    status: String,
    #[serde(default)]
    points_count: Option<u64>,
    #[serde(default)]
    vectors_count: Option<u64>,
    #[serde(default)]
    config: Value,
}

impl From<RawCollectionInfo> for CollectionInfo {
    fn from(raw: RawCollectionInfo) -> Self {
        // Unnamed vectors are `{size, distance}`; named ones are a map of those.
        let params = raw.config.pointer("/params/vectors").and_then(|v| {
            if v.get("size").is_some() {
                Some(v)
            } else {
                v.as_object().and_then(|named| named.values().next())
            }
        });

        CollectionInfo {
            status: raw.status,
            points_count: raw.points_count.unwrap_or(0),
            vectors_count: raw.vectors_count,
            vector_size: params.and_then(|p| p.get("size")).and_then(Value::as_u64),
            distance: params
                .and_then(|p| p.get("distance"))
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}

#[derive(Deserialize)]
struct CountResult {
    count: u64,
}

/// Shared, cheaply cloneable handle; clones see the same key state.
#[derive(Clone)]
pub struct QdrantHttpClient {
    pub(super) http: Client,
    /// No overall timeout; used for snapshot transfers
    pub(super) transfer: Client,
    base_url: Arc<str>,
    api_key: Arc<RwLock<Option<String>>>,
    key_file: Option<Arc<PathBuf>>,
    reload_pending: Arc<AtomicBool>,
}

impl QdrantHttpClient {
    pub fn new(config: &QdrantConfig) -> VectorResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VectorError::Internal(format!("Failed to build HTTP client: {e}")))?;
        let transfer = Client::builder()
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| VectorError::Internal(format!("Failed to build HTTP client: {e}")))?;

        let base_url = config.base_url();
        info!(url = %base_url, "Qdrant client configured");

        Ok(Self {
            http,
            transfer,
            base_url: Arc::from(base_url),
            api_key: Arc::new(RwLock::new(config.resolve_api_key())),
            key_file: config.api_key_file.clone().map(Arc::new),
            reload_pending: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_reload_pending(&self) -> bool {
        self.reload_pending.load(Ordering::Acquire)
    }

    pub(super) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(super) fn collection_url(&self, name: &str, suffix: &str) -> String {
        format!(
            "{}/collections/{}{}",
            self.base_url,
            urlencoding::encode(name),
            suffix
        )
    }

    async fn with_key(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.api_key.read().await.as_deref() {
            Some(key) => builder.header(API_KEY_HEADER, key),
            None => builder,
        }
    }

    /// Send the request built by `build`, retrying once with a reloaded key
    /// when a rotation is pending and Qdrant rejects the current one.
    pub(super) async fn send<F>(&self, build: F) -> VectorResult<Response>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        self.send_with(|| std::future::ready(Ok(build()))).await
    }

    /// Like [`send`](Self::send) for requests whose body must be rebuilt
    /// asynchronously on each attempt, such as a file stream.
    pub(super) async fn send_with<F, Fut>(&self, build: F) -> VectorResult<Response>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = VectorResult<RequestBuilder>> + Send,
    {
        let response = self
            .with_key(build().await?)
            .await
            .send()
            .await
            .map_err(transport_error)?;

        let rejected = matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        );
        if !rejected || !self.is_reload_pending() {
            return Ok(response);
        }

        match self.reload_key().await {
            Ok(()) => self
                .with_key(build().await?)
                .await
                .send()
                .await
                .map_err(transport_error),
            Err(e) => {
                warn!(error = %e, "Qdrant rejected the key and reload failed");
                Ok(response)
            }
        }
    }

    async fn reload_key(&self) -> io::Result<()> {
        let path = self.key_file.as_deref().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "QDRANT_API_KEY_FILE not configured")
        })?;

        let key = tokio::fs::read_to_string(path).await?.trim().to_string();
        if key.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "key file is empty"));
        }

        *self.api_key.write().await = Some(key);
        self.reload_pending.store(false, Ordering::Release);
        info!(path = %path.display(), "Qdrant API key reloaded");
        Ok(())
    }
}

fn transport_error(err: reqwest::Error) -> VectorError {
    VectorError::Unreachable(err.to_string())
}

/// Qdrant's `{"status": {"error": "..."}}` message, else the raw body.
async fn error_message(response: Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| {
            v.pointer("/status/error")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            if text.is_empty() {
                status.to_string()
            } else {
                text
            }
        })
}

async fn result<T: DeserializeOwned>(response: Response) -> VectorResult<T> {
    response
        .json::<Envelope<T>>()
        .await
        .map(|envelope| envelope.result)
        .map_err(|e| VectorError::Qdrant(format!("Unexpected Qdrant response: {e}")))
}

/// Decode a successful response, or turn the failure into `Qdrant(message)`.
async fn checked<T: DeserializeOwned>(response: Response) -> VectorResult<T> {
    if response.status().is_success() {
        result(response).await
    } else {
        Err(VectorError::Qdrant(error_message(response).await))
    }
}

#[async_trait]
impl VectorRepository for QdrantHttpClient {
    async fn list_collection_names(&self) -> VectorResult<Vec<String>> {
        let url = self.url("/collections");
        let response = self.send(|| self.http.get(&url)).await?;
        let list: CollectionList = checked(response).await?;
        Ok(list.collections.into_iter().map(|c| c.name).collect())
    }

    async fn collection_info(&self, name: &str) -> VectorResult<Option<CollectionInfo>> {
        let url = self.collection_url(name, "");
        let response = self.send(|| self.http.get(&url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let raw: RawCollectionInfo = checked(response).await?;
        Ok(Some(raw.into()))
    }

    async fn count_points(&self, name: &str) -> VectorResult<u64> {
        let url = self.collection_url(name, "/points/count");
        let response = self
            .send(|| self.http.post(&url).json(&json!({"exact": true})))
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(VectorError::CollectionNotFound(name.to_string()));
        }
        let count: CountResult = checked(response).await?;
        Ok(count.count)
    }

    async fn create_collection(&self, request: &CreateCollectionRequest) -> VectorResult<()> {
        let mut body = json!({
            "vectors": {
                "size": request.vectors_size,
                "distance": request.distance.as_str(),
            }
        });

        let mut hnsw = Map::new();
        if let Some(ef_construct) = request.ef_construct {
            hnsw.insert("ef_construct".to_string(), json!(ef_construct));
        }
        if let Some(m) = request.m {
            hnsw.insert("m".to_string(), json!(m));
        }
        if !hnsw.is_empty() {
            body["hnsw_config"] = Value::Object(hnsw);
        }

        let url = self.collection_url(&request.name, "");
        let response = self.send(|| self.http.put(&url).json(&body)).await?;
        if !response.status().is_success() {
            return Err(VectorError::CreateFailed(error_message(response).await));
        }
        debug!(collection = %request.name, "Collection created");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> VectorResult<bool> {
        let url = self.collection_url(name, "");
        let response = self.send(|| self.http.delete(&url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(VectorError::CollectionNotFound(name.to_string()));
        }
        checked(response).await
    }

    async fn upsert_points(&self, collection: &str, points: Vec<Point>) -> VectorResult<()> {
        let points: Vec<Value> = points
            .into_iter()
            .map(|p| {
                json!({
                    "id": p.id,
                    "vector": p.vector,
                    "payload": p.payload.unwrap_or_else(|| json!({})),
                })
            })
            .collect();
        let body = json!({ "points": points });

        let url = self.collection_url(collection, "/points");
        let response = self
            .send(|| self.http.put(&url).query(&[("wait", "true")]).json(&body))
            .await?;
        let _: Value = checked(response).await?;
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u32,
        with_payload: bool,
    ) -> VectorResult<Vec<ScoredPoint>> {
        let body = json!({
            "vector": vector,
            "limit": limit,
            "with_payload": with_payload,
        });

        let url = self.collection_url(collection, "/points/search");
        let response = self.send(|| self.http.post(&url).json(&body)).await?;
        checked(response).await
    }

    async fn delete_points(&self, collection: &str, ids: Vec<PointId>) -> VectorResult<()> {
        let body = json!({ "points": ids });

        let url = self.collection_url(collection, "/points/delete");
        let response = self
            .send(|| self.http.post(&url).query(&[("wait", "true")]).json(&body))
            .await?;
        let _: Value = checked(response).await?;
        Ok(())
    }

    async fn health(&self) -> VectorResult<()> {
        let url = self.url("/healthz");
        let response = self.send(|| self.http.get(&url)).await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(VectorError::Unreachable(format!(
                "healthz returned {}",
                response.status()
            )))
        }
    }
}

#[async_trait]
impl KeyReloader for QdrantHttpClient {
    fn mark_pending(&self) {
        self.reload_pending.store(true, Ordering::Release);
        info!("Qdrant API key reload pending");
    }

    async fn reload_from_file(&self) -> io::Result<()> {
        self.reload_key().await
    }
}
