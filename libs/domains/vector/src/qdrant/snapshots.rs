//! Snapshot endpoints, proxied to Qdrant's REST API.

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::{
    Response, StatusCode,
    multipart::{Form, Part},
};
use serde_json::Value;

use super::client::QdrantHttpClient;
use crate::error::{VectorError, VectorResult};
use crate::models::SnapshotDescription;
use crate::repository::{SnapshotRepository, SnapshotStream};
use crate::spool::SpooledSnapshot;

async fn upstream_error(response: Response) -> VectorError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    VectorError::Upstream { status, body }
}

async fn json_body(response: Response) -> VectorResult<Value> {
    response
        .json::<Value>()
        .await
        .map_err(|e| VectorError::Unreachable(format!("Unreadable Qdrant response: {e}")))
}

#[async_trait]
impl SnapshotRepository for QdrantHttpClient {
    async fn list_snapshots(&self, collection: &str) -> VectorResult<Vec<SnapshotDescription>> {
        let url = self.collection_url(collection, "/snapshots");
        let response = self.send(|| self.http.get(&url)).await?;
        if response.status() != StatusCode::OK {
            return Err(upstream_error(response).await);
        }

        let body = json_body(response).await?;
        let result = body.get("result").cloned().unwrap_or(Value::Array(vec![]));
        Ok(serde_json::from_value(result)?)
    }

    async fn create_snapshot(&self, collection: &str) -> VectorResult<Value> {
        let url = self.collection_url(collection, "/snapshots");
        let response = self
            .send(|| self.transfer.post(&url).query(&[("wait", "true")]))
            .await?;
        if !matches!(response.status(), StatusCode::OK | StatusCode::ACCEPTED) {
            return Err(upstream_error(response).await);
        }
        json_body(response).await
    }

    async fn download_snapshot(&self, collection: &str, name: &str) -> VectorResult<SnapshotStream> {
        let suffix = format!("/snapshots/{}", urlencoding::encode(name));
        let url = self.collection_url(collection, &suffix);
        let response = self.send(|| self.transfer.get(&url)).await?;
        if response.status() != StatusCode::OK {
            return Err(upstream_error(response).await);
        }

        Ok(response
            .bytes_stream()
            .map_err(std::io::Error::other)
            .boxed())
    }

    async fn upload_snapshot(
        &self,
        collection: &str,
        snapshot: &SpooledSnapshot,
    ) -> VectorResult<Value> {
        let url = &self.collection_url(collection, "/snapshots/upload");

        // The file is reopened for the retry after a key reload.
        let response = self
            .send_with(move || async move {
                let file = tokio::fs::File::open(snapshot.path()).await.map_err(|e| {
                    VectorError::Internal(format!("Spooled snapshot unreadable: {e}"))
                })?;
                let part = Part::stream_with_length(file, snapshot.len())
                    .file_name(snapshot.file_name().to_string());
                Ok(self
                    .transfer
                    .post(url)
                    .query(&[("priority", "snapshot"), ("wait", "true")])
                    .multipart(Form::new().part("snapshot", part)))
            })
            .await?;
        if !response.status().is_success() {
            return Err(upstream_error(response).await);
        }
        json_body(response).await
    }
}
