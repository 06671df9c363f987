use std::path::Path;

use crate::client::ApiClient;
use crate::error::{ConsoleError, ConsoleResult};
use crate::table::{self, or_missing};

fn require_collection(collection: &str) -> ConsoleResult<()> {
    if collection.is_empty() {
        return Err(ConsoleError::input("collection is required"));
    }
    Ok(())
}

pub async fn list(client: &ApiClient, collection: &str) -> ConsoleResult<String> {
    require_collection(collection)?;

    let snapshots = client.list_snapshots(collection).await?;
    if snapshots.is_empty() {
        return Ok(format!("no snapshots for {collection}"));
    }

    let rows: Vec<Vec<String>> = snapshots
        .into_iter()
        .map(|s| vec![s.name, or_missing(s.size), or_missing(s.creation_time)])
        .collect();
    Ok(table::render(&["name", "size", "created"], &rows))
}

/// Create, then show the refreshed list.
pub async fn create(client: &ApiClient, collection: &str) -> ConsoleResult<String> {
    require_collection(collection)?;

    let created = client.create_snapshot(collection).await?;
    let name = created
        .pointer("/result/name")
        .and_then(|n| n.as_str())
        .unwrap_or("snapshot");

    Ok(format!("created: {name}\n\n{}", list(client, collection).await?))
}

pub async fn restore(client: &ApiClient, collection: &str, file: &Path) -> ConsoleResult<String> {
    require_collection(collection)?;
    if !tokio::fs::try_exists(file).await? {
        return Err(ConsoleError::input(format!(
            "file not found: {}",
            file.display()
        )));
    }

    let restored = client.restore_snapshot(collection, file).await?;
    Ok(format!("restored {collection} (op {})", restored.op_id))
}

pub async fn download(
    client: &ApiClient,
    collection: &str,
    name: &str,
    out: &Path,
) -> ConsoleResult<String> {
    require_collection(collection)?;
    if name.is_empty() {
        return Err(ConsoleError::input("snapshot name is required"));
    }

    let written = client.download_snapshot(collection, name, out).await?;
    Ok(format!("saved {written} bytes to {}", out.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::testing::client;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_list_shows_dash_for_missing_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/snapshots/docs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": [
                    {"name": "docs-1.snapshot", "size": 2048, "creation_time": "2024-05-01T10:00:00"},
                    {"name": "docs-2.snapshot"}
                ]
            })))
            .mount(&server)
            .await;

        let out = list(&client(&server), "docs").await.unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "name             size  created");
        assert_eq!(lines[2], "docs-1.snapshot  2048  2024-05-01T10:00:00");
        assert_eq!(lines[3], "docs-2.snapshot  -     -");
    }

    #[tokio::test]
    async fn test_create_then_relist() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/snapshots/docs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {"name": "docs-3.snapshot"}, "status": "ok"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/snapshots/docs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": []})))
            .mount(&server)
            .await;

        let out = create(&client(&server), "docs").await.unwrap();
        assert!(out.starts_with("created: docs-3.snapshot"));
        assert!(out.ends_with("no snapshots for docs"));
    }

    #[tokio::test]
    async fn test_restore_requires_existing_file() {
        let server = MockServer::start().await;
        let err = restore(&client(&server), "docs", Path::new("/nonexistent/s.snapshot"))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("file not found"));
    }

    #[tokio::test]
    async fn test_restore_reports_op() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/snapshots/docs/restore"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "op_id": "op-9", "result": {"result": true}
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("docs.snapshot");
        std::fs::write(&file, b"bytes").unwrap();

        let out = restore(&client(&server), "docs", &file).await.unwrap();
        assert_eq!(out, "restored docs (op op-9)");
    }
}
