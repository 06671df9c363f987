use domain_vector::{CreateCollectionRequest, Distance};

use crate::client::ApiClient;
use crate::error::ConsoleResult;
use crate::table;

pub const DEFAULT_SIZE: u64 = 1536;

pub async fn list(client: &ApiClient) -> ConsoleResult<String> {
    let collections = client.list_collections().await?;
    if collections.is_empty() {
        return Ok("no collections".to_string());
    }

    let rows: Vec<Vec<String>> = collections
        .into_iter()
        .map(|c| {
            vec![
                c.name,
                c.points_count.to_string(),
                c.vectors_count.to_string(),
                c.status,
            ]
        })
        .collect();
    Ok(table::render(&["name", "points", "vectors", "status"], &rows))
}

/// Create, then show the refreshed list.
pub async fn create(
    client: &ApiClient,
    name: &str,
    size: u64,
    distance: Distance,
) -> ConsoleResult<String> {
    let request = CreateCollectionRequest {
        name: name.to_string(),
        vectors_size: size,
        distance,
        ef_construct: None,
        m: None,
    };
    let created = client.create_collection(&request).await?;

    Ok(format!("created: {}\n\n{}", created.name, list(client).await?))
}
